//! Teacher name extraction from block titles

use regex::Regex;
use std::sync::OnceLock;

fn teacher_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[^\s【】：:]+先生").unwrap())
}

/// First `…先生` token in a block title, or `None` when the block names no teacher.
///
/// The token is a greedy run of characters other than whitespace, full-width
/// brackets, and colons, ending in `先生`. Blocks naming two teachers without a
/// separator between them yield the whole run.
pub fn extract_teacher_name(block: Option<&str>) -> Option<&str> {
    let block = block?;
    teacher_pattern().find(block).map(|m| m.as_str())
}
