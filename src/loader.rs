//! Export loading
//!
//! Parses the JSON export into feedback records. The only shape requirement
//! is a top-level object whose `feedbacks` field holds an array.

use crate::FeedbackRecord;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Why an export could not be loaded. Prior state is never touched on failure.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported file type: {0} (expected a .json export)")]
    UnsupportedExtension(PathBuf),

    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("top-level JSON value must be an object")]
    NotAnObject,

    #[error("missing \"feedbacks\" field")]
    MissingFeedbacks,

    #[error("\"feedbacks\" must be an array")]
    FeedbacksNotArray,
}

/// A loaded export
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub records: Vec<FeedbackRecord>,
    /// Hex SHA-256 of the raw export text
    pub content_hash: String,
    /// Where the export came from (`<stdin>`, a path, or `<inline>`)
    pub source: String,
}

impl Dataset {
    /// Parse raw export text
    pub fn parse(text: &str) -> Result<Self, LoadError> {
        Self::parse_with_source(text, "<inline>")
    }

    fn parse_with_source(text: &str, source: &str) -> Result<Self, LoadError> {
        let value: Value = serde_json::from_str(text)?;
        let Value::Object(mut root) = value else {
            return Err(LoadError::NotAnObject);
        };
        let feedbacks = root.remove("feedbacks").ok_or(LoadError::MissingFeedbacks)?;
        let Value::Array(items) = feedbacks else {
            return Err(LoadError::FeedbacksNotArray);
        };

        let records: Vec<FeedbackRecord> = items.into_iter().map(record_from_value).collect();
        debug!(source, records = records.len(), "parsed export");

        Ok(Self {
            records,
            content_hash: hash_text(text),
            source: source.to_string(),
        })
    }

    /// Load from a `.json` file, or from stdin when `path` is `-`
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        if path.as_os_str() == "-" {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .map_err(|source| LoadError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
            return Self::parse_with_source(&text, "<stdin>");
        }

        if !has_json_extension(path) {
            return Err(LoadError::UnsupportedExtension(path.to_path_buf()));
        }

        let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse_with_source(&text, &path.display().to_string())
    }

    pub fn total(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl std::str::FromStr for Dataset {
    type Err = LoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Dataset::parse(s)
    }
}

/// Objects become records; any other element becomes an all-absent record
/// so that totals still reflect the export length.
fn record_from_value(value: Value) -> FeedbackRecord {
    match value {
        Value::Object(_) => serde_json::from_value(value).unwrap_or_default(),
        _ => FeedbackRecord::default(),
    }
}

fn has_json_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// Hex SHA-256 of some text
pub fn hash_text(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}
