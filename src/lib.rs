//! OnClass Analyzer: course feedback analytics
//!
//! This library loads a JSON export of course-feedback records and computes
//! the dashboard analytics: sentiment breakdown, teacher/block/user rankings,
//! keyword frequency, and engagement metrics.

pub mod analyzer;
pub mod cache;
pub mod config;
pub mod filter;
pub mod loader;
pub mod reporter;
pub mod sentiment;
pub mod state;
pub mod watcher;

pub use filter::CourseFilter;
pub use loader::{Dataset, LoadError};
pub use sentiment::{Sentiment, SentimentScorer};
pub use state::{AppState, Intent, Session};

use serde::{Deserialize, Deserializer, Serialize};

/// Value the exporter writes when a name, block, or category is not known.
/// Absent or blank grouping fields are replaced by it.
pub const UNKNOWN: &str = "不明";

/// One feedback entry from the export. Every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRecord {
    /// Free-text comment
    #[serde(default, deserialize_with = "lenient_text")]
    pub content: Option<String>,
    /// Display name of the learner
    #[serde(default, deserialize_with = "lenient_text")]
    pub user_name: Option<String>,
    /// Course name (used by course filters)
    #[serde(default, deserialize_with = "lenient_text")]
    pub course: Option<String>,
    /// Lesson category
    #[serde(default, deserialize_with = "lenient_text")]
    pub category: Option<String>,
    /// Lesson block; often embeds the teacher name
    #[serde(default, deserialize_with = "lenient_text")]
    pub block: Option<String>,
    /// ISO-like date string
    #[serde(default, deserialize_with = "lenient_text")]
    pub date: Option<String>,
}

impl FeedbackRecord {
    /// Comment text, empty when absent
    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }

    /// Course name, empty when absent
    pub fn course_name(&self) -> &str {
        self.course.as_deref().unwrap_or("")
    }

    /// Grouping key for the user name (sentinel when absent or blank)
    pub fn user_key(&self) -> &str {
        group_key(self.user_name.as_deref())
    }

    /// Grouping key for the block (sentinel when absent or blank)
    pub fn block_key(&self) -> &str {
        group_key(self.block.as_deref())
    }

    /// Grouping key for the category (sentinel when absent or blank)
    pub fn category_key(&self) -> &str {
        group_key(self.category.as_deref())
    }

    /// Date string when present and non-blank
    pub fn date_key(&self) -> Option<&str> {
        self.date.as_deref().map(str::trim).filter(|d| !d.is_empty())
    }
}

/// Trim a raw field; absent or blank values become [`UNKNOWN`].
pub fn group_key(raw: Option<&str>) -> &str {
    match raw.map(str::trim) {
        Some(value) if !value.is_empty() => value,
        _ => UNKNOWN,
    }
}

/// True when the key is the unknown sentinel
pub fn is_unknown(key: &str) -> bool {
    key == UNKNOWN
}

/// Accept strings, stringify numbers and booleans, treat everything else as absent.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

/// Key used to rank buckets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Count,
    Positive,
    Negative,
}

impl std::str::FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "count" => Ok(SortKey::Count),
            "positive" => Ok(SortKey::Positive),
            "negative" => Ok(SortKey::Negative),
            other => Err(format!(
                "unknown sort key '{}' (expected count, positive or negative)",
                other
            )),
        }
    }
}

impl std::fmt::Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortKey::Count => write!(f, "count"),
            SortKey::Positive => write!(f, "positive"),
            SortKey::Negative => write!(f, "negative"),
        }
    }
}

/// Tally for one grouping key (user, teacher, or block)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bucket {
    pub key: String,
    pub count: usize,
    pub positive: usize,
    pub negative: usize,
}

impl Bucket {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            count: 0,
            positive: 0,
            negative: 0,
        }
    }

    /// Count one record with the given sentiment
    pub fn record(&mut self, sentiment: Sentiment) {
        self.count += 1;
        match sentiment {
            Sentiment::Positive => self.positive += 1,
            Sentiment::Negative => self.negative += 1,
            Sentiment::Neutral => {}
        }
    }

    /// Neutral records (counted in `count` only)
    pub fn neutral(&self) -> usize {
        self.count - self.positive - self.negative
    }

    pub fn value(&self, key: SortKey) -> usize {
        match key {
            SortKey::Count => self.count,
            SortKey::Positive => self.positive,
            SortKey::Negative => self.negative,
        }
    }
}

/// Per-user tally, with the distinct categories the user touched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserBucket {
    #[serde(flatten)]
    pub tally: Bucket,
    pub categories: std::collections::BTreeSet<String>,
}

impl UserBucket {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            tally: Bucket::new(name),
            categories: std::collections::BTreeSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.tally.key
    }
}

/// Count-only tally (categories, courses, dates, keywords)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountBucket {
    pub key: String,
    pub count: usize,
}

/// Sort buckets descending by `value`. The sort is stable, so ties keep
/// insertion order, which follows input-record order.
pub fn rank_by<T, F>(items: &mut [T], value: F)
where
    F: Fn(&T) -> usize,
{
    items.sort_by(|a, b| value(b).cmp(&value(a)));
}

/// Integer percentage rounded half-up; `None` when `total` is zero.
pub fn percent(part: usize, total: usize) -> Option<u32> {
    if total == 0 {
        return None;
    }
    Some(round_half_up(part as f64 / total as f64 * 100.0) as u32)
}

/// Round to the nearest integer, halves toward positive infinity
pub fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// Cut `text` to `max_chars` characters, appending `...` when shortened.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// Public API: load an export and build the report for one filter.
///
/// * `path` - path to the JSON export
/// * `work_dir` - directory used for config lookup
/// * `filter` - course filter tag (e.g. `all`, `jfya`)
pub fn analyze_file(
    path: &std::path::Path,
    work_dir: &std::path::Path,
    filter: &str,
) -> anyhow::Result<reporter::DashboardReport> {
    let config = crate::config::load_config(work_dir, None)?;
    let dataset = Dataset::from_path(path)?;
    let mut session = Session::new(analyzer::AnalysisEngine::from_config(&config));
    session.dispatch(Intent::Load(dataset));
    session.dispatch(Intent::SetFilter(CourseFilter::from_tag(filter)));
    session
        .report()
        .ok_or_else(|| anyhow::anyhow!("no dataset loaded"))
}
