//! Course filters
//!
//! A filter tag selects a course subpopulation by substring match on the
//! record's `course`. Records from test courses are always dropped.

use crate::FeedbackRecord;
use serde::{Deserialize, Serialize};

/// Course marker for test data; such records never reach any report.
pub const TEST_COURSE_MARKER: &str = "テスト用";

/// True when the record belongs to a test course
pub fn is_test_record(record: &FeedbackRecord) -> bool {
    record.course_name().contains(TEST_COURSE_MARKER)
}

/// Course filter selected by tag
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CourseFilter {
    /// Every course
    #[default]
    All,
    /// Courses containing "jfya" (case-insensitive)
    Jfya,
    /// Online salon
    Salon,
    /// SC training course
    Sc,
    /// FC training course
    Fc,
    /// PRE training course
    Pre,
    /// Unrecognized tag; behaves like `All`
    Other(String),
}

impl CourseFilter {
    /// Every recognized tag, in display order
    pub const KNOWN: [CourseFilter; 6] = [
        CourseFilter::All,
        CourseFilter::Jfya,
        CourseFilter::Salon,
        CourseFilter::Sc,
        CourseFilter::Fc,
        CourseFilter::Pre,
    ];

    /// Parse a tag. Matching is exact and lowercase; anything else is kept
    /// as `Other` and filters nothing.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "all" => CourseFilter::All,
            "jfya" => CourseFilter::Jfya,
            "salon" => CourseFilter::Salon,
            "sc" => CourseFilter::Sc,
            "fc" => CourseFilter::Fc,
            "pre" => CourseFilter::Pre,
            other => CourseFilter::Other(other.to_string()),
        }
    }

    pub fn tag(&self) -> &str {
        match self {
            CourseFilter::All => "all",
            CourseFilter::Jfya => "jfya",
            CourseFilter::Salon => "salon",
            CourseFilter::Sc => "sc",
            CourseFilter::Fc => "fc",
            CourseFilter::Pre => "pre",
            CourseFilter::Other(tag) => tag,
        }
    }

    /// Human-readable course label
    pub fn label(&self) -> &'static str {
        match self {
            CourseFilter::Jfya => "JFYA",
            CourseFilter::Salon => "オンラインサロン",
            CourseFilter::Sc => "【13期】SC養成講座",
            CourseFilter::Fc => "【13期】FC養成講座",
            CourseFilter::Pre => "【13期】PRE養成講座",
            CourseFilter::All | CourseFilter::Other(_) => "すべてのコース",
        }
    }

    /// Whether this is the unfiltered view (tag `all`)
    pub fn is_all(&self) -> bool {
        matches!(self, CourseFilter::All)
    }

    /// Whether a course name satisfies this filter's rule
    pub fn matches_course(&self, course: &str) -> bool {
        match self {
            CourseFilter::All | CourseFilter::Other(_) => true,
            CourseFilter::Jfya => course.to_lowercase().contains("jfya"),
            CourseFilter::Salon => course.contains("オンラインサロン"),
            CourseFilter::Sc => course.contains("SC養成講座"),
            CourseFilter::Fc => course.contains("FC養成講座"),
            CourseFilter::Pre => course.contains("PRE養成講座"),
        }
    }

    /// Whether a record passes: not a test record, and its course matches
    pub fn accepts(&self, record: &FeedbackRecord) -> bool {
        !is_test_record(record) && self.matches_course(record.course_name())
    }

    /// Apply the filter, keeping input order
    pub fn apply<'a, I>(&self, records: I) -> Vec<&'a FeedbackRecord>
    where
        I: IntoIterator<Item = &'a FeedbackRecord>,
    {
        records.into_iter().filter(|r| self.accepts(r)).collect()
    }

    /// Scope line: everything when unfiltered, otherwise the share shown
    pub fn scope_line(&self, filtered: usize, total: usize) -> String {
        if self.is_all() {
            format!("Showing all {} feedbacks", total)
        } else {
            format!("{}: {} of {} feedbacks", self.label(), filtered, total)
        }
    }
}

impl From<String> for CourseFilter {
    fn from(tag: String) -> Self {
        CourseFilter::from_tag(&tag)
    }
}

impl From<CourseFilter> for String {
    fn from(filter: CourseFilter) -> Self {
        filter.tag().to_string()
    }
}

impl std::str::FromStr for CourseFilter {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(CourseFilter::from_tag(s))
    }
}

impl std::fmt::Display for CourseFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}
