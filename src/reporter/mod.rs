//! Reporter module for output formatting
//!
//! [`DashboardReport`] is the computed view of one filter state; the
//! reporters only format it.

pub mod console;
pub mod json;
pub mod markdown;

pub use console::ConsoleReporter;
pub use json::JsonReporter;
pub use markdown::MarkdownReporter;

use crate::analyzer::{BasicStats, Engagement, ImprovementSummary, KeywordSize};
use crate::sentiment::{SentimentInsight, SentimentPercentages, SentimentSummary};
use crate::{Bucket, CountBucket, CourseFilter, SortKey, UserBucket};
use serde::Serialize;

/// Sentiment breakdown with its derived reading
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentView {
    #[serde(flatten)]
    pub summary: SentimentSummary,
    /// `None` when there is no data
    pub percentages: Option<SentimentPercentages>,
    pub insight: Option<SentimentInsight>,
}

impl SentimentView {
    pub fn new(summary: SentimentSummary) -> Self {
        Self {
            percentages: summary.percentages(),
            insight: summary.insight(),
            summary,
        }
    }
}

/// A bucket with its 1-based rank
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedBucket {
    pub rank: usize,
    #[serde(flatten)]
    pub bucket: Bucket,
}

/// Rank buckets already in display order, starting at `first_rank`
pub fn ranked(buckets: impl IntoIterator<Item = Bucket>, first_rank: usize) -> Vec<RankedBucket> {
    buckets
        .into_iter()
        .enumerate()
        .map(|(i, bucket)| RankedBucket {
            rank: first_rank + i,
            bucket,
        })
        .collect()
}

/// Block ranking
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ranking {
    pub sort: SortKey,
    /// Buckets before truncation
    pub total: usize,
    pub entries: Vec<RankedBucket>,
}

/// One page of the teacher ranking
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherPage {
    pub sort: SortKey,
    /// Zero-based page index
    pub page: usize,
    /// Page count; zero when there are no teachers
    pub pages: usize,
    pub total: usize,
    pub entries: Vec<RankedBucket>,
}

impl TeacherPage {
    pub fn has_previous(&self) -> bool {
        self.page > 0
    }

    pub fn has_next(&self) -> bool {
        self.page + 1 < self.pages
    }
}

/// Row of the user table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRow {
    pub name: String,
    pub count: usize,
    pub positive: usize,
    pub negative: usize,
    /// Distinct categories touched
    pub categories: usize,
}

impl From<&UserBucket> for UserRow {
    fn from(user: &UserBucket) -> Self {
        Self {
            name: user.name().to_string(),
            count: user.tally.count,
            positive: user.tally.positive,
            negative: user.tally.negative,
            categories: user.categories.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserTable {
    pub sort: SortKey,
    /// Known users before truncation
    pub total: usize,
    pub entries: Vec<UserRow>,
}

/// Keyword cloud entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordEntry {
    pub term: String,
    pub count: usize,
    pub size: KeywordSize,
}

/// Size keywords relative to the first (most frequent) one
pub fn keyword_cloud(counts: &[CountBucket], limit: usize) -> Vec<KeywordEntry> {
    let max = counts.first().map(|c| c.count).unwrap_or(1);
    counts
        .iter()
        .take(limit)
        .map(|c| KeywordEntry {
            term: c.key.clone(),
            count: c.count,
            size: KeywordSize::for_ratio(c.count, max),
        })
        .collect()
}

/// Everything the dashboard shows for one filter state
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardReport {
    pub source: String,
    pub filter: CourseFilter,
    pub filter_label: String,
    /// "Showing all N" or "label: n of N"
    pub scope: String,
    pub total_records: usize,
    pub filtered_records: usize,
    pub stats: BasicStats,
    pub sentiment: SentimentView,
    /// Absent when no record is negative
    pub improvement: Option<ImprovementSummary>,
    pub teachers: TeacherPage,
    pub blocks: Ranking,
    pub categories: Vec<CountBucket>,
    pub courses: Vec<CountBucket>,
    pub timeline: Vec<CountBucket>,
    pub keywords: Vec<KeywordEntry>,
    pub users: UserTable,
    /// Absent when there are no known users
    pub engagement: Option<Engagement>,
}

impl DashboardReport {
    /// positive% minus negative%, `None` without data
    pub fn sentiment_score(&self) -> Option<i32> {
        self.sentiment.percentages.map(|p| p.score)
    }

    /// Whether the sentiment score falls below `threshold`. An empty
    /// record set never fails the threshold.
    pub fn below_threshold(&self, threshold: i32) -> bool {
        self.sentiment_score().is_some_and(|score| score < threshold)
    }
}

/// Format a signed score with an explicit plus sign
pub fn signed(score: i32) -> String {
    if score > 0 {
        format!("+{}", score)
    } else {
        score.to_string()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::analyzer::{DateRange, EngagementHint};
    use crate::analyzer::summary::{ImprovementCategory, Sample};

    fn bucket(key: &str, count: usize, positive: usize, negative: usize) -> Bucket {
        Bucket {
            key: key.to_string(),
            count,
            positive,
            negative,
        }
    }

    fn count(key: &str, count: usize) -> CountBucket {
        CountBucket {
            key: key.to_string(),
            count,
        }
    }

    /// A small hand-built report for formatter tests
    pub fn sample_report() -> DashboardReport {
        let summary = SentimentSummary {
            total: 4,
            positive: 2,
            negative: 1,
            neutral: 1,
        };
        DashboardReport {
            source: "feedbacks.json".to_string(),
            filter: CourseFilter::Jfya,
            filter_label: "JFYA".to_string(),
            scope: "JFYA: 4 of 6 feedbacks".to_string(),
            total_records: 6,
            filtered_records: 4,
            stats: BasicStats {
                total: 4,
                date_range: Some(DateRange {
                    first: "2024-01-05".to_string(),
                    last: "2024-02-10".to_string(),
                }),
                unique_users: 3,
                average_length: Some(12),
            },
            sentiment: SentimentView::new(summary),
            improvement: Some(ImprovementSummary {
                negative_count: 1,
                categories: vec![ImprovementCategory {
                    category: "集客".to_string(),
                    count: 1,
                    top_keywords: vec!["難しい".to_string()],
                    samples: vec![Sample {
                        content: "少し難しい".to_string(),
                        user_name: Some("鈴木".to_string()),
                        block: None,
                        date: Some("2024-02-10".to_string()),
                    }],
                }],
                keywords: vec![count("難しい", 1)],
            }),
            teachers: TeacherPage {
                sort: SortKey::Count,
                page: 0,
                pages: 1,
                total: 2,
                entries: ranked(vec![bucket("田中先生", 3, 2, 1), bucket("佐藤先生", 1, 0, 0)], 1),
            },
            blocks: Ranking {
                sort: SortKey::Positive,
                total: 1,
                entries: ranked(vec![bucket("田中先生の回", 3, 2, 1)], 1),
            },
            categories: vec![count("集客", 3), count("販売", 1)],
            courses: vec![count("JFYA本科", 4)],
            timeline: vec![count("2024-01-05", 3), count("2024-02-10", 1)],
            keywords: keyword_cloud(&[count("マーケティング", 3), count("集客の話", 2)], 25),
            users: UserTable {
                sort: SortKey::Count,
                total: 3,
                entries: vec![UserRow {
                    name: "山田".to_string(),
                    count: 2,
                    positive: 2,
                    negative: 0,
                    categories: 1,
                }],
            },
            engagement: Some(Engagement {
                users: 3,
                repeater_rate: 33,
                heavy_users: 0,
                average_categories: 1.0,
                hints: vec![EngagementHint::NarrowCategories],
            }),
        }
    }
}
