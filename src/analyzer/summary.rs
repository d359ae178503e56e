//! Dashboard summaries: basic stats, improvement requests, engagement,
//! drill-down detail lists, and user search.

use super::keywords::negative_tally;
use super::teacher::extract_teacher_name;
use crate::config::Limits;
use crate::sentiment::{Sentiment, SentimentScorer};
use crate::{
    is_unknown, percent, rank_by, round_half_up, truncate_chars, CountBucket, FeedbackRecord,
    UserBucket,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Sample comments in the improvement summary are cut to this many characters
pub const SAMPLE_CHARS: usize = 120;
/// Sample comments shown per improvement category
pub const SAMPLES_PER_CATEGORY: usize = 2;
/// Negative keywords shown per improvement category
pub const KEYWORDS_PER_CATEGORY: usize = 3;
/// A user with this many records is a repeater
pub const REPEATER_MIN_RECORDS: usize = 2;
/// A user with this many records is a heavy user
pub const HEAVY_USER_MIN_RECORDS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub first: String,
    pub last: String,
}

/// Headline numbers for a record set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicStats {
    pub total: usize,
    /// Earliest and latest date string, `None` when nothing is dated
    pub date_range: Option<DateRange>,
    pub unique_users: usize,
    /// Mean comment length in characters, `None` for an empty set
    pub average_length: Option<usize>,
}

impl BasicStats {
    pub fn compute(records: &[&FeedbackRecord]) -> Self {
        let mut dates: Vec<&str> = records.iter().filter_map(|r| r.date_key()).collect();
        dates.sort_unstable();
        let date_range = match (dates.first(), dates.last()) {
            (Some(first), Some(last)) => Some(DateRange {
                first: first.to_string(),
                last: last.to_string(),
            }),
            _ => None,
        };

        let unique_users = records
            .iter()
            .map(|r| r.user_key())
            .filter(|u| !is_unknown(u))
            .collect::<std::collections::HashSet<_>>()
            .len();

        let average_length = (!records.is_empty()).then(|| {
            let chars: usize = records.iter().map(|r| r.text().chars().count()).sum();
            round_half_up(chars as f64 / records.len() as f64) as usize
        });

        Self {
            total: records.len(),
            date_range,
            unique_users,
            average_length,
        }
    }
}

/// One sample comment with its context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sample {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl Sample {
    fn of(record: &FeedbackRecord) -> Self {
        Self {
            content: truncate_chars(record.text(), SAMPLE_CHARS),
            user_name: record.user_name.clone().filter(|s| !s.is_empty()),
            block: record.block.clone().filter(|s| !s.is_empty()),
            date: record.date.clone().filter(|s| !s.is_empty()),
        }
    }
}

/// Improvement requests within one category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImprovementCategory {
    pub category: String,
    pub count: usize,
    /// Most frequent negative terms in this category
    pub top_keywords: Vec<String>,
    pub samples: Vec<Sample>,
}

/// Summary of the negative records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImprovementSummary {
    pub negative_count: usize,
    pub categories: Vec<ImprovementCategory>,
    pub keywords: Vec<CountBucket>,
}

impl ImprovementSummary {
    /// Summarize negative records; `None` when there are none.
    pub fn compute(
        records: &[&FeedbackRecord],
        scorer: &SentimentScorer,
        max_categories: usize,
        max_keywords: usize,
    ) -> Option<Self> {
        let negatives: Vec<&FeedbackRecord> = records
            .iter()
            .copied()
            .filter(|r| scorer.classify_record(r) == Sentiment::Negative)
            .collect();
        if negatives.is_empty() {
            return None;
        }

        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut groups: Vec<(&str, Vec<&FeedbackRecord>)> = Vec::new();
        for &record in &negatives {
            let category = record.category_key();
            if is_unknown(category) {
                continue;
            }
            match index.get(category) {
                Some(&i) => groups[i].1.push(record),
                None => {
                    index.insert(category, groups.len());
                    groups.push((category, vec![record]));
                }
            }
        }
        rank_by(&mut groups, |(_, members)| members.len());

        let categories = groups
            .into_iter()
            .take(max_categories)
            .map(|(category, members)| ImprovementCategory {
                category: category.to_string(),
                count: members.len(),
                top_keywords: negative_tally(&members, scorer)
                    .into_iter()
                    .take(KEYWORDS_PER_CATEGORY)
                    .map(|b| b.key)
                    .collect(),
                samples: members
                    .iter()
                    .take(SAMPLES_PER_CATEGORY)
                    .map(|r| Sample::of(r))
                    .collect(),
            })
            .collect();

        let mut keywords = negative_tally(&negatives, scorer);
        keywords.truncate(max_keywords);

        Some(Self {
            negative_count: negatives.len(),
            categories,
            keywords,
        })
    }

    /// One-line reading naming the top category and keyword
    pub fn headline(&self) -> String {
        let mut line = format!("{} improvement requests.", self.negative_count);
        if let Some(top) = self.categories.first() {
            line.push_str(&format!(
                " \"{}\" has the most with {}.",
                top.category, top.count
            ));
        }
        if let Some(top) = self.keywords.first() {
            line.push_str(&format!(
                " \"{}\" appears in {} of them.",
                top.key, top.count
            ));
        }
        line
    }
}

/// Engagement reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "kind", content = "users")]
pub enum EngagementHint {
    /// Repeater rate below 30%
    LowRepeat,
    /// Repeater rate of 50% or more
    HighRepeat,
    HeavyUsers(usize),
    /// Two or more categories per user on average
    BroadCategories,
    NarrowCategories,
}

impl EngagementHint {
    pub fn description(&self) -> String {
        match self {
            EngagementHint::LowRepeat => {
                "Repeat rate is low; strengthen follow-up with first-time participants".to_string()
            }
            EngagementHint::HighRepeat => {
                "Repeat rate is high; many learners keep coming back".to_string()
            }
            EngagementHint::HeavyUsers(n) => {
                format!("{} heavy users; they can anchor the community as core members", n)
            }
            EngagementHint::BroadCategories => {
                "Learners join several categories; the breadth of courses is paying off".to_string()
            }
            EngagementHint::NarrowCategories => {
                "Learners tend to stay in one category; promote the other courses".to_string()
            }
        }
    }
}

/// Repeat and breadth metrics over known users
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Engagement {
    pub users: usize,
    /// Share of users with two or more records, in percent
    pub repeater_rate: u32,
    pub heavy_users: usize,
    /// Mean distinct categories per user, one decimal
    pub average_categories: f64,
    pub hints: Vec<EngagementHint>,
}

impl Engagement {
    /// `None` ("no data") when there are no known users
    pub fn compute(users: &[UserBucket]) -> Option<Self> {
        let total = users.len();
        let repeaters = users
            .iter()
            .filter(|u| u.tally.count >= REPEATER_MIN_RECORDS)
            .count();
        let repeater_rate = percent(repeaters, total)?;
        let heavy_users = users
            .iter()
            .filter(|u| u.tally.count >= HEAVY_USER_MIN_RECORDS)
            .count();
        let category_sum: usize = users.iter().map(|u| u.categories.len()).sum();
        let average_categories =
            round_half_up(category_sum as f64 / total as f64 * 10.0) as f64 / 10.0;

        let mut hints = Vec::new();
        if repeater_rate < 30 {
            hints.push(EngagementHint::LowRepeat);
        } else if repeater_rate >= 50 {
            hints.push(EngagementHint::HighRepeat);
        }
        if heavy_users > 0 {
            hints.push(EngagementHint::HeavyUsers(heavy_users));
        }
        if average_categories >= 2.0 {
            hints.push(EngagementHint::BroadCategories);
        } else {
            hints.push(EngagementHint::NarrowCategories);
        }

        Some(Self {
            users: total,
            repeater_rate,
            heavy_users,
            average_categories,
            hints,
        })
    }
}

/// What a detail list drills into
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "name")]
pub enum DetailTarget {
    Teacher(String),
    Block(String),
    User(String),
    /// Any record containing the term
    Keyword(String),
    /// Negative records containing the term
    Improvement(String),
}

impl DetailTarget {
    pub fn name(&self) -> &str {
        match self {
            DetailTarget::Teacher(n)
            | DetailTarget::Block(n)
            | DetailTarget::User(n)
            | DetailTarget::Keyword(n)
            | DetailTarget::Improvement(n) => n,
        }
    }

    pub fn title(&self) -> String {
        match self {
            DetailTarget::Teacher(n) => format!("Feedback for {}", n),
            DetailTarget::Block(n) => format!("Feedback for block {}", n),
            DetailTarget::User(n) => format!("Feedback from {}", n),
            DetailTarget::Keyword(n) => format!("Feedback mentioning \"{}\"", n),
            DetailTarget::Improvement(n) => format!("Improvement requests mentioning \"{}\"", n),
        }
    }

    fn matches(&self, record: &FeedbackRecord, scorer: &SentimentScorer) -> bool {
        match self {
            DetailTarget::Teacher(n) => {
                extract_teacher_name(record.block.as_deref()) == Some(n.as_str())
            }
            DetailTarget::Block(n) => record.block_key() == n.trim(),
            DetailTarget::User(n) => record.user_key() == n.trim(),
            DetailTarget::Keyword(n) => record.text().contains(n.as_str()),
            DetailTarget::Improvement(n) => {
                record.text().contains(n.as_str())
                    && scorer.classify_record(record) == Sentiment::Negative
            }
        }
    }
}

/// Where a detail list is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetailView {
    /// Standalone list, such as a drill-down or a user search hit
    #[default]
    Panel,
    /// Expanded under a row of the user table
    Inline,
}

impl DetailView {
    /// Entry cap for `target` in this view
    pub fn cap(self, target: &DetailTarget, limits: &Limits) -> usize {
        match (self, target) {
            (DetailView::Panel, DetailTarget::User(_)) => limits.user_details,
            _ => limits.details,
        }
    }
}

/// One record in a detail list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailEntry {
    pub content: String,
    pub sentiment: Sentiment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

/// Capped list of matching records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailList {
    pub target: DetailTarget,
    pub title: String,
    /// All matches, including those past the cap
    pub total: usize,
    pub entries: Vec<DetailEntry>,
    /// Matches not shown
    pub remaining: usize,
}

impl DetailList {
    pub fn compute(
        target: DetailTarget,
        records: &[&FeedbackRecord],
        scorer: &SentimentScorer,
        cap: usize,
    ) -> Self {
        let matches: Vec<&FeedbackRecord> = records
            .iter()
            .copied()
            .filter(|r| target.matches(r, scorer))
            .collect();
        let entries: Vec<DetailEntry> = matches
            .iter()
            .take(cap)
            .map(|r| DetailEntry {
                content: r.text().to_string(),
                sentiment: scorer.classify_record(r),
                user_name: r.user_name.clone(),
                block: r.block.clone(),
                category: r.category.clone(),
                date: r.date.clone(),
            })
            .collect();
        Self {
            title: target.title(),
            total: matches.len(),
            remaining: matches.len() - entries.len(),
            entries,
            target,
        }
    }
}

/// Users whose name contains `query` (case-insensitive), most active first.
/// A blank query lists everyone.
pub fn search_users<'a>(users: &'a [UserBucket], query: &str) -> Vec<&'a UserBucket> {
    let query = query.trim().to_lowercase();
    let mut found: Vec<&UserBucket> = users
        .iter()
        .filter(|u| query.is_empty() || u.name().to_lowercase().contains(&query))
        .collect();
    rank_by(&mut found, |u| u.tally.count);
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::grouping::by_user;

    fn rec(user: &str, category: &str, content: &str) -> FeedbackRecord {
        let opt = |s: &str| (!s.is_empty()).then(|| s.to_string());
        FeedbackRecord {
            content: opt(content),
            user_name: opt(user),
            category: opt(category),
            ..FeedbackRecord::default()
        }
    }

    #[test]
    fn test_basic_stats() {
        let mut a = rec("山田", "", "あいう");
        a.date = Some("2024-03-01".to_string());
        let mut b = rec("不明", "", "あ");
        b.date = Some("2024-01-10".to_string());
        let c = rec("鈴木", "", "");
        let stats = BasicStats::compute(&[&a, &b, &c]);

        assert_eq!(stats.total, 3);
        assert_eq!(
            stats.date_range,
            Some(DateRange {
                first: "2024-01-10".to_string(),
                last: "2024-03-01".to_string()
            })
        );
        assert_eq!(stats.unique_users, 2);
        // (3 + 1 + 0) / 3 = 1.33
        assert_eq!(stats.average_length, Some(1));
    }

    #[test]
    fn test_basic_stats_empty() {
        let stats = BasicStats::compute(&[]);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.date_range, None);
        assert_eq!(stats.average_length, None);
    }

    #[test]
    fn test_improvement_absent_without_negatives() {
        let scorer = SentimentScorer::new();
        let a = rec("a", "集客", "ありがとう");
        assert!(ImprovementSummary::compute(&[&a], &scorer, 5, 10).is_none());
    }

    #[test]
    fn test_improvement_summary() {
        let scorer = SentimentScorer::new();
        let long = "難しい".repeat(50);
        let records = vec![
            rec("a", "集客", "難しい"),
            rec("b", "販売", "不安です"),
            rec("c", "集客", &long),
            rec("d", "集客", "難しいし不安"),
            rec("e", "", "難しい"),
            rec("f", "集客", "ありがとう"),
        ];
        let refs: Vec<&FeedbackRecord> = records.iter().collect();
        let summary = ImprovementSummary::compute(&refs, &scorer, 5, 10).unwrap();

        assert_eq!(summary.negative_count, 5);
        assert_eq!(summary.categories.len(), 2);
        let top = &summary.categories[0];
        assert_eq!(top.category, "集客");
        assert_eq!(top.count, 3);
        assert_eq!(top.top_keywords, vec!["難しい", "不安"]);
        assert_eq!(top.samples.len(), 2);
        assert!(top.samples[1].content.ends_with("..."));
        assert_eq!(top.samples[1].content.chars().count(), SAMPLE_CHARS + 3);

        assert_eq!(summary.keywords[0].key, "難しい");
        assert_eq!(summary.keywords[0].count, 4);
        let headline = summary.headline();
        assert!(headline.contains("集客"));
        assert!(headline.contains("難しい"));
    }

    #[test]
    fn test_engagement() {
        let scorer = SentimentScorer::new();
        let mut records = Vec::new();
        for _ in 0..5 {
            records.push(rec("heavy", "集客", ""));
        }
        records.push(rec("heavy", "販売", ""));
        records.push(rec("two", "集客", ""));
        records.push(rec("two", "集客", ""));
        records.push(rec("once", "", ""));
        records.push(rec("once2", "", ""));
        let refs: Vec<&FeedbackRecord> = records.iter().collect();
        let users = by_user(&refs, &scorer);
        let engagement = Engagement::compute(&users).unwrap();

        assert_eq!(engagement.users, 4);
        assert_eq!(engagement.repeater_rate, 50);
        assert_eq!(engagement.heavy_users, 1);
        // (2 + 1 + 0 + 0) / 4 = 0.75
        assert_eq!(engagement.average_categories, 0.8);
        assert_eq!(
            engagement.hints,
            vec![
                EngagementHint::HighRepeat,
                EngagementHint::HeavyUsers(1),
                EngagementHint::NarrowCategories
            ]
        );
    }

    #[test]
    fn test_engagement_low_repeat() {
        let scorer = SentimentScorer::new();
        let records = vec![
            rec("a", "集客", ""),
            rec("b", "販売", ""),
            rec("c", "集客", ""),
            rec("d", "販売", ""),
        ];
        let mut refs: Vec<&FeedbackRecord> = records.iter().collect();
        let extra = rec("a", "販売", "");
        refs.push(&extra);
        let users = by_user(&refs, &scorer);
        let engagement = Engagement::compute(&users).unwrap();
        // 1 of 4 users repeats
        assert_eq!(engagement.repeater_rate, 25);
        assert!(engagement.hints.contains(&EngagementHint::LowRepeat));
        assert!(engagement.hints.contains(&EngagementHint::NarrowCategories));
    }

    #[test]
    fn test_engagement_no_users() {
        assert!(Engagement::compute(&[]).is_none());
    }

    #[test]
    fn test_detail_view_caps() {
        let limits = Limits::default();
        let user = DetailTarget::User("山田".into());
        let block = DetailTarget::Block("月例会".into());
        assert_eq!(DetailView::Panel.cap(&user, &limits), 30);
        assert_eq!(DetailView::Inline.cap(&user, &limits), 20);
        assert_eq!(DetailView::Panel.cap(&block, &limits), 20);
        assert_eq!(DetailView::Inline.cap(&block, &limits), 20);
    }

    #[test]
    fn test_detail_list_caps_and_counts_remaining() {
        let scorer = SentimentScorer::new();
        let records: Vec<FeedbackRecord> = (0..25).map(|_| rec("山田", "", "集客が難しい")).collect();
        let refs: Vec<&FeedbackRecord> = records.iter().collect();

        let list = DetailList::compute(DetailTarget::User("山田".to_string()), &refs, &scorer, 20);
        assert_eq!(list.total, 25);
        assert_eq!(list.entries.len(), 20);
        assert_eq!(list.remaining, 5);
        assert_eq!(list.entries[0].sentiment, Sentiment::Negative);
    }

    #[test]
    fn test_detail_targets() {
        let scorer = SentimentScorer::new();
        let mut a = rec("a", "", "集客が楽しい");
        a.block = Some("【田中先生】集客".to_string());
        let mut b = rec("b", "", "集客が難しい");
        b.block = Some("佐藤先生の回".to_string());
        let refs = vec![&a, &b];

        let teacher = DetailList::compute(DetailTarget::Teacher("田中先生".into()), &refs, &scorer, 20);
        assert_eq!(teacher.total, 1);

        let keyword = DetailList::compute(DetailTarget::Keyword("集客".into()), &refs, &scorer, 20);
        assert_eq!(keyword.total, 2);

        let improvement =
            DetailList::compute(DetailTarget::Improvement("集客".into()), &refs, &scorer, 20);
        assert_eq!(improvement.total, 1);
        assert_eq!(improvement.entries[0].user_name.as_deref(), Some("b"));

        let block = DetailList::compute(DetailTarget::Block("佐藤先生の回".into()), &refs, &scorer, 20);
        assert_eq!(block.total, 1);
        assert_eq!(block.remaining, 0);
    }

    #[test]
    fn test_search_users() {
        let scorer = SentimentScorer::new();
        let records = vec![
            rec("Yamada", "", ""),
            rec("yamamoto", "", ""),
            rec("yamamoto", "", ""),
            rec("Suzuki", "", ""),
        ];
        let refs: Vec<&FeedbackRecord> = records.iter().collect();
        let users = by_user(&refs, &scorer);

        let found: Vec<&str> = search_users(&users, "YAMA").iter().map(|u| u.name()).collect();
        assert_eq!(found, vec!["yamamoto", "Yamada"]);
        assert_eq!(search_users(&users, "  ").len(), 3);
        assert!(search_users(&users, "tanaka").is_empty());
    }
}
