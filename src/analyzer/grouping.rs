//! Single-pass groupings over a filtered record set
//!
//! Every grouping returns buckets in first-seen order; callers rank them
//! with a stable sort so ties follow input order.

use super::teacher::extract_teacher_name;
use crate::filter::is_test_record;
use crate::sentiment::SentimentScorer;
use crate::{group_key, is_unknown, truncate_chars, Bucket, CountBucket, FeedbackRecord, UserBucket};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Course labels longer than this are shortened
pub const COURSE_LABEL_CHARS: usize = 20;

/// What a grouping is keyed by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GroupingKind {
    User,
    Teacher,
    Block,
    Category,
    Course,
    Date,
    /// Keyword cloud terms
    Vocabulary,
    /// Negative-lexicon presence counts
    NegativeKeywords,
}

impl GroupingKind {
    pub const ALL: [GroupingKind; 8] = [
        GroupingKind::User,
        GroupingKind::Teacher,
        GroupingKind::Block,
        GroupingKind::Category,
        GroupingKind::Course,
        GroupingKind::Date,
        GroupingKind::Vocabulary,
        GroupingKind::NegativeKeywords,
    ];
}

impl std::fmt::Display for GroupingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            GroupingKind::User => "user",
            GroupingKind::Teacher => "teacher",
            GroupingKind::Block => "block",
            GroupingKind::Category => "category",
            GroupingKind::Course => "course",
            GroupingKind::Date => "date",
            GroupingKind::Vocabulary => "vocabulary",
            GroupingKind::NegativeKeywords => "negative-keywords",
        };
        write!(f, "{}", name)
    }
}

/// Result of one grouping
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Grouping {
    Users(Vec<UserBucket>),
    Tallies(Vec<Bucket>),
    Counts(Vec<CountBucket>),
}

impl Grouping {
    pub fn users(&self) -> &[UserBucket] {
        match self {
            Grouping::Users(users) => users,
            _ => &[],
        }
    }

    pub fn tallies(&self) -> &[Bucket] {
        match self {
            Grouping::Tallies(buckets) => buckets,
            _ => &[],
        }
    }

    pub fn counts(&self) -> &[CountBucket] {
        match self {
            Grouping::Counts(counts) => counts,
            _ => &[],
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Grouping::Users(v) => v.len(),
            Grouping::Tallies(v) => v.len(),
            Grouping::Counts(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Insertion-ordered accumulator
struct Accumulator<T> {
    index: HashMap<String, usize>,
    items: Vec<T>,
}

impl<T> Accumulator<T> {
    fn new() -> Self {
        Self {
            index: HashMap::new(),
            items: Vec::new(),
        }
    }

    fn entry(&mut self, key: &str, make: impl FnOnce(&str) -> T) -> &mut T {
        let i = match self.index.get(key) {
            Some(&i) => i,
            None => {
                self.index.insert(key.to_string(), self.items.len());
                self.items.push(make(key));
                self.items.len() - 1
            }
        };
        &mut self.items[i]
    }

    fn into_items(self) -> Vec<T> {
        self.items
    }
}

/// Per-user tallies. Unknown users are skipped.
pub fn by_user(records: &[&FeedbackRecord], scorer: &SentimentScorer) -> Vec<UserBucket> {
    let mut acc = Accumulator::new();
    for record in records {
        let user = record.user_key();
        if is_unknown(user) {
            continue;
        }
        let bucket = acc.entry(user, |k| UserBucket::new(k));
        bucket.tally.record(scorer.classify_record(record));
        if let Some(category) = record
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
        {
            bucket.categories.insert(category.to_string());
        }
    }
    acc.into_items()
}

/// Per-teacher tallies. Blocks without a teacher and test courses are skipped.
pub fn by_teacher(records: &[&FeedbackRecord], scorer: &SentimentScorer) -> Vec<Bucket> {
    let mut acc = Accumulator::new();
    for record in records {
        let Some(teacher) = extract_teacher_name(record.block.as_deref()) else {
            continue;
        };
        if is_test_record(record) {
            continue;
        }
        acc.entry(teacher, |k| Bucket::new(k))
            .record(scorer.classify_record(record));
    }
    acc.into_items()
}

/// Per-block tallies. Unknown blocks and test courses are skipped.
pub fn by_block(records: &[&FeedbackRecord], scorer: &SentimentScorer) -> Vec<Bucket> {
    let mut acc = Accumulator::new();
    for record in records {
        let block = record.block_key();
        if is_unknown(block) || is_test_record(record) {
            continue;
        }
        acc.entry(block, |k| Bucket::new(k))
            .record(scorer.classify_record(record));
    }
    acc.into_items()
}

fn count_by<'a, F>(records: &[&'a FeedbackRecord], key: F) -> Vec<CountBucket>
where
    F: Fn(&'a FeedbackRecord) -> Option<String>,
{
    let mut acc = Accumulator::new();
    for record in records {
        if let Some(k) = key(*record) {
            acc.entry(&k, |k| CountBucket {
                key: k.to_string(),
                count: 0,
            })
            .count += 1;
        }
    }
    acc.into_items()
}

/// Record counts per category, unknown skipped
pub fn by_category(records: &[&FeedbackRecord]) -> Vec<CountBucket> {
    count_by(records, |r| {
        let key = r.category_key();
        (!is_unknown(key)).then(|| key.to_string())
    })
}

/// Record counts per course label. Labels are cut to
/// [`COURSE_LABEL_CHARS`] characters, so long names sharing a prefix merge.
pub fn by_course(records: &[&FeedbackRecord]) -> Vec<CountBucket> {
    count_by(records, |r| {
        let key = group_key(r.course.as_deref());
        (!is_unknown(key)).then(|| truncate_chars(key, COURSE_LABEL_CHARS))
    })
}

/// Record counts per date, ascending by date string. Undated records are skipped.
pub fn by_date(records: &[&FeedbackRecord]) -> Vec<CountBucket> {
    let mut counts = count_by(records, |r| r.date_key().map(str::to_string));
    counts.sort_by(|a, b| a.key.cmp(&b.key));
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::UNKNOWN;

    fn rec(user: &str, block: &str, category: &str, content: &str) -> FeedbackRecord {
        let opt = |s: &str| (!s.is_empty()).then(|| s.to_string());
        FeedbackRecord {
            content: opt(content),
            user_name: opt(user),
            block: opt(block),
            category: opt(category),
            ..FeedbackRecord::default()
        }
    }

    #[test]
    fn test_by_user_skips_unknown_and_tracks_categories() {
        let scorer = SentimentScorer::new();
        let records = vec![
            rec("山田", "", "集客", "ありがとう"),
            rec(UNKNOWN, "", "集客", "ありがとう"),
            rec("", "", "集客", ""),
            rec("山田", "", "販売", "難しい"),
            rec("鈴木", "", "", ""),
            rec("山田", "", "集客", ""),
        ];
        let refs: Vec<&FeedbackRecord> = records.iter().collect();
        let users = by_user(&refs, &scorer);

        assert_eq!(users.len(), 2);
        assert_eq!(users[0].name(), "山田");
        assert_eq!(users[0].tally.count, 3);
        assert_eq!(users[0].tally.positive, 1);
        assert_eq!(users[0].tally.negative, 1);
        assert_eq!(users[0].categories.len(), 2);
        assert_eq!(users[1].name(), "鈴木");
        assert!(users[1].categories.is_empty());
    }

    #[test]
    fn test_by_teacher_excludes_unmatched_blocks() {
        let scorer = SentimentScorer::new();
        let records = vec![
            rec("a", "田中先生のクラス", "", "楽しい"),
            rec("b", "クラスA", "", "楽しい"),
            rec("c", "【田中先生】応用", "", "難しい"),
            rec("d", "", "", ""),
        ];
        let refs: Vec<&FeedbackRecord> = records.iter().collect();
        let teachers = by_teacher(&refs, &scorer);

        assert_eq!(teachers.len(), 1);
        assert_eq!(teachers[0].key, "田中先生");
        assert_eq!(teachers[0].count, 2);
        assert_eq!(teachers[0].positive, 1);
        assert_eq!(teachers[0].negative, 1);
    }

    #[test]
    fn test_test_courses_never_reach_teacher_or_block() {
        let scorer = SentimentScorer::new();
        let mut test = rec("a", "田中先生のクラス", "", "");
        test.course = Some("テスト用".to_string());
        let refs = vec![&test];
        assert!(by_teacher(&refs, &scorer).is_empty());
        assert!(by_block(&refs, &scorer).is_empty());
    }

    #[test]
    fn test_by_block_keeps_near_duplicates_apart() {
        let scorer = SentimentScorer::new();
        let records = vec![
            rec("a", "第1回 基礎", "", ""),
            rec("b", "第1回  基礎", "", ""),
            rec("c", " 第1回 基礎 ", "", ""),
            rec("d", UNKNOWN, "", ""),
        ];
        let refs: Vec<&FeedbackRecord> = records.iter().collect();
        let blocks = by_block(&refs, &scorer);
        let keys: Vec<&str> = blocks.iter().map(|b| b.key.as_str()).collect();
        // surrounding whitespace is trimmed, inner spacing is not normalized
        assert_eq!(keys, vec!["第1回 基礎", "第1回  基礎"]);
        assert_eq!(blocks[0].count, 2);
    }

    #[test]
    fn test_by_course_truncates_labels() {
        let long = "【13期】SC養成講座 アドバンスコース 春期";
        let records = vec![
            FeedbackRecord {
                course: Some(long.to_string()),
                ..FeedbackRecord::default()
            },
            FeedbackRecord::default(),
        ];
        let refs: Vec<&FeedbackRecord> = records.iter().collect();
        let courses = by_course(&refs);
        assert_eq!(courses.len(), 1);
        assert_eq!(courses[0].key, truncate_chars(long, COURSE_LABEL_CHARS));
        assert!(courses[0].key.ends_with("..."));
    }

    #[test]
    fn test_by_date_sorted_and_skips_undated() {
        let dated = |d: &str| FeedbackRecord {
            date: Some(d.to_string()),
            ..FeedbackRecord::default()
        };
        let records = vec![
            dated("2024-02-01"),
            dated("2024-01-15"),
            FeedbackRecord::default(),
            dated("2024-02-01"),
        ];
        let refs: Vec<&FeedbackRecord> = records.iter().collect();
        let dates = by_date(&refs);
        assert_eq!(dates.len(), 2);
        assert_eq!(dates[0].key, "2024-01-15");
        assert_eq!(dates[1].count, 2);
    }

    #[test]
    fn test_by_category_counts() {
        let records = vec![
            rec("", "", "集客", ""),
            rec("", "", "", ""),
            rec("", "", "集客", ""),
            rec("", "", "販売", ""),
        ];
        let refs: Vec<&FeedbackRecord> = records.iter().collect();
        let categories = by_category(&refs);
        assert_eq!(categories[0].key, "集客");
        assert_eq!(categories[0].count, 2);
        assert_eq!(categories.len(), 2);
    }
}
