//! Integration tests: full pipeline against test-data/feedbacks.json

use onclass_analyzer::analyzer::{AnalysisEngine, DetailTarget, EngagementHint, GroupingKind};
use onclass_analyzer::sentiment::SentimentInsight;
use onclass_analyzer::{analyze_file, CourseFilter, Intent, Session, SortKey};
use std::path::Path;

const FEEDBACKS: &str = "test-data/feedbacks.json";

fn session() -> Session {
    let mut session = Session::new(AnalysisEngine::new());
    session
        .load_path(Path::new(FEEDBACKS))
        .unwrap_or_else(|e| panic!("load({}) failed: {}", FEEDBACKS, e));
    session
}

#[test]
fn analyze_file_all() {
    let report = analyze_file(Path::new(FEEDBACKS), Path::new("test-data"), "all").unwrap();
    assert_eq!(report.total_records, 10);
    assert_eq!(report.filtered_records, 9, "test-marker course excluded");
    assert_eq!(report.sentiment.insight, Some(SentimentInsight::NeedsImprovement));
    assert_eq!(report.sentiment_score(), Some(11));
    assert!(report.source.ends_with("feedbacks.json"));
}

#[test]
fn teacher_ranking_by_count() {
    let report = session().report().unwrap();
    let keys: Vec<&str> = report
        .teachers
        .entries
        .iter()
        .map(|e| e.bucket.key.as_str())
        .collect();
    // ties keep first-seen order
    assert_eq!(keys, vec!["田中先生", "伊藤先生", "佐藤先生", "渡辺先生"]);
    assert_eq!(report.teachers.pages, 1);
    assert!(!report.teachers.has_next());
}

#[test]
fn blocks_exclude_sentinel_and_test_courses() {
    let report = session().report().unwrap();
    let keys: Vec<&str> = report
        .blocks
        .entries
        .iter()
        .map(|e| e.bucket.key.as_str())
        .collect();
    assert!(!keys.contains(&"不明"));
    assert!(!keys.contains(&"テスト先生"));
    assert_eq!(report.blocks.total, 5);
}

#[test]
fn bucket_invariants_hold() {
    let mut session = session();
    for kind in [GroupingKind::User, GroupingKind::Teacher, GroupingKind::Block] {
        let grouping = session.grouping(kind).unwrap().clone();
        let tallies: Vec<_> = match kind {
            GroupingKind::User => grouping.users().iter().map(|u| u.tally.clone()).collect(),
            _ => grouping.tallies().to_vec(),
        };
        for bucket in tallies {
            assert!(
                bucket.positive + bucket.negative <= bucket.count,
                "{}: {:?}",
                kind,
                bucket
            );
        }
    }
}

#[test]
fn category_counts_sum_to_known_categories() {
    let report = session().report().unwrap();
    let sum: usize = report.categories.iter().map(|c| c.count).sum();
    // 9 kept records, one with a blank category
    assert_eq!(sum, 8);
    assert_eq!(report.categories[0].key, "集客");
}

#[test]
fn timeline_is_ascending() {
    let report = session().report().unwrap();
    let dates: Vec<&str> = report.timeline.iter().map(|c| c.key.as_str()).collect();
    let mut sorted = dates.clone();
    sorted.sort();
    assert_eq!(dates, sorted);
    assert_eq!(dates.first(), Some(&"2024-01-10"));
}

#[test]
fn engagement_from_fixture() {
    let report = session().report().unwrap();
    let engagement = report.engagement.unwrap();
    assert_eq!(engagement.users, 4);
    assert_eq!(engagement.repeater_rate, 75);
    assert_eq!(engagement.heavy_users, 0);
    // 7 categories over 4 users, one decimal
    assert!((engagement.average_categories - 1.8).abs() < 1e-9);
    assert!(engagement.hints.contains(&EngagementHint::HighRepeat));
    assert!(engagement.hints.contains(&EngagementHint::NarrowCategories));
}

#[test]
fn improvement_summary_from_fixture() {
    let report = session().report().unwrap();
    let improvement = report.improvement.unwrap();
    assert_eq!(improvement.negative_count, 3);
    let keys: Vec<&str> = improvement.keywords.iter().map(|k| k.key.as_str()).collect();
    assert!(keys.contains(&"難しい"));
    assert!(keys.contains(&"もっと"));
}

#[test]
fn keyword_cloud_led_by_most_frequent() {
    let report = session().report().unwrap();
    assert_eq!(report.keywords[0].term, "マーケティング");
    assert_eq!(report.keywords[0].count, 3);
    assert!(report.keywords.iter().all(|k| k.count >= 2));
}

#[test]
fn filter_switch_recomputes() {
    let mut session = session();
    let all = session.report().unwrap();

    session.dispatch(Intent::SetFilter(CourseFilter::Pre));
    let pre = session.report().unwrap();
    assert_eq!(pre.filtered_records, 1);
    assert_eq!(pre.sentiment.summary.neutral, 1);
    assert!(pre.teachers.entries.is_empty());
    assert!(pre.stats.date_range.is_none());

    session.dispatch(Intent::SetFilter(CourseFilter::All));
    assert_eq!(session.report().unwrap(), all);
}

#[test]
fn user_sort_by_positive() {
    let mut session = session();
    session.dispatch(Intent::SortUsers(SortKey::Positive));
    let report = session.report().unwrap();
    assert_eq!(report.users.entries[0].name, "山田太郎");
    assert_eq!(report.users.entries[0].positive, 2);
}

#[test]
fn detail_lookups() {
    let session = session();
    let user = session.detail(DetailTarget::User("山田太郎".into())).unwrap();
    assert_eq!(user.total, 3);

    let keyword = session
        .detail(DetailTarget::Keyword("マーケティング".into()))
        .unwrap();
    assert_eq!(keyword.total, 3);

    let block = session
        .detail(DetailTarget::Block("月例交流会".into()))
        .unwrap();
    assert_eq!(block.total, 2);
}

#[test]
fn failed_reload_keeps_dataset() {
    let mut session = session();
    let before = session.report().unwrap();
    assert!(session.load_path(Path::new("test-data/invalid-shape.json")).is_err());
    assert_eq!(session.report().unwrap(), before);
}
