//! Analyzer module - feedback aggregation engine

pub mod engine;
pub mod grouping;
pub mod keywords;
pub mod summary;
pub mod teacher;

pub use engine::AnalysisEngine;
pub use grouping::{Grouping, GroupingKind};
pub use keywords::{candidate_terms, KeywordSize, Vocabulary};
pub use summary::{
    search_users, BasicStats, DateRange, DetailEntry, DetailList, DetailTarget, DetailView,
    Engagement, EngagementHint, ImprovementSummary,
};
pub use teacher::extract_teacher_name;
