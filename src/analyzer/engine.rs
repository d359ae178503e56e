//! Analysis engine - owns the scorer, keyword extractor, and view limits

use super::grouping::{self, Grouping, GroupingKind};
use super::keywords::{negative_tally, Vocabulary};
use crate::config::{Config, Limits};
use crate::sentiment::SentimentScorer;
use crate::FeedbackRecord;
use tracing::debug;

/// Computes groupings over a filtered record set
#[derive(Debug, Clone)]
pub struct AnalysisEngine {
    scorer: SentimentScorer,
    vocabulary: Vocabulary,
    limits: Limits,
}

impl AnalysisEngine {
    /// Engine with the built-in lexicon and default limits
    pub fn new() -> Self {
        Self {
            scorer: SentimentScorer::new(),
            vocabulary: Vocabulary::default(),
            limits: Limits::default(),
        }
    }

    /// Engine configured from `.onclassrc.json` values
    pub fn from_config(config: &Config) -> Self {
        Self {
            scorer: SentimentScorer::extended(&config.lexicon.positive, &config.lexicon.negative),
            vocabulary: Vocabulary::new(&config.stop_words, config.min_keyword_occurrences()),
            limits: config.limits.resolve(),
        }
    }

    /// Replace the limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn scorer(&self) -> &SentimentScorer {
        &self.scorer
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Run one grouping. Buckets come back in first-seen order except
    /// `Date` (ascending) and the keyword groupings (most frequent first).
    pub fn group(&self, kind: GroupingKind, records: &[&FeedbackRecord]) -> Grouping {
        debug!(%kind, records = records.len(), "computing grouping");
        match kind {
            GroupingKind::User => Grouping::Users(grouping::by_user(records, &self.scorer)),
            GroupingKind::Teacher => Grouping::Tallies(grouping::by_teacher(records, &self.scorer)),
            GroupingKind::Block => Grouping::Tallies(grouping::by_block(records, &self.scorer)),
            GroupingKind::Category => Grouping::Counts(grouping::by_category(records)),
            GroupingKind::Course => Grouping::Counts(grouping::by_course(records)),
            GroupingKind::Date => Grouping::Counts(grouping::by_date(records)),
            GroupingKind::Vocabulary => Grouping::Counts(self.vocabulary.frequent(records)),
            GroupingKind::NegativeKeywords => {
                Grouping::Counts(negative_tally(records, &self.scorer))
            }
        }
    }
}

impl Default for AnalysisEngine {
    fn default() -> Self {
        Self::new()
    }
}
