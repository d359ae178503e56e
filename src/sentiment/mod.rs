//! Keyword-list sentiment scoring
//!
//! A comment's score is the number of distinct positive terms it contains
//! minus the number of distinct negative terms. Matching is case-sensitive
//! substring containment; there is no stemming, weighting, or negation
//! handling, so "not good" still counts as good.

pub mod lexicon;

use crate::{percent, FeedbackRecord};
use serde::{Deserialize, Serialize};

/// Sentiment class derived from the sign of the score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    pub fn from_score(score: i32) -> Self {
        match score {
            s if s > 0 => Sentiment::Positive,
            s if s < 0 => Sentiment::Negative,
            _ => Sentiment::Neutral,
        }
    }
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sentiment::Positive => write!(f, "positive"),
            Sentiment::Negative => write!(f, "negative"),
            Sentiment::Neutral => write!(f, "neutral"),
        }
    }
}

/// Scores text against a positive and a negative term list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentimentScorer {
    positive: Vec<String>,
    negative: Vec<String>,
}

impl SentimentScorer {
    /// Scorer over the built-in lexicon
    pub fn new() -> Self {
        Self::with_terms(lexicon::POSITIVE, lexicon::NEGATIVE)
    }

    /// Scorer over custom term lists. Blank terms are dropped and repeats
    /// collapsed so each term counts at most once per comment.
    pub fn with_terms<P, N>(positive: &[P], negative: &[N]) -> Self
    where
        P: AsRef<str>,
        N: AsRef<str>,
    {
        Self {
            positive: dedup_terms(positive.iter().map(AsRef::as_ref)),
            negative: dedup_terms(negative.iter().map(AsRef::as_ref)),
        }
    }

    /// Extend the built-in lexicon with extra terms
    pub fn extended<P, N>(extra_positive: &[P], extra_negative: &[N]) -> Self
    where
        P: AsRef<str>,
        N: AsRef<str>,
    {
        let positive: Vec<&str> = lexicon::POSITIVE
            .iter()
            .copied()
            .chain(extra_positive.iter().map(AsRef::as_ref))
            .collect();
        let negative: Vec<&str> = lexicon::NEGATIVE
            .iter()
            .copied()
            .chain(extra_negative.iter().map(AsRef::as_ref))
            .collect();
        Self::with_terms(&positive, &negative)
    }

    pub fn positive_terms(&self) -> &[String] {
        &self.positive
    }

    pub fn negative_terms(&self) -> &[String] {
        &self.negative
    }

    /// Distinct positive terms found minus distinct negative terms found
    pub fn score(&self, text: &str) -> i32 {
        let hits = |terms: &[String]| terms.iter().filter(|t| text.contains(t.as_str())).count();
        hits(&self.positive) as i32 - hits(&self.negative) as i32
    }

    pub fn classify(&self, text: &str) -> Sentiment {
        Sentiment::from_score(self.score(text))
    }

    /// Classify a record by its comment (absent comment is neutral)
    pub fn classify_record(&self, record: &FeedbackRecord) -> Sentiment {
        self.classify(record.text())
    }

    /// Tally a record set into a summary
    pub fn summarize(&self, records: &[&FeedbackRecord]) -> SentimentSummary {
        let mut summary = SentimentSummary::default();
        for record in records {
            match self.classify_record(record) {
                Sentiment::Positive => summary.positive += 1,
                Sentiment::Negative => summary.negative += 1,
                Sentiment::Neutral => summary.neutral += 1,
            }
        }
        summary.total = records.len();
        summary
    }
}

impl Default for SentimentScorer {
    fn default() -> Self {
        Self::new()
    }
}

fn dedup_terms<'a>(terms: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for term in terms {
        let term = term.trim();
        if !term.is_empty() && !out.iter().any(|t| t == term) {
            out.push(term.to_string());
        }
    }
    out
}

/// Positive/negative/neutral tally over a record set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentSummary {
    pub total: usize,
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
}

/// Percentage view of a summary, only defined for non-empty sets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentPercentages {
    pub positive: u32,
    pub negative: u32,
    pub neutral: u32,
    /// positive% minus negative%
    pub score: i32,
}

/// Headline reading of the percentages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SentimentInsight {
    /// 70% or more positive
    Excellent,
    /// 30% or more negative
    NeedsImprovement,
    Stable,
}

impl SentimentInsight {
    pub fn description(&self) -> &'static str {
        match self {
            SentimentInsight::Excellent => {
                "Excellent satisfaction - most comments are positive; check whether clarity and felt results come up often"
            }
            SentimentInsight::NeedsImprovement => {
                "Room for improvement - look for \"difficult\" or \"can't keep up\" comments and consider pacing or follow-up"
            }
            SentimentInsight::Stable => {
                "Stable reception - dig into the neutral comments to find what would exceed expectations"
            }
        }
    }
}

impl SentimentSummary {
    /// Percentages, or `None` ("no data") for an empty set
    pub fn percentages(&self) -> Option<SentimentPercentages> {
        let positive = percent(self.positive, self.total)?;
        let negative = percent(self.negative, self.total)?;
        let neutral = 100u32.saturating_sub(positive + negative);
        Some(SentimentPercentages {
            positive,
            negative,
            neutral,
            score: positive as i32 - negative as i32,
        })
    }

    pub fn insight(&self) -> Option<SentimentInsight> {
        let pct = self.percentages()?;
        Some(if pct.positive >= 70 {
            SentimentInsight::Excellent
        } else if pct.negative >= 30 {
            SentimentInsight::NeedsImprovement
        } else {
            SentimentInsight::Stable
        })
    }
}


#[cfg(test)]
mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    fn fragment() -> impl Strategy<Value = String> {
        prop::collection::vec(
            prop::sample::select(vec![
                "ありがとう", "わかりやすい", "難しい", "改善", "もっと", "楽しい",
                "普通", "、", "。", "でした", "先生", " ", "abc",
            ]),
            0..12,
        )
        .prop_map(|parts| parts.concat())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn score_is_distinct_positive_minus_distinct_negative(ref text in fragment()) {
            let scorer = SentimentScorer::new();
            let pos = lexicon::POSITIVE.iter().filter(|t| text.contains(**t)).count() as i32;
            let neg = lexicon::NEGATIVE.iter().filter(|t| text.contains(**t)).count() as i32;
            prop_assert_eq!(scorer.score(text), pos - neg);
        }

        #[test]
        fn classification_follows_score_sign(ref text in fragment()) {
            let scorer = SentimentScorer::new();
            let expected = Sentiment::from_score(scorer.score(text));
            prop_assert_eq!(scorer.classify(text), expected);
        }

        #[test]
        fn summary_counts_partition_total(texts in prop::collection::vec(fragment(), 0..20)) {
            let scorer = SentimentScorer::new();
            let records: Vec<FeedbackRecord> = texts
                .into_iter()
                .map(|t| FeedbackRecord { content: Some(t), ..FeedbackRecord::default() })
                .collect();
            let refs: Vec<&FeedbackRecord> = records.iter().collect();
            let summary = scorer.summarize(&refs);
            prop_assert_eq!(summary.positive + summary.negative + summary.neutral, summary.total);
        }
    }
}
