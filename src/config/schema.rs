//! Config schema and deserialization

use serde::{Deserialize, Serialize};

/// Extra sentiment terms appended to the built-in lexicon
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LexiconConfig {
    #[serde(default)]
    pub positive: Vec<String>,
    #[serde(default)]
    pub negative: Vec<String>,
}

/// Optional list sizes; unset values fall back to [`Limits::default`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub users: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocks: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teachers_per_page: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub courses: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub improvement_keywords: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub improvement_categories: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_details: Option<usize>,
}

impl LimitsConfig {
    /// Fill unset fields from `base`
    fn merge_from(&mut self, base: LimitsConfig) {
        self.users = self.users.or(base.users);
        self.blocks = self.blocks.or(base.blocks);
        self.teachers_per_page = self.teachers_per_page.or(base.teachers_per_page);
        self.categories = self.categories.or(base.categories);
        self.courses = self.courses.or(base.courses);
        self.keywords = self.keywords.or(base.keywords);
        self.improvement_keywords = self.improvement_keywords.or(base.improvement_keywords);
        self.improvement_categories = self
            .improvement_categories
            .or(base.improvement_categories);
        self.details = self.details.or(base.details);
        self.user_details = self.user_details.or(base.user_details);
    }

    /// Resolve against the defaults. A page size of zero is treated as one.
    pub fn resolve(&self) -> Limits {
        let d = Limits::default();
        Limits {
            users: self.users.unwrap_or(d.users),
            blocks: self.blocks.unwrap_or(d.blocks),
            teachers_per_page: self.teachers_per_page.unwrap_or(d.teachers_per_page).max(1),
            categories: self.categories.unwrap_or(d.categories),
            courses: self.courses.unwrap_or(d.courses),
            keywords: self.keywords.unwrap_or(d.keywords),
            improvement_keywords: self.improvement_keywords.unwrap_or(d.improvement_keywords),
            improvement_categories: self
                .improvement_categories
                .unwrap_or(d.improvement_categories),
            details: self.details.unwrap_or(d.details),
            user_details: self.user_details.unwrap_or(d.user_details),
        }
    }
}

/// Resolved list sizes used by the analysis views
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Limits {
    /// User table rows
    pub users: usize,
    /// Block ranking rows
    pub blocks: usize,
    /// Teacher ranking page size
    pub teachers_per_page: usize,
    pub categories: usize,
    pub courses: usize,
    /// Keyword cloud size
    pub keywords: usize,
    pub improvement_keywords: usize,
    pub improvement_categories: usize,
    /// Detail list cap for teacher, block, and keyword lookups
    pub details: usize,
    /// Detail list cap for standalone user lookups; rows expanded inline
    /// under the user table use `details`
    pub user_details: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            users: 15,
            blocks: 10,
            teachers_per_page: 5,
            categories: 8,
            courses: 8,
            keywords: 25,
            improvement_keywords: 10,
            improvement_categories: 5,
            details: 20,
            user_details: 30,
        }
    }
}

/// Default minimum occurrences for a keyword to appear in the cloud
pub const DEFAULT_MIN_KEYWORD_OCCURRENCES: usize = 2;

/// Root config structure for .onclassrc.json
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Extend another config file (path relative to this config)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,

    /// Default course filter tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,

    /// Minimum sentiment score (positive% minus negative%); exit 1 if below
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<i32>,

    /// Additional sentiment terms
    #[serde(default)]
    pub lexicon: LexiconConfig,

    /// Additional keyword stop words
    #[serde(default)]
    pub stop_words: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_keyword_occurrences: Option<usize>,

    #[serde(default)]
    pub limits: LimitsConfig,
}

impl Config {
    /// Merge CLI overrides into config. CLI values take precedence.
    pub fn merge_with_cli(mut self, cli_filter: Option<&str>, cli_threshold: Option<i32>) -> Self {
        if let Some(filter) = cli_filter {
            self.filter = Some(filter.to_string());
        }
        if cli_threshold.is_some() {
            self.threshold = cli_threshold;
        }
        self
    }

    /// Merge another config into this one (for extends)
    pub fn merge_from(&mut self, base: Config) {
        // Base values are overridden by this config's values
        if self.extends.is_none() {
            self.extends = base.extends;
        }
        if self.filter.is_none() {
            self.filter = base.filter;
        }
        if self.threshold.is_none() {
            self.threshold = base.threshold;
        }
        if self.min_keyword_occurrences.is_none() {
            self.min_keyword_occurrences = base.min_keyword_occurrences;
        }

        // Term lists accumulate, base first
        let mut positive = base.lexicon.positive;
        positive.append(&mut self.lexicon.positive);
        self.lexicon.positive = positive;

        let mut negative = base.lexicon.negative;
        negative.append(&mut self.lexicon.negative);
        self.lexicon.negative = negative;

        let mut stop_words = base.stop_words;
        stop_words.append(&mut self.stop_words);
        self.stop_words = stop_words;

        self.limits.merge_from(base.limits);
    }

    /// Filter tag to use when none is given on the command line
    pub fn filter_tag(&self) -> &str {
        self.filter.as_deref().unwrap_or("all")
    }

    pub fn min_keyword_occurrences(&self) -> usize {
        self.min_keyword_occurrences
            .unwrap_or(DEFAULT_MIN_KEYWORD_OCCURRENCES)
    }
}
