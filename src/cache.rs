//! Grouping cache
//!
//! Memoizes groupings keyed by (fingerprint of the filtered record set,
//! grouping kind). Only one fingerprint is held at a time: asking for a
//! different one drops every entry.

use crate::analyzer::{Grouping, GroupingKind};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tracing::trace;

/// Identity of a filtered record set
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// SHA-256 over the dataset content hash and the filter tag
    pub fn new(dataset_hash: &str, filter_tag: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(dataset_hash.as_bytes());
        hasher.update([0u8]);
        hasher.update(filter_tag.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", &self.0[..12.min(self.0.len())])
    }
}

/// Memo of groupings for the current filter state
#[derive(Debug, Default)]
pub struct GroupingCache {
    fingerprint: Option<Fingerprint>,
    entries: HashMap<GroupingKind, Grouping>,
    hits: usize,
    misses: usize,
}

impl GroupingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fingerprint the entries belong to
    pub fn fingerprint(&self) -> Option<&Fingerprint> {
        self.fingerprint.as_ref()
    }

    /// Cached grouping, if present for this fingerprint
    pub fn get(&self, fingerprint: &Fingerprint, kind: GroupingKind) -> Option<&Grouping> {
        if self.fingerprint.as_ref() != Some(fingerprint) {
            return None;
        }
        self.entries.get(&kind)
    }

    /// Return the cached grouping or compute and store it. A new fingerprint
    /// invalidates all entries first.
    pub fn get_or_compute<F>(
        &mut self,
        fingerprint: &Fingerprint,
        kind: GroupingKind,
        compute: F,
    ) -> &Grouping
    where
        F: FnOnce() -> Grouping,
    {
        if self.fingerprint.as_ref() != Some(fingerprint) {
            trace!(%fingerprint, "fingerprint changed, clearing grouping cache");
            self.entries.clear();
            self.fingerprint = Some(fingerprint.clone());
        }
        if self.entries.contains_key(&kind) {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        self.entries.entry(kind).or_insert_with(compute)
    }

    /// Clear all cached entries
    pub fn clear(&mut self) {
        self.entries.clear();
        self.fingerprint = None;
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            hits: self.hits,
            misses: self.misses,
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: usize,
    pub misses: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CountBucket;

    fn counts(key: &str) -> Grouping {
        Grouping::Counts(vec![CountBucket {
            key: key.to_string(),
            count: 1,
        }])
    }

    #[test]
    fn test_fingerprint_depends_on_both_parts() {
        let a = Fingerprint::new("abc", "all");
        let b = Fingerprint::new("abc", "all");
        let c = Fingerprint::new("abc", "jfya");
        let d = Fingerprint::new("abd", "all");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
        assert_eq!(a.as_str().len(), 64);
    }

    #[test]
    fn test_hit_after_miss() {
        let mut cache = GroupingCache::new();
        let fp = Fingerprint::new("h", "all");

        let first = cache.get_or_compute(&fp, GroupingKind::Category, || counts("a")).clone();
        let second = cache.get_or_compute(&fp, GroupingKind::Category, || counts("b")).clone();

        assert_eq!(first, second, "second call should reuse the cached grouping");
        assert_eq!(cache.stats(), CacheStats { entries: 1, hits: 1, misses: 1 });
    }

    #[test]
    fn test_new_fingerprint_invalidates_everything() {
        let mut cache = GroupingCache::new();
        let all = Fingerprint::new("h", "all");
        let salon = Fingerprint::new("h", "salon");

        cache.get_or_compute(&all, GroupingKind::Category, || counts("a"));
        cache.get_or_compute(&all, GroupingKind::Course, || counts("a"));
        assert_eq!(cache.stats().entries, 2);

        let fresh = cache.get_or_compute(&salon, GroupingKind::Category, || counts("s")).clone();
        assert_eq!(fresh, counts("s"));
        assert_eq!(cache.stats().entries, 1);
        assert!(cache.get(&all, GroupingKind::Course).is_none());
        assert_eq!(cache.fingerprint(), Some(&salon));
    }

    #[test]
    fn test_clear() {
        let mut cache = GroupingCache::new();
        let fp = Fingerprint::new("h", "all");
        cache.get_or_compute(&fp, GroupingKind::Date, || counts("a"));
        cache.clear();
        assert_eq!(cache.stats().entries, 0);
        assert!(cache.get(&fp, GroupingKind::Date).is_none());
        assert!(cache.fingerprint().is_none());
    }
}
