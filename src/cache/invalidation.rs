//! Invalidation Module
//!
//! Purges entries across named cache instances when the underlying records
//! change. Matching is plain substring search over resident keys; what a
//! subject or a date range looks like inside a key is decided by the caller.

use std::fmt;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use tracing::debug;

use crate::cache::CacheInstance;

type SubjectPattern = Box<dyn Fn(&str) -> String + Send + Sync>;
type RangePatterns = Box<dyn Fn(&DateRange) -> Option<Vec<String>> + Send + Sync>;

// == Date Range ==
/// Inclusive range of days touched by a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Builds a range, swapping the bounds if they arrive reversed.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    /// `YYYY-MM` for every calendar month the range overlaps.
    pub fn month_keys(&self) -> Vec<String> {
        let mut months = Vec::new();
        let (mut year, mut month) = (self.start.year(), self.start.month());
        let last = (self.end.year(), self.end.month());

        while (year, month) <= last {
            months.push(format!("{year:04}-{month:02}"));
            if month == 12 {
                year += 1;
                month = 1;
            } else {
                month += 1;
            }
        }
        months
    }
}

// == Invalidation Coordinator ==
/// Fans invalidations out over groups of cache instances.
///
/// Best effort only: instances are processed one after another and nothing
/// is rolled back if a later instance is skipped.
pub struct InvalidationCoordinator {
    subject_scoped: Vec<Arc<dyn CacheInstance>>,
    range_keyed: Vec<Arc<dyn CacheInstance>>,
    subject_pattern: SubjectPattern,
    range_patterns: RangePatterns,
}

impl fmt::Debug for InvalidationCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvalidationCoordinator")
            .field("subject_scoped", &instance_names(&self.subject_scoped))
            .field("range_keyed", &instance_names(&self.range_keyed))
            .finish_non_exhaustive()
    }
}

impl InvalidationCoordinator {
    /// Subject ids are matched verbatim and any range change clears the
    /// range-keyed instances outright, until overridden.
    pub fn new(
        subject_scoped: Vec<Arc<dyn CacheInstance>>,
        range_keyed: Vec<Arc<dyn CacheInstance>>,
    ) -> Self {
        Self {
            subject_scoped,
            range_keyed,
            subject_pattern: Box::new(|subject_id: &str| subject_id.to_string()),
            range_patterns: Box::new(|_: &DateRange| None),
        }
    }

    /// Maps a subject id to the substring its cache keys carry.
    pub fn with_subject_pattern<F>(mut self, pattern: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.subject_pattern = Box::new(pattern);
        self
    }

    /// Maps a date range to the substrings of overlapping keys. Returning
    /// `None` clears the range-keyed instances wholesale instead.
    pub fn with_range_patterns<F>(mut self, patterns: F) -> Self
    where
        F: Fn(&DateRange) -> Option<Vec<String>> + Send + Sync + 'static,
    {
        self.range_patterns = Box::new(patterns);
        self
    }

    // == Pattern ==
    /// Deletes every key containing `pattern` from each instance.
    ///
    /// Returns the total number of keys removed.
    pub async fn invalidate_by_pattern(instances: &[Arc<dyn CacheInstance>], pattern: &str) -> usize {
        let mut removed = 0;
        for instance in instances {
            let mut removed_here = 0;
            for key in instance.keys().await {
                if key.contains(pattern) && instance.delete(&key).await {
                    removed_here += 1;
                }
            }
            debug!(instance = %instance.name(), pattern, removed = removed_here, "Invalidated by pattern");
            removed += removed_here;
        }
        removed
    }

    // == All ==
    /// Clears every listed instance.
    pub async fn invalidate_all(instances: &[Arc<dyn CacheInstance>]) {
        for instance in instances {
            instance.clear().await;
            debug!(instance = %instance.name(), "Cleared cache instance");
        }
    }

    // == Record Changed ==
    /// Entry point for write paths: a record belonging to `subject_id` was
    /// created, updated or cancelled.
    ///
    /// Subject-scoped entries are always purged. When the write touched a
    /// date range, overlapping entries in the range-keyed instances go too.
    /// Returns the number of keys removed by pattern; wholesale clears are
    /// not counted.
    pub async fn on_record_changed(&self, subject_id: &str, affected_range: Option<DateRange>) -> usize {
        let subject = (self.subject_pattern)(subject_id);
        let mut removed = Self::invalidate_by_pattern(&self.subject_scoped, &subject).await;

        if let Some(range) = affected_range {
            match (self.range_patterns)(&range) {
                Some(patterns) => {
                    for pattern in patterns {
                        removed += Self::invalidate_by_pattern(&self.range_keyed, &pattern).await;
                    }
                }
                None => Self::invalidate_all(&self.range_keyed).await,
            }
        }

        removed
    }
}

fn instance_names(group: &[Arc<dyn CacheInstance>]) -> Vec<&str> {
    group.iter().map(|instance| instance.name()).collect()
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::TrackedCache;
    use crate::config::InstanceConfig;

    fn instance(name: &str) -> TrackedCache<u32> {
        TrackedCache::new(name, &InstanceConfig::new(60_000, 50)).unwrap()
    }

    fn erased(cache: &TrackedCache<u32>) -> Arc<dyn CacheInstance> {
        Arc::new(cache.clone())
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn sorted_keys(cache: &TrackedCache<u32>) -> Vec<String> {
        let mut keys = cache.keys().await;
        keys.sort();
        keys
    }

    #[tokio::test]
    async fn test_invalidate_by_pattern_across_instances() {
        let a = instance("a");
        let b = instance("b");
        a.set("leave-requests:1", 1, None).await;
        a.set("users:1", 2, None).await;
        b.set("api:leave-requests:list", 3, None).await;
        b.set("holidays:2024", 4, None).await;

        let removed =
            InvalidationCoordinator::invalidate_by_pattern(&[erased(&a), erased(&b)], "leave-requests").await;

        assert_eq!(removed, 2);
        assert_eq!(sorted_keys(&a).await, vec!["users:1".to_string()]);
        assert_eq!(sorted_keys(&b).await, vec!["holidays:2024".to_string()]);
    }

    #[tokio::test]
    async fn test_invalidate_by_pattern_leaves_untargeted_instances() {
        let a = instance("a");
        let b = instance("b");
        a.set("leave-requests:1", 1, None).await;
        b.set("leave-requests:1", 1, None).await;

        InvalidationCoordinator::invalidate_by_pattern(&[erased(&a)], "leave-requests").await;

        assert!(a.is_empty().await);
        assert_eq!(b.len().await, 1);
    }

    #[tokio::test]
    async fn test_invalidate_all_clears_every_instance() {
        let a = instance("a");
        let b = instance("b");
        a.set("x", 1, None).await;
        b.set("y", 2, None).await;

        InvalidationCoordinator::invalidate_all(&[erased(&a), erased(&b)]).await;
        InvalidationCoordinator::invalidate_all(&[erased(&a), erased(&b)]).await;

        assert!(a.is_empty().await);
        assert!(b.is_empty().await);
    }

    #[tokio::test]
    async fn test_on_record_changed_without_range_only_touches_subject() {
        let users = instance("users");
        let ranges = instance("ranges");
        users.set("balance:42:2024", 10, None).await;
        users.set("balance:7:2024", 11, None).await;
        ranges.set("calendar:2024-03", 12, None).await;

        let coordinator = InvalidationCoordinator::new(vec![erased(&users)], vec![erased(&ranges)])
            .with_subject_pattern(|id| format!(":{id}:"));

        let removed = coordinator.on_record_changed("42", None).await;

        assert_eq!(removed, 1);
        assert_eq!(sorted_keys(&users).await, vec!["balance:7:2024".to_string()]);
        assert_eq!(ranges.len().await, 1);
    }

    #[tokio::test]
    async fn test_on_record_changed_with_range_clears_range_instances_by_default() {
        let users = instance("users");
        let ranges = instance("ranges");
        ranges.set("calendar:2024-03", 1, None).await;
        ranges.set("calendar:2025-01", 2, None).await;

        let coordinator = InvalidationCoordinator::new(vec![erased(&users)], vec![erased(&ranges)]);
        let range = DateRange::new(date(2024, 3, 10), date(2024, 3, 12));

        coordinator.on_record_changed("42", Some(range)).await;

        assert!(ranges.is_empty().await);
    }

    #[tokio::test]
    async fn test_on_record_changed_with_month_patterns() {
        let users = instance("users");
        let ranges = instance("ranges");
        ranges.set("calendar:2024-01", 1, None).await;
        ranges.set("calendar:2024-02", 2, None).await;
        ranges.set("calendar:2024-04", 3, None).await;

        let coordinator = InvalidationCoordinator::new(vec![erased(&users)], vec![erased(&ranges)])
            .with_range_patterns(|range| Some(range.month_keys()));
        let range = DateRange::new(date(2024, 1, 30), date(2024, 2, 2));

        let removed = coordinator.on_record_changed("42", Some(range)).await;

        assert_eq!(removed, 2);
        assert_eq!(sorted_keys(&ranges).await, vec!["calendar:2024-04".to_string()]);
    }

    #[test]
    fn test_month_keys_span_year_boundary() {
        let range = DateRange::new(date(2025, 1, 5), date(2024, 11, 20));

        assert_eq!(range.start, date(2024, 11, 20));
        assert_eq!(range.month_keys(), vec!["2024-11", "2024-12", "2025-01"]);
    }
}
