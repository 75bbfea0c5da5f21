//! Cache Registry Module
//!
//! The application's named cache instances, each with its own TTL, capacity
//! and lock. Built once at startup and handed to whoever needs it.

use std::sync::Arc;

use serde_json::Value;

use crate::cache::{CacheAside, CacheInstance, InvalidationCoordinator, TrackedCache};
use crate::config::Config;
use crate::error::Result;

pub const RESPONSES: &str = "responses";
pub const USERS: &str = "users";
pub const RANGES: &str = "ranges";
pub const STATS: &str = "stats";

/// Separates the segments of a cache key.
pub const KEY_DELIMITER: char = ':';

/// JSON-valued cache instance; typed access goes through
/// [`TrackedCache::get_json`] / [`TrackedCache::set_json`].
pub type NamedCache = CacheAside<Value>;

// == Cache Registry ==
#[derive(Clone)]
pub struct CacheRegistry {
    /// Raw API responses
    pub responses: NamedCache,
    /// Per-user data (balances, profiles)
    pub users: NamedCache,
    /// List and calendar range lookups
    pub ranges: NamedCache,
    /// Slow-changing aggregates
    pub stats: NamedCache,
}

impl CacheRegistry {
    /// Builds every instance, failing on the first invalid configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            responses: CacheAside::new(TrackedCache::new(RESPONSES, &config.responses)?),
            users: CacheAside::new(TrackedCache::new(USERS, &config.users)?),
            ranges: CacheAside::new(TrackedCache::new(RANGES, &config.ranges)?),
            stats: CacheAside::new(TrackedCache::new(STATS, &config.stats)?),
        })
    }

    /// Every instance, in a fixed order.
    pub fn instances(&self) -> Vec<Arc<dyn CacheInstance>> {
        [&self.responses, &self.users, &self.ranges, &self.stats]
            .into_iter()
            .map(|named| Arc::new(named.cache().clone()) as Arc<dyn CacheInstance>)
            .collect()
    }

    /// Looks an instance up by name.
    pub fn instance(&self, name: &str) -> Option<Arc<dyn CacheInstance>> {
        self.instances()
            .into_iter()
            .find(|instance| instance.name() == name)
    }

    /// Wires the coordinator used by write paths.
    ///
    /// Subject-scoped keys (users, responses) carry the subject id as a whole
    /// segment, `prefix:<subject>:<params>`, so subject `4` never matches
    /// `balance:42:2024`. Range-keyed keys (ranges, stats) carry a `YYYY-MM`
    /// segment and are purged per month the changed range overlaps.
    pub fn coordinator(&self) -> InvalidationCoordinator {
        let erase = |named: &NamedCache| Arc::new(named.cache().clone()) as Arc<dyn CacheInstance>;
        InvalidationCoordinator::new(
            vec![erase(&self.users), erase(&self.responses)],
            vec![erase(&self.ranges), erase(&self.stats)],
        )
        .with_subject_pattern(subject_segment)
        .with_range_patterns(|range| Some(range.month_keys()))
    }
}

/// The substring marking a subject's keys: the id between two delimiters.
pub fn subject_segment(subject_id: &str) -> String {
    format!("{KEY_DELIMITER}{subject_id}{KEY_DELIMITER}")
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::DateRange;
    use crate::config::InstanceConfig;
    use chrono::NaiveDate;
    use serde_json::json;

    fn registry() -> CacheRegistry {
        CacheRegistry::from_config(&Config::default()).unwrap()
    }

    #[tokio::test]
    async fn test_instances_are_independent() {
        let registry = registry();

        registry.users.cache().set("u:1", json!(1), None).await;

        assert_eq!(registry.users.cache().len().await, 1);
        assert!(registry.responses.cache().is_empty().await);
        assert_eq!(registry.users.cache().stats().await.capacity, 100);
        assert_eq!(registry.stats.cache().stats().await.capacity, 50);
    }

    #[tokio::test]
    async fn test_lookup_by_name() {
        let registry = registry();

        let names: Vec<String> = registry
            .instances()
            .iter()
            .map(|instance| instance.name().to_string())
            .collect();
        assert_eq!(names, vec![RESPONSES, USERS, RANGES, STATS]);
        assert!(registry.instance(RANGES).is_some());
        assert!(registry.instance("sessions").is_none());
    }

    #[test]
    fn test_from_config_fails_fast() {
        let config = Config {
            ranges: InstanceConfig::new(0, 10),
            ..Config::default()
        };
        assert!(CacheRegistry::from_config(&config).is_err());
    }

    #[tokio::test]
    async fn test_coordinator_wiring() {
        let registry = registry();
        registry.users.cache().set("balance:42:2024", json!(3), None).await;
        registry.responses.cache().set("api:42:/balances", json!({}), None).await;
        registry.responses.cache().set("api:7:/balances", json!({}), None).await;
        registry.ranges.cache().set("calendar:2024-05", json!([]), None).await;
        registry.ranges.cache().set("calendar:2024-07", json!([]), None).await;
        registry.stats.cache().set("totals:2024-05", json!(99), None).await;

        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 5, 3).unwrap(),
        );
        let removed = registry.coordinator().on_record_changed("42", Some(range)).await;

        assert_eq!(removed, 4);
        assert!(registry.users.cache().is_empty().await);
        assert_eq!(registry.responses.cache().keys().await, vec!["api:7:/balances".to_string()]);
        assert_eq!(registry.ranges.cache().keys().await, vec!["calendar:2024-07".to_string()]);
        assert!(registry.stats.cache().is_empty().await);
    }

    #[tokio::test]
    async fn test_subject_matches_whole_segment_only() {
        let registry = registry();
        registry.users.cache().set("balance:42:2024", json!(3), None).await;
        registry.users.cache().set("balance:4:2024", json!(1), None).await;
        registry.ranges.cache().set("calendar:2024-03", json!([]), None).await;

        let removed = registry.coordinator().on_record_changed("4", None).await;

        assert_eq!(removed, 1);
        assert_eq!(registry.users.cache().keys().await, vec!["balance:42:2024".to_string()]);
        assert!(registry.ranges.cache().has("calendar:2024-03").await);
        assert_eq!(subject_segment("4"), ":4:");
    }
}
