use crate::config::CacheConfig;
use crate::types::{Presentation, Slide};
use moka::sync::Cache;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::time::Duration;

/// Process-lifetime cache with three independent partitions:
/// presentations by id, generation results by parameter hash, and generic
/// API responses (also the backing store for rate-limit counters).
pub struct DeckCache {
    entity: Cache<String, Presentation>,
    generation: Cache<String, Vec<Slide>>,
    response: Cache<String, serde_json::Value>,
    config: CacheConfig,
}

#[derive(Debug, Serialize)]
pub struct PartitionStats {
    pub size: u64,
    pub capacity: u64,
    pub ttl_secs: u64,
}

#[derive(Debug, Serialize)]
pub struct CacheStats {
    pub entity: PartitionStats,
    pub generation: PartitionStats,
    pub response: PartitionStats,
}

impl DeckCache {
    pub fn new(config: CacheConfig) -> Self {
        let entity = Cache::builder()
            .max_capacity(config.entity_capacity)
            .time_to_live(Duration::from_secs(config.entity_ttl_secs))
            .build();
        let generation = Cache::builder()
            .max_capacity(config.generation_capacity)
            .time_to_live(Duration::from_secs(config.generation_ttl_secs))
            .build();
        let response = Cache::builder()
            .max_capacity(config.response_capacity)
            .time_to_live(Duration::from_secs(config.response_ttl_secs))
            .build();
        Self {
            entity,
            generation,
            response,
            config,
        }
    }

    pub fn get_presentation(&self, id: &str) -> Option<Presentation> {
        self.entity.get(id)
    }

    pub fn set_presentation(&self, presentation: &Presentation) {
        self.entity
            .insert(presentation.id.clone(), presentation.clone());
    }

    pub fn delete_presentation(&self, id: &str) {
        self.entity.invalidate(id);
    }

    pub fn get_generation(&self, key: &str) -> Option<Vec<Slide>> {
        self.generation.get(key)
    }

    pub fn set_generation(&self, key: String, slides: Vec<Slide>) {
        self.generation.insert(key, slides);
    }

    pub fn get_response(&self, key: &str) -> Option<serde_json::Value> {
        self.response.get(key)
    }

    pub fn set_response(&self, key: String, value: serde_json::Value) {
        self.response.insert(key, value);
    }

    pub fn clear_all(&self) {
        self.entity.invalidate_all();
        self.generation.invalidate_all();
        self.response.invalidate_all();
    }

    pub fn stats(&self) -> CacheStats {
        // entry_count is eventually consistent; flush pending maintenance
        // so stats reflect recent inserts and invalidations.
        self.entity.run_pending_tasks();
        self.generation.run_pending_tasks();
        self.response.run_pending_tasks();
        CacheStats {
            entity: PartitionStats {
                size: self.entity.entry_count(),
                capacity: self.config.entity_capacity,
                ttl_secs: self.config.entity_ttl_secs,
            },
            generation: PartitionStats {
                size: self.generation.entry_count(),
                capacity: self.config.generation_capacity,
                ttl_secs: self.config.generation_ttl_secs,
            },
            response: PartitionStats {
                size: self.response.entry_count(),
                capacity: self.config.response_capacity,
                ttl_secs: self.config.response_ttl_secs,
            },
        }
    }
}

/// Stable key: SHA-256 hex of the canonical JSON serialization of the
/// parameters. Identical calls collide, differing calls do not.
pub fn stable_key<T: Serialize>(params: &T) -> String {
    let canonical = serde_json::to_string(params).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    hex::encode(hasher.finalize())
}

/// Key for the generic response partition: endpoint plus sorted params.
pub fn response_key(endpoint: &str, params: &serde_json::Value) -> String {
    stable_key(&serde_json::json!({ "endpoint": endpoint, "params": params }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheConfig;

    fn cache() -> DeckCache {
        DeckCache::new(CacheConfig::default())
    }

    #[test]
    fn test_entity_partition_round_trip() {
        let c = cache();
        let p = Presentation::new("Rust".to_string(), 3, None);
        c.set_presentation(&p);
        let got = c.get_presentation(&p.id).unwrap();
        assert_eq!(got.topic, "Rust");
        c.delete_presentation(&p.id);
        assert!(c.get_presentation(&p.id).is_none());
    }

    #[test]
    fn test_stable_key_deterministic() {
        let a = stable_key(&serde_json::json!({"topic": "ai", "n": 3}));
        let b = stable_key(&serde_json::json!({"topic": "ai", "n": 3}));
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_stable_key_differs_on_params() {
        let a = stable_key(&serde_json::json!({"topic": "ai", "n": 3}));
        let b = stable_key(&serde_json::json!({"topic": "ai", "n": 4}));
        assert_ne!(a, b);
    }

    #[test]
    fn test_response_key_includes_endpoint() {
        let params = serde_json::json!({"limit": 10});
        let a = response_key("/api/v1/presentations", &params);
        let b = response_key("/api/v1/other", &params);
        assert_ne!(a, b);
    }

    #[test]
    fn test_clear_all_empties_every_partition() {
        let c = cache();
        let p = Presentation::new("Rust".to_string(), 3, None);
        c.set_presentation(&p);
        c.set_generation("k".to_string(), vec![]);
        c.set_response("r".to_string(), serde_json::json!({"count": 1}));
        c.clear_all();
        let stats = c.stats();
        assert_eq!(stats.entity.size, 0);
        assert_eq!(stats.generation.size, 0);
        assert_eq!(stats.response.size, 0);
    }

    #[test]
    fn test_stats_reports_configured_limits() {
        let stats = cache().stats();
        assert_eq!(stats.entity.capacity, 100);
        assert_eq!(stats.entity.ttl_secs, 3600);
        assert_eq!(stats.generation.capacity, 200);
        assert_eq!(stats.generation.ttl_secs, 1800);
        assert_eq!(stats.response.capacity, 500);
        assert_eq!(stats.response.ttl_secs, 900);
    }
}
