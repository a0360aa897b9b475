//! In-memory read cache for the configuration collection.
//!
//! The cache is an explicit object owned by the store, with invalidation
//! as part of its visible contract: every mutating store call invalidates
//! unconditionally, so a read can be stale by at most one write cycle.

use std::sync::Mutex;

use swivel_core::ProxyConfig;

/// Read cache over the persisted configuration collection.
#[derive(Debug, Default)]
pub struct StoreCache {
    configs: Mutex<Option<Vec<ProxyConfig>>>,
}

impl StoreCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached collection, if any.
    pub fn get(&self) -> Option<Vec<ProxyConfig>> {
        match self.configs.lock() {
            Ok(guard) => guard.clone(),
            Err(_) => None,
        }
    }

    /// Replaces the cached collection.
    pub fn put(&self, configs: Vec<ProxyConfig>) {
        if let Ok(mut guard) = self.configs.lock() {
            *guard = Some(configs);
        }
    }

    /// Drops the cached collection. Called from every mutating path.
    pub fn invalidate(&self) {
        if let Ok(mut guard) = self.configs.lock() {
            *guard = None;
        }
    }

    /// Whether a collection is currently cached.
    pub fn is_populated(&self) -> bool {
        self.configs.lock().map(|g| g.is_some()).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swivel_core::{ProxyConfig, ProxyType};

    #[test]
    fn test_miss_then_hit() {
        let cache = StoreCache::new();
        assert!(cache.get().is_none());
        assert!(!cache.is_populated());

        cache.put(vec![ProxyConfig::new("A", ProxyType::Direct)]);
        assert!(cache.is_populated());
        assert_eq!(cache.get().unwrap().len(), 1);
    }

    #[test]
    fn test_invalidate_drops_snapshot() {
        let cache = StoreCache::new();
        cache.put(vec![ProxyConfig::new("A", ProxyType::Direct)]);

        cache.invalidate();
        assert!(cache.get().is_none());
    }

    #[test]
    fn test_put_replaces_previous_snapshot() {
        let cache = StoreCache::new();
        cache.put(vec![ProxyConfig::new("A", ProxyType::Direct)]);
        cache.put(vec![
            ProxyConfig::new("A", ProxyType::Direct),
            ProxyConfig::new("B", ProxyType::Direct),
        ]);

        assert_eq!(cache.get().unwrap().len(), 2);
    }
}
