//! Short-TTL read cache for config resolution.
//!
//! Sits in front of the store during an apply sequence to smooth bursts
//! of rapid re-reads of the same configuration. Advisory only: it may
//! serve at most one TTL window of staleness and is never trusted for the
//! current-id invariant. The controller invalidates it on every mutation.

use std::time::{Duration, Instant};

use parking_lot::RwLock;

use swivel_core::ProxyConfig;

/// Default time-to-live for a cached read.
pub const DEFAULT_READ_TTL: Duration = Duration::from_secs(5);

struct CachedRead {
    config: ProxyConfig,
    fetched_at: Instant,
}

/// Single-slot TTL cache over the most recently resolved configuration.
pub struct ConfigReadCache {
    slot: RwLock<Option<CachedRead>>,
    ttl: Duration,
}

impl Default for ConfigReadCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigReadCache {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_READ_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            slot: RwLock::new(None),
            ttl,
        }
    }

    /// Returns the cached configuration when it matches the id and is
    /// still fresh.
    pub fn get(&self, id: &str) -> Option<ProxyConfig> {
        let guard = self.slot.read();
        let cached = guard.as_ref()?;
        if cached.config.id != id || cached.fetched_at.elapsed() >= self.ttl {
            return None;
        }
        Some(cached.config.clone())
    }

    /// Stores a freshly resolved configuration.
    pub fn put(&self, config: ProxyConfig) {
        *self.slot.write() = Some(CachedRead {
            config,
            fetched_at: Instant::now(),
        });
    }

    /// Drops the cached read.
    pub fn invalidate(&self) {
        *self.slot.write() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swivel_core::{ProxyConfig, ProxyType};

    #[test]
    fn test_hit_within_ttl() {
        let cache = ConfigReadCache::new();
        let config = ProxyConfig::new("A", ProxyType::Direct);
        let id = config.id.clone();

        cache.put(config);
        assert!(cache.get(&id).is_some());
        assert!(cache.get("cfg-other").is_none());
    }

    #[test]
    fn test_expires_after_ttl() {
        let cache = ConfigReadCache::with_ttl(Duration::from_millis(10));
        let config = ProxyConfig::new("A", ProxyType::Direct);
        let id = config.id.clone();

        cache.put(config);
        std::thread::sleep(Duration::from_millis(20));
        assert!(cache.get(&id).is_none());
    }

    #[test]
    fn test_invalidate_drops_entry() {
        let cache = ConfigReadCache::new();
        let config = ProxyConfig::new("A", ProxyType::Direct);
        let id = config.id.clone();

        cache.put(config);
        cache.invalidate();
        assert!(cache.get(&id).is_none());
    }
}
