//! Swivel Storage - durable persistence for proxy configurations.
//!
//! This crate owns the persisted collection of configurations, the
//! current-id pointer, usage statistics, and app settings. The durable
//! layout is a small key-value table holding four top-level keys; the
//! [`ConfigStore`] fronts it with an explicit in-memory read cache that is
//! invalidated on every write.
//!
//! # Example
//!
//! ```
//! use swivel_core::{ProxyConfig, ProxyType};
//! use swivel_storage::ConfigStore;
//!
//! let store = ConfigStore::in_memory().unwrap();
//!
//! let config = ProxyConfig::new("Office", ProxyType::Http).with_server("10.0.0.1", 3128);
//! let created = store.create(config).unwrap();
//!
//! store.set_current_id(Some(&created.id)).unwrap();
//! assert_eq!(store.current_config().unwrap().unwrap().id, created.id);
//! ```

mod backup;
mod cache;
pub mod error;
mod kv;
mod pool;
mod schema;
mod store;

pub use backup::{BackupDocument, ImportOutcome, SkippedReport, BACKUP_VERSION};
pub use cache::StoreCache;
pub use error::{Result, StorageError};
pub use kv::StateRepo;
pub use pool::ConnectionPool;
pub use store::{ConfigStore, KEY_CONFIGS, KEY_CURRENT_ID, KEY_SETTINGS, KEY_STATS};
