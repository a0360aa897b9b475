//! The configuration store.
//!
//! Owns the persisted collection, the current-id pointer, usage
//! statistics, and app settings. All durable state lives under four
//! top-level keys in the key-value table; reads of the collection go
//! through an explicit cache that every mutating call invalidates.

use std::path::PathBuf;

use directories::ProjectDirs;
use serde_json::Value;
use tracing::{debug, info, warn};

use swivel_core::{
    convert_foreign, detect_format, AppSettings, BackupFormat, ConfigPatch, ProxyConfig,
    UsageStats,
};

use crate::backup::{BackupDocument, ImportOutcome, BACKUP_VERSION};
use crate::cache::StoreCache;
use crate::error::{Result, StorageError};
use crate::kv::StateRepo;
use crate::pool::ConnectionPool;

/// Durable key holding the configuration collection.
pub const KEY_CONFIGS: &str = "proxy_configs";
/// Durable key holding the current-id pointer (string or null).
pub const KEY_CURRENT_ID: &str = "active_config_id";
/// Durable key holding app settings.
pub const KEY_SETTINGS: &str = "app_settings";
/// Durable key holding usage statistics.
pub const KEY_STATS: &str = "usage_stats";

/// Lenient shape accepted on native import; exports always carry the full
/// [`BackupDocument`].
#[derive(serde::Deserialize)]
struct NativeBackup {
    #[serde(default)]
    configs: Vec<ProxyConfig>,
    #[serde(default)]
    settings: Option<AppSettings>,
    #[serde(default)]
    statistics: Option<UsageStats>,
}

/// Durable configuration store with an invalidate-on-write read cache.
pub struct ConfigStore {
    pool: ConnectionPool,
    cache: StoreCache,
}

impl ConfigStore {
    /// Opens the store in the default app data directory.
    pub fn new() -> Result<Self> {
        let path = Self::default_db_path()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        info!("Opening store at: {:?}", path);
        Self::from_pool(ConnectionPool::new(&path)?)
    }

    /// Opens the store at a specific path.
    pub fn with_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        info!("Opening store at: {:?}", path);
        Self::from_pool(ConnectionPool::new(&path)?)
    }

    /// Opens an in-memory store (for testing).
    pub fn in_memory() -> Result<Self> {
        Self::from_pool(ConnectionPool::in_memory()?)
    }

    fn from_pool(pool: ConnectionPool) -> Result<Self> {
        let store = Self {
            pool,
            cache: StoreCache::new(),
        };
        store.ensure_initialized()?;
        Ok(store)
    }

    /// Default database path under the platform app-data directory.
    pub fn default_db_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "swivel", "swivel")
            .ok_or_else(|| StorageError::Config("Could not determine app data directory".into()))?;

        Ok(proj_dirs.data_dir().join("swivel.db"))
    }

    /// First-run initialization: writes defaults for all four keys, but
    /// only when the configuration collection key is entirely absent.
    fn ensure_initialized(&self) -> Result<()> {
        let conn = self.pool.get()?;

        if StateRepo::contains(&conn, KEY_CONFIGS)? {
            return Ok(());
        }

        info!("First run, initializing store defaults");
        StateRepo::set(&conn, KEY_CONFIGS, &Value::Array(Vec::new()))?;
        StateRepo::set(&conn, KEY_CURRENT_ID, &Value::Null)?;
        StateRepo::set(&conn, KEY_SETTINGS, &serde_json::to_value(AppSettings::default())?)?;
        StateRepo::set(&conn, KEY_STATS, &serde_json::to_value(UsageStats::default())?)?;
        Ok(())
    }

    // === Configurations ===

    /// Lists all configurations, cache-first.
    pub fn list(&self) -> Result<Vec<ProxyConfig>> {
        if let Some(configs) = self.cache.get() {
            return Ok(configs);
        }

        let conn = self.pool.get()?;
        let configs: Vec<ProxyConfig> = StateRepo::get_or_default(&conn, KEY_CONFIGS, Vec::new())?;
        self.cache.put(configs.clone());
        Ok(configs)
    }

    /// Looks a configuration up by id.
    pub fn get_by_id(&self, id: &str) -> Result<Option<ProxyConfig>> {
        Ok(self.list()?.into_iter().find(|c| c.id == id))
    }

    /// Appends a new configuration and returns it.
    pub fn create(&self, config: ProxyConfig) -> Result<ProxyConfig> {
        let mut configs = self.list()?;
        configs.push(config.clone());
        self.write_configs(&configs)?;
        debug!(id = %config.id, name = %config.name, "configuration created");
        Ok(config)
    }

    /// Merges patch fields into the matching entry. Returns false when the
    /// id is unknown; the collection is left untouched in that case.
    pub fn update(&self, id: &str, patch: &ConfigPatch) -> Result<bool> {
        let mut configs = self.list()?;
        let Some(config) = configs.iter_mut().find(|c| c.id == id) else {
            return Ok(false);
        };

        patch.apply_to(config);
        self.write_configs(&configs)?;
        debug!(id, "configuration updated");
        Ok(true)
    }

    /// Removes the matching entry. Deleting the current configuration also
    /// clears the current-id pointer.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let mut configs = self.list()?;
        let before = configs.len();
        configs.retain(|c| c.id != id);
        if configs.len() == before {
            return Ok(false);
        }

        self.write_configs(&configs)?;
        if self.current_id()?.as_deref() == Some(id) {
            self.set_current_id(None)?;
        }
        debug!(id, "configuration deleted");
        Ok(true)
    }

    fn write_configs(&self, configs: &[ProxyConfig]) -> Result<()> {
        let conn = self.pool.get()?;
        StateRepo::set(&conn, KEY_CONFIGS, &serde_json::to_value(configs)?)?;
        self.cache.invalidate();
        Ok(())
    }

    // === Current id ===

    /// Returns the current-id pointer.
    pub fn current_id(&self) -> Result<Option<String>> {
        let conn = self.pool.get()?;
        match StateRepo::get(&conn, KEY_CURRENT_ID)? {
            Some(Value::String(id)) => Ok(Some(id)),
            _ => Ok(None),
        }
    }

    /// Sets or clears the current-id pointer.
    pub fn set_current_id(&self, id: Option<&str>) -> Result<()> {
        let conn = self.pool.get()?;
        let value = match id {
            Some(id) => Value::String(id.to_string()),
            None => Value::Null,
        };
        StateRepo::set(&conn, KEY_CURRENT_ID, &value)?;
        Ok(())
    }

    /// Returns the current configuration, enforcing the pointer invariant:
    /// a pointer to a missing configuration is cleared, not surfaced.
    pub fn current_config(&self) -> Result<Option<ProxyConfig>> {
        let Some(id) = self.current_id()? else {
            return Ok(None);
        };

        match self.get_by_id(&id)? {
            Some(config) => Ok(Some(config)),
            None => {
                warn!(id, "current id points at a missing configuration, clearing");
                self.set_current_id(None)?;
                Ok(None)
            }
        }
    }

    // === Statistics ===

    /// Returns the usage statistics snapshot.
    pub fn statistics(&self) -> Result<UsageStats> {
        let conn = self.pool.get()?;
        StateRepo::get_or_default(&conn, KEY_STATS, UsageStats::default())
    }

    /// Records one use of a configuration: bumps its counter and stamps
    /// `lastUsed` on both the statistics entry and the configuration.
    pub fn record_use(&self, id: &str) -> Result<()> {
        let mut stats = self.statistics()?;
        stats.record(id);

        let conn = self.pool.get()?;
        StateRepo::set(&conn, KEY_STATS, &serde_json::to_value(&stats)?)?;
        drop(conn);

        let mut configs = self.list()?;
        if let Some(config) = configs.iter_mut().find(|c| c.id == id) {
            config.last_used = stats.by_proxy.get(id).and_then(|e| e.last_used);
            self.write_configs(&configs)?;
        }
        Ok(())
    }

    /// Clears all usage statistics.
    pub fn clear_statistics(&self) -> Result<()> {
        let conn = self.pool.get()?;
        StateRepo::set(&conn, KEY_STATS, &serde_json::to_value(UsageStats::default())?)?;
        Ok(())
    }

    /// Most recently used configurations first, at most `count` of them.
    /// Backs the quick-switch surface.
    pub fn list_recent(&self, count: usize) -> Result<Vec<ProxyConfig>> {
        let stats = self.statistics()?;
        let mut configs = self.list()?;

        configs.sort_by_key(|c| {
            std::cmp::Reverse(stats.by_proxy.get(&c.id).and_then(|e| e.last_used))
        });
        configs.truncate(count);
        Ok(configs)
    }

    // === Settings ===

    /// Returns the persisted app settings.
    pub fn settings(&self) -> Result<AppSettings> {
        let conn = self.pool.get()?;
        StateRepo::get_or_default(&conn, KEY_SETTINGS, AppSettings::default())
    }

    /// Replaces the persisted app settings.
    pub fn set_settings(&self, settings: &AppSettings) -> Result<()> {
        let conn = self.pool.get()?;
        StateRepo::set(&conn, KEY_SETTINGS, &serde_json::to_value(settings)?)?;
        Ok(())
    }

    // === Export / import ===

    /// Produces a full native backup snapshot.
    pub fn export_all(&self) -> Result<BackupDocument> {
        Ok(BackupDocument {
            version: BACKUP_VERSION.to_string(),
            export_date: chrono::Utc::now(),
            configs: self.list()?,
            settings: self.settings()?,
            statistics: self.statistics()?,
        })
    }

    /// Imports a backup blob, auto-detecting its format.
    ///
    /// On merge, every imported configuration receives a fresh id before
    /// insertion so it can never collide with an existing entry. On
    /// replace, the whole collection is overwritten and a now-dangling
    /// current-id pointer is cleared.
    pub fn import_all(&self, blob: &Value, merge: bool) -> Result<ImportOutcome> {
        let format = detect_format(blob)?;

        let (mut incoming, outcome) = match format {
            BackupFormat::Native => {
                let native: NativeBackup = serde_json::from_value(blob.clone())?;
                let seen = native.configs.len();

                if !merge {
                    if let Some(settings) = native.settings {
                        self.set_settings(&settings)?;
                    }
                    if let Some(statistics) = native.statistics {
                        let conn = self.pool.get()?;
                        StateRepo::set(&conn, KEY_STATS, &serde_json::to_value(&statistics)?)?;
                    }
                }

                let outcome = ImportOutcome {
                    imported: native.configs.len(),
                    seen,
                    skipped: Vec::new(),
                };
                (native.configs, outcome)
            }
            BackupFormat::Foreign => {
                let report = convert_foreign(blob)?;
                info!(
                    imported = report.configs.len(),
                    seen = report.profiles_seen,
                    "foreign backup converted"
                );
                let outcome = ImportOutcome {
                    imported: report.configs.len(),
                    seen: report.profiles_seen,
                    skipped: report.skipped.into_iter().map(Into::into).collect(),
                };
                (report.configs, outcome)
            }
        };

        if merge {
            for config in &mut incoming {
                config.regenerate_id();
            }
            let mut configs = self.list()?;
            configs.extend(incoming);
            self.write_configs(&configs)?;
        } else {
            self.write_configs(&incoming)?;
            if let Some(current) = self.current_id()? {
                if !incoming.iter().any(|c| c.id == current) {
                    self.set_current_id(None)?;
                }
            }
        }

        Ok(outcome)
    }
}
