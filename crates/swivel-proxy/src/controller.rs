//! Apply orchestration.
//!
//! One apply runs Resolve -> Validate -> Format -> Apply -> Commit, with
//! any step able to drop into the failed state. Platform apply is retried
//! with bounded attempts and linearly increasing backoff; commit failures
//! force the indicator into its error presentation so a stale success
//! badge never survives a failed apply.
//!
//! The commit step (current id + usage statistics + indicator) is
//! deliberately best-effort rather than transactional: a failure there is
//! surfaced even though the platform-level proxy change may already be
//! live. Re-applying is idempotent, so no rollback is attempted.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use swivel_core::{format_rules, validate, ProxyConfig, ProxyDirective, ProxyScope, ProxyType};
use swivel_storage::ConfigStore;

use crate::error::{ProxyError, Result};
use crate::platform::{badge_text, ProxyPlatform, StatusIndicator};
use crate::probe::{self, TestReport, DEFAULT_PROBE_TIMEOUT};
use crate::read_cache::{ConfigReadCache, DEFAULT_READ_TTL};

/// Tunables for the apply pipeline.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Maximum platform-apply attempts.
    pub max_attempts: u32,
    /// Base backoff delay; attempt N waits N * base.
    pub retry_base_delay: Duration,
    /// Connection probe timeout.
    pub probe_timeout: Duration,
    /// TTL of the resolve read cache.
    pub read_ttl: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_base_delay: Duration::from_millis(1000),
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            read_ttl: DEFAULT_READ_TTL,
        }
    }
}

/// Success result of an apply.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyOutcome {
    pub id: String,
    pub name: String,
    pub address: String,
}

/// Active-proxy summary for status reporting.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveProxy {
    pub id: String,
    pub name: String,
    pub address: String,
    #[serde(rename = "type")]
    pub proxy_type: ProxyType,
    pub color: String,
}

/// Current status snapshot.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub is_active: bool,
    pub proxy: Option<ActiveProxy>,
}

/// Orchestrates validation, formatting, platform apply, and commit.
pub struct ProxyController {
    store: Arc<ConfigStore>,
    platform: Arc<dyn ProxyPlatform>,
    indicator: Arc<dyn StatusIndicator>,
    read_cache: ConfigReadCache,
    config: ControllerConfig,
}

impl ProxyController {
    pub fn new(
        store: Arc<ConfigStore>,
        platform: Arc<dyn ProxyPlatform>,
        indicator: Arc<dyn StatusIndicator>,
    ) -> Self {
        Self::with_config(store, platform, indicator, ControllerConfig::default())
    }

    pub fn with_config(
        store: Arc<ConfigStore>,
        platform: Arc<dyn ProxyPlatform>,
        indicator: Arc<dyn StatusIndicator>,
        config: ControllerConfig,
    ) -> Self {
        let read_cache = ConfigReadCache::with_ttl(config.read_ttl);
        Self {
            store,
            platform,
            indicator,
            read_cache,
            config,
        }
    }

    /// Applies the configuration with the given id as the active proxy.
    pub async fn apply(&self, config_id: &str) -> Result<ApplyOutcome> {
        // Resolve, cache-first.
        let config = self.resolve(config_id)?.ok_or(ProxyError::NotFound)?;

        // Validate.
        let verdict = validate(&config);
        if !verdict.valid {
            return Err(ProxyError::Invalid(
                verdict.error.unwrap_or_else(|| "Invalid configuration".to_string()),
            ));
        }

        // Format.
        let directive = format_rules(&config)?;

        // Apply, with bounded retry and linear backoff.
        self.apply_with_retry(&directive).await?;

        // Commit: current id, statistics, indicator. One failure fails the
        // operation and forces the error badge.
        if let Err(err) = self.commit(&config).await {
            self.indicator.set_error().await;
            return Err(err);
        }

        info!(id = %config.id, name = %config.name, "proxy applied");
        Ok(ApplyOutcome {
            id: config.id.clone(),
            name: config.name.clone(),
            address: directive.address(),
        })
    }

    fn resolve(&self, config_id: &str) -> Result<Option<ProxyConfig>> {
        if let Some(config) = self.read_cache.get(config_id) {
            return Ok(Some(config));
        }
        let config = self.store.get_by_id(config_id)?;
        if let Some(ref config) = config {
            self.read_cache.put(config.clone());
        }
        Ok(config)
    }

    async fn apply_with_retry(&self, directive: &ProxyDirective) -> Result<()> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.platform.apply(directive, ProxyScope::Regular).await {
                Ok(()) => return Ok(()),
                Err(err) if attempt < self.config.max_attempts => {
                    let delay = self.config.retry_base_delay * attempt;
                    warn!(attempt, %err, delay_ms = delay.as_millis() as u64, "platform apply failed, retrying");
                    tokio::time::sleep(delay).await;
                }
                Err(err) => {
                    self.indicator.set_error().await;
                    return Err(ProxyError::Platform(err.to_string()));
                }
            }
        }
    }

    async fn commit(&self, config: &ProxyConfig) -> Result<()> {
        self.store
            .set_current_id(Some(&config.id))
            .map_err(|e| ProxyError::Commit(e.to_string()))?;
        self.store
            .record_use(&config.id)
            .map_err(|e| ProxyError::Commit(e.to_string()))?;
        self.indicator
            .set_status(&badge_text(config), &config.color)
            .await
            .map_err(|e| ProxyError::Commit(e.to_string()))?;

        // The stored config just gained a lastUsed stamp.
        self.read_cache.invalidate();
        Ok(())
    }

    /// Returns to a direct connection: clears the platform proxy, then the
    /// current-id pointer and the indicator. Platform failure is reported
    /// but not retried.
    pub async fn disable(&self) -> Result<String> {
        self.platform
            .clear(ProxyScope::Regular)
            .await
            .map_err(|e| ProxyError::Platform(e.to_string()))?;

        self.store.set_current_id(None)?;
        self.read_cache.invalidate();
        if let Err(err) = self.indicator.clear().await {
            warn!(%err, "failed to clear status indicator");
        }

        info!("proxy disabled");
        Ok("Proxy disabled".to_string())
    }

    /// Current status, with the dangling-pointer invariant enforced by the
    /// store's accessor.
    pub fn status(&self) -> Result<StatusReport> {
        let Some(config) = self.store.current_config()? else {
            return Ok(StatusReport {
                is_active: false,
                proxy: None,
            });
        };

        let address = format_rules(&config)
            .map(|d| d.address())
            .unwrap_or_else(|_| "unknown".to_string());

        Ok(StatusReport {
            is_active: true,
            proxy: Some(ActiveProxy {
                id: config.id,
                name: config.name,
                address,
                proxy_type: config.proxy_type,
                color: config.color,
            }),
        })
    }

    /// Read-only reachability test of any stored configuration; the target
    /// does not need to be the active one.
    pub async fn test_connection(&self, config_id: &str) -> Result<TestReport> {
        let config = self.store.get_by_id(config_id)?.ok_or(ProxyError::NotFound)?;

        let verdict = validate(&config);
        if !verdict.valid {
            return Err(ProxyError::Invalid(
                verdict.error.unwrap_or_else(|| "Invalid configuration".to_string()),
            ));
        }

        probe::probe_connection(&config, self.config.probe_timeout).await
    }

    /// The store this controller operates on.
    pub fn store(&self) -> &Arc<ConfigStore> {
        &self.store
    }
}
