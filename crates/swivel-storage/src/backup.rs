//! Native backup document shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use swivel_core::{AppSettings, ProxyConfig, SkippedProfile, UsageStats};

/// Version string written into native exports.
pub const BACKUP_VERSION: &str = "2.0";

/// Swivel's native export document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupDocument {
    pub version: String,
    pub export_date: DateTime<Utc>,
    pub configs: Vec<ProxyConfig>,
    pub settings: AppSettings,
    pub statistics: UsageStats,
}

/// Outcome of an import, including the partial-conversion annotation for
/// foreign backups.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportOutcome {
    /// Configurations added to the store.
    pub imported: usize,
    /// Candidate entries seen in the source document.
    pub seen: usize,
    /// Foreign profiles that did not convert (diagnostics, not failures).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedReport>,
}

/// Wire shape of one skipped foreign profile.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedReport {
    pub name: String,
    pub reason: String,
}

impl From<SkippedProfile> for SkippedReport {
    fn from(skipped: SkippedProfile) -> Self {
        Self {
            name: skipped.name,
            reason: skipped.reason,
        }
    }
}
