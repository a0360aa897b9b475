//! Configuration model.
//!
//! Persisted and wire-visible shapes use camelCase field names so that
//! native backups round-trip against the historical export schema.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::bypass;

/// Default display color for configurations created without one.
pub const DEFAULT_COLOR: &str = "#4a90d9";

/// Fixed display palette used for deterministic import coloring.
pub const COLOR_PALETTE: [&str; 8] = [
    "#4a90d9", "#e74c3c", "#2ecc71", "#f39c12", "#9b59b6", "#1abc9c", "#e67e22", "#34495e",
];

/// Maximum configuration name length after trimming.
pub const MAX_NAME_LEN: usize = 100;

/// Maximum number of bypass list entries.
pub const MAX_BYPASS_ENTRIES: usize = 100;

/// Maximum PAC script size in bytes.
pub const MAX_PAC_BYTES: usize = 1_048_576;

/// Kind of proxy a configuration describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProxyType {
    Http,
    Https,
    Socks4,
    Socks5,
    Pac,
    AutoDetect,
    Direct,
}

impl ProxyType {
    /// Whether this type requires a host and port.
    pub fn is_server_based(&self) -> bool {
        matches!(self, Self::Http | Self::Https | Self::Socks4 | Self::Socks5)
    }

    /// Returns the type as its wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "HTTP",
            Self::Https => "HTTPS",
            Self::Socks4 => "SOCKS4",
            Self::Socks5 => "SOCKS5",
            Self::Pac => "PAC",
            Self::AutoDetect => "AUTO_DETECT",
            Self::Direct => "DIRECT",
        }
    }
}

impl std::fmt::Display for ProxyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A named proxy configuration.
///
/// `is_active` is a legacy display flag; the store's current-id pointer is
/// the authoritative record of which configuration is active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyConfig {
    /// Opaque unique identifier, assigned at creation, immutable.
    pub id: String,
    /// Display name, 1..100 chars after trimming.
    pub name: String,
    #[serde(rename = "type")]
    pub proxy_type: ProxyType,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub bypass_list: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pac_script: Option<String>,
    #[serde(default = "default_color")]
    pub color: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_used: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_active: bool,
}

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

impl ProxyConfig {
    /// Creates a new configuration with a fresh id and creation timestamp.
    pub fn new(name: impl Into<String>, proxy_type: ProxyType) -> Self {
        Self {
            id: generate_id(),
            name: name.into(),
            proxy_type,
            host: None,
            port: None,
            bypass_list: Vec::new(),
            pac_script: None,
            color: default_color(),
            created_at: Utc::now(),
            last_used: None,
            is_active: false,
        }
    }

    /// Sets host and port for a server-based configuration.
    pub fn with_server(mut self, host: impl Into<String>, port: u16) -> Self {
        self.host = Some(host.into());
        self.port = Some(port);
        self
    }

    /// Sets the PAC script text.
    pub fn with_pac_script(mut self, script: impl Into<String>) -> Self {
        self.pac_script = Some(script.into());
        self
    }

    /// Sets the bypass list.
    pub fn with_bypass_list(mut self, entries: Vec<String>) -> Self {
        self.bypass_list = entries;
        self
    }

    /// Sets the display color.
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    /// Replaces the id with a freshly generated one.
    ///
    /// Used when merging imported configurations into an existing
    /// collection so imported ids can never collide with stored ones.
    pub fn regenerate_id(&mut self) {
        self.id = generate_id();
    }
}

/// Generates an opaque configuration id.
pub fn generate_id() -> String {
    let nonce: u64 = rand::random();
    format!("cfg-{:x}-{:016x}", Utc::now().timestamp_millis(), nonce)
}

/// Raw configuration fields as submitted by a UI collaborator.
///
/// The bypass list is accepted either as a comma-separated string or as an
/// array; it is normalized on conversion.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigDraft {
    pub name: String,
    #[serde(rename = "type")]
    pub proxy_type: ProxyType,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub bypass_list: Option<serde_json::Value>,
    #[serde(default)]
    pub pac_script: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

impl ConfigDraft {
    /// Builds a full configuration from the submitted fields.
    pub fn into_config(self) -> ProxyConfig {
        let mut config = ProxyConfig::new(self.name.trim(), self.proxy_type);
        config.host = self.host.map(|h| h.trim().to_string()).filter(|h| !h.is_empty());
        config.port = self.port;
        config.pac_script = self.pac_script;
        if let Some(color) = self.color {
            config.color = color;
        }
        if self.proxy_type.is_server_based() {
            config.bypass_list = bypass::normalize(self.bypass_list.as_ref());
        }
        config
    }
}

/// Partial update of a stored configuration. Absent fields are left as-is.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub proxy_type: Option<ProxyType>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub bypass_list: Option<serde_json::Value>,
    #[serde(default)]
    pub pac_script: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

impl ConfigPatch {
    /// Merges the patch into an existing configuration.
    ///
    /// The id and creation timestamp are never touched.
    pub fn apply_to(&self, config: &mut ProxyConfig) {
        if let Some(ref name) = self.name {
            config.name = name.trim().to_string();
        }
        if let Some(proxy_type) = self.proxy_type {
            config.proxy_type = proxy_type;
        }
        if let Some(ref host) = self.host {
            let trimmed = host.trim();
            config.host = (!trimmed.is_empty()).then(|| trimmed.to_string());
        }
        if let Some(port) = self.port {
            config.port = Some(port);
        }
        if let Some(ref raw) = self.bypass_list {
            config.bypass_list = bypass::normalize(Some(raw));
        }
        if let Some(ref script) = self.pac_script {
            config.pac_script = Some(script.clone());
        }
        if let Some(ref color) = self.color {
            config.color = color.clone();
        }
    }

    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.proxy_type.is_none()
            && self.host.is_none()
            && self.port.is_none()
            && self.bypass_list.is_none()
            && self.pac_script.is_none()
            && self.color.is_none()
    }
}

/// User preferences persisted alongside the configuration collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    pub auto_connect: bool,
    pub default_config_id: Option<String>,
    pub show_notifications: bool,
    pub quick_switch_count: u32,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            auto_connect: false,
            default_config_id: None,
            show_notifications: true,
            quick_switch_count: 3,
        }
    }
}

/// Per-configuration usage counters, keyed by configuration id.
///
/// Entries are created lazily on first use and survive deletion of the
/// configuration they describe; orphans are tolerated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageStats {
    #[serde(default, rename = "byProxy")]
    pub by_proxy: HashMap<String, UsageEntry>,
}

/// A single usage counter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageEntry {
    pub connections: u64,
    #[serde(default)]
    pub last_used: Option<DateTime<Utc>>,
}

impl UsageStats {
    /// Records one use of the given configuration.
    pub fn record(&mut self, id: &str) {
        let entry = self.by_proxy.entry(id.to_string()).or_default();
        entry.connections += 1;
        entry.last_used = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_proxy_type_wire_strings() {
        assert_eq!(serde_json::to_value(ProxyType::Http).unwrap(), json!("HTTP"));
        assert_eq!(serde_json::to_value(ProxyType::Socks5).unwrap(), json!("SOCKS5"));
        assert_eq!(
            serde_json::to_value(ProxyType::AutoDetect).unwrap(),
            json!("AUTO_DETECT")
        );
        let parsed: ProxyType = serde_json::from_value(json!("PAC")).unwrap();
        assert_eq!(parsed, ProxyType::Pac);
    }

    #[test]
    fn test_server_based() {
        assert!(ProxyType::Http.is_server_based());
        assert!(ProxyType::Socks4.is_server_based());
        assert!(!ProxyType::Pac.is_server_based());
        assert!(!ProxyType::Direct.is_server_based());
    }

    #[test]
    fn test_new_config_defaults() {
        let config = ProxyConfig::new("Work", ProxyType::Http);
        assert!(!config.id.is_empty());
        assert_eq!(config.color, DEFAULT_COLOR);
        assert!(config.last_used.is_none());
        assert!(!config.is_active);
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let a = generate_id();
        let b = generate_id();
        assert_ne!(a, b);
    }

    #[test]
    fn test_config_serde_uses_camel_case() {
        let config = ProxyConfig::new("Work", ProxyType::Socks5)
            .with_server("10.0.0.1", 1080)
            .with_bypass_list(vec!["*.local".to_string()]);

        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["type"], json!("SOCKS5"));
        assert!(value.get("bypassList").is_some());
        assert!(value.get("createdAt").is_some());
        // Round-trip.
        let back: ProxyConfig = serde_json::from_value(value).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_draft_accepts_string_bypass() {
        let draft: ConfigDraft = serde_json::from_value(json!({
            "name": " Office ",
            "type": "HTTP",
            "host": "proxy.example.com",
            "port": 8080,
            "bypassList": "localhost, *.internal"
        }))
        .unwrap();

        let config = draft.into_config();
        assert_eq!(config.name, "Office");
        assert_eq!(config.bypass_list, vec!["localhost", "*.internal"]);
    }

    #[test]
    fn test_patch_merges_fields() {
        let mut config = ProxyConfig::new("Old", ProxyType::Http).with_server("old.example.com", 80);
        let original_id = config.id.clone();

        let patch: ConfigPatch = serde_json::from_value(json!({
            "name": "New",
            "port": 3128
        }))
        .unwrap();
        patch.apply_to(&mut config);

        assert_eq!(config.id, original_id);
        assert_eq!(config.name, "New");
        assert_eq!(config.host.as_deref(), Some("old.example.com"));
        assert_eq!(config.port, Some(3128));
    }

    #[test]
    fn test_usage_stats_record() {
        let mut stats = UsageStats::default();
        stats.record("a");
        stats.record("a");
        stats.record("b");

        assert_eq!(stats.by_proxy["a"].connections, 2);
        assert_eq!(stats.by_proxy["b"].connections, 1);
        assert!(stats.by_proxy["a"].last_used.is_some());
    }

    #[test]
    fn test_settings_defaults() {
        let settings: AppSettings = serde_json::from_value(json!({})).unwrap();
        assert_eq!(settings, AppSettings::default());
        assert_eq!(settings.quick_switch_count, 3);
        assert!(settings.show_notifications);
    }
}
