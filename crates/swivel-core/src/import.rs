//! Detection and conversion of the competing switcher's backup format.
//!
//! The foreign format carries no schema tag, so detection is structural:
//! profile entries live under `+`-prefixed top-level keys, settings under
//! `-`-prefixed keys, and each profile carries a `profileType`
//! discriminant. The native-format check always runs first; that
//! precedence is part of the contract, not an accident of code order.
//!
//! Conversion is best-effort per profile. A malformed profile is skipped
//! and recorded, never allowed to abort the whole import.

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::bypass;
use crate::config::{ProxyConfig, ProxyType, COLOR_PALETTE};

/// Errors raised while classifying or converting a backup blob.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportError {
    /// The blob matches neither the native nor the foreign structure.
    #[error("Unrecognized backup format")]
    UnrecognizedFormat,
}

/// Result type for import operations.
pub type Result<T> = std::result::Result<T, ImportError>;

/// Backup format classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupFormat {
    /// Swivel's own export document.
    Native,
    /// The competing tool's backup schema.
    Foreign,
}

/// Classifies a backup blob.
///
/// The native check takes precedence: a document with a `configs` array is
/// native even if it also carries `+`-prefixed keys.
pub fn detect_format(blob: &Value) -> Result<BackupFormat> {
    let obj = blob.as_object().ok_or(ImportError::UnrecognizedFormat)?;

    if obj.get("configs").is_some_and(Value::is_array) {
        return Ok(BackupFormat::Native);
    }
    if obj.keys().any(|key| key.starts_with('+')) {
        return Ok(BackupFormat::Foreign);
    }
    if obj.contains_key("schemaVersion") && obj.keys().any(|key| key.starts_with('-')) {
        return Ok(BackupFormat::Foreign);
    }

    Err(ImportError::UnrecognizedFormat)
}

/// Whether the blob is the foreign backup schema.
pub fn is_foreign_format(blob: &Value) -> bool {
    matches!(detect_format(blob), Ok(BackupFormat::Foreign))
}

/// Foreign profile discriminant, parsed from the untyped `profileType`
/// string. `Unknown` is an explicit arm so unrecognized discriminants are
/// skipped and recorded instead of failing the import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForeignProfileKind {
    Fixed,
    Pac,
    Direct,
    System,
    Switch,
    Virtual,
    Unknown,
}

impl ForeignProfileKind {
    fn from_tag(tag: &str) -> Self {
        match tag {
            "FixedProfile" => Self::Fixed,
            "PacProfile" => Self::Pac,
            "DirectProfile" => Self::Direct,
            "SystemProfile" => Self::System,
            "SwitchProfile" => Self::Switch,
            "VirtualProfile" => Self::Virtual,
            _ => Self::Unknown,
        }
    }
}

/// A profile that did not convert, with the reason it was skipped.
/// Recorded for diagnostics only; skips are not failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedProfile {
    pub name: String,
    pub reason: String,
}

/// Outcome of converting a foreign backup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversionReport {
    /// Successfully converted configurations.
    pub configs: Vec<ProxyConfig>,
    /// Number of candidate profiles encountered.
    pub profiles_seen: usize,
    /// Profiles that were skipped, with reasons.
    pub skipped: Vec<SkippedProfile>,
}

/// Built-in aggregate/meta profiles of the competing tool. They never
/// describe a single concrete endpoint and are skipped outright.
const AGGREGATE_PROFILES: [&str; 2] = ["auto switch", "rule list"];

/// Converts a foreign backup into native configurations.
pub fn convert_foreign(blob: &Value) -> Result<ConversionReport> {
    let obj = blob.as_object().ok_or(ImportError::UnrecognizedFormat)?;
    let mut report = ConversionReport::default();

    for (key, profile) in obj {
        let Some(name) = key.strip_prefix('+') else {
            continue;
        };
        if AGGREGATE_PROFILES.contains(&name) {
            debug!(profile = name, "skipping aggregate profile");
            continue;
        }

        report.profiles_seen += 1;
        match convert_profile(name, profile) {
            Ok(config) => report.configs.push(config),
            Err(reason) => {
                debug!(profile = name, %reason, "profile skipped");
                report.skipped.push(SkippedProfile {
                    name: name.to_string(),
                    reason,
                });
            }
        }
    }

    Ok(report)
}

fn convert_profile(name: &str, profile: &Value) -> std::result::Result<ProxyConfig, String> {
    let tag = profile.get("profileType").and_then(Value::as_str).unwrap_or("");

    match ForeignProfileKind::from_tag(tag) {
        ForeignProfileKind::Fixed => convert_fixed(name, profile),
        ForeignProfileKind::Pac => convert_pac(name, profile),
        ForeignProfileKind::Direct => {
            let name = if name.is_empty() { "Direct" } else { name };
            Ok(with_import_color(ProxyConfig::new(name, ProxyType::Direct)))
        }
        ForeignProfileKind::System => {
            let name = if name.is_empty() { "System Proxy" } else { name };
            Ok(with_import_color(ProxyConfig::new(name, ProxyType::AutoDetect)))
        }
        ForeignProfileKind::Switch => {
            Err("rule-based switch profiles have no single-target equivalent".to_string())
        }
        ForeignProfileKind::Virtual => {
            Err("virtual profiles only reference another profile".to_string())
        }
        ForeignProfileKind::Unknown => {
            warn!(profile = name, tag, "unrecognized profile type");
            Err(format!("unrecognized profile type '{tag}'"))
        }
    }
}

/// Fixed profiles keep their endpoint on a nested fallback object, not on
/// the profile itself. A flat read yields nothing.
fn convert_fixed(name: &str, profile: &Value) -> std::result::Result<ProxyConfig, String> {
    let fallback = profile
        .get("fallbackProxy")
        .and_then(Value::as_object)
        .ok_or_else(|| "fixed profile has no fallback proxy".to_string())?;

    let host = fallback
        .get("host")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .ok_or_else(|| "fallback proxy has no host".to_string())?;

    let port = fallback
        .get("port")
        .and_then(Value::as_u64)
        .and_then(|p| u16::try_from(p).ok())
        .filter(|p| *p != 0)
        .ok_or_else(|| "fallback proxy has no usable port".to_string())?;

    // Scheme strings are matched case-sensitively; anything else falls
    // back to plain HTTP.
    let proxy_type = match fallback.get("scheme").and_then(Value::as_str) {
        Some("http") => ProxyType::Http,
        Some("https") => ProxyType::Https,
        Some("socks4") => ProxyType::Socks4,
        Some("socks5") => ProxyType::Socks5,
        _ => ProxyType::Http,
    };

    let config = ProxyConfig::new(name, proxy_type)
        .with_server(host, port)
        .with_bypass_list(foreign_bypass(profile));
    Ok(with_import_color(config))
}

fn convert_pac(name: &str, profile: &Value) -> std::result::Result<ProxyConfig, String> {
    let script = profile
        .get("pacScript")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| "pac profile has no script".to_string())?;

    Ok(with_import_color(
        ProxyConfig::new(name, ProxyType::Pac).with_pac_script(script),
    ))
}

/// Extracts bypass patterns from the foreign condition list. Only
/// `BypassCondition` members contribute; everything else is ignored.
fn foreign_bypass(profile: &Value) -> Vec<String> {
    let patterns: Vec<String> = profile
        .get("bypassList")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter(|condition| {
            condition.get("conditionType").and_then(Value::as_str) == Some("BypassCondition")
        })
        .filter_map(|condition| condition.get("pattern").and_then(Value::as_str))
        .filter_map(bypass::sanitize_entry)
        .collect();

    if patterns.is_empty() {
        bypass::default_bypass()
    } else {
        patterns
    }
}

fn with_import_color(mut config: ProxyConfig) -> ProxyConfig {
    config.color = color_for_name(&config.name).to_string();
    config
}

/// Deterministic palette color for an imported profile name, so repeated
/// imports of the same backup color identically.
pub fn color_for_name(name: &str) -> &'static str {
    let mut hash: i32 = 0;
    for c in name.chars() {
        hash = (c as i32).wrapping_add(hash.wrapping_shl(5).wrapping_sub(hash));
    }
    let index = (hash % COLOR_PALETTE.len() as i32).unsigned_abs() as usize;
    COLOR_PALETTE[index]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fixed_profile() -> Value {
        json!({
            "profileType": "FixedProfile",
            "fallbackProxy": {
                "host": "proxy.example.com",
                "port": 8080,
                "scheme": "socks5"
            },
            "bypassList": [
                { "conditionType": "BypassCondition", "pattern": "*.local" }
            ]
        })
    }

    #[test]
    fn test_native_detection() {
        let blob = json!({ "configs": [], "version": "1.0" });
        assert_eq!(detect_format(&blob).unwrap(), BackupFormat::Native);
    }

    #[test]
    fn test_native_check_takes_precedence() {
        let blob = json!({ "configs": [], "+Proxy A": {} });
        assert_eq!(detect_format(&blob).unwrap(), BackupFormat::Native);
    }

    #[test]
    fn test_plus_key_marks_foreign() {
        let blob = json!({ "+Proxy A": {}, "schemaVersion": 1 });
        assert_eq!(detect_format(&blob).unwrap(), BackupFormat::Foreign);
        assert!(is_foreign_format(&blob));
    }

    #[test]
    fn test_schema_version_with_setting_key_marks_foreign() {
        let blob = json!({ "schemaVersion": 2, "-startupProfileName": "Work" });
        assert_eq!(detect_format(&blob).unwrap(), BackupFormat::Foreign);
    }

    #[test]
    fn test_undetermined_blob_is_an_error() {
        assert_eq!(
            detect_format(&json!({ "something": "else" })),
            Err(ImportError::UnrecognizedFormat)
        );
        assert_eq!(detect_format(&json!([1, 2])), Err(ImportError::UnrecognizedFormat));
        // A configs field that is not an array does not make it native.
        assert_eq!(
            detect_format(&json!({ "configs": "nope" })),
            Err(ImportError::UnrecognizedFormat)
        );
    }

    #[test]
    fn test_fixed_profile_reads_nested_fallback() {
        let blob = json!({ "+Work": fixed_profile(), "schemaVersion": 2 });
        let report = convert_foreign(&blob).unwrap();

        assert_eq!(report.profiles_seen, 1);
        assert_eq!(report.configs.len(), 1);
        let config = &report.configs[0];
        assert_eq!(config.name, "Work");
        assert_eq!(config.proxy_type, ProxyType::Socks5);
        assert_eq!(config.host.as_deref(), Some("proxy.example.com"));
        assert_eq!(config.port, Some(8080));
        assert_eq!(config.bypass_list, vec!["*.local"]);
    }

    #[test]
    fn test_unknown_scheme_defaults_to_http() {
        let blob = json!({
            "+Odd": {
                "profileType": "FixedProfile",
                "fallbackProxy": { "host": "h.example.com", "port": 80, "scheme": "QUIC" }
            }
        });
        let report = convert_foreign(&blob).unwrap();
        assert_eq!(report.configs[0].proxy_type, ProxyType::Http);
    }

    #[test]
    fn test_scheme_match_is_case_sensitive() {
        let blob = json!({
            "+Shouty": {
                "profileType": "FixedProfile",
                "fallbackProxy": { "host": "h.example.com", "port": 1080, "scheme": "SOCKS5" }
            }
        });
        let report = convert_foreign(&blob).unwrap();
        assert_eq!(report.configs[0].proxy_type, ProxyType::Http);
    }

    #[test]
    fn test_fixed_profile_without_host_is_skipped() {
        let blob = json!({
            "+Work": fixed_profile(),
            "+Broken": {
                "profileType": "FixedProfile",
                "fallbackProxy": { "port": 8080, "scheme": "http" }
            }
        });
        let report = convert_foreign(&blob).unwrap();

        assert_eq!(report.profiles_seen, 2);
        assert_eq!(report.configs.len(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].name, "Broken");
    }

    #[test]
    fn test_bypass_only_takes_bypass_conditions() {
        let blob = json!({
            "+Mixed": {
                "profileType": "FixedProfile",
                "fallbackProxy": { "host": "h.example.com", "port": 80, "scheme": "http" },
                "bypassList": [
                    { "conditionType": "HostWildcardCondition", "pattern": "*.example.com" },
                    { "conditionType": "BypassCondition", "pattern": "10.0.0.0/8" }
                ]
            }
        });
        let report = convert_foreign(&blob).unwrap();
        assert_eq!(report.configs[0].bypass_list, vec!["10.0.0.0/8"]);
    }

    #[test]
    fn test_bypass_falls_back_to_defaults() {
        let blob = json!({
            "+NoBypass": {
                "profileType": "FixedProfile",
                "fallbackProxy": { "host": "h.example.com", "port": 80, "scheme": "http" }
            }
        });
        let report = convert_foreign(&blob).unwrap();
        assert_eq!(report.configs[0].bypass_list, bypass::default_bypass());
    }

    #[test]
    fn test_pac_profile_without_script_is_skipped() {
        let blob = json!({
            "+GoodPac": {
                "profileType": "PacProfile",
                "pacScript": "function FindProxyForURL(url, host) { return 'DIRECT'; }"
            },
            "+EmptyPac": { "profileType": "PacProfile", "pacScript": "   " }
        });
        let report = convert_foreign(&blob).unwrap();

        assert_eq!(report.profiles_seen, 2);
        assert_eq!(report.configs.len(), 1);
        assert_eq!(report.configs[0].proxy_type, ProxyType::Pac);
        assert_eq!(report.skipped[0].name, "EmptyPac");
    }

    #[test]
    fn test_direct_and_system_profiles() {
        let blob = json!({
            "+Home": { "profileType": "DirectProfile" },
            "+Corp": { "profileType": "SystemProfile" }
        });
        let report = convert_foreign(&blob).unwrap();

        let types: Vec<ProxyType> = report.configs.iter().map(|c| c.proxy_type).collect();
        assert!(types.contains(&ProxyType::Direct));
        assert!(types.contains(&ProxyType::AutoDetect));
    }

    #[test]
    fn test_switch_virtual_and_unknown_are_skipped() {
        let blob = json!({
            "+Rules": { "profileType": "SwitchProfile" },
            "+Alias": { "profileType": "VirtualProfile" },
            "+What": { "profileType": "QuantumProfile" }
        });
        let report = convert_foreign(&blob).unwrap();

        assert_eq!(report.profiles_seen, 3);
        assert!(report.configs.is_empty());
        assert_eq!(report.skipped.len(), 3);
    }

    #[test]
    fn test_aggregate_profiles_are_skipped_outright() {
        let blob = json!({
            "+auto switch": { "profileType": "SwitchProfile" },
            "+rule list": { "profileType": "SwitchProfile" },
            "+Work": fixed_profile()
        });
        let report = convert_foreign(&blob).unwrap();

        // Aggregates are not even counted as candidates.
        assert_eq!(report.profiles_seen, 1);
        assert_eq!(report.configs.len(), 1);
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn test_import_color_is_deterministic() {
        let first = color_for_name("Work Proxy");
        let second = color_for_name("Work Proxy");
        assert_eq!(first, second);
        assert!(COLOR_PALETTE.contains(&first));

        let blob = json!({ "+Work": fixed_profile() });
        let once = convert_foreign(&blob).unwrap();
        let twice = convert_foreign(&blob).unwrap();
        assert_eq!(once.configs[0].color, twice.configs[0].color);
    }

    #[test]
    fn test_one_bad_profile_never_aborts_the_import() {
        let blob = json!({
            "+Good": fixed_profile(),
            "+Bad": { "profileType": "FixedProfile" },
            "+AlsoGood": { "profileType": "DirectProfile" }
        });
        let report = convert_foreign(&blob).unwrap();

        assert_eq!(report.profiles_seen, 3);
        assert_eq!(report.configs.len(), 2);
        assert_eq!(report.skipped.len(), 1);
    }
}
