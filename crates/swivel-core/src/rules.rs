//! Translation of configurations into platform proxy directives.
//!
//! `format_rules` is a total, deterministic function: the same
//! configuration always produces the same directive and no I/O happens
//! here. Callers are expected to validate first; this module only guards
//! against structurally inconsistent input with descriptive errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bypass;
use crate::config::{ProxyConfig, ProxyType};

/// Scope a directive applies to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProxyScope {
    #[default]
    Regular,
}

impl ProxyScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Regular => "regular",
        }
    }
}

/// Errors raised when a configuration cannot be translated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RulesError {
    #[error("PAC configuration is missing its script")]
    MissingPacScript,

    #[error("proxy configuration is missing a host")]
    MissingHost,

    #[error("proxy configuration is missing a port")]
    MissingPort,
}

/// Fixed-server scheme, the server-based subset of [`ProxyType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxyScheme {
    Http,
    Https,
    Socks4,
    Socks5,
}

impl ProxyScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
            Self::Socks4 => "socks4",
            Self::Socks5 => "socks5",
        }
    }
}

impl std::fmt::Display for ProxyScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Platform-facing description of how traffic should be routed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ProxyDirective {
    /// Connect directly, no proxy.
    Direct,
    /// Let the platform auto-detect proxy settings.
    AutoDetect,
    /// Evaluate the carried PAC script per request.
    Pac { script: String },
    /// Route through a fixed server, except for bypass matches.
    FixedServers {
        scheme: ProxyScheme,
        host: String,
        port: u16,
        bypass: Vec<String>,
    },
}

impl ProxyDirective {
    /// Display-formatted address for status reporting.
    pub fn address(&self) -> String {
        match self {
            Self::Direct => "direct".to_string(),
            Self::AutoDetect => "auto-detect".to_string(),
            Self::Pac { .. } => "PAC script".to_string(),
            Self::FixedServers { scheme, host, port, .. } => {
                format!("{}://{}:{}", scheme.as_str(), host, port)
            }
        }
    }
}

/// Translates a configuration into the directive the platform consumes.
pub fn format_rules(config: &ProxyConfig) -> Result<ProxyDirective, RulesError> {
    match config.proxy_type {
        ProxyType::Direct => Ok(ProxyDirective::Direct),
        ProxyType::AutoDetect => Ok(ProxyDirective::AutoDetect),
        ProxyType::Pac => {
            let script = config
                .pac_script
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .ok_or(RulesError::MissingPacScript)?;
            Ok(ProxyDirective::Pac {
                script: script.to_string(),
            })
        }
        ProxyType::Http | ProxyType::Https | ProxyType::Socks4 | ProxyType::Socks5 => {
            let host = config
                .host
                .as_deref()
                .map(str::trim)
                .filter(|h| !h.is_empty())
                .ok_or(RulesError::MissingHost)?;
            let port = config.port.filter(|p| *p != 0).ok_or(RulesError::MissingPort)?;
            let scheme = match config.proxy_type {
                ProxyType::Http => ProxyScheme::Http,
                ProxyType::Https => ProxyScheme::Https,
                ProxyType::Socks4 => ProxyScheme::Socks4,
                _ => ProxyScheme::Socks5,
            };
            Ok(ProxyDirective::FixedServers {
                scheme,
                host: host.to_string(),
                port,
                bypass: bypass::normalize_entries(&config.bypass_list),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bypass::default_bypass;
    use crate::config::{ProxyConfig, ProxyType};

    #[test]
    fn test_direct_and_auto_detect() {
        let direct = ProxyConfig::new("Direct", ProxyType::Direct);
        assert_eq!(format_rules(&direct).unwrap(), ProxyDirective::Direct);

        let auto = ProxyConfig::new("System", ProxyType::AutoDetect);
        assert_eq!(format_rules(&auto).unwrap(), ProxyDirective::AutoDetect);
    }

    #[test]
    fn test_fixed_server_directive() {
        let config = ProxyConfig::new("Office", ProxyType::Http).with_server("10.0.0.1", 3128);
        let directive = format_rules(&config).unwrap();

        assert_eq!(
            directive,
            ProxyDirective::FixedServers {
                scheme: ProxyScheme::Http,
                host: "10.0.0.1".to_string(),
                port: 3128,
                bypass: default_bypass(),
            }
        );
        assert_eq!(directive.address(), "http://10.0.0.1:3128");
    }

    #[test]
    fn test_host_is_trimmed() {
        let config = ProxyConfig::new("Office", ProxyType::Socks5).with_server("  box.lan  ", 1080);
        match format_rules(&config).unwrap() {
            ProxyDirective::FixedServers { host, scheme, .. } => {
                assert_eq!(host, "box.lan");
                assert_eq!(scheme, ProxyScheme::Socks5);
            }
            other => panic!("unexpected directive: {other:?}"),
        }
    }

    #[test]
    fn test_supplied_bypass_list_is_carried() {
        let config = ProxyConfig::new("Office", ProxyType::Http)
            .with_server("proxy.example.com", 8080)
            .with_bypass_list(vec!["*.corp.example.com".to_string(), " 10.0.0.1 ".to_string()]);

        match format_rules(&config).unwrap() {
            ProxyDirective::FixedServers { bypass, .. } => {
                assert_eq!(bypass, vec!["*.corp.example.com", "10.0.0.1"]);
            }
            other => panic!("unexpected directive: {other:?}"),
        }
    }

    #[test]
    fn test_pac_directive_carries_script() {
        let script = "function FindProxyForURL(url, host) { return 'DIRECT'; }";
        let config = ProxyConfig::new("Auto", ProxyType::Pac).with_pac_script(script);

        assert_eq!(
            format_rules(&config).unwrap(),
            ProxyDirective::Pac {
                script: script.to_string()
            }
        );
    }

    #[test]
    fn test_missing_fields_are_errors() {
        let config = ProxyConfig::new("Auto", ProxyType::Pac);
        assert_eq!(format_rules(&config), Err(RulesError::MissingPacScript));

        let config = ProxyConfig::new("Office", ProxyType::Http);
        assert_eq!(format_rules(&config), Err(RulesError::MissingHost));

        let mut config = ProxyConfig::new("Office", ProxyType::Http);
        config.host = Some("proxy.example.com".to_string());
        assert_eq!(format_rules(&config), Err(RulesError::MissingPort));
    }

    #[test]
    fn test_formatting_is_idempotent() {
        let config = ProxyConfig::new("Office", ProxyType::Https)
            .with_server("proxy.example.com", 443)
            .with_bypass_list(vec!["*.local".to_string()]);

        let first = format_rules(&config).unwrap();
        let second = format_rules(&config).unwrap();
        assert_eq!(first, second);
    }
}
