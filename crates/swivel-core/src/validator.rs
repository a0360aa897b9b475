//! Configuration validation.
//!
//! A single pure function runs identically before save, before apply, and
//! before test, so validation cannot drift between call sites. It never
//! panics and never returns an error type: every outcome is a verdict.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::{ProxyConfig, ProxyType, MAX_BYPASS_ENTRIES, MAX_NAME_LEN, MAX_PAC_BYTES};

/// Outcome of validating a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub valid: bool,
    pub error: Option<String>,
}

impl Verdict {
    fn ok() -> Self {
        Self { valid: true, error: None }
    }

    fn fail(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            error: Some(reason.into()),
        }
    }
}

/// Maximum host length.
const MAX_HOST_LEN: usize = 255;

static IPV4_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,3})\.(\d{1,3})\.(\d{1,3})\.(\d{1,3})$").unwrap());

static DOMAIN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?\.)+[A-Za-z]{2,}$").unwrap()
});

static HOSTNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?$").unwrap());

static PAC_SIGNATURE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"function\s+FindProxyForURL\s*\(").unwrap());

/// Validates a configuration, short-circuiting on the first failed rule.
pub fn validate(config: &ProxyConfig) -> Verdict {
    let name = config.name.trim();
    if name.is_empty() {
        return Verdict::fail("Configuration name is required");
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Verdict::fail("Configuration name must be 100 characters or fewer");
    }

    match config.proxy_type {
        ProxyType::Pac => {
            if let Some(verdict) = check_pac_script(config.pac_script.as_deref()) {
                return verdict;
            }
        }
        // Auto-detect and direct configurations carry no further state to check.
        ProxyType::AutoDetect | ProxyType::Direct => return Verdict::ok(),
        _ => {
            if let Some(verdict) = check_server(config) {
                return verdict;
            }
        }
    }

    if config.bypass_list.len() > MAX_BYPASS_ENTRIES {
        return Verdict::fail("Bypass list must have 100 entries or fewer");
    }

    Verdict::ok()
}

fn check_pac_script(script: Option<&str>) -> Option<Verdict> {
    let script = script.unwrap_or("");
    if script.trim().is_empty() {
        return Some(Verdict::fail("PAC script is required"));
    }
    if script.len() > MAX_PAC_BYTES {
        return Some(Verdict::fail("PAC script exceeds the 1MB size limit"));
    }
    if !script.contains("FindProxyForURL") {
        return Some(Verdict::fail("PAC script must define FindProxyForURL"));
    }
    if !PAC_SIGNATURE_RE.is_match(script) {
        return Some(Verdict::fail(
            "PAC script must declare a FindProxyForURL function",
        ));
    }
    let opens = script.chars().filter(|c| *c == '{').count();
    let closes = script.chars().filter(|c| *c == '}').count();
    if opens != closes {
        return Some(Verdict::fail("PAC script has unbalanced braces"));
    }
    let lowered = script.to_ascii_lowercase();
    if lowered.contains("<script>") || lowered.contains("</script>") {
        return Some(Verdict::fail("PAC script must not contain script tags"));
    }
    None
}

fn check_server(config: &ProxyConfig) -> Option<Verdict> {
    let host = config.host.as_deref().unwrap_or("").trim();
    if host.is_empty() {
        return Some(Verdict::fail("Proxy host is required"));
    }
    if host.len() > MAX_HOST_LEN {
        return Some(Verdict::fail("Proxy host must be 255 characters or fewer"));
    }
    if !is_valid_host(host) {
        return Some(Verdict::fail("Proxy host is not a valid address"));
    }

    match config.port {
        None => Some(Verdict::fail("Proxy port is required")),
        Some(0) => Some(Verdict::fail("Proxy port must be between 1 and 65535")),
        Some(_) => None,
    }
}

/// A host is a dotted IPv4 address with octets <= 255, a dotted domain
/// name, or a bare hostname.
fn is_valid_host(host: &str) -> bool {
    if let Some(captures) = IPV4_RE.captures(host) {
        return (1..=4).all(|i| {
            captures[i]
                .parse::<u32>()
                .map(|octet| octet <= 255)
                .unwrap_or(false)
        });
    }
    DOMAIN_RE.is_match(host) || HOSTNAME_RE.is_match(host)
}
