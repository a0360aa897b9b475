//! Connection reachability probe.
//!
//! A single HEAD request to a fixed well-known URL, routed through the
//! tested configuration where the configuration describes a concrete
//! server. Any response counts as success: the probe only needs proof
//! that *a* response arrived through the configured path, not its
//! content. Timeouts are worded distinctly from other transport failures.

use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::debug;

use swivel_core::{ProxyConfig, ProxyType};

use crate::error::{ProxyError, Result};

/// Well-known probe target.
pub const PROBE_URL: &str = "http://www.gstatic.com/generate_204";

/// Default probe timeout.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Successful probe result.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestReport {
    pub status: String,
    pub latency: u64,
    pub message: String,
}

/// Proxy URL the probe client should route through, if the configuration
/// names a concrete server.
///
/// PAC, auto-detect, and direct configurations carry no single endpoint
/// the client could be pointed at (PAC evaluation belongs to the
/// platform), so their probes answer plain target reachability.
pub fn proxy_url_for(config: &ProxyConfig) -> Option<String> {
    if !config.proxy_type.is_server_based() {
        return None;
    }
    let host = config.host.as_deref()?.trim();
    let port = config.port?;
    let scheme = match config.proxy_type {
        ProxyType::Http => "http",
        ProxyType::Https => "https",
        ProxyType::Socks4 => "socks4",
        ProxyType::Socks5 => "socks5",
        _ => return None,
    };
    Some(format!("{scheme}://{host}:{port}"))
}

/// Issues the probe for an already-validated configuration.
pub async fn probe_connection(config: &ProxyConfig, timeout: Duration) -> Result<TestReport> {
    let mut builder = reqwest::Client::builder().timeout(timeout);

    if let Some(proxy_url) = proxy_url_for(config) {
        debug!(%proxy_url, "probing through configured server");
        let proxy = reqwest::Proxy::all(&proxy_url)
            .map_err(|e| ProxyError::Probe(format!("Connection test failed: {e}")))?;
        builder = builder.proxy(proxy);
    } else if config.proxy_type == ProxyType::Direct {
        builder = builder.no_proxy();
    }

    let client = builder
        .build()
        .map_err(|e| ProxyError::Probe(format!("Connection test failed: {e}")))?;

    let started = Instant::now();
    match client.head(PROBE_URL).send().await {
        Ok(response) => {
            let latency = started.elapsed().as_millis() as u64;
            Ok(TestReport {
                status: "ok".to_string(),
                latency,
                message: format!("Reachable ({}) in {}ms", response.status(), latency),
            })
        }
        Err(err) if err.is_timeout() => Err(ProxyError::Probe(timeout_message(timeout))),
        Err(err) => {
            debug!(error = %err, "probe transport failure");
            Err(ProxyError::Probe("Connection test failed".to_string()))
        }
    }
}

fn timeout_message(timeout: Duration) -> String {
    format!("Connection test timed out after {}s", timeout.as_secs())
}
