//! Platform collaborator traits.
//!
//! The controller talks to the host through these seams so the apply
//! pipeline can be exercised against mocks. [`SystemProxy`] provides the
//! real proxy side; the status indicator is whatever surface the host
//! offers (a badge, a tray icon, a log line).
//!
//! [`SystemProxy`]: crate::system::SystemProxy

use async_trait::async_trait;
use thiserror::Error;
use tracing::{error, info};

use swivel_core::{ProxyConfig, ProxyDirective, ProxyScope, ProxyType};

/// Badge text shown in the error presentation.
pub const ERROR_BADGE_TEXT: &str = "ERR";

/// Badge color for the error presentation.
pub const ERROR_BADGE_COLOR: &str = "#e74c3c";

/// Failure reported by a platform collaborator.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct PlatformError(pub String);

impl PlatformError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// The host's proxy-configuration surface.
#[async_trait]
pub trait ProxyPlatform: Send + Sync {
    /// Applies a directive for the given scope.
    async fn apply(
        &self,
        directive: &ProxyDirective,
        scope: ProxyScope,
    ) -> std::result::Result<(), PlatformError>;

    /// Clears any proxy configuration for the given scope.
    async fn clear(&self, scope: ProxyScope) -> std::result::Result<(), PlatformError>;
}

/// The host's status-indicator surface.
#[async_trait]
pub trait StatusIndicator: Send + Sync {
    /// Shows short status text in the given color.
    async fn set_status(&self, text: &str, color: &str)
        -> std::result::Result<(), PlatformError>;

    /// Forces the error presentation. Best-effort; failures are the
    /// indicator's own problem.
    async fn set_error(&self);

    /// Clears the indicator back to its idle presentation.
    async fn clear(&self) -> std::result::Result<(), PlatformError>;
}

/// Derives the short badge text for an active configuration: the first
/// four characters of the name, uppercased, with a per-type fallback.
pub fn badge_text(config: &ProxyConfig) -> String {
    let name = config.name.trim();
    if !name.is_empty() {
        return name.chars().take(4).collect::<String>().to_uppercase();
    }
    match config.proxy_type {
        ProxyType::Http => "HTTP",
        ProxyType::Https => "HTTPS",
        ProxyType::Socks4 | ProxyType::Socks5 => "SOCK",
        ProxyType::Pac => "PAC",
        ProxyType::AutoDetect => "AUTO",
        ProxyType::Direct => "DIR",
    }
    .to_string()
}

/// Indicator that only logs. Used when the host offers no badge surface.
#[derive(Debug, Default, Clone)]
pub struct LogIndicator;

#[async_trait]
impl StatusIndicator for LogIndicator {
    async fn set_status(&self, text: &str, color: &str) -> std::result::Result<(), PlatformError> {
        info!(text, color, "proxy status");
        Ok(())
    }

    async fn set_error(&self) {
        error!("proxy status: {}", ERROR_BADGE_TEXT);
    }

    async fn clear(&self) -> std::result::Result<(), PlatformError> {
        info!("proxy status cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swivel_core::{ProxyConfig, ProxyType};

    #[test]
    fn test_badge_text_from_name() {
        let config = ProxyConfig::new("office proxy", ProxyType::Http);
        assert_eq!(badge_text(&config), "OFFI");

        let config = ProxyConfig::new("eu", ProxyType::Socks5);
        assert_eq!(badge_text(&config), "EU");
    }

    #[test]
    fn test_badge_text_falls_back_to_type() {
        let mut config = ProxyConfig::new("  ", ProxyType::Socks5);
        assert_eq!(badge_text(&config), "SOCK");

        config.proxy_type = ProxyType::AutoDetect;
        assert_eq!(badge_text(&config), "AUTO");
    }

    #[tokio::test]
    async fn test_log_indicator_is_infallible() {
        let indicator = LogIndicator;
        indicator.set_status("OFFI", "#4a90d9").await.unwrap();
        indicator.set_error().await;
        indicator.clear().await.unwrap();
    }
}
