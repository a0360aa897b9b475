//! Swivel Proxy - platform proxy control and apply orchestration.
//!
//! This crate owns everything between a stored configuration and the host
//! platform:
//!
//! - The platform collaborator traits ([`ProxyPlatform`], [`StatusIndicator`])
//! - The cross-platform system proxy implementation ([`SystemProxy`])
//! - A short-TTL read cache smoothing bursts of config reads during one
//!   apply sequence ([`ConfigReadCache`])
//! - The connection reachability probe
//! - The [`ProxyController`] apply/disable/status/test orchestration

pub mod controller;
pub mod error;
pub mod platform;
pub mod probe;
pub mod read_cache;
pub mod system;

pub use controller::{ApplyOutcome, ControllerConfig, ProxyController, StatusReport};
pub use error::{ProxyError, Result};
pub use platform::{
    badge_text, LogIndicator, PlatformError, ProxyPlatform, StatusIndicator, ERROR_BADGE_COLOR,
    ERROR_BADGE_TEXT,
};
pub use probe::{TestReport, DEFAULT_PROBE_TIMEOUT, PROBE_URL};
pub use read_cache::{ConfigReadCache, DEFAULT_READ_TTL};
pub use system::SystemProxy;
