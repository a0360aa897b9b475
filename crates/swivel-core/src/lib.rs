//! Swivel core - configuration model and pure proxy-switching logic.
//!
//! This crate holds everything that needs no I/O:
//!
//! - The configuration model (`ProxyConfig` and friends)
//! - Validation of configurations before they are saved, applied, or tested
//! - Translation of a validated configuration into a platform proxy directive
//! - Bypass-list normalization
//! - Detection and conversion of the competing switcher's backup format
//!
//! # Example
//!
//! ```
//! use swivel_core::{format_rules, validate, ProxyConfig, ProxyType};
//!
//! let config = ProxyConfig::new("Office", ProxyType::Http)
//!     .with_server("proxy.example.com", 8080);
//!
//! let verdict = validate(&config);
//! assert!(verdict.valid);
//!
//! let directive = format_rules(&config).unwrap();
//! assert_eq!(directive.address(), "http://proxy.example.com:8080");
//! ```

pub mod bypass;
pub mod config;
pub mod import;
pub mod rules;
pub mod validator;

pub use config::{
    AppSettings, ConfigDraft, ConfigPatch, ProxyConfig, ProxyType, UsageEntry, UsageStats,
    COLOR_PALETTE, DEFAULT_COLOR,
};
pub use import::{
    convert_foreign, detect_format, is_foreign_format, BackupFormat, ConversionReport, ImportError,
    SkippedProfile,
};
pub use rules::{format_rules, ProxyDirective, ProxyScheme, ProxyScope, RulesError};
pub use validator::{validate, Verdict};
