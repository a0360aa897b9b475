//! Cross-platform system proxy configuration.
//!
//! Translates a [`ProxyDirective`] into host settings by shelling out to
//! the platform configuration tools: `gsettings` on Linux (GNOME),
//! `networksetup` on macOS, and the Internet Settings registry keys via
//! `reg` on Windows. PAC scripts are staged to a local file and referenced
//! by `file://` URL, since every backend takes a URL rather than script
//! text.

use std::path::PathBuf;
use std::process::Command;

use async_trait::async_trait;
use tracing::{debug, info};

use swivel_core::{ProxyDirective, ProxyScheme, ProxyScope};

use crate::platform::{PlatformError, ProxyPlatform};

/// macOS network service whose proxy settings are managed.
#[cfg(target_os = "macos")]
const NETWORK_SERVICE: &str = "Wi-Fi";

/// System proxy backend for the current host.
#[derive(Debug, Clone, Default)]
pub struct SystemProxy;

impl SystemProxy {
    pub fn new() -> Self {
        Self
    }

    /// Path the PAC script is staged to before being handed to the host.
    fn pac_script_path() -> PathBuf {
        std::env::temp_dir().join("swivel.pac")
    }

    fn stage_pac_script(script: &str) -> Result<String, PlatformError> {
        let path = Self::pac_script_path();
        std::fs::write(&path, script)
            .map_err(|e| PlatformError::new(format!("failed to stage PAC script: {e}")))?;
        Ok(format!("file://{}", path.display()))
    }
}

#[async_trait]
impl ProxyPlatform for SystemProxy {
    async fn apply(
        &self,
        directive: &ProxyDirective,
        scope: ProxyScope,
    ) -> Result<(), PlatformError> {
        debug!(?directive, scope = scope.as_str(), "applying system proxy");
        match directive {
            ProxyDirective::Direct => clear_system_proxy(),
            ProxyDirective::AutoDetect => enable_auto_detect(),
            ProxyDirective::Pac { script } => {
                let url = Self::stage_pac_script(script)?;
                enable_pac_url(&url)
            }
            ProxyDirective::FixedServers {
                scheme,
                host,
                port,
                bypass,
            } => enable_fixed_server(*scheme, host, *port, bypass),
        }
    }

    async fn clear(&self, scope: ProxyScope) -> Result<(), PlatformError> {
        info!(scope = scope.as_str(), "clearing system proxy");
        clear_system_proxy()
    }
}

fn run(tool: &str, args: &[&str]) -> Result<(), PlatformError> {
    let output = Command::new(tool)
        .args(args)
        .output()
        .map_err(|e| PlatformError::new(format!("failed to run {tool}: {e}")))?;

    if output.status.success() {
        Ok(())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(PlatformError::new(format!(
            "{tool} exited with {}: {}",
            output.status,
            stderr.trim()
        )))
    }
}

// ============================================================================
// Linux (GNOME) implementation
// ============================================================================

#[cfg(target_os = "linux")]
fn enable_fixed_server(
    scheme: ProxyScheme,
    host: &str,
    port: u16,
    bypass: &[String],
) -> Result<(), PlatformError> {
    let port = port.to_string();

    let channels: &[&str] = match scheme {
        ProxyScheme::Http => &["http", "https"],
        ProxyScheme::Https => &["https"],
        ProxyScheme::Socks4 | ProxyScheme::Socks5 => &["socks"],
    };
    for channel in channels {
        let schema = format!("org.gnome.system.proxy.{channel}");
        run("gsettings", &["set", &schema, "host", host])?;
        run("gsettings", &["set", &schema, "port", &port])?;
    }

    let ignore_hosts = format!(
        "[{}]",
        bypass
            .iter()
            .map(|entry| format!("'{entry}'"))
            .collect::<Vec<_>>()
            .join(", ")
    );
    run(
        "gsettings",
        &["set", "org.gnome.system.proxy", "ignore-hosts", &ignore_hosts],
    )?;
    run("gsettings", &["set", "org.gnome.system.proxy", "mode", "manual"])
}

#[cfg(target_os = "linux")]
fn enable_pac_url(url: &str) -> Result<(), PlatformError> {
    run(
        "gsettings",
        &["set", "org.gnome.system.proxy", "autoconfig-url", url],
    )?;
    run("gsettings", &["set", "org.gnome.system.proxy", "mode", "auto"])
}

#[cfg(target_os = "linux")]
fn enable_auto_detect() -> Result<(), PlatformError> {
    // Auto mode without an autoconfig URL asks the desktop to discover one.
    run(
        "gsettings",
        &["set", "org.gnome.system.proxy", "autoconfig-url", ""],
    )?;
    run("gsettings", &["set", "org.gnome.system.proxy", "mode", "auto"])
}

#[cfg(target_os = "linux")]
fn clear_system_proxy() -> Result<(), PlatformError> {
    run("gsettings", &["set", "org.gnome.system.proxy", "mode", "none"])
}

// ============================================================================
// macOS implementation
// ============================================================================

#[cfg(target_os = "macos")]
fn enable_fixed_server(
    scheme: ProxyScheme,
    host: &str,
    port: u16,
    bypass: &[String],
) -> Result<(), PlatformError> {
    let port = port.to_string();

    match scheme {
        ProxyScheme::Http | ProxyScheme::Https => {
            run(
                "networksetup",
                &["-setwebproxy", NETWORK_SERVICE, host, &port],
            )?;
            run(
                "networksetup",
                &["-setsecurewebproxy", NETWORK_SERVICE, host, &port],
            )?;
        }
        ProxyScheme::Socks4 | ProxyScheme::Socks5 => {
            run(
                "networksetup",
                &["-setsocksfirewallproxy", NETWORK_SERVICE, host, &port],
            )?;
        }
    }

    let mut args = vec!["-setproxybypassdomains", NETWORK_SERVICE];
    args.extend(bypass.iter().map(String::as_str));
    run("networksetup", &args)
}

#[cfg(target_os = "macos")]
fn enable_pac_url(url: &str) -> Result<(), PlatformError> {
    run(
        "networksetup",
        &["-setautoproxyurl", NETWORK_SERVICE, url],
    )?;
    run(
        "networksetup",
        &["-setautoproxystate", NETWORK_SERVICE, "on"],
    )
}

#[cfg(target_os = "macos")]
fn enable_auto_detect() -> Result<(), PlatformError> {
    run(
        "networksetup",
        &["-setproxyautodiscovery", NETWORK_SERVICE, "on"],
    )
}

#[cfg(target_os = "macos")]
fn clear_system_proxy() -> Result<(), PlatformError> {
    run(
        "networksetup",
        &["-setwebproxystate", NETWORK_SERVICE, "off"],
    )?;
    run(
        "networksetup",
        &["-setsecurewebproxystate", NETWORK_SERVICE, "off"],
    )?;
    run(
        "networksetup",
        &["-setsocksfirewallproxystate", NETWORK_SERVICE, "off"],
    )?;
    run(
        "networksetup",
        &["-setautoproxystate", NETWORK_SERVICE, "off"],
    )?;
    run(
        "networksetup",
        &["-setproxyautodiscovery", NETWORK_SERVICE, "off"],
    )
}

// ============================================================================
// Windows implementation
// ============================================================================

#[cfg(target_os = "windows")]
const INTERNET_SETTINGS: &str =
    r"HKCU\Software\Microsoft\Windows\CurrentVersion\Internet Settings";

#[cfg(target_os = "windows")]
fn enable_fixed_server(
    scheme: ProxyScheme,
    host: &str,
    port: u16,
    bypass: &[String],
) -> Result<(), PlatformError> {
    let server = match scheme {
        ProxyScheme::Http | ProxyScheme::Https => format!("{host}:{port}"),
        ProxyScheme::Socks4 | ProxyScheme::Socks5 => format!("socks={host}:{port}"),
    };
    let override_list = bypass.join(";");

    run(
        "reg",
        &[
            "add", INTERNET_SETTINGS, "/v", "ProxyServer", "/t", "REG_SZ", "/d", &server, "/f",
        ],
    )?;
    run(
        "reg",
        &[
            "add", INTERNET_SETTINGS, "/v", "ProxyOverride", "/t", "REG_SZ", "/d",
            &override_list, "/f",
        ],
    )?;
    run(
        "reg",
        &[
            "add", INTERNET_SETTINGS, "/v", "ProxyEnable", "/t", "REG_DWORD", "/d", "1", "/f",
        ],
    )
}

#[cfg(target_os = "windows")]
fn enable_pac_url(url: &str) -> Result<(), PlatformError> {
    run(
        "reg",
        &[
            "add", INTERNET_SETTINGS, "/v", "AutoConfigURL", "/t", "REG_SZ", "/d", url, "/f",
        ],
    )?;
    run(
        "reg",
        &[
            "add", INTERNET_SETTINGS, "/v", "ProxyEnable", "/t", "REG_DWORD", "/d", "0", "/f",
        ],
    )
}

#[cfg(target_os = "windows")]
fn enable_auto_detect() -> Result<(), PlatformError> {
    run(
        "reg",
        &[
            "delete", INTERNET_SETTINGS, "/v", "AutoConfigURL", "/f",
        ],
    )
    .ok();
    run(
        "reg",
        &[
            "add", INTERNET_SETTINGS, "/v", "AutoDetect", "/t", "REG_DWORD", "/d", "1", "/f",
        ],
    )
}

#[cfg(target_os = "windows")]
fn clear_system_proxy() -> Result<(), PlatformError> {
    run(
        "reg",
        &[
            "add", INTERNET_SETTINGS, "/v", "ProxyEnable", "/t", "REG_DWORD", "/d", "0", "/f",
        ],
    )?;
    run(
        "reg",
        &[
            "delete", INTERNET_SETTINGS, "/v", "AutoConfigURL", "/f",
        ],
    )
    .ok();
    Ok(())
}

// ============================================================================
// Fallback for unsupported platforms
// ============================================================================

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
fn enable_fixed_server(
    _scheme: ProxyScheme,
    _host: &str,
    _port: u16,
    _bypass: &[String],
) -> Result<(), PlatformError> {
    Err(PlatformError::new("unsupported operating system"))
}

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
fn enable_pac_url(_url: &str) -> Result<(), PlatformError> {
    Err(PlatformError::new("unsupported operating system"))
}

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
fn enable_auto_detect() -> Result<(), PlatformError> {
    Err(PlatformError::new("unsupported operating system"))
}

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
fn clear_system_proxy() -> Result<(), PlatformError> {
    Err(PlatformError::new("unsupported operating system"))
}
