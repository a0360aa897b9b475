//! Swivel - system proxy switcher.
//!
//! Runs the command surface that popup/options collaborators talk to,
//! wired to the durable configuration store and the host's proxy
//! subsystem.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use directories::ProjectDirs;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use swivel_server::{Server, ServerConfig, DEFAULT_PORT};

/// Swivel - system proxy switcher
#[derive(Parser, Debug)]
#[command(name = "swivel", version, about)]
struct Args {
    /// Port for the command surface
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Database path (defaults to the platform app-data directory)
    #[arg(long)]
    db: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Get the logs directory path.
fn logs_dir() -> Option<PathBuf> {
    ProjectDirs::from("com", "swivel", "swivel").map(|dirs| dirs.data_dir().join("logs"))
}

/// Initialize logging with file rotation, falling back to console only.
fn init_logging(args: &Args) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let log_level = if args.debug { "debug" } else { &args.log_level };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("swivel={},warn", log_level)));

    if let Some(log_dir) = logs_dir() {
        if std::fs::create_dir_all(&log_dir).is_ok() {
            let file_appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .max_log_files(5)
                .filename_prefix("swivel")
                .filename_suffix("log")
                .build(&log_dir)
                .ok();

            if let Some(appender) = file_appender {
                let (non_blocking, guard) = tracing_appender::non_blocking(appender);

                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().with_writer(std::io::stdout))
                    .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
                    .init();

                tracing::info!("Logging to {:?}", log_dir);
                return Some(guard);
            }
        }
    }

    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    tracing::warn!("File logging unavailable, using console only");
    None
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let _log_guard = init_logging(&args);

    let db_path = match args.db {
        Some(path) => path,
        None => swivel_storage::ConfigStore::default_db_path()
            .context("could not resolve the default database path")?,
    };

    let config = ServerConfig::with_db_path(db_path.to_string_lossy().to_string())
        .with_port(args.port);

    let server = Server::new(config).context("failed to start the command surface")?;
    tracing::info!("Swivel ready on {}", server.addr());

    server.run().await.context("command surface exited")?;
    Ok(())
}
