//! Swivel Server - the command surface for UI collaborators.
//!
//! Exposes the message-passing contract over a localhost HTTP endpoint:
//! `POST /api/message` takes one tagged command object and answers with a
//! tagged success/failure envelope. Popup and options surfaces are thin
//! clients of this endpoint.
//!
//! ## Example
//!
//! ```no_run
//! use swivel_server::{Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let server = Server::new(ServerConfig::default()).unwrap();
//!     server.run().await.unwrap();
//! }
//! ```

pub mod dispatch;
pub mod error;
pub mod models;
pub mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::Value;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use swivel_proxy::{LogIndicator, ProxyController, SystemProxy};
use swivel_storage::ConfigStore;

pub use error::{ApiError, Result};
pub use models::{Command, Envelope};
pub use state::AppState;

/// Default server port.
pub const DEFAULT_PORT: u16 = 47835;

/// Default server host (localhost only).
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind to (default: 127.0.0.1).
    pub host: String,
    /// Port to bind to.
    pub port: u16,
    /// Database path (None = in-memory).
    pub db_path: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            db_path: None,
        }
    }
}

impl ServerConfig {
    /// Creates a config with a specific database path.
    pub fn with_db_path(path: impl Into<String>) -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            db_path: Some(path.into()),
        }
    }

    /// Sets the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}

/// Server error types.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind to address.
    #[error("failed to bind to {0}: {1}")]
    Bind(SocketAddr, std::io::Error),

    /// Storage error.
    #[error("storage error: {0}")]
    Storage(#[from] swivel_storage::StorageError),

    /// Invalid bind address.
    #[error("invalid address: {0}")]
    Address(String),

    /// Server runtime error.
    #[error("server error: {0}")]
    Runtime(std::io::Error),
}

/// The command surface server.
pub struct Server {
    router: Router,
    addr: SocketAddr,
}

impl Server {
    /// Creates a server with the given configuration, wiring the real
    /// system proxy backend.
    pub fn new(config: ServerConfig) -> std::result::Result<Self, ServerError> {
        let store = if let Some(ref path) = config.db_path {
            ConfigStore::with_path(path)?
        } else {
            ConfigStore::in_memory()?
        };

        let store = Arc::new(store);
        let controller = Arc::new(ProxyController::new(
            store.clone(),
            Arc::new(SystemProxy::new()),
            Arc::new(LogIndicator),
        ));

        Self::with_state(config, AppState::new(store, controller))
    }

    /// Creates a server with custom application state.
    pub fn with_state(
        config: ServerConfig,
        state: AppState,
    ) -> std::result::Result<Self, ServerError> {
        // CORS is open so the extension surfaces can talk to us; the bind
        // address stays loopback-only.
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        let router = Router::new()
            .route("/api/message", post(message))
            .layer(cors)
            .with_state(state);

        let addr: SocketAddr = format!("{}:{}", config.host, config.port)
            .parse()
            .map_err(|_| ServerError::Address(format!("{}:{}", config.host, config.port)))?;

        Ok(Self { router, addr })
    }

    /// The address the server will bind to.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Binds and serves until the process exits.
    pub async fn run(self) -> std::result::Result<(), ServerError> {
        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(|e| ServerError::Bind(self.addr, e))?;

        info!("Command surface listening on {}", self.addr);
        axum::serve(listener, self.router)
            .await
            .map_err(ServerError::Runtime)
    }
}

/// POST /api/message - dispatch one command.
async fn message(State(state): State<AppState>, Json(raw): Json<Value>) -> Json<Envelope> {
    Json(dispatch::dispatch(&state, raw).await)
}
