//! Shared application state for the command surface.

use std::sync::Arc;

use swivel_proxy::ProxyController;
use swivel_storage::ConfigStore;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Configuration store.
    pub store: Arc<ConfigStore>,
    /// Apply/disable/status/test orchestration.
    pub controller: Arc<ProxyController>,
}

impl AppState {
    pub fn new(store: Arc<ConfigStore>, controller: Arc<ProxyController>) -> Self {
        Self { store, controller }
    }
}
