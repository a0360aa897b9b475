//! Command handlers.
//!
//! Every command resolves to a tagged success/failure envelope; no
//! internal error ever escapes this boundary. Handlers delegate to the
//! store and controller and translate their errors into display-ready
//! messages.

use serde_json::{json, Value};
use tracing::debug;

use swivel_core::validate;

use crate::error::{ApiError, Result};
use crate::models::{command_rejection, Command, Envelope};
use crate::state::AppState;

/// Dispatches one raw message and always produces an envelope.
pub async fn dispatch(state: &AppState, raw: Value) -> Envelope {
    let command: Command = match serde_json::from_value(raw) {
        Ok(command) => command,
        Err(err) => return Envelope::failure(command_rejection(&err)),
    };

    debug!(?command, "dispatching command");
    match handle(state, command).await {
        Ok(data) => Envelope::success(data),
        Err(err) => Envelope::failure(err.user_message()),
    }
}

fn to_value<T: serde::Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| ApiError::Storage(e.into()))
}

fn invalid(verdict: swivel_core::Verdict) -> ApiError {
    ApiError::Validation(
        verdict
            .error
            .unwrap_or_else(|| "Invalid configuration".to_string()),
    )
}

async fn handle(state: &AppState, command: Command) -> Result<Value> {
    match command {
        Command::GetStatus => to_value(&state.controller.status()?),

        Command::ApplyProxy { config_id } => {
            to_value(&state.controller.apply(&config_id).await?)
        }

        Command::DisableProxy => {
            let message = state.controller.disable().await?;
            Ok(json!({ "message": message }))
        }

        Command::GetConfigs => to_value(&state.store.list()?),

        Command::SaveConfig { config } => {
            let config = config.into_config();
            let verdict = validate(&config);
            if !verdict.valid {
                return Err(invalid(verdict));
            }
            to_value(&state.store.create(config)?)
        }

        Command::UpdateConfig { id, updates } => {
            // Validate the merged result before touching the store.
            let Some(mut merged) = state.store.get_by_id(&id)? else {
                return Err(ApiError::NotFound);
            };
            updates.apply_to(&mut merged);

            let verdict = validate(&merged);
            if !verdict.valid {
                return Err(invalid(verdict));
            }

            if !state.store.update(&id, &updates)? {
                return Err(ApiError::NotFound);
            }
            to_value(&merged)
        }

        Command::DeleteConfig { config_id } => {
            if !state.store.delete(&config_id)? {
                return Err(ApiError::NotFound);
            }
            Ok(json!({ "message": "Configuration deleted" }))
        }

        Command::TestConnection { config_id } => {
            to_value(&state.controller.test_connection(&config_id).await?)
        }

        Command::GetStatistics => to_value(&state.store.statistics()?),

        Command::ClearStatistics => {
            state.store.clear_statistics()?;
            Ok(json!({ "message": "Statistics cleared" }))
        }

        Command::GetSettings => to_value(&state.store.settings()?),

        Command::UpdateSettings { settings } => {
            state.store.set_settings(&settings)?;
            to_value(&settings)
        }

        Command::ExportData => to_value(&state.store.export_all()?),

        Command::ImportData { data, merge } => {
            to_value(&state.store.import_all(&data, merge)?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Arc;

    use swivel_core::{ProxyConfig, ProxyDirective, ProxyScope, ProxyType};
    use swivel_proxy::{PlatformError, ProxyController, ProxyPlatform, StatusIndicator};
    use swivel_storage::ConfigStore;

    struct AcceptingPlatform;

    #[async_trait]
    impl ProxyPlatform for AcceptingPlatform {
        async fn apply(
            &self,
            _directive: &ProxyDirective,
            _scope: ProxyScope,
        ) -> std::result::Result<(), PlatformError> {
            Ok(())
        }

        async fn clear(&self, _scope: ProxyScope) -> std::result::Result<(), PlatformError> {
            Ok(())
        }
    }

    struct SilentIndicator;

    #[async_trait]
    impl StatusIndicator for SilentIndicator {
        async fn set_status(
            &self,
            _text: &str,
            _color: &str,
        ) -> std::result::Result<(), PlatformError> {
            Ok(())
        }

        async fn set_error(&self) {}

        async fn clear(&self) -> std::result::Result<(), PlatformError> {
            Ok(())
        }
    }

    fn app_state() -> AppState {
        let store = Arc::new(ConfigStore::in_memory().unwrap());
        let controller = Arc::new(ProxyController::new(
            store.clone(),
            Arc::new(AcceptingPlatform),
            Arc::new(SilentIndicator),
        ));
        AppState::new(store, controller)
    }

    async fn send(state: &AppState, message: Value) -> Envelope {
        dispatch(state, message).await
    }

    #[tokio::test]
    async fn test_unknown_command_is_rejected() {
        let state = app_state();
        let envelope = send(&state, json!({ "type": "MAKE_COFFEE" })).await;
        assert!(!envelope.success);
        assert_eq!(envelope.error.as_deref(), Some("Unknown message type"));
    }

    #[tokio::test]
    async fn test_missing_config_id_is_rejected_synchronously() {
        let state = app_state();
        let envelope = send(&state, json!({ "type": "APPLY_PROXY" })).await;
        assert!(!envelope.success);
        assert_eq!(
            envelope.error.as_deref(),
            Some("Missing required field: configId")
        );
    }

    #[tokio::test]
    async fn test_save_then_list_then_apply() {
        let state = app_state();

        let envelope = send(
            &state,
            json!({
                "type": "SAVE_CONFIG",
                "config": { "name": "Office", "type": "HTTP", "host": "10.0.0.1", "port": 3128 }
            }),
        )
        .await;
        assert!(envelope.success, "save failed: {:?}", envelope.error);
        let created = envelope.data.unwrap();
        let id = created["id"].as_str().unwrap().to_string();

        let envelope = send(&state, json!({ "type": "GET_CONFIGS" })).await;
        assert_eq!(envelope.data.unwrap().as_array().unwrap().len(), 1);

        let envelope = send(&state, json!({ "type": "APPLY_PROXY", "configId": id })).await;
        assert!(envelope.success);
        let data = envelope.data.unwrap();
        assert_eq!(data["address"], json!("http://10.0.0.1:3128"));

        let envelope = send(&state, json!({ "type": "GET_STATUS" })).await;
        let data = envelope.data.unwrap();
        assert_eq!(data["isActive"], json!(true));
        assert_eq!(data["proxy"]["name"], json!("Office"));
    }

    #[tokio::test]
    async fn test_save_invalid_config_reports_reason() {
        let state = app_state();

        let envelope = send(
            &state,
            json!({
                "type": "SAVE_CONFIG",
                "config": { "name": "Broken", "type": "HTTP", "port": 0 }
            }),
        )
        .await;
        assert!(!envelope.success);
        assert!(envelope.error.unwrap().contains("host"));
        // Nothing was stored.
        let envelope = send(&state, json!({ "type": "GET_CONFIGS" })).await;
        assert!(envelope.data.unwrap().as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_distinguishable() {
        let state = app_state();
        let envelope = send(
            &state,
            json!({ "type": "UPDATE_CONFIG", "id": "cfg-nope", "updates": { "name": "X" } }),
        )
        .await;
        assert!(!envelope.success);
        assert_eq!(envelope.error.as_deref(), Some("Configuration not found"));
    }

    #[tokio::test]
    async fn test_update_echoes_merged_config() {
        let state = app_state();
        let created = state
            .store
            .create(ProxyConfig::new("Old", ProxyType::Http).with_server("10.0.0.1", 8080))
            .unwrap();

        let envelope = send(
            &state,
            json!({ "type": "UPDATE_CONFIG", "id": created.id, "updates": { "name": "New" } }),
        )
        .await;
        assert!(envelope.success);
        let data = envelope.data.unwrap();
        assert_eq!(data["name"], json!("New"));
        assert_eq!(data["host"], json!("10.0.0.1"));
    }

    #[tokio::test]
    async fn test_delete_and_disable() {
        let state = app_state();
        let created = state
            .store
            .create(ProxyConfig::new("A", ProxyType::Direct))
            .unwrap();

        let envelope = send(&state, json!({ "type": "DELETE_CONFIG", "configId": created.id })).await;
        assert!(envelope.success);

        let envelope = send(&state, json!({ "type": "DELETE_CONFIG", "configId": created.id })).await;
        assert!(!envelope.success);
        assert_eq!(envelope.error.as_deref(), Some("Configuration not found"));

        let envelope = send(&state, json!({ "type": "DISABLE_PROXY" })).await;
        assert!(envelope.success);
        assert_eq!(envelope.data.unwrap()["message"], json!("Proxy disabled"));
    }

    #[tokio::test]
    async fn test_statistics_round_trip() {
        let state = app_state();
        let created = state
            .store
            .create(ProxyConfig::new("A", ProxyType::Direct))
            .unwrap();
        let envelope = send(&state, json!({ "type": "APPLY_PROXY", "configId": created.id })).await;
        assert!(envelope.success);

        let envelope = send(&state, json!({ "type": "GET_STATISTICS" })).await;
        let data = envelope.data.unwrap();
        assert_eq!(data["byProxy"][created.id.as_str()]["connections"], json!(1));

        let envelope = send(&state, json!({ "type": "CLEAR_STATISTICS" })).await;
        assert!(envelope.success);

        let envelope = send(&state, json!({ "type": "GET_STATISTICS" })).await;
        assert!(envelope.data.unwrap()["byProxy"]
            .as_object()
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_settings_commands() {
        let state = app_state();

        let envelope = send(&state, json!({ "type": "GET_SETTINGS" })).await;
        assert_eq!(envelope.data.unwrap()["quickSwitchCount"], json!(3));

        let envelope = send(
            &state,
            json!({
                "type": "UPDATE_SETTINGS",
                "settings": { "autoConnect": true, "quickSwitchCount": 5 }
            }),
        )
        .await;
        assert!(envelope.success);
        assert_eq!(state.store.settings().unwrap().quick_switch_count, 5);
    }

    #[tokio::test]
    async fn test_export_and_foreign_import() {
        let state = app_state();

        let envelope = send(
            &state,
            json!({
                "type": "IMPORT_DATA",
                "merge": true,
                "data": {
                    "schemaVersion": 2,
                    "+Work": {
                        "profileType": "FixedProfile",
                        "fallbackProxy": { "host": "proxy.example.com", "port": 8080, "scheme": "socks5" }
                    },
                    "+Rules": { "profileType": "SwitchProfile" }
                }
            }),
        )
        .await;
        assert!(envelope.success);
        let data = envelope.data.unwrap();
        assert_eq!(data["imported"], json!(1));
        assert_eq!(data["seen"], json!(2));

        let envelope = send(&state, json!({ "type": "EXPORT_DATA" })).await;
        let data = envelope.data.unwrap();
        assert_eq!(data["configs"].as_array().unwrap().len(), 1);
        assert!(data.get("exportDate").is_some());
    }

    #[tokio::test]
    async fn test_unrecognized_import_surfaces_format_error() {
        let state = app_state();
        let envelope = send(
            &state,
            json!({ "type": "IMPORT_DATA", "data": { "bogus": true } }),
        )
        .await;
        assert!(!envelope.success);
        assert!(envelope.error.unwrap().contains("Unrecognized backup format"));
    }
}
