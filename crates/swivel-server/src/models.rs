//! Command and envelope shapes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use swivel_core::{AppSettings, ConfigDraft, ConfigPatch};

/// A command from a UI collaborator, tagged by `type`.
///
/// Unknown tags and missing required fields fail deserialization and are
/// rejected before any asynchronous work begins. Configuration payloads
/// are nested (`config`, `updates`) because the envelope's `type` tag
/// would otherwise collide with the configuration's own `type` field.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Command {
    GetStatus,
    #[serde(rename_all = "camelCase")]
    ApplyProxy { config_id: String },
    DisableProxy,
    GetConfigs,
    SaveConfig { config: ConfigDraft },
    UpdateConfig { id: String, updates: ConfigPatch },
    #[serde(rename_all = "camelCase")]
    DeleteConfig { config_id: String },
    #[serde(rename_all = "camelCase")]
    TestConnection { config_id: String },
    GetStatistics,
    ClearStatistics,
    GetSettings,
    UpdateSettings { settings: AppSettings },
    ExportData,
    ImportData {
        data: Value,
        #[serde(default)]
        merge: bool,
    },
}

/// Tagged success/failure response envelope.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Envelope {
    pub fn success(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Converts a command deserialization error into the contract wording:
/// unknown tags become "Unknown message type", absent required fields
/// name the field.
pub fn command_rejection(err: &serde_json::Error) -> String {
    let raw = err.to_string();
    if raw.starts_with("unknown variant") {
        return "Unknown message type".to_string();
    }
    if let Some(rest) = raw.strip_prefix("missing field `") {
        if let Some(field) = rest.split('`').next() {
            return format!("Missing required field: {field}");
        }
    }
    format!("Invalid message: {raw}")
}
