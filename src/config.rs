//! In-process configuration shape. The core only ever reads `Settings`;
//! loading and saving them is an external collaborator's job (an external
//! `ConfigManager`) — this mirrors
//! `create_adapter_from_config_str` keeping parsing separate from the
//! file I/O that produces the string it parses.

use crate::provider::ProviderType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    Http,
    Https,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPreferences {
    #[serde(default = "default_true")]
    pub tui_mode: bool,
    #[serde(default = "default_true")]
    pub streaming: bool,
    #[serde(default)]
    pub persistent_tui: bool,
}

fn default_true() -> bool {
    true
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self { tui_mode: true, streaming: true, persistent_tui: false }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum McpServerStatus {
    Connected,
    Disconnected,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpServerEntry {
    pub url: String,
    pub status: McpServerStatus,
}

/// In-process settings shape. Mirrors the externally-persisted JSON
/// object named in `EXTERNAL INTERFACES`; field names here are the Rust
/// equivalents of that object's camelCase keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub protocol: Protocol,
    pub llm_host: String,
    pub llm_port: u16,
    pub current_model: Option<String>,
    #[serde(with = "duration_secs")]
    pub api_timeout: Duration,
    pub user_preferences: UserPreferences,
    pub enable_smart_routing: bool,
    pub enable_proactive_context: bool,
    pub model_context_window: usize,
    pub context_window_usage: f64,
    pub mcp_servers: HashMap<String, McpServerEntry>,
    #[serde(with = "duration_secs")]
    pub request_timeout: Duration,
    pub clarification_confidence_threshold: f64,
    pub preferred_provider: Option<ProviderType>,
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            protocol: Protocol::Http,
            llm_host: "127.0.0.1".to_string(),
            llm_port: 11434,
            current_model: None,
            api_timeout: Duration::from_secs(30),
            user_preferences: UserPreferences::default(),
            enable_smart_routing: true,
            enable_proactive_context: true,
            model_context_window: 8192,
            context_window_usage: 0.7,
            mcp_servers: HashMap::new(),
            request_timeout: Duration::from_secs(60),
            clarification_confidence_threshold: 0.7,
            preferred_provider: None,
        }
    }
}

/// Seam an external collaborator implements to load/save `Settings`.
/// The core never calls either method; it only ever reads an already
/// loaded `Settings` value.
pub trait SettingsStore {
    type Error;

    fn load(&self) -> Result<Settings, Self::Error>;
    fn save(&self, settings: &Settings) -> Result<(), Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_enable_smart_routing_and_proactive_context() {
        let settings = Settings::default();
        assert!(settings.enable_smart_routing);
        assert!(settings.enable_proactive_context);
    }

    #[test]
    fn default_clarification_threshold_is_seventy_percent() {
        assert_eq!(Settings::default().clarification_confidence_threshold, 0.7);
    }

    #[test]
    fn settings_round_trip_through_json() {
        let settings = Settings::default();
        let json = serde_json::to_string(&settings).unwrap();
        let restored: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(settings, restored);
    }
}
