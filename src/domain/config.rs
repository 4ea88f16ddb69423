//! # Configuration
//!
//! Manages the loading and parsing of the application's configuration file
//! (`config.yaml`). Defines the structs for the bot credentials, the consent
//! store, and the message-handler selection.

use serde::Deserialize;

/// Main application configuration structure.
/// Matches the layout of `data/config.yaml`.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub bot: BotConfig,
    #[serde(default)]
    pub consent: ConsentConfig,
    #[serde(default)]
    pub messages: MessagesConfig,
}

/// Credentials and default identifiers for the platform session.
#[derive(Debug, Deserialize, Clone)]
pub struct BotConfig {
    pub token: String,
    #[serde(default)]
    #[allow(dead_code)]
    pub default_guild_id: Option<u64>,
    #[serde(default)]
    #[allow(dead_code)]
    pub default_channel_id: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ConsentConfig {
    #[serde(default = "default_consent_path")]
    pub path: String,
}

impl Default for ConsentConfig {
    fn default() -> Self {
        Self {
            path: default_consent_path(),
        }
    }
}

fn default_consent_path() -> String {
    "data/consent.json".to_string()
}

/// Which inbound-message collaborator to wire: `log` or `null`.
#[derive(Debug, Deserialize, Clone)]
pub struct MessagesConfig {
    #[serde(default = "default_message_handler")]
    pub handler: String,
}

impl Default for MessagesConfig {
    fn default() -> Self {
        Self {
            handler: default_message_handler(),
        }
    }
}

fn default_message_handler() -> String {
    "log".to_string()
}
