//! Upload settings.
//!
//! Read from a single JSON document:
//!
//! ```json
//! {
//!   "upload": { "enabled": true, "type": "polymath", "options": { "server": "..." } },
//!   "receive": { "enabled": false },
//!   "send": { "pack": true, "join_message": false, "advanced": false },
//!   "messages": { "prefix": "[packs] " }
//! }
//! ```
//!
//! Every section and field is optional and falls back to its default.

use std::path::Path;

use packhost_protocol::{Messages, Options, ProviderSpec, ProviderType};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub upload: UploadSettings,
    pub receive: ReceiveSettings,
    pub send: SendSettings,
    pub messages: Messages,
}

/// `upload.*`: master switch and provider selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadSettings {
    pub enabled: bool,
    #[serde(rename = "type")]
    pub provider_type: ProviderType,
    pub options: Options,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            provider_type: ProviderType::Polymath,
            options: Options::new(),
        }
    }
}

/// `receive.*`: pack status listener.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiveSettings {
    pub enabled: bool,
}

/// `send.*`: pack delivery to connected clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SendSettings {
    /// Offer the pack to clients.
    pub pack: bool,
    /// Tell joining clients where the pack is.
    #[serde(alias = "joinMessage")]
    pub join_message: bool,
    /// Use the advanced sender when the host supports it.
    pub advanced: bool,
    /// Prompt shown by the advanced sender.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    /// Ask the advanced sender to require the pack.
    pub mandatory: bool,
}

impl Default for SendSettings {
    fn default() -> Self {
        Self {
            pack: true,
            join_message: false,
            advanced: false,
            prompt: None,
            mandatory: false,
        }
    }
}

impl SendSettings {
    /// Whether any delivery feature needs a pack sender.
    pub fn wants_sender(&self) -> bool {
        self.pack || self.join_message
    }
}

impl Settings {
    /// Loads settings from `path`, or defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::warn!(path = %path.display(), "settings file not found, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }

    /// The provider selection described by `upload.type` and `upload.options`.
    pub fn provider_spec(&self) -> ProviderSpec {
        ProviderSpec::new(
            self.upload.provider_type.clone(),
            self.upload.options.clone(),
        )
    }
}
