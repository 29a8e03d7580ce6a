use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form provider options, as read from `upload.options`.
pub type Options = Map<String, Value>;

/// Placeholder replaced by the artifact path in command-line providers.
pub const DEFAULT_PLACEHOLDER: &str = "${file}";

/// Hosting backend selected by `upload.type`.
///
/// Unrecognized tags are preserved in [`ProviderType::Unknown`] so that
/// resolution can report them instead of failing at parse time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProviderType {
    /// HTTP upload to a polymath-compatible hosting server.
    Polymath,
    /// Copy into a local directory served under a public base URL.
    SelfHost,
    /// External process (`sh` and `cmd` are aliases).
    Command,
    /// Implementation looked up by name in the provider registry.
    External,
    Unknown(String),
}

impl ProviderType {
    /// Parses a type tag, case-insensitively.
    pub fn parse(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "polymath" => Self::Polymath,
            "self-host" | "self_host" | "selfhost" => Self::SelfHost,
            "sh" | "cmd" => Self::Command,
            "external" => Self::External,
            _ => Self::Unknown(tag.to_string()),
        }
    }

    /// Canonical tag for this type.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Polymath => "polymath",
            Self::SelfHost => "self-host",
            Self::Command => "cmd",
            Self::External => "external",
            Self::Unknown(tag) => tag,
        }
    }
}

impl From<String> for ProviderType {
    fn from(tag: String) -> Self {
        Self::parse(&tag)
    }
}

impl From<ProviderType> for String {
    fn from(ty: ProviderType) -> Self {
        ty.as_str().to_string()
    }
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which hosting backend to build, and with what options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSpec {
    #[serde(rename = "type")]
    pub provider_type: ProviderType,
    #[serde(default)]
    pub options: Options,
}

impl ProviderSpec {
    pub fn new(provider_type: ProviderType, options: Options) -> Self {
        Self {
            provider_type,
            options,
        }
    }

    /// Returns a string option, or `None` when absent or not a string.
    pub fn option_str(&self, key: &str) -> Option<&str> {
        self.options.get(key).and_then(Value::as_str)
    }

    /// Returns a list option as strings.
    ///
    /// Scalars inside the list are stringified; nested arrays, objects and
    /// nulls are skipped. A missing or non-array option yields an empty list.
    pub fn option_strings(&self, key: &str) -> Vec<String> {
        let Some(Value::Array(items)) = self.options.get(key) else {
            return Vec::new();
        };
        items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                Value::Bool(b) => Some(b.to_string()),
                _ => None,
            })
            .collect()
    }
}
