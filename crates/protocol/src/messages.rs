//! Localizable notification templates.
//!
//! Templates use `<name>` placeholders. Any placeholder without a matching
//! argument is left untouched so that markup tags survive rendering.

use serde::{Deserialize, Serialize};

/// Identifies a notification template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKey {
    Prefix,
    /// Placeholders: `prefix`.
    Uploading,
    /// Placeholders: `prefix`, `url`, `delay`.
    Uploaded,
    NotUploaded,
    /// Placeholders: `prefix`, `url`.
    JoinMessage,
}

impl MessageKey {
    /// Built-in English template.
    pub fn default_template(self) -> &'static str {
        match self {
            Self::Prefix => "[packhost] ",
            Self::Uploading => "<prefix>Uploading resource pack...",
            Self::Uploaded => "<prefix>Resource pack uploaded on <url> in <delay>ms",
            Self::NotUploaded => "Resource pack could not be uploaded",
            Self::JoinMessage => "<prefix>A resource pack is available at <url>",
        }
    }
}

/// Template overrides read from the `messages` settings section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Messages {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploading: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploaded: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_uploaded: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub join_message: Option<String>,
}

impl Messages {
    /// Returns the configured template for `key`, or the built-in one.
    pub fn template(&self, key: MessageKey) -> &str {
        let configured = match key {
            MessageKey::Prefix => &self.prefix,
            MessageKey::Uploading => &self.uploading,
            MessageKey::Uploaded => &self.uploaded,
            MessageKey::NotUploaded => &self.not_uploaded,
            MessageKey::JoinMessage => &self.join_message,
        };
        configured
            .as_deref()
            .unwrap_or_else(|| key.default_template())
    }

    /// The rendered prefix text.
    pub fn prefix(&self) -> &str {
        self.template(MessageKey::Prefix)
    }

    /// Renders `key` with `args`. The `prefix` placeholder is always bound.
    pub fn render(&self, key: MessageKey, args: &[(&str, &str)]) -> String {
        let mut all = Vec::with_capacity(args.len() + 1);
        all.push(("prefix", self.prefix()));
        all.extend_from_slice(args);
        render_template(self.template(key), &all)
    }
}

/// Substitutes `<name>` placeholders in a single pass.
///
/// Substituted values are never rescanned. Later entries in `args` win over
/// earlier ones with the same name.
pub fn render_template(template: &str, args: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('<') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let Some(end) = tail.find('>') else {
            out.push_str(tail);
            return out;
        };
        let name = &tail[1..end];
        match args.iter().rev().find(|(key, _)| *key == name) {
            Some((_, value)) => out.push_str(value),
            None => out.push_str(&tail[..=end]),
        }
        rest = &tail[end + 1..];
    }

    out.push_str(rest);
    out
}
