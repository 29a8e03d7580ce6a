//! Hosting error types.

use std::fmt;

/// Boxed error returned by third-party provider constructors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Why a provider could not be resolved from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveErrorKind {
    UnknownType,
    MissingCommand,
    MissingTarget,
    ClassNotFound,
    NotAssignable,
    ConstructorNotFound,
    InstantiationFailed,
}

impl fmt::Display for ResolveErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::UnknownType => "unknown provider type",
            Self::MissingCommand => "missing command",
            Self::MissingTarget => "missing provider name",
            Self::ClassNotFound => "provider not found",
            Self::NotAssignable => "not a hosting provider",
            Self::ConstructorNotFound => "no usable constructor",
            Self::InstantiationFailed => "instantiation failed",
        })
    }
}

/// Failure to build a hosting provider. Always fatal to the upload manager.
#[derive(Debug, thiserror::Error)]
#[error("{kind}: {message} (check `{key}`)")]
pub struct ResolveError {
    kind: ResolveErrorKind,
    key: &'static str,
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl ResolveError {
    pub fn new(kind: ResolveErrorKind, key: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind,
            key,
            message: message.into(),
            source: None,
        }
    }

    /// Attaches the underlying cause.
    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn kind(&self) -> ResolveErrorKind {
        self.kind
    }

    /// Configuration key that needs fixing.
    pub fn key(&self) -> &'static str {
        self.key
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Failure of a single upload attempt. Never invalidates the provider.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("upload rejected: {0}")]
    Rejected(String),

    #[error("command failed: {0}")]
    CommandFailed(String),

    #[error("provider did not report a pack URL")]
    MissingUrl,

    #[error("{0}")]
    Other(String),
}
