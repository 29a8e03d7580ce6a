//! Upload pipeline error types.

use packhost_hosting::ResolveError;

/// Errors produced while loading settings.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid settings: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors produced while building an upload manager.
#[derive(Debug, thiserror::Error)]
pub enum ManagerError {
    #[error("cannot resolve hosting provider")]
    Resolve(#[from] ResolveError),

    #[error("upload manager must be created inside a tokio runtime")]
    NoRuntime,
}
