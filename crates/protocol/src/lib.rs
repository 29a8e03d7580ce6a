//! Shared types for the packhost upload pipeline.
//!
//! Kept free of I/O so that both the hosting providers and the upload
//! orchestrator can depend on it.

pub mod interaction;
pub mod messages;
pub mod types;

pub use interaction::{ClickMatcher, ClickPhase, ClickTarget, Interaction, expand_clicks};
pub use messages::{MessageKey, Messages, render_template};
pub use types::{DEFAULT_PLACEHOLDER, Options, ProviderSpec, ProviderType};
