//! Resource pack upload pipeline.
//!
//! The [`UploadManager`] owns one hosting provider, resolved eagerly from
//! [`Settings`] when the manager is built. Each call to
//! [`UploadManager::upload_and_notify`] runs one upload in the background:
//!
//! 1. **Receiver**: register the pack status listener once, if enabled
//! 2. **Notify**: log "uploading" before the work is scheduled
//! 3. **Upload**: drive the provider on a runtime worker
//! 4. **Sender**: after the first success, pick and register a pack sender

pub mod config;
pub mod error;
pub mod host;
pub mod manager;
pub mod receiver;
pub mod sender;
pub mod types;

pub use config::{ReceiveSettings, SendSettings, Settings, UploadSettings};
pub use error::{ConfigError, ManagerError};
pub use host::{ADVANCED_DELIVERY_INTEGRATION, Listener, PluginHost, StandaloneHost};
pub use manager::{EVENT_BUFFER, UploadManager};
pub use receiver::{PackReceiver, PackStatus};
pub use sender::{
    AdvancedPackSender, BasicPackSender, PackOffer, PackSender, SenderVariant, select_sender,
};
pub use types::{UploadEvent, UploadJob, UploadOutcome};
