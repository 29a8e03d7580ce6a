//! Host seam: listener registration and integration detection.
//!
//! The embedding application implements [`PluginHost`] on top of its own
//! event system. [`StandaloneHost`] is a self-contained implementation for
//! command-line use and tests.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex};

use crate::receiver::PackReceiver;
use crate::sender::PackSender;

/// Integration the advanced sender depends on.
pub const ADVANCED_DELIVERY_INTEGRATION: &str = "ProtocolLib";

/// A listener handed to the host's event system.
#[derive(Clone)]
pub enum Listener {
    Receiver(Arc<PackReceiver>),
    Sender(Arc<dyn PackSender>),
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Receiver(_) => f.write_str("Listener::Receiver"),
            Self::Sender(sender) => write!(f, "Listener::Sender({:?})", sender.variant()),
        }
    }
}

/// The environment the upload manager runs in.
pub trait PluginHost: Send + Sync {
    /// Registers a listener with the host's event system.
    fn register_listener(&self, listener: Listener);

    /// Returns `true` when the named optional integration is present and active.
    fn integration_active(&self, name: &str) -> bool;
}

/// In-process host that records registered listeners.
#[derive(Debug, Default)]
pub struct StandaloneHost {
    integrations: HashSet<String>,
    listeners: Mutex<Vec<Listener>>,
}

impl StandaloneHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks an integration as active.
    pub fn with_integration(mut self, name: impl Into<String>) -> Self {
        self.integrations.insert(name.into());
        self
    }

    pub fn listeners(&self) -> Vec<Listener> {
        self.listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn sender_count(&self) -> usize {
        self.listeners()
            .iter()
            .filter(|l| matches!(l, Listener::Sender(_)))
            .count()
    }

    pub fn receiver_count(&self) -> usize {
        self.listeners()
            .iter()
            .filter(|l| matches!(l, Listener::Receiver(_)))
            .count()
    }
}

impl PluginHost for StandaloneHost {
    fn register_listener(&self, listener: Listener) {
        tracing::debug!(listener = ?listener, "listener registered");
        self.listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(listener);
    }

    fn integration_active(&self, name: &str) -> bool {
        self.integrations.contains(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integrations() {
        let host = StandaloneHost::new().with_integration(ADVANCED_DELIVERY_INTEGRATION);
        assert!(host.integration_active("ProtocolLib"));
        assert!(!host.integration_active("Other"));
        assert!(!StandaloneHost::new().integration_active("ProtocolLib"));
    }

    #[test]
    fn records_listeners() {
        let host = StandaloneHost::new();
        host.register_listener(Listener::Receiver(Arc::new(PackReceiver::new())));
        assert_eq!(host.receiver_count(), 1);
        assert_eq!(host.sender_count(), 0);
    }
}
