//! Pack status listener.

use std::collections::HashMap;
use std::sync::Mutex;

use tracing::{info, warn};

/// Status a client reports after being offered the pack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackStatus {
    Accepted,
    Declined,
    Loaded,
    FailedDownload,
}

/// Receives pack status callbacks from clients.
#[derive(Debug, Default)]
pub struct PackReceiver {
    counts: Mutex<HashMap<PackStatus, u64>>,
}

impl PackReceiver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a status reported by `client`.
    pub fn on_status(&self, client: &str, status: PackStatus) {
        match status {
            PackStatus::Declined | PackStatus::FailedDownload => {
                warn!(client = %client, status = ?status, "client did not load the pack");
            }
            PackStatus::Accepted | PackStatus::Loaded => {
                info!(client = %client, status = ?status, "pack status");
            }
        }
        *self
            .counts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(status)
            .or_insert(0) += 1;
    }

    /// Number of times `status` has been reported.
    pub fn count(&self, status: PackStatus) -> u64 {
        self.counts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&status)
            .copied()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_statuses() {
        let receiver = PackReceiver::new();
        receiver.on_status("alice", PackStatus::Accepted);
        receiver.on_status("alice", PackStatus::Loaded);
        receiver.on_status("bob", PackStatus::Declined);
        receiver.on_status("carol", PackStatus::Loaded);

        assert_eq!(receiver.count(PackStatus::Loaded), 2);
        assert_eq!(receiver.count(PackStatus::Accepted), 1);
        assert_eq!(receiver.count(PackStatus::Declined), 1);
        assert_eq!(receiver.count(PackStatus::FailedDownload), 0);
    }
}
