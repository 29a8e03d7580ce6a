//! Events and work units of the upload pipeline.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use packhost_protocol::{MessageKey, Messages};

/// Notification emitted by the upload manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadEvent {
    /// An upload was scheduled.
    Uploading,
    /// The pack is hosted at `url`; the upload took `delay_ms`.
    Uploaded { url: String, delay_ms: u64 },
    /// The provider failed. No detail is carried beyond the fact.
    NotUploaded,
}

impl UploadEvent {
    pub fn message_key(&self) -> MessageKey {
        match self {
            Self::Uploading => MessageKey::Uploading,
            Self::Uploaded { .. } => MessageKey::Uploaded,
            Self::NotUploaded => MessageKey::NotUploaded,
        }
    }

    /// Renders the localized notification text.
    pub fn render(&self, messages: &Messages) -> String {
        match self {
            Self::Uploaded { url, delay_ms } => {
                let delay = delay_ms.to_string();
                messages.render(
                    self.message_key(),
                    &[("url", url.as_str()), ("delay", delay.as_str())],
                )
            }
            _ => messages.render(self.message_key(), &[]),
        }
    }
}

/// Result of one upload attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Succeeded { url: String, elapsed: Duration },
    Failed,
}

/// A single upload attempt. Not retained after it completes.
#[derive(Debug, Clone)]
pub struct UploadJob {
    pub artifact: PathBuf,
    pub started_at: Instant,
}

impl UploadJob {
    /// Starts the clock for uploading `artifact`.
    pub fn start(artifact: PathBuf) -> Self {
        Self {
            artifact,
            started_at: Instant::now(),
        }
    }

    /// Marks the job as succeeded with the hosted `url`.
    pub fn succeeded(&self, url: String) -> UploadOutcome {
        UploadOutcome::Succeeded {
            url,
            elapsed: self.started_at.elapsed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_events() {
        let messages = Messages::default();
        assert_eq!(
            UploadEvent::Uploading.render(&messages),
            "[packhost] Uploading resource pack..."
        );
        assert_eq!(
            UploadEvent::Uploaded {
                url: "http://x/p.zip".into(),
                delay_ms: 12,
            }
            .render(&messages),
            "[packhost] Resource pack uploaded on http://x/p.zip in 12ms"
        );
        assert_eq!(
            UploadEvent::NotUploaded.render(&messages),
            "Resource pack could not be uploaded"
        );
    }

    #[test]
    fn job_elapsed_is_measured_from_start() {
        let job = UploadJob::start(PathBuf::from("/tmp/p.zip"));
        std::thread::sleep(Duration::from_millis(5));
        match job.succeeded("http://x".into()) {
            UploadOutcome::Succeeded { url, elapsed } => {
                assert_eq!(url, "http://x");
                assert!(elapsed >= Duration::from_millis(5));
            }
            UploadOutcome::Failed => panic!("expected success"),
        }
    }
}
