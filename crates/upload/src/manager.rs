//! Upload orchestration.

use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, OnceLock};

use futures_util::FutureExt;
use packhost_hosting::{HostingProvider, ProviderResolver};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::error::ManagerError;
use crate::host::{Listener, PluginHost};
use crate::receiver::PackReceiver;
use crate::sender::{PackSender, select_sender};
use crate::types::{UploadEvent, UploadJob, UploadOutcome};

/// Events buffered for the consumer of [`UploadManager::take_events`].
/// Events past this are dropped while nobody drains the stream.
pub const EVENT_BUFFER: usize = 256;

/// Drives uploads of the built pack and wires up delivery listeners.
///
/// The provider is resolved once at construction. Uploads run on the tokio
/// runtime that was current when the manager was built, so callers on any
/// thread can schedule them without blocking.
pub struct UploadManager {
    inner: Arc<Inner>,
    runtime: Handle,
    events: Mutex<Option<mpsc::Receiver<UploadEvent>>>,
}

struct Inner {
    settings: Settings,
    provider: Arc<dyn HostingProvider>,
    host: Arc<dyn PluginHost>,
    receiver: OnceLock<Arc<PackReceiver>>,
    sender: OnceLock<Arc<dyn PackSender>>,
    events_tx: mpsc::Sender<UploadEvent>,
}

impl UploadManager {
    /// Resolves the configured provider and builds a manager around it.
    ///
    /// Resolution happens even when uploads are disabled, so configuration
    /// mistakes surface at startup.
    pub fn new(
        settings: Settings,
        resolver: &ProviderResolver,
        host: Arc<dyn PluginHost>,
    ) -> Result<Self, ManagerError> {
        let provider = resolver.resolve(&settings.provider_spec())?;
        Self::with_provider(settings, Arc::from(provider), host)
    }

    /// Builds a manager around an already constructed provider.
    pub fn with_provider(
        settings: Settings,
        provider: Arc<dyn HostingProvider>,
        host: Arc<dyn PluginHost>,
    ) -> Result<Self, ManagerError> {
        let runtime = Handle::try_current().map_err(|_| ManagerError::NoRuntime)?;
        let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
        Ok(Self {
            inner: Arc::new(Inner {
                settings,
                provider,
                host,
                receiver: OnceLock::new(),
                sender: OnceLock::new(),
                events_tx,
            }),
            runtime,
            events: Mutex::new(Some(events_rx)),
        })
    }

    /// Takes the event stream. Returns `None` after the first call.
    pub fn take_events(&self) -> Option<mpsc::Receiver<UploadEvent>> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).take()
    }

    pub fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub fn provider(&self) -> &Arc<dyn HostingProvider> {
        &self.inner.provider
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.settings.upload.enabled
    }

    /// The pack sender, once a successful upload has created it.
    pub fn sender(&self) -> Option<Arc<dyn PackSender>> {
        self.inner.sender.get().cloned()
    }

    /// The status receiver, once the first upload request has created it.
    pub fn receiver(&self) -> Option<Arc<PackReceiver>> {
        self.inner.receiver.get().cloned()
    }

    /// Schedules an upload without touching connected clients.
    pub fn upload(&self, artifact: impl Into<PathBuf>) {
        self.upload_and_notify(artifact, false);
    }

    /// Schedules an upload of `artifact` and returns immediately.
    ///
    /// Does nothing when uploads are disabled. The outcome is only reported
    /// through notifications and the event stream.
    pub fn upload_and_notify(
        &self,
        artifact: impl Into<PathBuf>,
        update_connected_clients: bool,
    ) {
        if !self.is_enabled() {
            return;
        }

        if self.inner.settings.receive.enabled {
            self.inner.ensure_receiver();
        }

        let job = UploadJob::start(artifact.into());
        self.inner.notify(UploadEvent::Uploading);

        let inner = Arc::clone(&self.inner);
        self.runtime.spawn(inner.run(job, update_connected_clients));
    }
}

impl Inner {
    async fn run(self: Arc<Self>, job: UploadJob, update_connected_clients: bool) -> UploadOutcome {
        let provider = Arc::clone(&self.provider);
        let artifact = job.artifact.clone();
        let attempt = AssertUnwindSafe(async move { provider.upload_pack(&artifact).await })
            .catch_unwind()
            .await;

        let url = match attempt {
            Ok(Ok(())) => {
                let url = self.provider.pack_url();
                if url.is_none() {
                    debug!(provider = self.provider.name(), "upload finished without a URL");
                }
                url
            }
            Ok(Err(e)) => {
                debug!(provider = self.provider.name(), error = %e, "upload failed");
                None
            }
            Err(_) => {
                debug!(provider = self.provider.name(), "provider panicked during upload");
                None
            }
        };

        let Some(url) = url else {
            self.notify(UploadEvent::NotUploaded);
            return UploadOutcome::Failed;
        };

        let outcome = job.succeeded(url.clone());
        let delay_ms = match &outcome {
            UploadOutcome::Succeeded { elapsed, .. } => {
                u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
            }
            UploadOutcome::Failed => 0,
        };
        self.notify(UploadEvent::Uploaded { url, delay_ms });

        if self.settings.send.wants_sender() {
            self.ensure_sender();
            if update_connected_clients {
                debug!("re-sending the pack to connected clients is disabled");
            }
        }
        outcome
    }

    fn ensure_receiver(&self) -> &Arc<PackReceiver> {
        self.receiver.get_or_init(|| {
            let receiver = Arc::new(PackReceiver::new());
            self.host
                .register_listener(Listener::Receiver(Arc::clone(&receiver)));
            receiver
        })
    }

    fn ensure_sender(&self) -> &Arc<dyn PackSender> {
        self.sender.get_or_init(|| {
            let sender = select_sender(
                &self.settings,
                self.host.as_ref(),
                Arc::clone(&self.provider),
            );
            self.host.register_listener(Listener::Sender(Arc::clone(&sender)));
            sender
        })
    }

    fn notify(&self, event: UploadEvent) {
        let text = event.render(&self.settings.messages);
        match event {
            UploadEvent::NotUploaded => warn!("{text}"),
            _ => info!("{text}"),
        }
        match self.events_tx.try_send(event) {
            Ok(()) | Err(TrySendError::Closed(_)) => {}
            Err(TrySendError::Full(event)) => {
                debug!(event = ?event, "event stream full, dropping event");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use packhost_hosting::{ProviderRegistry, ResolveErrorKind, UploadError, UploadFuture};
    use packhost_protocol::{ProviderSpec, ProviderType};
    use serde_json::json;

    use crate::host::{ADVANCED_DELIVERY_INTEGRATION, StandaloneHost};
    use crate::sender::SenderVariant;

    #[derive(Clone, Copy)]
    enum Behavior {
        Succeed,
        Fail,
        Panic,
        NoUrl,
    }

    struct FakeProvider {
        behavior: Behavior,
        calls: AtomicUsize,
        url: Mutex<Option<String>>,
    }

    impl FakeProvider {
        fn new(behavior: Behavior) -> Arc<Self> {
            Arc::new(Self {
                behavior,
                calls: AtomicUsize::new(0),
                url: Mutex::new(None),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl HostingProvider for FakeProvider {
        fn name(&self) -> &str {
            "fake"
        }

        fn upload_pack<'a>(&'a self, pack: &'a Path) -> UploadFuture<'a> {
            Box::pin(async move {
                let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
                match self.behavior {
                    Behavior::Succeed => {
                        let name = pack.file_name().unwrap().to_string_lossy();
                        *self.url.lock().unwrap() = Some(format!("http://packs/{n}/{name}"));
                        Ok(())
                    }
                    Behavior::Fail => Err(UploadError::Rejected("quota exceeded".into())),
                    Behavior::Panic => panic!("provider bug"),
                    Behavior::NoUrl => Ok(()),
                }
            })
        }

        fn pack_url(&self) -> Option<String> {
            self.url.lock().unwrap().clone()
        }
    }

    fn enabled() -> Settings {
        let mut settings = Settings::default();
        settings.upload.enabled = true;
        settings
    }

    /// Waits for the next "uploaded" or "not uploaded" event.
    async fn next_outcome(events: &mut mpsc::Receiver<UploadEvent>) -> UploadEvent {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                match events.recv().await {
                    Some(UploadEvent::Uploading) => continue,
                    Some(event) => return event,
                    None => panic!("event stream closed"),
                }
            }
        })
        .await
        .expect("no upload outcome within 5s")
    }

    #[tokio::test]
    async fn disabled_does_nothing() {
        let mut settings = enabled();
        settings.upload.enabled = false;
        settings.receive.enabled = true;
        let provider = FakeProvider::new(Behavior::Succeed);
        let host = Arc::new(StandaloneHost::new());
        let manager =
            UploadManager::with_provider(settings, provider.clone(), host.clone()).unwrap();
        let mut events = manager.take_events().unwrap();

        manager.upload("/tmp/pack.zip");
        tokio::task::yield_now().await;

        assert_eq!(provider.calls(), 0);
        assert!(events.try_recv().is_err());
        assert!(host.listeners().is_empty());
        assert!(manager.receiver().is_none());
    }

    #[tokio::test]
    async fn success_notifies_and_registers_sender() {
        let provider = FakeProvider::new(Behavior::Succeed);
        let host = Arc::new(StandaloneHost::new());
        let manager =
            UploadManager::with_provider(enabled(), provider.clone(), host.clone()).unwrap();
        let mut events = manager.take_events().unwrap();

        manager.upload("/tmp/pack.zip");
        // "uploading" is emitted before the worker runs.
        assert_eq!(events.try_recv().unwrap(), UploadEvent::Uploading);
        assert_eq!(provider.calls(), 0);

        match next_outcome(&mut events).await {
            UploadEvent::Uploaded { url, .. } => assert_eq!(url, "http://packs/1/pack.zip"),
            other => panic!("unexpected event: {other:?}"),
        }
        assert_eq!(host.sender_count(), 1);
        assert_eq!(manager.sender().unwrap().variant(), SenderVariant::Basic);
        assert_eq!(
            manager.sender().unwrap().offer().unwrap().url,
            "http://packs/1/pack.zip"
        );
    }

    #[tokio::test]
    async fn failure_notifies_once_and_skips_sender() {
        let provider = FakeProvider::new(Behavior::Fail);
        let host = Arc::new(StandaloneHost::new());
        let manager =
            UploadManager::with_provider(enabled(), provider.clone(), host.clone()).unwrap();
        let mut events = manager.take_events().unwrap();

        manager.upload("/tmp/pack.zip");

        assert_eq!(next_outcome(&mut events).await, UploadEvent::NotUploaded);
        assert!(events.try_recv().is_err());
        assert_eq!(provider.calls(), 1);
        assert_eq!(host.sender_count(), 0);
        assert!(manager.sender().is_none());
    }

    #[tokio::test]
    async fn success_without_url_is_a_failure() {
        let host = Arc::new(StandaloneHost::new());
        let manager =
            UploadManager::with_provider(enabled(), FakeProvider::new(Behavior::NoUrl), host.clone())
                .unwrap();
        let mut events = manager.take_events().unwrap();

        manager.upload("/tmp/pack.zip");

        assert_eq!(next_outcome(&mut events).await, UploadEvent::NotUploaded);
        assert_eq!(host.sender_count(), 0);
    }

    #[tokio::test]
    async fn provider_panic_becomes_failure() {
        let host = Arc::new(StandaloneHost::new());
        let manager =
            UploadManager::with_provider(enabled(), FakeProvider::new(Behavior::Panic), host)
                .unwrap();
        let mut events = manager.take_events().unwrap();

        manager.upload("/tmp/pack.zip");

        assert_eq!(next_outcome(&mut events).await, UploadEvent::NotUploaded);
    }

    #[tokio::test]
    async fn receiver_registered_once_even_on_failure() {
        let mut settings = enabled();
        settings.receive.enabled = true;
        let host = Arc::new(StandaloneHost::new());
        let manager =
            UploadManager::with_provider(settings, FakeProvider::new(Behavior::Fail), host.clone())
                .unwrap();
        let mut events = manager.take_events().unwrap();

        for _ in 0..3 {
            manager.upload("/tmp/pack.zip");
            // Registered before the upload is scheduled.
            assert_eq!(host.receiver_count(), 1);
            assert_eq!(next_outcome(&mut events).await, UploadEvent::NotUploaded);
        }

        assert_eq!(host.receiver_count(), 1);
        assert!(manager.receiver().is_some());
    }

    #[tokio::test]
    async fn no_sender_when_delivery_disabled() {
        let mut settings = enabled();
        settings.send.pack = false;
        settings.send.join_message = false;
        let host = Arc::new(StandaloneHost::new());
        let manager =
            UploadManager::with_provider(settings, FakeProvider::new(Behavior::Succeed), host.clone())
                .unwrap();
        let mut events = manager.take_events().unwrap();

        manager.upload_and_notify("/tmp/pack.zip", true);

        assert!(matches!(
            next_outcome(&mut events).await,
            UploadEvent::Uploaded { .. }
        ));
        assert_eq!(host.sender_count(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_uploads_register_one_sender() {
        let mut settings = enabled();
        settings.send.advanced = true;
        let provider = FakeProvider::new(Behavior::Succeed);
        let host = Arc::new(StandaloneHost::new().with_integration(ADVANCED_DELIVERY_INTEGRATION));
        let manager =
            UploadManager::with_provider(settings, provider.clone(), host.clone()).unwrap();
        let mut events = manager.take_events().unwrap();

        for i in 0..8 {
            manager.upload(format!("/tmp/pack-{i}.zip"));
        }
        for _ in 0..8 {
            assert!(matches!(
                next_outcome(&mut events).await,
                UploadEvent::Uploaded { .. }
            ));
        }
        assert_eq!(provider.calls(), 8);

        // The sender is registered right after the "uploaded" event.
        tokio::time::timeout(Duration::from_secs(5), async {
            while manager.sender().is_none() {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .unwrap();
        assert_eq!(host.sender_count(), 1);
        assert_eq!(manager.sender().unwrap().variant(), SenderVariant::Advanced);
    }

    #[tokio::test]
    async fn events_are_bounded_without_a_consumer() {
        let manager = UploadManager::with_provider(
            enabled(),
            FakeProvider::new(Behavior::Fail),
            Arc::new(StandaloneHost::new()),
        )
        .unwrap();

        // Workers cannot run until this task yields, so every upload has
        // produced its "uploading" event by now.
        for _ in 0..(EVENT_BUFFER * 4) {
            manager.upload("/tmp/pack.zip");
        }

        let mut events = manager.take_events().unwrap();
        let mut buffered = 0;
        while events.try_recv().is_ok() {
            buffered += 1;
        }
        assert_eq!(buffered, EVENT_BUFFER);
    }

    #[tokio::test]
    async fn resolution_error_surfaces_from_new() {
        let mut settings = enabled();
        settings.upload.provider_type = ProviderType::External;
        let err = UploadManager::new(
            settings,
            &ProviderResolver::default(),
            Arc::new(StandaloneHost::new()),
        )
        .err()
        .unwrap();

        match err {
            ManagerError::Resolve(e) => assert_eq!(e.kind(), ResolveErrorKind::MissingTarget),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn external_provider_end_to_end() {
        let mut registry = ProviderRegistry::new();
        registry.register_with_options("com.example.FakeHost", |_options| {
            Ok(Box::new(FakeProvider {
                behavior: Behavior::Succeed,
                calls: AtomicUsize::new(0),
                url: Mutex::new(None),
            }) as Box<dyn HostingProvider>)
        });
        let resolver = ProviderResolver::new(registry);

        let mut settings = enabled();
        let spec = ProviderSpec::new(
            ProviderType::External,
            json!({ "class": "com.example.FakeHost" })
                .as_object()
                .cloned()
                .unwrap(),
        );
        settings.upload.provider_type = spec.provider_type;
        settings.upload.options = spec.options;

        let host = Arc::new(StandaloneHost::new());
        let manager = UploadManager::new(settings, &resolver, host.clone()).unwrap();
        assert_eq!(manager.provider().name(), "fake");
        let mut events = manager.take_events().unwrap();

        manager.upload("/tmp/pack.zip");

        assert!(matches!(
            next_outcome(&mut events).await,
            UploadEvent::Uploaded { .. }
        ));
        assert_eq!(host.sender_count(), 1);
    }

    #[test]
    fn requires_a_runtime() {
        let err = UploadManager::with_provider(
            enabled(),
            FakeProvider::new(Behavior::Succeed),
            Arc::new(StandaloneHost::new()),
        )
        .err()
        .unwrap();
        assert!(matches!(err, ManagerError::NoRuntime));
    }
}
