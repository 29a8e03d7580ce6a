//! Pack senders: tell connected clients where the pack is hosted.
//!
//! Two variants exist. The basic sender offers the bare URL. The advanced
//! sender also carries a prompt and the mandatory flag, and needs the
//! [`ADVANCED_DELIVERY_INTEGRATION`] to be active on the host.

use std::sync::Arc;

use packhost_hosting::HostingProvider;
use packhost_protocol::{MessageKey, Messages};
use tracing::info;

use crate::config::{SendSettings, Settings};
use crate::host::{ADVANCED_DELIVERY_INTEGRATION, PluginHost};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenderVariant {
    Basic,
    Advanced,
}

/// What a client is sent when the pack is offered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackOffer {
    pub url: String,
    pub hash: Option<String>,
    pub prompt: Option<String>,
    pub mandatory: bool,
}

pub trait PackSender: Send + Sync {
    fn variant(&self) -> SenderVariant;

    /// The offer for the currently hosted pack.
    ///
    /// `None` when pack sending is disabled or nothing has been uploaded.
    fn offer(&self) -> Option<PackOffer>;

    /// Message for joining clients, when join messages are enabled.
    fn join_message(&self) -> Option<String>;
}

/// State shared by both sender variants.
struct Delivery {
    provider: Arc<dyn HostingProvider>,
    send: SendSettings,
    messages: Messages,
}

impl Delivery {
    fn base_offer(&self) -> Option<PackOffer> {
        if !self.send.pack {
            return None;
        }
        Some(PackOffer {
            url: self.provider.pack_url()?,
            hash: self.provider.pack_hash(),
            prompt: None,
            mandatory: false,
        })
    }

    fn join_message(&self) -> Option<String> {
        if !self.send.join_message {
            return None;
        }
        let url = self.provider.pack_url()?;
        Some(self.messages.render(MessageKey::JoinMessage, &[("url", url.as_str())]))
    }
}

pub struct BasicPackSender {
    delivery: Delivery,
}

impl BasicPackSender {
    pub fn new(provider: Arc<dyn HostingProvider>, settings: &Settings) -> Self {
        Self {
            delivery: Delivery {
                provider,
                send: settings.send.clone(),
                messages: settings.messages.clone(),
            },
        }
    }
}

impl PackSender for BasicPackSender {
    fn variant(&self) -> SenderVariant {
        SenderVariant::Basic
    }

    fn offer(&self) -> Option<PackOffer> {
        self.delivery.base_offer()
    }

    fn join_message(&self) -> Option<String> {
        self.delivery.join_message()
    }
}

pub struct AdvancedPackSender {
    delivery: Delivery,
}

impl AdvancedPackSender {
    pub fn new(provider: Arc<dyn HostingProvider>, settings: &Settings) -> Self {
        Self {
            delivery: Delivery {
                provider,
                send: settings.send.clone(),
                messages: settings.messages.clone(),
            },
        }
    }
}

impl PackSender for AdvancedPackSender {
    fn variant(&self) -> SenderVariant {
        SenderVariant::Advanced
    }

    fn offer(&self) -> Option<PackOffer> {
        let mut offer = self.delivery.base_offer()?;
        offer.prompt = self.delivery.send.prompt.as_ref().map(|prompt| {
            packhost_protocol::render_template(
                prompt,
                &[("prefix", self.delivery.messages.prefix())],
            )
        });
        offer.mandatory = self.delivery.send.mandatory;
        Some(offer)
    }

    fn join_message(&self) -> Option<String> {
        self.delivery.join_message()
    }
}

/// Picks the sender variant for this host and configuration.
///
/// The advanced sender is used only when the host integration is active and
/// `send.advanced` is set.
pub fn select_sender(
    settings: &Settings,
    host: &dyn PluginHost,
    provider: Arc<dyn HostingProvider>,
) -> Arc<dyn PackSender> {
    let integration = host.integration_active(ADVANCED_DELIVERY_INTEGRATION);
    let sender: Arc<dyn PackSender> = if integration && settings.send.advanced {
        Arc::new(AdvancedPackSender::new(provider, settings))
    } else {
        Arc::new(BasicPackSender::new(provider, settings))
    };
    info!(
        variant = ?sender.variant(),
        integration,
        requested_advanced = settings.send.advanced,
        "pack sender selected"
    );
    sender
}
