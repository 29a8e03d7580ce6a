//! Polymath hosting: multipart upload to a pack hosting server.
//!
//! The server answers `POST /upload` with either
//! `{"url": "...", "sha1": "..."}` or `{"error": "..."}`.

use std::path::Path;
use std::sync::RwLock;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::error::UploadError;
use crate::provider::{HostedPack, HostingProvider, UploadFuture};

/// Server used when `upload.options.server` is not set.
pub const DEFAULT_SERVER: &str = "atlas.oraxen.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Options for the `polymath` provider.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PolymathOptions {
    #[serde(default = "default_server")]
    pub server: String,
    /// Identifier sent with each upload. A random one is used when unset.
    #[serde(default)]
    pub id: Option<String>,
}

fn default_server() -> String {
    DEFAULT_SERVER.to_string()
}

impl Default for PolymathOptions {
    fn default() -> Self {
        Self {
            server: default_server(),
            id: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    sha1: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

pub struct PolymathProvider {
    client: reqwest::Client,
    endpoint: String,
    id: String,
    hosted: RwLock<Option<HostedPack>>,
}

impl PolymathProvider {
    pub fn new(options: PolymathOptions) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        let id = options
            .id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        Ok(Self {
            client,
            endpoint: upload_endpoint(&options.server),
            id,
            hosted: RwLock::new(None),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Builds `<base>/upload`, defaulting to plain HTTP when no scheme is given.
fn upload_endpoint(server: &str) -> String {
    let server = server.trim().trim_end_matches('/');
    if server.starts_with("http://") || server.starts_with("https://") {
        format!("{server}/upload")
    } else {
        format!("http://{server}/upload")
    }
}

impl HostingProvider for PolymathProvider {
    fn name(&self) -> &str {
        "polymath"
    }

    fn upload_pack<'a>(&'a self, pack: &'a Path) -> UploadFuture<'a> {
        Box::pin(async move {
            let data = tokio::fs::read(pack).await?;
            let file_name = pack
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "pack.zip".into());

            let part = reqwest::multipart::Part::bytes(data)
                .file_name(file_name)
                .mime_str("application/zip")?;
            let form = reqwest::multipart::Form::new()
                .text("id", self.id.clone())
                .part("pack", part);

            let resp = self
                .client
                .post(&self.endpoint)
                .multipart(form)
                .send()
                .await?
                .error_for_status()?;
            let body: UploadResponse = resp.json().await?;

            if let Some(error) = body.error {
                return Err(UploadError::Rejected(error));
            }
            let url = body
                .url
                .filter(|url| !url.is_empty())
                .ok_or(UploadError::MissingUrl)?;

            debug!(endpoint = %self.endpoint, url = %url, "polymath upload accepted");
            *self.hosted.write().unwrap_or_else(|e| e.into_inner()) = Some(HostedPack {
                url,
                hash: body.sha1,
            });
            Ok(())
        })
    }

    fn pack_url(&self) -> Option<String> {
        let hosted = self.hosted.read().unwrap_or_else(|e| e.into_inner());
        hosted.as_ref().map(|h| h.url.clone())
    }

    fn pack_hash(&self) -> Option<String> {
        let hosted = self.hosted.read().unwrap_or_else(|e| e.into_inner());
        hosted.as_ref().and_then(|h| h.hash.clone())
    }
}
