//! Self hosting: publish the pack into a directory that an existing web
//! server exposes under `public_url`.

use std::path::{Path, PathBuf};
use std::sync::RwLock;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::provider::{HostedPack, HostingProvider, UploadFuture};

/// Characters escaped in the published file name: everything but unreserved.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Options for the `self-host` provider.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SelfHostOptions {
    /// Directory the pack is copied into.
    pub directory: PathBuf,
    /// Base URL under which `directory` is served.
    pub public_url: String,
    /// Published file name. Defaults to the artifact's own name.
    #[serde(default)]
    pub file_name: Option<String>,
}

pub struct SelfHostProvider {
    options: SelfHostOptions,
    hosted: RwLock<Option<HostedPack>>,
}

impl SelfHostProvider {
    pub fn new(options: SelfHostOptions) -> Self {
        Self {
            options,
            hosted: RwLock::new(None),
        }
    }

    fn published_name(&self, pack: &Path) -> String {
        self.options
            .file_name
            .clone()
            .filter(|name| !name.is_empty())
            .or_else(|| pack.file_name().map(|n| n.to_string_lossy().into_owned()))
            .unwrap_or_else(|| "pack.zip".into())
    }
}

impl HostingProvider for SelfHostProvider {
    fn name(&self) -> &str {
        "self-host"
    }

    fn upload_pack<'a>(&'a self, pack: &'a Path) -> UploadFuture<'a> {
        Box::pin(async move {
            let data = tokio::fs::read(pack).await?;
            let hash = hex::encode(Sha256::digest(&data));

            let name = self.published_name(pack);
            tokio::fs::create_dir_all(&self.options.directory).await?;
            let target = self.options.directory.join(&name);
            tokio::fs::write(&target, &data).await?;

            let url = format!(
                "{}/{}",
                self.options.public_url.trim_end_matches('/'),
                utf8_percent_encode(&name, PATH_SEGMENT)
            );
            debug!(target = %target.display(), url = %url, "pack published");

            *self.hosted.write().unwrap_or_else(|e| e.into_inner()) = Some(HostedPack {
                url,
                hash: Some(hash),
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
