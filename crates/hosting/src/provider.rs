//! The hosting provider contract.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use crate::error::UploadError;

/// Future returned by [`HostingProvider::upload_pack`].
pub type UploadFuture<'a> = Pin<Box<dyn Future<Output = Result<(), UploadError>> + Send + 'a>>;

/// A backend that hosts the generated resource pack.
///
/// A provider is resolved once and then shared by every upload attempt of
/// its manager, possibly concurrently. Implementations keep their own
/// mutable state behind interior locks.
pub trait HostingProvider: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Uploads the pack at `pack`.
    fn upload_pack<'a>(&'a self, pack: &'a Path) -> UploadFuture<'a>;

    /// Public URL of the last successful upload, `None` before that.
    fn pack_url(&self) -> Option<String>;

    /// Hex digest of the last uploaded pack, when the backend reports one.
    fn pack_hash(&self) -> Option<String> {
        None
    }
}

/// Last successful upload, shared by the built-in providers.
#[derive(Debug, Clone, Default)]
pub(crate) struct HostedPack {
    pub url: String,
    pub hash: Option<String>,
}
