//! Pack hosting backends.
//!
//! A [`HostingProvider`] uploads a generated resource pack somewhere clients
//! can download it from and reports the resulting URL. Providers are built
//! once from a [`ProviderSpec`](packhost_protocol::ProviderSpec) by the
//! [`ProviderResolver`]:
//!
//! - `polymath`: multipart upload to a polymath-compatible server
//! - `self-host`: copy into a directory served under a public base URL
//! - `cmd` / `sh`: run an external command that prints the URL
//! - `external`: constructor looked up by name in a [`ProviderRegistry`]

pub mod command;
pub mod error;
pub mod polymath;
pub mod provider;
pub mod registry;
pub mod resolver;
pub mod self_host;

pub use command::CommandProvider;
pub use error::{BoxError, ResolveError, ResolveErrorKind, UploadError};
pub use polymath::{PolymathOptions, PolymathProvider};
pub use provider::{HostingProvider, UploadFuture};
pub use registry::ProviderRegistry;
pub use resolver::ProviderResolver;
pub use self_host::{SelfHostOptions, SelfHostProvider};
