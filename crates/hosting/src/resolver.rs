//! Resolves a [`ProviderSpec`] into a concrete hosting provider.
//!
//! Resolution runs once, when the upload manager is built, so a bad
//! configuration is reported at startup rather than on the first upload.

use packhost_protocol::{DEFAULT_PLACEHOLDER, Options, ProviderSpec, ProviderType};
use serde::de::DeserializeOwned;
use tracing::info;

use crate::command::CommandProvider;
use crate::error::{ResolveError, ResolveErrorKind};
use crate::polymath::{PolymathOptions, PolymathProvider};
use crate::provider::HostingProvider;
use crate::registry::{Entry, ProviderRegistry};
use crate::self_host::{SelfHostOptions, SelfHostProvider};

pub const KEY_TYPE: &str = "upload.type";
pub const KEY_OPTIONS: &str = "upload.options";
pub const KEY_ARGS: &str = "upload.options.args";
pub const KEY_CLASS: &str = "upload.options.class";

/// Builds hosting providers from configuration.
#[derive(Debug, Clone, Default)]
pub struct ProviderResolver {
    registry: ProviderRegistry,
}

impl ProviderResolver {
    /// Creates a resolver whose `external` lookups go through `registry`.
    pub fn new(registry: ProviderRegistry) -> Self {
        Self { registry }
    }

    /// Builds the provider described by `spec`.
    pub fn resolve(&self, spec: &ProviderSpec) -> Result<Box<dyn HostingProvider>, ResolveError> {
        let provider: Box<dyn HostingProvider> = match &spec.provider_type {
            ProviderType::Polymath => {
                let options: PolymathOptions = parse_options(&spec.options)?;
                let provider = PolymathProvider::new(options).map_err(|e| {
                    ResolveError::new(
                        ResolveErrorKind::InstantiationFailed,
                        KEY_OPTIONS,
                        "cannot build HTTP client",
                    )
                    .with_source(e)
                })?;
                Box::new(provider)
            }
            ProviderType::SelfHost => {
                let options: SelfHostOptions = parse_options(&spec.options)?;
                Box::new(SelfHostProvider::new(options))
            }
            ProviderType::Command => Box::new(resolve_command(spec)?),
            ProviderType::External => self.resolve_external(spec)?,
            ProviderType::Unknown(tag) => {
                return Err(ResolveError::new(
                    ResolveErrorKind::UnknownType,
                    KEY_TYPE,
                    format!("unknown provider type: {tag}"),
                ));
            }
        };

        info!(provider = provider.name(), "hosting provider resolved");
        Ok(provider)
    }

    fn resolve_external(
        &self,
        spec: &ProviderSpec,
    ) -> Result<Box<dyn HostingProvider>, ResolveError> {
        let name = spec
            .option_str("class")
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| {
                ResolveError::new(ResolveErrorKind::MissingTarget, KEY_CLASS, "no provider set")
            })?;

        let ctors = match self.registry.lookup(name) {
            None => {
                return Err(ResolveError::new(
                    ResolveErrorKind::ClassNotFound,
                    KEY_CLASS,
                    format!("provider not found: {name}"),
                ));
            }
            Some(Entry::Other { capability }) => {
                return Err(ResolveError::new(
                    ResolveErrorKind::NotAssignable,
                    KEY_CLASS,
                    format!("{name} provides {capability}, not a hosting provider"),
                ));
            }
            Some(Entry::Provider(ctors)) => ctors,
        };

        let built = if let Some(ctor) = &ctors.with_options {
            ctor(&spec.options)
        } else if let Some(ctor) = &ctors.no_args {
            ctor()
        } else {
            return Err(ResolveError::new(
                ResolveErrorKind::ConstructorNotFound,
                KEY_CLASS,
                format!("no constructor registered for {name}"),
            ));
        };

        built.map_err(|e| {
            ResolveError::new(
                ResolveErrorKind::InstantiationFailed,
                KEY_CLASS,
                format!("constructing {name} failed"),
            )
            .with_source(e)
        })
    }
}

fn resolve_command(spec: &ProviderSpec) -> Result<CommandProvider, ResolveError> {
    let args = spec.option_strings("args");
    if args.is_empty() {
        return Err(ResolveError::new(
            ResolveErrorKind::MissingCommand,
            KEY_ARGS,
            "no command line",
        ));
    }
    let placeholder = spec
        .option_str("placeholder")
        .filter(|p| !p.is_empty())
        .unwrap_or(DEFAULT_PLACEHOLDER);
    Ok(CommandProvider::new(args, placeholder))
}

fn parse_options<T: DeserializeOwned>(options: &Options) -> Result<T, ResolveError> {
    serde_json::from_value(serde_json::Value::Object(options.clone())).map_err(|e| {
        ResolveError::new(
            ResolveErrorKind::InstantiationFailed,
            KEY_OPTIONS,
            "invalid provider options",
        )
        .with_source(e)
    })
}
