//! Statically linked provider registry.
//!
//! Stands in for loading provider implementations by name at runtime:
//! applications register constructors under a name and the `external`
//! provider type picks one by its `class` option. Only entries registered
//! through this registry can be resolved.

use std::collections::HashMap;
use std::sync::Arc;

use packhost_protocol::Options;

use crate::error::BoxError;
use crate::provider::HostingProvider;

type WithOptionsFn =
    dyn Fn(&Options) -> Result<Box<dyn HostingProvider>, BoxError> + Send + Sync;
type NoArgsFn = dyn Fn() -> Result<Box<dyn HostingProvider>, BoxError> + Send + Sync;

/// Constructors known for a hosting provider entry.
#[derive(Clone, Default)]
pub(crate) struct Constructors {
    pub with_options: Option<Arc<WithOptionsFn>>,
    pub no_args: Option<Arc<NoArgsFn>>,
}

#[derive(Clone)]
pub(crate) enum Entry {
    Provider(Constructors),
    /// A component registered for some other capability.
    Other { capability: String },
}

/// Name-to-constructor map for `external` providers.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    entries: HashMap<String, Entry>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a constructor that receives the whole `upload.options` bag.
    ///
    /// Takes precedence over a no-argument constructor under the same name.
    pub fn register_with_options<F>(&mut self, name: impl Into<String>, ctor: F) -> &mut Self
    where
        F: Fn(&Options) -> Result<Box<dyn HostingProvider>, BoxError> + Send + Sync + 'static,
    {
        self.constructors(name.into()).with_options = Some(Arc::new(ctor));
        self
    }

    /// Registers a constructor that ignores the options bag.
    pub fn register_no_args<F>(&mut self, name: impl Into<String>, ctor: F) -> &mut Self
    where
        F: Fn() -> Result<Box<dyn HostingProvider>, BoxError> + Send + Sync + 'static,
    {
        self.constructors(name.into()).no_args = Some(Arc::new(ctor));
        self
    }

    /// Declares a hosting provider name without any constructor.
    pub fn declare(&mut self, name: impl Into<String>) -> &mut Self {
        self.constructors(name.into());
        self
    }

    /// Registers a component that provides `capability` rather than hosting.
    pub fn register_other(
        &mut self,
        name: impl Into<String>,
        capability: impl Into<String>,
    ) -> &mut Self {
        self.entries.insert(
            name.into(),
            Entry::Other {
                capability: capability.into(),
            },
        );
        self
    }

    pub(crate) fn lookup(&self, name: &str) -> Option<&Entry> {
        self.entries.get(name)
    }

    fn constructors(&mut self, name: String) -> &mut Constructors {
        let entry = self
            .entries
            .entry(name)
            .or_insert_with(|| Entry::Provider(Constructors::default()));
        if let Entry::Other { .. } = entry {
            *entry = Entry::Provider(Constructors::default());
        }
        match entry {
            Entry::Provider(ctors) => ctors,
            Entry::Other { .. } => unreachable!("entry was replaced above"),
        }
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.entries.keys().collect();
        names.sort();
        f.debug_struct("ProviderRegistry")
            .field("entries", &names)
            .finish()
    }
}
