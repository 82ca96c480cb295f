//! provider lookup by short name
use crate::provider::{ConsulProvider, EtcdProvider, HttpProvider, RemoteConfigProvider};

/// Constructor of a provider, used to build a [ProviderRegistry]
pub type ProviderConstructor = fn() -> Box<dyn RemoteConfigProvider>;

/// Providers shipped with this crate
pub const BUILTIN_PROVIDERS: &[ProviderConstructor] = &[
    || Box::new(ConsulProvider::new()),
    || Box::new(EtcdProvider::new()),
    || Box::new(HttpProvider::new()),
];

#[derive(Debug, Default)]
pub struct ProviderRegistry {
    providers: Vec<Box<dyn RemoteConfigProvider>>,
}

impl ProviderRegistry {
    /// Registry with all [BUILTIN_PROVIDERS]
    pub fn builtin() -> Self {
        Self::from_constructors(BUILTIN_PROVIDERS)
    }

    /// Build a registry from a list of constructors
    ///
    /// Providers whose short name is already taken are skipped with a warning.
    pub fn from_constructors(constructors: &[ProviderConstructor]) -> Self {
        let mut registry = Self::default();
        for constructor in constructors {
            if let Err(err) = registry.register(constructor()) {
                tracing::warn!(%err, "provider ignored");
            }
        }
        registry
    }

    pub fn register(&mut self, provider: Box<dyn RemoteConfigProvider>) -> Result<(), RegistryError> {
        if self.find(provider.short_name()).is_some() {
            return Err(RegistryError::Duplicate(provider.short_name().to_string()));
        }

        tracing::trace!(short_name = provider.short_name(), "provider registered");
        self.providers.push(provider);
        Ok(())
    }

    /// Case-insensitive lookup, first match wins
    pub fn find(&self, short_name: &str) -> Option<&dyn RemoteConfigProvider> {
        let short_name = short_name.trim();
        self.providers
            .iter()
            .find(|provider| provider.short_name().eq_ignore_ascii_case(short_name))
            .map(|provider| provider.as_ref())
    }

    pub fn select(&self, short_name: &str) -> Result<&dyn RemoteConfigProvider, RegistryError> {
        self.find(short_name)
            .ok_or_else(|| RegistryError::NotFound(short_name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn RemoteConfigProvider> {
        self.providers.iter().map(|provider| provider.as_ref())
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum RegistryError {
    #[error("Can't resolve the remote configuration provider '{0}'")]
    NotFound(String),
    #[error("A provider named '{0}' is already registered")]
    Duplicate(String),
}
