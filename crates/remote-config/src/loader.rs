//! merge remote configuration over local configuration
use crate::config::Config;
use crate::config_text::ConfigTextError;
use crate::provider::{Mode, ProviderError, RemoteConfigProvider, SETTINGS_NAMESPACE};
use crate::registry::{ProviderRegistry, RegistryError};

/// Resolves the effective configuration of an application
#[derive(derive_new::new, Debug)]
pub struct RemoteConfigLoader {
    registry: ProviderRegistry,
    mode: Mode,
}

impl RemoteConfigLoader {
    /// Loader with the built-in providers
    pub fn builtin(mode: Mode) -> Self {
        Self::new(ProviderRegistry::builtin(), mode)
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// The provider named by `remote-configuration.provider`
    ///
    /// `None` when the setting is absent or empty.
    pub fn configured_provider(
        &self,
        local: &Config,
    ) -> Result<Option<&dyn RemoteConfigProvider>, ResolveError> {
        let short_name = local
            .get_optional_string(&format!("{SETTINGS_NAMESPACE}.provider"))
            .map_err(|err| ResolveError::Setting(err.to_string()))?
            .unwrap_or_default();

        if short_name.trim().is_empty() {
            return Ok(None);
        }

        Ok(Some(self.registry.select(&short_name)?))
    }

    /// Retrieve only the remote part
    ///
    /// Returns `None` without any network activity when no provider is configured.
    pub fn fetch(&self, local: &Config) -> Result<Option<Config>, ResolveError> {
        let Some(provider) = self.configured_provider(local)? else {
            tracing::debug!("no remote configuration provider configured");
            return Ok(None);
        };

        tracing::info!(provider = provider.display_name(), "Retrieving configuration");

        let settings = local.with_fallback(&Config::reference()?);
        let remote = provider.fetch(self.mode, &settings).map_err(|source| {
            tracing::error!(
                provider = provider.display_name(),
                error = %source,
                "Can't retrieve remote configuration"
            );
            ResolveError::Provider {
                provider: provider.display_name(),
                source,
            }
        })?;

        tracing::debug!(remote = %remote, "Remote configuration");
        Ok(Some(remote.into()))
    }

    /// Effective configuration: remote values win, local values fill the gaps
    ///
    /// `local` is returned unchanged when no provider is configured.
    pub fn resolve(&self, local: &Config) -> Result<Config, ResolveError> {
        match self.fetch(local)? {
            Some(remote) => Ok(remote.with_fallback(local)),
            None => Ok(local.clone()),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ResolveError {
    #[error(transparent)]
    UnknownProvider(#[from] RegistryError),
    #[error("Bad configuration: {0}")]
    Setting(String),
    #[error("Built-in reference configuration is invalid")]
    Reference(#[from] ConfigTextError),
    #[error("Can't retrieve remote configuration from {provider}")]
    Provider {
        provider: &'static str,
        #[source]
        source: ProviderError,
    },
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config_text::ConfigText;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Serves a fixed document and counts calls
    struct Fixed {
        text: &'static str,
        calls: Rc<Cell<usize>>,
    }

    impl RemoteConfigProvider for Fixed {
        fn short_name(&self) -> &'static str {
            "FIXED"
        }

        fn display_name(&self) -> &'static str {
            "Fixed document"
        }

        fn fetch(&self, mode: Mode, _settings: &Config) -> Result<ConfigText, ProviderError> {
            assert_eq!(mode, Mode::Test);
            self.calls.set(self.calls.get() + 1);
            Ok(ConfigText::parse(self.text)?)
        }
    }

    fn loader(text: &'static str) -> (RemoteConfigLoader, Rc<Cell<usize>>) {
        let calls = Rc::new(Cell::new(0));
        let mut registry = ProviderRegistry::default();
        registry
            .register(Box::new(Fixed {
                text,
                calls: calls.clone(),
            }))
            .unwrap();
        (RemoteConfigLoader::new(registry, Mode::Test), calls)
    }

    fn config(text: &str) -> Config {
        Config::parse(text).unwrap()
    }

    #[test]
    fn without_provider_local_is_returned() {
        let (loader, calls) = loader("a = 1");

        for local in [config("a = 0"), config("remote-configuration.provider = \"\"")] {
            assert_eq!(loader.resolve(&local).unwrap(), local);
        }
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn remote_wins_and_local_fills_gaps() {
        let (loader, calls) =
            loader("db.default.driver = Y\ndb.default.excludedIds = [1,2,3]");
        let local = config(
            "remote-configuration.provider = fixed\n\
             db.default.driver = X\n\
             db.default.timeout = 5000",
        );

        let effective = loader.resolve(&local).unwrap();

        assert_eq!(effective.get_string("db.default.driver").unwrap(), "Y");
        assert_eq!(effective.get_int("db.default.timeout").unwrap(), 5000);
        assert_eq!(effective.get_int_list("db.default.excludedIds").unwrap(), vec![1, 2, 3]);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn unknown_provider_is_fatal() {
        let (loader, calls) = loader("a = 1");
        let local = config("remote-configuration.provider = zookeeper");

        let err = loader.resolve(&local).unwrap_err();

        assert!(matches!(
            err,
            ResolveError::UnknownProvider(RegistryError::NotFound(ref name)) if name == "zookeeper"
        ));
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn provider_errors_name_the_provider() {
        let (loader, _) = loader("not valid");
        let local = config("remote-configuration.provider = FIXED");

        let err = loader.resolve(&local).unwrap_err();

        assert_eq!(
            err.to_string(),
            "Can't retrieve remote configuration from Fixed document"
        );
        assert!(matches!(
            err,
            ResolveError::Provider {
                source: ProviderError::ConfigText(_),
                ..
            }
        ));
    }
}
