//! remote configuration providers
//!
//! A provider knows how to talk to one kind of backend. It reads its settings from the local configuration,
//! performs a single blocking request and normalizes the response into [ConfigText].
//!
//! Status handling differs per backend:
//! - KV stores ([consul], [etcd]) treat a non-2xx status as "nothing stored": a warning is logged and the result
//!   is empty, so local configuration stays authoritative.
//! - [http] points at one explicit document, a non-2xx status is an error.
//!
//! Everything else (bad settings, connection failures, undecodable bodies) is an error for every provider.
use crate::config::{Config, ConfigError};
use crate::config_text::{ConfigText, ConfigTextError};
use std::time::Duration;

pub mod consul;
pub mod etcd;
pub mod http;

pub use consul::ConsulProvider;
pub use etcd::EtcdProvider;
pub use http::HttpProvider;

/// Namespace of all settings read by providers
pub const SETTINGS_NAMESPACE: &str = "remote-configuration";

const CONNECT_TIMEOUT: Duration = Duration::from_millis(1500);

/// Mode the host application runs in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    Dev,
    Test,
    #[default]
    Prod,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Dev => f.write_str("dev"),
            Mode::Test => f.write_str("test"),
            Mode::Prod => f.write_str("prod"),
        }
    }
}

pub trait RemoteConfigProvider {
    /// Unique, case-insensitive name used to select this provider
    fn short_name(&self) -> &'static str;

    /// Human readable name for log and error messages
    fn display_name(&self) -> &'static str;

    /// Retrieve configuration from the backend
    ///
    /// `settings` is the local configuration (with reference defaults applied).
    fn fetch(&self, mode: Mode, settings: &Config) -> Result<ConfigText, ProviderError>;
}

impl std::fmt::Debug for dyn RemoteConfigProvider + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteConfigProvider")
            .field("short_name", &self.short_name())
            .field("display_name", &self.display_name())
            .finish()
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ProviderError {
    #[error("Bad configuration: {0}")]
    Configuration(String),
    #[error("Bad configuration")]
    Setting(#[from] ConfigError),
    #[error("Invalid URL `{url}`")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Request failed")]
    Transport(#[from] reqwest::Error),
    #[error("Server responded with status {0}")]
    Status(reqwest::StatusCode),
    #[error("Unable to parse response")]
    Json(#[from] serde_json::Error),
    #[error("Unable to decode value of `{key}`")]
    Base64 {
        key: String,
        #[source]
        source: base64::DecodeError,
    },
    #[error("Value of `{key}` is not valid UTF-8")]
    Utf8 {
        key: String,
        #[source]
        source: std::string::FromUtf8Error,
    },
    #[error("Unable to parse configuration document")]
    ConfigText(#[from] ConfigTextError),
}

/// Read `remote-configuration.<path>`
pub(crate) fn setting(settings: &Config, path: &str) -> Result<String, ConfigError> {
    settings.get_string(&format!("{SETTINGS_NAMESPACE}.{path}"))
}

/// Parse an endpoint setting, only http and https are accepted
///
/// Fails before any request is made.
pub(crate) fn http_url(name: &str, raw: &str) -> Result<url::Url, ProviderError> {
    let raw = raw.trim();
    if !raw.starts_with("http") {
        return Err(ProviderError::Configuration(format!(
            "{SETTINGS_NAMESPACE}.{name} must be an http(s) URL, got `{raw}`"
        )));
    }

    let url = url::Url::parse(raw).map_err(|source| ProviderError::InvalidUrl {
        url: raw.to_string(),
        source,
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(ProviderError::Configuration(format!(
            "{SETTINGS_NAMESPACE}.{name} has unsupported scheme `{scheme}`"
        ))),
    }
}

/// Append `path` to `base`, keeping the base path
pub(crate) fn join(base: &url::Url, path: &str) -> Result<url::Url, ProviderError> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let with_slash = format!("{}/", base.path());
        base.set_path(&with_slash);
    }

    base.join(path).map_err(|source| ProviderError::InvalidUrl {
        url: format!("{base}{path}"),
        source,
    })
}

/// Blocking client with the connect timeout and the configured overall timeout
pub(crate) fn http_client(settings: &Config) -> Result<reqwest::blocking::Client, ProviderError> {
    let timeout = settings.get_int(&format!("{SETTINGS_NAMESPACE}.timeout"))?;
    let timeout = u64::try_from(timeout).map_err(|_| {
        ProviderError::Configuration(format!(
            "{SETTINGS_NAMESPACE}.timeout must not be negative"
        ))
    })?;

    Ok(reqwest::blocking::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(Duration::from_millis(timeout))
        .build()?)
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn endpoints_need_http_scheme() {
        assert!(http_url("consul.endpoint", "http://127.0.0.1:8500").is_ok());
        assert!(http_url("consul.endpoint", " https://consul.internal ").is_ok());
        assert!(matches!(
            http_url("consul.endpoint", "consul.internal:8500"),
            Err(ProviderError::Configuration(_))
        ));
        assert!(matches!(
            http_url("consul.endpoint", ""),
            Err(ProviderError::Configuration(_))
        ));
        assert!(matches!(
            http_url("consul.endpoint", "httpx://host"),
            Err(ProviderError::Configuration(_))
        ));
    }

    #[test]
    fn join_keeps_base_path() {
        let base = http_url("etcd.endpoint", "http://proxy/etcd").unwrap();
        assert_eq!(
            join(&base, "v2/keys/app?recursive=true").unwrap().as_str(),
            "http://proxy/etcd/v2/keys/app?recursive=true"
        );

        let base = http_url("etcd.endpoint", "http://127.0.0.1:2379/").unwrap();
        assert_eq!(
            join(&base, "v2/keys/?recursive=true").unwrap().as_str(),
            "http://127.0.0.1:2379/v2/keys/?recursive=true"
        );
    }
}
