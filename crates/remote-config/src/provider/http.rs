//! Plain HTTP document
//!
//! The document at `remote-configuration.http.url` is already canonical configuration text, it is parsed as is.
use super::{http_client, http_url, setting, Mode, ProviderError, RemoteConfigProvider};
use crate::config::Config;
use crate::config_text::ConfigText;

#[derive(derive_new::new, Debug, Default)]
pub struct HttpProvider;

impl RemoteConfigProvider for HttpProvider {
    fn short_name(&self) -> &'static str {
        "HTTP"
    }

    fn display_name(&self) -> &'static str {
        "HTTP"
    }

    #[tracing::instrument(level = "debug", skip_all, fields(provider = self.display_name()))]
    fn fetch(&self, mode: Mode, settings: &Config) -> Result<ConfigText, ProviderError> {
        let url = http_url("http.url", &setting(settings, "http.url")?)?;

        tracing::debug!(%mode, %url, "requesting document");
        let response = http_client(settings)?.get(url).send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status(status));
        }

        let body = response.text()?;
        Ok(ConfigText::parse(&body)?)
    }
}
