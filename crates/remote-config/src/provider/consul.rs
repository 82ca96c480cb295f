//! HashiCorp Consul KV store
//!
//! `GET {endpoint}/v1/kv/{prefix}/?recurse&token={authToken}` returns every key below the prefix as a flat list:
//!
//! ```json
//! [
//!   { "Key": "config/", "Value": null },
//!   { "Key": "config/db/default/driver", "Value": "b3JnLnBvc3RncmVzcWwuRHJpdmVy" }
//! ]
//! ```
//!
//! Values are base64 encoded. Entries without a value are folders and are skipped.
use super::{http_client, http_url, join, setting, Mode, ProviderError, RemoteConfigProvider};
use crate::config::Config;
use crate::config_text::ConfigText;
use crate::key_path::{normalize_prefix, KeyPath};
use base64::Engine;

#[derive(serde::Deserialize, Debug)]
struct KvEntry {
    #[serde(rename = "Key")]
    key: String,
    #[serde(rename = "Value", default)]
    value: Option<String>,
}

#[derive(derive_new::new, Debug, Default)]
pub struct ConsulProvider;

impl ConsulProvider {
    fn url(&self, settings: &Config) -> Result<url::Url, ProviderError> {
        let endpoint = http_url("consul.endpoint", &setting(settings, "consul.endpoint")?)?;
        let prefix = setting(settings, "consul.prefix")?;
        let token = setting(settings, "consul.authToken")?;

        let path = match normalize_prefix(&prefix) {
            "" => "v1/kv/".to_string(),
            prefix => format!("v1/kv/{prefix}/"),
        };

        let mut url = join(&endpoint, &path)?;
        {
            let mut query = url.query_pairs_mut();
            query.append_key_only("recurse");
            if !token.is_empty() {
                query.append_pair("token", &token);
            }
        }
        Ok(url)
    }
}

impl RemoteConfigProvider for ConsulProvider {
    fn short_name(&self) -> &'static str {
        "CONSUL"
    }

    fn display_name(&self) -> &'static str {
        "HashiCorp Consul"
    }

    #[tracing::instrument(level = "debug", skip_all, fields(provider = self.display_name()))]
    fn fetch(&self, mode: Mode, settings: &Config) -> Result<ConfigText, ProviderError> {
        let url = self.url(settings)?;
        let prefix = setting(settings, "consul.prefix")?;
        let prefix = normalize_prefix(&prefix);

        tracing::debug!(%mode, %url, "requesting keys");
        let response = http_client(settings)?.get(url).send()?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%status, "non 2xx status, no remote configuration loaded");
            return Ok(ConfigText::default());
        }

        let entries: Vec<KvEntry> = serde_json::from_reader(response)?;
        normalize(entries, prefix)
    }
}

fn normalize(entries: Vec<KvEntry>, prefix: &str) -> Result<ConfigText, ProviderError> {
    let mut text = ConfigText::default();

    for entry in entries {
        let Some(encoded) = entry.value else {
            continue;
        };

        let Some(key) = KeyPath::from_backend(&entry.key, prefix) else {
            tracing::debug!(key = %entry.key, "skipping value stored on the prefix itself");
            continue;
        };

        let decoded = base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|source| ProviderError::Base64 {
                key: entry.key.clone(),
                source,
            })?;
        let value = String::from_utf8(decoded).map_err(|source| ProviderError::Utf8 {
            key: entry.key.clone(),
            source,
        })?;

        text.push_raw(key, &value);
    }

    tracing::debug!(entries = text.len(), "keys normalized");
    Ok(text)
}
