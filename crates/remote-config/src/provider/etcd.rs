//! CoreOS etcd (v2 keys API)
//!
//! `GET {endpoint}/v2/keys/{prefix}?recursive=true` returns a tree of nodes:
//!
//! ```json
//! { "node": { "dir": true, "nodes": [
//!     { "key": "/test/db", "dir": true, "nodes": [
//!         { "key": "/test/db/excludedIds", "value": "[1,2,3,4,5]" }
//!     ] }
//! ] } }
//! ```
//!
//! The prefix has to name a directory. Values are plain text.
use super::{http_client, http_url, join, setting, Mode, ProviderError, RemoteConfigProvider};
use crate::config::Config;
use crate::config_text::ConfigText;
use crate::key_path::{normalize_prefix, KeyPath};

#[derive(serde::Deserialize, Debug)]
struct KeysResponse {
    node: Node,
}

#[derive(serde::Deserialize, Debug)]
struct Node {
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    dir: bool,
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    nodes: Vec<Node>,
}

#[derive(derive_new::new, Debug, Default)]
pub struct EtcdProvider;

impl EtcdProvider {
    fn url(&self, settings: &Config) -> Result<url::Url, ProviderError> {
        let endpoint = http_url("etcd.endpoint", &setting(settings, "etcd.endpoint")?)?;
        let prefix = setting(settings, "etcd.prefix")?;

        join(
            &endpoint,
            &format!("v2/keys/{}?recursive=true", normalize_prefix(&prefix)),
        )
    }
}

impl RemoteConfigProvider for EtcdProvider {
    fn short_name(&self) -> &'static str {
        "ETCD"
    }

    fn display_name(&self) -> &'static str {
        "CoreOS etcd"
    }

    #[tracing::instrument(level = "debug", skip_all, fields(provider = self.display_name()))]
    fn fetch(&self, mode: Mode, settings: &Config) -> Result<ConfigText, ProviderError> {
        let url = self.url(settings)?;
        let prefix = setting(settings, "etcd.prefix")?;
        let prefix = normalize_prefix(&prefix);

        tracing::debug!(%mode, %url, "requesting keys");
        let response = http_client(settings)?.get(url).send()?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%status, "non 2xx status, no remote configuration loaded");
            return Ok(ConfigText::default());
        }

        let KeysResponse { node } = serde_json::from_reader(response)?;
        if !node.dir {
            tracing::warn!(prefix, "prefix must reference a directory, no remote configuration loaded");
            return Ok(ConfigText::default());
        }

        let mut text = ConfigText::default();
        collect(prefix, &node.nodes, &mut text);
        tracing::debug!(entries = text.len(), "keys normalized");
        Ok(text)
    }
}

/// Depth-first walk, leaves become entries
fn collect(prefix: &str, nodes: &[Node], text: &mut ConfigText) {
    for node in nodes {
        if node.dir {
            collect(prefix, &node.nodes, text);
            continue;
        }

        let (Some(key), Some(value)) = (&node.key, &node.value) else {
            continue;
        };

        match KeyPath::from_backend(key, prefix) {
            Some(path) => text.push_raw(path, value),
            None => tracing::debug!(%key, "skipping value stored on the prefix itself"),
        }
    }
}
