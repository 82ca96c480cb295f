//! # remote-config - remote configuration at startup
//!
//! Fetch configuration from a KV store or an HTTP document once at startup and layer it over the local
//! configuration, so a deployed service can be reconfigured without a rebuild.
//!
//! ## Introduction for developers
//!
//! Read this to understand how `remote-config` works internally.
//!
//! ### Local configuration
//!
//! Local configuration is written in the canonical text format, one entry per line:
//!
//! ```text
//! remote-configuration.provider = etcd
//! remote-configuration.etcd.endpoint = "http://127.0.0.1:2379"
//! remote-configuration.etcd.prefix = "config/my-service"
//!
//! db.default.driver = org.postgresql.Driver
//! db.default.timeout = 5000
//! ```
//!
//! [config_text::ConfigText] parses it into entries, [config::Config] turns the entries into a tree.
//!
//! ### Selecting a provider
//!
//! `remote-configuration.provider` names a provider by its short name (case-insensitive). An empty or missing
//! setting disables remote configuration. [registry::ProviderRegistry] holds the known providers; a name that
//! matches none of them is an error.
//!
//! | **short name** | **backend**                          | **settings**                                    |
//! |----------------|--------------------------------------|-------------------------------------------------|
//! | `CONSUL`       | [provider::consul] (KV, base64)      | `consul.endpoint`, `consul.prefix`, `consul.authToken` |
//! | `ETCD`         | [provider::etcd] (v2 key tree)       | `etcd.endpoint`, `etcd.prefix`                  |
//! | `HTTP`         | [provider::http] (canonical document)| `http.url`                                      |
//!
//! Defaults for all settings live in `reference.conf` ([config::Config::reference]).
//!
//! ### Normalization
//!
//! KV stores return `/`-separated keys below the configured prefix. The prefix is stripped and the rest becomes a
//! dot-path ([key_path::KeyPath::from_backend]):
//!
//! | **prefix** | **backend key**             | **configuration key** |
//! |------------|-----------------------------|-----------------------|
//! | `test`     | `test/db/default/driver`    | `db.default.driver`   |
//! | `test`     | `/test/db/excludedIds`      | `db.excludedIds`      |
//! | (empty)    | `/my/key`                   | `my.key`              |
//!
//! Stored values are interpreted like values in a configuration file ([value::Value::interpret]), so `5000` is a
//! number and `[1,2,3]` a list. A number keeps its text, `01234` is still `01234` when read as a string.
//! Entries stay structured; when rendered as text, strings are quoted and escaped, which makes the rendered text
//! parse back to the same entries.
//!
//! ### Merging
//!
//! [loader::RemoteConfigLoader::resolve] runs the selected provider and layers the result over the local
//! configuration with [config::Config::with_fallback]: remote values win, local values fill the gaps.
//!
//! Failures are fatal with one exception: a KV store answering with a non-2xx status yields an empty result and
//! the local configuration is used as is.
//!
pub mod config;
pub mod config_text;
pub mod key_path;
pub mod loader;
pub mod provider;
pub mod registry;
pub mod value;
