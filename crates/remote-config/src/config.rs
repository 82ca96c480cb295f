//! structured configuration
//!
//! [Config] is a tree of [Value]s built from [ConfigText] entries. Dot-paths create nested objects, later entries
//! win. Two configurations are layered with [Config::with_fallback].
use crate::config_text::{ConfigText, ConfigTextError};
use crate::key_path::KeyPath;
use crate::value::Value;
use indexmap::IndexMap;
use std::path::Path;

/// Default values for every setting this crate reads
const REFERENCE: &str = include_str!("reference.conf");

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    root: IndexMap<String, Value>,
}

impl Config {
    /// Parse canonical configuration text
    pub fn parse(text: &str) -> Result<Self, ConfigTextError> {
        Ok(ConfigText::parse(text)?.into())
    }

    /// Built-in defaults for the `remote-configuration` settings
    pub fn reference() -> Result<Self, ConfigTextError> {
        Self::parse(REFERENCE)
    }

    pub fn load_file(file_path: &Path) -> Result<Self, LoadError> {
        let file_path = file_path.canonicalize()?;
        tracing::info!(path=%file_path.display(), "loading file");

        let file_contents = std::fs::read_to_string(&file_path)?;
        Ok(Self::parse(&file_contents)?)
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Set `key` to `value`
    ///
    /// Objects are merged into existing objects, every other value replaces what was there, including an
    /// object.
    pub fn set(&mut self, key: &KeyPath, value: Value) {
        let Some((last, parents)) = key.segments().split_last() else {
            return;
        };

        let mut node = &mut self.root;
        for segment in parents {
            let child = node
                .entry(segment.clone())
                .or_insert_with(|| Value::Object(IndexMap::new()));
            if !matches!(child, Value::Object(_)) {
                *child = Value::Object(IndexMap::new());
            }
            let Value::Object(object) = child else {
                unreachable!("replaced by an object above");
            };
            node = object;
        }

        insert_or_merge(node, last.clone(), value);
    }

    /// Look up a dot-path
    ///
    /// Every `.` separates segments. Keys with a segment that contains a dot (`a."b.c"` in configuration text)
    /// are reached with [Config::get_key].
    pub fn get(&self, path: &str) -> Option<&Value> {
        self.get_key(&KeyPath::parse(path))
    }

    pub fn get_key(&self, key: &KeyPath) -> Option<&Value> {
        let (first, rest) = key.segments().split_first()?;

        rest.iter()
            .try_fold(self.root.get(first)?, |value, segment| value.as_object()?.get(segment))
    }

    pub fn has(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// A scalar as string; numbers and booleans are converted
    pub fn get_string(&self, path: &str) -> Result<String, ConfigError> {
        self.typed(path, "string", Value::to_text)
    }

    /// Like [Config::get_string], but absent keys are `None`
    pub fn get_optional_string(&self, path: &str) -> Result<Option<String>, ConfigError> {
        match self.get_string(path) {
            Ok(value) => Ok(Some(value)),
            Err(ConfigError::Missing(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    pub fn get_int(&self, path: &str) -> Result<i64, ConfigError> {
        self.typed(path, "integer", Value::to_integer)
    }

    pub fn get_bool(&self, path: &str) -> Result<bool, ConfigError> {
        self.typed(path, "boolean", Value::to_boolean)
    }

    pub fn get_int_list(&self, path: &str) -> Result<Vec<i64>, ConfigError> {
        self.typed(path, "list of integers", |value| match value {
            Value::Array(elements) => elements.iter().map(Value::to_integer).collect(),
            _ => None,
        })
    }

    fn typed<T>(
        &self,
        path: &str,
        expected: &'static str,
        convert: impl FnOnce(&Value) -> Option<T>,
    ) -> Result<T, ConfigError> {
        let value = self
            .get(path)
            .ok_or_else(|| ConfigError::Missing(path.to_string()))?;

        convert(value).ok_or_else(|| ConfigError::WrongType {
            path: path.to_string(),
            expected,
        })
    }

    /// Layer `self` over `fallback`
    ///
    /// Keys defined in `self` win, `fallback` fills in everything else. Nested objects are merged key by key.
    pub fn with_fallback(&self, fallback: &Config) -> Config {
        let mut merged = fallback.root.clone();
        merge_objects(&mut merged, self.root.clone());
        Config { root: merged }
    }

    /// Flatten into entries, one per leaf value
    pub fn to_config_text(&self) -> ConfigText {
        fn flatten(prefix: &KeyPath, object: &IndexMap<String, Value>, text: &mut ConfigText) {
            for (key, value) in object {
                let mut path = prefix.clone();
                path.push(key.clone());
                match value {
                    Value::Object(child) if !child.is_empty() => flatten(&path, child, text),
                    value => text.push(path, value.clone()),
                }
            }
        }

        let mut text = ConfigText::default();
        flatten(&KeyPath::default(), &self.root, &mut text);
        text
    }
}

/// Merge `incoming` into `target`, `incoming` wins on conflicts
fn merge_objects(target: &mut IndexMap<String, Value>, incoming: IndexMap<String, Value>) {
    for (key, value) in incoming {
        insert_or_merge(target, key, value);
    }
}

fn insert_or_merge(target: &mut IndexMap<String, Value>, key: String, value: Value) {
    if let Value::Object(incoming) = value {
        if let Some(Value::Object(existing)) = target.get_mut(&key) {
            merge_objects(existing, incoming);
            return;
        }
        target.insert(key, Value::Object(incoming));
        return;
    }

    target.insert(key, value);
}

impl From<ConfigText> for Config {
    fn from(value: ConfigText) -> Self {
        let mut config = Config::default();
        for entry in value {
            config.set(&entry.key, entry.value);
        }
        config
    }
}

impl serde::ser::Serialize for Config {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;

        let mut ser = serializer.serialize_map(Some(self.root.len()))?;
        for (key, value) in &self.root {
            ser.serialize_entry(key, value)?;
        }
        ser.end()
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("no configuration setting found for key `{0}`")]
    Missing(String),
    #[error("`{path}` is not a {expected}")]
    WrongType {
        path: String,
        expected: &'static str,
    },
}

#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("IO error")]
    IoError(#[from] std::io::Error),
    #[error("Unable to parse configuration file")]
    ParseFailed(#[from] ConfigTextError),
}
