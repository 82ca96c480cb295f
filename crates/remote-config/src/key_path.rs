//! backend key normalization
//!
//! KV stores address values with `/`-separated keys (`config/db/default/driver`), the configuration tree uses
//! dot-paths (`db.default.driver`). [KeyPath::from_backend] strips the configured prefix and splits the rest into
//! segments.

/// Trim whitespace and one leading/trailing `/` from a configured prefix
///
/// `" /config/ "` becomes `"config"`, `"/"` becomes `""`.
pub fn normalize_prefix(prefix: &str) -> &str {
    let prefix = prefix.trim();
    let prefix = prefix.strip_suffix('/').unwrap_or(prefix);
    prefix.strip_prefix('/').unwrap_or(prefix)
}

/// A canonical configuration key as a list of segments
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct KeyPath(Vec<String>);

impl KeyPath {
    pub fn new(segments: Vec<String>) -> Self {
        Self(segments)
    }

    /// Split a dot-path (`a.b.c`)
    ///
    /// Empty segments are dropped, so `a..b` and `.a.b` are both `a.b`.
    pub fn parse(dot_path: &str) -> Self {
        Self(
            dot_path
                .split('.')
                .filter(|segment| !segment.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    /// Normalize a backend key relative to an already normalized prefix
    ///
    /// One leading `/` is ignored (etcd keys are absolute, Consul keys are not). The prefix must match whole
    /// segments: with prefix `app`, the key `app/db` yields `db` but `application/db` is kept as is.
    ///
    /// Dots in the backend key nest as well, `app/db.default/driver` yields `db.default.driver`.
    ///
    /// Returns `None` when nothing is left after stripping, e.g. the prefix directory itself.
    pub fn from_backend(key: &str, prefix: &str) -> Option<Self> {
        let key = key.strip_prefix('/').unwrap_or(key);

        let relative = if prefix.is_empty() {
            key
        } else {
            match key.strip_prefix(prefix) {
                Some("") => "",
                Some(rest) => rest.strip_prefix('/').unwrap_or(key),
                None => key,
            }
        };

        let segments: Vec<String> = relative
            .split(['/', '.'])
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect();

        if segments.is_empty() {
            return None;
        }

        Some(Self(segments))
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn push(&mut self, segment: impl Into<String>) {
        self.0.push(segment.into());
    }

    /// Render segments for the canonical text format
    ///
    /// Segments that are not bare words get quoted as JSON string literals.
    pub fn to_canonical(&self) -> String {
        self.0
            .iter()
            .map(|segment| {
                if is_bare_segment(segment) {
                    segment.clone()
                } else {
                    serde_json::Value::String(segment.clone()).to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl std::fmt::Display for KeyPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

impl From<&str> for KeyPath {
    fn from(value: &str) -> Self {
        KeyPath::parse(value)
    }
}

/// Characters that end a bare key segment in canonical text
pub(crate) fn is_segment_delimiter(c: char) -> bool {
    c.is_whitespace() || matches!(c, '.' | '=' | ':' | '"' | '[' | '{' | '#' | ',' | '/')
}

fn is_bare_segment(segment: &str) -> bool {
    !segment.is_empty() && !segment.chars().any(|c| is_segment_delimiter(c) || c.is_control())
}
