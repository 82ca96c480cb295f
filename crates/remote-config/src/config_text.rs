//! canonical configuration text
//!
//! Every provider produces a [ConfigText]: an ordered list of `key = value` entries. Entries are kept structured
//! until they are turned into a [Config](crate::config::Config), so a backend value is never spliced into text
//! and re-parsed. Rendering ([std::fmt::Display]) and parsing ([ConfigText::parse]) use the same grammar, which
//! is also the grammar of local configuration files:
//!
//! ```text
//! # comment
//! // comment
//! db.default.driver = org.postgresql.Driver
//! db.default.timeout = 5000
//! db.default.excludedIds = [
//!   1, 2, 3
//! ]
//! "quoted segment".key: "string with = and \n inside"
//! ```
//!
//! A value is the rest of the line. It continues on the following lines while `[` or `{` are left open (outside
//! of string literals). Outside of string literals, `#` or `//` at the start of the value or after whitespace begins
//! a trailing comment, so `a = hello # note` is `hello` while `url = http://host` keeps its `//`. The value text is
//! interpreted with [Value::interpret].
use crate::key_path::{is_segment_delimiter, KeyPath};
use crate::value::Value;

/// A single configuration entry
#[derive(derive_new::new, Debug, Clone, PartialEq)]
pub struct Entry {
    pub key: KeyPath,
    pub value: Value,
}

/// Ordered collection of configuration entries
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigText {
    entries: Vec<Entry>,
}

impl ConfigText {
    /// Append a backend value under a normalized key
    ///
    /// `raw` is interpreted, so `5000` becomes a number and `[1,2]` a list. The value is taken as is, `#` does
    /// not start a comment here.
    pub fn push_raw(&mut self, key: KeyPath, raw: &str) {
        self.push(key, Value::interpret(raw));
    }

    pub fn push(&mut self, key: KeyPath, value: Value) {
        tracing::trace!(%key, "add entry");
        self.entries.push(Entry::new(key, value));
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse canonical configuration text
    pub fn parse(text: &str) -> Result<Self, ConfigTextError> {
        let mut config_text = Self::default();
        let mut lines = text.lines().enumerate().map(|(index, line)| (index + 1, line));

        while let Some((line_number, line)) = lines.next() {
            let line = line.trim_start();
            if line.is_empty() || line.starts_with('#') || line.starts_with("//") {
                continue;
            }

            let (key, rest) = parse_key(line).map_err(|kind| ConfigTextError {
                line: line_number,
                kind,
            })?;

            let mut raw = strip_comment(rest).to_string();
            let mut depth = nesting_depth(&raw, 0);
            while depth > 0 {
                let Some((_, continuation)) = lines.next() else {
                    return Err(ConfigTextError {
                        line: line_number,
                        kind: ErrorKind::Unterminated(key.to_string()),
                    });
                };
                let continuation = strip_comment(continuation);
                raw.push('\n');
                raw.push_str(continuation);
                depth = nesting_depth(continuation, depth);
            }

            config_text.push_raw(key, &raw);
        }

        Ok(config_text)
    }
}

impl IntoIterator for ConfigText {
    type Item = Entry;
    type IntoIter = std::vec::IntoIter<Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl std::fmt::Display for ConfigText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{} = {}", entry.key.to_canonical(), entry.value)?;
        }
        Ok(())
    }
}

/// Split `line` into key path and the raw value after the separator
fn parse_key(line: &str) -> Result<(KeyPath, &str), ErrorKind> {
    let mut key = KeyPath::default();
    let mut rest = line;

    loop {
        if let Some(quoted) = rest.strip_prefix('"') {
            let end = closing_quote(quoted).ok_or(ErrorKind::UnterminatedString)?;
            let literal = &rest[..end + 2];
            let segment: String =
                serde_json::from_str(literal).map_err(|_| ErrorKind::InvalidKey(literal.to_string()))?;
            key.push(segment);
            rest = &rest[end + 2..];
        } else {
            let end = rest.find(is_segment_delimiter).unwrap_or(rest.len());
            if end == 0 {
                return Err(ErrorKind::InvalidKey(line.to_string()));
            }
            key.push(&rest[..end]);
            rest = &rest[end..];
        }

        match rest.strip_prefix('.') {
            Some(next) => rest = next,
            None => break,
        }
    }

    let rest = rest.trim_start();
    let Some(value) = rest.strip_prefix('=').or_else(|| rest.strip_prefix(':')) else {
        return Err(ErrorKind::MissingSeparator(key.to_string()));
    };

    Ok((key, value))
}

/// Byte index of the unescaped `"` closing a string whose opening quote was already consumed
fn closing_quote(s: &str) -> Option<usize> {
    let mut escaped = false;
    for (index, c) in s.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '"' => return Some(index),
            _ => {}
        }
    }
    None
}

/// Cut a trailing `#` or `//` comment that starts outside of string literals after whitespace
fn strip_comment(s: &str) -> &str {
    let mut in_string = false;
    let mut escaped = false;
    let mut after_space = true;
    for (index, c) in s.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        if after_space && (c == '#' || s[index..].starts_with("//")) {
            return &s[..index];
        }

        after_space = c.is_whitespace();
        if c == '"' {
            in_string = true;
        }
    }
    s
}

/// Track open `[`/`{` outside of string literals
fn nesting_depth(s: &str, mut depth: usize) -> usize {
    let mut in_string = false;
    let mut escaped = false;
    for c in s.chars() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '[' | '{' => depth += 1,
            ']' | '}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    depth
}

#[derive(thiserror::Error, Debug)]
#[error("line {line}: {kind}")]
pub struct ConfigTextError {
    pub line: usize,
    pub kind: ErrorKind,
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ErrorKind {
    #[error("invalid key `{0}`")]
    InvalidKey(String),
    #[error("unterminated string in key")]
    UnterminatedString,
    #[error("expected `=` or `:` after `{0}`")]
    MissingSeparator(String),
    #[error("value of `{0}` is never closed")]
    Unterminated(String),
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entry(key: &str, value: impl Into<Value>) -> Entry {
        Entry::new(KeyPath::parse(key), value.into())
    }

    #[test]
    fn parses_lines() {
        let text = ConfigText::parse(
            r#"
            # database
            db.default.driver = org.postgresql.Driver
            db.default.timeout = 5000
            // toggles
            db.default.disabled: false
            my.key = "Hello World"
            "#,
        )
        .expect("valid text");

        assert_eq!(
            text.entries(),
            &[
                entry("db.default.driver", "org.postgresql.Driver"),
                entry("db.default.timeout", 5000i64),
                entry("db.default.disabled", false),
                entry("my.key", "Hello World"),
            ]
        );
    }

    #[test]
    fn values_may_span_lines_while_brackets_are_open() {
        let text = ConfigText::parse("ids = [\n  1,\n  2,\n  3\n]\nnext = \"[\"").expect("valid text");

        assert_eq!(
            text.entries(),
            &[entry("ids", vec![1i64, 2, 3]), entry("next", "[")]
        );
    }

    #[test]
    fn trailing_comments_are_cut_for_every_value() {
        let text = ConfigText::parse(
            r#"
            a = hello # note
            b = 1 # note
            c = "x # y" // note
            url = http://host:8500/path
            tag = v#1
            ids = [ # first line
              1, // one
              2
            ]
            "#,
        )
        .expect("valid text");

        assert_eq!(
            text.entries(),
            &[
                entry("a", "hello"),
                entry("b", 1i64),
                entry("c", "x # y"),
                entry("url", "http://host:8500/path"),
                entry("tag", "v#1"),
                entry("ids", vec![1i64, 2]),
            ]
        );
    }

    #[test]
    fn backend_values_keep_hash_signs() {
        let mut text = ConfigText::default();
        text.push_raw(KeyPath::parse("a"), "hello # note");
        assert_eq!(text.entries(), &[entry("a", "hello # note")]);

        let reparsed = ConfigText::parse(&text.to_string()).expect("re-parse");
        assert_eq!(reparsed, text);
    }

    #[test]
    fn quoted_key_segments() {
        let text = ConfigText::parse(r#"a."b.c"."d e" = 1"#).expect("valid text");
        let key = &text.entries()[0].key;
        assert_eq!(key.segments(), &["a", "b.c", "d e"]);
    }

    #[test]
    fn errors_carry_line_numbers() {
        let err = ConfigText::parse("a = 1\nb 2").expect_err("missing separator");
        assert_eq!(err.line, 2);
        assert_eq!(err.kind, ErrorKind::MissingSeparator("b".into()));

        let err = ConfigText::parse("a = [1,\n2").expect_err("unterminated");
        assert_eq!(err.kind, ErrorKind::Unterminated("a".into()));

        let err = ConfigText::parse("= 1").expect_err("no key");
        assert!(matches!(err.kind, ErrorKind::InvalidKey(_)));
    }

    #[test]
    fn rendered_text_parses_back_to_the_same_entries() {
        let mut text = ConfigText::default();
        text.push_raw(KeyPath::parse("db.url"), "jdbc:postgresql://db/app?ssl=true");
        text.push_raw(KeyPath::parse("motd"), "line one\nline two = \"quoted\"");
        text.push_raw(KeyPath::parse("template"), "${HOME}/data");
        text.push_raw(KeyPath::parse("ids"), "[1,2,3]");
        text.push_raw(
            KeyPath::new(vec!["odd key".into(), "x=y".into()]),
            "value",
        );

        let rendered = text.to_string();
        insta::assert_snapshot!(rendered, @r###"
        db.url = "jdbc:postgresql://db/app?ssl=true"
        motd = "line one\nline two = \"quoted\""
        template = "$${HOME}/data"
        ids = [1, 2, 3]
        "odd key"."x=y" = "value"
        "###);

        assert_eq!(ConfigText::parse(&rendered).expect("re-parse"), text);
    }
}
