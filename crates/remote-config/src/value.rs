//! value representation
//!
//! Configuration values are one of
//! - boolean (true/false)
//! - number (kept as written, `1.10` stays `1.10`)
//! - string (utf-8)
//! - array ("list" of values)
//! - object (order-preserving "map"/"dictionary", where the key is of type string)
//!
//! There is no `null`. A raw value that would evaluate to `null` (or anything else that is not a literal) is kept
//! as its verbatim text, see [Value::interpret].
//!
use serde::{
    ser::{SerializeMap, SerializeSeq},
    Serializer,
};

/// All possible value types
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Boolean(bool),
    /// Literal text of the number
    Number(String),
    String(String),
    Array(Vec<Value>),
    Object(indexmap::IndexMap<String, Value>),
}

impl Value {
    /// Interpret raw text as stored in a backend or written in a config file
    ///
    /// Literal HCL expressions become typed values: `5000`, `-1.5`, `false`, `"quoted"`, `[1, 2]`,
    /// `{ a = 1 }`. Everything else is a plain string: `org.postgresql.Driver`, `Hello World`,
    /// `http://host:8500`, `null`, `!true`.
    ///
    /// A bare number keeps its text, so `01234` reads back as `01234`. Numbers nested in lists and objects are
    /// normalized.
    pub fn interpret(raw: &str) -> Value {
        let raw = raw.trim();
        if raw.is_empty() {
            return Value::String(String::new());
        }

        if is_number_literal(raw) {
            return Value::Number(raw.to_string());
        }

        match evaluate_literal(raw) {
            Some(value) => value,
            None => Value::String(raw.to_string()),
        }
    }

    pub fn as_object(&self) -> Option<&indexmap::IndexMap<String, Value>> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Scalar values as text, the way a string getter sees them
    pub fn to_text(&self) -> Option<String> {
        match self {
            Value::Boolean(b) => Some(b.to_string()),
            Value::Number(n) => Some(n.clone()),
            Value::String(s) => Some(s.clone()),
            Value::Array(_) | Value::Object(_) => None,
        }
    }

    pub fn to_integer(&self) -> Option<i64> {
        match self {
            Value::Number(n) => n.parse().ok(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn to_boolean(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            Value::String(s) => match s.trim() {
                "true" | "yes" | "on" => Some(true),
                "false" | "no" | "off" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

/// `-?digits(.digits)?([eE][+-]?digits)?`
fn is_number_literal(raw: &str) -> bool {
    fn all_digits(s: &str) -> bool {
        !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
    }

    let unsigned = raw.strip_prefix('-').unwrap_or(raw);
    let (mantissa, exponent) = match unsigned.find(['e', 'E']) {
        Some(index) => (&unsigned[..index], Some(&unsigned[index + 1..])),
        None => (unsigned, None),
    };
    let (integer, fraction) = match mantissa.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (mantissa, None),
    };

    all_digits(integer)
        && fraction.map_or(true, all_digits)
        && exponent.map_or(true, |exponent| {
            all_digits(exponent.strip_prefix(['+', '-']).unwrap_or(exponent))
        })
}

/// Parse and evaluate `raw` as a literal expression
///
/// Bare numbers are left to [is_number_literal], anything HCL reads as a number beyond that stays text.
fn evaluate_literal(raw: &str) -> Option<Value> {
    use hcl::eval::Evaluate;
    use hcl::expr::Expression;

    let expr: hcl_edit::expr::Expression = raw.parse().ok()?;
    let expr: Expression = expr.into();

    if matches!(expr, Expression::Number(_) | Expression::Operation(_)) || !is_literal(&expr) {
        return None;
    }

    let value = expr.evaluate(&hcl::eval::Context::new()).ok()?;
    Value::try_from(value).ok()
}

/// Literals only: no variables, functions, interpolations or operators other than a negated number
fn is_literal(expr: &hcl::expr::Expression) -> bool {
    use hcl::expr::{Expression, ObjectKey, Operation, UnaryOperator};
    use hcl::template::{Element, Template};

    match expr {
        Expression::Bool(_) | Expression::Number(_) | Expression::String(_) => true,
        Expression::Array(elements) => elements.iter().all(is_literal),
        Expression::Object(object) => object.iter().all(|(key, value)| {
            let key_is_literal = match key {
                ObjectKey::Identifier(_) => true,
                ObjectKey::Expression(key) => is_literal(key),
                #[allow(unreachable_patterns)]
                _ => false,
            };
            key_is_literal && is_literal(value)
        }),
        Expression::TemplateExpr(template) => Template::from_expr(template)
            .map(|template| {
                template
                    .elements()
                    .iter()
                    .all(|element| matches!(element, Element::Literal(_)))
            })
            .unwrap_or(false),
        Expression::Operation(operation) => match operation.as_ref() {
            Operation::Unary(unary) => {
                matches!(unary.operator, UnaryOperator::Neg) && matches!(unary.expr, Expression::Number(_))
            }
            _ => false,
        },
        _ => false,
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ValueError {
    #[error("null values are not supported")]
    Null,
    #[error("number {0} can not be represented")]
    Number(hcl::Number),
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Number(value.to_string())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Value::Array(value.into_iter().map(Into::into).collect())
    }
}

impl TryFrom<hcl::Number> for Value {
    type Error = ValueError;

    fn try_from(value: hcl::Number) -> Result<Self, Self::Error> {
        if let Some(int) = value.as_i64() {
            return Ok(Value::Number(int.to_string()));
        }
        if let Some(int) = value.as_u64() {
            return Ok(Value::Number(int.to_string()));
        }

        value
            .as_f64()
            .map(|float| Value::Number(format!("{float:?}")))
            .ok_or(ValueError::Number(value))
    }
}

impl TryFrom<hcl::Value> for Value {
    type Error = ValueError;

    fn try_from(value: hcl::Value) -> Result<Value, Self::Error> {
        Ok(match value {
            hcl::Value::Bool(b) => b.into(),
            hcl::Value::Number(n) => n.try_into()?,
            hcl::Value::String(s) => s.into(),
            hcl::Value::Array(a) => Value::Array(
                a.into_iter()
                    .map(Value::try_from)
                    .collect::<Result<_, _>>()?,
            ),
            hcl::Value::Object(o) => Value::Object(
                o.into_iter()
                    .map(|(k, v)| Ok((k, Value::try_from(v)?)))
                    .collect::<Result<_, ValueError>>()?,
            ),
            hcl::Value::Null => return Err(ValueError::Null),
        })
    }
}

/// Canonical text form, re-readable by [Value::interpret]
///
/// Strings are always quoted so that `=`, newlines, quotes and template sequences survive a round trip.
impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Number(n) => f.write_str(n),
            Value::String(s) => write_quoted(f, s),
            Value::Array(array) => {
                f.write_str("[")?;
                for (index, element) in array.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{element}")?;
                }
                f.write_str("]")
            }
            Value::Object(object) => {
                if object.is_empty() {
                    return f.write_str("{}");
                }
                f.write_str("{ ")?;
                for (index, (key, value)) in object.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write_quoted(f, key)?;
                    write!(f, " = {value}")?;
                }
                f.write_str(" }")
            }
        }
    }
}

/// HCL quoted string with template sequences escaped
fn write_quoted(f: &mut std::fmt::Formatter<'_>, s: &str) -> std::fmt::Result {
    use std::fmt::Write;

    f.write_char('"')?;
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            '$' | '%' if chars.peek() == Some(&'{') => {
                f.write_char(c)?;
                f.write_char(c)?;
            }
            c if c.is_control() => write!(f, "\\u{:04X}", c as u32)?,
            c => f.write_char(c)?,
        }
    }
    f.write_char('"')
}

impl serde::ser::Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Boolean(value) => serializer.serialize_bool(*value),
            Value::Number(text) => {
                // numbers whose text would change as i64/f64 are written as strings
                if let Some(int) = text.parse::<i64>().ok().filter(|int| int.to_string() == *text) {
                    return serializer.serialize_i64(int);
                }
                match text.parse::<f64>().ok().filter(|float| format!("{float:?}") == *text) {
                    Some(float) => serializer.serialize_f64(float),
                    None => serializer.serialize_str(text),
                }
            }
            Value::String(value) => serializer.serialize_str(value),
            Value::Array(value) => {
                let mut ser = serializer.serialize_seq(Some(value.len()))?;
                for element in value {
                    ser.serialize_element(element)?;
                }
                ser.end()
            }
            Value::Object(value) => {
                let mut ser = serializer.serialize_map(Some(value.len()))?;
                for (element_key, element_value) in value {
                    ser.serialize_entry(element_key, element_value)?;
                }
                ser.end()
            }
        }
    }
}
