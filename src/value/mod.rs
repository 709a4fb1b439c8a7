/*!
 Contains the generic value tree produced by the reader and consumed by the writer.

 In the binary plist format every value, including every element of a container,
 lives in a flat object table and containers hold integer references into that
 table. That table only exists while encoding or decoding; this module is the
 fully materialized, nested representation that callers work with.
*/

use chrono::{DateTime, Utc};
use indexmap::IndexMap;

/// A plist dictionary; keys keep their insertion order through a round-trip
pub type Dictionary = IndexMap<String, Value>;

/// A single value in a plist tree
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// The absence of a value, stored as its own marker byte on the wire
    Null,
    Boolean(bool),
    /// Signed integer types are coerced into this container
    Integer(i64),
    /// Floating point numbers; always written as a double
    Real(f64),
    /// A UTC instant, stored as seconds elapsed since 2001-01-01T00:00:00Z
    Date(DateTime<Utc>),
    /// Arbitrary bytes
    Data(Vec<u8>),
    /// Text; the writer picks the ASCII or UTF-16BE wire form by inspection
    String(String),
    /// An ordered sequence of values
    Array(Vec<Value>),
    /// An ordered mapping of string keys to values
    Dictionary(Dictionary),
}

impl Value {
    /// Whether this value is the default for its kind, used by the projector
    /// to skip members whose `emit_default` flag is unset
    pub fn is_default(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Boolean(value) => !value,
            Value::Integer(value) => *value == 0,
            Value::Real(value) => *value == 0.0,
            Value::Date(_) => false,
            Value::Data(bytes) => bytes.is_empty(),
            Value::String(text) => text.is_empty(),
            Value::Array(items) => items.is_empty(),
            Value::Dictionary(entries) => entries.is_empty(),
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Value::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_real(&self) -> Option<f64> {
        match self {
            Value::Real(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<&DateTime<Utc>> {
        match self {
            Value::Date(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_data(&self) -> Option<&[u8]> {
        match self {
            Value::Data(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_dictionary(&self) -> Option<&Dictionary> {
        match self {
            Value::Dictionary(entries) => Some(entries),
            _ => None,
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Real(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::Date(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Array(value)
    }
}

impl From<Dictionary> for Value {
    fn from(value: Dictionary) -> Self {
        Value::Dictionary(value)
    }
}
