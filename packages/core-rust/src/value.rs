//! Opaque argument values carried by a [`Message`](crate::message::Message).
//!
//! Arguments cross transports that may or may not preserve their types. The
//! binary envelope keeps every variant intact; the structured text format maps
//! them onto plain JSON and loses the distinction between, e.g., a character
//! and a one-letter string. The resolver's coercion step recovers the types a
//! method actually declares.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A subscription callback record: when `topic_method` fires on the
/// publishing service, `callback_method` is invoked on `callback_name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listener {
    pub topic_method: String,
    pub callback_name: String,
    pub callback_method: String,
}

impl Listener {
    #[must_use]
    pub fn new(
        topic_method: impl Into<String>,
        callback_name: impl Into<String>,
        callback_method: impl Into<String>,
    ) -> Self {
        Self {
            topic_method: topic_method.into(),
            callback_name: callback_name.into(),
            callback_method: callback_method.into(),
        }
    }
}

impl fmt::Display for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} --> {}.{}",
            self.topic_method, self.callback_name, self.callback_method
        )
    }
}

/// Generic runtime value for message arguments.
///
/// Serializes to `MsgPack` via `rmp-serde` in the binary envelope, which keeps
/// the variant tag so a decoded message compares equal to the one encoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Absent argument.
    Null,
    Bool(bool),
    Char(char),
    /// Signed 64-bit integer; narrower integer parameters are range-checked
    /// at coercion time.
    Int(i64),
    Float(f64),
    String(String),
    Listener(Listener),
    /// Milliseconds since the Unix epoch (UTC).
    Timestamp(i64),
    Bytes(#[serde(with = "serde_bytes")] Vec<u8>),
    Array(Vec<Value>),
    /// String-keyed map. `BTreeMap` keeps serialization order deterministic.
    Map(BTreeMap<String, Value>),
    /// An arbitrary structured object identified by its fully-qualified type name.
    Object {
        type_name: String,
        fields: BTreeMap<String, Value>,
    },
}

impl Value {
    /// Whether this value is of a simple type: boolean, character, number,
    /// text or listener. Simple values are always safely convertible to and
    /// from text.
    #[must_use]
    pub fn is_simple(&self) -> bool {
        matches!(
            self,
            Value::Bool(_)
                | Value::Char(_)
                | Value::Int(_)
                | Value::Float(_)
                | Value::String(_)
                | Value::Listener(_)
        )
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Fully-qualified runtime type name of this value.
    #[must_use]
    pub fn type_name(&self) -> &str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Char(_) => "char",
            Value::Int(_) => "i64",
            Value::Float(_) => "f64",
            Value::String(_) => "String",
            Value::Listener(_) => "Listener",
            Value::Timestamp(_) => "Timestamp",
            Value::Bytes(_) => "Bytes",
            Value::Array(_) => "Array",
            Value::Map(_) => "Map",
            Value::Object { type_name, .. } => type_name,
        }
    }

    /// Type name with any namespace stripped (`"org.example.Image"` -> `"Image"`).
    #[must_use]
    pub fn short_type_name(&self) -> &str {
        let full = self.type_name();
        full.rsplit('.').next().unwrap_or(full)
    }

    /// Textual rendering of a simple value, `None` for anything else.
    ///
    /// Floats always carry a fractional part (`1.0`, not `1`) so a rendered
    /// float is never mistaken for an integer.
    #[must_use]
    pub fn simple_text(&self) -> Option<String> {
        match self {
            Value::Bool(b) => Some(b.to_string()),
            Value::Char(c) => Some(c.to_string()),
            Value::Int(i) => Some(i.to_string()),
            Value::Float(f) => Some(format!("{f:?}")),
            Value::String(s) => Some(s.clone()),
            Value::Listener(l) => Some(l.to_string()),
            _ => None,
        }
    }

    /// Returns the text if this is a `String` value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<char> for Value {
    fn from(c: char) -> Self {
        Value::Char(c)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Listener> for Value {
    fn from(l: Listener) -> Self {
        Value::Listener(l)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}
