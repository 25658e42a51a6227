//! Structured text (JSON) format.
//!
//! Arguments are written as plain JSON, so this format is lossy: characters
//! come back as one-letter strings, timestamps as formatted text, and named
//! objects as untyped maps. Decoders that need the declared parameter types
//! coerce the values against a resolved method descriptor.
//!
//! `serde_json` escapes only what JSON requires (quotes, backslashes, control
//! characters), so `/`, `=`, `<` and friends pass through untouched and
//! payloads stay embeddable in URLs.

use std::io::Write;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number};

use super::CodecError;
use crate::message::Message;
use crate::time::format_timestamp;
use crate::value::{Listener, Value};

const LISTENER_FIELDS: [&str; 3] = ["topicMethod", "callbackName", "callbackMethod"];

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireMessageOut<'a> {
    sender: &'a str,
    sending_method: &'a str,
    target: &'a str,
    method: &'a str,
    args: Vec<serde_json::Value>,
    id: u64,
}

/// Accepts both the current field names and the legacy ones
/// (`name`, `data`, `msgId`).
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireMessageIn {
    #[serde(default)]
    sender: Option<String>,
    #[serde(default)]
    sending_method: Option<String>,
    #[serde(alias = "name")]
    target: String,
    method: String,
    #[serde(default, alias = "data")]
    args: Option<Vec<serde_json::Value>>,
    #[serde(default, alias = "msgId")]
    id: u64,
}

// ---------------------------------------------------------------------------
// Value <-> JSON
// ---------------------------------------------------------------------------

/// Converts an argument value to JSON.
///
/// # Errors
///
/// Fails for non-finite floats and timestamps outside the representable range.
pub fn value_to_json(value: &Value) -> Result<serde_json::Value, CodecError> {
    Ok(match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Char(c) => serde_json::Value::String(c.to_string()),
        Value::Int(i) => serde_json::Value::Number((*i).into()),
        Value::Float(f) => Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .ok_or(CodecError::NonFiniteFloat(*f))?,
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Listener(l) => serde_json::to_value(l)?,
        Value::Timestamp(ms) => serde_json::Value::String(
            format_timestamp(*ms).ok_or(CodecError::TimestampOutOfRange(*ms))?,
        ),
        Value::Bytes(bytes) => serde_json::Value::Array(
            bytes.iter().map(|b| serde_json::Value::from(*b)).collect(),
        ),
        Value::Array(items) => serde_json::Value::Array(
            items.iter().map(value_to_json).collect::<Result<_, _>>()?,
        ),
        Value::Map(fields) | Value::Object { fields, .. } => {
            let mut map = Map::with_capacity(fields.len());
            for (key, field) in fields {
                map.insert(key.clone(), value_to_json(field)?);
            }
            serde_json::Value::Object(map)
        }
    })
}

/// Converts JSON back into an argument value. Integers that fit in `i64` stay
/// integers; objects with exactly the listener fields become listeners.
#[must_use]
pub fn value_from_json(json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(items) => {
            Value::Array(items.into_iter().map(value_from_json).collect())
        }
        serde_json::Value::Object(map) => {
            if is_listener_shape(&map) {
                if let Ok(listener) =
                    serde_json::from_value::<Listener>(serde_json::Value::Object(map.clone()))
                {
                    return Value::Listener(listener);
                }
            }
            Value::Map(
                map.into_iter()
                    .map(|(k, v)| (k, value_from_json(v)))
                    .collect(),
            )
        }
    }
}

fn is_listener_shape(map: &Map<String, serde_json::Value>) -> bool {
    map.len() == LISTENER_FIELDS.len()
        && LISTENER_FIELDS
            .iter()
            .all(|field| map.get(*field).is_some_and(serde_json::Value::is_string))
}

// ---------------------------------------------------------------------------
// Message encoding
// ---------------------------------------------------------------------------

/// Encodes a message as JSON text.
///
/// # Errors
///
/// Fails if any argument has no JSON representation.
pub fn encode_message(msg: &Message, pretty: bool) -> Result<String, CodecError> {
    let wire = WireMessageOut {
        sender: &msg.sender,
        sending_method: &msg.sending_method,
        target: &msg.target,
        method: &msg.method,
        args: msg.args.iter().map(value_to_json).collect::<Result<_, _>>()?,
        id: msg.id,
    };
    to_string(&wire, pretty)
}

/// Decodes JSON text into a message. A null or missing argument list decodes
/// as no arguments.
///
/// # Errors
///
/// Fails on malformed JSON or when `target`/`method` are missing.
pub fn decode_message(payload: &str) -> Result<Message, CodecError> {
    let wire: WireMessageIn = serde_json::from_str(payload)?;
    Ok(Message {
        sender: wire.sender.unwrap_or_default(),
        sending_method: wire.sending_method.unwrap_or_default(),
        target: wire.target,
        method: wire.method,
        args: wire
            .args
            .unwrap_or_default()
            .into_iter()
            .map(value_from_json)
            .collect(),
        id: wire.id,
    })
}

// ---------------------------------------------------------------------------
// Generic helpers
// ---------------------------------------------------------------------------

pub(crate) fn to_string<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<String, CodecError> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(text)
}

pub(crate) fn to_writer<W: Write, T: Serialize + ?Sized>(
    out: W,
    value: &T,
    pretty: bool,
) -> Result<(), CodecError> {
    if pretty {
        serde_json::to_writer_pretty(out, value)?;
    } else {
        serde_json::to_writer(out, value)?;
    }
    Ok(())
}

/// Deserializes any JSON document into `T`.
///
/// # Errors
///
/// Fails on malformed JSON or a shape mismatch with `T`.
pub fn from_json<T: DeserializeOwned>(text: &str) -> Result<T, CodecError> {
    Ok(serde_json::from_str(text)?)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn servo_move() -> Message {
        Message::new("servo01", "moveTo", vec![Value::Int(90), Value::Float(0.5)])
            .with_sender("python", "exec")
            .with_id(7)
    }

    #[test]
    fn compact_output_uses_current_field_names() {
        let text = encode_message(&servo_move(), false).unwrap();
        assert_eq!(
            text,
            r#"{"sender":"python","sendingMethod":"exec","target":"servo01","method":"moveTo","args":[90,0.5],"id":7}"#
        );
    }

    #[test]
    fn pretty_output_is_indented() {
        let text = encode_message(&servo_move(), true).unwrap();
        assert!(text.contains('\n'));
        assert!(text.contains("  \"target\": \"servo01\""));
    }

    #[test]
    fn no_escaping_beyond_json_requirements() {
        let msg = Message::new("web", "load", vec!["http://host/a?b=c&d=<e>".into()]);
        let text = encode_message(&msg, false).unwrap();
        assert!(text.contains("http://host/a?b=c&d=<e>"));
        assert!(!text.contains("\\/"));
        assert!(!text.contains("\\u003d"));
    }

    #[test]
    fn decode_legacy_field_names() {
        let payload = r#"{"sender":null,"name":"servo01","method":"moveTo","data":["10"],"msgId":99}"#;
        let msg = decode_message(payload).unwrap();
        assert_eq!(msg.target, "servo01");
        assert_eq!(msg.args, vec![Value::String("10".into())]);
        assert_eq!(msg.id, 99);
        assert!(msg.sender.is_empty());
    }

    #[test]
    fn decode_null_args_as_empty() {
        let msg = decode_message(r#"{"target":"t","method":"m","args":null}"#).unwrap();
        assert!(msg.args.is_empty());
    }

    #[test]
    fn decode_missing_method_fails() {
        assert!(matches!(
            decode_message(r#"{"target":"t"}"#),
            Err(CodecError::Json(_))
        ));
    }

    #[test]
    fn decode_truncated_fails() {
        assert!(decode_message(r#"{"target":"t","method":"#).is_err());
    }

    #[test]
    fn lossy_values_round_trip_as_json_shapes() {
        let msg = Message::new(
            "gui",
            "show",
            vec![
                Value::Char('x'),
                Value::Timestamp(0),
                Value::Null,
                Value::Object {
                    type_name: "org.example.Point".into(),
                    fields: BTreeMap::from([("x".to_string(), Value::Int(1))]),
                },
            ],
        );
        let decoded = decode_message(&encode_message(&msg, false).unwrap()).unwrap();
        assert_eq!(
            decoded.args,
            vec![
                Value::String("x".into()),
                Value::String("1970-01-01 00:00:00.000".into()),
                Value::Null,
                Value::Map(BTreeMap::from([("x".to_string(), Value::Int(1))])),
            ]
        );
    }

    #[test]
    fn listener_shape_recovered() {
        let listener = Listener::new("publishState", "gui", "onState");
        let json = value_to_json(&Value::Listener(listener.clone())).unwrap();
        assert_eq!(value_from_json(json), Value::Listener(listener));
    }

    #[test]
    fn non_finite_float_rejected() {
        let msg = Message::new("t", "m", vec![Value::Float(f64::NAN)]);
        assert!(matches!(
            encode_message(&msg, false),
            Err(CodecError::NonFiniteFloat(_))
        ));
    }

    #[test]
    fn generic_from_json() {
        let v: Vec<u32> = from_json("[1,2,3]").unwrap();
        assert_eq!(v, vec![1, 2, 3]);
    }
}
