//! Binary envelope format: the whole message as named `MsgPack`
//! (`rmp_serde::to_vec_named()`), wrapped in standard base64 so it survives
//! text-only transports such as URL path segments.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use super::CodecError;
use crate::message::Message;

pub const SCHEME: &str = "base64";

/// Scheme marker optionally prepended to envelope text.
pub const PREFIX: &str = "base64://";

/// Encodes `msg`, with or without the [`PREFIX`] marker.
///
/// # Errors
///
/// Fails if the message cannot be serialized.
pub fn encode(msg: &Message, with_prefix: bool) -> Result<String, CodecError> {
    let bytes = rmp_serde::to_vec_named(msg)?;
    let text = STANDARD.encode(bytes);
    if with_prefix {
        Ok(format!("{PREFIX}{text}"))
    } else {
        Ok(text)
    }
}

/// Decodes envelope text. The [`PREFIX`] marker is stripped when present.
///
/// # Errors
///
/// Fails on invalid base64 or a malformed/truncated binary message.
pub fn decode(payload: &str) -> Result<Message, CodecError> {
    let trimmed = payload.trim();
    let data = trimmed.strip_prefix(PREFIX).unwrap_or(trimmed);
    let bytes = STANDARD.decode(data)?;
    Ok(rmp_serde::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::value::{Listener, Value};

    fn sample(args: Vec<Value>) -> Message {
        Message::new("servo01", "moveTo", args)
            .with_sender("python", "exec")
            .with_id(1234)
    }

    #[test]
    fn round_trip_reproduces_every_field() {
        let messages = vec![
            sample(vec![]),
            sample(vec![Value::Null]),
            sample(vec![
                "a".into(),
                1.into(),
                true.into(),
                'c'.into(),
                Value::Float(1.25),
                Value::Timestamp(1_700_000_000_000),
                Value::Bytes(vec![0, 255, 7]),
                Listener::new("publishState", "gui", "onState").into(),
                Value::Array(vec![Value::Null, Value::Int(-1)]),
                Value::Object {
                    type_name: "org.example.Pose".into(),
                    fields: BTreeMap::from([("yaw".to_string(), Value::Float(0.1))]),
                },
            ]),
        ];
        for msg in messages {
            for prefix in [true, false] {
                let text = encode(&msg, prefix).unwrap();
                assert_eq!(text.starts_with(PREFIX), prefix);
                assert_eq!(decode(&text).unwrap(), msg);
            }
        }
    }

    #[test]
    fn output_is_standard_alphabet() {
        let text = encode(&sample(vec![Value::Bytes(vec![0xfb; 64])]), false).unwrap();
        assert!(text
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '/' || c == '='));
    }

    #[test]
    fn invalid_base64_fails() {
        assert!(matches!(
            decode("base64://not*base64!"),
            Err(CodecError::Base64(_))
        ));
    }

    #[test]
    fn truncated_message_fails() {
        let text = encode(&sample(vec!["payload".into()]), false).unwrap();
        let bytes = STANDARD.decode(&text).unwrap();
        let truncated = STANDARD.encode(&bytes[..bytes.len() / 2]);
        assert!(matches!(
            decode(&truncated),
            Err(CodecError::BinaryDecode(_))
        ));
    }
}
