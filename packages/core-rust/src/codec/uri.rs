//! Lossy invocation paths: `/api/{key}/{service}/{method}/{arg}/{arg}...`.
//!
//! The `api/{key}` prefix is optional. Arguments travel as bare text, so every
//! decoded argument is a [`Value::String`]; the resolver coerces them to the
//! parameter types of whichever candidate method accepts them. Segments are
//! not percent-decoded.

use super::CodecError;
use crate::message::Message;
use crate::mime;
use crate::value::Value;

pub const SCHEME: &str = "uri";

/// First path segment introducing an API key.
pub const API_SEGMENT: &str = "api";

/// A call decoded from a lossy transport: names plus untyped argument text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LossyCall {
    /// API area key (`"messages"`, `"services"`, ...), if the path carried one.
    pub api_key: Option<String>,
    pub target: String,
    pub method: String,
    pub args: Vec<String>,
}

impl LossyCall {
    /// Media type the response to this call should use.
    #[must_use]
    pub fn mime_type(&self) -> &'static str {
        mime::mime_type_for(self.api_key.as_deref().unwrap_or(mime::keys::MESSAGES))
    }

    /// Number of positional arguments.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.args.len()
    }

    /// Wraps the call in a message with textual arguments and a fresh id.
    #[must_use]
    pub fn into_message(self) -> Message {
        Message::new(
            self.target,
            self.method,
            self.args.into_iter().map(Value::String).collect(),
        )
    }
}

/// Parses an invocation path. A query string, if any, is ignored.
///
/// # Errors
///
/// Returns [`CodecError::MalformedPath`] when the service or method segment is
/// missing or empty.
pub fn parse_path(path: &str) -> Result<LossyCall, CodecError> {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
    let mut segments = trimmed.split('/').peekable();

    let api_key = if segments.peek() == Some(&API_SEGMENT) {
        segments.next();
        Some(
            segments
                .next()
                .filter(|key| !key.is_empty())
                .ok_or_else(|| CodecError::MalformedPath(format!("{path}: missing api key")))?
                .to_string(),
        )
    } else {
        None
    };

    let target = segments
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| CodecError::MalformedPath(format!("{path}: missing service name")))?;
    let method = segments
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| CodecError::MalformedPath(format!("{path}: missing method name")))?;

    Ok(LossyCall {
        api_key,
        target: target.to_string(),
        method: method.to_string(),
        args: segments.map(str::to_string).collect(),
    })
}

/// Characters that end a path segment or the path itself.
const RESERVED: [char; 3] = ['/', '?', '#'];

fn is_segment_safe(text: &str) -> bool {
    !text.is_empty() && !text.contains(RESERVED)
}

/// Renders `msg` as an invocation path under the `messages` API key.
///
/// # Errors
///
/// Returns [`CodecError::MalformedPath`] if the target or method is empty or
/// contains `/`, `?` or `#`. Returns [`CodecError::UnencodableArgument`] for
/// arguments that are null, listeners, non-simple, empty, or contain one of
/// those characters.
pub fn encode(msg: &Message) -> Result<String, CodecError> {
    for (what, name) in [("service name", &msg.target), ("method name", &msg.method)] {
        if !is_segment_safe(name) {
            return Err(CodecError::MalformedPath(format!(
                "{what} {name:?} cannot be a path segment"
            )));
        }
    }
    let mut path = format!(
        "/{API_SEGMENT}/{}/{}/{}",
        mime::keys::MESSAGES,
        msg.target,
        msg.method
    );
    for (index, arg) in msg.args.iter().enumerate() {
        if matches!(arg, Value::Listener(_)) {
            return Err(CodecError::UnencodableArgument {
                index,
                reason: "listeners cannot travel in a path",
            });
        }
        let text = arg.simple_text().ok_or(CodecError::UnencodableArgument {
            index,
            reason: "only simple values can travel in a path",
        })?;
        if !is_segment_safe(&text) {
            return Err(CodecError::UnencodableArgument {
                index,
                reason: "text must be non-empty and free of '/', '?' and '#'",
            });
        }
        path.push('/');
        path.push_str(&text);
    }
    Ok(path)
}
