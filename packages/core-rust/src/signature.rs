//! Stable textual identities for argument lists and messages.
//!
//! Used as log context and as deduplication/grouping keys. Only simple values
//! are rendered verbatim; anything else contributes its short type name so
//! large or sensitive object graphs never end up in a key.

use crate::message::Message;
use crate::value::Value;

/// Renders `args` as a comma-joined signature.
///
/// ```
/// use mrl_core::signature::parameter_signature;
/// use mrl_core::Value;
///
/// assert_eq!(parameter_signature(&[]), "");
/// assert_eq!(parameter_signature(&[Value::Null]), "null");
/// assert_eq!(
///     parameter_signature(&["a".into(), 1.into(), true.into()]),
///     "a,1,true"
/// );
/// ```
#[must_use]
pub fn parameter_signature(args: &[Value]) -> String {
    let mut out = String::new();
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        match arg {
            Value::Null => out.push_str("null"),
            other => match other.simple_text() {
                Some(text) => out.push_str(&text),
                None => out.push_str(other.short_type_name()),
            },
        }
    }
    out
}

/// Identifies a class of message, ignoring its id:
/// `"{sender}.{sendingMethod} --> {target}.{method}({signature})"`.
#[must_use]
pub fn message_type_key(msg: &Message) -> String {
    format!(
        "{}.{} --> {}.{}({})",
        msg.sender,
        msg.sending_method,
        msg.target,
        msg.method,
        parameter_signature(&msg.args)
    )
}

/// Identifies one message instance: [`message_type_key`] followed by `" - {id}"`.
#[must_use]
pub fn message_key(msg: &Message) -> String {
    format!("{} - {}", message_type_key(msg), msg.id)
}
