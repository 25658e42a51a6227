//! Conversion between [`Message`] values and their wire representations.
//!
//! Three formats are built in:
//!
//! 1. **JSON** (`json`): structured text, pretty or compact per [`CodecConfig`].
//! 2. **Binary envelope** (`envelope`): named `MsgPack` wrapped in base64,
//!    optionally prefixed with `base64://`. Lossless.
//! 3. **Invocation path** (`uri`): `/api/{key}/{service}/{method}/{args}...`,
//!    lossy; arguments come back as text.
//!
//! Failures never unwind into the caller. Every operation has a `try_*` form
//! returning [`CodecError`], and a plain form that logs the failure and
//! returns `None`.

pub mod config;
pub mod envelope;
pub mod json;
pub mod uri;

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwap;
use serde::Serialize;

pub use config::CodecConfig;
pub use json::from_json;
pub use uri::LossyCall;

use crate::message::Message;
use crate::mime::MIME_TYPE_JSON;
use crate::signature::message_type_key;

/// Media type older peers send for JSON bodies.
pub const LEGACY_MIME_TYPE_JSON: &str = "application/javascript";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from encoding or decoding a payload.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("binary encode failed: {0}")]
    BinaryEncode(#[from] rmp_serde::encode::Error),
    #[error("binary decode failed: {0}")]
    BinaryDecode(#[from] rmp_serde::decode::Error),
    #[error("non-finite float {0} has no JSON representation")]
    NonFiniteFloat(f64),
    #[error("timestamp {0}ms is out of range")]
    TimestampOutOfRange(i64),
    #[error("argument {index} cannot be carried in a path: {reason}")]
    UnencodableArgument { index: usize, reason: &'static str },
    #[error("malformed invocation path: {0}")]
    MalformedPath(String),
    #[error("unsupported mime type: {0}")]
    UnsupportedMimeType(String),
    #[error("unknown wire format: {0}")]
    UnknownFormat(String),
    #[error("payload format could not be detected")]
    UndetectedFormat,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// WireFormat
// ---------------------------------------------------------------------------

/// A named wire encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireFormat {
    Json,
    Base64,
    Uri,
}

impl WireFormat {
    /// Scheme name used on the command line and in logs.
    #[must_use]
    pub fn scheme(self) -> &'static str {
        match self {
            WireFormat::Json => "json",
            WireFormat::Base64 => envelope::SCHEME,
            WireFormat::Uri => uri::SCHEME,
        }
    }

    /// Guesses the format of an inbound payload: `base64://` marks an
    /// envelope, `{` a JSON object, `/` an invocation path.
    #[must_use]
    pub fn detect(payload: &str) -> Option<WireFormat> {
        let trimmed = payload.trim_start();
        if trimmed.starts_with(envelope::PREFIX) {
            Some(WireFormat::Base64)
        } else if trimmed.starts_with('{') {
            Some(WireFormat::Json)
        } else if trimmed.starts_with('/') {
            Some(WireFormat::Uri)
        } else {
            None
        }
    }
}

impl fmt::Display for WireFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.scheme())
    }
}

impl FromStr for WireFormat {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(WireFormat::Json),
            "base64" => Ok(WireFormat::Base64),
            "uri" => Ok(WireFormat::Uri),
            other => Err(CodecError::UnknownFormat(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Codec
// ---------------------------------------------------------------------------

/// Encoder/decoder holding its own [`CodecConfig`].
///
/// The configuration sits behind an `ArcSwap`: reads are wait-free and a
/// reconfiguration is visible to every subsequent call. Callers that need a
/// fixed layout while others toggle the shared instance should own a
/// separate `Codec`.
#[derive(Debug)]
pub struct Codec {
    config: ArcSwap<CodecConfig>,
}

impl Codec {
    #[must_use]
    pub fn new(config: CodecConfig) -> Self {
        Self {
            config: ArcSwap::from_pointee(config),
        }
    }

    /// The process-wide instance, created with [`CodecConfig::default`] on
    /// first use. It lives for the rest of the process; change its layout
    /// with [`Codec::reconfigure`] or [`Codec::set_pretty_printing`].
    pub fn shared() -> &'static Codec {
        static SHARED: OnceLock<Codec> = OnceLock::new();
        SHARED.get_or_init(Codec::default)
    }

    /// Snapshot of the current configuration.
    #[must_use]
    pub fn config(&self) -> Arc<CodecConfig> {
        self.config.load_full()
    }

    /// Replaces the configuration for all subsequent calls.
    pub fn reconfigure(&self, config: CodecConfig) {
        tracing::debug!(?config, "codec reconfigured");
        self.config.store(Arc::new(config));
    }

    /// Toggles pretty printing and returns the new setting.
    pub fn set_pretty_printing(&self, pretty: bool) -> bool {
        self.config.rcu(|current| CodecConfig {
            pretty_print: pretty,
            ..**current
        });
        pretty
    }

    // ---- messages ----

    /// Encodes `msg` in `format`.
    ///
    /// # Errors
    ///
    /// Fails if the message contains data the format cannot represent.
    pub fn try_encode(&self, msg: &Message, format: WireFormat) -> Result<String, CodecError> {
        let config = self.config.load();
        match format {
            WireFormat::Json => json::encode_message(msg, config.pretty_print),
            WireFormat::Base64 => envelope::encode(msg, config.envelope_prefix),
            WireFormat::Uri => uri::encode(msg),
        }
    }

    /// Like [`Codec::try_encode`], but logs the failure with the message's
    /// type key and returns `None`.
    pub fn encode(&self, msg: &Message, format: WireFormat) -> Option<String> {
        match self.try_encode(msg, format) {
            Ok(text) => Some(text),
            Err(err) => {
                tracing::error!(
                    message = %message_type_key(msg),
                    format = %format,
                    error = %err,
                    "failed to encode message"
                );
                None
            }
        }
    }

    /// Decodes a `format` payload into a message.
    ///
    /// # Errors
    ///
    /// Fails on malformed or truncated payloads.
    pub fn try_decode(&self, payload: &str, format: WireFormat) -> Result<Message, CodecError> {
        match format {
            WireFormat::Json => json::decode_message(payload),
            WireFormat::Base64 => envelope::decode(payload),
            WireFormat::Uri => uri::parse_path(payload).map(LossyCall::into_message),
        }
    }

    /// Like [`Codec::try_decode`], but logs the failure and returns `None`.
    pub fn decode(&self, payload: &str, format: WireFormat) -> Option<Message> {
        match self.try_decode(payload, format) {
            Ok(msg) => Some(msg),
            Err(err) => {
                tracing::error!(
                    format = %format,
                    payload_len = payload.len(),
                    error = %err,
                    "failed to decode message"
                );
                None
            }
        }
    }

    /// Decodes a payload whose format is inferred with [`WireFormat::detect`].
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::UndetectedFormat`] when no format matches, or the
    /// decode error of the detected format.
    pub fn try_decode_detected(&self, payload: &str) -> Result<Message, CodecError> {
        let format = WireFormat::detect(payload).ok_or(CodecError::UndetectedFormat)?;
        self.try_decode(payload, format)
    }

    // ---- arbitrary values ----

    /// Serializes any value as JSON in the configured layout.
    ///
    /// # Errors
    ///
    /// Fails if `value`'s `Serialize` impl fails.
    pub fn to_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<String, CodecError> {
        json::to_string(value, self.config.load().pretty_print)
    }

    /// Writes `value` to `out` in the given media type. Only JSON (including
    /// the legacy `application/javascript` type) is supported.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::UnsupportedMimeType`] for other media types, or
    /// the serialization/I/O error.
    pub fn write<W: Write, T: Serialize + ?Sized>(
        &self,
        mime_type: &str,
        out: W,
        value: &T,
    ) -> Result<(), CodecError> {
        if mime_type != MIME_TYPE_JSON && mime_type != LEGACY_MIME_TYPE_JSON {
            return Err(CodecError::UnsupportedMimeType(mime_type.to_string()));
        }
        json::to_writer(out, value, self.config.load().pretty_print)
    }

    /// Writes `value` as JSON to the file at `path`, replacing its contents.
    ///
    /// # Errors
    ///
    /// Fails on I/O or serialization errors.
    pub fn to_json_file<T: Serialize + ?Sized>(
        &self,
        value: &T,
        path: impl AsRef<Path>,
    ) -> Result<(), CodecError> {
        let mut out = BufWriter::new(File::create(path)?);
        self.write(MIME_TYPE_JSON, &mut out, value)?;
        out.flush()?;
        Ok(())
    }
}

impl Default for Codec {
    fn default() -> Self {
        Self::new(CodecConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::value::Value;

    fn sample() -> Message {
        Message::new("servo01", "moveTo", vec![Value::Int(90)])
            .with_sender("python", "exec")
            .with_id(5)
    }

    // ---- WireFormat ----

    #[test]
    fn format_detection() {
        assert_eq!(WireFormat::detect("base64://AAAA"), Some(WireFormat::Base64));
        assert_eq!(WireFormat::detect("  {\"a\":1}"), Some(WireFormat::Json));
        assert_eq!(WireFormat::detect("/api/messages/x/y"), Some(WireFormat::Uri));
        assert_eq!(WireFormat::detect("AAAA"), None);
    }

    #[test]
    fn format_parses_from_scheme() {
        for format in [WireFormat::Json, WireFormat::Base64, WireFormat::Uri] {
            assert_eq!(format.scheme().parse::<WireFormat>().unwrap(), format);
        }
        assert_eq!("JSON".parse::<WireFormat>().unwrap(), WireFormat::Json);
        assert!(matches!(
            "xml".parse::<WireFormat>(),
            Err(CodecError::UnknownFormat(_))
        ));
    }

    // ---- configuration ----

    #[test]
    fn pretty_toggle_affects_subsequent_encodes() {
        let codec = Codec::default();
        let pretty = codec.encode(&sample(), WireFormat::Json).unwrap();
        assert!(pretty.contains('\n'));

        assert!(!codec.set_pretty_printing(false));
        let compact = codec.encode(&sample(), WireFormat::Json).unwrap();
        assert!(!compact.contains('\n'));
        assert!(codec.config().envelope_prefix);
    }

    #[test]
    fn reconfigure_envelope_prefix() {
        let codec = Codec::default();
        assert!(codec
            .encode(&sample(), WireFormat::Base64)
            .unwrap()
            .starts_with(envelope::PREFIX));

        codec.reconfigure(CodecConfig {
            pretty_print: false,
            envelope_prefix: false,
        });
        let bare = codec.encode(&sample(), WireFormat::Base64).unwrap();
        assert!(!bare.starts_with(envelope::PREFIX));
        assert_eq!(codec.decode(&bare, WireFormat::Base64), Some(sample()));
    }

    #[test]
    fn instances_do_not_share_configuration() {
        let a = Codec::new(CodecConfig::default());
        let b = Codec::new(CodecConfig::default());
        a.set_pretty_printing(false);
        assert!(!a.config().pretty_print);
        assert!(b.config().pretty_print);
    }

    #[test]
    fn shared_instance_is_singleton() {
        assert!(std::ptr::eq(Codec::shared(), Codec::shared()));
    }

    // ---- encode / decode ----

    #[test]
    fn envelope_round_trip_through_codec() {
        let codec = Codec::default();
        let text = codec.encode(&sample(), WireFormat::Base64).unwrap();
        assert_eq!(codec.decode(&text, WireFormat::Base64), Some(sample()));
        assert_eq!(codec.try_decode_detected(&text).unwrap(), sample());
    }

    #[test]
    fn json_round_trip_of_simple_args() {
        let codec = Codec::default();
        let msg = Message::new("t", "m", vec!["a".into(), 1.into(), true.into(), Value::Null])
            .with_sender("s", "sm")
            .with_id(3);
        let text = codec.encode(&msg, WireFormat::Json).unwrap();
        assert_eq!(codec.decode(&text, WireFormat::Json), Some(msg));
    }

    #[test]
    fn uri_decode_produces_text_args() {
        let codec = Codec::default();
        let msg = codec
            .decode("/api/messages/servo01/moveTo/90", WireFormat::Uri)
            .unwrap();
        assert_eq!(msg.target, "servo01");
        assert_eq!(msg.args, vec![Value::from("90")]);
    }

    #[test]
    fn malformed_payloads_decode_to_none() {
        let codec = Codec::default();
        assert!(codec.decode("{not json", WireFormat::Json).is_none());
        assert!(codec.decode("base64://@@@", WireFormat::Base64).is_none());
        assert!(codec.decode("base64://AAAA", WireFormat::Base64).is_none());
        assert!(codec.decode("/only-one-segment", WireFormat::Uri).is_none());
        assert!(matches!(
            codec.try_decode_detected("garbage"),
            Err(CodecError::UndetectedFormat)
        ));
    }

    #[test]
    fn unencodable_message_encodes_to_none() {
        let codec = Codec::default();
        let msg = Message::new("t", "m", vec![Value::Float(f64::INFINITY)]);
        assert!(codec.encode(&msg, WireFormat::Json).is_none());
        assert!(codec.encode(&msg, WireFormat::Base64).is_some());
    }

    // ---- arbitrary values ----

    #[test]
    fn write_rejects_non_json_mime() {
        let codec = Codec::default();
        let mut out = Vec::new();
        assert!(matches!(
            codec.write("text/xml", &mut out, &1),
            Err(CodecError::UnsupportedMimeType(_))
        ));
        codec.write(LEGACY_MIME_TYPE_JSON, &mut out, &[1, 2]).unwrap();
        assert!(!out.is_empty());
    }

    #[test]
    fn to_json_respects_layout() {
        let codec = Codec::new(CodecConfig {
            pretty_print: false,
            envelope_prefix: true,
        });
        let map = BTreeMap::from([("path", "a/b")]);
        assert_eq!(codec.to_json(&map).unwrap(), r#"{"path":"a/b"}"#);
    }

    #[test]
    fn to_json_file_writes_document() {
        let codec = Codec::default();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        codec.to_json_file(&vec!["servo01", "servo02"], &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let names: Vec<String> = from_json(&text).unwrap();
        assert_eq!(names, vec!["servo01", "servo02"]);
    }
}
