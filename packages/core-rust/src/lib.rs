//! MRL Core: message model, naming transforms, signatures, MIME registry, and wire codecs.

pub mod codec;
pub mod message;
pub mod mime;
pub mod naming;
pub mod signature;
pub mod time;
pub mod value;

pub use codec::{Codec, CodecConfig, CodecError, LossyCall, WireFormat};
pub use message::Message;
pub use naming::{CaseMode, NamingError};
pub use signature::{message_key, message_type_key, parameter_signature};
pub use value::{Listener, Value};
