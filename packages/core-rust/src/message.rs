//! The canonical invocation/event record exchanged between services.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Seeds message ids from wall-clock millis so ids from one process run
/// rarely collide with a previous run's.
fn id_counter() -> &'static AtomicU64 {
    static COUNTER: OnceLock<AtomicU64> = OnceLock::new();
    COUNTER.get_or_init(|| {
        let seed = u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0);
        AtomicU64::new(seed)
    })
}

/// Returns an id unique within this process.
#[must_use]
pub fn next_message_id() -> u64 {
    id_counter().fetch_add(1, Ordering::Relaxed)
}

/// A single invocation request or event.
///
/// `args` are matched positionally to the target method's parameters and
/// their order never changes once the message is built. Collaborators treat a
/// `Message` as immutable once it has been handed to a codec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Name of the originating service.
    pub sender: String,
    /// Method on the sender that produced this message.
    pub sending_method: String,
    /// Name of the destination service.
    pub target: String,
    /// Method to invoke on the target.
    pub method: String,
    pub args: Vec<Value>,
    /// Unique within the originating process; not globally unique.
    pub id: u64,
}

impl Message {
    /// Creates a message addressed to `target.method(args)` with a fresh id
    /// and no sender.
    #[must_use]
    pub fn new(target: impl Into<String>, method: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            sender: String::new(),
            sending_method: String::new(),
            target: target.into(),
            method: method.into(),
            args,
            id: next_message_id(),
        }
    }

    /// Sets the originating service and method.
    #[must_use]
    pub fn with_sender(
        mut self,
        sender: impl Into<String>,
        sending_method: impl Into<String>,
    ) -> Self {
        self.sender = sender.into();
        self.sending_method = sending_method.into();
        self
    }

    /// Overrides the generated id, e.g. when replaying a recorded message.
    #[must_use]
    pub fn with_id(mut self, id: u64) -> Self {
        self.id = id;
        self
    }

    /// Number of positional arguments.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.args.len()
    }
}
