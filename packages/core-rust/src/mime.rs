//! Process-wide lookup from an API area key to a media type.
//!
//! The table is built once on first access and never mutated afterwards.

use std::collections::HashMap;
use std::sync::OnceLock;

pub const MIME_TYPE_JSON: &str = "application/json";

/// API area keys.
pub mod keys {
    pub const MESSAGES: &str = "messages";
    pub const SERVICES: &str = "services";
}

static REGISTRY: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();

fn registry() -> &'static HashMap<&'static str, &'static str> {
    REGISTRY.get_or_init(|| {
        tracing::debug!("initializing mime type registry");
        HashMap::from([
            (keys::MESSAGES, MIME_TYPE_JSON),
            (keys::SERVICES, MIME_TYPE_JSON),
        ])
    })
}

/// Builds the registry if it has not been built yet. Safe to call from many
/// threads at once; exactly one of them performs the initialization.
pub fn init() {
    registry();
}

/// Media type registered for `key`, or [`MIME_TYPE_JSON`] for unknown keys.
#[must_use]
pub fn mime_type_for(key: &str) -> &'static str {
    registry().get(key).copied().unwrap_or(MIME_TYPE_JSON)
}

/// Whether `key` has an explicit registration.
#[must_use]
pub fn is_registered(key: &str) -> bool {
    registry().contains_key(key)
}
