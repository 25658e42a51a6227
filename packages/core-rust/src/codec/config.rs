//! Codec configuration.

/// Formatting options held by a [`Codec`](super::Codec).
///
/// Reconfiguring a codec replaces the whole value; encodes already in flight
/// finish with the configuration they started with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecConfig {
    /// Indent structured text output.
    pub pretty_print: bool,
    /// Prefix binary envelopes with the `base64://` scheme marker.
    pub envelope_prefix: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            pretty_print: true,
            envelope_prefix: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codec_config_defaults() {
        let config = CodecConfig::default();
        assert!(config.pretty_print);
        assert!(config.envelope_prefix);
    }
}
