use mrl_core::naming::DEFAULT_SERVICE_NAMESPACE;

/// Configuration for the method registry.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Namespace prefixed onto bare service type names (e.g. `"Servo"`)
    /// before they are looked up in the operation directory. Empty disables
    /// qualification.
    pub default_namespace: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            default_namespace: DEFAULT_SERVICE_NAMESPACE.to_string(),
        }
    }
}
