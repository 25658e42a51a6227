//! The operation directory: which methods each service type exposes.
//!
//! The resolver never inspects services itself; it asks an
//! [`OperationDirectory`]. [`StaticDirectory`] is the built-in implementation,
//! filled by explicit registration (in code via [`Capabilities`], or from a
//! JSON document via [`StaticDirectory::from_json`]).

use std::collections::HashMap;

use mrl_core::naming::{qualify_type_name, DEFAULT_SERVICE_NAMESPACE};
use parking_lot::RwLock;
use serde::Deserialize;

use crate::descriptor::{MethodDescriptor, ParamType};

/// Errors reported by an operation directory.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnumerationError {
    #[error("unknown service type: {0}")]
    UnknownType(String),
    #[error("operation directory unavailable for {service_type}: {reason}")]
    Unavailable { service_type: String, reason: String },
    #[error("invalid directory document: {0}")]
    InvalidDocument(String),
}

/// Source of the operations a service type exposes.
pub trait OperationDirectory: Send + Sync {
    /// Lists every public operation of `service_type`, in a stable order.
    ///
    /// # Errors
    ///
    /// Returns [`EnumerationError`] if the type is unknown or the directory
    /// cannot be consulted.
    fn enumerate_operations(
        &self,
        service_type: &str,
    ) -> Result<Vec<MethodDescriptor>, EnumerationError>;
}

impl<F> OperationDirectory for F
where
    F: Fn(&str) -> Result<Vec<MethodDescriptor>, EnumerationError> + Send + Sync,
{
    fn enumerate_operations(
        &self,
        service_type: &str,
    ) -> Result<Vec<MethodDescriptor>, EnumerationError> {
        self(service_type)
    }
}

// ---------------------------------------------------------------------------
// Capabilities
// ---------------------------------------------------------------------------

/// Builder for the capability list of one service type.
///
/// ```
/// use mrl_service::directory::{Capabilities, StaticDirectory};
/// use mrl_service::descriptor::ParamType;
///
/// let directory = StaticDirectory::new();
/// directory.register_capabilities(
///     Capabilities::new("org.myrobotlab.service.Servo")
///         .method("moveTo", [ParamType::int()])
///         .method("detach", []),
/// );
/// assert_eq!(directory.service_types(), vec!["org.myrobotlab.service.Servo"]);
/// ```
#[derive(Debug, Clone)]
pub struct Capabilities {
    service_type: String,
    methods: Vec<MethodDescriptor>,
}

impl Capabilities {
    #[must_use]
    pub fn new(service_type: impl Into<String>) -> Self {
        Self {
            service_type: service_type.into(),
            methods: Vec::new(),
        }
    }

    /// Adds an operation. Declaration order is the enumeration order.
    #[must_use]
    pub fn method(
        mut self,
        name: impl Into<String>,
        params: impl IntoIterator<Item = ParamType>,
    ) -> Self {
        self.methods
            .push(MethodDescriptor::new(self.service_type.clone(), name, params));
        self
    }

    #[must_use]
    pub fn service_type(&self) -> &str {
        &self.service_type
    }

    #[must_use]
    pub fn into_methods(self) -> Vec<MethodDescriptor> {
        self.methods
    }
}

// ---------------------------------------------------------------------------
// StaticDirectory
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct OperationEntry {
    name: String,
    #[serde(default)]
    params: Vec<String>,
}

/// Registration-based directory.
///
/// Type names are qualified with the directory's namespace on registration
/// and on lookup, so `"Servo"` and `"org.myrobotlab.service.Servo"` name the
/// same type. Registrations normally happen once at startup, before the first
/// lookup; later registrations are not seen by a resolver that already cached
/// the type.
#[derive(Debug)]
pub struct StaticDirectory {
    namespace: String,
    types: RwLock<HashMap<String, Vec<MethodDescriptor>>>,
}

impl Default for StaticDirectory {
    fn default() -> Self {
        Self::with_namespace(DEFAULT_SERVICE_NAMESPACE)
    }
}

impl StaticDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty directory qualifying bare type names with `namespace`.
    #[must_use]
    pub fn with_namespace(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            types: RwLock::new(HashMap::new()),
        }
    }

    /// Builds a directory from a JSON document of the form
    /// `{"Servo": [{"name": "moveTo", "params": ["i32"]}, ...], ...}`.
    ///
    /// # Errors
    ///
    /// Returns [`EnumerationError::InvalidDocument`] if the document does not
    /// have that shape.
    pub fn from_json(text: &str) -> Result<Self, EnumerationError> {
        let directory = Self::new();
        directory.extend_from_json(text)?;
        Ok(directory)
    }

    /// Registers every type in a JSON document (see
    /// [`StaticDirectory::from_json`]).
    ///
    /// # Errors
    ///
    /// Returns [`EnumerationError::InvalidDocument`] if the document does not
    /// have that shape. Nothing is registered in that case.
    pub fn extend_from_json(&self, text: &str) -> Result<(), EnumerationError> {
        let doc: HashMap<String, Vec<OperationEntry>> = mrl_core::codec::from_json(text)
            .map_err(|err| EnumerationError::InvalidDocument(err.to_string()))?;
        for (service_type, ops) in doc {
            let mut caps = Capabilities::new(service_type);
            for op in ops {
                caps = caps.method(op.name, op.params.into_iter().map(ParamType::new));
            }
            self.register_capabilities(caps);
        }
        Ok(())
    }

    /// Canonical name of `service_type`. Empty names are kept as given.
    fn qualify(&self, service_type: &str) -> String {
        qualify_type_name(service_type, &self.namespace)
            .unwrap_or_else(|_| service_type.to_string())
    }

    /// Appends `methods` to the operations of `service_type`. Method owners
    /// are qualified the same way as the type name.
    pub fn register(
        &self,
        service_type: impl AsRef<str>,
        methods: impl IntoIterator<Item = MethodDescriptor>,
    ) {
        let service_type = self.qualify(service_type.as_ref());
        let methods: Vec<MethodDescriptor> = methods
            .into_iter()
            .map(|mut method| {
                method.owner = self.qualify(&method.owner);
                method
            })
            .collect();
        self.types
            .write()
            .entry(service_type)
            .or_default()
            .extend(methods);
    }

    pub fn register_capabilities(&self, capabilities: Capabilities) {
        let service_type = capabilities.service_type().to_string();
        self.register(service_type, capabilities.into_methods());
    }

    /// Registered service types, qualified and sorted.
    #[must_use]
    pub fn service_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.types.read().keys().cloned().collect();
        types.sort();
        types
    }
}

impl OperationDirectory for StaticDirectory {
    fn enumerate_operations(
        &self,
        service_type: &str,
    ) -> Result<Vec<MethodDescriptor>, EnumerationError> {
        let service_type = self.qualify(service_type);
        self.types
            .read()
            .get(&service_type)
            .cloned()
            .ok_or(EnumerationError::UnknownType(service_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::ParamKind;

    const SERVO: &str = "org.myrobotlab.service.Servo";

    #[test]
    fn capabilities_preserve_declaration_order() {
        let dir = StaticDirectory::new();
        dir.register_capabilities(
            Capabilities::new(SERVO)
                .method("moveTo", [ParamType::int()])
                .method("moveTo", [ParamType::double()])
                .method("detach", []),
        );
        let ops = dir.enumerate_operations(SERVO).unwrap();
        let names: Vec<String> = ops.iter().map(ToString::to_string).collect();
        assert_eq!(
            names,
            vec![
                "org.myrobotlab.service.Servo.moveTo(i32)",
                "org.myrobotlab.service.Servo.moveTo(f64)",
                "org.myrobotlab.service.Servo.detach()",
            ]
        );
        assert!(ops.iter().all(|op| op.owner == SERVO));
    }

    #[test]
    fn register_appends() {
        let dir = StaticDirectory::new();
        dir.register(SERVO, [MethodDescriptor::new(SERVO, "attach", [])]);
        dir.register(SERVO, [MethodDescriptor::new(SERVO, "detach", [])]);
        assert_eq!(dir.enumerate_operations(SERVO).unwrap().len(), 2);
    }

    #[test]
    fn bare_names_are_qualified_on_registration() {
        let dir = StaticDirectory::new();
        dir.register_capabilities(Capabilities::new("Servo").method("moveTo", [ParamType::int()]));

        assert_eq!(dir.service_types(), vec![SERVO]);
        let bare = dir.enumerate_operations("Servo").unwrap();
        let full = dir.enumerate_operations(SERVO).unwrap();
        assert_eq!(bare, full);
        assert_eq!(full[0].owner, SERVO);
    }

    #[test]
    fn custom_namespace() {
        let dir = StaticDirectory::with_namespace("org.example");
        dir.extend_from_json(r#"{"Arm": [{"name": "wave"}]}"#).unwrap();
        assert_eq!(dir.service_types(), vec!["org.example.Arm"]);
        assert_eq!(dir.enumerate_operations("Arm").unwrap()[0].owner, "org.example.Arm");
    }

    #[test]
    fn unknown_type_is_an_error() {
        let dir = StaticDirectory::new();
        assert_eq!(
            dir.enumerate_operations("org.example.Missing"),
            Err(EnumerationError::UnknownType("org.example.Missing".into()))
        );
    }

    #[test]
    fn from_json_document() {
        let dir = StaticDirectory::from_json(
            r#"{
                "org.myrobotlab.service.Servo": [
                    {"name": "moveTo", "params": ["i32"]},
                    {"name": "setPose", "params": ["org.example.Pose", "f64"]},
                    {"name": "detach"}
                ]
            }"#,
        )
        .unwrap();
        let ops = dir.enumerate_operations(SERVO).unwrap();
        assert_eq!(ops.len(), 3);
        assert_eq!(ops[1].params[0].kind(), ParamKind::Other);
        assert_eq!(ops[1].params[1].kind(), ParamKind::F64);
        assert_eq!(ops[2].arity(), 0);
    }

    #[test]
    fn from_json_rejects_wrong_shape() {
        assert!(matches!(
            StaticDirectory::from_json(r#"{"Servo": "moveTo"}"#),
            Err(EnumerationError::InvalidDocument(_))
        ));
    }

    #[test]
    fn closures_are_directories() {
        let dir = |service_type: &str| -> Result<Vec<MethodDescriptor>, EnumerationError> {
            Ok(vec![MethodDescriptor::new(service_type, "ping", [])])
        };
        let ops = dir.enumerate_operations("org.example.Echo").unwrap();
        assert_eq!(ops[0].owner, "org.example.Echo");
    }
}
