//! Method descriptors and the registry keys derived from them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Canonical type names for parameter types the resolver knows how to coerce.
pub mod type_names {
    pub const BOOL: &str = "bool";
    pub const CHAR: &str = "char";
    pub const I8: &str = "i8";
    pub const I16: &str = "i16";
    pub const I32: &str = "i32";
    pub const I64: &str = "i64";
    pub const F32: &str = "f32";
    pub const F64: &str = "f64";
    pub const STRING: &str = "String";
    pub const LISTENER: &str = "Listener";
    pub const TIMESTAMP: &str = "Timestamp";
}

/// Coercion category of a parameter type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamKind {
    Bool,
    Char,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    Text,
    Listener,
    Timestamp,
    /// Any other (structured) type.
    Other,
}

impl ParamKind {
    /// Kind for a canonical type name. Unknown names are [`ParamKind::Other`].
    #[must_use]
    pub fn from_type_name(type_name: &str) -> Self {
        match type_name {
            type_names::BOOL => ParamKind::Bool,
            type_names::CHAR => ParamKind::Char,
            type_names::I8 => ParamKind::I8,
            type_names::I16 => ParamKind::I16,
            type_names::I32 => ParamKind::I32,
            type_names::I64 => ParamKind::I64,
            type_names::F32 => ParamKind::F32,
            type_names::F64 => ParamKind::F64,
            type_names::STRING => ParamKind::Text,
            type_names::LISTENER => ParamKind::Listener,
            type_names::TIMESTAMP => ParamKind::Timestamp,
            _ => ParamKind::Other,
        }
    }

    /// Booleans, characters, numbers, text and listeners. Timestamps and
    /// structured types are not simple.
    #[must_use]
    pub fn is_simple(self) -> bool {
        !matches!(self, ParamKind::Timestamp | ParamKind::Other)
    }
}

/// Whether `type_name` names a simple type.
#[must_use]
pub fn is_simple_type_name(type_name: &str) -> bool {
    ParamKind::from_type_name(type_name).is_simple()
}

/// One parameter of a method: its canonical type name and coercion kind.
///
/// Serialized as the bare type name; the kind is always derived from it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ParamType {
    type_name: String,
    kind: ParamKind,
}

impl ParamType {
    /// Parameter of the given canonical type name.
    #[must_use]
    pub fn new(type_name: impl Into<String>) -> Self {
        let type_name = type_name.into();
        let kind = ParamKind::from_type_name(&type_name);
        Self { type_name, kind }
    }

    #[must_use]
    pub fn boolean() -> Self {
        Self::new(type_names::BOOL)
    }

    #[must_use]
    pub fn character() -> Self {
        Self::new(type_names::CHAR)
    }

    #[must_use]
    pub fn int() -> Self {
        Self::new(type_names::I32)
    }

    #[must_use]
    pub fn long() -> Self {
        Self::new(type_names::I64)
    }

    #[must_use]
    pub fn double() -> Self {
        Self::new(type_names::F64)
    }

    #[must_use]
    pub fn text() -> Self {
        Self::new(type_names::STRING)
    }

    #[must_use]
    pub fn listener() -> Self {
        Self::new(type_names::LISTENER)
    }

    #[must_use]
    pub fn timestamp() -> Self {
        Self::new(type_names::TIMESTAMP)
    }

    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    #[must_use]
    pub fn kind(&self) -> ParamKind {
        self.kind
    }

    #[must_use]
    pub fn is_simple(&self) -> bool {
        self.kind.is_simple()
    }
}

impl From<String> for ParamType {
    fn from(type_name: String) -> Self {
        Self::new(type_name)
    }
}

impl From<ParamType> for String {
    fn from(param: ParamType) -> Self {
        param.type_name
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.type_name)
    }
}

// ---------------------------------------------------------------------------
// Registry keys
// ---------------------------------------------------------------------------

/// `"{type}/{method}/{argCount}"`: lookup key when parameter types are unknown.
#[must_use]
pub fn ordinal_key(service_type: &str, method: &str, arg_count: usize) -> String {
    format!("{service_type}/{method}/{arg_count}")
}

/// `"{type}/{method}/{param1}/{param2}..."`: lookup key for an exact signature.
#[must_use]
pub fn signature_key<S: AsRef<str>>(service_type: &str, method: &str, param_types: &[S]) -> String {
    let mut key = format!("{service_type}/{method}");
    for param in param_types {
        key.push('/');
        key.push_str(param.as_ref());
    }
    key
}

// ---------------------------------------------------------------------------
// MethodDescriptor
// ---------------------------------------------------------------------------

/// An invocable operation on a service type.
///
/// Produced once per service type by an
/// [`OperationDirectory`](crate::directory::OperationDirectory) and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodDescriptor {
    /// Fully-qualified type name of the owning service.
    pub owner: String,
    pub name: String,
    pub params: Vec<ParamType>,
}

impl MethodDescriptor {
    #[must_use]
    pub fn new(
        owner: impl Into<String>,
        name: impl Into<String>,
        params: impl IntoIterator<Item = ParamType>,
    ) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            params: params.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    #[must_use]
    pub fn ordinal_key(&self) -> String {
        ordinal_key(&self.owner, &self.name, self.arity())
    }

    #[must_use]
    pub fn signature_key(&self) -> String {
        let names: Vec<&str> = self.params.iter().map(ParamType::type_name).collect();
        signature_key(&self.owner, &self.name, &names)
    }
}

impl fmt::Display for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}(", self.owner, self.name)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{param}")?;
        }
        f.write_str(")")
    }
}
