//! Lazily populated method registry.
//!
//! The first reference to a service type enumerates its operations through
//! the [`OperationDirectory`] and indexes each descriptor twice: under its
//! ordinal key (type, name, arity), where overloads accumulate in enumeration
//! order, and under its full signature key. The type is then cached whether
//! or not enumeration produced anything, so a type with no operations is
//! neither rescanned nor re-logged.
//!
//! Population runs at most once per type. Concurrent first callers for the
//! same type wait on a per-type `OnceLock`; callers for other types are not
//! blocked. Reads of a populated type take no lock beyond the `DashMap`
//! shard read.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use mrl_core::naming::{qualify_type_name, NamingError};
use mrl_core::{parameter_signature, Message, Value};

use crate::coerce::coerce_args;
use crate::config::ResolverConfig;
use crate::descriptor::{ordinal_key, signature_key, MethodDescriptor};
use crate::directory::{EnumerationError, OperationDirectory};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A lookup that produced no method.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionError {
    #[error("service type {service_type} exposes no operations")]
    UnknownServiceType { service_type: String },
    #[error("enumerating {service_type} failed: {source}")]
    Enumeration {
        service_type: String,
        source: EnumerationError,
    },
    #[error("no method {service_type}.{method} taking {arg_count} arguments")]
    NoCandidate {
        service_type: String,
        method: String,
        arg_count: usize,
    },
    #[error("no method with signature {signature_key}")]
    NoSignature { signature_key: String },
    #[error("no overload of {service_type}.{method} accepts ({signature})")]
    NoMatch {
        service_type: String,
        method: String,
        signature: String,
    },
    #[error("invalid service type: {0}")]
    InvalidServiceType(#[from] NamingError),
}

// ---------------------------------------------------------------------------
// TypeTable
// ---------------------------------------------------------------------------

#[derive(Debug)]
enum TableStatus {
    Populated,
    Empty,
    Failed(EnumerationError),
}

/// Index of one service type's operations. Immutable once built.
#[derive(Debug)]
struct TypeTable {
    by_ordinal: HashMap<String, Vec<Arc<MethodDescriptor>>>,
    by_signature: HashMap<String, Arc<MethodDescriptor>>,
    status: TableStatus,
}

impl TypeTable {
    fn failed(err: EnumerationError) -> Self {
        Self {
            by_ordinal: HashMap::new(),
            by_signature: HashMap::new(),
            status: TableStatus::Failed(err),
        }
    }

    fn build(service_type: &str, methods: Vec<MethodDescriptor>) -> Self {
        let mut by_ordinal: HashMap<String, Vec<Arc<MethodDescriptor>>> = HashMap::new();
        let mut by_signature = HashMap::new();

        for method in methods {
            let method = Arc::new(method);
            let ordinal = ordinal_key(service_type, &method.name, method.arity());
            let param_names: Vec<&str> = method.params.iter().map(|p| p.type_name()).collect();
            let signature = signature_key(service_type, &method.name, &param_names);
            tracing::debug!(ordinal = %ordinal, signature = %signature, "indexed method");

            by_ordinal
                .entry(ordinal)
                .or_default()
                .push(Arc::clone(&method));
            by_signature.entry(signature).or_insert(method);
        }

        let status = if by_ordinal.is_empty() {
            TableStatus::Empty
        } else {
            TableStatus::Populated
        };
        Self {
            by_ordinal,
            by_signature,
            status,
        }
    }

    fn check(&self, service_type: &str) -> Result<(), ResolutionError> {
        match &self.status {
            TableStatus::Populated => Ok(()),
            TableStatus::Empty => Err(ResolutionError::UnknownServiceType {
                service_type: service_type.to_string(),
            }),
            TableStatus::Failed(err) => Err(ResolutionError::Enumeration {
                service_type: service_type.to_string(),
                source: err.clone(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// MethodRegistry
// ---------------------------------------------------------------------------

/// A method chosen for a set of arguments, with the arguments coerced to its
/// parameter types.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub method: Arc<MethodDescriptor>,
    pub args: Vec<Value>,
}

/// Per-service-type cache of invocable operations.
pub struct MethodRegistry {
    directory: Arc<dyn OperationDirectory>,
    config: ResolverConfig,
    types: DashMap<String, Arc<OnceLock<Arc<TypeTable>>>>,
}

impl MethodRegistry {
    #[must_use]
    pub fn new(directory: Arc<dyn OperationDirectory>, config: ResolverConfig) -> Self {
        Self {
            directory,
            config,
            types: DashMap::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Whether `service_type` has been populated (successfully or not).
    #[must_use]
    pub fn is_cached(&self, service_type: &str) -> bool {
        let Ok(qualified) = self.qualify(service_type) else {
            return false;
        };
        self.types
            .get(&qualified)
            .is_some_and(|cell| cell.get().is_some())
    }

    fn qualify(&self, service_type: &str) -> Result<String, ResolutionError> {
        Ok(qualify_type_name(
            service_type,
            &self.config.default_namespace,
        )?)
    }

    /// Returns the table for a qualified type, populating it on first use.
    fn table(&self, service_type: &str) -> Arc<TypeTable> {
        if let Some(cell) = self.types.get(service_type) {
            if let Some(table) = cell.get() {
                return Arc::clone(table);
            }
        }
        // Clone the cell out so the shard lock is released before enumerating.
        let cell = Arc::clone(self.types.entry(service_type.to_string()).or_default().value());
        Arc::clone(cell.get_or_init(|| Arc::new(self.populate(service_type))))
    }

    fn populate(&self, service_type: &str) -> TypeTable {
        let table = match self.directory.enumerate_operations(service_type) {
            Ok(methods) => TypeTable::build(service_type, methods),
            Err(err) => TypeTable::failed(err),
        };
        match &table.status {
            TableStatus::Populated => tracing::debug!(
                service_type,
                keys = table.by_ordinal.len(),
                "populated method registry"
            ),
            TableStatus::Empty => tracing::error!(
                service_type,
                "service type exposes no operations, it will not be rescanned"
            ),
            TableStatus::Failed(err) => tracing::error!(
                service_type,
                error = %err,
                "operation enumeration failed, type will not be rescanned"
            ),
        }
        table
    }

    // ---- lossy lookup ----

    /// Candidate methods for `(service_type, method, arg_count)` in directory
    /// enumeration order. Bare type names are qualified with the configured
    /// namespace.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError`] if the type has no operations or none
    /// match the name and arity.
    pub fn try_candidates(
        &self,
        service_type: &str,
        method: &str,
        arg_count: usize,
    ) -> Result<Vec<Arc<MethodDescriptor>>, ResolutionError> {
        let service_type = self.qualify(service_type)?;
        let table = self.table(&service_type);
        table.check(&service_type)?;
        table
            .by_ordinal
            .get(&ordinal_key(&service_type, method, arg_count))
            .cloned()
            .ok_or_else(|| ResolutionError::NoCandidate {
                service_type,
                method: method.to_string(),
                arg_count,
            })
    }

    /// Like [`MethodRegistry::try_candidates`], but logs the failure and
    /// returns an empty list.
    pub fn candidates(
        &self,
        service_type: &str,
        method: &str,
        arg_count: usize,
    ) -> Vec<Arc<MethodDescriptor>> {
        self.try_candidates(service_type, method, arg_count)
            .unwrap_or_else(|err| {
                log_failure(&err);
                Vec::new()
            })
    }

    // ---- exact lookup ----

    /// The method with exactly the given parameter type names.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError::NoSignature`] if no such overload exists.
    pub fn try_method<S: AsRef<str>>(
        &self,
        service_type: &str,
        method: &str,
        param_types: &[S],
    ) -> Result<Arc<MethodDescriptor>, ResolutionError> {
        let service_type = self.qualify(service_type)?;
        let table = self.table(&service_type);
        table.check(&service_type)?;
        let key = signature_key(&service_type, method, param_types);
        table
            .by_signature
            .get(&key)
            .cloned()
            .ok_or(ResolutionError::NoSignature { signature_key: key })
    }

    /// Like [`MethodRegistry::try_method`], but logs the failure and returns
    /// `None`.
    pub fn method<S: AsRef<str>>(
        &self,
        service_type: &str,
        method: &str,
        param_types: &[S],
    ) -> Option<Arc<MethodDescriptor>> {
        self.try_method(service_type, method, param_types)
            .map_err(|err| log_failure(&err))
            .ok()
    }

    // ---- dispatch ----

    /// Picks the first candidate, in enumeration order, whose parameters
    /// accept `args`, and returns it with the coerced arguments.
    ///
    /// # Errors
    ///
    /// Returns the lookup error, or [`ResolutionError::NoMatch`] when no
    /// candidate accepts the arguments.
    pub fn try_resolve(
        &self,
        service_type: &str,
        method: &str,
        args: &[Value],
    ) -> Result<Resolved, ResolutionError> {
        let candidates = self.try_candidates(service_type, method, args.len())?;
        for candidate in candidates {
            match coerce_args(args, &candidate.params) {
                Ok(coerced) => {
                    return Ok(Resolved {
                        method: candidate,
                        args: coerced,
                    })
                }
                Err(err) => {
                    tracing::trace!(candidate = %candidate, error = %err, "candidate rejected");
                }
            }
        }
        Err(ResolutionError::NoMatch {
            service_type: self.qualify(service_type)?,
            method: method.to_string(),
            signature: parameter_signature(args),
        })
    }

    /// Like [`MethodRegistry::try_resolve`], but logs the failure and returns
    /// `None`.
    pub fn resolve(&self, service_type: &str, method: &str, args: &[Value]) -> Option<Resolved> {
        self.try_resolve(service_type, method, args)
            .map_err(|err| log_failure(&err))
            .ok()
    }

    /// Resolves the method and arguments carried by `msg` against the
    /// operations of `service_type`, the type of the message's target.
    pub fn resolve_message(&self, service_type: &str, msg: &Message) -> Option<Resolved> {
        self.resolve(service_type, &msg.method, &msg.args)
    }
}

impl std::fmt::Debug for MethodRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodRegistry")
            .field("config", &self.config)
            .field("cached_types", &self.types.len())
            .finish_non_exhaustive()
    }
}

/// Type-level failures were already logged when the type was populated.
fn log_failure(err: &ResolutionError) {
    match err {
        ResolutionError::UnknownServiceType { .. } | ResolutionError::Enumeration { .. } => {
            tracing::debug!(error = %err, "resolution failed");
        }
        _ => tracing::error!(error = %err, "resolution failed"),
    }
}
