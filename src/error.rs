//! Error types for bean resolution and registration

use thiserror::Error;

/// Source error type for wrapped construction/lifecycle failures.
pub type BoxedCause = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while registering or resolving beans
#[derive(Error, Debug)]
pub enum BeanError {
    /// No definition is registered under the requested name (or none matches
    /// the requested type)
    #[error("No bean definition named '{name}'")]
    NoSuchDefinition { name: String },

    /// A definition is already registered under this name
    #[error("Bean definition '{name}' is already registered")]
    DuplicateDefinition { name: String },

    /// The bean name is not acceptable for registration
    #[error("Invalid bean name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    /// A creation cycle was detected while resolving a bean graph
    #[error("Circular dependency detected: {}", path.join(" -> "))]
    CircularDependency { path: Vec<String> },

    /// The resolved instance is not of the required type
    #[error("Bean '{name}' is of type {actual}, expected {expected}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        actual: String,
    },

    /// More than one candidate matches a by-type lookup and none is primary
    #[error("No unique bean of type {type_name}: {} candidates ({})", candidates.len(), candidates.join(", "))]
    NoUniqueBeanOfType {
        type_name: &'static str,
        candidates: Vec<String>,
    },

    /// A declared type name has no registered construction metadata
    #[error("Cannot resolve bean type '{type_name}'")]
    TypeResolution { type_name: String },

    /// Constructor, factory method, or init method invocation failed
    #[error("Failed to initialize bean '{name}': {reason}")]
    Initialization {
        name: String,
        reason: String,
        #[source]
        source: Option<BoxedCause>,
    },

    /// Broken or cyclic parent-definition chain
    #[error("Invalid definition hierarchy for bean '{name}': {reason}")]
    InvalidHierarchy { name: String, reason: String },

    /// The merged definition is abstract and can only serve as a parent template
    #[error("Bean definition '{name}' is abstract and cannot be instantiated")]
    AbstractDefinition { name: String },

    /// A factory-dereference lookup (`&name`) hit a bean without the factory capability
    #[error("Bean '{name}' is not a factory bean")]
    NotAFactory { name: String },
}

impl BeanError {
    /// Create a NoSuchDefinition error
    #[inline]
    pub fn no_such_definition(name: impl Into<String>) -> Self {
        Self::NoSuchDefinition { name: name.into() }
    }

    /// Create a DuplicateDefinition error
    #[inline]
    pub fn duplicate(name: impl Into<String>) -> Self {
        Self::DuplicateDefinition { name: name.into() }
    }

    /// Create an Initialization error with a plain reason and no cause
    #[inline]
    pub fn initialization(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Initialization {
            name: name.into(),
            reason: reason.into(),
            source: None,
        }
    }

    /// Create an Initialization error wrapping an underlying failure
    #[inline]
    pub fn initialization_with(
        name: impl Into<String>,
        reason: impl Into<String>,
        cause: BoxedCause,
    ) -> Self {
        Self::Initialization {
            name: name.into(),
            reason: reason.into(),
            source: Some(cause),
        }
    }
}

/// Result type alias for container operations
pub type Result<T> = std::result::Result<T, BeanError>;
