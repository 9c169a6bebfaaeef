//! Errors raised while building contracts, registering overloads, and
//! checking or dispatching calls.

use std::fmt;

use thiserror::Error;

use crate::dispatch::result::{AmbiguityError, NoMatchError};
use crate::signature::BindError;

/// A foreign error raised by user code: a coercer or a function body.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// What a type check was applied to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Param(String),
    Return,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Param(name) => write!(f, "'{name}'"),
            Target::Return => f.write_str("return"),
        }
    }
}

/// Crate error type.
#[derive(Debug, Error)]
pub enum Error {
    /// A guard or overload was declared incorrectly. Raised at build or
    /// registration time, never while checking a call.
    #[error("configuration error: {message}")]
    Configuration { message: String },

    #[error("invalid configuration document: {0}")]
    InvalidConfig(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The call's arguments do not fit the signature.
    #[error("{function}(): {source}")]
    Bind {
        function: String,
        #[source]
        source: BindError,
    },

    /// An argument or return value failed its type specification.
    #[error("{function}(): {target} expected '{expected}'{notes}, got '{actual}' with value {value}")]
    TypeMismatch {
        function: String,
        target: Target,
        expected: String,
        notes: String,
        actual: String,
        value: String,
    },

    /// An argument failed its value predicate.
    #[error("{function}(): '{param}' failed constraint: {description}; got {value}")]
    ValueConstraint {
        function: String,
        param: String,
        description: String,
        value: String,
    },

    #[error(transparent)]
    NoMatchingOverload(#[from] NoMatchError),

    #[error(transparent)]
    AmbiguousOverload(#[from] AmbiguityError),

    #[error("no multimethod named '{name}'")]
    UnknownMultimethod { name: String },

    /// A coercer's own error, unchanged.
    #[error(transparent)]
    Coercion(BoxError),

    /// An error returned by the wrapped function body, unchanged.
    #[error(transparent)]
    Callee(BoxError),
}

impl Error {
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }
}

/// Crate result type.
pub type Result<T, E = Error> = std::result::Result<T, E>;
