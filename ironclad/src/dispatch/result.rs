//! Dispatch result types and errors.

use std::fmt;

use super::Overload;
use crate::repr::class_repr;
use crate::signature::Arguments;
use crate::value::Class;

/// Result of dispatch resolution.
#[derive(Debug)]
pub enum DispatchResult<'a> {
    /// A unique overload was selected, with the call bound to its signature.
    Resolved {
        overload: &'a Overload,
        arguments: Arguments,
    },
    /// No applicable overloads found.
    NoMatch(NoMatchError),
    /// Several overloads are equally specific and the policy rejects ties.
    Ambiguous(AmbiguityError),
}

impl DispatchResult<'_> {
    pub fn is_resolved(&self) -> bool {
        matches!(self, DispatchResult::Resolved { .. })
    }
}

/// Error when no overload matches the arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoMatchError {
    /// The multimethod that was called.
    pub method_name: String,
    /// Runtime classes of the positional arguments.
    pub arg_types: Vec<Class>,
    /// Whether keyword arguments were passed.
    pub has_kwargs: bool,
    /// Rendered signatures of every registered overload.
    pub candidates: Vec<String>,
}

/// Error when several overloads are maximally specific.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmbiguityError {
    /// The multimethod that was called.
    pub method_name: String,
    /// Runtime classes of the positional arguments.
    pub arg_types: Vec<Class>,
    pub has_kwargs: bool,
    /// Rendered signatures of the tied overloads, in registration order.
    pub candidates: Vec<String>,
}

fn describe_args(arg_types: &[Class], has_kwargs: bool) -> String {
    let mut parts: Vec<String> = arg_types.iter().map(class_repr).collect();
    if has_kwargs {
        parts.push("**kwargs".to_string());
    }
    parts.join(", ")
}

impl fmt::Display for NoMatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "No overload of {}() matches ({}). Candidates: {}",
            self.method_name,
            describe_args(&self.arg_types, self.has_kwargs),
            self.candidates.join(" | ")
        )
    }
}

impl std::error::Error for NoMatchError {}

impl fmt::Display for AmbiguityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Ambiguous call to {}() with ({}). Equally specific: {}",
            self.method_name,
            describe_args(&self.arg_types, self.has_kwargs),
            self.candidates.join(" | ")
        )
    }
}

impl std::error::Error for AmbiguityError {}
