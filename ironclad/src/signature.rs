//! Explicit call signatures and argument binding.
//!
//! A [`Signature`] lists a callable's parameters in declaration order, each
//! with a kind, an optional default and an optional declared [`Hint`].
//! Binding a call against it produces [`Arguments`]: one entry per
//! parameter, in declaration order, recording whether the caller supplied
//! the value or it came from the default.
//!
//! Parameter order follows the usual rules:
//!
//! ```text
//! positional-or-keyword*  *args?  keyword-only*  **kwargs?
//! ```

use std::fmt;
use std::ops::Index;

use indexmap::IndexMap;
use thiserror::Error;

use crate::error::{Error, Result};
use crate::hint::Hint;
use crate::value::Value;

/// How a parameter accepts arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    PositionalOrKeyword,
    /// `*args`: collects extra positional arguments into a tuple.
    VarPositional,
    KeywordOnly,
    /// `**kwargs`: collects extra keyword arguments into a dict.
    VarKeyword,
}

impl ParamKind {
    fn rank(self) -> u8 {
        match self {
            ParamKind::PositionalOrKeyword => 0,
            ParamKind::VarPositional => 1,
            ParamKind::KeywordOnly => 2,
            ParamKind::VarKeyword => 3,
        }
    }
}

/// A declared parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    name: String,
    kind: ParamKind,
    default: Option<Value>,
    hint: Option<Hint>,
}

impl Param {
    /// A positional-or-keyword parameter.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_kind(name, ParamKind::PositionalOrKeyword)
    }

    pub fn var_args(name: impl Into<String>) -> Self {
        Self::with_kind(name, ParamKind::VarPositional)
    }

    pub fn keyword_only(name: impl Into<String>) -> Self {
        Self::with_kind(name, ParamKind::KeywordOnly)
    }

    pub fn var_kwargs(name: impl Into<String>) -> Self {
        Self::with_kind(name, ParamKind::VarKeyword)
    }

    fn with_kind(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            default: None,
            hint: None,
        }
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Attach a declared type hint.
    pub fn annotated(mut self, hint: impl Into<Hint>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ParamKind {
        self.kind
    }

    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn hint(&self) -> Option<&Hint> {
        self.hint.as_ref()
    }

    /// Whether this is `*args` or `**kwargs`.
    pub fn is_variadic(&self) -> bool {
        matches!(self.kind, ParamKind::VarPositional | ParamKind::VarKeyword)
    }

    fn accepts_keyword(&self) -> bool {
        matches!(
            self.kind,
            ParamKind::PositionalOrKeyword | ParamKind::KeywordOnly
        )
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ParamKind::VarPositional => write!(f, "*")?,
            ParamKind::VarKeyword => write!(f, "**")?,
            _ => {}
        }
        write!(f, "{}", self.name)?;
        if let Some(hint) = &self.hint {
            write!(f, ": {hint}")?;
        }
        match (&self.default, &self.hint) {
            (Some(default), Some(_)) => write!(f, " = {default}"),
            (Some(default), None) => write!(f, "={default}"),
            (None, _) => Ok(()),
        }
    }
}

/// A callable's parameter list and declared return hint.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Signature {
    params: Vec<Param>,
    returns: Option<Hint>,
}

impl Signature {
    /// Build a signature, rejecting duplicate names and misordered parameters.
    pub fn new<I: IntoIterator<Item = Param>>(params: I) -> Result<Self> {
        let params: Vec<Param> = params.into_iter().collect();

        let mut seen_default = false;
        for (i, param) in params.iter().enumerate() {
            if params[..i].iter().any(|p| p.name == param.name) {
                return Err(Error::configuration(format!(
                    "duplicate parameter '{}'",
                    param.name
                )));
            }
            if let Some(prev) = i.checked_sub(1).map(|j| &params[j]) {
                let misordered = prev.kind.rank() > param.kind.rank()
                    || (prev.is_variadic() && prev.kind == param.kind);
                if misordered {
                    return Err(Error::configuration(format!(
                        "parameter '{}' cannot follow '{}'",
                        param.name, prev.name
                    )));
                }
            }
            if param.is_variadic() && param.default.is_some() {
                return Err(Error::configuration(format!(
                    "variadic parameter '{}' cannot have a default",
                    param.name
                )));
            }
            if param.kind == ParamKind::PositionalOrKeyword {
                if param.default.is_some() {
                    seen_default = true;
                } else if seen_default {
                    return Err(Error::configuration(format!(
                        "parameter '{}' without a default follows a parameter with one",
                        param.name
                    )));
                }
            }
        }

        Ok(Self {
            params,
            returns: None,
        })
    }

    /// Declare the return hint.
    pub fn returning(mut self, hint: impl Into<Hint>) -> Self {
        self.returns = Some(hint.into());
        self
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&Param> {
        self.params.iter().find(|p| p.name == name)
    }

    pub fn returns(&self) -> Option<&Hint> {
        self.returns.as_ref()
    }

    /// Number of positional-or-keyword parameters.
    pub fn positional_count(&self) -> usize {
        self.params
            .iter()
            .filter(|p| p.kind == ParamKind::PositionalOrKeyword)
            .count()
    }

    /// How many positional arguments a call may pass: the parameters
    /// without a default up to every positional parameter, unbounded with
    /// `*args`.
    pub fn positional_range(&self) -> (usize, Option<usize>) {
        let required = self
            .params
            .iter()
            .filter(|p| p.kind == ParamKind::PositionalOrKeyword && p.default.is_none())
            .count();
        let most = (!self.has_var_args()).then(|| self.positional_count());
        (required, most)
    }

    pub fn has_var_args(&self) -> bool {
        self.params
            .iter()
            .any(|p| p.kind == ParamKind::VarPositional)
    }

    fn has_var_kwargs(&self) -> bool {
        self.params.iter().any(|p| p.kind == ParamKind::VarKeyword)
    }

    /// Bind a call's arguments to the parameters, filling in defaults.
    pub fn bind(
        &self,
        args: &[Value],
        kwargs: &IndexMap<String, Value>,
    ) -> Result<Arguments, BindError> {
        let positional: Vec<&Param> = self
            .params
            .iter()
            .filter(|p| p.kind == ParamKind::PositionalOrKeyword)
            .collect();

        let mut given: IndexMap<&str, Value> = IndexMap::new();
        let mut extra_args = Vec::new();
        for (i, arg) in args.iter().enumerate() {
            match positional.get(i) {
                Some(param) => {
                    given.insert(&param.name, arg.clone());
                }
                None if self.has_var_args() => extra_args.push(arg.clone()),
                None => {
                    return Err(BindError::TooManyPositional {
                        expected: positional.len(),
                        given: args.len(),
                    })
                }
            }
        }

        let mut extra_kwargs = Vec::new();
        for (key, value) in kwargs {
            match self.params.iter().find(|p| p.name == *key && p.accepts_keyword()) {
                Some(param) if given.contains_key(param.name.as_str()) => {
                    return Err(BindError::MultipleValues(key.clone()));
                }
                Some(param) => {
                    given.insert(&param.name, value.clone());
                }
                None if self.has_var_kwargs() => {
                    extra_kwargs.push((Value::str(key.as_str()), value.clone()));
                }
                None => return Err(BindError::UnexpectedKeyword(key.clone())),
            }
        }

        let mut bound = IndexMap::with_capacity(self.params.len());
        for param in &self.params {
            let arg = match param.kind {
                ParamKind::VarPositional => BoundArg {
                    value: Value::Tuple(std::mem::take(&mut extra_args)),
                    supplied: true,
                },
                ParamKind::VarKeyword => BoundArg {
                    value: Value::Dict(std::mem::take(&mut extra_kwargs)),
                    supplied: true,
                },
                _ => match (given.swap_remove(param.name.as_str()), &param.default) {
                    (Some(value), _) => BoundArg {
                        value,
                        supplied: true,
                    },
                    (None, Some(default)) => BoundArg {
                        value: default.clone(),
                        supplied: false,
                    },
                    (None, None) => return Err(BindError::Missing(param.name.clone())),
                },
            };
            bound.insert(param.name.clone(), arg);
        }

        Ok(Arguments { bound })
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        let mut star_written = self.has_var_args();
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            if param.kind == ParamKind::KeywordOnly && !star_written {
                write!(f, "*, ")?;
                star_written = true;
            }
            write!(f, "{param}")?;
        }
        write!(f, ")")?;
        if let Some(hint) = &self.returns {
            write!(f, " -> {hint}")?;
        }
        Ok(())
    }
}

/// Why a call's arguments could not be bound.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    #[error("takes {expected} positional arguments but {given} were given")]
    TooManyPositional { expected: usize, given: usize },

    #[error("got multiple values for argument '{0}'")]
    MultipleValues(String),

    #[error("got an unexpected keyword argument '{0}'")]
    UnexpectedKeyword(String),

    #[error("missing required argument '{0}'")]
    Missing(String),
}

/// One bound parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundArg {
    pub value: Value,
    /// False when the value is the parameter's default.
    pub supplied: bool,
}

/// The result of binding a call, keyed by parameter name in declaration order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Arguments {
    bound: IndexMap<String, BoundArg>,
}

impl Arguments {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bound.get(name).map(|arg| &arg.value)
    }

    pub fn is_supplied(&self, name: &str) -> bool {
        self.bound.get(name).is_some_and(|arg| arg.supplied)
    }

    /// Replace a bound value, keeping whether it was supplied.
    /// Returns false if there is no such parameter.
    pub fn set(&mut self, name: &str, value: Value) -> bool {
        match self.bound.get_mut(name) {
            Some(arg) => {
                arg.value = value;
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BoundArg)> {
        self.bound.iter().map(|(name, arg)| (name.as_str(), arg))
    }

    pub fn len(&self) -> usize {
        self.bound.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bound.is_empty()
    }
}

impl Index<&str> for Arguments {
    type Output = Value;

    /// Panics if there is no parameter with this name.
    fn index(&self, name: &str) -> &Value {
        &self.bound[name].value
    }
}
