//! Enforcement options and the configuration document.
//!
//! Options can be built in code or loaded from TOML:
//!
//! ```toml
//! [enforce]
//! allow_subclasses = true
//! check_defaults = false
//! strict_bools = true
//!
//! [dispatch]
//! ambiguity = "reject"
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Switches that control how values are matched against specifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct EnforceOptions {
    /// Accept instances of subclasses. When false, the value's class must
    /// be exactly the expected class.
    pub allow_subclasses: bool,

    /// Check parameters that fell back to their declared default.
    pub check_defaults: bool,

    /// Never let a `bool` satisfy `int` or a numeric base of `int`.
    pub strict_bools: bool,
}

/// Options used when none are given.
pub const DEFAULT_ENFORCE_OPTIONS: EnforceOptions = EnforceOptions {
    allow_subclasses: true,
    check_defaults: true,
    strict_bools: true,
};

impl Default for EnforceOptions {
    fn default() -> Self {
        DEFAULT_ENFORCE_OPTIONS
    }
}

impl EnforceOptions {
    pub const fn new() -> Self {
        DEFAULT_ENFORCE_OPTIONS
    }

    pub const fn allow_subclasses(self, allow: bool) -> Self {
        Self {
            allow_subclasses: allow,
            ..self
        }
    }

    pub const fn check_defaults(self, check: bool) -> Self {
        Self {
            check_defaults: check,
            ..self
        }
    }

    pub const fn strict_bools(self, strict: bool) -> Self {
        Self {
            strict_bools: strict,
            ..self
        }
    }

    /// Parenthesized notes appended to type mismatch messages, e.g.
    /// ` (no subclasses, no bools as ints)`. Empty when nothing applies.
    pub(crate) fn mismatch_notes(&self, mentions_int: bool) -> String {
        let mut notes = Vec::new();
        if !self.allow_subclasses {
            notes.push("no subclasses");
        }
        if self.strict_bools && mentions_int {
            notes.push("no bools as ints");
        }
        if notes.is_empty() {
            String::new()
        } else {
            format!(" ({})", notes.join(", "))
        }
    }
}

/// What dispatch does when several overloads are equally specific.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AmbiguityPolicy {
    /// Pick the earliest registered of the most specific overloads.
    #[default]
    FirstRegistered,
    /// Fail with an ambiguity error.
    Reject,
}

/// Dispatch configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Tie-break policy for ambiguous calls.
    pub ambiguity: AmbiguityPolicy,
}

/// Top-level configuration document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Enforcement options applied to contracts and multimethods.
    pub enforce: EnforceOptions,

    /// Dispatch behavior for multimethods.
    pub dispatch: DispatchConfig,
}

impl Config {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from TOML text. Missing keys keep their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Load a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let source = fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }
}
