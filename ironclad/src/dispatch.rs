//! Multiple dispatch over runtime argument classes.
//!
//! A [`Multimethod`] holds overloads of one operation. A call selects the
//! overload whose declared parameter hints match the runtime arguments,
//! preferring the most specific one.
//!
//! # Algorithm Overview
//!
//! 1. **Filter applicable**: bind the call to each overload's signature and
//!    keep those whose parameter hints all match the bound arguments
//! 2. **Order by specificity**: keep the maximal candidates, those no other
//!    applicable candidate is strictly more specific than. With none left,
//!    report every registered signature
//! 3. **Select best**: a unique maximal candidate wins; ties go to the
//!    earliest registered overload, or fail under [`AmbiguityPolicy::Reject`]
//!
//! Overload `A` is more specific than `B` when every parameter hint of `A`
//! is at least as specific as `B`'s, strictly so for at least one parameter.
//! Class specifications compare by the classes they admit, so `int` is more
//! specific than `int | str`, and an unannotated parameter is less specific
//! than any hint. Other hints (containers, literals) are only comparable to
//! an identical hint.

pub mod registry;
pub mod result;

use std::cmp::Ordering;
use std::fmt;

use tracing::{debug, trace, warn};

pub use registry::Registry;
pub use result::{AmbiguityError, DispatchResult, NoMatchError};

use crate::error::{Error, Result};
use crate::function::{Function, Kwargs};
use crate::hint::{matches_hint, Hint};
use crate::options::{AmbiguityPolicy, Config, EnforceOptions};
use crate::signature::{Arguments, ParamKind};
use crate::value::Value;

/// One parameter of an overload as dispatch sees it.
#[derive(Debug, Clone)]
struct ParamSpec {
    name: String,
    kind: ParamKind,
    /// `None` when the parameter accepts anything.
    hint: Option<Hint>,
}

/// A registered implementation of a multimethod.
#[derive(Debug, Clone)]
pub struct Overload {
    /// Registration order.
    index: usize,
    params: Vec<ParamSpec>,
    function: Function,
    /// Signature text used in diagnostics, e.g. `area(w: int, h: int)`.
    rendered: String,
}

impl Overload {
    fn new(method_name: &str, index: usize, function: Function) -> Result<Self> {
        let mut params = Vec::with_capacity(function.signature().params().len());
        for param in function.signature().params() {
            let hint = match param.hint() {
                Some(hint) if !hint.is_unconstrained() => {
                    hint.validate()?;
                    Some(hint.clone())
                }
                _ => None,
            };
            params.push(ParamSpec {
                name: param.name().to_string(),
                kind: param.kind(),
                hint,
            });
        }
        let rendered = render(method_name, &params);
        Ok(Self {
            index,
            params,
            function,
            rendered,
        })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn function(&self) -> &Function {
        &self.function
    }

    /// Signature text, e.g. `area(w: int, h: int)`.
    pub fn signature_str(&self) -> &str {
        &self.rendered
    }

    /// Bind the call and check every hint. `None` if this overload does not apply.
    fn applicable(
        &self,
        args: &[Value],
        kwargs: &Kwargs,
        options: &EnforceOptions,
    ) -> Option<Arguments> {
        let arguments = self.function.signature().bind(args, kwargs).ok()?;
        for param in &self.params {
            let Some(hint) = &param.hint else {
                continue;
            };
            if !options.check_defaults && !arguments.is_supplied(&param.name) {
                continue;
            }
            let value = arguments.get(&param.name)?;
            let ok = match (param.kind, value) {
                (ParamKind::VarPositional, Value::Tuple(items)) => {
                    items.iter().all(|item| matches_hint(item, hint, options))
                }
                (ParamKind::VarKeyword, Value::Dict(pairs)) => {
                    pairs.iter().all(|(_, item)| matches_hint(item, hint, options))
                }
                _ => matches_hint(value, hint, options),
            };
            if !ok {
                trace!(overload = %self.rendered, param = %param.name, "not applicable");
                return None;
            }
        }
        Some(arguments)
    }

    /// Check whether every parameter of `self` is at least as specific as
    /// the matching parameter of `other`.
    pub fn is_at_least_as_specific_as(&self, other: &Overload) -> bool {
        self.params.len() == other.params.len()
            && self
                .params
                .iter()
                .zip(&other.params)
                .all(|(a, b)| hint_at_least_as_specific(a.hint.as_ref(), b.hint.as_ref()))
    }

    /// Check whether `self` is strictly more specific than `other`.
    pub fn is_more_specific_than(&self, other: &Overload) -> bool {
        self.is_at_least_as_specific_as(other) && !other.is_at_least_as_specific_as(self)
    }
}

fn hint_at_least_as_specific(a: Option<&Hint>, b: Option<&Hint>) -> bool {
    match (a, b) {
        (_, None) => true,
        (None, Some(_)) => false,
        (Some(a), Some(b)) => match (a.as_class_info(), b.as_class_info()) {
            (Some(a), Some(b)) => a.is_at_least_as_specific_as(&b),
            _ => a == b,
        },
    }
}

/// Compare two overloads in the specificity order. `Less` means `a` is
/// more specific; `None` means they are incomparable.
pub fn compare_specificity(a: &Overload, b: &Overload) -> Option<Ordering> {
    match (a.is_at_least_as_specific_as(b), b.is_at_least_as_specific_as(a)) {
        (true, true) => Some(Ordering::Equal),
        (true, false) => Some(Ordering::Less),
        (false, true) => Some(Ordering::Greater),
        (false, false) => None,
    }
}

fn render(method_name: &str, params: &[ParamSpec]) -> String {
    let parts: Vec<String> = params
        .iter()
        .map(|param| {
            let stars = match param.kind {
                ParamKind::VarPositional => "*",
                ParamKind::VarKeyword => "**",
                _ => "",
            };
            match &param.hint {
                Some(hint) => format!("{stars}{}: {hint}", param.name),
                None => format!("{stars}{}: Any", param.name),
            }
        })
        .collect();
    format!("{method_name}({})", parts.join(", "))
}

/// A named operation with runtime overloads.
///
/// Registration needs `&mut self`; a populated multimethod is immutable
/// and can be shared behind an `Arc`.
#[derive(Debug, Clone)]
pub struct Multimethod {
    name: String,
    options: EnforceOptions,
    policy: AmbiguityPolicy,
    overloads: Vec<Overload>,
}

impl Multimethod {
    /// Create an empty multimethod with default options.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_options(name, EnforceOptions::default())
    }

    pub fn with_options(name: impl Into<String>, options: EnforceOptions) -> Self {
        Self {
            name: name.into(),
            options,
            policy: AmbiguityPolicy::default(),
            overloads: Vec::new(),
        }
    }

    /// Create an empty multimethod from a configuration document.
    pub fn with_config(name: impl Into<String>, config: &Config) -> Self {
        Self::with_options(name, config.enforce).with_policy(config.dispatch.ambiguity)
    }

    pub fn with_policy(mut self, policy: AmbiguityPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> &EnforceOptions {
        &self.options
    }

    pub fn policy(&self) -> AmbiguityPolicy {
        self.policy
    }

    /// Registered overloads, in registration order.
    pub fn overloads(&self) -> &[Overload] {
        &self.overloads
    }

    pub fn len(&self) -> usize {
        self.overloads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overloads.is_empty()
    }

    /// Register an overload.
    ///
    /// Fails if a parameter hint can never match, or if no positional call
    /// could suit both the new overload and an existing one: their accepted
    /// positional argument counts do not overlap.
    pub fn overload(&mut self, function: Function) -> Result<&mut Self> {
        let signature = function.signature();
        let range = signature.positional_range();
        for existing in &self.overloads {
            let other = existing.function.signature().positional_range();
            if !ranges_overlap(range, other) {
                return Err(Error::configuration(format!(
                    "cannot register {}{}: accepts {} positional arguments but {} accepts {}",
                    self.name,
                    signature,
                    describe_range(range),
                    existing.rendered,
                    describe_range(other)
                )));
            }
        }

        let overload = Overload::new(&self.name, self.overloads.len(), function)?;
        debug!(
            multimethod = %self.name,
            index = overload.index,
            signature = %overload.rendered,
            "registered overload"
        );
        self.overloads.push(overload);
        Ok(self)
    }

    /// Select the overload for a call without invoking it.
    pub fn resolve(&self, args: &[Value], kwargs: &Kwargs) -> DispatchResult<'_> {
        // Step 1: Filter to applicable overloads
        let applicable: Vec<(&Overload, Arguments)> = self
            .overloads
            .iter()
            .filter_map(|o| o.applicable(args, kwargs, &self.options).map(|a| (o, a)))
            .collect();

        // Step 2: Find maximally specific overloads; none means no match
        let mut maximal = find_maximal(applicable).into_iter();
        let Some((overload, arguments)) = maximal.next() else {
            return DispatchResult::NoMatch(NoMatchError {
                method_name: self.name.clone(),
                arg_types: args.iter().map(Value::class).collect(),
                has_kwargs: !kwargs.is_empty(),
                candidates: self.overloads.iter().map(|o| o.rendered.clone()).collect(),
            });
        };

        // Step 3: Break ties
        let rest: Vec<&Overload> = maximal.map(|(o, _)| o).collect();
        if !rest.is_empty() {
            let tied: Vec<String> = std::iter::once(overload)
                .chain(rest)
                .map(|o| o.rendered.clone())
                .collect();
            if self.policy == AmbiguityPolicy::Reject {
                return DispatchResult::Ambiguous(AmbiguityError {
                    method_name: self.name.clone(),
                    arg_types: args.iter().map(Value::class).collect(),
                    has_kwargs: !kwargs.is_empty(),
                    candidates: tied,
                });
            }
            warn!(
                multimethod = %self.name,
                candidates = %tied.join(" | "),
                "ambiguous call, using the earliest registered overload"
            );
        }

        DispatchResult::Resolved {
            overload,
            arguments,
        }
    }

    /// Dispatch a call.
    pub fn call(&self, args: &[Value], kwargs: &Kwargs) -> Result<Value> {
        match self.resolve(args, kwargs) {
            DispatchResult::Resolved {
                overload,
                arguments,
            } => {
                debug!(
                    multimethod = %self.name,
                    index = overload.index,
                    signature = %overload.rendered,
                    "dispatching"
                );
                overload.function.invoke(&arguments)
            }
            DispatchResult::NoMatch(err) => Err(err.into()),
            DispatchResult::Ambiguous(err) => Err(err.into()),
        }
    }

    pub fn call_positional(&self, args: &[Value]) -> Result<Value> {
        self.call(args, &Kwargs::new())
    }
}

impl fmt::Display for Multimethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} overloads)", self.name, self.overloads.len())
    }
}

fn ranges_overlap(a: (usize, Option<usize>), b: (usize, Option<usize>)) -> bool {
    a.0 <= b.1.unwrap_or(usize::MAX) && b.0 <= a.1.unwrap_or(usize::MAX)
}

fn describe_range((least, most): (usize, Option<usize>)) -> String {
    match most {
        Some(most) if most == least => least.to_string(),
        Some(most) => format!("{least} to {most}"),
        None => format!("at least {least}"),
    }
}

/// Keep the candidates no other candidate is strictly more specific than,
/// in registration order.
fn find_maximal(applicable: Vec<(&Overload, Arguments)>) -> Vec<(&Overload, Arguments)> {
    let keep: Vec<bool> = applicable
        .iter()
        .map(|(candidate, _)| {
            !applicable
                .iter()
                .any(|(other, _)| other.is_more_specific_than(candidate))
        })
        .collect();
    applicable
        .into_iter()
        .zip(keep)
        .filter_map(|(candidate, keep)| keep.then_some(candidate))
        .collect()
}

/// Turn a function into a multimethod with it as the first overload.
pub fn runtime_overload(function: Function, options: EnforceOptions) -> Result<Multimethod> {
    let mut method = Multimethod::with_options(function.name(), options);
    method.overload(function)?;
    Ok(method)
}
