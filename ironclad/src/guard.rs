//! Contracts: runtime checks around a [`Function`].
//!
//! A [`Contract`] collects coercers, type specifications, annotation checks
//! and value predicates, then wraps a function into a [`Guarded`] callable.
//! Every call runs the same ordered pipeline:
//!
//! 1. bind the arguments to the signature
//! 2. coerce
//! 3. check types (explicit specifications and declared hints)
//! 4. check values
//! 5. call the function
//! 6. check the return value
//!
//! All checks finish before the function runs. The first failure is
//! returned; nothing is retried.
//!
//! ```ignore
//! let register = enforce_types(EnforceOptions::new(), [("age", Class::int())])
//!     .coerce("age", to_int)
//!     .enforce_value("age", library::positive())
//!     .wrap(register_fn)?;
//!
//! register.call_positional(&[Value::from("5")])?;
//! ```

pub mod coerce;

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::class_info::ClassInfo;
use crate::error::{BoxError, Error, Result, Target};
use crate::function::{Function, Kwargs};
use crate::hint::{matches_hint, Hint};
use crate::options::EnforceOptions;
use crate::predicate::Predicate;
use crate::repr::{class_repr, short_repr};
use crate::signature::{Arguments, ParamKind};
use crate::value::Value;

/// Converts an argument before it is checked.
pub type Coercer = Arc<dyn Fn(Value) -> std::result::Result<Value, BoxError> + Send + Sync>;

/// What a type check compares an argument against.
#[derive(Debug, Clone)]
enum Expected {
    Hint(Hint),
    /// A custom check standing in for a class specification.
    Predicate(Predicate),
}

/// A set of checks to wrap around a function.
#[derive(Clone, Default)]
pub struct Contract {
    options: EnforceOptions,
    types: IndexMap<String, Expected>,
    /// `Some(check_return)` when declared hints are enforced.
    annotations: Option<bool>,
    coercers: IndexMap<String, Coercer>,
    values: IndexMap<String, Predicate>,
}

impl Contract {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options used by every type check in this contract.
    pub fn options(mut self, options: EnforceOptions) -> Self {
        self.options = options;
        self
    }

    /// Require a parameter to match a class specification.
    pub fn enforce_type(mut self, param: impl Into<String>, spec: impl Into<ClassInfo>) -> Self {
        self.types.insert(param.into(), Expected::Hint(Hint::Info(spec.into())));
        self
    }

    /// Require a parameter to pass `predicate` as its type check. A failure
    /// is a type mismatch described by the predicate's message.
    pub fn enforce_type_with(mut self, param: impl Into<String>, predicate: Predicate) -> Self {
        self.types.insert(param.into(), Expected::Predicate(predicate));
        self
    }

    pub fn enforce_types<I, K, S>(self, specs: I) -> Self
    where
        I: IntoIterator<Item = (K, S)>,
        K: Into<String>,
        S: Into<ClassInfo>,
    {
        specs
            .into_iter()
            .fold(self, |contract, (param, spec)| contract.enforce_type(param, spec))
    }

    /// Check arguments against the signature's declared hints, and the
    /// return value too when `check_return` is set.
    pub fn enforce_annotations(mut self, check_return: bool) -> Self {
        self.annotations = Some(check_return);
        self
    }

    /// Replace a parameter's value with `coercer(value)` before any check.
    pub fn coerce<F>(mut self, param: impl Into<String>, coercer: F) -> Self
    where
        F: Fn(Value) -> std::result::Result<Value, BoxError> + Send + Sync + 'static,
    {
        self.coercers.insert(param.into(), Arc::new(coercer));
        self
    }

    pub fn coerce_types<I, K>(mut self, coercers: I) -> Self
    where
        I: IntoIterator<Item = (K, Coercer)>,
        K: Into<String>,
    {
        self.coercers
            .extend(coercers.into_iter().map(|(param, c)| (param.into(), c)));
        self
    }

    /// Require a parameter to satisfy a predicate.
    pub fn enforce_value(mut self, param: impl Into<String>, predicate: Predicate) -> Self {
        self.values.insert(param.into(), predicate);
        self
    }

    pub fn enforce_values<I, K>(self, predicates: I) -> Self
    where
        I: IntoIterator<Item = (K, Predicate)>,
        K: Into<String>,
    {
        predicates
            .into_iter()
            .fold(self, |contract, (param, pred)| contract.enforce_value(param, pred))
    }

    /// Wrap a function. Fails if the contract names a parameter the function
    /// does not have, or carries a specification that can never match.
    pub fn wrap(self, function: Function) -> Result<Guarded> {
        let signature = function.signature();
        let named = self
            .types
            .keys()
            .chain(self.coercers.keys())
            .chain(self.values.keys());
        for param in named {
            if signature.param(param).is_none() {
                return Err(Error::configuration(format!(
                    "{}(): '{param}' is not a parameter",
                    function.name()
                )));
            }
        }

        let mut checks: IndexMap<String, Expected> = IndexMap::new();
        let mut returns = None;
        if let Some(check_return) = self.annotations {
            for param in signature.params() {
                if let Some(hint) = param.hint() {
                    hint.validate()?;
                    checks.insert(param.name().to_string(), Expected::Hint(hint.clone()));
                }
            }
            if check_return {
                if let Some(hint) = signature.returns() {
                    hint.validate()?;
                    returns = Some(hint.clone());
                }
            }
        }
        for (param, expected) in self.types {
            if let Expected::Hint(hint) = &expected {
                hint.validate()?;
            }
            checks.insert(param, expected);
        }

        let checks = checks
            .into_iter()
            .map(|(param, expected)| {
                let kind = signature
                    .param(&param)
                    .map_or(ParamKind::PositionalOrKeyword, |p| p.kind());
                TypeCheck {
                    param,
                    kind,
                    expected,
                }
            })
            .collect::<Vec<_>>();

        debug!(
            function = function.name(),
            coercers = self.coercers.len(),
            type_checks = checks.len(),
            value_checks = self.values.len(),
            check_return = returns.is_some(),
            "guarded function built"
        );

        Ok(Guarded {
            function,
            options: self.options,
            coercers: self.coercers.into_iter().collect(),
            checks,
            values: self.values.into_iter().collect(),
            returns,
        })
    }
}

impl fmt::Debug for Contract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Contract")
            .field("options", &self.options)
            .field("types", &self.types)
            .field("annotations", &self.annotations)
            .field("coercers", &self.coercers.keys().collect::<Vec<_>>())
            .field("values", &self.values)
            .finish()
    }
}

/// A contract checking arguments against class specifications.
pub fn enforce_types<I, K, S>(options: EnforceOptions, specs: I) -> Contract
where
    I: IntoIterator<Item = (K, S)>,
    K: Into<String>,
    S: Into<ClassInfo>,
{
    Contract::new().options(options).enforce_types(specs)
}

/// A contract checking arguments against the function's declared hints.
pub fn enforce_annotations(check_return: bool) -> Contract {
    Contract::new().enforce_annotations(check_return)
}

/// A contract coercing arguments before the call.
pub fn coerce_types<I, K>(coercers: I) -> Contract
where
    I: IntoIterator<Item = (K, Coercer)>,
    K: Into<String>,
{
    Contract::new().coerce_types(coercers)
}

/// A contract checking arguments against predicates.
pub fn enforce_values<I, K>(predicates: I) -> Contract
where
    I: IntoIterator<Item = (K, Predicate)>,
    K: Into<String>,
{
    Contract::new().enforce_values(predicates)
}

#[derive(Debug, Clone)]
struct TypeCheck {
    param: String,
    kind: ParamKind,
    expected: Expected,
}

/// A function wrapped in a contract.
#[derive(Clone)]
pub struct Guarded {
    function: Function,
    options: EnforceOptions,
    coercers: Vec<(String, Coercer)>,
    checks: Vec<TypeCheck>,
    values: Vec<(String, Predicate)>,
    returns: Option<Hint>,
}

impl Guarded {
    pub fn name(&self) -> &str {
        self.function.name()
    }

    /// The wrapped function, without checks.
    pub fn function(&self) -> &Function {
        &self.function
    }

    pub fn call(&self, args: &[Value], kwargs: &Kwargs) -> Result<Value> {
        let mut arguments = self.function.bind(args, kwargs)?;
        self.coerce(&mut arguments)?;
        self.check_types(&arguments)?;
        self.check_values(&arguments)?;
        let result = self.function.invoke(&arguments)?;
        self.check_return(&result)?;
        Ok(result)
    }

    pub fn call_positional(&self, args: &[Value]) -> Result<Value> {
        self.call(args, &Kwargs::new())
    }

    fn coerce(&self, arguments: &mut Arguments) -> Result<()> {
        for (param, coercer) in &self.coercers {
            if let Some(value) = arguments.get(param) {
                let coerced = coercer(value.clone()).map_err(Error::Coercion)?;
                trace!(function = self.name(), param = %param, "coerced argument");
                arguments.set(param, coerced);
            }
        }
        Ok(())
    }

    fn check_types(&self, arguments: &Arguments) -> Result<()> {
        for check in &self.checks {
            if !self.options.check_defaults && !arguments.is_supplied(&check.param) {
                trace!(function = self.name(), param = %check.param, "skipping default");
                continue;
            }
            let Some(value) = arguments.get(&check.param) else {
                continue;
            };
            let target = || Target::Param(check.param.clone());
            match (check.kind, value) {
                (ParamKind::VarPositional, Value::Tuple(items)) => {
                    for item in items {
                        self.check_expected(target(), item, &check.expected)?;
                    }
                }
                (ParamKind::VarKeyword, Value::Dict(pairs)) => {
                    for (_, item) in pairs {
                        self.check_expected(target(), item, &check.expected)?;
                    }
                }
                _ => self.check_expected(target(), value, &check.expected)?,
            }
        }
        Ok(())
    }

    fn check_expected(&self, target: Target, value: &Value, expected: &Expected) -> Result<()> {
        match expected {
            Expected::Hint(hint) => self.check_type(target, value, hint),
            Expected::Predicate(predicate) => {
                let ok = predicate.test(value);
                trace!(
                    function = self.name(),
                    %target,
                    predicate = predicate.name(),
                    ok,
                    "type check"
                );
                if ok {
                    return Ok(());
                }
                Err(self.mismatch(target, predicate.render_msg(Some(value)), false, value))
            }
        }
    }

    fn check_type(&self, target: Target, value: &Value, hint: &Hint) -> Result<()> {
        let ok = matches_hint(value, hint, &self.options);
        trace!(function = self.name(), %target, %hint, ok, "type check");
        if ok {
            return Ok(());
        }
        Err(self.mismatch(target, hint.to_string(), hint.contains_int(), value))
    }

    fn mismatch(
        &self,
        target: Target,
        expected: String,
        mentions_int: bool,
        value: &Value,
    ) -> Error {
        Error::TypeMismatch {
            function: self.name().to_string(),
            target,
            expected,
            notes: self.options.mismatch_notes(mentions_int),
            actual: class_repr(&value.class()),
            value: short_repr(value),
        }
    }

    fn check_values(&self, arguments: &Arguments) -> Result<()> {
        for (param, predicate) in &self.values {
            let Some(value) = arguments.get(param) else {
                continue;
            };
            let ok = predicate.test(value);
            trace!(
                function = self.name(),
                param = %param,
                predicate = predicate.name(),
                ok,
                "value check"
            );
            if !ok {
                return Err(Error::ValueConstraint {
                    function: self.name().to_string(),
                    param: param.clone(),
                    description: predicate.render_msg(Some(value)),
                    value: short_repr(value),
                });
            }
        }
        Ok(())
    }

    fn check_return(&self, result: &Value) -> Result<()> {
        match &self.returns {
            Some(hint) => self.check_type(Target::Return, result, hint),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for Guarded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Guarded")
            .field("function", &self.function)
            .field("options", &self.options)
            .field("checks", &self.checks)
            .field("returns", &self.returns)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::coerce::{to_int, to_str};
    use super::*;
    use crate::predicate::library;
    use crate::signature::{Param, Signature};
    use crate::value::Class;
    use pretty_assertions::assert_eq;

    fn identity(params: Vec<Param>) -> Function {
        let first = params.first().map(|p| p.name().to_string());
        let sig = Signature::new(params).unwrap();
        Function::new("f", sig, move |args| {
            Ok(first.as_deref().and_then(|n| args.get(n)).cloned().unwrap_or(Value::None))
        })
    }

    #[test]
    fn test_type_mismatch_names_param() {
        let f = enforce_types(EnforceOptions::new(), [("age", Class::int())])
            .wrap(identity(vec![Param::new("age")]))
            .unwrap();

        assert_eq!(f.call_positional(&[Value::from(5)]).unwrap(), Value::from(5));
        let err = f.call_positional(&[Value::from("5")]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "f(): 'age' expected 'int' (no bools as ints), got 'str' with value '5'"
        );
    }

    #[test]
    fn test_predicate_as_type_check() {
        let even = Predicate::new("even", |x| x.as_int().is_some_and(|n| n % 2 == 0))
            .with_msg("an even int");
        let f = Contract::new()
            .enforce_type_with("n", even)
            .wrap(identity(vec![Param::new("n")]))
            .unwrap();

        assert_eq!(f.call_positional(&[Value::from(4)]).unwrap(), Value::from(4));
        let err = f.call_positional(&[Value::from(3)]).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
        assert_eq!(
            err.to_string(),
            "f(): 'n' expected 'an even int', got 'int' with value 3"
        );
    }

    #[test]
    fn test_type_var_annotation() {
        let sig = Signature::new([Param::new("x").annotated(Hint::bounded("N", Class::number()))])
            .unwrap();
        let f = enforce_annotations(false)
            .wrap(Function::new("scale", sig, |args| Ok(args["x"].clone())))
            .unwrap();

        assert!(f.call_positional(&[Value::from(2.5)]).is_ok());
        assert_eq!(
            f.call_positional(&[Value::from("2")]).unwrap_err().to_string(),
            "scale(): 'x' expected 'number', got 'str' with value '2'"
        );
    }

    #[test]
    fn test_unlisted_params_unchecked() {
        let f = enforce_types(EnforceOptions::new(), [("a", Class::int())])
            .wrap(identity(vec![Param::new("a"), Param::new("b")]))
            .unwrap();
        assert!(f.call_positional(&[Value::from(1), Value::from("anything")]).is_ok());
    }

    #[test]
    fn test_unknown_param_is_configuration_error() {
        let err = enforce_types(EnforceOptions::new(), [("nope", Class::int())])
            .wrap(identity(vec![Param::new("a")]))
            .unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn test_malformed_spec_rejected_at_wrap() {
        let err = Contract::new()
            .enforce_type("a", ClassInfo::union([]))
            .wrap(identity(vec![Param::new("a")]))
            .unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn test_coerce_runs_before_type_check() {
        let f = Contract::new()
            .coerce("age", to_int)
            .enforce_type("age", Class::int())
            .wrap(identity(vec![Param::new("age")]))
            .unwrap();
        assert_eq!(f.call_positional(&[Value::from("5")]).unwrap(), Value::from(5));
    }

    #[test]
    fn test_coercion_error_passes_through() {
        let f = coerce_types([("age", Arc::new(to_int) as Coercer)])
            .wrap(identity(vec![Param::new("age")]))
            .unwrap();
        let err = f.call_positional(&[Value::from("abc")]).unwrap_err();
        assert!(matches!(err, Error::Coercion(_)));
        assert_eq!(err.to_string(), "invalid literal for int(): 'abc'");
    }

    #[test]
    fn test_value_constraint() {
        let f = enforce_values([("n", library::positive())])
            .wrap(identity(vec![Param::new("n")]))
            .unwrap();
        assert!(f.call_positional(&[Value::from(1)]).is_ok());

        let err = f.call_positional(&[Value::from(0)]).unwrap_err();
        match err {
            Error::ValueConstraint { param, .. } => assert_eq!(param, "n"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_annotations_and_return() {
        let sig = Signature::new([Param::new("x").annotated(Class::int())])
            .unwrap()
            .returning(Class::str());
        let f = Function::new("show", sig, |args| Ok(args["x"].clone()));

        let unchecked_return = enforce_annotations(false).wrap(f.clone()).unwrap();
        assert_eq!(unchecked_return.call_positional(&[Value::from(1)]).unwrap(), Value::from(1));
        assert!(unchecked_return.call_positional(&[Value::from("1")]).is_err());

        let checked = enforce_annotations(true).wrap(f).unwrap();
        let err = checked.call_positional(&[Value::from(1)]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "show(): return expected 'str', got 'int' with value 1"
        );
    }

    #[test]
    fn test_explicit_type_overrides_annotation() {
        let sig = Signature::new([Param::new("x").annotated(Class::int())]).unwrap();
        let f = Function::new("f", sig, |args| Ok(args["x"].clone()));
        let guarded = enforce_annotations(false)
            .enforce_type("x", Class::str())
            .wrap(f)
            .unwrap();
        assert!(guarded.call_positional(&[Value::from("ok")]).is_ok());
        assert!(guarded.call_positional(&[Value::from(1)]).is_err());
    }

    #[test]
    fn test_check_defaults_option() {
        let params = vec![Param::new("x").with_default("not an int")];
        let checked = enforce_types(EnforceOptions::new(), [("x", Class::int())])
            .wrap(identity(params.clone()))
            .unwrap();
        assert!(checked.call_positional(&[]).is_err());

        let lenient = enforce_types(
            EnforceOptions::new().check_defaults(false),
            [("x", Class::int())],
        )
        .wrap(identity(params))
        .unwrap();
        assert!(lenient.call_positional(&[]).is_ok());
        assert!(lenient.call_positional(&[Value::from("x")]).is_err());
    }

    #[test]
    fn test_variadic_elements_checked() {
        let sig = Signature::new([Param::var_args("items").annotated(Class::int())]).unwrap();
        let f = Function::new("total", sig, |_| Ok(Value::None));
        let guarded = enforce_annotations(false).wrap(f).unwrap();

        assert!(guarded.call_positional(&[Value::from(1), Value::from(2)]).is_ok());
        let err = guarded
            .call_positional(&[Value::from(1), Value::from("2")])
            .unwrap_err();
        assert!(matches!(
            err,
            Error::TypeMismatch { target: Target::Param(ref p), .. } if p == "items"
        ));
    }

    #[test]
    fn test_bool_rejected_for_int_unless_lenient() {
        let strict = enforce_types(EnforceOptions::new(), [("n", Class::int())])
            .wrap(identity(vec![Param::new("n")]))
            .unwrap();
        assert!(strict.call_positional(&[Value::from(true)]).is_err());

        let lenient_options = EnforceOptions::new().strict_bools(false);
        let lenient = enforce_types(lenient_options, [("n", Class::int())])
            .wrap(identity(vec![Param::new("n")]))
            .unwrap();
        assert!(lenient.call_positional(&[Value::from(true)]).is_ok());
    }

    #[test]
    fn test_subclass_note_in_message() {
        let animal = Class::new("Animal", &[]);
        let dog = Class::new("Dog", &[animal.clone()]);
        let f = enforce_types(EnforceOptions::new().allow_subclasses(false), [("pet", animal)])
            .wrap(identity(vec![Param::new("pet")]))
            .unwrap();
        let err = f.call_positional(&[Value::object(&dog)]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "f(): 'pet' expected 'Animal' (no subclasses), got 'Dog' with value <Dog object>"
        );
    }

    #[test]
    fn test_checks_finish_before_call() {
        let called = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let flag = called.clone();
        let sig = Signature::new([Param::new("s")]).unwrap();
        let f = Function::new("f", sig, move |_| {
            flag.store(true, std::sync::atomic::Ordering::SeqCst);
            Ok(Value::None)
        });
        let guarded = Contract::new()
            .coerce("s", to_str)
            .enforce_value("s", library::non_empty())
            .wrap(f)
            .unwrap();

        assert!(guarded.call_positional(&[Value::from("")]).is_err());
        assert!(!called.load(std::sync::atomic::Ordering::SeqCst));
    }
}
