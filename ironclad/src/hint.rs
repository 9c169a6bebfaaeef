//! Declared type hints.
//!
//! A [`Hint`] is what a parameter or return annotation declares. It extends
//! [`ClassInfo`] with the container and special forms annotations use:
//! `Any`, `None`, `list[T]`, `tuple[A, B]`, `tuple[T, ...]`, `dict[K, V]`,
//! `Literal[...]`, unions of hints, `type[T]` and type variables.

use crate::class_info::ClassInfo;
use crate::error::{Error, Result};
use crate::options::EnforceOptions;
use crate::value::{Class, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum Hint {
    /// Accepts every value.
    Any,
    /// Accepts only `None`.
    None,
    /// A class specification.
    Info(ClassInfo),
    /// `list[T]`: a list whose elements all match.
    List(Box<Hint>),
    /// `tuple[A, B, ...]`: a tuple of exactly this shape.
    Tuple(Vec<Hint>),
    /// `tuple[T, ...]`: a tuple of any length whose elements all match.
    VarTuple(Box<Hint>),
    /// `dict[K, V]`
    Dict(Box<Hint>, Box<Hint>),
    /// `Literal[a, b]`: equal to one of the listed values.
    Literal(Vec<Value>),
    /// `A | B` over arbitrary hints.
    Union(Vec<Hint>),
    /// `type[T]`: a class object that is `T` or a subclass of it.
    TypeOf(Class),
    /// A type variable, matched through its bound or constraints.
    TypeVar { name: String, bound: TypeVarBound },
}

/// What a type variable admits.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeVarBound {
    /// Any value.
    Unbounded,
    /// Values matching the bound.
    Bound(Box<Hint>),
    /// Values matching one of the constraints.
    Constraints(Vec<Hint>),
}

impl Hint {
    pub fn class(class: &Class) -> Self {
        Hint::Info(ClassInfo::of(class))
    }

    pub fn list(element: impl Into<Hint>) -> Self {
        Hint::List(Box::new(element.into()))
    }

    pub fn tuple<I: IntoIterator<Item = Hint>>(elements: I) -> Self {
        Hint::Tuple(elements.into_iter().collect())
    }

    pub fn var_tuple(element: impl Into<Hint>) -> Self {
        Hint::VarTuple(Box::new(element.into()))
    }

    pub fn dict(key: impl Into<Hint>, value: impl Into<Hint>) -> Self {
        Hint::Dict(Box::new(key.into()), Box::new(value.into()))
    }

    pub fn literal<I: IntoIterator<Item = Value>>(values: I) -> Self {
        Hint::Literal(values.into_iter().collect())
    }

    pub fn union<I: IntoIterator<Item = Hint>>(hints: I) -> Self {
        Hint::Union(hints.into_iter().collect())
    }

    /// `T | None`
    pub fn optional(hint: impl Into<Hint>) -> Self {
        Hint::Union(vec![hint.into(), Hint::None])
    }

    pub fn type_of(class: &Class) -> Self {
        Hint::TypeOf(class.clone())
    }

    /// `T`, admitting any value.
    pub fn type_var(name: impl Into<String>) -> Self {
        Hint::TypeVar {
            name: name.into(),
            bound: TypeVarBound::Unbounded,
        }
    }

    /// `T` bound to `bound`.
    pub fn bounded(name: impl Into<String>, bound: impl Into<Hint>) -> Self {
        Hint::TypeVar {
            name: name.into(),
            bound: TypeVarBound::Bound(Box::new(bound.into())),
        }
    }

    /// `T` restricted to one of `constraints`.
    pub fn constrained<I>(name: impl Into<String>, constraints: I) -> Self
    where
        I: IntoIterator<Item = Hint>,
    {
        Hint::TypeVar {
            name: name.into(),
            bound: TypeVarBound::Constraints(constraints.into_iter().collect()),
        }
    }

    /// Reject hints that can never match anything.
    pub fn validate(&self) -> Result<()> {
        match self {
            Hint::Any | Hint::None | Hint::TypeOf(_) => Ok(()),
            Hint::Info(info) => info.validate(),
            Hint::List(inner) | Hint::VarTuple(inner) => inner.validate(),
            Hint::Tuple(elements) => elements.iter().try_for_each(Hint::validate),
            Hint::Dict(key, value) => {
                key.validate()?;
                value.validate()
            }
            Hint::Literal(values) if values.is_empty() => {
                Err(Error::configuration("Literal[] needs at least one value"))
            }
            Hint::Literal(_) => Ok(()),
            Hint::Union(hints) if hints.is_empty() => {
                Err(Error::configuration("empty union in type hint"))
            }
            Hint::Union(hints) => hints.iter().try_for_each(Hint::validate),
            Hint::TypeVar { bound, .. } => match bound {
                TypeVarBound::Unbounded => Ok(()),
                TypeVarBound::Bound(hint) => hint.validate(),
                TypeVarBound::Constraints(hints) if hints.len() < 2 => Err(Error::configuration(
                    "a constrained type variable needs at least two constraints",
                )),
                TypeVarBound::Constraints(hints) => hints.iter().try_for_each(Hint::validate),
            },
        }
    }

    /// Whether `int` appears anywhere in this hint.
    pub fn contains_int(&self) -> bool {
        match self {
            Hint::Info(info) => info.contains_int(),
            Hint::List(inner) | Hint::VarTuple(inner) => inner.contains_int(),
            Hint::Tuple(hints) | Hint::Union(hints) => hints.iter().any(Hint::contains_int),
            Hint::Dict(key, value) => key.contains_int() || value.contains_int(),
            Hint::TypeOf(class) => *class == Class::int(),
            Hint::TypeVar { bound, .. } => match bound {
                TypeVarBound::Unbounded => false,
                TypeVarBound::Bound(hint) => hint.contains_int(),
                TypeVarBound::Constraints(hints) => hints.iter().any(Hint::contains_int),
            },
            Hint::Any | Hint::None | Hint::Literal(_) => false,
        }
    }

    /// Whether this hint accepts every value: `Any`, a union with an
    /// `Any` member, or a type variable that admits one of those.
    pub fn is_unconstrained(&self) -> bool {
        match self {
            Hint::Any => true,
            Hint::Union(hints) => hints.iter().any(Hint::is_unconstrained),
            Hint::TypeVar { bound, .. } => match bound {
                TypeVarBound::Unbounded => true,
                TypeVarBound::Bound(hint) => hint.is_unconstrained(),
                TypeVarBound::Constraints(hints) => hints.iter().any(Hint::is_unconstrained),
            },
            _ => false,
        }
    }

    /// The class specification equivalent to this hint, if there is one.
    ///
    /// Only `None`, class specifications, unions of those and type
    /// variables restricted to those reduce to a [`ClassInfo`]; containers,
    /// literals and `type[T]` do not.
    pub(crate) fn as_class_info(&self) -> Option<ClassInfo> {
        match self {
            Hint::None => Some(ClassInfo::of(&Class::none_type())),
            Hint::Info(info) => Some(info.clone()),
            Hint::Union(hints)
            | Hint::TypeVar {
                bound: TypeVarBound::Constraints(hints),
                ..
            } => hints
                .iter()
                .map(Hint::as_class_info)
                .collect::<Option<Vec<_>>>()
                .map(ClassInfo::Tuple),
            Hint::TypeVar {
                bound: TypeVarBound::Bound(hint),
                ..
            } => hint.as_class_info(),
            _ => None,
        }
    }
}

/// Check a value against a type hint.
pub fn matches_hint(value: &Value, hint: &Hint, options: &EnforceOptions) -> bool {
    match hint {
        Hint::Any => true,
        Hint::None => value.is_none(),
        Hint::Info(info) => info.matches(value, options),
        Hint::List(element) => match value {
            Value::List(items) => items.iter().all(|item| matches_hint(item, element, options)),
            _ => false,
        },
        Hint::Tuple(elements) => match value {
            Value::Tuple(items) => {
                items.len() == elements.len()
                    && items
                        .iter()
                        .zip(elements)
                        .all(|(item, hint)| matches_hint(item, hint, options))
            }
            _ => false,
        },
        Hint::VarTuple(element) => match value {
            Value::Tuple(items) => items.iter().all(|item| matches_hint(item, element, options)),
            _ => false,
        },
        Hint::Dict(key, val) => match value {
            Value::Dict(pairs) => pairs
                .iter()
                .all(|(k, v)| matches_hint(k, key, options) && matches_hint(v, val, options)),
            _ => false,
        },
        Hint::Literal(values) => values.contains(value),
        Hint::Union(hints) => hints.iter().any(|hint| matches_hint(value, hint, options)),
        Hint::TypeOf(expected) => match value {
            Value::Class(class) => *expected == Class::object() || class.is_subclass_of(expected),
            _ => false,
        },
        Hint::TypeVar { bound, .. } => match bound {
            TypeVarBound::Unbounded => true,
            TypeVarBound::Bound(hint) => matches_hint(value, hint, options),
            TypeVarBound::Constraints(hints) => {
                hints.iter().any(|hint| matches_hint(value, hint, options))
            }
        },
    }
}

impl From<ClassInfo> for Hint {
    fn from(info: ClassInfo) -> Self {
        Hint::Info(info)
    }
}

impl From<Class> for Hint {
    fn from(class: Class) -> Self {
        Hint::Info(ClassInfo::Type(class))
    }
}

impl From<&Class> for Hint {
    fn from(class: &Class) -> Self {
        Hint::class(class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::DEFAULT_ENFORCE_OPTIONS;

    fn check(value: &Value, hint: &Hint) -> bool {
        matches_hint(value, hint, &DEFAULT_ENFORCE_OPTIONS)
    }

    #[test]
    fn test_any_and_none() {
        assert!(check(&Value::from(1), &Hint::Any));
        assert!(check(&Value::None, &Hint::Any));
        assert!(check(&Value::None, &Hint::None));
        assert!(!check(&Value::from(0), &Hint::None));
    }

    #[test]
    fn test_list_elements() {
        let hint = Hint::list(Class::int());
        assert!(check(&Value::List(vec![Value::from(1), Value::from(2)]), &hint));
        assert!(check(&Value::List(vec![]), &hint));
        assert!(!check(&Value::List(vec![Value::from(1), Value::from("2")]), &hint));
        assert!(!check(&Value::Tuple(vec![Value::from(1)]), &hint));
    }

    #[test]
    fn test_fixed_and_variadic_tuples() {
        let pair = Hint::tuple([Hint::class(&Class::int()), Hint::class(&Class::str())]);
        assert!(check(&Value::Tuple(vec![Value::from(1), Value::from("a")]), &pair));
        assert!(!check(&Value::Tuple(vec![Value::from(1)]), &pair));

        let many = Hint::var_tuple(Class::float());
        assert!(check(&Value::Tuple(vec![Value::from(1.0), Value::from(2.0)]), &many));
        assert!(!check(&Value::Tuple(vec![Value::from(1)]), &many));
    }

    #[test]
    fn test_dict_keys_and_values() {
        let hint = Hint::dict(Class::str(), Class::int());
        let good = Value::Dict(vec![(Value::from("a"), Value::from(1))]);
        let bad = Value::Dict(vec![(Value::from("a"), Value::from(true))]);
        assert!(check(&good, &hint));
        assert!(!check(&bad, &hint));
    }

    #[test]
    fn test_literal_and_optional() {
        let mode = Hint::literal([Value::from("r"), Value::from("w")]);
        assert!(check(&Value::from("r"), &mode));
        assert!(!check(&Value::from("x"), &mode));

        let maybe_int = Hint::optional(Class::int());
        assert!(check(&Value::None, &maybe_int));
        assert!(check(&Value::from(3), &maybe_int));
        assert!(!check(&Value::from("3"), &maybe_int));
    }

    #[test]
    fn test_type_of() {
        let animal = Class::new("Animal", &[]);
        let dog = Class::new("Dog", &[animal.clone()]);
        let hint = Hint::type_of(&animal);

        assert!(check(&Value::Class(dog), &hint));
        assert!(!check(&Value::Class(Class::int()), &hint));
        assert!(!check(&Value::object(&animal), &hint));
        assert!(check(&Value::Class(Class::int()), &Hint::type_of(&Class::object())));
    }

    #[test]
    fn test_type_vars() {
        let any_t = Hint::type_var("T");
        assert!(check(&Value::from("x"), &any_t));
        assert!(any_t.is_unconstrained());

        let numeric = Hint::bounded("N", Class::number());
        assert!(check(&Value::from(2.5), &numeric));
        assert!(check(&Value::from(2), &numeric));
        assert!(!check(&Value::from("2"), &numeric));
        assert!(!numeric.is_unconstrained());

        let text = Hint::constrained(
            "S",
            [Hint::class(&Class::str()), Hint::class(&Class::bytes())],
        );
        assert!(check(&Value::from("a"), &text));
        assert!(check(&Value::Bytes(vec![1]), &text));
        assert!(!check(&Value::from(1), &text));
        assert_eq!(
            text.as_class_info(),
            Some(ClassInfo::Tuple(vec![
                ClassInfo::of(&Class::str()),
                ClassInfo::of(&Class::bytes()),
            ]))
        );

        assert!(text.validate().is_ok());
        assert!(Hint::constrained("S", [Hint::class(&Class::str())]).validate().is_err());
        assert!(Hint::bounded("B", ClassInfo::union([])).validate().is_err());
    }

    #[test]
    fn test_validate() {
        assert!(Hint::union([]).validate().is_err());
        assert!(Hint::literal([]).validate().is_err());
        assert!(Hint::list(ClassInfo::union([])).validate().is_err());
        assert!(Hint::optional(Class::int()).validate().is_ok());
    }

    #[test]
    fn test_unconstrained() {
        assert!(Hint::Any.is_unconstrained());
        assert!(Hint::union([Hint::class(&Class::int()), Hint::Any]).is_unconstrained());
        assert!(!Hint::optional(Class::int()).is_unconstrained());
    }

    #[test]
    fn test_as_class_info() {
        assert_eq!(
            Hint::class(&Class::int()).as_class_info(),
            Some(ClassInfo::of(&Class::int()))
        );
        assert_eq!(
            Hint::optional(Class::int()).as_class_info(),
            Some(ClassInfo::tuple([
                ClassInfo::of(&Class::int()),
                ClassInfo::of(&Class::none_type()),
            ]))
        );
        assert_eq!(Hint::list(Class::int()).as_class_info(), None);
        assert_eq!(Hint::Any.as_class_info(), None);
    }
}
