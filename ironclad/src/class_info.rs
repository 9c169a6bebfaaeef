//! Class specifications and the matcher that checks values against them.
//!
//! A [`ClassInfo`] is one of:
//!
//! - a single class: `int`
//! - a union of classes: `int | str`
//! - a tuple of nested specifications: `(int, (str, bytes))`
//!
//! Unions and tuples both mean "any of", so `matches(v, (A, B))` and
//! `matches(v, A | B)` always agree. They differ only in how they are
//! written and rendered.
//!
//! Specifications also carry a partial order used by multiple dispatch:
//! `a` is at least as specific as `b` when every class `a` admits is a
//! subclass of some class `b` admits. Comparing a union with a single class
//! therefore goes through the union's most general member.

use std::ops::BitOr;

use tracing::trace;

use crate::error::{Error, Result};
use crate::options::EnforceOptions;
use crate::value::{Class, Value};

/// A recursive type specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassInfo {
    Type(Class),
    Union(Vec<Class>),
    Tuple(Vec<ClassInfo>),
}

impl ClassInfo {
    pub fn of(class: &Class) -> Self {
        ClassInfo::Type(class.clone())
    }

    pub fn union<I: IntoIterator<Item = Class>>(classes: I) -> Self {
        ClassInfo::Union(classes.into_iter().collect())
    }

    pub fn tuple<I: IntoIterator<Item = ClassInfo>>(specs: I) -> Self {
        ClassInfo::Tuple(specs.into_iter().collect())
    }

    /// Reject specifications that can never match anything.
    pub fn validate(&self) -> Result<()> {
        match self {
            ClassInfo::Type(_) => Ok(()),
            ClassInfo::Union(classes) if classes.is_empty() => {
                Err(Error::configuration("empty union in class specification"))
            }
            ClassInfo::Union(_) => Ok(()),
            ClassInfo::Tuple(specs) if specs.is_empty() => {
                Err(Error::configuration("empty tuple in class specification"))
            }
            ClassInfo::Tuple(specs) => specs.iter().try_for_each(ClassInfo::validate),
        }
    }

    /// Check a value against this specification.
    pub fn matches(&self, value: &Value, options: &EnforceOptions) -> bool {
        self.admits(&value.class(), options)
    }

    /// Check a runtime class against this specification.
    pub fn admits(&self, actual: &Class, options: &EnforceOptions) -> bool {
        match self {
            ClassInfo::Type(expected) => class_matches(actual, expected, options),
            ClassInfo::Union(members) => members
                .iter()
                .any(|expected| class_matches(actual, expected, options)),
            ClassInfo::Tuple(specs) => specs.iter().any(|spec| spec.admits(actual, options)),
        }
    }

    /// All classes this specification admits, left to right.
    pub fn flatten(&self) -> Vec<&Class> {
        let mut out = Vec::new();
        self.collect_classes(&mut out);
        out
    }

    fn collect_classes<'a>(&'a self, out: &mut Vec<&'a Class>) {
        match self {
            ClassInfo::Type(class) => out.push(class),
            ClassInfo::Union(members) => out.extend(members.iter()),
            ClassInfo::Tuple(specs) => {
                for spec in specs {
                    spec.collect_classes(out);
                }
            }
        }
    }

    /// Whether `int` appears anywhere in this specification.
    pub fn contains_int(&self) -> bool {
        let int = Class::int();
        self.flatten().into_iter().any(|class| *class == int)
    }

    /// Check whether every class admitted by `self` is a subclass of some
    /// class admitted by `other`.
    pub fn is_at_least_as_specific_as(&self, other: &ClassInfo) -> bool {
        let general = other.flatten();
        self.flatten()
            .into_iter()
            .all(|class| general.iter().any(|g| class.is_subclass_of(g)))
    }

    /// Check whether `self` is at least as specific as `other` and not the reverse.
    pub fn is_more_specific_than(&self, other: &ClassInfo) -> bool {
        self.is_at_least_as_specific_as(other) && !other.is_at_least_as_specific_as(self)
    }
}

/// Check a value against a class specification.
pub fn matches(value: &Value, spec: &ClassInfo, options: &EnforceOptions) -> bool {
    let result = spec.matches(value, options);
    trace!(spec = ?spec, result, "class info match");
    result
}

fn class_matches(actual: &Class, expected: &Class, options: &EnforceOptions) -> bool {
    if options.strict_bools && *actual == Class::bool() && rejects_bools(expected) {
        return false;
    }
    if actual == expected {
        return true;
    }
    options.allow_subclasses && actual.is_subclass_of(expected)
}

/// `int` and its numeric bases, which a bool satisfies only structurally.
fn rejects_bools(expected: &Class) -> bool {
    let int = Class::int();
    *expected == int || (*expected != Class::object() && int.is_strict_subclass_of(expected))
}

impl From<Class> for ClassInfo {
    fn from(class: Class) -> Self {
        ClassInfo::Type(class)
    }
}

impl From<&Class> for ClassInfo {
    fn from(class: &Class) -> Self {
        ClassInfo::Type(class.clone())
    }
}

impl BitOr for Class {
    type Output = ClassInfo;

    fn bitor(self, rhs: Class) -> ClassInfo {
        ClassInfo::Union(vec![self, rhs])
    }
}

impl BitOr<Class> for ClassInfo {
    type Output = ClassInfo;

    fn bitor(self, rhs: Class) -> ClassInfo {
        match self {
            ClassInfo::Type(class) => ClassInfo::Union(vec![class, rhs]),
            ClassInfo::Union(mut members) => {
                members.push(rhs);
                ClassInfo::Union(members)
            }
            tuple @ ClassInfo::Tuple(_) => ClassInfo::Tuple(vec![tuple, ClassInfo::Type(rhs)]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::DEFAULT_ENFORCE_OPTIONS;

    fn lenient() -> EnforceOptions {
        EnforceOptions::new().strict_bools(false)
    }

    #[test]
    fn test_single_type_exact() {
        let spec = ClassInfo::of(&Class::int());
        assert!(matches(&Value::from(5), &spec, &DEFAULT_ENFORCE_OPTIONS));
        assert!(!matches(&Value::from("5"), &spec, &DEFAULT_ENFORCE_OPTIONS));
    }

    #[test]
    fn test_subclass_policy() {
        let animal = Class::new("Animal", &[]);
        let dog = Class::new("Dog", &[animal.clone()]);
        let spec = ClassInfo::of(&animal);
        let rex = Value::object(&dog);

        assert!(matches(&rex, &spec, &DEFAULT_ENFORCE_OPTIONS));
        assert!(!matches(&rex, &spec, &EnforceOptions::new().allow_subclasses(false)));
    }

    #[test]
    fn test_strict_bools() {
        let int = ClassInfo::of(&Class::int());
        let number = ClassInfo::of(&Class::number());
        let object = ClassInfo::of(&Class::object());
        let yes = Value::from(true);

        assert!(!matches(&yes, &int, &DEFAULT_ENFORCE_OPTIONS));
        assert!(!matches(&yes, &number, &DEFAULT_ENFORCE_OPTIONS));
        assert!(matches(&yes, &object, &DEFAULT_ENFORCE_OPTIONS));
        assert!(matches(&yes, &ClassInfo::of(&Class::bool()), &DEFAULT_ENFORCE_OPTIONS));

        assert!(matches(&yes, &int, &lenient()));
        assert!(matches(&yes, &number, &lenient()));
    }

    #[test]
    fn test_strict_bools_inside_union() {
        let spec = Class::int() | Class::str();
        assert!(!matches(&Value::from(false), &spec, &DEFAULT_ENFORCE_OPTIONS));
        assert!(matches(&Value::from(false), &spec, &lenient()));
    }

    #[test]
    fn test_union_and_tuple_agree() {
        let union = Class::int() | Class::str();
        let tuple = ClassInfo::tuple([ClassInfo::of(&Class::int()), ClassInfo::of(&Class::str())]);

        for value in [Value::from(1), Value::from("a"), Value::from(1.5), Value::None] {
            assert_eq!(
                matches(&value, &union, &DEFAULT_ENFORCE_OPTIONS),
                matches(&value, &tuple, &DEFAULT_ENFORCE_OPTIONS),
            );
        }
    }

    #[test]
    fn test_nested_tuple() {
        let spec = ClassInfo::tuple([
            ClassInfo::of(&Class::float()),
            ClassInfo::tuple([ClassInfo::union([Class::str(), Class::bytes()])]),
        ]);
        assert!(matches(&Value::Bytes(vec![1]), &spec, &DEFAULT_ENFORCE_OPTIONS));
        assert!(!matches(&Value::from(1), &spec, &DEFAULT_ENFORCE_OPTIONS));
    }

    #[test]
    fn test_validate_rejects_empty() {
        assert!(ClassInfo::union([]).validate().is_err());
        assert!(ClassInfo::tuple([]).validate().is_err());
        assert!(ClassInfo::tuple([ClassInfo::of(&Class::int()), ClassInfo::union([])])
            .validate()
            .is_err());
        assert!((Class::int() | Class::float()).validate().is_ok());
    }

    #[test]
    fn test_bitor_extends_union() {
        let spec = Class::int() | Class::str() | Class::bytes();
        assert_eq!(spec, ClassInfo::union([Class::int(), Class::str(), Class::bytes()]));
    }

    #[test]
    fn test_specificity_single_types() {
        let int = ClassInfo::of(&Class::int());
        let number = ClassInfo::of(&Class::number());

        assert!(int.is_more_specific_than(&number));
        assert!(!number.is_more_specific_than(&int));
        assert!(!int.is_more_specific_than(&int));
    }

    #[test]
    fn test_specificity_concrete_beats_union() {
        let int = ClassInfo::of(&Class::int());
        let union = Class::int() | Class::str();

        assert!(int.is_more_specific_than(&union));
        assert!(!union.is_more_specific_than(&int));
    }

    #[test]
    fn test_specificity_siblings_incomparable() {
        let int = ClassInfo::of(&Class::int());
        let float = ClassInfo::of(&Class::float());

        assert!(!int.is_at_least_as_specific_as(&float));
        assert!(!float.is_at_least_as_specific_as(&int));
    }

    #[test]
    fn test_contains_int() {
        assert!((Class::str() | Class::int()).contains_int());
        assert!(!ClassInfo::of(&Class::bool()).contains_int());
    }
}
