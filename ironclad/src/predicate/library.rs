//! Ready-made predicates.

use std::cmp::Ordering;

use regex::Regex;

use super::Predicate;
use crate::class_info::ClassInfo;
use crate::error::{Error, Result};
use crate::options::EnforceOptions;
use crate::repr::{class_info_to_str, short_repr};
use crate::value::Value;

pub fn always() -> Predicate {
    Predicate::new("always", |_| true).with_msg("always true")
}

pub fn never() -> Predicate {
    Predicate::new("never", |_| false).with_msg("never true")
}

/// Equal to `expected`.
pub fn equals(expected: Value) -> Predicate {
    let msg = format!("expected x == {}", short_repr(&expected));
    Predicate::new("equals", move |x| *x == expected).with_msg(msg)
}

/// Within `[low, high]`, or `(low, high)` when not inclusive.
/// Values that cannot be compared with the bounds fail.
pub fn between(low: Value, high: Value, inclusive: bool) -> Predicate {
    let op = if inclusive { "<=" } else { "<" };
    let msg = format!("expected {} {op} x {op} {}", short_repr(&low), short_repr(&high));
    Predicate::new("between", move |x| {
        let above = low.compare(x);
        let below = x.compare(&high);
        match (above, below) {
            (Some(a), Some(b)) if inclusive => a != Ordering::Greater && b != Ordering::Greater,
            (Some(a), Some(b)) => a == Ordering::Less && b == Ordering::Less,
            _ => false,
        }
    })
    .with_msg(msg)
}

/// An instance of the specification, subclasses included. Bools count as
/// ints here, like a plain `isinstance` check.
pub fn instance_of(spec: impl Into<ClassInfo>) -> Predicate {
    let spec = spec.into();
    let msg = format!("expected an instance of {}", class_info_to_str(&spec));
    let options = EnforceOptions::new().strict_bools(false);
    Predicate::new("instance_of", move |x| spec.matches(x, &options)).with_msg(msg)
}

pub fn not_none() -> Predicate {
    Predicate::new("not_none", |x| !x.is_none()).with_msg("expected a value other than None")
}

pub fn positive() -> Predicate {
    Predicate::new("positive", |x| x.as_number().is_some_and(|n| n > 0.0))
        .with_msg("expected a positive number")
}

pub fn negative() -> Predicate {
    Predicate::new("negative", |x| x.as_number().is_some_and(|n| n < 0.0))
        .with_msg("expected a negative number")
}

/// Conjunction of every predicate, in order.
pub fn all_of<I: IntoIterator<Item = Predicate>>(predicates: I) -> Result<Predicate> {
    predicates
        .into_iter()
        .reduce(|acc, p| acc & p)
        .ok_or_else(|| Error::configuration("all_of() needs at least one predicate"))
}

/// Disjunction of every predicate, in order.
pub fn any_of<I: IntoIterator<Item = Predicate>>(predicates: I) -> Result<Predicate> {
    predicates
        .into_iter()
        .reduce(|acc, p| acc | p)
        .ok_or_else(|| Error::configuration("any_of() needs at least one predicate"))
}

/// Equal to one of `choices`.
pub fn one_of<I: IntoIterator<Item = Value>>(choices: I) -> Predicate {
    let choices: Vec<Value> = choices.into_iter().collect();
    let listed = choices.iter().map(short_repr).collect::<Vec<_>>().join(", ");
    Predicate::new("one_of", move |x| choices.contains(x))
        .with_msg(format!("expected one of {listed}"))
}

/// Exactly `n` long. Values without a length fail.
pub fn length(n: usize) -> Predicate {
    Predicate::new("length", move |x| x.len() == Some(n)).with_msg(format!("expected length {n}"))
}

/// Length within `[min, max]`.
pub fn length_between(min: usize, max: usize) -> Predicate {
    Predicate::new("length_between", move |x| {
        x.len().is_some_and(|len| (min..=max).contains(&len))
    })
    .with_msg(format!("expected length between {min} and {max}"))
}

pub fn non_empty() -> Predicate {
    Predicate::new("non_empty", |x| x.len().is_some_and(|len| len > 0))
        .with_msg("expected a non-empty value")
}

/// Apply `predicate` to every key of a dict.
pub fn keys(predicate: &Predicate) -> Predicate {
    predicate
        .all()
        .on(|x| match x {
            Value::Dict(pairs) => Value::List(pairs.iter().map(|(k, _)| k.clone()).collect()),
            _ => Value::None,
        })
        .with_name(format!("keys({})", predicate.name()))
}

/// Apply `predicate` to every value of a dict.
pub fn values(predicate: &Predicate) -> Predicate {
    predicate
        .all()
        .on(|x| match x {
            Value::Dict(pairs) => Value::List(pairs.iter().map(|(_, v)| v.clone()).collect()),
            _ => Value::None,
        })
        .with_name(format!("values({})", predicate.name()))
}

/// A string that matches `pattern` in full.
pub fn regex(pattern: &str) -> Result<Predicate> {
    let compiled = Regex::new(&format!("^(?:{pattern})$")).map_err(|err| {
        Error::configuration(format!("invalid regex pattern '{pattern}': {err}"))
    })?;
    Ok(Predicate::new("regex", move |x| x.as_str().is_some_and(|s| compiled.is_match(s)))
        .with_msg(format!("expected a string matching /{pattern}/")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Class;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_always_never() {
        assert!(always().test(&Value::None));
        assert!(!never().test(&Value::None));
    }

    #[test]
    fn test_equals_and_one_of() {
        assert!(equals(Value::from(3)).test(&Value::from(3)));
        assert!(!equals(Value::from(3)).test(&Value::from(4)));
        assert_eq!(equals(Value::from("a")).describe(), "expected x == 'a'");

        let colors = one_of([Value::from("red"), Value::from("blue")]);
        assert!(colors.test(&Value::from("red")));
        assert!(!colors.test(&Value::from("green")));
        assert_eq!(colors.describe(), "expected one of 'red', 'blue'");
    }

    #[test]
    fn test_between() {
        let closed = between(Value::from(1), Value::from(10), true);
        assert!(closed.test(&Value::from(1)));
        assert!(closed.test(&Value::from(10.0)));
        assert!(!closed.test(&Value::from(11)));
        assert!(!closed.test(&Value::from("5")));
        assert_eq!(closed.describe(), "expected 1 <= x <= 10");

        let open = between(Value::from(1), Value::from(10), false);
        assert!(!open.test(&Value::from(1)));
        assert!(open.test(&Value::from(5)));
    }

    #[test]
    fn test_instance_of_accepts_bools_as_ints() {
        let ints = instance_of(Class::int());
        assert!(ints.test(&Value::from(1)));
        assert!(ints.test(&Value::from(true)));
        assert!(!ints.test(&Value::from(1.0)));
        assert_eq!(
            instance_of(Class::int() | Class::str()).describe(),
            "expected an instance of int or str"
        );
    }

    #[test]
    fn test_sign() {
        assert!(positive().test(&Value::from(0.5)));
        assert!(!positive().test(&Value::from(0)));
        assert!(!positive().test(&Value::from("1")));
        assert!(negative().test(&Value::from(-1)));
        assert!(not_none().test(&Value::from(0)));
        assert!(!not_none().test(&Value::None));
    }

    #[test]
    fn test_all_of_any_of() {
        let both = all_of([positive(), between(Value::from(0), Value::from(10), true)]).unwrap();
        assert!(both.test(&Value::from(5)));
        assert!(!both.test(&Value::from(50)));

        let either = any_of([negative(), equals(Value::from(0))]).unwrap();
        assert!(either.test(&Value::from(0)));
        assert!(!either.test(&Value::from(1)));

        assert!(all_of([]).is_err());
        assert!(any_of([]).is_err());
    }

    #[test]
    fn test_lengths() {
        assert!(length(3).test(&Value::from("abc")));
        assert!(!length(3).test(&Value::from(123)));
        assert!(length_between(1, 2).test(&Value::List(vec![Value::None])));
        assert!(!length_between(1, 2).test(&Value::List(vec![])));
        assert!(non_empty().test(&Value::Dict(vec![(Value::None, Value::None)])));
        assert!(!non_empty().test(&Value::from("")));
    }

    #[test]
    fn test_keys_and_values() {
        let scores = Value::Dict(vec![
            (Value::from("alice"), Value::from(3)),
            (Value::from("bob"), Value::from(-1)),
        ]);
        assert!(keys(&instance_of(Class::str())).test(&scores));
        assert!(!values(&positive()).test(&scores));
        assert_eq!(values(&positive()).name(), "values(positive)");
        assert!(!keys(&always()).test(&Value::from(1)));
    }

    #[test]
    fn test_keys_and_values_check_each_entry() {
        let counts = Value::Dict(vec![
            (Value::from("a"), Value::from(1)),
            (Value::from("b"), Value::from(2)),
        ]);
        assert!(values(&positive()).test(&counts));
        assert!(keys(&always()).test(&counts));
        assert!(keys(&always()).test(&Value::Dict(vec![])));
        assert!(!keys(&instance_of(Class::int())).test(&counts));
        assert_eq!(
            values(&positive()).explain(&Value::Dict(vec![(Value::from("c"), Value::from(-3))])),
            Some("expected a positive number".to_string())
        );
    }

    #[test]
    fn test_regex_full_match() {
        let digits = regex(r"\d+").unwrap();
        assert!(digits.test(&Value::from("123")));
        assert!(!digits.test(&Value::from("123a")));
        assert!(!digits.test(&Value::from(123)));
        assert!(regex("(").is_err());
    }
}
