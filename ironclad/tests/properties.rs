//! Property-based tests for the matcher, predicates and dispatch.

use ironclad::predicate::library;
use ironclad::{
    matches, Class, ClassInfo, EnforceOptions, Function, Multimethod, Param, Signature, Value,
};
use proptest::prelude::*;

/// Builtin classes a value can have, excluding containers.
fn scalar_classes() -> Vec<Class> {
    vec![
        Class::object(),
        Class::none_type(),
        Class::number(),
        Class::int(),
        Class::bool(),
        Class::float(),
        Class::str(),
        Class::bytes(),
    ]
}

fn arb_class() -> impl Strategy<Value = Class> {
    prop::sample::select(scalar_classes())
}

fn arb_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::None),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Int),
        (-1.0e9..1.0e9f64).prop_map(Value::Float),
        "[a-z]{0,8}".prop_map(Value::Str),
        prop::collection::vec(any::<u8>(), 0..8).prop_map(Value::Bytes),
    ]
}

fn arb_options() -> impl Strategy<Value = EnforceOptions> {
    (any::<bool>(), any::<bool>(), any::<bool>()).prop_map(|(subclasses, defaults, bools)| {
        EnforceOptions::new()
            .allow_subclasses(subclasses)
            .check_defaults(defaults)
            .strict_bools(bools)
    })
}

fn arb_spec(depth: u32) -> BoxedStrategy<ClassInfo> {
    let leaf = prop_oneof![
        arb_class().prop_map(ClassInfo::Type),
        prop::collection::vec(arb_class(), 1..4).prop_map(ClassInfo::Union),
    ];
    if depth == 0 {
        leaf.boxed()
    } else {
        prop_oneof![
            3 => leaf,
            1 => prop::collection::vec(arb_spec(depth - 1), 1..3).prop_map(ClassInfo::Tuple),
        ]
        .boxed()
    }
}

fn unary(tag: i64, class: Class) -> Function {
    let sig = Signature::new([Param::new("x").annotated(class)]).unwrap();
    Function::new("f", sig, move |_| Ok(Value::Int(tag)))
}

fn binary(tag: i64, x: ClassInfo, y: ClassInfo) -> Function {
    let sig = Signature::new([Param::new("x").annotated(x), Param::new("y").annotated(y)]).unwrap();
    Function::new("f", sig, move |_| Ok(Value::Int(tag)))
}

proptest! {
    #[test]
    fn single_type_respects_subclass_policy(value in arb_value(), class in arb_class()) {
        let lenient = EnforceOptions::new().strict_bools(false);
        let actual = value.class();

        prop_assert_eq!(
            matches(&value, &ClassInfo::of(&class), &lenient),
            actual.is_subclass_of(&class)
        );
        prop_assert_eq!(
            matches(&value, &ClassInfo::of(&class), &lenient.allow_subclasses(false)),
            actual == class
        );
    }

    #[test]
    fn tuple_and_union_agree(
        value in arb_value(),
        a in arb_class(),
        b in arb_class(),
        options in arb_options(),
    ) {
        let tuple = ClassInfo::tuple([ClassInfo::of(&a), ClassInfo::of(&b)]);
        let union = a | b;
        prop_assert_eq!(matches(&value, &tuple, &options), matches(&value, &union, &options));
    }

    #[test]
    fn nested_spec_matches_iff_some_class_matches(
        value in arb_value(),
        spec in arb_spec(2),
        options in arb_options(),
    ) {
        let any_member = spec
            .flatten()
            .into_iter()
            .any(|class| matches(&value, &ClassInfo::of(class), &options));
        prop_assert_eq!(matches(&value, &spec, &options), any_member);
    }

    #[test]
    fn strict_bools_never_pass_as_int(b in any::<bool>(), options in arb_options()) {
        let int = ClassInfo::of(&Class::int());
        let expected = !options.strict_bools && options.allow_subclasses;
        prop_assert_eq!(matches(&Value::Bool(b), &int, &options), expected);
    }

    #[test]
    fn matching_is_idempotent(value in arb_value(), spec in arb_spec(2), options in arb_options()) {
        prop_assert_eq!(matches(&value, &spec, &options), matches(&value, &spec, &options));
    }

    #[test]
    fn predicates_are_idempotent(n in any::<i64>()) {
        let pred = library::positive() & !library::equals(Value::Int(7));
        let value = Value::Int(n);
        prop_assert_eq!(pred.test(&value), pred.test(&value));
        prop_assert_eq!(pred.test(&value), n > 0 && n != 7);
    }

    #[test]
    fn specificity_is_antisymmetric(a in arb_spec(1), b in arb_spec(1)) {
        if a.is_more_specific_than(&b) {
            prop_assert!(!b.is_more_specific_than(&a));
            prop_assert!(a.is_at_least_as_specific_as(&b));
        }
        prop_assert!(!a.is_more_specific_than(&a));
    }

    #[test]
    fn dispatch_is_deterministic_and_most_specific(
        value in arb_value(),
        classes in prop::collection::vec(arb_class(), 1..6),
    ) {
        let mut mm = Multimethod::new("f");
        for (i, class) in classes.iter().enumerate() {
            mm.overload(unary(i as i64, class.clone())).unwrap();
        }

        let first = mm.call_positional(std::slice::from_ref(&value));
        let second = mm.call_positional(std::slice::from_ref(&value));
        prop_assert_eq!(first.is_ok(), second.is_ok());

        if let (Ok(Value::Int(chosen)), Ok(Value::Int(again))) = (&first, &second) {
            prop_assert_eq!(chosen, again);
            let winner = &classes[*chosen as usize];
            let options = EnforceOptions::new();
            // No applicable overload is strictly more specific than the winner.
            for class in &classes {
                if matches(&value, &ClassInfo::of(class), &options) {
                    prop_assert!(!class.is_strict_subclass_of(winner));
                }
            }
            // Among equally specific overloads, the earliest registered wins.
            let earliest = classes.iter().position(|c| c == winner);
            prop_assert_eq!(earliest, Some(*chosen as usize));
        }
    }

    #[test]
    fn more_specific_in_every_parameter_wins(
        first in arb_value(),
        second in arb_value(),
        wider_first in arb_class(),
        wider_second in arb_class(),
        specific_registered_first in any::<bool>(),
    ) {
        let (c1, c2) = (first.class(), second.class());
        prop_assume!(!wider_first.is_subclass_of(&c1) && !wider_second.is_subclass_of(&c2));

        let specific = binary(0, ClassInfo::of(&c1), ClassInfo::of(&c2));
        let general = binary(1, c1.clone() | wider_first, c2.clone() | wider_second);
        let mut mm = Multimethod::new("f");
        if specific_registered_first {
            mm.overload(specific).unwrap().overload(general).unwrap();
        } else {
            mm.overload(general).unwrap().overload(specific).unwrap();
        }

        prop_assert_eq!(mm.call_positional(&[first, second]).unwrap(), Value::Int(0));
    }
}
