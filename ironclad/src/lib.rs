//! Ironclad
//!
//! Runtime contract enforcement and multiple dispatch over dynamic values.
//!
//! # Features
//!
//! - Class specifications (`int`, `int | str`, nested tuples) with a
//!   configurable matcher: subclass policy, strict bools
//! - Type hints for containers, literals, optionals and `type[T]`
//! - Named, composable value predicates with readable failure messages
//! - Contracts around functions: coerce, check types, check values, call,
//!   check the return value
//! - Multimethods that dispatch on runtime argument classes, most specific
//!   overload first
//!
//! # Example
//!
//! ```rust,ignore
//! use ironclad::{enforce_types, predicate::library, Class, EnforceOptions, Value};
//!
//! let register = enforce_types(EnforceOptions::new(), [("age", Class::int())])
//!     .coerce("age", ironclad::guard::coerce::to_int)
//!     .enforce_value("age", library::positive())
//!     .wrap(register_fn)?;
//!
//! register.call_positional(&[Value::from("5")])?;
//!
//! let mut registry = Registry::new();
//! registry.runtime_overload(area_ints)?;
//! registry.runtime_overload(area_floats)?;
//! registry.call("area", &[Value::from(3), Value::from(4)], &Kwargs::new())?;
//! ```

pub mod class_info;
pub mod dispatch;
pub mod error;
pub mod function;
pub mod guard;
pub mod hint;
pub mod options;
pub mod predicate;
pub mod repr;
pub mod signature;
pub mod value;

pub use class_info::{matches, ClassInfo};
pub use dispatch::{
    compare_specificity, runtime_overload, AmbiguityError, DispatchResult, Multimethod,
    NoMatchError, Overload, Registry,
};
pub use error::{BoxError, Error, Result, Target};
pub use function::{Function, Kwargs};
pub use guard::{
    coerce_types, enforce_annotations, enforce_types, enforce_values, Coercer, Contract, Guarded,
};
pub use hint::{matches_hint, Hint, TypeVarBound};
pub use options::{AmbiguityPolicy, Config, DispatchConfig, EnforceOptions, DEFAULT_ENFORCE_OPTIONS};
pub use predicate::{Predicate, Violation};
pub use repr::{class_info_to_str, type_repr};
pub use signature::{Arguments, BindError, BoundArg, Param, ParamKind, Signature};
pub use value::{Class, ClassId, Instance, Value};
