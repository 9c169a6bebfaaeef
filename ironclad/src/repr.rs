//! Human-readable rendering of classes, specifications, hints and values.
//!
//! These strings end up in error messages, so they are stable: builtins
//! render by their short name, user classes by `module.name` when they were
//! declared with a module, and alternatives are joined with ` or `.

use std::fmt;

use crate::class_info::ClassInfo;
use crate::hint::{Hint, TypeVarBound};
use crate::value::{Class, Value};

/// Values longer than this are abbreviated in diagnostics.
const MAX_REPR: usize = 80;

/// Render a class for diagnostics.
pub fn class_repr(class: &Class) -> String {
    if class == &Class::none_type() {
        return "None".to_string();
    }
    match class.module() {
        Some(module) if !class.is_builtin() => format!("{}.{}", module, class.name()),
        _ => class.name().to_string(),
    }
}

/// Render a class specification, e.g. `int or str`.
pub fn class_info_to_str(info: &ClassInfo) -> String {
    join_or(info.flatten().into_iter().map(class_repr))
}

/// Render a type hint, e.g. `dict[str, list[int]]`.
pub fn type_repr(hint: &Hint) -> String {
    match hint {
        Hint::Any => "Any".to_string(),
        Hint::None => "None".to_string(),
        Hint::Info(info) => class_info_to_str(info),
        Hint::List(element) => format!("list[{}]", type_repr(element)),
        Hint::Tuple(elements) => format!(
            "tuple[{}]",
            elements.iter().map(type_repr).collect::<Vec<_>>().join(", ")
        ),
        Hint::VarTuple(element) => format!("tuple[{}, ...]", type_repr(element)),
        Hint::Dict(key, value) => format!("dict[{}, {}]", type_repr(key), type_repr(value)),
        Hint::Literal(values) => join_or(values.iter().map(Value::to_string)),
        Hint::Union(hints) => {
            let mut flat = Vec::new();
            flatten_union(hints, &mut flat);
            join_or(flat.into_iter().map(type_repr))
        }
        Hint::TypeOf(class) => format!("type[{}]", class_repr(class)),
        Hint::TypeVar { name, bound } => match bound {
            TypeVarBound::Unbounded => name.clone(),
            TypeVarBound::Bound(hint) => type_repr(hint),
            TypeVarBound::Constraints(hints) => join_or(hints.iter().map(type_repr)),
        },
    }
}

fn flatten_union<'a>(hints: &'a [Hint], out: &mut Vec<&'a Hint>) {
    for hint in hints {
        match hint {
            Hint::Union(inner) => flatten_union(inner, out),
            other => out.push(other),
        }
    }
}

/// Join alternatives with ` or `, dropping repeats but keeping order.
fn join_or<I: IntoIterator<Item = String>>(parts: I) -> String {
    let mut seen: Vec<String> = Vec::new();
    for part in parts {
        if !seen.contains(&part) {
            seen.push(part);
        }
    }
    seen.join(" or ")
}

/// Render a value, abbreviating long output around an ellipsis.
pub fn short_repr(value: &Value) -> String {
    let full = value.to_string();
    let count = full.chars().count();
    if count <= MAX_REPR {
        return full;
    }
    let head = (MAX_REPR - 3) / 2;
    let tail = MAX_REPR - 3 - head;
    let start: String = full.chars().take(head).collect();
    let end: String = full.chars().skip(count - tail).collect();
    format!("{start}...{end}")
}

fn write_seq(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x:?}"),
            Value::Str(s) => write!(f, "'{}'", s.replace('\\', "\\\\").replace('\'', "\\'")),
            Value::Bytes(bytes) => {
                write!(f, "b'")?;
                for byte in bytes {
                    let plain = byte.is_ascii_graphic() && *byte != b'\'' && *byte != b'\\';
                    if plain || *byte == b' ' {
                        write!(f, "{}", *byte as char)?;
                    } else {
                        write!(f, "\\x{byte:02x}")?;
                    }
                }
                write!(f, "'")
            }
            Value::List(items) => {
                write!(f, "[")?;
                write_seq(f, items)?;
                write!(f, "]")
            }
            Value::Tuple(items) => {
                write!(f, "(")?;
                write_seq(f, items)?;
                if items.len() == 1 {
                    write!(f, ",")?;
                }
                write!(f, ")")
            }
            Value::Dict(pairs) => {
                write!(f, "{{")?;
                for (i, (key, value)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                write!(f, "}}")
            }
            Value::Class(class) => write!(f, "<class '{}'>", class_repr(class)),
            Value::Object(instance) => write!(f, "<{} object>", class_repr(&instance.class)),
        }
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&class_repr(self))
    }
}

impl fmt::Display for ClassInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&class_info_to_str(self))
    }
}

impl fmt::Display for Hint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&type_repr(self))
    }
}
