//! Dynamic values and the class hierarchy they are checked against.
//!
//! Every [`Value`] reports a runtime [`Class`]. Classes form an acyclic
//! graph through their bases, rooted at `object`. The builtin hierarchy is:
//!
//! ```text
//! object
//! ├── number
//! │   ├── int
//! │   │   └── bool
//! │   └── float
//! ├── str, bytes, list, tuple, dict
//! ├── NoneType
//! └── type
//! ```
//!
//! User classes are created with [`Class::new`] and may list several bases.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU32, Ordering as AtomicOrdering};
use std::sync::{Arc, OnceLock};

use indexmap::IndexMap;

static NEXT_CLASS_ID: AtomicU32 = AtomicU32::new(0);

/// Unique identity of a class. Two classes are the same type iff their ids match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(u32);

#[derive(Debug)]
struct ClassData {
    id: ClassId,
    name: String,
    module: Option<String>,
    bases: Vec<Class>,
    builtin: bool,
}

/// A runtime type. Cheap to clone; compared by identity.
#[derive(Clone)]
pub struct Class(Arc<ClassData>);

struct Builtins {
    object: Class,
    none_type: Class,
    number: Class,
    int: Class,
    bool: Class,
    float: Class,
    str: Class,
    bytes: Class,
    list: Class,
    tuple: Class,
    dict: Class,
    type_: Class,
}

impl Builtins {
    fn init() -> Self {
        let object = Class::alloc("object", None, Vec::new(), true);
        let builtin = |name: &str, base: &Class| Class::alloc(name, None, vec![base.clone()], true);

        let number = builtin("number", &object);
        let int = builtin("int", &number);
        let bool = builtin("bool", &int);
        let float = builtin("float", &number);

        Self {
            none_type: builtin("NoneType", &object),
            str: builtin("str", &object),
            bytes: builtin("bytes", &object),
            list: builtin("list", &object),
            tuple: builtin("tuple", &object),
            dict: builtin("dict", &object),
            type_: builtin("type", &object),
            number,
            int,
            bool,
            float,
            object,
        }
    }
}

fn builtins() -> &'static Builtins {
    static BUILTINS: OnceLock<Builtins> = OnceLock::new();
    BUILTINS.get_or_init(Builtins::init)
}

impl Class {
    fn alloc(name: &str, module: Option<&str>, bases: Vec<Class>, builtin: bool) -> Self {
        let id = ClassId(NEXT_CLASS_ID.fetch_add(1, AtomicOrdering::Relaxed));
        Class(Arc::new(ClassData {
            id,
            name: name.to_string(),
            module: module.map(str::to_string),
            bases,
            builtin,
        }))
    }

    /// Declare a user class. A class with no bases derives from `object`.
    pub fn new(name: &str, bases: &[Class]) -> Self {
        Self::declare(name, None, bases)
    }

    /// Declare a user class that renders as `module.name` in diagnostics.
    pub fn new_in(module: &str, name: &str, bases: &[Class]) -> Self {
        Self::declare(name, Some(module), bases)
    }

    fn declare(name: &str, module: Option<&str>, bases: &[Class]) -> Self {
        let bases = if bases.is_empty() {
            vec![Class::object()]
        } else {
            bases.to_vec()
        };
        Self::alloc(name, module, bases, false)
    }

    pub fn object() -> Class {
        builtins().object.clone()
    }

    pub fn none_type() -> Class {
        builtins().none_type.clone()
    }

    /// Abstract numeric base shared by `int` and `float`.
    pub fn number() -> Class {
        builtins().number.clone()
    }

    pub fn int() -> Class {
        builtins().int.clone()
    }

    pub fn bool() -> Class {
        builtins().bool.clone()
    }

    pub fn float() -> Class {
        builtins().float.clone()
    }

    pub fn str() -> Class {
        builtins().str.clone()
    }

    pub fn bytes() -> Class {
        builtins().bytes.clone()
    }

    pub fn list() -> Class {
        builtins().list.clone()
    }

    pub fn tuple() -> Class {
        builtins().tuple.clone()
    }

    pub fn dict() -> Class {
        builtins().dict.clone()
    }

    /// The class of class objects.
    pub fn type_() -> Class {
        builtins().type_.clone()
    }

    pub fn id(&self) -> ClassId {
        self.0.id
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn module(&self) -> Option<&str> {
        self.0.module.as_deref()
    }

    pub fn bases(&self) -> &[Class] {
        &self.0.bases
    }

    pub fn is_builtin(&self) -> bool {
        self.0.builtin
    }

    /// Check whether `self` is `other` or inherits from it, directly or not.
    pub fn is_subclass_of(&self, other: &Class) -> bool {
        if self == other {
            return true;
        }
        // Bases are fixed at declaration, so the graph is acyclic.
        self.0.bases.iter().any(|base| base.is_subclass_of(other))
    }

    /// Check whether `self` strictly inherits from `other`.
    pub fn is_strict_subclass_of(&self, other: &Class) -> bool {
        self != other && self.is_subclass_of(other)
    }
}

impl PartialEq for Class {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for Class {}

impl Hash for Class {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Class({})", self.0.name)
    }
}

/// An instance of a user class.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    pub class: Class,
    pub fields: IndexMap<String, Value>,
}

/// A dynamically typed value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    /// Ordered key/value pairs.
    Dict(Vec<(Value, Value)>),
    /// A class object, e.g. the `int` in `f(int)`.
    Class(Class),
    Object(Arc<Instance>),
}

impl Value {
    /// Create an instance of `class` with no fields.
    pub fn object(class: &Class) -> Self {
        Value::Object(Arc::new(Instance {
            class: class.clone(),
            fields: IndexMap::new(),
        }))
    }

    /// Create an instance of `class` with the given fields.
    pub fn object_with<I, K>(class: &Class, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Value::Object(Arc::new(Instance {
            class: class.clone(),
            fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }))
    }

    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    /// The runtime class of this value.
    pub fn class(&self) -> Class {
        match self {
            Value::None => Class::none_type(),
            Value::Bool(_) => Class::bool(),
            Value::Int(_) => Class::int(),
            Value::Float(_) => Class::float(),
            Value::Str(_) => Class::str(),
            Value::Bytes(_) => Class::bytes(),
            Value::List(_) => Class::list(),
            Value::Tuple(_) => Class::tuple(),
            Value::Dict(_) => Class::dict(),
            Value::Class(_) => Class::type_(),
            Value::Object(instance) => instance.class.clone(),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Integer view; booleans count as 0 and 1.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    /// Numeric view of bools, ints and floats.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Elements of a list or tuple.
    pub fn as_slice(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) | Value::Tuple(items) => Some(items),
            _ => None,
        }
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Object(instance) => instance.fields.get(name),
            _ => None,
        }
    }

    /// Length of sized values; strings count characters.
    pub fn len(&self) -> Option<usize> {
        match self {
            Value::Str(s) => Some(s.chars().count()),
            Value::Bytes(b) => Some(b.len()),
            Value::List(items) | Value::Tuple(items) => Some(items.len()),
            Value::Dict(pairs) => Some(pairs.len()),
            _ => None,
        }
    }

    /// Order two values the way comparison operators would.
    ///
    /// Numbers compare across bool/int/float; strings, bytes and sequences
    /// compare lexicographically. Anything else is unordered.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
            (Value::Bytes(a), Value::Bytes(b)) => Some(a.cmp(b)),
            (Value::List(a), Value::List(b)) | (Value::Tuple(a), Value::Tuple(b)) => {
                for (x, y) in a.iter().zip(b) {
                    match x.compare(y)? {
                        Ordering::Equal => continue,
                        ord => return Some(ord),
                    }
                }
                Some(a.len().cmp(&b.len()))
            }
            _ => {
                let (a, b) = (self.as_number()?, other.as_number()?);
                a.partial_cmp(&b)
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Class> for Value {
    fn from(class: Class) -> Self {
        Value::Class(class)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::None
    }
}
