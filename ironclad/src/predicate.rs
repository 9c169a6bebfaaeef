//! Named, composable value predicates.
//!
//! A [`Predicate`] pairs a boolean test with a name and a failure message.
//! Predicates combine with `&`, `|`, `^` and `!` (or [`Predicate::and`],
//! [`Predicate::or`], [`Predicate::xor`], [`Predicate::negate`]); the
//! combined predicate describes itself from its operands, e.g.
//! `(expected a positive number) and (expected 1 <= x <= 10)`.
//!
//! Tests short-circuit: the right operand of a conjunction is not evaluated
//! when the left one fails, and likewise for disjunctions that succeed.
//!
//! A test that panics is a bug in the predicate, not a validation failure.
//! The engine does not catch it.

pub mod library;

use std::fmt;
use std::ops::{BitAnd, BitOr, BitXor, Not};
use std::sync::Arc;

use thiserror::Error;

use crate::repr::short_repr;
use crate::value::Value;

type TestFn = dyn Fn(&Value) -> bool + Send + Sync;
type RenderFn = dyn Fn(Option<&Value>) -> String + Send + Sync;

#[derive(Clone)]
enum Message {
    /// Static text; `{x}` is replaced with the tested value, or `None`.
    Text(String),
    Render(Arc<RenderFn>),
}

/// A boolean test over one value, with a name and a failure message.
#[derive(Clone)]
pub struct Predicate {
    test: Arc<TestFn>,
    name: String,
    msg: Message,
    /// Predicates this one was lifted from, oldest first.
    context: Vec<Predicate>,
}

/// A value rejected by [`Predicate::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{label}: {message} (got {value})")]
pub struct Violation {
    pub label: String,
    pub message: String,
    pub value: String,
}

impl Predicate {
    /// Create a predicate whose failure message is its name.
    pub fn new<F>(name: impl Into<String>, test: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        let name = name.into();
        Self {
            test: Arc::new(test),
            msg: Message::Text(name.clone()),
            name,
            context: Vec::new(),
        }
    }

    /// Replace the failure message. `{x}` in the text renders the value.
    pub fn with_msg(mut self, msg: impl Into<String>) -> Self {
        self.msg = Message::Text(msg.into());
        self
    }

    /// Replace the failure message with one computed from the value.
    pub fn with_msg_fn<F>(mut self, render: F) -> Self
    where
        F: Fn(Option<&Value>) -> String + Send + Sync + 'static,
    {
        self.msg = Message::Render(Arc::new(render));
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Evaluate the predicate.
    pub fn test(&self, value: &Value) -> bool {
        (self.test)(value)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The failure message without a value.
    pub fn describe(&self) -> String {
        self.render_msg(None)
    }

    /// The failure message for a given value.
    pub fn render_msg(&self, value: Option<&Value>) -> String {
        match &self.msg {
            Message::Text(text) if text.contains("{x}") => {
                let rendered = value.map_or_else(|| "None".to_string(), short_repr);
                text.replace("{x}", &rendered)
            }
            Message::Text(text) => text.clone(),
            Message::Render(render) => render(value),
        }
    }

    /// The failure message followed by the chain of predicates this one was
    /// lifted from, keeping at most `max_chain` names.
    pub fn render_with_context(&self, value: Option<&Value>, max_chain: usize) -> String {
        let msg = self.render_msg(value);
        if self.context.is_empty() {
            return msg;
        }
        let start = self.context.len().saturating_sub(max_chain.saturating_sub(1));
        let chain: Vec<String> = self.context[start..]
            .iter()
            .chain(std::iter::once(self))
            .map(|pred| format!("'{}'", pred.name))
            .collect();
        format!("{msg} [via {}]", chain.join(" -> "))
    }

    /// One line per predicate in the lift chain, newest first.
    pub fn render_tree(&self, value: Option<&Value>) -> String {
        let mut lines = vec![format!("{}: {}", self.name, self.render_msg(value))];
        lines.extend(
            self.context
                .iter()
                .rev()
                .map(|pred| format!("\tfrom {}: {}", pred.name, pred.render_msg(value))),
        );
        lines.join("\n")
    }

    /// `None` if the value passes, otherwise why it fails.
    pub fn explain(&self, value: &Value) -> Option<String> {
        if self.test(value) {
            None
        } else {
            Some(self.render_msg(Some(value)))
        }
    }

    /// Return the value if it passes.
    pub fn validate<'v>(&self, value: &'v Value, label: &str) -> Result<&'v Value, Violation> {
        if self.test(value) {
            return Ok(value);
        }
        Err(Violation {
            label: label.to_string(),
            message: self.render_msg(Some(value)),
            value: short_repr(value),
        })
    }

    /// Both predicates must pass.
    pub fn and(&self, other: &Predicate) -> Predicate {
        let (lhs, rhs) = (Arc::new(self.clone()), Arc::new(other.clone()));
        let (msg_lhs, msg_rhs) = (lhs.clone(), rhs.clone());
        Predicate {
            test: Arc::new(move |x| lhs.test(x) && rhs.test(x)),
            name: format!("{} & {}", self.name, other.name),
            msg: Message::Render(Arc::new(move |x| {
                format!("({}) and ({})", msg_lhs.render_msg(x), msg_rhs.render_msg(x))
            })),
            context: Vec::new(),
        }
    }

    /// At least one predicate must pass.
    pub fn or(&self, other: &Predicate) -> Predicate {
        let (lhs, rhs) = (Arc::new(self.clone()), Arc::new(other.clone()));
        let (msg_lhs, msg_rhs) = (lhs.clone(), rhs.clone());
        Predicate {
            test: Arc::new(move |x| lhs.test(x) || rhs.test(x)),
            name: format!("{} | {}", self.name, other.name),
            msg: Message::Render(Arc::new(move |x| {
                format!("({}) or ({})", msg_lhs.render_msg(x), msg_rhs.render_msg(x))
            })),
            context: Vec::new(),
        }
    }

    pub fn negate(&self) -> Predicate {
        let inner = Arc::new(self.clone());
        let msg_inner = inner.clone();
        Predicate {
            test: Arc::new(move |x| !inner.test(x)),
            name: format!("~{}", self.name),
            msg: Message::Render(Arc::new(move |x| format!("not ({})", msg_inner.render_msg(x)))),
            context: Vec::new(),
        }
    }

    /// Exactly one of the predicates must pass.
    pub fn xor(&self, other: &Predicate) -> Predicate {
        self.or(other).and(&self.and(other).negate())
    }

    /// If `self` passes, `other` must pass too.
    pub fn implies(&self, other: &Predicate) -> Predicate {
        self.negate().or(other)
    }

    /// Build a new predicate that records `self` in its context chain.
    pub fn lift<F>(&self, name: Option<&str>, msg: impl Into<String>, test: F) -> Predicate
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        let mut context = self.context.clone();
        context.push(self.clone());
        Predicate {
            test: Arc::new(test),
            name: name.unwrap_or(&self.name).to_string(),
            msg: Message::Text(msg.into()),
            context,
        }
    }

    /// Apply this predicate to a property of the value.
    pub fn on<G>(&self, getter: G) -> Predicate
    where
        G: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        let getter = Arc::new(getter);
        let (inner, msg_inner) = (Arc::new(self.clone()), Arc::new(self.clone()));
        let msg_getter = getter.clone();
        Predicate {
            test: Arc::new(move |x| inner.test(&getter(x))),
            name: self.name.clone(),
            msg: Message::Render(Arc::new(move |x| {
                let projected = x.map(|x| msg_getter(x));
                msg_inner.render_msg(projected.as_ref())
            })),
            context: self.context.clone(),
        }
    }

    /// Approve a list or tuple by folding the element results with
    /// `quantifier`. Values that are not sequences are rejected.
    pub fn quantify<Q>(&self, quantifier: Q, label: &str, prefix: &str) -> Predicate
    where
        Q: Fn(&mut dyn Iterator<Item = bool>) -> bool + Send + Sync + 'static,
    {
        let inner = Arc::new(self.clone());
        let test_inner = inner.clone();
        let name = format!("{label}({})", self.name);
        let mut lifted = self.lift(Some(name.as_str()), "", move |x| {
            match x.as_slice() {
                Some(items) => quantifier(&mut items.iter().map(|item| test_inner.test(item))),
                None => false,
            }
        });
        lifted.msg = match &self.msg {
            Message::Text(text) => Message::Text(text.clone()),
            Message::Render(_) => {
                let prefix = prefix.to_string();
                Message::Render(Arc::new(move |x| {
                    let sample = x.and_then(Value::as_slice).and_then(|items| items.first());
                    format!("{prefix}{}", inner.render_msg(sample))
                }))
            }
        };
        lifted
    }

    /// Every element passes.
    pub fn all(&self) -> Predicate {
        self.quantify(
            |mut bits| Iterator::all(&mut bits, |bit| bit),
            "all",
            "for every element: ",
        )
    }

    /// At least one element passes.
    pub fn any(&self) -> Predicate {
        self.quantify(
            |mut bits| Iterator::any(&mut bits, |bit| bit),
            "any",
            "for at least one element: ",
        )
    }

    /// At least `n` elements pass.
    pub fn at_least(&self, n: usize) -> Predicate {
        self.quantify(
            move |bits| bits.filter(|&bit| bit).take(n).count() == n,
            &format!("at least {n}"),
            &format!("for at least {n} elements: "),
        )
    }

    /// At most `n` elements pass.
    pub fn at_most(&self, n: usize) -> Predicate {
        self.quantify(
            move |bits| bits.filter(|&bit| bit).take(n + 1).count() <= n,
            &format!("at most {n}"),
            &format!("for at most {n} elements: "),
        )
    }

    /// Exactly `n` elements pass.
    pub fn exactly(&self, n: usize) -> Predicate {
        self.quantify(
            move |bits| bits.filter(|&bit| bit).take(n + 1).count() == n,
            &format!("exactly {n}"),
            &format!("for exactly {n} elements: "),
        )
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predicate")
            .field("name", &self.name)
            .field("msg", &self.describe())
            .finish()
    }
}

impl BitAnd for Predicate {
    type Output = Predicate;

    fn bitand(self, rhs: Predicate) -> Predicate {
        self.and(&rhs)
    }
}

impl BitAnd for &Predicate {
    type Output = Predicate;

    fn bitand(self, rhs: &Predicate) -> Predicate {
        self.and(rhs)
    }
}

impl BitOr for Predicate {
    type Output = Predicate;

    fn bitor(self, rhs: Predicate) -> Predicate {
        self.or(&rhs)
    }
}

impl BitOr for &Predicate {
    type Output = Predicate;

    fn bitor(self, rhs: &Predicate) -> Predicate {
        self.or(rhs)
    }
}

impl BitXor for Predicate {
    type Output = Predicate;

    fn bitxor(self, rhs: Predicate) -> Predicate {
        self.xor(&rhs)
    }
}

impl BitXor for &Predicate {
    type Output = Predicate;

    fn bitxor(self, rhs: &Predicate) -> Predicate {
        self.xor(rhs)
    }
}

impl Not for Predicate {
    type Output = Predicate;

    fn not(self) -> Predicate {
        self.negate()
    }
}

impl Not for &Predicate {
    type Output = Predicate;

    fn not(self) -> Predicate {
        self.negate()
    }
}
