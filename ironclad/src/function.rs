//! Named callables over dynamic values.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::{BoxError, Error, Result};
use crate::signature::{Arguments, Signature};
use crate::value::Value;

/// Keyword arguments, in call order.
pub type Kwargs = IndexMap<String, Value>;

type Body = dyn Fn(&Arguments) -> std::result::Result<Value, BoxError> + Send + Sync;

/// A callable with a name, an explicit signature and a body.
///
/// The body receives the bound [`Arguments`] and may fail with any error;
/// that error is surfaced unchanged as [`Error::Callee`].
#[derive(Clone)]
pub struct Function {
    name: String,
    signature: Signature,
    body: Arc<Body>,
}

impl Function {
    pub fn new<F>(name: impl Into<String>, signature: Signature, body: F) -> Self
    where
        F: Fn(&Arguments) -> std::result::Result<Value, BoxError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            signature,
            body: Arc::new(body),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Bind arguments against this function's signature.
    pub fn bind(&self, args: &[Value], kwargs: &Kwargs) -> Result<Arguments> {
        self.signature
            .bind(args, kwargs)
            .map_err(|source| Error::Bind {
                function: self.name.clone(),
                source,
            })
    }

    /// Run the body on already-bound arguments.
    pub fn invoke(&self, arguments: &Arguments) -> Result<Value> {
        (self.body)(arguments).map_err(Error::Callee)
    }

    pub fn call(&self, args: &[Value], kwargs: &Kwargs) -> Result<Value> {
        let arguments = self.bind(args, kwargs)?;
        self.invoke(&arguments)
    }

    pub fn call_positional(&self, args: &[Value]) -> Result<Value> {
        self.call(args, &Kwargs::new())
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name, self.signature)
    }
}
