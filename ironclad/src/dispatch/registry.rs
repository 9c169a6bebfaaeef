//! Named multimethods.

use std::hash::BuildHasherDefault;

use indexmap::IndexMap;
use rustc_hash::FxHasher;

use super::Multimethod;
use crate::error::{Error, Result};
use crate::function::{Function, Kwargs};
use crate::options::Config;
use crate::value::Value;

type FxIndexMap<K, V> = IndexMap<K, V, BuildHasherDefault<FxHasher>>;

/// A set of multimethods looked up by name.
///
/// Multimethods created through the registry take their options and
/// ambiguity policy from its [`Config`].
#[derive(Debug, Clone, Default)]
pub struct Registry {
    config: Config,
    methods: FxIndexMap<String, Multimethod>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            methods: FxIndexMap::default(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Register `function` as an overload of the multimethod sharing its
    /// name, creating the multimethod on first use.
    pub fn runtime_overload(&mut self, function: Function) -> Result<&mut Multimethod> {
        let name = function.name().to_string();
        match self.methods.get_index_of(&name) {
            Some(index) => {
                let method = &mut self.methods[index];
                method.overload(function)?;
                Ok(method)
            }
            None => {
                let mut method = Multimethod::with_config(name.as_str(), &self.config);
                method.overload(function)?;
                let (index, _) = self.methods.insert_full(name, method);
                Ok(&mut self.methods[index])
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Multimethod> {
        self.methods.get(name)
    }

    /// Dispatch a call to the named multimethod.
    pub fn call(&self, name: &str, args: &[Value], kwargs: &Kwargs) -> Result<Value> {
        self.get(name)
            .ok_or_else(|| Error::UnknownMultimethod {
                name: name.to_string(),
            })?
            .call(args, kwargs)
    }

    /// Names of the registered multimethods, in creation order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}
