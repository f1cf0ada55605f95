use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::packed::{KernelFn, PackedFunc};

/// Shared, immutable handle to a registered function.
pub type FuncHandle = Arc<dyn PackedFunc>;

/// Name to entry-point table. Names are unique and never removed.
#[derive(Default, Clone)]
pub struct FunctionRegistry {
    names: Vec<String>,
    funcs: Vec<FuncHandle>,
    index: HashMap<String, usize>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a generated `(name, entry point)` table. Any
    /// duplicate name aborts construction.
    pub fn register_all<I, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, FuncHandle)>,
        S: Into<String>,
    {
        let mut registry = Self::new();
        for (name, func) in entries {
            registry.register_handle(name, func)?;
        }
        Ok(registry)
    }

    /// Build a registry from a static table of function pointers.
    pub fn from_table(table: &[(&str, KernelFn)]) -> Result<Self> {
        Self::register_all(
            table
                .iter()
                .map(|(name, func)| (*name, Arc::new(*func) as FuncHandle)),
        )
    }

    pub fn register<F>(&mut self, name: impl Into<String>, func: F) -> Result<()>
    where
        F: PackedFunc + 'static,
    {
        self.register_handle(name, Arc::new(func))
    }

    pub fn register_handle(&mut self, name: impl Into<String>, func: FuncHandle) -> Result<()> {
        let name = name.into();
        if self.index.contains_key(&name) {
            return Err(Error::DuplicateName(name));
        }
        self.index.insert(name.clone(), self.funcs.len());
        self.names.push(name);
        self.funcs.push(func);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Result<FuncHandle> {
        self.get(name)
            .cloned()
            .ok_or_else(|| Error::NotFound(name.to_string()))
    }

    pub fn get(&self, name: &str) -> Option<&FuncHandle> {
        self.index.get(name).map(|idx| &self.funcs[*idx])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.funcs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.funcs.is_empty()
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("names", &self.names)
            .finish()
    }
}
