use std::{collections::HashMap, fmt::Debug, sync::Arc};

use crate::{
    callable::Callable,
    info::CallableInfo,
    types::{Injectable, Instance},
};

/// Values produced during one injection, keyed by the callable that produced them
///
/// Created fresh for each top-level injection unless the caller supplies one to share it
/// between several injections.
#[derive(Debug, Clone, Default)]
pub struct InjectionCache {
    values: HashMap<Callable, Instance>,
}

impl InjectionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, call: &Callable) -> Option<&Instance> {
        self.values.get(call)
    }

    pub fn contains(&self, call: &Callable) -> bool {
        self.values.contains_key(call)
    }

    /// Stores the value produced by `call`
    ///
    /// The first value stored for a callable wins, later inserts return the stored value.
    pub fn insert(&mut self, call: Callable, value: Instance) -> &Instance {
        self.values.entry(call).or_insert(value)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear()
    }
}

/// Replacement for an overridden dependency
#[derive(Clone)]
pub enum OverrideValue {
    /// Used as the produced value, the dependency is never invoked
    Value(Instance),
    /// Injected in place of the dependency
    Dependency(Arc<CallableInfo>),
}
impl Debug for OverrideValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OverrideValue::Value(value) => f.debug_tuple("Value").field(value).finish(),
            OverrideValue::Dependency(info) => f.debug_tuple("Dependency").field(&info.name()).finish(),
        }
    }
}

/// Dependency substitutions applied during one injection
#[derive(Debug, Clone, Default)]
pub struct Override {
    entries: HashMap<Callable, OverrideValue>,
}

impl Override {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces whatever `call` would produce with `value`
    pub fn value<T: Injectable>(self, call: &Callable, value: T) -> Self {
        self.instance(call, Instance::new(value))
    }

    pub fn instance(mut self, call: &Callable, value: Instance) -> Self {
        self.entries.insert(call.clone(), OverrideValue::Value(value));
        self
    }

    /// Injects `replacement` wherever `call` is required
    pub fn dependency(mut self, call: &Callable, replacement: Arc<CallableInfo>) -> Self {
        self.entries
            .insert(call.clone(), OverrideValue::Dependency(replacement));
        self
    }

    pub fn get(&self, call: &Callable) -> Option<&OverrideValue> {
        self.entries.get(call)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
