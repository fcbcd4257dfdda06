use indexmap::IndexMap;

use crate::{
    info::Parameter,
    types::{Injectable, Instance, TypeInfo},
};

/// Scope key under which a dependency finds the [Parameter] it is being injected for
pub const PARAMETER_SCOPE_KEY: &str = "__parameter__";

/// Values available to scope-bound parameters of one injection
///
/// Keeps insertion order, lookups by type return the first matching entry.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    values: IndexMap<String, Instance>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<T: Injectable>(mut self, key: impl Into<String>, value: T) -> Self {
        self.insert(key, value);
        self
    }

    pub fn with_instance(mut self, key: impl Into<String>, value: Instance) -> Self {
        self.insert_instance(key, value);
        self
    }

    pub fn insert<T: Injectable>(&mut self, key: impl Into<String>, value: T) -> Option<Instance> {
        self.insert_instance(key, Instance::new(value))
    }

    pub fn insert_instance(&mut self, key: impl Into<String>, value: Instance) -> Option<Instance> {
        self.values.insert(key.into(), value)
    }

    pub fn get(&self, key: &str) -> Option<&Instance> {
        self.values.get(key)
    }

    /// The first value whose runtime type is `info`
    pub fn find_by_type(&self, info: TypeInfo) -> Option<&Instance> {
        self.values
            .values()
            .find(|value| value.info.type_id == info.type_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Instance)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The scope seen by a dependency injected for `parameter`
    pub(crate) fn for_parameter(&self, parameter: &Parameter) -> Scope {
        self.clone()
            .with(PARAMETER_SCOPE_KEY, parameter.clone())
    }
}

impl<K: Into<String>> FromIterator<(K, Instance)> for Scope {
    fn from_iter<I: IntoIterator<Item = (K, Instance)>>(iter: I) -> Self {
        Scope {
            values: iter.into_iter().map(|(key, value)| (key.into(), value)).collect(),
        }
    }
}

impl<K: Into<String>> Extend<(K, Instance)> for Scope {
    fn extend<I: IntoIterator<Item = (K, Instance)>>(&mut self, iter: I) {
        self.values
            .extend(iter.into_iter().map(|(key, value)| (key.into(), value)));
    }
}
