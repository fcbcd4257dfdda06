use std::{any::TypeId, collections::HashMap, sync::Arc};

use plumb_di::{Injectable, Instance, Scope, TypeInfo};

use crate::errors::ConfigError;

/// A provider to register all configs.
///
/// Configs can be registered and retrieved based on type, one config per type.
#[derive(Debug, Clone, Default)]
pub struct ConfigProvider {
    configs: HashMap<TypeId, Instance>,
}

impl ConfigProvider {
    /// Initializes an empty Config Provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Retrieve a config with specified type.
    ///
    /// Returns `Ok(None)` if no config of that type is registered
    pub fn get_config<T: Injectable>(&self) -> Result<Option<Arc<T>>, ConfigError> {
        self.configs
            .get(&TypeId::of::<T>())
            .map(|entry| entry.downcast::<T>())
            .transpose()
            .map_err(|_| ConfigError::Missing(TypeInfo::of::<T>()))
    }

    /// Retrieve a config with specified type, failing if it is not registered
    pub fn require_config<T: Injectable>(&self) -> Result<Arc<T>, ConfigError> {
        self.get_config::<T>()?
            .ok_or_else(|| ConfigError::Missing(TypeInfo::of::<T>()))
    }

    /// Add a config to the registry.
    ///
    /// If the config type is already registered, it will return a
    /// [`ConfigError::AlreadyRegistered`] error
    pub fn add_config<T: Injectable>(&mut self, config: T) -> Result<&mut Self, ConfigError> {
        let info = TypeInfo::of::<T>();

        if self.configs.contains_key(&info.type_id) {
            return Err(ConfigError::AlreadyRegistered(info));
        }

        tracing::debug!("Registered config '{info}'");
        self.configs.insert(info.type_id, Instance::new(config));
        Ok(self)
    }

    /// Can optionally add a config to the registry.
    ///
    /// If the config provided is `Some(T)`, it will be the same as calling [`ConfigProvider::add_config`]
    /// If the config provided is `None`, then the function just returns `Ok(self)` for chaining
    pub fn maybe_add_config<T: Injectable>(
        &mut self,
        config: Option<T>,
    ) -> Result<&mut Self, ConfigError> {
        match config {
            Some(c) => self.add_config(c),
            None => Ok(self),
        }
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    /// Inserts every registered config into `scope`, keyed by its type name
    ///
    /// Dependencies then receive configs through by-type parameters.
    pub fn extend_scope(&self, scope: &mut Scope) {
        for config in self.configs.values() {
            tracing::trace!("Adding config '{}' to scope", config.info);
            scope.insert_instance(config.info.type_name, config.clone());
        }
    }

    /// A scope holding every registered config
    pub fn into_scope(self) -> Scope {
        let mut scope = Scope::new();
        self.extend_scope(&mut scope);
        scope
    }
}
