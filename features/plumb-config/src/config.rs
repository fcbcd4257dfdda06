use std::{ops::Deref, sync::Arc};

use plumb_di::{
    scan, ArgumentError, Arguments, Callable, Injectable, Instance, Parameter, TypeInfo,
};

use crate::provider::ConfigProvider;

/// A wrapper type to allow for config injections
///
/// This provides a simple way to read configs received by a callable, either straight from
/// the scope (see [ConfigProvider::extend_scope]) or through [require_config].
///
/// # Example
/// ```rust
/// use plumb_config::{config::{config_param, Config}, provider::ConfigProvider};
/// use plumb_di::{inject, scan, Arguments, Callable, ExitStack, Instance};
///
/// pub struct MyModuleConfig {
///     enabled: bool,
/// }
///
/// let mut config_provider = ConfigProvider::new();
/// config_provider.add_config(MyModuleConfig { enabled: true }).unwrap();
///
/// let enable = Callable::function("enable", |arguments: Arguments| {
///     let config = Config::<MyModuleConfig>::get(&arguments, "config")?;
///     Ok(Instance::new(config.enabled))
/// })
/// .param(config_param::<MyModuleConfig>("config"))
/// .build();
///
/// let scope = config_provider.into_scope();
/// let enabled = ExitStack::run(|stack| inject(&scope, &scan(&enable), stack, None, None))
///     .unwrap()
///     .unwrap();
/// assert!(*enabled.downcast_ref::<bool>().unwrap());
/// ```
pub struct Config<T> {
    inner: Arc<T>,
}
impl<T> Deref for Config<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
impl<T> Config<T> {
    pub fn inner(&self) -> Arc<T> {
        self.inner.clone()
    }

    pub fn into_inner(self) -> Arc<T> {
        self.inner
    }
}

impl<T: Injectable> Config<T> {
    /// Reads the config received by the parameter `name`
    pub fn get(arguments: &Arguments, name: &str) -> Result<Self, ArgumentError> {
        arguments.get::<T>(name).map(|inner| Config { inner })
    }
}

/// A parameter receiving the config `T` from the scope
pub fn config_param<T: Injectable>(name: impl Into<String>) -> Parameter {
    Parameter::by_type::<T>(name)
}

/// A callable producing the config `T` from the [ConfigProvider] found in the scope
///
/// Fails with [ConfigError::Missing](crate::errors::ConfigError::Missing) if the provider
/// holds no such config. Build it once and share it, so the config is looked up once per
/// injection.
pub fn require_config<T: Injectable>() -> Callable {
    let name = format!("require_config<{}>", TypeInfo::of::<T>());

    Callable::function(name, |arguments: Arguments| {
        let provider = arguments.get::<ConfigProvider>("provider")?;
        let config = provider.require_config::<T>()?;
        Ok(Instance::from_arc(config))
    })
    .param(Parameter::by_type::<ConfigProvider>("provider"))
    .returns::<T>()
    .build()
}

/// A parameter receiving the config `T` through `require`, see [require_config]
pub fn config_dependency<T: Injectable>(name: impl Into<String>, require: &Callable) -> Parameter {
    Parameter::from_dependency::<T>(name, scan(require))
}

#[cfg(test)]
mod tests {
    use plumb_di::{inject, ExitStack, InjectErrorKind, Scope};

    use super::*;
    use crate::errors::ConfigError;

    struct DatabaseConfig {
        url: String,
    }

    fn connect(arguments: Arguments) -> Result<Instance, plumb_di::DynError> {
        let config = Config::<DatabaseConfig>::get(&arguments, "config")?;
        Ok(Instance::new(format!("connected to {}", config.url)))
    }

    #[test]
    fn config_is_read_from_the_provider() {
        let require = require_config::<DatabaseConfig>();
        let application = Callable::function("application", connect)
            .param(config_dependency::<DatabaseConfig>("config", &require))
            .build();
        let mut provider = ConfigProvider::new();
        provider
            .add_config(DatabaseConfig {
                url: "postgresql://localhost".to_string(),
            })
            .unwrap();
        let scope = Scope::new().with("provider", provider);

        let result = ExitStack::run(|stack| inject(&scope, &scan(&application), stack, None, None))
            .unwrap()
            .unwrap();

        assert_eq!(
            result.downcast_ref::<String>().unwrap(),
            "connected to postgresql://localhost"
        );
    }

    #[test]
    fn missing_config_fails_the_injection() {
        let require = require_config::<DatabaseConfig>();
        let application = Callable::function("application", connect)
            .param(config_dependency::<DatabaseConfig>("config", &require))
            .build();
        let scope = Scope::new().with("provider", ConfigProvider::new());

        let error = ExitStack::run(|stack| inject(&scope, &scan(&application), stack, None, None))
            .unwrap_err();

        assert!(matches!(error.kind(), InjectErrorKind::Call(_)));
        assert!(matches!(
            error.downcast_ref::<ConfigError>(),
            Some(ConfigError::Missing(_))
        ));
    }
}
