use plumb_di::TypeInfo;

/// Errors when registering or retrieving a config
#[derive(thiserror::Error, Debug, Clone)]
pub enum ConfigError {
    /// A config of this type is already registered
    #[error("Config '{0}' is already registered")]
    AlreadyRegistered(TypeInfo),
    /// No config of this type is registered
    #[error("Config '{0}' is not registered")]
    Missing(TypeInfo),
}
