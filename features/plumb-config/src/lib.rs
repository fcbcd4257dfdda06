//! Plumb Config provides a registry of configs that can be injected through Plumb DI.
//!
//! Plumb Config is split into two major parts:
//! 1. ConfigProvider: Used to create the registry of all configs
//! 2. Config<T>: A wrapper type to read configs received by a callable
//!
//! # Examples
//!
//! ```rust
//! use plumb_config::provider::ConfigProvider;
//!
//! #[derive(Clone)]
//! struct AppConfig {
//!     host: String,
//!     port: u16,
//!     app_name: String,
//! }
//!
//! let app_config = AppConfig {
//!     host: "localhost".to_string(),
//!     port: 8080_u16,
//!     app_name: "My Awesome App".to_string(),
//! };
//!
//! let mut config_provider = ConfigProvider::new();
//! config_provider.add_config(app_config.clone()).unwrap();
//!
//! let retrieved_config = config_provider.get_config::<AppConfig>().unwrap().unwrap();
//!
//! assert_eq!(app_config.host, retrieved_config.host);
//! assert_eq!(app_config.port, retrieved_config.port);
//! assert_eq!(app_config.app_name, retrieved_config.app_name);
//! ```
//!
//! Configs reach callables in one of two ways:
//!
//! 1. [ConfigProvider::extend_scope](provider::ConfigProvider::extend_scope) puts every config
//!    in the scope, callables declare a [config_param](config::config_param)
//! 2. The provider itself is put in the scope, callables depend on
//!    [require_config](config::require_config)
//!
//! Plumb Config consists of the following components:
//!
//! 1. Config - for reading configs and declaring config parameters
//! 2. Provider - for creating a registry of configs, adding and retrieving configs
//! 3. Errors - for config errors

pub mod config;
pub mod errors;
pub mod provider;
