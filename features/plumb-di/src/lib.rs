//! Plumb DI resolves the dependencies of a callable and calls it.
//!
//! A [Callable] declares its parameters up front. Each parameter is read from the [Scope] by
//! name or by type, or is produced by injecting another callable. [inject] and [ainject] walk
//! that graph depth-first, reuse values within one injection through the [InjectionCache],
//! substitute dependencies listed in an [Override] table and register scoped resources on an
//! [ExitStack] which releases them newest first.
//!
//! # Examples
//!
//! ```rust
//! use plumb_di::{inject, scan, Arguments, Callable, ExitStack, Instance, Parameter, Scope};
//!
//! let require_user = Callable::function("require_user", |_| Ok(Instance::new("Alice".to_string())))
//!     .returns::<String>()
//!     .build();
//!
//! let greet = Callable::function("greet", |arguments: Arguments| {
//!     let user = arguments.get::<String>("user")?;
//!     Ok(Instance::new(format!("Hello, {user}!")))
//! })
//! .param(Parameter::from_dependency::<String>("user", scan(&require_user)))
//! .build();
//!
//! let greeting = ExitStack::run(|stack| inject(&Scope::new(), &scan(&greet), stack, None, None))
//!     .unwrap()
//!     .unwrap();
//!
//! assert_eq!(greeting.downcast_ref::<String>().unwrap(), "Hello, Alice!");
//! ```
//!
//! Plumb DI consists of the following components:
//!
//! 1. Callable / Info - declaring callables and scanning them into shared descriptors
//! 2. Resolver - deciding per parameter where its value comes from
//! 3. Injector - the recursive graph walk, blocking and async
//! 4. Stack / Resource - scoped resources and their teardown
//! 5. Dependency Graph - side-effect free ordering and tree snapshots
//! 6. Errors / Trace - failures and the frames they passed through

pub mod cache;
pub mod callable;
pub mod dependency_graph;
pub mod errors;
pub mod info;
pub mod injector;
pub mod resolver;
pub mod resource;
pub mod scope;
pub mod stack;
pub mod trace;
pub mod types;

pub use cache::{InjectionCache, Override, OverrideValue};
pub use callable::{CallKind, Callable, CallableBuilder};
pub use dependency_graph::{order, tree, Node, Tree};
pub use errors::{injection_trace, ArgumentError, InjectError, InjectErrorKind, ResolveError};
pub use info::{scan, scan_with, Arguments, CallableInfo, Parameter, ParameterKind, ParameterSource};
pub use injector::{ainject, inject};
pub use resolver::{resolve, resolve_parameter, ParameterResult, Resolution};
pub use resource::{
    AsyncContextManager, AsyncGenerator, AsyncResource, ContextManager, Exit, Generator, Outcome,
    Resource,
};
pub use scope::{Scope, PARAMETER_SCOPE_KEY};
pub use stack::{AsyncExitStack, ExitStack};
pub use trace::InjectionTrace;
pub use types::{DynError, Injectable, Instance, TypeInfo, Values};
