use std::{
    fmt::Debug,
    future::Future,
    hash::{Hash, Hasher},
    sync::Arc,
};

use futures::{future::BoxFuture, FutureExt};

use crate::{
    info::{Arguments, Parameter, ParameterKind},
    resource::{AsyncContextManager, AsyncGenerator, AsyncResource, ContextManager, Generator, Resource},
    types::{DynError, Instance, TypeInfo},
};

type SyncBody = dyn Fn(Arguments) -> Result<Instance, DynError> + Send + Sync;
type AsyncBody = dyn Fn(Arguments) -> BoxFuture<'static, Result<Instance, DynError>> + Send + Sync;
type SyncResourceBody = dyn Fn(Arguments) -> Result<Box<dyn Resource>, DynError> + Send + Sync;
type AsyncResourceBody =
    dyn Fn(Arguments) -> BoxFuture<'static, Result<Box<dyn AsyncResource>, DynError>> + Send + Sync;

/// The shape of what a callable produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    /// The return value is the produced value
    Function,
    /// Set-up produces the value, teardown runs when the exit stack unwinds
    Generator,
    /// Entered to produce the value, exited when the exit stack unwinds
    ContextManager,
}

pub(crate) enum Body {
    Function(Box<SyncBody>),
    AsyncFunction(Box<AsyncBody>),
    Resource(Box<SyncResourceBody>),
    AsyncResource(Box<AsyncResourceBody>),
}

/// A registered callable
///
/// Cloning shares the callable. Equality and hashing follow identity, so a callable can key
/// the injection cache and override tables.
#[derive(Clone)]
pub struct Callable(Arc<CallableInner>);
struct CallableInner {
    name: String,
    kind: CallKind,
    is_async: bool,
    return_type: Option<TypeInfo>,
    parameters: Vec<Parameter>,
    body: Body,
}

impl Callable {
    /// A plain function, its return value is the produced value
    pub fn function<F>(name: impl Into<String>, body: F) -> CallableBuilder
    where
        F: Fn(Arguments) -> Result<Instance, DynError> + Send + Sync + 'static,
    {
        CallableBuilder::new(name, CallKind::Function, false, Body::Function(Box::new(body)))
    }

    pub fn async_function<F, Fut>(name: impl Into<String>, body: F) -> CallableBuilder
    where
        F: Fn(Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Instance, DynError>> + Send + 'static,
    {
        let body = move |arguments| body(arguments).boxed();
        CallableBuilder::new(name, CallKind::Function, true, Body::AsyncFunction(Box::new(body)))
    }

    /// A generator-shaped scoped resource
    pub fn generator<F>(name: impl Into<String>, body: F) -> CallableBuilder
    where
        F: Fn(Arguments) -> Result<Generator, DynError> + Send + Sync + 'static,
    {
        let body = move |arguments| body(arguments).map(|generator| Box::new(generator) as Box<dyn Resource>);
        CallableBuilder::new(name, CallKind::Generator, false, Body::Resource(Box::new(body)))
    }

    pub fn async_generator<F, Fut>(name: impl Into<String>, body: F) -> CallableBuilder
    where
        F: Fn(Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<AsyncGenerator, DynError>> + Send + 'static,
    {
        let body = move |arguments| {
            body(arguments)
                .map(|generator| generator.map(|generator| Box::new(generator) as Box<dyn AsyncResource>))
                .boxed()
        };
        CallableBuilder::new(name, CallKind::Generator, true, Body::AsyncResource(Box::new(body)))
    }

    /// A context manager, constructed by the body then entered
    pub fn context_manager<C, F>(name: impl Into<String>, body: F) -> CallableBuilder
    where
        C: ContextManager,
        F: Fn(Arguments) -> Result<C, DynError> + Send + Sync + 'static,
    {
        let body = move |arguments| body(arguments).map(|manager| Box::new(manager) as Box<dyn Resource>);
        CallableBuilder::new(name, CallKind::ContextManager, false, Body::Resource(Box::new(body)))
    }

    pub fn async_context_manager<C, F>(name: impl Into<String>, body: F) -> CallableBuilder
    where
        C: AsyncContextManager,
        F: Fn(Arguments) -> Result<C, DynError> + Send + Sync + 'static,
    {
        let body = move |arguments| {
            let manager = body(arguments).map(|manager| Box::new(manager) as Box<dyn AsyncResource>);
            async move { manager }.boxed()
        };
        CallableBuilder::new(name, CallKind::ContextManager, true, Body::AsyncResource(Box::new(body)))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn kind(&self) -> CallKind {
        self.0.kind
    }

    pub fn is_async(&self) -> bool {
        self.0.is_async
    }

    pub fn return_type(&self) -> Option<TypeInfo> {
        self.0.return_type
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.0.parameters
    }

    pub(crate) fn body(&self) -> &Body {
        &self.0.body
    }

    fn as_ptr(&self) -> *const () {
        Arc::as_ptr(&self.0) as *const ()
    }
}

impl PartialEq for Callable {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
impl Eq for Callable {}
impl Hash for Callable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_ptr().hash(state)
    }
}
impl Debug for Callable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Callable")
            .field("name", &self.0.name)
            .field("kind", &self.0.kind)
            .field("is_async", &self.0.is_async)
            .finish()
    }
}

/// Declares the parameters of a callable before it is shared
pub struct CallableBuilder {
    name: String,
    kind: CallKind,
    is_async: bool,
    return_type: Option<TypeInfo>,
    parameters: Vec<Parameter>,
    body: Body,
}

impl CallableBuilder {
    fn new(name: impl Into<String>, kind: CallKind, is_async: bool, body: Body) -> Self {
        CallableBuilder {
            name: name.into(),
            kind,
            is_async,
            return_type: None,
            parameters: Vec::new(),
            body,
        }
    }

    /// Appends a parameter
    ///
    /// Parameter names are unique, redeclaring a name replaces the earlier parameter in place.
    pub fn param(mut self, parameter: Parameter) -> Self {
        match self.parameters.iter_mut().find(|existing| existing.name == parameter.name) {
            Some(existing) => {
                tracing::warn!(
                    "Parameter '{}' of '{}' declared twice, keeping the last declaration",
                    parameter.name,
                    self.name
                );
                *existing = parameter;
            }
            None => self.parameters.push(parameter),
        }
        self
    }

    /// Positional parameters after a variadic positional one can only be passed by keyword
    fn demote_trailing_positionals(&mut self) {
        let Some(variadic) = self
            .parameters
            .iter()
            .position(|parameter| parameter.kind == ParameterKind::VarPositional)
        else {
            return;
        };

        for parameter in &mut self.parameters[variadic + 1..] {
            if matches!(
                parameter.kind,
                ParameterKind::PositionalOnly | ParameterKind::PositionalOrKeyword
            ) {
                tracing::warn!(
                    "Parameter '{}' of '{}' follows a variadic positional parameter, passing it by keyword",
                    parameter.name,
                    self.name
                );
                parameter.kind = ParameterKind::KeywordOnly;
            }
        }
    }

    pub fn returns<T: ?Sized + 'static>(mut self) -> Self {
        self.return_type = Some(TypeInfo::of::<T>());
        self
    }

    pub fn build(mut self) -> Callable {
        self.demote_trailing_positionals();

        Callable(Arc::new(CallableInner {
            name: self.name,
            kind: self.kind,
            is_async: self.is_async,
            return_type: self.return_type,
            parameters: self.parameters,
            body: self.body,
        }))
    }
}
