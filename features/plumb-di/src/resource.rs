use std::future::Future;

use futures::{future::BoxFuture, FutureExt};

use crate::{
    errors::InjectError,
    types::{DynError, Injectable, Instance},
};

/// How the scope owning a resource ended
#[derive(Debug, Clone, Copy)]
pub enum Outcome<'a> {
    Success,
    Failure(&'a InjectError),
}
impl<'a> Outcome<'a> {
    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failure(_))
    }

    pub fn error(&self) -> Option<&'a InjectError> {
        match self {
            Outcome::Success => None,
            Outcome::Failure(error) => Some(error),
        }
    }
}

/// What a released resource wants done with a failure it was handed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// Let the failure continue to older resources and the caller
    Propagate,
    /// Treat the failure as recovered
    Suppress,
}

/// A scoped resource as driven by the [ExitStack](crate::stack::ExitStack)
pub trait Resource: Send + 'static {
    /// Produces the value handed to dependants
    fn acquire(&mut self) -> Result<Instance, DynError>;

    /// Tears the resource down, observing how the owning scope ended
    fn release(self: Box<Self>, outcome: Outcome<'_>) -> Result<Exit, DynError>;
}

/// Asynchronous counterpart of [Resource]
pub trait AsyncResource: Send + 'static {
    fn acquire(&mut self) -> BoxFuture<'_, Result<Instance, DynError>>;

    fn release<'a>(self: Box<Self>, outcome: Outcome<'a>) -> BoxFuture<'a, Result<Exit, DynError>>;
}

/// A typed enter/exit resource
///
/// ```rust
/// use plumb_di::{ContextManager, DynError, Exit, Outcome};
///
/// struct RequireSession;
/// impl ContextManager for RequireSession {
///     type Provides = String;
///
///     fn enter(&mut self) -> Result<String, DynError> {
///         Ok("session".to_string())
///     }
///
///     fn exit(self, outcome: Outcome<'_>) -> Result<Exit, DynError> {
///         if outcome.is_failure() {
///             // rollback
///         }
///         Ok(Exit::Propagate)
///     }
/// }
/// ```
pub trait ContextManager: Send + Sized + 'static {
    type Provides: Injectable;

    fn enter(&mut self) -> Result<Self::Provides, DynError>;

    fn exit(self, outcome: Outcome<'_>) -> Result<Exit, DynError>;
}

/// A typed enter/exit resource with asynchronous acquisition and release
pub trait AsyncContextManager: Send + Sized + 'static {
    type Provides: Injectable;

    fn enter(&mut self) -> impl Future<Output = Result<Self::Provides, DynError>> + Send + '_;

    fn exit(self, outcome: Outcome<'_>) -> impl Future<Output = Result<Exit, DynError>> + Send + '_;
}

// Impl Resource for any ContextManager
impl<C: ContextManager> Resource for C {
    fn acquire(&mut self) -> Result<Instance, DynError> {
        self.enter().map(Instance::new)
    }

    fn release(self: Box<Self>, outcome: Outcome<'_>) -> Result<Exit, DynError> {
        (*self).exit(outcome)
    }
}

// Impl AsyncResource for any AsyncContextManager
impl<C: AsyncContextManager> AsyncResource for C {
    fn acquire(&mut self) -> BoxFuture<'_, Result<Instance, DynError>> {
        async move { self.enter().await.map(Instance::new) }.boxed()
    }

    fn release<'a>(self: Box<Self>, outcome: Outcome<'a>) -> BoxFuture<'a, Result<Exit, DynError>> {
        (*self).exit(outcome).boxed()
    }
}

type Teardown = Box<dyn FnOnce(Outcome<'_>) -> Result<Exit, DynError> + Send>;
type AsyncTeardown = Box<dyn FnOnce(Outcome<'_>) -> BoxFuture<'static, Result<Exit, DynError>> + Send>;

/// A value produced by set-up code, paired with the code that tears it down
///
/// The body of a generator callable runs its set-up, then returns the produced value together
/// with a teardown closure. The teardown runs once when the owning exit stack unwinds.
pub struct Generator {
    value: Option<Instance>,
    teardown: Option<Teardown>,
}
impl Generator {
    pub fn new(
        value: Instance,
        teardown: impl FnOnce(Outcome<'_>) -> Result<Exit, DynError> + Send + 'static,
    ) -> Self {
        Generator {
            value: Some(value),
            teardown: Some(Box::new(teardown)),
        }
    }

    /// A generator without teardown code
    pub fn yielding(value: Instance) -> Self {
        Generator {
            value: Some(value),
            teardown: None,
        }
    }
}
impl Resource for Generator {
    fn acquire(&mut self) -> Result<Instance, DynError> {
        self.value
            .take()
            .ok_or_else(|| DynError::from("generator was already advanced"))
    }

    fn release(self: Box<Self>, outcome: Outcome<'_>) -> Result<Exit, DynError> {
        match self.teardown {
            Some(teardown) => teardown(outcome),
            None => Ok(Exit::Propagate),
        }
    }
}

/// Asynchronous counterpart of [Generator]
///
/// The teardown closure inspects the [Outcome] synchronously and returns the future running
/// the actual clean-up.
pub struct AsyncGenerator {
    value: Option<Instance>,
    teardown: Option<AsyncTeardown>,
}
impl AsyncGenerator {
    pub fn new(
        value: Instance,
        teardown: impl FnOnce(Outcome<'_>) -> BoxFuture<'static, Result<Exit, DynError>> + Send + 'static,
    ) -> Self {
        AsyncGenerator {
            value: Some(value),
            teardown: Some(Box::new(teardown)),
        }
    }

    pub fn yielding(value: Instance) -> Self {
        AsyncGenerator {
            value: Some(value),
            teardown: None,
        }
    }
}
impl AsyncResource for AsyncGenerator {
    fn acquire(&mut self) -> BoxFuture<'_, Result<Instance, DynError>> {
        let value = self
            .value
            .take()
            .ok_or_else(|| DynError::from("generator was already advanced"));
        async move { value }.boxed()
    }

    fn release<'a>(self: Box<Self>, outcome: Outcome<'a>) -> BoxFuture<'a, Result<Exit, DynError>> {
        match self.teardown {
            Some(teardown) => teardown(outcome),
            None => async { Ok(Exit::Propagate) }.boxed(),
        }
    }
}
