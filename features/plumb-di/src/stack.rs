use crate::{
    errors::InjectError,
    resource::{AsyncResource, Exit, Outcome, Resource},
    types::DynError,
};

struct Entry<R> {
    call: String,
    resource: R,
}

/// Registry of acquired scoped resources, released in reverse acquisition order
///
/// Use [ExitStack::run] or [ExitStack::exit] to hand the outcome of the injection to the
/// resources. A stack dropped without being closed releases its resources with the failure of
/// the first injection that failed on it, or as succeeded if none did.
#[derive(Default)]
pub struct ExitStack {
    entries: Vec<Entry<Box<dyn Resource>>>,
    failure: Option<InjectError>,
}

impl ExitStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` with a fresh stack and closes it with the result
    ///
    /// Returns `Ok(None)` when the failure of `f` was suppressed by a resource.
    pub fn run<T>(f: impl FnOnce(&mut ExitStack) -> Result<T, InjectError>) -> Result<Option<T>, InjectError> {
        let mut stack = ExitStack::new();
        let result = f(&mut stack);
        stack.exit(result)
    }

    /// Registers an acquired resource
    pub fn push(&mut self, call: impl Into<String>, resource: Box<dyn Resource>) {
        self.entries.push(Entry {
            call: call.into(),
            resource,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remembers a failed injection for resources released on drop
    pub(crate) fn mark_failed(&mut self, error: &InjectError) {
        if self.failure.is_none() {
            self.failure = Some(error.detached());
        }
    }

    /// Closes the stack with the result of the scope it guarded
    pub fn exit<T>(self, result: Result<T, InjectError>) -> Result<Option<T>, InjectError> {
        match result {
            Ok(value) => self.close(None).map(|_| Some(value)),
            Err(error) => self.close(Some(error)).map(|_| None),
        }
    }

    /// Releases every resource, newest first
    ///
    /// Each resource observes the failure still propagating at the time it is released. A
    /// resource suppressing the failure hides it from every older resource and the caller, a
    /// resource failing to release replaces it and keeps it as [InjectError::displaced].
    ///
    /// `error` is authoritative, failures remembered from earlier injections are discarded.
    pub fn close(mut self, error: Option<InjectError>) -> Result<(), InjectError> {
        let mut error = error;
        self.failure = None;

        while let Some(Entry { call, resource }) = self.entries.pop() {
            tracing::debug!("Releasing '{call}'");
            let released = resource.release(outcome(&error));
            settle(call, released, &mut error);
        }

        match error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl Drop for ExitStack {
    fn drop(&mut self) {
        let mut error = self.failure.take();

        while let Some(Entry { call, resource }) = self.entries.pop() {
            tracing::debug!("Releasing '{call}' from a dropped stack");
            let released = resource.release(outcome(&error));
            if let Err(release_error) = &released {
                tracing::error!("Teardown of '{call}' failed: {release_error}");
            }
            settle(call, released, &mut error);
        }
    }
}

enum AnyResource {
    Sync(Box<dyn Resource>),
    Async(Box<dyn AsyncResource>),
}

/// Asynchronous counterpart of [ExitStack]
///
/// Holds both synchronous and asynchronous resources. Asynchronous teardown cannot run on
/// drop, so the stack must be closed with [AsyncExitStack::exit] or [AsyncExitStack::close].
#[derive(Default)]
pub struct AsyncExitStack {
    entries: Vec<Entry<AnyResource>>,
    failure: Option<InjectError>,
}

impl AsyncExitStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, call: impl Into<String>, resource: Box<dyn Resource>) {
        self.entries.push(Entry {
            call: call.into(),
            resource: AnyResource::Sync(resource),
        });
    }

    pub fn push_async(&mut self, call: impl Into<String>, resource: Box<dyn AsyncResource>) {
        self.entries.push(Entry {
            call: call.into(),
            resource: AnyResource::Async(resource),
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn mark_failed(&mut self, error: &InjectError) {
        if self.failure.is_none() {
            self.failure = Some(error.detached());
        }
    }

    pub async fn exit<T>(self, result: Result<T, InjectError>) -> Result<Option<T>, InjectError> {
        match result {
            Ok(value) => self.close(None).await.map(|_| Some(value)),
            Err(error) => self.close(Some(error)).await.map(|_| None),
        }
    }

    /// Releases every resource, newest first, see [ExitStack::close]
    pub async fn close(mut self, error: Option<InjectError>) -> Result<(), InjectError> {
        let mut error = error;
        self.failure = None;

        while let Some(Entry { call, resource }) = self.entries.pop() {
            tracing::debug!("Releasing '{call}'");
            let released = match resource {
                AnyResource::Sync(resource) => resource.release(outcome(&error)),
                AnyResource::Async(resource) => resource.release(outcome(&error)).await,
            };
            settle(call, released, &mut error);
        }

        match error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl Drop for AsyncExitStack {
    fn drop(&mut self) {
        let mut error = self.failure.take();

        while let Some(Entry { call, resource }) = self.entries.pop() {
            match resource {
                AnyResource::Sync(resource) => {
                    tracing::debug!("Releasing '{call}' from a dropped stack");
                    let released = resource.release(outcome(&error));
                    if let Err(release_error) = &released {
                        tracing::error!("Teardown of '{call}' failed: {release_error}");
                    }
                    settle(call, released, &mut error);
                }
                AnyResource::Async(_) => {
                    tracing::warn!("'{call}' dropped without teardown, the async exit stack was never closed");
                }
            }
        }
    }
}

fn outcome(error: &Option<InjectError>) -> Outcome<'_> {
    match error {
        Some(error) => Outcome::Failure(error),
        None => Outcome::Success,
    }
}

/// Folds the result of one release into the failure seen by older resources
fn settle(call: String, released: Result<Exit, DynError>, error: &mut Option<InjectError>) {
    match released {
        Ok(Exit::Suppress) => {
            if let Some(suppressed) = error.take() {
                tracing::warn!("'{call}' suppressed failure: {suppressed}");
            }
        }
        Ok(Exit::Propagate) => {}
        Err(release_error) => {
            *error = Some(InjectError::teardown(call, release_error, error.take()));
        }
    }
}
