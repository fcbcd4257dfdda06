use std::sync::Arc;

use thiserror::Error;

use crate::{
    info::CallableInfo,
    trace::InjectionTrace,
    types::{DynError, TypeInfo, Values},
};

/// Errors raised while resolving the parameters of a callable
#[derive(Error, Debug, Clone)]
pub enum ResolveError {
    /// A scope-bound parameter had no matching scope entry and no default
    #[error("No value found in scope for parameter '{parameter}' of '{call}'")]
    ScopeValueNotFound { parameter: String, call: String },
    /// An asynchronous callable was required by a synchronous injection
    #[error("'{call}' is asynchronous and cannot be injected synchronously")]
    InvalidDependencyShape { call: String },
}

/// Errors when reading or assembling call arguments
#[derive(Error, Debug, Clone)]
pub enum ArgumentError {
    #[error("Argument '{0}' is missing")]
    Missing(String),
    #[error("Argument '{name}' has the wrong type, required: '{required_type}' actual: '{actual_type}'")]
    DowncastFailed {
        name: String,
        required_type: &'static str,
        actual_type: &'static str,
    },
    /// A variadic parameter received a value of the wrong shape
    #[error("Variadic parameter '{name}' requires a '{required}'")]
    VariadicShape { name: String, required: TypeInfo },
}

#[derive(Error, Debug)]
pub enum InjectErrorKind {
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Arguments(#[from] ArgumentError),
    /// The body of a callable failed - the error is kept as it was raised
    #[error("{0}")]
    Call(DynError),
    /// Releasing a scoped resource failed
    ///
    /// `displaced` is the failure that was propagating when the release failed.
    #[error("Teardown of '{call}' failed: {error}")]
    Teardown {
        call: String,
        error: DynError,
        displaced: Option<Box<InjectError>>,
    },
}

/// Error propagated out of an injection
///
/// Carries the kind of failure together with the [InjectionTrace] recorded while the error
/// travelled through the injection frames.
#[derive(Debug)]
pub struct InjectError {
    kind: InjectErrorKind,
    trace: Option<Box<InjectionTrace>>,
}

impl InjectError {
    /// Wraps an error raised by the body of a callable
    pub fn call(error: impl Into<DynError>) -> Self {
        InjectErrorKind::Call(error.into()).into()
    }

    pub(crate) fn teardown(
        call: impl Into<String>,
        error: DynError,
        displaced: Option<InjectError>,
    ) -> Self {
        InjectErrorKind::Teardown {
            call: call.into(),
            error,
            displaced: displaced.map(Box::new),
        }
        .into()
    }

    /// Copy of this error for resources released after the original was handed back
    ///
    /// Errors raised by callables cannot be cloned, they are kept as their message.
    pub(crate) fn detached(&self) -> Self {
        let kind = match &self.kind {
            InjectErrorKind::Resolve(error) => InjectErrorKind::Resolve(error.clone()),
            InjectErrorKind::Arguments(error) => InjectErrorKind::Arguments(error.clone()),
            InjectErrorKind::Call(error) => InjectErrorKind::Call(error.to_string().into()),
            InjectErrorKind::Teardown {
                call,
                error,
                displaced,
            } => InjectErrorKind::Teardown {
                call: call.clone(),
                error: error.to_string().into(),
                displaced: displaced.as_ref().map(|error| Box::new(error.detached())),
            },
        };

        InjectError {
            kind,
            trace: self.trace.clone(),
        }
    }

    pub fn kind(&self) -> &InjectErrorKind {
        &self.kind
    }

    pub fn into_kind(self) -> InjectErrorKind {
        self.kind
    }

    pub fn trace(&self) -> Option<&InjectionTrace> {
        self.trace.as_deref()
    }

    /// The failure a failing teardown replaced, if any
    pub fn displaced(&self) -> Option<&InjectError> {
        match &self.kind {
            InjectErrorKind::Teardown { displaced, .. } => displaced.as_deref(),
            _ => None,
        }
    }

    /// The error raised by a callable body or teardown, if this is such a failure
    pub fn source_error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match &self.kind {
            InjectErrorKind::Call(error) | InjectErrorKind::Teardown { error, .. } => {
                Some(error.as_ref())
            }
            _ => None,
        }
    }

    /// Attempts to view the original error raised by a callable as `E`
    pub fn downcast_ref<E: std::error::Error + 'static>(&self) -> Option<&E> {
        self.source_error()?.downcast_ref::<E>()
    }

    /// Returns the original error raised by a callable, or this error boxed otherwise
    pub fn into_source(self) -> DynError {
        match self.kind {
            InjectErrorKind::Call(error) => error,
            _ => Box::new(self),
        }
    }

    /// Records the frame the error passed through, the existing trace becomes its origin
    pub(crate) fn traced(mut self, info: &Arc<CallableInfo>, values: &Values) -> Self {
        self.trace = Some(Box::new(InjectionTrace {
            info: info.clone(),
            values: values.clone(),
            origin: self.trace.take(),
        }));
        self
    }
}

impl std::fmt::Display for InjectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.kind, f)
    }
}

impl std::error::Error for InjectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            // Call errors are displayed as themselves, so expose their cause
            InjectErrorKind::Call(error) => error.source(),
            InjectErrorKind::Teardown { error, .. } => Some(error.as_ref()),
            InjectErrorKind::Resolve(_) | InjectErrorKind::Arguments(_) => None,
        }
    }
}

impl From<InjectErrorKind> for InjectError {
    fn from(kind: InjectErrorKind) -> Self {
        InjectError { kind, trace: None }
    }
}
impl From<ResolveError> for InjectError {
    fn from(error: ResolveError) -> Self {
        InjectErrorKind::Resolve(error).into()
    }
}
impl From<ArgumentError> for InjectError {
    fn from(error: ArgumentError) -> Self {
        InjectErrorKind::Arguments(error).into()
    }
}

/// Extracts the diagnostic chain attached to a propagated error
pub fn injection_trace(error: &InjectError) -> Option<&InjectionTrace> {
    error.trace()
}
