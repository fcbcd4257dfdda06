use std::{fmt::Debug, sync::Arc};

use indexmap::IndexMap;

use crate::{
    callable::{CallKind, Callable},
    errors::ArgumentError,
    types::{Injectable, Instance, TypeInfo, Values},
};

/// Where the value of a parameter comes from
#[derive(Clone)]
pub enum ParameterSource {
    /// Looked up in the scope by parameter name
    Scope,
    /// Looked up in the scope by the parameter's annotation
    ByType,
    /// Produced by injecting another callable
    Dependency(Arc<CallableInfo>),
}
impl Debug for ParameterSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParameterSource::Scope => f.write_str("Scope"),
            ParameterSource::ByType => f.write_str("ByType"),
            ParameterSource::Dependency(info) => {
                f.debug_tuple("Dependency").field(&info.name()).finish()
            }
        }
    }
}

/// How a resolved value is passed to the callable body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParameterKind {
    PositionalOnly,
    #[default]
    PositionalOrKeyword,
    KeywordOnly,
    /// Receives a `Vec<Instance>` which is spliced into the positional arguments
    VarPositional,
    /// Receives an `IndexMap<String, Instance>` which is merged into the keyword arguments
    VarKeyword,
}

/// One formal parameter of a callable
#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: String,
    pub annotation: TypeInfo,
    pub source: ParameterSource,
    pub default: Option<Instance>,
    pub kind: ParameterKind,
}

impl Parameter {
    fn new(name: impl Into<String>, annotation: TypeInfo, source: ParameterSource) -> Self {
        Parameter {
            name: name.into(),
            annotation,
            source,
            default: None,
            kind: ParameterKind::default(),
        }
    }

    /// A parameter read from the scope by its name
    pub fn scope<T: ?Sized + 'static>(name: impl Into<String>) -> Self {
        Self::new(name, TypeInfo::of::<T>(), ParameterSource::Scope)
    }

    /// A parameter read from the scope by the type `T`
    pub fn by_type<T: ?Sized + 'static>(name: impl Into<String>) -> Self {
        Self::new(name, TypeInfo::of::<T>(), ParameterSource::ByType)
    }

    /// A parameter produced by injecting `dependency`
    pub fn from_dependency<T: ?Sized + 'static>(
        name: impl Into<String>,
        dependency: Arc<CallableInfo>,
    ) -> Self {
        Self::new(name, TypeInfo::of::<T>(), ParameterSource::Dependency(dependency))
    }

    pub fn with_default<T: Injectable>(self, default: T) -> Self {
        self.with_default_instance(Instance::new(default))
    }

    pub fn with_default_instance(mut self, default: Instance) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_kind(mut self, kind: ParameterKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn positional_only(self) -> Self {
        self.with_kind(ParameterKind::PositionalOnly)
    }

    pub fn keyword_only(self) -> Self {
        self.with_kind(ParameterKind::KeywordOnly)
    }

    pub fn var_positional(self) -> Self {
        self.with_kind(ParameterKind::VarPositional)
    }

    pub fn var_keyword(self) -> Self {
        self.with_kind(ParameterKind::VarKeyword)
    }

    /// The callable this parameter is produced by, if any
    pub fn depends_on(&self) -> Option<&Arc<CallableInfo>> {
        match &self.source {
            ParameterSource::Dependency(info) => Some(info),
            _ => None,
        }
    }

    pub fn resolve_by_type(&self) -> bool {
        matches!(self.source, ParameterSource::ByType)
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }
}

/// Scanned metadata of a callable
///
/// Shared by reference wherever the callable is used as a dependency.
pub struct CallableInfo {
    call: Callable,
    caching: bool,
}

/// Scans a callable, its produced values may be cached within one injection
pub fn scan(call: &Callable) -> Arc<CallableInfo> {
    scan_with(call, true)
}

/// Scans a callable with an explicit caching flag
///
/// A cached and an uncached scan of the same callable are independent descriptors that share
/// the callable's identity.
pub fn scan_with(call: &Callable, caching: bool) -> Arc<CallableInfo> {
    Arc::new(CallableInfo {
        call: call.clone(),
        caching,
    })
}

impl CallableInfo {
    pub fn call(&self) -> &Callable {
        &self.call
    }

    pub fn name(&self) -> &str {
        self.call.name()
    }

    pub fn parameters(&self) -> &[Parameter] {
        self.call.parameters()
    }

    pub fn is_async(&self) -> bool {
        self.call.is_async()
    }

    pub fn kind(&self) -> CallKind {
        self.call.kind()
    }

    pub fn is_generator(&self) -> bool {
        self.kind() == CallKind::Generator
    }

    pub fn is_context_manager(&self) -> bool {
        self.kind() == CallKind::ContextManager
    }

    pub fn return_type(&self) -> Option<TypeInfo> {
        self.call.return_type()
    }

    pub fn caching(&self) -> bool {
        self.caching
    }

    /// Splits resolved values into positional and keyword arguments
    pub fn build_arguments(&self, values: &Values) -> Result<Arguments, ArgumentError> {
        let mut arguments = Arguments::default();

        for parameter in self.parameters() {
            let value = values
                .get(&parameter.name)
                .ok_or_else(|| ArgumentError::Missing(parameter.name.clone()))?;

            match parameter.kind {
                ParameterKind::PositionalOnly | ParameterKind::PositionalOrKeyword => {
                    arguments.names.push(parameter.name.clone());
                    arguments.args.push(value.clone());
                }
                ParameterKind::KeywordOnly => {
                    arguments.kwargs.insert(parameter.name.clone(), value.clone());
                }
                ParameterKind::VarPositional => {
                    let spread = value.downcast_ref::<Vec<Instance>>().ok_or_else(|| {
                        ArgumentError::VariadicShape {
                            name: parameter.name.clone(),
                            required: TypeInfo::of::<Vec<Instance>>(),
                        }
                    })?;
                    arguments.args.extend(spread.iter().cloned());
                }
                ParameterKind::VarKeyword => {
                    let spread = value
                        .downcast_ref::<IndexMap<String, Instance>>()
                        .ok_or_else(|| ArgumentError::VariadicShape {
                            name: parameter.name.clone(),
                            required: TypeInfo::of::<IndexMap<String, Instance>>(),
                        })?;
                    arguments
                        .kwargs
                        .extend(spread.iter().map(|(key, value)| (key.clone(), value.clone())));
                }
            }
        }

        Ok(arguments)
    }

    /// Maps call arguments back onto the parameters they bind to
    pub fn build_values(&self, arguments: Arguments) -> Result<Values, ArgumentError> {
        let Arguments {
            args, mut kwargs, ..
        } = arguments;
        let mut values = Values::new();
        let mut args = args.into_iter();

        for parameter in self.parameters() {
            match parameter.kind {
                ParameterKind::PositionalOnly | ParameterKind::PositionalOrKeyword => {
                    let value = match args.next() {
                        Some(value) => value,
                        None if parameter.kind == ParameterKind::PositionalOrKeyword => kwargs
                            .shift_remove(&parameter.name)
                            .ok_or_else(|| ArgumentError::Missing(parameter.name.clone()))?,
                        None => return Err(ArgumentError::Missing(parameter.name.clone())),
                    };
                    values.insert(parameter.name.clone(), value);
                }
                ParameterKind::KeywordOnly => {
                    // Positionals not claimed by a variadic parameter fill keyword-only ones
                    let value = match kwargs.shift_remove(&parameter.name) {
                        Some(value) => value,
                        None => args
                            .next()
                            .ok_or_else(|| ArgumentError::Missing(parameter.name.clone()))?,
                    };
                    values.insert(parameter.name.clone(), value);
                }
                ParameterKind::VarPositional => {
                    let rest: Vec<Instance> = args.by_ref().collect();
                    values.insert(parameter.name.clone(), Instance::new(rest));
                }
                ParameterKind::VarKeyword => {
                    let rest = std::mem::take(&mut kwargs);
                    values.insert(parameter.name.clone(), Instance::new(rest));
                }
            }
        }

        Ok(values)
    }
}

impl Debug for CallableInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallableInfo")
            .field("call", &self.call)
            .field("caching", &self.caching)
            .field("parameters", &self.parameters())
            .finish()
    }
}

/// Arguments handed to a callable body
#[derive(Debug, Clone, Default)]
pub struct Arguments {
    pub args: Vec<Instance>,
    pub kwargs: IndexMap<String, Instance>,
    /// Parameter names of the leading positional arguments
    names: Vec<String>,
}

impl Arguments {
    pub fn new(args: Vec<Instance>, kwargs: IndexMap<String, Instance>) -> Self {
        Arguments {
            args,
            kwargs,
            names: Vec::new(),
        }
    }

    /// Looks up an argument by the name of the parameter it was resolved for
    pub fn instance(&self, name: &str) -> Option<&Instance> {
        if let Some(value) = self.kwargs.get(name) {
            return Some(value);
        }

        let index = self.names.iter().position(|positional| positional == name)?;
        self.args.get(index)
    }

    pub fn get<T: Injectable>(&self, name: &str) -> Result<Arc<T>, ArgumentError> {
        let instance = self
            .instance(name)
            .ok_or_else(|| ArgumentError::Missing(name.to_string()))?;

        instance
            .downcast::<T>()
            .map_err(|actual_type| ArgumentError::DowncastFailed {
                name: name.to_string(),
                required_type: std::any::type_name::<T>(),
                actual_type,
            })
    }

    /// Reads a positional argument
    pub fn arg<T: Injectable>(&self, index: usize) -> Result<Arc<T>, ArgumentError> {
        let instance = self
            .args
            .get(index)
            .ok_or_else(|| ArgumentError::Missing(format!("#{index}")))?;

        instance
            .downcast::<T>()
            .map_err(|actual_type| ArgumentError::DowncastFailed {
                name: format!("#{index}"),
                required_type: std::any::type_name::<T>(),
                actual_type,
            })
    }
}
