use std::sync::Arc;

use crate::{
    cache::{InjectionCache, Override, OverrideValue},
    errors::ResolveError,
    info::{CallableInfo, Parameter, ParameterSource},
    scope::Scope,
    types::Instance,
};

/// How a single parameter was resolved
#[derive(Debug, Clone)]
pub enum Resolution {
    /// Found in the scope, the cache, an override or the parameter default
    Value(Instance),
    /// Must be produced by injecting this callable
    Dependency(Arc<CallableInfo>),
}

#[derive(Debug, Clone)]
pub struct ParameterResult<'a> {
    pub parameter: &'a Parameter,
    pub resolution: Resolution,
}

impl ParameterResult<'_> {
    pub fn parameter_name(&self) -> &str {
        &self.parameter.name
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.resolution, Resolution::Value(_))
    }

    pub fn value(&self) -> Option<&Instance> {
        match &self.resolution {
            Resolution::Value(value) => Some(value),
            Resolution::Dependency(_) => None,
        }
    }

    pub fn dependency(&self) -> Option<&Arc<CallableInfo>> {
        match &self.resolution {
            Resolution::Value(_) => None,
            Resolution::Dependency(info) => Some(info),
        }
    }
}

/// Resolves the parameters of `info` in declaration order
///
/// Parameters are resolved lazily, a parameter that cannot be found fails when it is reached.
pub fn resolve<'a, 's>(
    scope: &'s Scope,
    info: &'a CallableInfo,
    cache: &'s InjectionCache,
    overrides: Option<&'s Override>,
) -> impl Iterator<Item = Result<ParameterResult<'a>, ResolveError>> + 's
where
    'a: 's,
{
    info.parameters()
        .iter()
        .map(move |parameter| resolve_parameter(scope, info, parameter, cache, overrides))
}

/// Resolves one parameter of `info`
pub fn resolve_parameter<'a>(
    scope: &Scope,
    info: &CallableInfo,
    parameter: &'a Parameter,
    cache: &InjectionCache,
    overrides: Option<&Override>,
) -> Result<ParameterResult<'a>, ResolveError> {
    let resolution = match &parameter.source {
        ParameterSource::Dependency(dependency) => {
            resolve_dependency(parameter, dependency, cache, overrides)
        }
        ParameterSource::Scope => Resolution::Value(scope_value(
            scope.get(&parameter.name),
            info,
            parameter,
        )?),
        ParameterSource::ByType => Resolution::Value(scope_value(
            scope.find_by_type(parameter.annotation),
            info,
            parameter,
        )?),
    };

    Ok(ParameterResult {
        parameter,
        resolution,
    })
}

fn resolve_dependency(
    parameter: &Parameter,
    dependency: &Arc<CallableInfo>,
    cache: &InjectionCache,
    overrides: Option<&Override>,
) -> Resolution {
    let mut dependency = dependency;

    match overrides.and_then(|overrides| overrides.get(dependency.call())) {
        Some(OverrideValue::Value(value)) => {
            tracing::trace!(
                "'{}' overridden by a value for parameter '{}'",
                dependency.name(),
                parameter.name
            );
            return Resolution::Value(value.clone());
        }
        Some(OverrideValue::Dependency(replacement)) => {
            tracing::trace!(
                "'{}' overridden by '{}' for parameter '{}'",
                dependency.name(),
                replacement.name(),
                parameter.name
            );
            dependency = replacement;
        }
        None => {}
    }

    if dependency.caching() {
        if let Some(cached) = cache.get(dependency.call()) {
            tracing::trace!(
                "Using cached '{}' for parameter '{}'",
                dependency.name(),
                parameter.name
            );
            return Resolution::Value(cached.clone());
        }
    }

    Resolution::Dependency(dependency.clone())
}

fn scope_value(
    found: Option<&Instance>,
    info: &CallableInfo,
    parameter: &Parameter,
) -> Result<Instance, ResolveError> {
    found
        .or(parameter.default.as_ref())
        .cloned()
        .ok_or_else(|| ResolveError::ScopeValueNotFound {
            parameter: parameter.name.clone(),
            call: info.name().to_string(),
        })
}
