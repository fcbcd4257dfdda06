use std::sync::Arc;

use futures::{future::BoxFuture, FutureExt};

use crate::{
    cache::{InjectionCache, Override},
    callable::Body,
    errors::{InjectError, ResolveError},
    info::CallableInfo,
    resolver::{resolve_parameter, Resolution},
    scope::Scope,
    stack::{AsyncExitStack, ExitStack},
    types::{Instance, Values},
};

/// Synchronously injects the dependencies of `info` and calls it
///
/// Dependencies are injected depth-first before the callable runs. Scoped resources are
/// registered on `stack` and released when it closes. A failure is remembered by the stack,
/// so resources still see it if the stack is dropped instead. Without a `cache` a fresh one is
/// used for this call only.
pub fn inject(
    scope: &Scope,
    info: &Arc<CallableInfo>,
    stack: &mut ExitStack,
    cache: Option<&mut InjectionCache>,
    overrides: Option<&Override>,
) -> Result<Instance, InjectError> {
    let mut local_cache = InjectionCache::new();
    let cache = cache.unwrap_or(&mut local_cache);

    let result = inject_frame(scope, info, stack, cache, overrides);
    if let Err(error) = &result {
        stack.mark_failed(error);
    }
    result
}

fn inject_frame(
    scope: &Scope,
    info: &Arc<CallableInfo>,
    stack: &mut ExitStack,
    cache: &mut InjectionCache,
    overrides: Option<&Override>,
) -> Result<Instance, InjectError> {
    if info.is_async() {
        let error = InjectError::from(ResolveError::InvalidDependencyShape {
            call: info.name().to_string(),
        });
        return Err(error.traced(info, &Values::new()));
    }

    let mut values = Values::new();

    for parameter in info.parameters() {
        let result = resolve_parameter(scope, info, parameter, cache, overrides)
            .map_err(|error| InjectError::from(error).traced(info, &values))?;

        let value = match result.resolution {
            Resolution::Value(value) => value,
            Resolution::Dependency(dependency) => {
                let scope = scope.for_parameter(parameter);
                let value = inject_frame(&scope, &dependency, stack, cache, overrides)
                    .map_err(|error| error.traced(info, &values))?;

                if dependency.caching() {
                    cache.insert(dependency.call().clone(), value.clone());
                }
                value
            }
        };

        values.insert(parameter.name.clone(), value);
    }

    call_sync(stack, info, &values).map_err(|error| error.traced(info, &values))
}

fn call_sync(
    stack: &mut ExitStack,
    info: &CallableInfo,
    values: &Values,
) -> Result<Instance, InjectError> {
    let arguments = info.build_arguments(values)?;

    match info.call().body() {
        Body::Function(body) => {
            tracing::debug!("Calling '{}'", info.name());
            body(arguments).map_err(InjectError::call)
        }
        Body::Resource(body) => {
            tracing::debug!("Entering '{}'", info.name());
            let mut resource = body(arguments).map_err(InjectError::call)?;
            let value = resource.acquire().map_err(InjectError::call)?;
            stack.push(info.name(), resource);
            Ok(value)
        }
        Body::AsyncFunction(_) | Body::AsyncResource(_) => {
            Err(ResolveError::InvalidDependencyShape {
                call: info.name().to_string(),
            }
            .into())
        }
    }
}

/// Asynchronously injects the dependencies of `info` and calls it
///
/// Synchronous callables run inline. The injection suspends only while an asynchronous
/// callable or resource runs.
pub async fn ainject(
    scope: &Scope,
    info: &Arc<CallableInfo>,
    stack: &mut AsyncExitStack,
    cache: Option<&mut InjectionCache>,
    overrides: Option<&Override>,
) -> Result<Instance, InjectError> {
    let mut local_cache = InjectionCache::new();
    let cache = cache.unwrap_or(&mut local_cache);

    let result = ainject_frame(scope, info, stack, cache, overrides).await;
    if let Err(error) = &result {
        stack.mark_failed(error);
    }
    result
}

fn ainject_frame<'a>(
    scope: &'a Scope,
    info: &'a Arc<CallableInfo>,
    stack: &'a mut AsyncExitStack,
    cache: &'a mut InjectionCache,
    overrides: Option<&'a Override>,
) -> BoxFuture<'a, Result<Instance, InjectError>> {
    async move {
        let mut values = Values::new();

        for parameter in info.parameters() {
            let result = resolve_parameter(scope, info, parameter, cache, overrides)
                .map_err(|error| InjectError::from(error).traced(info, &values))?;

            let value = match result.resolution {
                Resolution::Value(value) => value,
                Resolution::Dependency(dependency) => {
                    let scope = scope.for_parameter(parameter);
                    let value = ainject_frame(&scope, &dependency, &mut *stack, &mut *cache, overrides)
                        .await
                        .map_err(|error| error.traced(info, &values))?;

                    if dependency.caching() {
                        cache.insert(dependency.call().clone(), value.clone());
                    }
                    value
                }
            };

            values.insert(parameter.name.clone(), value);
        }

        call_async(stack, info, &values)
            .await
            .map_err(|error| error.traced(info, &values))
    }
    .boxed()
}

async fn call_async(
    stack: &mut AsyncExitStack,
    info: &CallableInfo,
    values: &Values,
) -> Result<Instance, InjectError> {
    let arguments = info.build_arguments(values)?;

    match info.call().body() {
        Body::Function(body) => {
            tracing::debug!("Calling '{}'", info.name());
            body(arguments).map_err(InjectError::call)
        }
        Body::AsyncFunction(body) => {
            tracing::debug!("Awaiting '{}'", info.name());
            body(arguments).await.map_err(InjectError::call)
        }
        Body::Resource(body) => {
            tracing::debug!("Entering '{}'", info.name());
            let mut resource = body(arguments).map_err(InjectError::call)?;
            let value = resource.acquire().map_err(InjectError::call)?;
            stack.push(info.name(), resource);
            Ok(value)
        }
        Body::AsyncResource(body) => {
            tracing::debug!("Entering '{}'", info.name());
            let mut resource = body(arguments).await.map_err(InjectError::call)?;
            let value = resource.acquire().await.map_err(InjectError::call)?;
            stack.push_async(info.name(), resource);
            Ok(value)
        }
    }
}
