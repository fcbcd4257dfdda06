use std::sync::Arc;

use indexmap::IndexMap;

use crate::{
    cache::InjectionCache,
    callable::Callable,
    errors::ResolveError,
    info::CallableInfo,
    resolver::{resolve_parameter, Resolution},
    scope::Scope,
    types::Instance,
};

/// The callables an injection of `info` would invoke, in invocation order
///
/// The root callable is not part of the order. Nothing is invoked: cached dependencies are
/// marked with a placeholder the first time they are reached, so a cacheable dependency appears
/// once while an uncached one appears at every use site.
pub fn order(scope: &Scope, info: &CallableInfo) -> Result<Vec<Callable>, ResolveError> {
    let mut placeholders = InjectionCache::new();
    let mut order = Vec::new();

    order_recurse(scope, info, &mut placeholders, &mut order)?;

    return Ok(order);

    fn order_recurse(
        scope: &Scope,
        info: &CallableInfo,
        placeholders: &mut InjectionCache,
        order: &mut Vec<Callable>,
    ) -> Result<(), ResolveError> {
        for parameter in info.parameters() {
            let result = resolve_parameter(scope, info, parameter, placeholders, None)?;

            let Resolution::Dependency(dependency) = result.resolution else {
                continue;
            };

            let scope = scope.for_parameter(parameter);
            order_recurse(&scope, &dependency, placeholders, order)?;

            order.push(dependency.call().clone());
            if dependency.caching() {
                placeholders.insert(dependency.call().clone(), Instance::unit());
            }
        }

        Ok(())
    }
}

/// Structural snapshot of what an injection of `info` would build
///
/// Every dependency is expanded where it is used, values are the ones found in the scope.
pub fn tree(scope: &Scope, info: &Arc<CallableInfo>) -> Result<Tree, ResolveError> {
    let empty = InjectionCache::new();
    let mut values = IndexMap::new();

    for parameter in info.parameters() {
        let result = resolve_parameter(scope, info, parameter, &empty, None)?;

        let node = match result.resolution {
            Resolution::Value(value) => Node::Value(value),
            Resolution::Dependency(dependency) => {
                Node::Tree(tree(&scope.for_parameter(parameter), &dependency)?)
            }
        };
        values.insert(parameter.name.clone(), node);
    }

    Ok(Tree {
        call: info.call().clone(),
        values,
    })
}

/// A callable with the values it would receive
#[derive(Debug, Clone)]
pub struct Tree {
    pub call: Callable,
    pub values: IndexMap<String, Node>,
}

#[derive(Debug, Clone)]
pub enum Node {
    Value(Instance),
    Tree(Tree),
}

impl Tree {
    pub fn get(&self, name: &str) -> Option<&Node> {
        self.values.get(name)
    }
}

impl Node {
    pub fn value(&self) -> Option<&Instance> {
        match self {
            Node::Value(value) => Some(value),
            Node::Tree(_) => None,
        }
    }

    pub fn tree(&self) -> Option<&Tree> {
        match self {
            Node::Value(_) => None,
            Node::Tree(tree) => Some(tree),
        }
    }
}

impl std::fmt::Display for Tree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut display = Vec::new();
        push_lines(self, 0, &mut display);
        return f.write_str(&display.join("\n"));

        fn push_lines(tree: &Tree, depth: usize, display: &mut Vec<String>) {
            display.push(format!("{}{}", "  ".repeat(depth), tree.call.name()));
            for (name, node) in &tree.values {
                match node {
                    Node::Value(value) => {
                        display.push(format!("{}{name}: {}", "  ".repeat(depth + 1), value.info))
                    }
                    Node::Tree(nested) => {
                        display.push(format!("{}{name}:", "  ".repeat(depth + 1)));
                        push_lines(nested, depth + 2, display);
                    }
                }
            }
        }
    }
}
