use std::{
    any::{Any, TypeId},
    fmt::Debug,
    sync::Arc,
};

use indexmap::IndexMap;

/// Error type returned by every callable body
pub type DynError = Box<dyn std::error::Error + Send + Sync>;

/// Resolved parameter values of one call, in declaration order
pub type Values = IndexMap<String, Instance>;

/// Injected values may cross threads when an async injection is driven by a
/// multithreaded runtime, so anything injectable needs to be Send + Sync + 'static
pub trait Injectable: Send + Sync + 'static {}
impl<T: Send + Sync + 'static> Injectable for T {}

/// A produced or scoped value
///
/// Cloning an instance shares the underlying value, [Instance::same] compares by identity.
#[derive(Clone)]
pub struct Instance {
    pub info: TypeInfo,
    pub instance: Arc<dyn Any + Send + Sync + 'static>,
}
impl Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Instance").field(&self.info.type_name).finish()
    }
}

impl Instance {
    pub fn new<T: Injectable>(instance: T) -> Self {
        Instance {
            info: TypeInfo::of::<T>(),
            instance: Arc::new(instance),
        }
    }

    /// Wraps an already shared value without reallocating it
    pub fn from_arc<T: Injectable>(instance: Arc<T>) -> Self {
        Instance {
            info: TypeInfo::of::<T>(),
            instance,
        }
    }

    /// The unit value, produced by callables that return nothing
    pub fn unit() -> Self {
        Instance::new(())
    }

    pub fn downcast<T: Injectable>(&self) -> Result<Arc<T>, &'static str> {
        match Arc::downcast::<T>(self.instance.clone()) {
            Ok(downcasted) => Ok(downcasted),
            Err(_) => Err(self.info.type_name),
        }
    }

    pub fn downcast_ref<T: Injectable>(&self) -> Option<&T> {
        self.instance.downcast_ref::<T>()
    }

    pub fn is<T: Injectable>(&self) -> bool {
        self.info.type_id == TypeId::of::<T>()
    }

    /// Returns true if both instances share the same allocation
    pub fn same(a: &Instance, b: &Instance) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&a.instance), Arc::as_ptr(&b.instance))
    }
}

/// Type Name and Type Id
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct TypeInfo {
    pub type_name: &'static str,
    pub type_id: TypeId,
}
impl std::fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.type_name)
    }
}
impl TypeInfo {
    pub fn of<T: 'static + ?Sized>() -> TypeInfo {
        TypeInfo {
            type_name: std::any::type_name::<T>(),
            type_id: TypeId::of::<T>(),
        }
    }
}
