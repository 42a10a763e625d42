use std::any::Any;
use std::sync::Arc;

use serde_json::Value;

use crate::registry::types::{DynInstance, RegistryError, RegistryResult, TypeKey};

pub type NamedInstances = Vec<(String, DynInstance)>;

/// Basic lookup contract shared by every registry.
///
/// Names may carry factory-reference prefixes and may be aliases; implementations resolve both
/// before looking anything up. Lookups that miss locally fall through to the parent, if any.
pub trait ComponentLookup: Send + Sync {
    fn get_instance(&self, name: &str) -> RegistryResult<DynInstance> {
        self.get_instance_with_args(name, &[])
    }

    /// Like [`get_instance`](Self::get_instance) with explicit construction arguments. Fails
    /// with [`RegistryError::ScopeMismatch`] when `args` is non-empty and the component is an
    /// already-built singleton.
    fn get_instance_with_args(&self, name: &str, args: &[Value]) -> RegistryResult<DynInstance>;

    /// Resolves `name` and checks that the instance is a `ty`.
    fn get_instance_typed(&self, name: &str, ty: &TypeKey) -> RegistryResult<DynInstance> {
        let instance = self.get_instance(name)?;
        if ty.matches_instance(&instance) {
            return Ok(instance);
        }
        let actual = self
            .declared_type(name)
            .map(|declared| declared.name())
            .unwrap_or("<unknown>");
        Err(RegistryError::TypeMismatch {
            name: name.to_string(),
            expected: ty.name().to_string(),
            actual: actual.to_string(),
        })
    }

    fn get_instance_of_type(&self, ty: &TypeKey) -> RegistryResult<DynInstance> {
        self.get_instance_of_type_with_args(ty, &[])
    }

    fn get_instance_of_type_with_args(
        &self,
        ty: &TypeKey,
        args: &[Value],
    ) -> RegistryResult<DynInstance>;

    fn contains(&self, name: &str) -> bool;

    fn is_singleton(&self, name: &str) -> RegistryResult<bool>;

    fn is_prototype(&self, name: &str) -> RegistryResult<bool>;

    /// False, never an error, when `name` cannot be resolved.
    fn is_type_match(&self, name: &str, ty: &TypeKey) -> bool {
        self.declared_type(name)
            .map(|declared| ty.is_assignable_from(&declared))
            .unwrap_or(false)
    }

    fn declared_type(&self, name: &str) -> RegistryResult<TypeKey>;

    fn aliases(&self, name: &str) -> RegistryResult<Vec<String>>;

    fn as_hierarchical(&self) -> Option<&dyn HierarchicalLookup> {
        None
    }

    fn as_enumerable(&self) -> Option<&dyn EnumerableLookup> {
        None
    }
}

/// A registry that may have a parent.
pub trait HierarchicalLookup: ComponentLookup {
    fn parent(&self) -> Option<Arc<dyn ComponentLookup>>;

    /// True iff `name` is defined in this registry itself, ignoring any parent. Reflects
    /// registered definitions and singletons only, never construction state.
    fn contains_local(&self, name: &str) -> bool;

    /// Stable identity of the underlying registry, shared by all handles to it.
    fn registry_id(&self) -> usize;
}

/// A registry that can list its own components. Never consults the parent.
pub trait EnumerableLookup: ComponentLookup {
    fn contains_definition(&self, name: &str) -> bool;

    fn definition_count(&self) -> usize;

    fn definition_names(&self) -> Vec<String>;

    /// Local names whose type is assignable to `ty`, in registration order.
    ///
    /// With `include_non_singletons` unset only singleton-scoped entries qualify; with
    /// `allow_eager_init` unset singletons that have not been built yet are skipped.
    fn names_for_type(
        &self,
        ty: &TypeKey,
        include_non_singletons: bool,
        allow_eager_init: bool,
    ) -> Vec<String>;

    /// Instances for the names [`names_for_type`](Self::names_for_type) returns, building them
    /// as needed.
    fn instances_of_type(
        &self,
        ty: &TypeKey,
        include_non_singletons: bool,
        allow_eager_init: bool,
    ) -> RegistryResult<NamedInstances>;
}

/// Typed front-end over [`ComponentLookup`].
pub trait ComponentLookupExt: ComponentLookup {
    fn get<T>(&self, name: &str) -> RegistryResult<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        let instance = self.get_instance_typed(name, &TypeKey::of::<T>())?;
        downcast_instance(name, instance)
    }

    fn get_with_args<T>(&self, name: &str, args: &[Value]) -> RegistryResult<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        let instance = self.get_instance_with_args(name, args)?;
        downcast_instance(name, instance)
    }

    fn get_by_type<T>(&self) -> RegistryResult<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        let instance = self.get_instance_of_type(&TypeKey::of::<T>())?;
        downcast_instance(std::any::type_name::<T>(), instance)
    }

    fn get_by_type_with_args<T>(&self, args: &[Value]) -> RegistryResult<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        let instance = self.get_instance_of_type_with_args(&TypeKey::of::<T>(), args)?;
        downcast_instance(std::any::type_name::<T>(), instance)
    }

    fn is_type_match_of<T>(&self, name: &str) -> bool
    where
        T: Any + Send + Sync,
    {
        self.is_type_match(name, &TypeKey::of::<T>())
    }
}

impl<L: ComponentLookup + ?Sized> ComponentLookupExt for L {}

pub(crate) fn downcast_instance<T>(name: &str, instance: DynInstance) -> RegistryResult<Arc<T>>
where
    T: Any + Send + Sync,
{
    instance
        .downcast::<T>()
        .map_err(|_| RegistryError::TypeMismatch {
            name: name.to_string(),
            expected: std::any::type_name::<T>().to_string(),
            actual: "<erased>".to_string(),
        })
}
