//! Lookups that merge a registry's components with those of its whole ancestor chain.
//!
//! Results list the registry's own entries first, then inherited ones. An inherited name is
//! dropped when it is already present or when the registry defines it locally, which makes a
//! local definition hide every same-named ancestor definition at any depth. The walk only makes
//! read calls into each registry and never holds one registry's lock while calling another.

use std::any::Any;
use std::collections::HashSet;
use std::sync::Arc;

use crate::registry::lookup::{downcast_instance, EnumerableLookup, NamedInstances};
use crate::registry::types::{DynInstance, RegistryError, RegistryResult, TypeKey};

pub fn count_including_ancestors(registry: &dyn EnumerableLookup) -> usize {
    names_including_ancestors(registry).len()
}

pub fn names_including_ancestors(registry: &dyn EnumerableLookup) -> Vec<String> {
    names_for_type_including_ancestors(registry, &TypeKey::any(), true, true)
}

pub fn names_for_type_including_ancestors(
    registry: &dyn EnumerableLookup,
    ty: &TypeKey,
    include_non_singletons: bool,
    allow_eager_init: bool,
) -> Vec<String> {
    let mut result = registry.names_for_type(ty, include_non_singletons, allow_eager_init);

    let Some(hierarchy) = registry.as_hierarchical() else {
        return result;
    };
    let Some(parent) = hierarchy.parent() else {
        return result;
    };
    let Some(parent) = parent.as_enumerable() else {
        return result;
    };

    let inherited =
        names_for_type_including_ancestors(parent, ty, include_non_singletons, allow_eager_init);
    let mut seen: HashSet<String> = result.iter().cloned().collect();
    for name in inherited {
        if seen.contains(&name) || hierarchy.contains_local(&name) {
            log::trace!("'{name}' is overridden locally; skipping inherited entry");
            continue;
        }
        seen.insert(name.clone());
        result.push(name);
    }
    result
}

pub fn instances_of_type_including_ancestors(
    registry: &dyn EnumerableLookup,
    ty: &TypeKey,
    include_non_singletons: bool,
    allow_eager_init: bool,
) -> RegistryResult<NamedInstances> {
    let mut result = registry.instances_of_type(ty, include_non_singletons, allow_eager_init)?;

    let Some(hierarchy) = registry.as_hierarchical() else {
        return Ok(result);
    };
    let Some(parent) = hierarchy.parent() else {
        return Ok(result);
    };
    let Some(parent) = parent.as_enumerable() else {
        return Ok(result);
    };

    let inherited = instances_of_type_including_ancestors(
        parent,
        ty,
        include_non_singletons,
        allow_eager_init,
    )?;
    let mut seen: HashSet<String> = result.iter().map(|(name, _)| name.clone()).collect();
    for (name, instance) in inherited {
        if seen.contains(&name) || hierarchy.contains_local(&name) {
            continue;
        }
        seen.insert(name.clone());
        result.push((name, instance));
    }
    Ok(result)
}

/// The single component of type `ty` visible from `registry`, ancestors included.
pub fn instance_of_type_including_ancestors(
    registry: &dyn EnumerableLookup,
    ty: &TypeKey,
) -> RegistryResult<DynInstance> {
    let matches = instances_of_type_including_ancestors(registry, ty, true, true)?;
    unique_instance(ty, matches)
}

/// The single component of type `ty` defined in `registry` itself.
pub fn instance_of_type(
    registry: &dyn EnumerableLookup,
    ty: &TypeKey,
    include_non_singletons: bool,
    allow_eager_init: bool,
) -> RegistryResult<DynInstance> {
    let matches = registry.instances_of_type(ty, include_non_singletons, allow_eager_init)?;
    unique_instance(ty, matches)
}

/// Typed form of [`instances_of_type_including_ancestors`] with both flags set.
pub fn instances_including_ancestors<T>(
    registry: &dyn EnumerableLookup,
) -> RegistryResult<Vec<(String, Arc<T>)>>
where
    T: Any + Send + Sync,
{
    instances_of_type_including_ancestors(registry, &TypeKey::of::<T>(), true, true)?
        .into_iter()
        .map(|(name, instance)| {
            let typed = downcast_instance::<T>(&name, instance)?;
            Ok((name, typed))
        })
        .collect()
}

/// Typed form of [`instance_of_type_including_ancestors`].
pub fn instance_including_ancestors<T>(registry: &dyn EnumerableLookup) -> RegistryResult<Arc<T>>
where
    T: Any + Send + Sync,
{
    let instance = instance_of_type_including_ancestors(registry, &TypeKey::of::<T>())?;
    downcast_instance(std::any::type_name::<T>(), instance)
}

/// Exactly one match returns it; none is `NoSuchComponentOfType`; several is
/// `AmbiguousComponent` naming every candidate. Never picks among several.
pub fn unique_instance(ty: &TypeKey, mut matches: NamedInstances) -> RegistryResult<DynInstance> {
    match matches.len() {
        1 => Ok(matches.remove(0).1),
        0 => Err(RegistryError::NoSuchComponentOfType {
            type_name: ty.name().to_string(),
        }),
        _ => Err(RegistryError::AmbiguousComponent {
            type_name: ty.name().to_string(),
            candidates: matches.into_iter().map(|(name, _)| name).collect(),
        }),
    }
}

/// Name-only counterpart of [`unique_instance`].
pub fn unique_name(ty: &TypeKey, mut names: Vec<String>) -> RegistryResult<String> {
    match names.len() {
        1 => Ok(names.remove(0)),
        0 => Err(RegistryError::NoSuchComponentOfType {
            type_name: ty.name().to_string(),
        }),
        _ => Err(RegistryError::AmbiguousComponent {
            type_name: ty.name().to_string(),
            candidates: names,
        }),
    }
}
