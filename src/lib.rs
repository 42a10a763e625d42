//! A hierarchical component registry.
//!
//! A [`Registry`](registry::Registry) resolves named, typed components and falls back to its
//! parent when a lookup misses locally. Locally defined components always shadow same-named
//! ancestor components, both in single lookups and in the merged listings produced by
//! [`registry::ancestors`]. Shared (singleton) instances live in a
//! [`SingletonRegistry`](registry::SingletonRegistry) and are built at most once per name.
//!
//! ```
//! use component_registry::registry::{
//!     ancestors, ComponentDefinition, ComponentLookupExt, Registry, RegistrySettings, Scope,
//! };
//!
//! struct Cache(&'static str);
//!
//! let root = Registry::new(RegistrySettings::named("root")).unwrap();
//! root.register_definition(ComponentDefinition::of("cache", |_, _| Ok(Cache("root"))))
//!     .unwrap();
//! root.register_definition(
//!     ComponentDefinition::of("worker", |_, _| Ok(0u32)).with_scope(Scope::Prototype),
//! )
//! .unwrap();
//!
//! let child = root.new_child(RegistrySettings::named("child")).unwrap();
//! child.register_definition(ComponentDefinition::of("cache", |_, _| Ok(Cache("child"))))
//!     .unwrap();
//!
//! assert_eq!(ancestors::names_including_ancestors(&child), ["cache", "worker"]);
//! assert_eq!(child.get::<Cache>("cache").unwrap().0, "child");
//! ```

pub mod injection;
pub mod registry;
