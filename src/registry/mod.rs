mod definition;
pub mod ancestors;
pub mod constants;
pub mod container;
pub mod lookup;
pub mod names;
pub mod settings;
pub mod singletons;
pub mod types;

pub use constants::{
    DEFAULT_REGISTRY_NAME, FACTORY_REFERENCE_PREFIX, GENERATED_NAME_SEPARATOR, SCOPE_PROTOTYPE,
    SCOPE_SINGLETON,
};
pub use container::Registry;
pub use definition::ComponentDefinition;
pub use lookup::{
    ComponentLookup, ComponentLookupExt, EnumerableLookup, HierarchicalLookup, NamedInstances,
};
pub use names::{is_factory_reference, is_generated_name, original_name, transformed_name};
pub use settings::{RegistryConfig, RegistrySettings};
pub use singletons::SingletonRegistry;
pub use types::{
    ComponentBuilder, DynInstance, InstantiationMode, RegistryError, RegistryResult, Scope,
    TypeKey,
};
