use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::Value;

use crate::injection::InjectionPoint;
use crate::registry::ancestors;
use crate::registry::definition::ComponentDefinition;
use crate::registry::lookup::{
    ComponentLookup, EnumerableLookup, HierarchicalLookup, NamedInstances,
};
use crate::registry::names::{transformed_name, validate_name};
use crate::registry::settings::{RegistryConfig, RegistrySettings};
use crate::registry::singletons::SingletonRegistry;
use crate::registry::types::{
    DynInstance, InstantiationMode, RegistryError, RegistryResult, Scope, TypeKey,
};

/// Held while a parent link is checked and written, so two registries cannot adopt each other.
static PARENT_LINKS: Mutex<()> = Mutex::new(());

fn parent_links_guard() -> MutexGuard<'static, ()> {
    PARENT_LINKS.lock().unwrap_or_else(|poison| poison.into_inner())
}

/// Concrete registry: definitions, aliases and shared instances, with an optional parent.
///
/// Cloning yields another handle to the same registry.
#[derive(Clone)]
pub struct Registry {
    pub(crate) inner: Arc<RegistryInner>,
}

pub(crate) struct RegistryInner {
    config: RegistryConfig,
    parent: RwLock<Option<Arc<dyn ComponentLookup>>>,
    definitions: RwLock<DefinitionTable>,
    singletons: SingletonRegistry,
}

#[derive(Default)]
struct DefinitionTable {
    order: Vec<Arc<str>>,
    definitions: HashMap<Arc<str>, ComponentDefinition>,
    alias_order: Vec<String>,
    aliases: HashMap<String, Arc<str>>,
}

impl DefinitionTable {
    fn canonical<'a>(&'a self, name: &'a str) -> &'a str {
        self.aliases.get(name).map(|target| target.as_ref()).unwrap_or(name)
    }

    fn aliases_of(&self, canonical: &str) -> Vec<String> {
        self.alias_order
            .iter()
            .filter(|alias| {
                self.aliases
                    .get(alias.as_str())
                    .is_some_and(|target| target.as_ref() == canonical)
            })
            .cloned()
            .collect()
    }

    /// Checks whether `alias` may point at `canonical`; `Ok(false)` means it already does.
    fn check_alias(
        &self,
        canonical: &str,
        alias: &str,
        allow_overriding: bool,
    ) -> RegistryResult<bool> {
        validate_name(alias)?;
        if alias == canonical {
            return Ok(false);
        }
        if self.definitions.contains_key(alias) {
            return Err(RegistryError::DuplicateRegistration {
                name: alias.to_string(),
            });
        }
        match self.aliases.get(alias) {
            Some(target) if target.as_ref() == canonical => Ok(false),
            Some(target) if !allow_overriding => {
                log::debug!("alias '{alias}' already points at '{target}'");
                Err(RegistryError::DuplicateRegistration {
                    name: alias.to_string(),
                })
            }
            _ => Ok(true),
        }
    }

    fn insert_alias(&mut self, canonical: &str, alias: &str) {
        if !self.aliases.contains_key(alias) {
            self.alias_order.push(alias.to_string());
        }
        self.aliases.insert(alias.to_string(), Arc::from(canonical));
    }

    fn add_alias(
        &mut self,
        canonical: &str,
        alias: &str,
        allow_overriding: bool,
    ) -> RegistryResult<()> {
        if self.check_alias(canonical, alias, allow_overriding)? {
            self.insert_alias(canonical, alias);
        }
        Ok(())
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::from_config(RegistryConfig::default(), None)
    }
}

impl Registry {
    pub fn new(settings: RegistrySettings) -> RegistryResult<Self> {
        Ok(Self::from_config(settings.into_config()?, None))
    }

    pub fn with_parent(
        settings: RegistrySettings,
        parent: Arc<dyn ComponentLookup>,
    ) -> RegistryResult<Self> {
        Ok(Self::from_config(settings.into_config()?, Some(parent)))
    }

    /// Creates a registry whose parent is this one.
    pub fn new_child(&self, settings: RegistrySettings) -> RegistryResult<Self> {
        Self::with_parent(settings, Arc::new(self.clone()))
    }

    fn from_config(config: RegistryConfig, parent: Option<Arc<dyn ComponentLookup>>) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                config,
                parent: RwLock::new(parent),
                definitions: RwLock::new(DefinitionTable::default()),
                singletons: SingletonRegistry::new(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.config.name
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.inner.config
    }

    pub fn singletons(&self) -> &SingletonRegistry {
        &self.inner.singletons
    }

    /// Attaches a parent to a registry created without one. A parent can be set once; a
    /// parent chain that already contains this registry is rejected.
    pub fn set_parent(&self, parent: Arc<dyn ComponentLookup>) -> RegistryResult<()> {
        let _links = parent_links_guard();
        let mut ancestor = Some(parent.clone());
        while let Some(current) = ancestor {
            let Some(hierarchy) = current.as_hierarchical() else {
                break;
            };
            if hierarchy.registry_id() == self.registry_id() {
                return Err(RegistryError::invalid_argument(format!(
                    "registry '{}' cannot be its own ancestor",
                    self.name()
                )));
            }
            ancestor = hierarchy.parent();
        }

        let mut slot = self
            .inner
            .parent
            .write()
            .unwrap_or_else(|poison| poison.into_inner());
        if slot.is_some() {
            return Err(RegistryError::ParentAlreadySet {
                registry: self.name().to_string(),
            });
        }
        *slot = Some(parent);
        Ok(())
    }

    /// Adds a definition and its aliases.
    ///
    /// A second definition under the same name is rejected unless overriding is enabled, and
    /// never accepted once the existing singleton has been built.
    pub fn register_definition(&self, definition: ComponentDefinition) -> RegistryResult<()> {
        let name = validate_name(definition.name())?.to_string();
        let allow_overriding = self.inner.config.allow_definition_overriding;
        let mut table = self.definitions_write();

        if table.aliases.contains_key(name.as_str()) {
            return Err(RegistryError::DuplicateRegistration { name });
        }
        let replacing = table.definitions.contains_key(name.as_str());
        if replacing && (!allow_overriding || self.inner.singletons.contains(&name)) {
            return Err(RegistryError::DuplicateRegistration { name });
        }
        let mut new_aliases = Vec::new();
        for alias in definition.aliases() {
            if table.check_alias(&name, alias, allow_overriding)? {
                new_aliases.push(alias.as_str());
            }
        }

        if replacing {
            log::debug!(
                "overriding definition of '{name}' in registry '{}'",
                self.name()
            );
        } else {
            table.order.push(Arc::from(name.as_str()));
        }
        for alias in new_aliases {
            table.insert_alias(&name, alias);
        }
        log::debug!(
            "registered {} component '{name}' of type {} in registry '{}'",
            definition.scope(),
            definition.declared_type(),
            self.name()
        );
        table.definitions.insert(Arc::from(name.as_str()), definition);
        Ok(())
    }

    pub fn register_alias(&self, name: &str, alias: &str) -> RegistryResult<()> {
        validate_name(name)?;
        let allow_overriding = self.inner.config.allow_definition_overriding;
        let mut table = self.definitions_write();
        let canonical = table.canonical(name).to_string();
        table.add_alias(&canonical, alias, allow_overriding)
    }

    /// Stores a pre-built shared instance under `name`.
    pub fn register_singleton(&self, name: &str, instance: DynInstance) -> RegistryResult<()> {
        self.inner.singletons.register(name, instance)
    }

    pub fn definition(&self, name: &str) -> Option<ComponentDefinition> {
        let table = self.definitions_read();
        let canonical = table.canonical(name);
        table.definitions.get(canonical).cloned()
    }

    /// Builds every eager singleton that does not exist yet, in registration order.
    pub fn instantiate_eager_singletons(&self) -> RegistryResult<()> {
        let eager: Vec<String> = {
            let table = self.definitions_read();
            table
                .order
                .iter()
                .filter_map(|name| table.definitions.get(name))
                .filter(|definition| {
                    definition.is_singleton()
                        && definition.instantiation_mode() == InstantiationMode::Eager
                })
                .map(|definition| definition.name().to_string())
                .collect()
        };
        for name in eager {
            if !self.inner.singletons.contains(&name) {
                self.local_instance(&name, &[])?;
            }
        }
        Ok(())
    }

    /// Resolves the single component matching the injection point's declared type.
    pub fn resolve_injection_point(&self, point: &InjectionPoint) -> RegistryResult<DynInstance> {
        self.get_instance_of_type(&point.declared_type())
            .map_err(|source| RegistryError::UnsatisfiedDependency {
                injection_point: point.clone(),
                source: Box::new(source),
            })
    }

    fn canonical_name(&self, name: &str) -> RegistryResult<String> {
        let stripped = transformed_name(name)?;
        Ok(self.definitions_read().canonical(stripped).to_string())
    }

    fn parent_lookup(&self) -> Option<Arc<dyn ComponentLookup>> {
        self.inner
            .parent
            .read()
            .unwrap_or_else(|poison| poison.into_inner())
            .clone()
    }

    fn is_local(&self, canonical: &str) -> bool {
        self.inner.singletons.contains(canonical)
            || self.definitions_read().definitions.contains_key(canonical)
    }

    /// Resolves a canonical local name, building the instance if needed. Never consults the
    /// parent.
    fn local_instance(&self, canonical: &str, args: &[Value]) -> RegistryResult<DynInstance> {
        if let Some(instance) = self.inner.singletons.get(canonical) {
            if !args.is_empty() {
                return Err(RegistryError::ScopeMismatch {
                    name: canonical.to_string(),
                });
            }
            return Ok(instance);
        }

        let definition = self
            .definitions_read()
            .definitions
            .get(canonical)
            .cloned()
            .ok_or_else(|| RegistryError::no_such_component(canonical))?;

        match definition.scope() {
            Scope::Singleton => self
                .inner
                .singletons
                .get_or_create(canonical, || self.build(&definition, args)),
            Scope::Prototype | Scope::Custom(_) => self.build(&definition, args),
        }
    }

    fn build(
        &self,
        definition: &ComponentDefinition,
        args: &[Value],
    ) -> RegistryResult<DynInstance> {
        let name = definition.name();
        log::trace!("building '{name}' in registry '{}'", self.name());
        let instance =
            (definition.builder)(self, args).map_err(|err| RegistryError::CreationFailed {
                name: name.to_string(),
                source: Box::new(err),
            })?;
        if !definition.declared_type().matches_instance(&instance) {
            let mismatch = RegistryError::TypeMismatch {
                name: name.to_string(),
                expected: definition.declared_type().to_string(),
                actual: TypeKey::of_instance(&instance).to_string(),
            };
            return Err(RegistryError::CreationFailed {
                name: name.to_string(),
                source: Box::new(mismatch),
            });
        }
        Ok(instance)
    }

    fn definitions_read(&self) -> RwLockReadGuard<'_, DefinitionTable> {
        self.inner
            .definitions
            .read()
            .unwrap_or_else(|poison| poison.into_inner())
    }

    fn definitions_write(&self) -> RwLockWriteGuard<'_, DefinitionTable> {
        self.inner
            .definitions
            .write()
            .unwrap_or_else(|poison| poison.into_inner())
    }
}

impl ComponentLookup for Registry {
    fn get_instance_with_args(&self, name: &str, args: &[Value]) -> RegistryResult<DynInstance> {
        let canonical = self.canonical_name(name)?;
        if self.is_local(&canonical) {
            return self.local_instance(&canonical, args);
        }
        match self.parent_lookup() {
            Some(parent) => {
                log::trace!(
                    "'{canonical}' not found in registry '{}'; asking parent",
                    self.name()
                );
                parent.get_instance_with_args(&canonical, args)
            }
            None => Err(RegistryError::no_such_component(&canonical)),
        }
    }

    fn get_instance_of_type_with_args(
        &self,
        ty: &TypeKey,
        args: &[Value],
    ) -> RegistryResult<DynInstance> {
        let candidates = ancestors::names_for_type_including_ancestors(self, ty, true, true);
        if candidates.is_empty() {
            // A parent that cannot enumerate was not searched above.
            if let Some(parent) = self.parent_lookup() {
                if parent.as_enumerable().is_none() {
                    return parent.get_instance_of_type_with_args(ty, args);
                }
            }
        }
        let name = ancestors::unique_name(ty, candidates)?;
        self.get_instance_with_args(&name, args)
    }

    fn contains(&self, name: &str) -> bool {
        let Ok(canonical) = self.canonical_name(name) else {
            return false;
        };
        if self.is_local(&canonical) {
            return true;
        }
        self.parent_lookup()
            .is_some_and(|parent| parent.contains(&canonical))
    }

    fn is_singleton(&self, name: &str) -> RegistryResult<bool> {
        let canonical = self.canonical_name(name)?;
        if let Some(definition) = self.definition(&canonical) {
            return Ok(definition.is_singleton());
        }
        if self.inner.singletons.contains(&canonical) {
            return Ok(true);
        }
        match self.parent_lookup() {
            Some(parent) => parent.is_singleton(&canonical),
            None => Err(RegistryError::no_such_component(&canonical)),
        }
    }

    fn is_prototype(&self, name: &str) -> RegistryResult<bool> {
        let canonical = self.canonical_name(name)?;
        if let Some(definition) = self.definition(&canonical) {
            return Ok(definition.is_prototype());
        }
        if self.inner.singletons.contains(&canonical) {
            return Ok(false);
        }
        match self.parent_lookup() {
            Some(parent) => parent.is_prototype(&canonical),
            None => Err(RegistryError::no_such_component(&canonical)),
        }
    }

    fn declared_type(&self, name: &str) -> RegistryResult<TypeKey> {
        let canonical = self.canonical_name(name)?;
        if let Some(definition) = self.definition(&canonical) {
            return Ok(definition.declared_type());
        }
        if let Some(instance) = self.inner.singletons.get(&canonical) {
            return Ok(TypeKey::of_instance(&instance));
        }
        match self.parent_lookup() {
            Some(parent) => parent.declared_type(&canonical),
            None => Err(RegistryError::no_such_component(&canonical)),
        }
    }

    /// Local aliases come first; a name defined in an ancestor also gets the ancestor's
    /// aliases, looked up by the canonical name.
    fn aliases(&self, name: &str) -> RegistryResult<Vec<String>> {
        let requested = transformed_name(name)?;
        let canonical = self.canonical_name(name)?;

        let mut result = Vec::new();
        if requested != canonical {
            result.push(canonical.clone());
        }
        result.extend(
            self.definitions_read()
                .aliases_of(&canonical)
                .into_iter()
                .filter(|alias| alias != requested),
        );
        if self.is_local(&canonical) {
            return Ok(result);
        }

        let Some(parent) = self.parent_lookup() else {
            return Err(RegistryError::no_such_component(&canonical));
        };
        for alias in parent.aliases(&canonical)? {
            if alias != requested && !result.contains(&alias) {
                result.push(alias);
            }
        }
        Ok(result)
    }

    fn as_hierarchical(&self) -> Option<&dyn HierarchicalLookup> {
        Some(self)
    }

    fn as_enumerable(&self) -> Option<&dyn EnumerableLookup> {
        Some(self)
    }
}

impl HierarchicalLookup for Registry {
    fn parent(&self) -> Option<Arc<dyn ComponentLookup>> {
        self.parent_lookup()
    }

    fn contains_local(&self, name: &str) -> bool {
        self.canonical_name(name)
            .map(|canonical| self.is_local(&canonical))
            .unwrap_or(false)
    }

    fn registry_id(&self) -> usize {
        Arc::as_ptr(&self.inner) as usize
    }
}

impl EnumerableLookup for Registry {
    fn contains_definition(&self, name: &str) -> bool {
        self.definitions_read().definitions.contains_key(name)
    }

    fn definition_count(&self) -> usize {
        self.definitions_read().order.len()
    }

    fn definition_names(&self) -> Vec<String> {
        self.definitions_read()
            .order
            .iter()
            .map(|name| name.to_string())
            .collect()
    }

    fn names_for_type(
        &self,
        ty: &TypeKey,
        include_non_singletons: bool,
        allow_eager_init: bool,
    ) -> Vec<String> {
        let table = self.definitions_read();
        let singletons = &self.inner.singletons;

        let mut result: Vec<String> = table
            .order
            .iter()
            .filter_map(|name| table.definitions.get(name))
            .filter(|definition| ty.is_assignable_from(&definition.declared_type()))
            .filter(|definition| include_non_singletons || definition.is_singleton())
            .filter(|definition| {
                allow_eager_init
                    || !definition.is_singleton()
                    || singletons.contains(definition.name())
            })
            .map(|definition| definition.name().to_string())
            .collect();

        for name in singletons.names() {
            if table.definitions.contains_key(name.as_str()) {
                continue;
            }
            if singletons
                .get(&name)
                .is_some_and(|instance| ty.matches_instance(&instance))
            {
                result.push(name);
            }
        }
        result
    }

    fn instances_of_type(
        &self,
        ty: &TypeKey,
        include_non_singletons: bool,
        allow_eager_init: bool,
    ) -> RegistryResult<NamedInstances> {
        let names = self.names_for_type(ty, include_non_singletons, allow_eager_init);
        let mut result = Vec::with_capacity(names.len());
        for name in names {
            match self.local_instance(&name, &[]) {
                Ok(instance) => result.push((name, instance)),
                Err(RegistryError::CurrentlyInCreation { .. }) => {
                    log::debug!("skipping '{name}' while it is still being built");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(result)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("name", &self.name())
            .field("definitions", &self.definition_count())
            .field("singletons", &self.inner.singletons.count())
            .field("has_parent", &self.parent_lookup().is_some())
            .finish()
    }
}
