use parking_lot::ReentrantMutex;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::registry::names::validate_name;
use crate::registry::types::{DynInstance, RegistryError, RegistryResult};

/// Store of already-built shared instances, keyed by component name.
///
/// Reads go through an `RwLock` and never wait for a build in progress. Every check-then-create
/// sequence runs under one reentrant creation lock per store, so interdependent singletons are
/// built one at a time while a builder can still resolve its own dependencies on the same
/// thread. Once stored, an instance is never replaced.
pub struct SingletonRegistry {
    table: RwLock<SingletonTable>,
    creation: ReentrantMutex<()>,
    in_creation: Mutex<HashSet<Arc<str>>>,
}

#[derive(Default)]
struct SingletonTable {
    order: Vec<Arc<str>>,
    instances: HashMap<Arc<str>, DynInstance>,
}

impl SingletonTable {
    /// Stores `instance` unless the name is taken. The same `Arc` again is accepted and the
    /// stored instance is returned; anything else under a taken name is a duplicate.
    fn insert(&mut self, name: &str, instance: DynInstance) -> RegistryResult<DynInstance> {
        if let Some(existing) = self.instances.get(name) {
            if Arc::ptr_eq(existing, &instance) {
                return Ok(existing.clone());
            }
            return Err(RegistryError::DuplicateRegistration {
                name: name.to_string(),
            });
        }
        let key: Arc<str> = Arc::from(name);
        self.order.push(key.clone());
        self.instances.insert(key, instance.clone());
        Ok(instance)
    }
}

impl Default for SingletonRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SingletonRegistry {
    pub fn new() -> Self {
        Self {
            table: RwLock::new(SingletonTable::default()),
            creation: ReentrantMutex::new(()),
            in_creation: Mutex::new(HashSet::new()),
        }
    }

    /// Stores a pre-built instance.
    ///
    /// Registering the very same instance (pointer identity) again is a no-op; any other
    /// instance under an occupied name fails with [`RegistryError::DuplicateRegistration`].
    pub fn register(&self, name: &str, instance: DynInstance) -> RegistryResult<()> {
        validate_name(name)?;
        let _creation = self.creation.lock();
        self.table_write().insert(name, instance)?;
        log::debug!("registered singleton '{name}'");
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<DynInstance> {
        self.table_read().instances.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.table_read().instances.contains_key(name)
    }

    /// Snapshot of the stored names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.table_read()
            .order
            .iter()
            .map(|name| name.to_string())
            .collect()
    }

    pub fn count(&self) -> usize {
        self.table_read().order.len()
    }

    pub fn is_currently_in_creation(&self, name: &str) -> bool {
        self.in_creation_guard().contains(name)
    }

    /// Returns the instance stored under `name`, building it with `create` if absent.
    ///
    /// The whole sequence holds the creation lock, so `create` runs at most once per name even
    /// when many threads race on first access. A nested request for a name whose build is still
    /// running on this thread fails with [`RegistryError::CurrentlyInCreation`].
    ///
    /// If `create` registers `name` itself, that instance is kept and a different build result
    /// fails with [`RegistryError::DuplicateRegistration`].
    pub fn get_or_create<F>(&self, name: &str, create: F) -> RegistryResult<DynInstance>
    where
        F: FnOnce() -> RegistryResult<DynInstance>,
    {
        validate_name(name)?;
        if let Some(existing) = self.get(name) {
            return Ok(existing);
        }

        let _creation = self.creation.lock();
        if let Some(existing) = self.get(name) {
            return Ok(existing);
        }

        let marker = CreationMarker::enter(self, name)?;
        log::debug!("creating shared instance of singleton '{name}'");
        let built = create();
        drop(marker);

        // the builder may have registered this name itself; that entry stays
        self.table_write().insert(name, built?)
    }

    fn table_read(&self) -> RwLockReadGuard<'_, SingletonTable> {
        self.table.read().unwrap_or_else(|poison| poison.into_inner())
    }

    fn table_write(&self) -> RwLockWriteGuard<'_, SingletonTable> {
        self.table.write().unwrap_or_else(|poison| poison.into_inner())
    }

    fn in_creation_guard(&self) -> MutexGuard<'_, HashSet<Arc<str>>> {
        self.in_creation
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
    }
}

/// Keeps a name in the in-creation set until dropped, including on unwind out of a builder.
struct CreationMarker<'a> {
    registry: &'a SingletonRegistry,
    name: Arc<str>,
}

impl<'a> CreationMarker<'a> {
    fn enter(registry: &'a SingletonRegistry, name: &str) -> RegistryResult<Self> {
        let name: Arc<str> = Arc::from(name);
        if !registry.in_creation_guard().insert(name.clone()) {
            return Err(RegistryError::CurrentlyInCreation {
                name: name.to_string(),
            });
        }
        Ok(Self { registry, name })
    }
}

impl Drop for CreationMarker<'_> {
    fn drop(&mut self) {
        self.registry.in_creation_guard().remove(&self.name);
    }
}
