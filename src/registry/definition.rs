use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::registry::container::Registry;
use crate::registry::types::{
    ComponentBuilder, DynInstance, InstantiationMode, RegistryResult, Scope, TypeKey,
};

/// Everything the registry knows about one named component before it is built.
#[derive(Clone)]
pub struct ComponentDefinition {
    name: Arc<str>,
    declared_type: TypeKey,
    pub(crate) builder: ComponentBuilder,
    scope: Scope,
    instantiation_mode: InstantiationMode,
    aliases: Vec<String>,
}

impl ComponentDefinition {
    pub fn new(name: impl Into<String>, declared_type: TypeKey, builder: ComponentBuilder) -> Self {
        Self {
            name: Arc::from(name.into()),
            declared_type,
            builder,
            scope: Scope::Singleton,
            instantiation_mode: InstantiationMode::Lazy,
            aliases: Vec::new(),
        }
    }

    /// Typed convenience: the declared type is `T` and the builder's value is boxed for storage.
    pub fn of<T, F>(name: impl Into<String>, build: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&Registry, &[Value]) -> RegistryResult<T> + Send + Sync + 'static,
    {
        let builder: ComponentBuilder = Arc::new(move |registry: &Registry, args: &[Value]| {
            build(registry, args).map(|value| Arc::new(value) as DynInstance)
        });
        Self::new(name, TypeKey::of::<T>(), builder)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declared_type(&self) -> TypeKey {
        self.declared_type
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn instantiation_mode(&self) -> InstantiationMode {
        self.instantiation_mode
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn is_singleton(&self) -> bool {
        self.scope.is_singleton()
    }

    pub fn is_prototype(&self) -> bool {
        self.scope.is_prototype()
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_instantiation_mode(mut self, mode: InstantiationMode) -> Self {
        self.instantiation_mode = mode;
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases.extend(aliases.into_iter().map(Into::into));
        self
    }
}

impl fmt::Debug for ComponentDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDefinition")
            .field("name", &self.name)
            .field("declared_type", &self.declared_type)
            .field("scope", &self.scope)
            .field("instantiation_mode", &self.instantiation_mode)
            .field("aliases", &self.aliases)
            .finish_non_exhaustive()
    }
}
