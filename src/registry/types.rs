use serde_json::Value;
use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::Arc;

use crate::injection::InjectionPoint;
use crate::registry::constants::{SCOPE_PROTOTYPE, SCOPE_SINGLETON};
use crate::registry::container::Registry;

pub type DynInstance = Arc<dyn Any + Send + Sync>;

pub type RegistryResult<T> = Result<T, RegistryError>;

/// Builds a fresh instance for a component; receives the registry the lookup started from and
/// any explicit construction arguments.
pub type ComponentBuilder =
    Arc<dyn Fn(&Registry, &[Value]) -> RegistryResult<DynInstance> + Send + Sync>;

/// Runtime identity of a component type.
///
/// Matching is exact: a value is assignable to a key only when it was stored as that very type.
/// [`TypeKey::any`] is the single wildcard and matches every component.
#[derive(Clone, Copy, Debug)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn any() -> Self {
        Self::of::<dyn Any>()
    }

    /// Key of the concrete value behind a type-erased instance. The name is not recoverable
    /// from `dyn Any`, so it is reported as `"<erased>"`.
    pub fn of_instance(instance: &DynInstance) -> Self {
        Self {
            id: instance.as_ref().type_id(),
            name: "<erased>",
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_any(&self) -> bool {
        self.id == TypeId::of::<dyn Any>()
    }

    /// True when a component declared as `other` satisfies a request for `self`.
    pub fn is_assignable_from(&self, other: &TypeKey) -> bool {
        self.is_any() || self.id == other.id
    }

    pub fn matches_instance(&self, instance: &DynInstance) -> bool {
        self.is_any() || instance.as_ref().type_id() == self.id
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Scope {
    #[default]
    Singleton,
    Prototype,
    Custom(String),
}

impl Scope {
    pub fn is_singleton(&self) -> bool {
        matches!(self, Scope::Singleton)
    }

    pub fn is_prototype(&self) -> bool {
        matches!(self, Scope::Prototype)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Scope::Singleton => SCOPE_SINGLETON,
            Scope::Prototype => SCOPE_PROTOTYPE,
            Scope::Custom(name) => name,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" => Err(RegistryError::InvalidArgument {
                message: "scope name must not be empty".to_string(),
            }),
            SCOPE_SINGLETON => Ok(Scope::Singleton),
            SCOPE_PROTOTYPE => Ok(Scope::Prototype),
            other => Ok(Scope::Custom(other.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InstantiationMode {
    #[default]
    Lazy,
    Eager,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RegistryError {
    InvalidArgument { message: String },
    NoSuchComponent { name: String },
    NoSuchComponentOfType { type_name: String },
    AmbiguousComponent { type_name: String, candidates: Vec<String> },
    TypeMismatch { name: String, expected: String, actual: String },
    ScopeMismatch { name: String },
    DuplicateRegistration { name: String },
    CurrentlyInCreation { name: String },
    CreationFailed { name: String, source: Box<RegistryError> },
    ParentAlreadySet { registry: String },
    UnsatisfiedDependency { injection_point: InjectionPoint, source: Box<RegistryError> },
}

impl RegistryError {
    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        RegistryError::InvalidArgument {
            message: message.into(),
        }
    }

    pub(crate) fn no_such_component(name: &str) -> Self {
        RegistryError::NoSuchComponent {
            name: name.to_string(),
        }
    }

    /// True for both "no component named X" and "no component of type T".
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            RegistryError::NoSuchComponent { .. } | RegistryError::NoSuchComponentOfType { .. }
        )
    }
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::InvalidArgument { message } => write!(f, "Invalid argument: {message}"),
            RegistryError::NoSuchComponent { name } => {
                write!(f, "No component named '{name}' is available")
            }
            RegistryError::NoSuchComponentOfType { type_name } => {
                write!(f, "No component of type '{type_name}' is available")
            }
            RegistryError::AmbiguousComponent {
                type_name,
                candidates,
            } => write!(
                f,
                "Expected a single component of type '{type_name}' but found {}: {}",
                candidates.len(),
                candidates.join(", ")
            ),
            RegistryError::TypeMismatch {
                name,
                expected,
                actual,
            } => write!(
                f,
                "Component '{name}' is expected to be of type '{expected}' but was '{actual}'"
            ),
            RegistryError::ScopeMismatch { name } => write!(
                f,
                "Construction arguments cannot be applied to existing singleton '{name}'"
            ),
            RegistryError::DuplicateRegistration { name } => {
                write!(f, "Component '{name}' has already been registered")
            }
            RegistryError::CurrentlyInCreation { name } => write!(
                f,
                "Component '{name}' is currently in creation: is there an unresolvable circular reference?"
            ),
            RegistryError::CreationFailed { name, source } => {
                write!(f, "Component '{name}' failed to build: {source}")
            }
            RegistryError::ParentAlreadySet { registry } => {
                write!(f, "Registry '{registry}' already has a parent")
            }
            RegistryError::UnsatisfiedDependency {
                injection_point,
                source,
            } => write!(f, "Unsatisfied dependency expressed through {injection_point}: {source}"),
        }
    }
}

impl std::error::Error for RegistryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RegistryError::CreationFailed { source, .. }
            | RegistryError::UnsatisfiedDependency { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}
