//! Pure helpers for component names: factory references (`&name`) and generated names
//! (`name#1`).

use crate::registry::constants::{FACTORY_REFERENCE_PREFIX, GENERATED_NAME_SEPARATOR};
use crate::registry::types::{RegistryError, RegistryResult};

/// Rejects the empty name with [`RegistryError::InvalidArgument`].
pub fn validate_name(name: &str) -> RegistryResult<&str> {
    if name.is_empty() {
        return Err(RegistryError::invalid_argument("component name must not be empty"));
    }
    Ok(name)
}

/// Returns true when `name` asks for the factory of a component.
pub fn is_factory_reference(name: &str) -> bool {
    name.starts_with(FACTORY_REFERENCE_PREFIX)
}

/// Strips every leading factory prefix: `"&&cache"` becomes `"cache"`.
pub fn transformed_name(name: &str) -> RegistryResult<&str> {
    validate_name(name)?;
    let mut stripped = name;
    while let Some(rest) = stripped.strip_prefix(FACTORY_REFERENCE_PREFIX) {
        stripped = rest;
    }
    if stripped.is_empty() {
        return Err(RegistryError::invalid_argument(format!(
            "'{name}' does not contain a component name after the factory prefix"
        )));
    }
    Ok(stripped)
}

/// Returns true when `name` was synthesized for uniqueness.
pub fn is_generated_name(name: &str) -> bool {
    name.contains(GENERATED_NAME_SEPARATOR)
}

/// The part of `name` before the first generated-name separator.
pub fn original_name(name: &str) -> RegistryResult<&str> {
    validate_name(name)?;
    Ok(match name.find(GENERATED_NAME_SEPARATOR) {
        Some(index) => &name[..index],
        None => name,
    })
}
