use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::registry::constants::DEFAULT_REGISTRY_NAME;
use crate::registry::types::{RegistryError, RegistryResult};

/// User-facing registry options; every field is optional.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegistrySettings {
    pub name: Option<String>,
    pub allow_definition_overriding: Option<bool>,
}

impl RegistrySettings {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Reads settings from a JSON object such as `{"name": "web", "allowDefinitionOverriding": true}`.
    pub fn from_json(value: Value) -> RegistryResult<Self> {
        serde_json::from_value(value).map_err(|err| {
            RegistryError::invalid_argument(format!("invalid registry settings: {err}"))
        })
    }

    pub fn with_definition_overriding(mut self, allow: bool) -> Self {
        self.allow_definition_overriding = Some(allow);
        self
    }

    pub(crate) fn into_config(self) -> RegistryResult<RegistryConfig> {
        let name = match self.name {
            Some(name) if name.trim().is_empty() => {
                return Err(RegistryError::invalid_argument(
                    "registry name must not be empty",
                ))
            }
            Some(name) => name,
            None => DEFAULT_REGISTRY_NAME.to_string(),
        };
        Ok(RegistryConfig {
            name: Arc::from(name),
            allow_definition_overriding: self.allow_definition_overriding.unwrap_or(false),
        })
    }
}

/// Resolved configuration a registry runs with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistryConfig {
    pub name: Arc<str>,
    pub allow_definition_overriding: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            name: Arc::from(DEFAULT_REGISTRY_NAME),
            allow_definition_overriding: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_fill_missing_fields() {
        let config = RegistrySettings::default().into_config().unwrap();
        assert_eq!(config, RegistryConfig::default());
        assert_eq!(config.name.as_ref(), "[DEFAULT]");
    }

    #[test]
    fn settings_load_from_json() {
        let settings =
            RegistrySettings::from_json(json!({"name": "web", "allowDefinitionOverriding": true}))
                .unwrap();
        let config = settings.into_config().unwrap();
        assert_eq!(config.name.as_ref(), "web");
        assert!(config.allow_definition_overriding);
    }

    #[test]
    fn malformed_settings_are_rejected() {
        assert!(matches!(
            RegistrySettings::from_json(json!({"name": 12})),
            Err(RegistryError::InvalidArgument { .. })
        ));
        assert!(matches!(
            RegistrySettings::named("  ").into_config(),
            Err(RegistryError::InvalidArgument { .. })
        ));
    }
}
