/// Prefix marking a lookup for the factory that produces a component rather than the component.
pub const FACTORY_REFERENCE_PREFIX: &str = "&";

/// Separator appended (with a counter) to synthesized names, e.g. `"cache#1"`.
pub const GENERATED_NAME_SEPARATOR: &str = "#";

/// Name given to a registry created without an explicit name.
pub const DEFAULT_REGISTRY_NAME: &str = "[DEFAULT]";

pub const SCOPE_SINGLETON: &str = "singleton";
pub const SCOPE_PROTOTYPE: &str = "prototype";
