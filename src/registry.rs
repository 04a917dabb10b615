use std::collections::BTreeSet;

/// Links an environment variable to the config property it populates
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FieldMapping {
    pub env_name: String,
    pub property_name: String,
}

/// Per-schema record of env name mappings and optional properties
///
/// Filled once while a schema is being declared and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct MappingRegistry {
    mappings: Vec<FieldMapping>,
    optional: BTreeSet<String>,
}

impl MappingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a mapping entry. Registering the same property twice keeps both entries.
    pub fn register(&mut self, env_name: impl Into<String>, property_name: impl Into<String>) {
        self.mappings.push(FieldMapping {
            env_name: env_name.into(),
            property_name: property_name.into(),
        });
    }

    /// All mapping entries in registration order
    pub fn lookup(&self) -> &[FieldMapping] {
        &self.mappings
    }

    /// Env name of a property, first registration wins
    pub fn env_name_of(&self, property_name: &str) -> Option<&str> {
        self.mappings
            .iter()
            .find(|m| m.property_name == property_name)
            .map(|m| m.env_name.as_str())
    }

    pub fn mark_optional(&mut self, property_name: impl Into<String>) {
        self.optional.insert(property_name.into());
    }

    pub fn is_optional(&self, property_name: &str) -> bool {
        self.optional.contains(property_name)
    }
}
