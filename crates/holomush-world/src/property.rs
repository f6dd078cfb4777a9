//! Properties that may be read or written on world entities by name.

use std::collections::HashMap;

/// Maps entity types to the property names valid for them.
#[derive(Debug, Clone)]
pub struct PropertyRegistry {
    properties: HashMap<&'static str, Vec<&'static str>>,
}

impl PropertyRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            properties: HashMap::new(),
        }
    }

    /// Register a property for an entity type.
    pub fn register(&mut self, entity_type: &'static str, property: &'static str) {
        let props = self.properties.entry(entity_type).or_default();
        if !props.contains(&property) {
            props.push(property);
        }
    }

    /// Returns true if `property` may be used on `entity_type`.
    pub fn valid_for(&self, entity_type: &str, property: &str) -> bool {
        self.properties
            .get(entity_type)
            .is_some_and(|props| props.contains(&property))
    }

    /// Returns true if any property is registered for `entity_type`.
    pub fn has_entity_type(&self, entity_type: &str) -> bool {
        self.properties.contains_key(entity_type)
    }
}

impl Default for PropertyRegistry {
    /// Name and description on locations and objects.
    fn default() -> Self {
        let mut registry = Self::new();
        for entity_type in ["location", "object"] {
            registry.register(entity_type, "name");
            registry.register(entity_type, "description");
        }
        registry
    }
}
