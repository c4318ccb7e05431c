//! Entity type declarations shared by modules and stores.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use thiserror::Error;

/// Longest accepted entity type name.
pub const MAX_NAME_LEN: usize = 20;

/// Storage-level features an entity type opts into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Supports {
    Title,
    Editor,
    Author,
    Thumbnail,
    Revisions,
}

/// Declaration of a named category of stored documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityType {
    pub name: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    pub supports: Vec<Supports>,
    pub public: bool,
    pub publicly_queryable: bool,
    pub exclude_from_search: bool,
    pub hierarchical: bool,
    pub has_archive: bool,
    pub show_in_rest: bool,
    pub rest_base: Option<&'static str>,
}

impl EntityType {
    /// A private, non-hierarchical type supporting title and editor.
    pub fn new(name: &'static str, label: &'static str) -> Self {
        Self {
            name,
            label,
            description: "",
            supports: vec![Supports::Title, Supports::Editor],
            public: false,
            publicly_queryable: false,
            exclude_from_search: true,
            hierarchical: false,
            has_archive: false,
            show_in_rest: false,
            rest_base: None,
        }
    }

    pub fn description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    pub fn supports(mut self, features: &[Supports]) -> Self {
        let mut features = features.to_vec();
        features.sort();
        features.dedup();
        self.supports = features;
        self
    }

    /// Marks the type public, which also makes it queryable and searchable.
    pub fn public(mut self) -> Self {
        self.public = true;
        self.publicly_queryable = true;
        self.exclude_from_search = false;
        self
    }

    pub fn has_archive(mut self) -> Self {
        self.has_archive = true;
        self
    }

    pub fn show_in_rest(mut self, rest_base: &'static str) -> Self {
        self.show_in_rest = true;
        self.rest_base = Some(rest_base);
        self
    }

    pub fn supports_feature(&self, feature: Supports) -> bool {
        self.supports.contains(&feature)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("entity type name must not be empty")]
    EmptyName,

    #[error("entity type name '{0}' exceeds {MAX_NAME_LEN} characters")]
    NameTooLong(String),

    #[error("entity type '{0}' is already registered with a different declaration")]
    Conflict(String),
}

/// Process-wide set of declared entity types.
#[derive(Debug, Default)]
pub struct EntityTypeRegistry {
    types: RwLock<BTreeMap<&'static str, Arc<EntityType>>>,
}

impl EntityTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an entity type. Registering an identical declaration twice is a no-op.
    pub fn register(&self, entity_type: EntityType) -> Result<Arc<EntityType>, RegistryError> {
        if entity_type.name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if entity_type.name.len() > MAX_NAME_LEN {
            return Err(RegistryError::NameTooLong(entity_type.name.to_string()));
        }

        let mut types = self.types.write();
        if let Some(existing) = types.get(entity_type.name) {
            if **existing == entity_type {
                return Ok(existing.clone());
            }
            return Err(RegistryError::Conflict(entity_type.name.to_string()));
        }

        tracing::debug!(entity_type = entity_type.name, "registering entity type");
        let declared = Arc::new(entity_type);
        types.insert(declared.name, declared.clone());
        Ok(declared)
    }

    pub fn get(&self, name: &str) -> Option<Arc<EntityType>> {
        self.types.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.read().contains_key(name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.types.read().keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.types.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.read().is_empty()
    }
}
