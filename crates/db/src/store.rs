use async_trait::async_trait;
use thiserror::Error;

use crate::entity::{Entity, EntityId, EntityPatch, NewEntity};
use crate::query::{EntityQuery, Page};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("entity {0} does not exist")]
    NotFound(EntityId),

    #[error("entity type '{0}' is not registered")]
    UnknownType(String),

    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("store backend failure: {0}")]
    Backend(String),
}

/// Typed document storage consumed by resource controllers.
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn find(&self, id: EntityId) -> Result<Option<Entity>, StoreError>;

    async fn query(&self, query: &EntityQuery) -> Result<Page<Entity>, StoreError>;

    async fn insert(&self, entity: NewEntity) -> Result<EntityId, StoreError>;

    async fn update(&self, id: EntityId, patch: EntityPatch) -> Result<EntityId, StoreError>;

    /// Trash the entity, or remove it permanently when `force` is set.
    /// Returns the entity as it was left by the operation.
    async fn delete(&self, id: EntityId, force: bool) -> Result<Entity, StoreError>;
}
