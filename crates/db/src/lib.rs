//! Entity store interface and the in-memory document store backing it.

use std::sync::Arc;

use folio_kernel::settings::{StoreBackend, StoreSettings};
use folio_kernel::EntityTypeRegistry;

pub mod entity;
pub mod memory;
pub mod query;
pub mod slug;
pub mod store;

pub use entity::{Entity, EntityId, EntityPatch, NewEntity, Status, UserId};
pub use memory::MemoryStore;
pub use query::{EntityQuery, Order, OrderBy, Page};
pub use store::{EntityStore, StoreError};

/// Build the configured entity store.
pub fn init(settings: &StoreSettings, types: Arc<EntityTypeRegistry>) -> Arc<dyn EntityStore> {
    match settings.backend {
        StoreBackend::Memory => {
            tracing::info!(
                target: "folio-db",
                trash_enabled = settings.trash_enabled,
                "using in-memory entity store"
            );
            Arc::new(MemoryStore::new(types).with_trash(settings.trash_enabled))
        }
    }
}
