//! Folio kernel: settings, module lifecycle, and the entity-type registry.

pub mod entity_type;
pub mod module;
pub mod registry;
pub mod settings;

pub use entity_type::{EntityType, EntityTypeRegistry, RegistryError, Supports};
pub use module::{InitCtx, Module};
pub use registry::ModuleRegistry;
