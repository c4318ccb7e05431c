use async_trait::async_trait;
use axum::Router;

use crate::entity_type::{EntityType, EntityTypeRegistry};

/// Context provided to modules during initialization
pub struct InitCtx<'a> {
    pub settings: &'a crate::settings::Settings,
    pub entity_types: &'a EntityTypeRegistry,
}

/// Core module trait that all Folio modules must implement
#[async_trait]
pub trait Module: Sync + Send {
    /// Unique name for this module
    fn name(&self) -> &'static str;

    /// Route namespace, e.g. `vendor/v1`.
    /// Routes will be mounted under `/{api_root}/{namespace}`
    fn namespace(&self) -> &'static str {
        self.name()
    }

    /// Entity types this module declares.
    /// Collected into the entity-type registry before `init` runs
    fn entity_types(&self) -> Vec<EntityType> {
        vec![]
    }

    /// Initialize the module with the provided context
    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Return the Axum router for this module's routes
    fn routes(&self) -> Router {
        Router::new()
    }

    /// Return OpenAPI specification fragment for this module as JSON
    /// Paths are relative to the module namespace
    fn openapi(&self) -> Option<serde_json::Value> {
        None
    }

    /// Called once every module has been initialized
    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called during application shutdown
    async fn stop(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
