pub mod controller;
pub mod entity_type;
pub mod models;
pub mod routes;
pub mod schema;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use folio_kernel::{EntityType, InitCtx, Module};

use crate::bootstrap::Services;
use controller::BooksController;
use routes::BooksState;

/// Route namespace of the book API.
pub const NAMESPACE: &str = "hussainas/v1";
/// Collection segment under [`NAMESPACE`].
pub const REST_BASE: &str = "books";
/// Route of the user resource that author links point at.
pub const USERS_ROUTE: &str = "wp/v2/users";

/// Book resource module: declares the entity type and serves `/books`.
pub struct BooksModule {
    state: BooksState,
}

impl BooksModule {
    pub fn new(services: &Services) -> Self {
        let controller = BooksController::new(
            services.store.clone(),
            services.authorizer.clone(),
            services.content_filters.clone(),
            services.urls.clone(),
        );
        Self {
            state: BooksState {
                controller: Arc::new(controller),
                principals: services.principals.clone(),
            },
        }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    fn namespace(&self) -> &'static str {
        NAMESPACE
    }

    fn entity_types(&self) -> Vec<EntityType> {
        vec![entity_type::book()]
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let book = entity_type::register(ctx.entity_types)?;
        tracing::info!(
            module = self.name(),
            entity_type = book.name,
            environment = ?ctx.settings.environment,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(schema::openapi_fragment())
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), namespace = NAMESPACE, "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Create a new instance of the books module
pub fn create_module(services: &Services) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(services))
}
