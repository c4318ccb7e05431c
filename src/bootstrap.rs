//! Application assembly: shared services, module registration and lifecycle.

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use folio_authz::{Authorizer, CapabilityAuthorizer, PrincipalDirectory};
use folio_db::EntityStore;
use folio_http::links::RestUrl;
use folio_kernel::{settings::Settings, EntityTypeRegistry, InitCtx, ModuleRegistry};

use crate::content::FilterChain;
use crate::modules;

/// Services shared by every module.
#[derive(Clone)]
pub struct Services {
    pub entity_types: Arc<EntityTypeRegistry>,
    pub store: Arc<dyn EntityStore>,
    pub authorizer: Arc<dyn Authorizer>,
    pub principals: Arc<PrincipalDirectory>,
    pub content_filters: Arc<FilterChain>,
    pub urls: RestUrl,
}

impl Services {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let entity_types = Arc::new(EntityTypeRegistry::new());
        let store = folio_db::init(&settings.store, entity_types.clone());
        let principals = PrincipalDirectory::from_entries(&settings.auth.principals)
            .context("invalid auth.principals configuration")?;

        tracing::info!(principals = principals.len(), "principal directory loaded");

        Ok(Self {
            authorizer: Arc::new(CapabilityAuthorizer::new(store.clone())),
            entity_types,
            store,
            principals: Arc::new(principals),
            content_filters: Arc::new(FilterChain::standard()),
            urls: RestUrl::from_settings(&settings.server),
        })
    }
}

/// A fully initialized application.
pub struct App {
    pub settings: Settings,
    pub services: Services,
    pub registry: ModuleRegistry,
}

/// Register every module, declare their entity types, then init and start them.
pub async fn assemble(settings: Settings, services: Services) -> anyhow::Result<App> {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, &services);

    registry.register_entity_types(&services.entity_types)?;

    let ctx = InitCtx {
        settings: &settings,
        entity_types: &services.entity_types,
    };
    registry.init_modules(&ctx).await?;
    registry.start_modules(&ctx).await?;

    tracing::info!(modules = registry.len(), "application assembled");
    Ok(App {
        settings,
        services,
        registry,
    })
}

impl App {
    pub fn router(&self) -> Router {
        folio_http::build_router(&self.registry, &self.settings)
    }

    /// Serve until shutdown, then stop modules in reverse order.
    pub async fn serve(self) -> anyhow::Result<()> {
        let served = folio_http::start_server(&self.registry, &self.settings).await;
        self.registry.stop_modules().await?;
        served
    }
}
