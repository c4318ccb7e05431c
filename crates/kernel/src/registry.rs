use anyhow::Context;
use std::sync::Arc;

use crate::entity_type::EntityTypeRegistry;
use crate::module::{InitCtx, Module};

/// Module registry driving the module lifecycle in registration order
pub struct ModuleRegistry {
    modules: Vec<Arc<dyn Module>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self {
            modules: Vec::new(),
        }
    }

    /// Register a module. A module whose name is already taken is ignored.
    pub fn register(&mut self, module: Arc<dyn Module>) {
        if self.get_module(module.name()).is_some() {
            tracing::warn!(module = module.name(), "module already registered");
            return;
        }
        self.modules.push(module);
    }

    pub fn modules(&self) -> &[Arc<dyn Module>] {
        &self.modules
    }

    pub fn get_module(&self, name: &str) -> Option<&Arc<dyn Module>> {
        self.modules.iter().find(|module| module.name() == name)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Declare every module's entity types. Returns the number of declarations.
    pub fn register_entity_types(&self, types: &EntityTypeRegistry) -> anyhow::Result<usize> {
        let mut declared = 0;
        for module in &self.modules {
            for entity_type in module.entity_types() {
                let name = entity_type.name;
                types.register(entity_type).with_context(|| {
                    format!(
                        "module '{}' failed to register entity type '{}'",
                        module.name(),
                        name
                    )
                })?;
                declared += 1;
            }
        }

        tracing::info!(declared, total = types.len(), "entity types registered");
        Ok(declared)
    }

    pub async fn init_modules(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!("initializing {} modules", self.modules.len());

        for module in &self.modules {
            tracing::info!(module = module.name(), "initializing module");

            module
                .init(ctx)
                .await
                .with_context(|| format!("failed to initialize module '{}'", module.name()))?;
        }

        Ok(())
    }

    pub async fn start_modules(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        for module in &self.modules {
            tracing::info!(module = module.name(), "starting module");

            module
                .start(ctx)
                .await
                .with_context(|| format!("failed to start module '{}'", module.name()))?;
        }

        Ok(())
    }

    /// Stop modules in reverse registration order
    pub async fn stop_modules(&self) -> anyhow::Result<()> {
        for module in self.modules.iter().rev() {
            tracing::info!(module = module.name(), "stopping module");

            module
                .stop()
                .await
                .with_context(|| format!("failed to stop module '{}'", module.name()))?;
        }

        Ok(())
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}
