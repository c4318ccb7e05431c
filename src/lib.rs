//! Folio application library
//!
//! Book resource module, content filters and input sanitizers, plus the
//! assembly code that wires them onto the Folio kernel.

pub mod bootstrap;
pub mod content;
pub mod modules;
pub mod utils;

pub use bootstrap::{assemble, App, Services};

use folio_kernel::settings::Settings;

/// Build shared services from `settings` and assemble the application.
pub async fn build(settings: Settings) -> anyhow::Result<App> {
    let services = Services::from_settings(&settings)?;
    assemble(settings, services).await
}

/// Initialize telemetry from `settings` and serve until shutdown.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    folio_telemetry::init(&settings.telemetry)?;

    tracing::info!(
        env = ?settings.environment,
        address = %settings.server.bind_address(),
        "folio-app bootstrap starting"
    );

    let app = build(settings).await?;
    app.serve().await
}
