use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use folio_app::modules::books::schema;
use folio_kernel::settings::Settings;
use serde_json::Value;

const METHODS: [&str; 5] = ["get", "post", "put", "patch", "delete"];

#[derive(Parser)]
#[command(name = "folio", version, about = "Folio book resource server")]
struct Cli {
    /// Configuration directory holding `base.toml` and `{env}.toml`
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    /// Environment overlay to load (local, staging, production)
    #[arg(long, global = true, default_value = "local")]
    env: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP server
    Serve,
    /// Print the book item schema as JSON
    Schema,
    /// List the routes the server would mount
    Routes,
    /// Print the effective configuration, without secrets
    Config,
}

impl Cli {
    fn settings(&self) -> anyhow::Result<Settings> {
        match &self.config_dir {
            Some(dir) => Settings::load_from(dir, &self.env),
            None => Settings::load(),
        }
        .with_context(|| "failed to load Folio settings")
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve => folio_app::run(cli.settings()?).await,
        Command::Schema => {
            println!("{}", serde_json::to_string_pretty(&schema::item_schema())?);
            Ok(())
        }
        Command::Routes => print_routes(cli.settings()?).await,
        Command::Config => {
            print_config(&cli.settings()?);
            Ok(())
        }
    }
}

async fn print_routes(settings: Settings) -> anyhow::Result<()> {
    let api_root = settings.server.api_root.clone();
    let app = folio_app::build(settings).await?;
    let document = folio_http::openapi::build_document(&app.registry, &api_root);

    if let Some(paths) = document.get("paths").and_then(Value::as_object) {
        for (path, item) in paths {
            for method in METHODS {
                if item.get(method).is_some() {
                    println!("{:<7} {}", method.to_uppercase(), path);
                }
            }
        }
    }

    app.registry.stop_modules().await
}

fn print_config(settings: &Settings) {
    println!("environment    = {:?}", settings.environment);
    println!("bind_address   = {}", settings.server.bind_address());
    println!("public_url     = {}", settings.server.public_url);
    println!("api_root       = {}", settings.server.api_root);
    println!("timeout_ms     = {}", settings.server.request_timeout_ms);
    println!("store.backend  = {:?}", settings.store.backend);
    println!("store.trash    = {}", settings.store.trash_enabled);
    println!("log_format     = {:?}", settings.telemetry.log_format);
    println!("principals     = {}", settings.auth.principals.len());
}
