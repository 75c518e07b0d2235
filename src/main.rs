mod cli;

use crate::cli::app::App;
use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use crudgrid::{ClientConfig, CollectionServer, EntityConfig, EntityRecord};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "crudgrid", version, about = "Schema-driven table editor for REST collections")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Open the table editor
    Edit {
        /// Entity config (JSON); the demo users entity when omitted
        #[arg(long)]
        config: Option<PathBuf>,
        /// Backend base URL; falls back to CRUDGRID_BASE_URL
        #[arg(long)]
        base_url: Option<String>,
        /// Edit an in-process collection instead of a remote one
        #[arg(long)]
        offline: bool,
        /// JSON array of records to start from (offline only)
        #[arg(long)]
        seed: Option<PathBuf>,
    },
    /// Run the in-memory REST backend
    Serve {
        #[arg(long, default_value = "127.0.0.1:3000")]
        addr: String,
        /// Entity config (JSON); the demo users entity when omitted
        #[arg(long)]
        config: Option<PathBuf>,
        /// JSON array of records to start from
        #[arg(long)]
        seed: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    match Cli::parse().command {
        Command::Edit {
            config,
            base_url,
            offline,
            seed,
        } => edit(config, base_url, offline, seed).await,
        Command::Serve { addr, config, seed } => serve(&addr, config, seed).await,
    }
}

async fn edit(
    config: Option<PathBuf>,
    base_url: Option<String>,
    offline: bool,
    seed: Option<PathBuf>,
) -> Result<()> {
    let entity = Arc::new(load_entity(config.as_deref())?);
    let mut client = ClientConfig::from_env();
    if let Some(url) = base_url {
        client = client.base_url(&url);
    }
    if let Err(msg) = client.validate() {
        bail!("invalid client configuration: {}", msg);
    }

    // The TUI owns the terminal, so editor sessions do not install a subscriber.
    if offline {
        let records = seed_records(seed.as_deref(), &entity)?;
        let table = crudgrid::mount_memory(entity, &client, records).await;
        run_editor(App::new(table, client.confirm_timeout)).await
    } else {
        if seed.is_some() {
            bail!("--seed only applies to --offline sessions");
        }
        let table = crudgrid::mount_http(entity, &client, None).await?;
        run_editor(App::new(table, client.confirm_timeout)).await
    }
}

async fn run_editor<T: crudgrid::CollectionTransport>(mut app: App<'_, T>) -> Result<()> {
    app.run()
        .await
        .map_err(|e| anyhow::anyhow!("terminal error: {}", e))
}

async fn serve(addr: &str, config: Option<PathBuf>, seed: Option<PathBuf>) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let entity = load_entity(config.as_deref())?;
    let records = seed_records(seed.as_deref(), &entity)?;
    let server = CollectionServer::new()
        .with_collection(entity.endpoint(), records)
        .await;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    server.serve(listener).await.context("server stopped")?;
    Ok(())
}

fn load_entity(path: Option<&Path>) -> Result<EntityConfig> {
    match path {
        Some(path) => EntityConfig::from_json_file(path)
            .with_context(|| format!("failed to load entity config {}", path.display())),
        None => Ok(EntityConfig::users_demo()?),
    }
}

fn seed_records(path: Option<&Path>, entity: &EntityConfig) -> Result<Vec<EntityRecord>> {
    let Some(path) = path else {
        return Ok(demo_records(entity));
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read seed file {}", path.display()))?;
    let docs: Vec<serde_json::Value> = serde_json::from_str(&raw)
        .with_context(|| format!("seed file {} must hold a JSON array", path.display()))?;
    docs.iter()
        .map(|doc| EntityRecord::from_json(doc).map_err(anyhow::Error::from))
        .collect()
}

fn demo_records(entity: &EntityConfig) -> Vec<EntityRecord> {
    if entity.endpoint() != "users" {
        return Vec::new();
    }
    vec![
        EntityRecord::new(1)
            .with("name", "Ada Lovelace")
            .with("email", "ada@example.com")
            .with("phone", "+44 20 7946 0000")
            .with("age", 36_i64),
        EntityRecord::new(2)
            .with("name", "Alan Turing")
            .with("email", "alan@example.com")
            .with("phone", "+44 161 496 0000")
            .with("age", 41_i64),
    ]
}
