mod bey_client;
mod config;
mod errors;
mod extraction;
mod ingest;
mod models;
mod routes;
mod state;
mod store;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::bey_client::{BeyClient, CallSource};
use crate::config::Config;
use crate::ingest::poll::run_poll;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::OutputStore;

#[derive(Parser)]
#[command(
    name = "intake",
    version,
    about = "Recover structured intake data from avatar call transcripts"
)]
struct Cli {
    /// Directory for per-call output files (overrides OUTPUT_DIR)
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the webhook receiver and output API
    Serve {
        /// Port to listen on (overrides PORT)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Fetch every call of an agent once and save the structured outputs
    Poll {
        /// Agent whose calls should be processed
        #[arg(long)]
        agent_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    if let Some(dir) = cli.output_dir {
        config.output_dir = dir;
    }

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Command::Serve { port } => {
            if let Some(port) = port {
                config.port = port;
            }
            serve(config).await
        }
        Command::Poll { agent_id } => poll(config, &agent_id).await,
    }
}

async fn serve(config: Config) -> Result<()> {
    info!("Starting intake API v{}", env!("CARGO_PKG_VERSION"));

    let source = match config.api_key.clone() {
        Some(key) => {
            let client = BeyClient::new(&config.api_url, key)?;
            info!("Call source initialized ({})", config.api_url);
            Some(Arc::new(client) as Arc<dyn CallSource>)
        }
        None => {
            warn!("BEY_API_KEY not set; webhooks without inline messages will be rejected");
            None
        }
    };
    if config.webhook_secret.is_none() {
        warn!("WEBHOOK_SECRET not set; /webhook accepts unauthenticated requests");
    }

    let store = OutputStore::new(config.output_dir.clone());
    info!("Saving outputs to {}", store.dir().display());

    let state = AppState {
        source,
        store,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict to the web front end's origin

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn poll(config: Config, agent_id: &str) -> Result<()> {
    let client = BeyClient::new(&config.api_url, config.require_api_key()?.to_string())?;
    let store = OutputStore::new(config.output_dir.clone());

    let summary = run_poll(&client, &store, agent_id)
        .await
        .with_context(|| format!("Poll for agent {agent_id} aborted"))?;

    for (call_id, path) in &summary.saved {
        println!("{call_id}: saved {}", path.display());
    }
    for call_id in &summary.missing_output {
        println!("{call_id}: no structured output");
    }
    for call_id in &summary.failed {
        println!("{call_id}: skipped (see log)");
    }
    Ok(())
}
