use chainql_common::Settings;
use chainql_engine::QueryEngine;
use chainql_rpc::{BlockchainClient, HttpClient, MemoryClient, RpcError};
use chainql_sql::{Planner, PlanningError};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Run SQL against a blockchain node", long_about = None)]
struct Args {
    /// Settings file; defaults to CHAINQL_CONFIG_PATH or config/default.toml.
    #[arg(short, long)]
    config: Option<String>,

    /// Node endpoint, overriding the configured rpc_url.
    #[arg(long)]
    rpc_url: Option<String>,

    /// JSON array of blocks to query instead of a live node.
    #[arg(long)]
    fixture: Option<PathBuf>,

    /// The query, e.g. "SELECT hash, gas FROM transactions WHERE blocknumber = 1652339".
    sql: String,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("Failed to load settings: {0}")]
    Config(#[from] chainql_common::config::ConfigError),
    #[error("Failed to plan query: {0}")]
    Plan(#[from] PlanningError),
    #[error("Query failed: {0}")]
    Query(#[from] chainql_common::Error),
    #[error("Node client error: {0}")]
    Rpc(#[from] RpcError),
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to render result: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
}

#[tokio::main]
async fn main() {
    if let Err(e) = run(Args::parse()).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), CliError> {
    let mut settings = match &args.config {
        Some(path) => Settings::from_file(path, true)?,
        None => Settings::new()?,
    };
    if let Some(rpc_url) = args.rpc_url {
        settings.rpc_url = rpc_url;
    }

    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log_filter)),
        )
        .init();

    let client: Arc<dyn BlockchainClient> = match &args.fixture {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .map_err(|source| CliError::Io { path: path.clone(), source })?;
            info!(fixture = %path.display(), "using in-memory node");
            Arc::new(MemoryClient::from_json(&json)?)
        }
        None => {
            let timeout = Duration::from_secs(settings.request_timeout_secs);
            let client = HttpClient::new(&settings.rpc_url, timeout)?;
            info!(rpc_url = client.endpoint(), "using node");
            Arc::new(client)
        }
    };

    let query = Planner::new().sql_to_query(&args.sql)?;
    let result = QueryEngine::new(client).execute(&query).await?;
    info!(table = %result.table(), rows = result.num_rows(), "query finished");

    let batch = result.to_record_batch()?;
    arrow::util::pretty::print_batches(&[batch])?;
    Ok(())
}
