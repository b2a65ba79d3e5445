use std::path::PathBuf;
use std::sync::Arc;

use chrono::Local;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use snowball::config::{EngineArgs, build_config};
use snowball::core::run_projection;
use snowball::repository::{MemoryRepository, SessionRecord, sort_by_payoff_priority};
use snowball::service::SessionService;

#[derive(Parser, Debug)]
#[command(name = "snowball", about = "Month-by-month budget and debt payoff projections")]
struct Cli {
    #[arg(
        long,
        global = true,
        help = "Log filter, e.g. debug or snowball=trace; RUST_LOG takes precedence"
    )]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the session HTTP API.
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
        #[arg(long, help = "JSON array of session records to load at startup")]
        seed_file: Option<PathBuf>,
        #[command(flatten)]
        engine: EngineArgs,
    },
    /// Project one session record and print the result as JSON.
    Project {
        file: PathBuf,
        #[command(flatten)]
        engine: EngineArgs,
    },
}

fn init_tracing(log_level: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level.unwrap_or("snowball=info")))
        .unwrap_or_else(|_| EnvFilter::new("snowball=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn serve(port: u16, seed_file: Option<PathBuf>, engine: &EngineArgs) -> Result<(), String> {
    let config = build_config(engine)?;
    let repo = match seed_file {
        Some(path) => {
            let repo = MemoryRepository::from_seed_file(&path).map_err(|e| e.to_string())?;
            info!(path = %path.display(), "loaded seed sessions");
            repo
        }
        None => MemoryRepository::new(),
    };
    let service = SessionService::new(Arc::new(repo), config);
    snowball::api::run_http_server(port, service)
        .await
        .map_err(|e| format!("Server error: {e}"))
}

fn project(file: PathBuf, engine: &EngineArgs) -> Result<(), String> {
    let config = build_config(engine)?;
    let raw = std::fs::read_to_string(&file)
        .map_err(|e| format!("failed to read {}: {e}", file.display()))?;
    let mut record: SessionRecord =
        serde_json::from_str(&raw).map_err(|e| format!("invalid session record: {e}"))?;
    if let Some(field) = record.out_of_range_field() {
        return Err(format!("invalid session record: {field} is out of range"));
    }
    sort_by_payoff_priority(&mut record.debts);

    let projection = run_projection(
        &record.financials(),
        &config,
        Local::now().date_naive(),
        &CancellationToken::new(),
    )
    .map_err(|e| e.to_string())?;

    let json = serde_json::to_string_pretty(&projection.summary())
        .map_err(|e| format!("failed to serialize projection: {e}"))?;
    println!("{json}");
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    let result = match cli.command {
        Command::Serve {
            port,
            seed_file,
            engine,
        } => serve(port, seed_file, &engine).await,
        Command::Project { file, engine } => project(file, &engine),
    };

    if let Err(e) = result {
        error!("{e}");
        std::process::exit(1);
    }
}
