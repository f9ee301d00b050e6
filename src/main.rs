use clap::{Parser, Subcommand};
use anyhow::Result;
use dotenvy::dotenv;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

mod config;
mod endpoints;
mod fetch;
mod production;
mod store;
mod sync;
mod telemetry;
mod util;

use config::AppConfig;

#[derive(Parser)]
#[command(name = "islandsun-sync", about = "Fetch Islandsun JSON snapshots and derive latest production per product")]
struct Cli {
    /// Directory the snapshots are written to (env: ISLANDSUN_DATA_DIR)
    #[arg(global = true, long)]
    data_dir: Option<PathBuf>,
    /// Per-request timeout in seconds
    #[arg(global = true, long)]
    timeout_secs: Option<u64>,
    /// Attempts per endpoint for transient network errors
    #[arg(global = true, long)]
    retry_limit: Option<u32>,
    /// Fixed wait between attempts, in seconds
    #[arg(global = true, long)]
    retry_delay_secs: Option<u64>,
    /// Emit a single JSON envelope to stdout; logs go to stderr
    #[arg(global = true, long, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Sync(sync::SyncCmd),
    Reduce(production::ReduceCmd),
}

impl Cli {
    fn config(&self) -> AppConfig {
        let mut cfg = AppConfig::from_env();
        if let Some(dir) = &self.data_dir { cfg.data_dir = dir.clone(); }
        if let Some(secs) = self.timeout_secs { cfg.timeout = Duration::from_secs(secs); }
        if let Some(limit) = self.retry_limit { cfg.retry.limit = limit.max(1); }
        if let Some(secs) = self.retry_delay_secs { cfg.retry.delay = Duration::from_secs(secs); }
        cfg
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenv().ok();
    let cli = Cli::parse();
    telemetry::config::set_json_mode(cli.json);

    // initialize logging/tracing (stderr). Respect RUST_LOG and ISLANDSUN_LOG_FORMAT
    telemetry::config::init_tracing();
    let cfg = cli.config();

    let ok = match cli.command {
        Commands::Sync(args) => sync::run(&cfg, args).await?,
        Commands::Reduce(args) => production::run(&cfg, args).await?,
    };

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
