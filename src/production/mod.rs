use anyhow::Result;
use clap::Args;
use serde_json::Value;
use std::time::Instant;

use crate::config::AppConfig;
use crate::endpoints::{LATEST_PRODUCTION_FILE, STOCK_REQUEST_FILE};
use crate::store::SnapshotStore;
use crate::telemetry::{self};
use crate::telemetry::emit::Meta;
use crate::telemetry::ops::reduce::Phase as ReducePhase;

mod reduce;
pub mod types;

pub use reduce::reduce_payload;

/// Rebuild the latest-production index from the stored stock snapshot (no network)
#[derive(Args)]
pub struct ReduceCmd {
    /// Stored snapshot to read records from
    #[arg(long, default_value = STOCK_REQUEST_FILE)]
    pub source: String,
    /// Derived file to write
    #[arg(long, default_value = LATEST_PRODUCTION_FILE)]
    pub output: String,
}

/// Reduce `payload` and atomically replace `output` with the result.
pub fn persist_latest(store: &SnapshotStore, payload: &Value, output: &str) -> Result<usize> {
    let snapshots = reduce_payload(payload);
    store.persist(output, &snapshots)?;
    Ok(snapshots.len())
}

/// Returns `false` when there is no readable source snapshot.
pub async fn run(cfg: &AppConfig, args: ReduceCmd) -> Result<bool> {
    let log = telemetry::reduce();
    let _g = log.root_span_kv([
        ("data_dir", cfg.data_dir.display().to_string()),
        ("source", args.source.clone()),
        ("output", args.output.clone()),
    ]).entered();
    let t0 = Instant::now();

    let store = SnapshotStore::new(&cfg.data_dir);
    store.ensure_root()?;

    let payload = { let _s = log.span(&ReducePhase::Load).entered(); store.load(&args.source)? };
    let Some(payload) = payload else {
        log.error(format!("❌ No readable snapshot at {}", store.path(&args.source).display()));
        return Ok(false);
    };

    let snapshots = { let _s = log.span(&ReducePhase::Reduce).entered(); reduce_payload(&payload) };
    let products = snapshots.len();
    { let _s = log.span(&ReducePhase::Persist).entered(); store.persist(&args.output, &snapshots)?; }
    log.info(format!("✅ Saved {} ({} products)", store.path(&args.output).display(), products));

    if telemetry::config::json_mode() {
        let result = types::ReduceResult { source: args.source, destination: args.output, products };
        let meta = Meta { duration_ms: Some(t0.elapsed().as_millis()), run_id: None };
        log.result(&result, meta)?;
    }
    Ok(true)
}
