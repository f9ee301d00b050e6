use anyhow::Result;
use chrono::Utc;
use clap::Args;
use std::time::Instant;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::endpoints::{self, EndpointFlow, LATEST_PRODUCTION_FILE};
use crate::fetch::{FetchOutcome, Fetcher, HttpSource, JsonSource, Sleeper, TokioSleeper};
use crate::production;
use crate::store::SnapshotStore;
use crate::telemetry::{self};
use crate::telemetry::emit::Meta;
use crate::telemetry::ops::sync::Phase as SyncPhase;
use crate::util::time::today_at_offset;

pub mod types;

use types::{DerivedReport, FlowReport, SyncPlan, SyncReport};

#[derive(Args)]
pub struct SyncCmd {
    /// Print the resolved flows without fetching or writing anything
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

/// Returns `true` iff every flow fetched successfully.
pub async fn run(cfg: &AppConfig, args: SyncCmd) -> Result<bool> {
    let log = telemetry::sync();
    let run_id = Uuid::new_v4().to_string();
    let _g = log.root_span_kv([
        ("run_id", run_id.clone()),
        ("data_dir", cfg.data_dir.display().to_string()),
        ("dry_run", args.dry_run.to_string()),
    ]).entered();
    let t0 = Instant::now();

    let today = today_at_offset(Utc::now(), cfg.utc_offset_hours);
    let flows = endpoints::build_flows(cfg, &today)?;

    if args.dry_run {
        let _s = log.span(&SyncPhase::Plan).entered();
        log.info(format!("📝 Sync plan — flows={} data_dir={} retry={}x{}s timeout={}s",
            flows.len(), cfg.data_dir.display(), cfg.retry.limit, cfg.retry.delay.as_secs(), cfg.timeout.as_secs()));
        for f in &flows { log.info(format!("  {} -> {} (reduce={})", f.url, f.destination, f.reduction_source)); }
        if telemetry::config::json_mode() {
            let plan = SyncPlan {
                data_dir: cfg.data_dir.display().to_string(),
                timeout_secs: cfg.timeout.as_secs(),
                retry_limit: cfg.retry.limit,
                retry_delay_secs: cfg.retry.delay.as_secs(),
                flows,
            };
            log.plan(&plan)?;
        }
        return Ok(true);
    }

    let fetcher = Fetcher::new(HttpSource::new(cfg.timeout)?, TokioSleeper, cfg.retry);
    let orchestrator = Orchestrator::new(fetcher, SnapshotStore::new(&cfg.data_dir));
    let report = orchestrator.run(&flows).await?;

    if report.all_ok() {
        log.info("All JSON files fetched and saved successfully.");
    } else {
        log.warn("One or more JSON files failed to fetch.");
    }
    if telemetry::config::json_mode() {
        let meta = Meta { duration_ms: Some(t0.elapsed().as_millis()), run_id: Some(run_id) };
        log.result(&report, meta)?;
    }
    Ok(report.all_ok())
}

/// Drives the endpoint flows one after another.
pub struct Orchestrator<S, Z> {
    fetcher: Fetcher<S, Z>,
    store: SnapshotStore,
}

impl<S: JsonSource, Z: Sleeper> Orchestrator<S, Z> {
    pub fn new(fetcher: Fetcher<S, Z>, store: SnapshotStore) -> Self {
        Self { fetcher, store }
    }

    /// Errors only when the data directory cannot be created; per-flow
    /// failures are recorded in the report.
    pub async fn run(&self, flows: &[EndpointFlow]) -> Result<SyncReport> {
        let log = telemetry::sync();
        self.store.ensure_root()?;
        log.debug(format!("data directory {}", self.store.root().display()));

        let mut reports = Vec::with_capacity(flows.len());
        let mut derived = None;

        for flow in flows {
            let _flow_span = log.span_kv(&SyncPhase::Flow, [("flow", flow.name.to_string()), ("url", flow.url.clone())]).entered();
            log.info(format!("Fetching {}", flow.url));

            let outcome = { let _s = log.span(&SyncPhase::Fetch).entered(); self.fetcher.fetch(&flow.url).await };
            let report = match outcome {
                FetchOutcome::Success { payload, attempts } => {
                    let saved = { let _s = log.span(&SyncPhase::Persist).entered(); self.store.persist(flow.destination, &payload) };
                    let error = match saved {
                        Ok(path) => { log.info(format!("💾 Saved {}", path.display())); None }
                        Err(e) => { log.error(format!("❌ Failed to save {}: {:#}", flow.destination, e)); Some(format!("{e:#}")) }
                    };
                    if flow.reduction_source {
                        derived = Some(self.derive(&payload));
                    }
                    FlowReport {
                        name: flow.name, url: flow.url.clone(), destination: flow.destination,
                        ok: true, attempts, persisted: error.is_none(), failure: None, error,
                    }
                }
                FetchOutcome::Failure { kind, attempts, error } => {
                    log.warn(format!("Failed to fetch {}", flow.url));
                    FlowReport {
                        name: flow.name, url: flow.url.clone(), destination: flow.destination,
                        ok: false, attempts, persisted: false, failure: Some(kind), error: Some(error),
                    }
                }
            };
            log.flow_summary(report.name, report.ok, report.attempts, report.persisted);
            reports.push(report);
        }

        let report = SyncReport { flows: reports, derived };
        log.totals(report.succeeded(), report.failed(), report.derived.as_ref().and_then(|d| d.products));
        Ok(report)
    }

    // Failures here are reported, never propagated.
    fn derive(&self, payload: &serde_json::Value) -> DerivedReport {
        let log = telemetry::sync();
        let _s = log.span(&SyncPhase::Reduce).entered();
        match production::persist_latest(&self.store, payload, LATEST_PRODUCTION_FILE) {
            Ok(products) => {
                log.info(format!("💾 Saved {} ({} products)", self.store.path(LATEST_PRODUCTION_FILE).display(), products));
                DerivedReport { destination: LATEST_PRODUCTION_FILE, ok: true, products: Some(products), error: None }
            }
            Err(e) => {
                log.error(format!("❌ Failed to derive {}: {:#}", LATEST_PRODUCTION_FILE, e));
                DerivedReport { destination: LATEST_PRODUCTION_FILE, ok: false, products: None, error: Some(format!("{e:#}")) }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetryPolicy;
    use crate::endpoints::{SALES_ORDER_FILE, SAMPLE_REQUEST_FILE, STOCK_REQUEST_FILE};
    use crate::fetch::{FailureKind, FetchError, MockSource, RecordingSleeper};
    use reqwest::StatusCode;
    use serde_json::json;
    use std::fs;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    const SAMPLE: &str = "http://upstream.test/sample";
    const STOCK: &str = "http://upstream.test/stock";
    const SALES: &str = "http://upstream.test/sales";

    fn flows() -> Vec<EndpointFlow> {
        vec![
            EndpointFlow { name: "sample_requests", url: SAMPLE.into(), destination: SAMPLE_REQUEST_FILE, reduction_source: false },
            EndpointFlow { name: "stock_requests", url: STOCK.into(), destination: STOCK_REQUEST_FILE, reduction_source: true },
            EndpointFlow { name: "sales_orders", url: SALES.into(), destination: SALES_ORDER_FILE, reduction_source: false },
        ]
    }

    fn stock_payload() -> serde_json::Value {
        json!({"data": [
            {"kode_produk": "A1", "srs_date": "2024-01-10", "srs_customer": "X", "qty": 5},
            {"kode_produk": "A1", "srs_date": "2024-02-15", "srs_customer": "Y"},
            {"kode_produk": "B2", "srs_date": "not-a-date", "srs_customer": "Z"}
        ]})
    }

    struct Harness {
        dir: TempDir,
        src: Arc<MockSource>,
        sleeper: Arc<RecordingSleeper>,
    }

    impl Harness {
        fn new() -> Self {
            Self { dir: TempDir::new().unwrap(), src: Arc::new(MockSource::new()), sleeper: Arc::new(RecordingSleeper::new()) }
        }

        fn store(&self) -> SnapshotStore { SnapshotStore::new(self.dir.path()) }

        async fn run(&self) -> SyncReport {
            let policy = RetryPolicy { limit: 3, delay: Duration::from_secs(5) };
            let fetcher = Fetcher::new(self.src.clone(), self.sleeper.clone(), policy);
            Orchestrator::new(fetcher, self.store()).run(&flows()).await.unwrap()
        }
    }

    #[tokio::test]
    async fn all_flows_succeed_and_derive_latest_production() {
        let h = Harness::new();
        h.src.push_response(SAMPLE, Ok(json!({"data": [{"id": 1}]})));
        h.src.push_response(STOCK, Ok(stock_payload()));
        h.src.push_response(SALES, Ok(json!({"data": []})));

        let report = h.run().await;

        assert!(report.all_ok());
        assert_eq!(h.src.calls(), vec![SAMPLE.to_string(), STOCK.to_string(), SALES.to_string()]);
        let store = h.store();
        assert_eq!(store.load(STOCK_REQUEST_FILE).unwrap(), Some(stock_payload()));
        assert_eq!(store.load(SAMPLE_REQUEST_FILE).unwrap(), Some(json!({"data": [{"id": 1}]})));
        assert_eq!(
            store.load(LATEST_PRODUCTION_FILE).unwrap(),
            Some(json!([
                {"date": "2024-02-15", "customer": "Y", "product_code": "A1"},
                {"date": "not-a-date", "customer": "Z", "product_code": "B2"}
            ]))
        );
        let derived = report.derived.unwrap();
        assert!(derived.ok);
        assert_eq!(derived.products, Some(2));
    }

    #[tokio::test]
    async fn failed_flow_keeps_prior_snapshot_and_fails_run() {
        let h = Harness::new();
        h.store().persist(SALES_ORDER_FILE, &json!({"data": ["yesterday"]})).unwrap();
        h.src.push_response(SAMPLE, Ok(json!({})));
        h.src.push_response(STOCK, Ok(stock_payload()));
        h.src.push_response(SALES, Err(FetchError::Status(StatusCode::BAD_GATEWAY)));

        let report = h.run().await;

        assert!(!report.all_ok());
        assert_eq!(report.failed(), 1);
        let sales = &report.flows[2];
        assert!(!sales.ok);
        assert_eq!(sales.attempts, 1);
        assert_eq!(sales.failure, Some(FailureKind::Permanent));
        assert_eq!(h.store().load(SALES_ORDER_FILE).unwrap(), Some(json!({"data": ["yesterday"]})));
        assert!(h.store().load(SAMPLE_REQUEST_FILE).unwrap().is_some());
    }

    #[tokio::test]
    async fn transient_failures_are_retried_within_a_flow() {
        let h = Harness::new();
        h.src.push_response(SAMPLE, Err(FetchError::Timeout));
        h.src.push_response(SAMPLE, Ok(json!({"ok": true})));
        h.src.push_response(STOCK, Ok(stock_payload()));
        h.src.push_response(SALES, Ok(json!({})));

        let report = h.run().await;

        assert!(report.all_ok());
        assert_eq!(report.flows[0].attempts, 2);
        assert_eq!(h.sleeper.delays(), vec![Duration::from_secs(5)]);
    }

    #[tokio::test]
    async fn derived_failure_does_not_affect_run_status() {
        let h = Harness::new();
        fs::create_dir_all(h.dir.path().join(LATEST_PRODUCTION_FILE).join("x")).unwrap();
        h.src.push_response(SAMPLE, Ok(json!({})));
        h.src.push_response(STOCK, Ok(stock_payload()));
        h.src.push_response(SALES, Ok(json!({})));

        let report = h.run().await;

        assert!(report.all_ok());
        assert!(report.flows[1].ok && report.flows[1].persisted);
        let derived = report.derived.unwrap();
        assert!(!derived.ok);
        assert!(derived.error.is_some());
    }

    #[tokio::test]
    async fn failed_reduction_source_skips_derivation() {
        let h = Harness::new();
        h.src.push_response(SAMPLE, Ok(json!({})));
        for _ in 0..3 {
            h.src.push_response(STOCK, Err(FetchError::Connect("refused".into())));
        }
        h.src.push_response(SALES, Ok(json!({})));

        let report = h.run().await;

        assert!(!report.all_ok());
        assert_eq!(report.flows[1].attempts, 3);
        assert_eq!(report.flows[1].failure, Some(FailureKind::Transient));
        assert!(report.derived.is_none());
        assert!(!h.dir.path().join(LATEST_PRODUCTION_FILE).exists());
        assert_eq!(h.src.calls_for(SALES), 1);
    }

    #[tokio::test]
    async fn malformed_reduction_payload_yields_empty_index() {
        let h = Harness::new();
        h.src.push_response(SAMPLE, Ok(json!({})));
        h.src.push_response(STOCK, Ok(json!({"data": null})));
        h.src.push_response(SALES, Ok(json!({})));

        let report = h.run().await;

        assert_eq!(report.derived.unwrap().products, Some(0));
        assert_eq!(h.store().load(LATEST_PRODUCTION_FILE).unwrap(), Some(json!([])));
    }
}
