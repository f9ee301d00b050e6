use anyhow::{Context, Result};
use serde::Serialize;
use url::Url;

use crate::config::AppConfig;

pub const SAMPLE_REQUEST_FILE: &str = "sample_requests.json";
pub const STOCK_REQUEST_FILE: &str = "stock_requests.json";
pub const SALES_ORDER_FILE: &str = "sales_orders.json";
pub const LATEST_PRODUCTION_FILE: &str = "latest_production.json";

// Lower bound the upstream accepts for "everything"
const EPOCH_DATE: &str = "0001-01-01";

/// One fetch → persist pipeline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EndpointFlow {
    pub name: &'static str,
    pub url: String,
    pub destination: &'static str,
    pub reduction_source: bool,
}

/// The three flows of a run, with query strings resolved against `today`.
pub fn build_flows(cfg: &AppConfig, today: &str) -> Result<Vec<EndpointFlow>> {
    let sample = with_query(&cfg.endpoints.sample, &[
        ("dari", EPOCH_DATE),
        ("sampai", today),
        ("fil_status", ""),
        ("tipe", ""),
    ])?;
    let stock = with_query(&cfg.endpoints.stock, &[
        ("tipe", ""),
        ("status", ""),
        ("dari", EPOCH_DATE),
        ("sampai", today),
    ])?;
    let sales = with_query(&cfg.endpoints.sales, &[
        ("dari", EPOCH_DATE),
        ("sampai", today),
        ("status", ""),
        ("tipe", ""),
        ("srs_value", ""),
        ("orderData", ""),
    ])?;

    Ok(vec![
        EndpointFlow { name: "sample_requests", url: sample, destination: SAMPLE_REQUEST_FILE, reduction_source: false },
        EndpointFlow { name: "stock_requests", url: stock, destination: STOCK_REQUEST_FILE, reduction_source: true },
        EndpointFlow { name: "sales_orders", url: sales, destination: SALES_ORDER_FILE, reduction_source: false },
    ])
}

fn with_query(base: &str, params: &[(&str, &str)]) -> Result<String> {
    let mut url = Url::parse(base).with_context(|| format!("invalid endpoint URL: {}", base))?;
    {
        let mut pairs = url.query_pairs_mut();
        for (k, v) in params { pairs.append_pair(k, v); }
    }
    Ok(url.into())
}
