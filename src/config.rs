use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_SAMPLE_URL: &str = "http://apps.islandsunindonesia.com:81/islandsun/samplerequest/json";
const DEFAULT_STOCK_URL: &str = "http://apps.islandsunindonesia.com:81/islandsun/stock-request/json-srs";
const DEFAULT_SALES_URL: &str = "http://apps.islandsunindonesia.com:81/islandsun/sales-order/json";
const DEFAULT_TIMEOUT_SECS: u64 = 90;
const DEFAULT_RETRY_LIMIT: u32 = 3;
const DEFAULT_RETRY_DELAY_SECS: u64 = 5;
// Asia/Jakarta, no DST
const DEFAULT_UTC_OFFSET_HOURS: i32 = 7;

/// Retry knobs for the resilient fetcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub limit: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { limit: DEFAULT_RETRY_LIMIT, delay: Duration::from_secs(DEFAULT_RETRY_DELAY_SECS) }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EndpointBases {
    pub sample: String,
    pub stock: String,
    pub sales: String,
}

impl Default for EndpointBases {
    fn default() -> Self {
        Self {
            sample: DEFAULT_SAMPLE_URL.to_string(),
            stock: DEFAULT_STOCK_URL.to_string(),
            sales: DEFAULT_SALES_URL.to_string(),
        }
    }
}

/// Everything a run needs; built once in `main` and handed to the orchestrator.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub timeout: Duration,
    pub retry: RetryPolicy,
    pub utc_offset_hours: i32,
    pub endpoints: EndpointBases,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retry: RetryPolicy::default(),
            utc_offset_hours: DEFAULT_UTC_OFFSET_HOURS,
            endpoints: EndpointBases::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(dir) = lookup("ISLANDSUN_DATA_DIR") {
            cfg.data_dir = PathBuf::from(dir);
        }
        if let Some(secs) = lookup("ISLANDSUN_HTTP_TIMEOUT_SECS").and_then(|v| v.parse::<u64>().ok()) {
            cfg.timeout = Duration::from_secs(secs);
        }
        if let Some(limit) = lookup("ISLANDSUN_RETRY_LIMIT").and_then(|v| v.parse::<u32>().ok()) {
            cfg.retry.limit = limit.max(1);
        }
        if let Some(secs) = lookup("ISLANDSUN_RETRY_DELAY_SECS").and_then(|v| v.parse::<u64>().ok()) {
            cfg.retry.delay = Duration::from_secs(secs);
        }
        if let Some(hours) = lookup("ISLANDSUN_UTC_OFFSET_HOURS").and_then(|v| v.parse::<i32>().ok()) {
            cfg.utc_offset_hours = hours;
        }
        if let Some(url) = lookup("ISLANDSUN_SAMPLE_URL") { cfg.endpoints.sample = url; }
        if let Some(url) = lookup("ISLANDSUN_STOCK_URL") { cfg.endpoints.stock = url; }
        if let Some(url) = lookup("ISLANDSUN_SALES_URL") { cfg.endpoints.sales = url; }
        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_upstream_contract() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.data_dir, PathBuf::from("data"));
        assert_eq!(cfg.timeout, Duration::from_secs(90));
        assert_eq!(cfg.retry.limit, 3);
        assert_eq!(cfg.retry.delay, Duration::from_secs(5));
        assert_eq!(cfg.utc_offset_hours, 7);
    }

    #[test]
    fn lookup_overrides_and_ignores_garbage() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("ISLANDSUN_DATA_DIR", "/tmp/snapshots"),
            ("ISLANDSUN_RETRY_LIMIT", "0"),
            ("ISLANDSUN_RETRY_DELAY_SECS", "soon"),
            ("ISLANDSUN_STOCK_URL", "http://localhost:9000/srs"),
        ]);
        let cfg = AppConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.data_dir, PathBuf::from("/tmp/snapshots"));
        assert_eq!(cfg.retry.limit, 1);
        assert_eq!(cfg.retry.delay, Duration::from_secs(5));
        assert_eq!(cfg.endpoints.stock, "http://localhost:9000/srs");
        assert_eq!(cfg.endpoints.sales, DEFAULT_SALES_URL);
    }
}
