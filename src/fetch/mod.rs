use serde_json::Value;
use tracing::warn;

use crate::config::RetryPolicy;

mod error;
mod sleep;
mod source;

pub use error::{FailureKind, FetchError};
pub use sleep::{Sleeper, TokioSleeper};
pub use source::{HttpSource, JsonSource};

#[cfg(test)]
pub use sleep::RecordingSleeper;
#[cfg(test)]
pub use source::MockSource;

#[derive(Debug)]
pub enum FetchOutcome {
    Success { payload: Value, attempts: u32 },
    Failure { kind: FailureKind, attempts: u32, error: String },
}

/// Bounded-retry wrapper around a [`JsonSource`].
///
/// Transient errors are retried up to `policy.limit` attempts with a fixed
/// `policy.delay` between them; permanent errors stop at the first attempt.
pub struct Fetcher<S, Z> {
    source: S,
    sleeper: Z,
    policy: RetryPolicy,
}

impl<S: JsonSource, Z: Sleeper> Fetcher<S, Z> {
    pub fn new(source: S, sleeper: Z, policy: RetryPolicy) -> Self {
        Self { source, sleeper, policy }
    }

    pub async fn fetch(&self, url: &str) -> FetchOutcome {
        let limit = self.policy.limit.max(1);
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let err = match self.source.get_json(url).await {
                Ok(payload) => return FetchOutcome::Success { payload, attempts: attempt },
                Err(err) => err,
            };
            warn!(url, attempt, limit, kind = err.label(), error = %err, "fetch attempt failed");
            let kind = err.kind();
            if kind == FailureKind::Permanent || attempt >= limit {
                return FetchOutcome::Failure { kind, attempts: attempt, error: err.to_string() };
            }
            self.sleeper.sleep(self.policy.delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    const URL: &str = "http://upstream.test/json";

    fn policy() -> RetryPolicy {
        RetryPolicy { limit: 3, delay: Duration::from_secs(5) }
    }

    fn fetcher(src: &Arc<MockSource>, sleeper: &Arc<RecordingSleeper>) -> Fetcher<Arc<MockSource>, Arc<RecordingSleeper>> {
        Fetcher::new(src.clone(), sleeper.clone(), policy())
    }

    #[tokio::test]
    async fn succeeds_on_third_attempt_after_transient_failures() {
        let src = Arc::new(MockSource::new());
        src.push_response(URL, Err(FetchError::Timeout));
        src.push_response(URL, Err(FetchError::Connect("reset by peer".into())));
        src.push_response(URL, Ok(json!({"data": []})));
        let sleeper = Arc::new(RecordingSleeper::new());

        let out = fetcher(&src, &sleeper).fetch(URL).await;

        match out {
            FetchOutcome::Success { payload, attempts } => {
                assert_eq!(attempts, 3);
                assert_eq!(payload, json!({"data": []}));
            }
            other => panic!("expected success, got {other:?}"),
        }
        assert_eq!(sleeper.delays(), vec![Duration::from_secs(5); 2]);
    }

    #[tokio::test]
    async fn http_status_error_is_not_retried() {
        let src = Arc::new(MockSource::new());
        src.push_response(URL, Err(FetchError::Status(StatusCode::BAD_REQUEST)));
        src.push_response(URL, Ok(json!({})));
        let sleeper = Arc::new(RecordingSleeper::new());

        let out = fetcher(&src, &sleeper).fetch(URL).await;

        assert!(matches!(out, FetchOutcome::Failure { kind: FailureKind::Permanent, attempts: 1, .. }));
        assert_eq!(src.calls_for(URL), 1);
        assert!(sleeper.delays().is_empty());
    }

    #[tokio::test]
    async fn malformed_body_is_not_retried() {
        let src = Arc::new(MockSource::new());
        let decode = serde_json::from_str::<Value>("nope").unwrap_err();
        src.push_response(URL, Err(FetchError::Decode(decode)));
        let sleeper = Arc::new(RecordingSleeper::new());

        let out = fetcher(&src, &sleeper).fetch(URL).await;

        assert!(matches!(out, FetchOutcome::Failure { kind: FailureKind::Permanent, attempts: 1, .. }));
    }

    #[tokio::test]
    async fn gives_up_after_retry_limit_without_trailing_wait() {
        let src = Arc::new(MockSource::new());
        for _ in 0..4 {
            src.push_response(URL, Err(FetchError::Timeout));
        }
        let sleeper = Arc::new(RecordingSleeper::new());

        let out = fetcher(&src, &sleeper).fetch(URL).await;

        assert!(matches!(out, FetchOutcome::Failure { kind: FailureKind::Transient, attempts: 3, .. }));
        assert_eq!(src.calls_for(URL), 3);
        assert_eq!(sleeper.delays().len(), 2);
    }

    #[tokio::test]
    async fn permanent_failure_after_transient_stops_immediately() {
        let src = Arc::new(MockSource::new());
        src.push_response(URL, Err(FetchError::Timeout));
        src.push_response(URL, Err(FetchError::Status(StatusCode::NOT_FOUND)));
        src.push_response(URL, Ok(json!({})));
        let sleeper = Arc::new(RecordingSleeper::new());

        let out = fetcher(&src, &sleeper).fetch(URL).await;

        assert!(matches!(out, FetchOutcome::Failure { kind: FailureKind::Permanent, attempts: 2, .. }));
        assert_eq!(sleeper.delays().len(), 1);
    }
}
