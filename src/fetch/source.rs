use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use super::error::FetchError;

/// One GET of a JSON document, no retries.
#[async_trait]
pub trait JsonSource: Send + Sync {
    async fn get_json(&self, url: &str) -> Result<Value, FetchError>;
}

#[derive(Clone)]
pub struct HttpSource {
    http: Client,
}

impl HttpSource {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(FetchError::from_reqwest)?;
        Ok(Self::with_client(http))
    }

    pub fn with_client(http: Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl JsonSource for HttpSource {
    async fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(FetchError::from_reqwest)?
            .error_for_status()
            .map_err(FetchError::from_reqwest)?;
        let bytes: Bytes = response.bytes().await.map_err(FetchError::from_reqwest)?;
        serde_json::from_slice(&bytes).map_err(FetchError::Decode)
    }
}

#[async_trait]
impl<T: JsonSource + ?Sized> JsonSource for Arc<T> {
    async fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        (**self).get_json(url).await
    }
}

/// Per-URL queue of canned responses.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MockSource {
    responses: std::sync::Mutex<std::collections::HashMap<String, std::collections::VecDeque<Result<Value, FetchError>>>>,
    calls: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_response(&self, url: &str, resp: Result<Value, FetchError>) {
        self.responses.lock().unwrap().entry(url.to_string()).or_default().push_back(resp);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| c.as_str() == url).count()
    }
}

#[cfg(test)]
#[async_trait]
impl JsonSource for MockSource {
    async fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        self.calls.lock().unwrap().push(url.to_string());
        self.responses
            .lock()
            .unwrap()
            .get_mut(url)
            .and_then(|q| q.pop_front())
            .unwrap_or_else(|| Err(FetchError::Transport(format!("mock queue empty for {url}"))))
    }
}
