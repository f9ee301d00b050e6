use reqwest::StatusCode;
use std::io::ErrorKind;

/// Whether retrying can possibly help.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Transient,
    Permanent,
}

#[derive(Debug)]
pub enum FetchError {
    Timeout,
    Connect(String),
    Status(StatusCode),
    Decode(serde_json::Error),
    Transport(String),
}

impl FetchError {
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return FetchError::Timeout;
        }
        if let Some(status) = err.status() {
            return FetchError::Status(status);
        }
        if err.is_connect() || dropped_connection(&err) {
            return FetchError::Connect(err.to_string());
        }
        FetchError::Transport(err.to_string())
    }

    pub fn kind(&self) -> FailureKind {
        if self.is_transient() { FailureKind::Transient } else { FailureKind::Permanent }
    }

    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Timeout | FetchError::Connect(_) => true,
            FetchError::Status(_) | FetchError::Decode(_) | FetchError::Transport(_) => false,
        }
    }

    /// Short label used in attempt logs.
    pub fn label(&self) -> &'static str {
        match self {
            FetchError::Timeout => "timeout",
            FetchError::Connect(_) => "connection",
            FetchError::Status(_) => "http status",
            FetchError::Decode(_) => "invalid json",
            FetchError::Transport(_) => "request",
        }
    }
}

// Resets, refusals and peers hanging up mid-request are not flagged by `is_connect`.
fn dropped_connection(err: &reqwest::Error) -> bool {
    let mut cur: Option<&(dyn std::error::Error + 'static)> = std::error::Error::source(err);
    while let Some(e) = cur {
        if let Some(h) = e.downcast_ref::<hyper::Error>() {
            if h.is_incomplete_message() || h.is_closed() {
                return true;
            }
        }
        if let Some(io) = e.downcast_ref::<std::io::Error>() {
            if matches!(
                io.kind(),
                ErrorKind::ConnectionRefused | ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted | ErrorKind::BrokenPipe
            ) {
                return true;
            }
        }
        cur = e.source();
    }
    false
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Timeout => write!(f, "request timed out"),
            FetchError::Connect(msg) => write!(f, "connection error: {msg}"),
            FetchError::Status(status) => write!(f, "http error {status}"),
            FetchError::Decode(err) => write!(f, "invalid json body: {err}"),
            FetchError::Transport(msg) => write!(f, "request error: {msg}"),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::Decode(err) => Some(err),
            _ => None,
        }
    }
}
