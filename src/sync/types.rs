use serde::Serialize;

use crate::endpoints::EndpointFlow;
use crate::fetch::FailureKind;

// Plan envelope types
#[derive(Serialize)]
pub struct SyncPlan {
    pub data_dir: String,
    pub timeout_secs: u64,
    pub retry_limit: u32,
    pub retry_delay_secs: u64,
    pub flows: Vec<EndpointFlow>,
}

// Apply/result envelope types
#[derive(Clone, Debug, Serialize)]
pub struct FlowReport {
    pub name: &'static str,
    pub url: String,
    pub destination: &'static str,
    pub ok: bool,
    pub attempts: u32,
    pub persisted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct DerivedReport {
    pub destination: &'static str,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub products: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct SyncReport {
    pub flows: Vec<FlowReport>,
    /// `None` when the reduction source was not fetched.
    pub derived: Option<DerivedReport>,
}

impl SyncReport {
    pub fn succeeded(&self) -> usize { self.flows.iter().filter(|f| f.ok).count() }
    pub fn failed(&self) -> usize { self.flows.len() - self.succeeded() }

    /// Only fetch outcomes count; derived failures never fail the run.
    pub fn all_ok(&self) -> bool { self.failed() == 0 }
}
