use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct SyncRun;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Plan, Flow, Fetch, Persist, Reduce }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::Plan => "plan",
        Phase::Flow => "flow",
        Phase::Fetch => "fetch",
        Phase::Persist => "persist",
        Phase::Reduce => "reduce",
    }}
    fn span(&self) -> Span { match self {
        Phase::Plan => info_span!("plan"),
        Phase::Flow => info_span!("flow"),
        Phase::Fetch => info_span!("fetch"),
        Phase::Persist => info_span!("persist"),
        Phase::Reduce => info_span!("reduce"),
    }}
}

impl OpMarker for SyncRun {
    const NAME: &'static str = "sync";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("sync") }
}
