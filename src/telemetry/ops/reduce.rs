use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Reduce;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Load, Reduce, Persist }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self { Phase::Load => "load", Phase::Reduce => "reduce", Phase::Persist => "persist" } }
    fn span(&self) -> Span { match self { Phase::Load => info_span!("load"), Phase::Reduce => info_span!("reduce"), Phase::Persist => info_span!("persist") } }
}

impl OpMarker for Reduce {
    const NAME: &'static str = "reduce";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("reduce") }
}
