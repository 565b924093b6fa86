// crates.io
use tracing::{Instrument, Span, instrument::Instrumented};
// self
use crate::{_prelude::*, obs::GatewayOp};

/// Span wrapper shared by gateway operations.
#[derive(Clone, Debug)]
pub struct GatewaySpan(Span);
impl GatewaySpan {
	/// Creates a new span tagged with the provided operation + stage.
	pub fn new(op: GatewayOp, stage: &'static str) -> Self {
		Self(tracing::info_span!("session_gateway.op", op = op.as_str(), stage))
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> Instrumented<Fut>
	where
		Fut: Future,
	{
		fut.instrument(self.0.clone())
	}

	/// Underlying span, for attaching extra fields.
	pub fn span(&self) -> &Span {
		&self.0
	}
}
