//! Counters exported through the `metrics` facade.
//!
//! - `session_gateway_op_total{op, outcome}` counts every gateway operation attempt and its
//!   terminal outcome.
//! - `session_gateway_refresh_event_total{event}` counts what happened around the shared
//!   refresh: callers joining it, requests replayed after it, forced navigations, and
//!   refresh tasks that died without an outcome.

// self
use crate::{
	_prelude::*,
	obs::{GatewayOp, OpOutcome},
};

const OP_TOTAL: &str = "session_gateway_op_total";
const REFRESH_EVENT_TOTAL: &str = "session_gateway_refresh_event_total";

/// Side events of the shared refresh, counted separately from operation outcomes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RefreshEvent {
	/// A caller attached to an already running refresh.
	Joined,
	/// A request was re-sent with the refreshed token.
	Replayed,
	/// The session ended and the navigator was sent to the login route.
	Navigated,
	/// The refresh task ended without producing an outcome.
	Aborted,
}
impl RefreshEvent {
	/// Returns the `event` label value.
	pub const fn as_str(self) -> &'static str {
		match self {
			RefreshEvent::Joined => "joined",
			RefreshEvent::Replayed => "replayed",
			RefreshEvent::Navigated => "navigated",
			RefreshEvent::Aborted => "aborted",
		}
	}
}
impl Display for RefreshEvent {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Counts `outcome` for gateway operation `op`.
pub fn record_op_outcome(op: GatewayOp, outcome: OpOutcome) {
	increment(OP_TOTAL, [("op", op.as_str()), ("outcome", outcome.as_str())]);
}

/// Counts one refresh side event.
pub fn record_refresh_event(event: RefreshEvent) {
	increment(REFRESH_EVENT_TOTAL, [("event", event.as_str())]);
}

#[cfg(feature = "metrics")]
fn increment<const N: usize>(name: &'static str, labels: [(&'static str, &'static str); N]) {
	metrics::counter!(name, &labels).increment(1);
}

#[cfg(not(feature = "metrics"))]
fn increment<const N: usize>(_: &'static str, _: [(&'static str, &'static str); N]) {}
