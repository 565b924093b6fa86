//! Observability helpers for gateway operations.
//!
//! # Feature Flags
//!
//! - Spans named `session_gateway.op` carry the `op` and `stage` (call site) fields and are
//!   always emitted through `tracing`; install any subscriber to collect them.
//! - Enable `metrics` to export `session_gateway_op_total{op, outcome}` and
//!   `session_gateway_refresh_event_total{event}` (joins, replays, navigations, aborts).

mod counter;
mod span;

pub use counter::*;
pub use span::*;

// self
use crate::_prelude::*;

/// Operations observed by the gateway.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GatewayOp {
	/// Authenticated request dispatch.
	Send,
	/// Shared token refresh.
	Refresh,
	/// Replay of a request after a refresh.
	Replay,
	/// Login call.
	Login,
	/// Registration call.
	Register,
	/// Session teardown requested by the user.
	Logout,
}
impl GatewayOp {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			GatewayOp::Send => "send",
			GatewayOp::Refresh => "refresh",
			GatewayOp::Replay => "replay",
			GatewayOp::Login => "login",
			GatewayOp::Register => "register",
			GatewayOp::Logout => "logout",
		}
	}
}
impl Display for GatewayOp {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpOutcome {
	/// Entry to a gateway operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl OpOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpOutcome::Attempt => "attempt",
			OpOutcome::Success => "success",
			OpOutcome::Failure => "failure",
		}
	}

	/// Maps a result onto the terminal outcome label.
	pub fn of<T, E>(result: &Result<T, E>) -> Self {
		if result.is_ok() { OpOutcome::Success } else { OpOutcome::Failure }
	}
}
impl Display for OpOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
