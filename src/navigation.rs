//! Forced-navigation contract invoked when a session ends unrecoverably.

// self
use crate::_prelude::*;

/// Moves the application to an unauthenticated route.
///
/// The gateway calls [`Navigator::redirect`] exactly once per failed refresh, after the
/// session store has been cleared, no matter how many requests were waiting on that refresh.
pub trait Navigator
where
	Self: Send + Sync,
{
	/// Navigates to `route`.
	fn redirect(&self, route: &str);
}

/// Navigator that only records the event in the logs, for headless consumers.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopNavigator;
impl Navigator for NoopNavigator {
	fn redirect(&self, route: &str) {
		tracing::info!(route, "Session ended; navigation requested.");
	}
}

/// Adapts a closure into a [`Navigator`].
pub struct FnNavigator<F>(F);
impl<F> FnNavigator<F>
where
	F: Fn(&str) + Send + Sync,
{
	/// Wraps `f`.
	pub fn new(f: F) -> Self {
		Self(f)
	}
}
impl<F> Navigator for FnNavigator<F>
where
	F: Fn(&str) + Send + Sync,
{
	fn redirect(&self, route: &str) {
		(self.0)(route)
	}
}
impl<F> Debug for FnNavigator<F> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("FnNavigator(..)")
	}
}
