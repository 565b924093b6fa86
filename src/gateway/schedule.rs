//! Proactive refresh timer.
//!
//! At most one timer is armed per gateway. Arming a new one aborts the previous task, and a
//! firing timer disarms itself before refreshing so the re-arm that follows a successful
//! refresh cannot abort the task that is still awaiting it.

// crates.io
use tokio::{runtime::Handle, task::JoinHandle};
// self
use crate::{
	_prelude::*,
	auth::AccessToken,
	gateway::Gateway,
	http::ApiTransport,
};

/// Occupant of the gateway's single timer slot.
pub(super) struct ScheduledRefresh {
	id: u64,
	fire_at: OffsetDateTime,
	handle: JoinHandle<()>,
}

impl<T> Gateway<T>
where
	T: ?Sized + ApiTransport,
{
	/// Arms the proactive refresh for `token`, replacing any armed timer.
	///
	/// The timer fires `refresh_lead` before the token's `exp` claim. Nothing is armed (and the
	/// current timer is left untouched) when the expiry cannot be decoded, when the fire time
	/// is out of range or has already passed, or when no Tokio runtime is available. Returns the fire time of the
	/// newly armed timer.
	pub fn schedule_proactive_refresh(&self, token: &AccessToken) -> Option<OffsetDateTime> {
		let expires_at = match token.expires_at() {
			Ok(instant) => instant,
			Err(err) => {
				tracing::debug!(error = %err, "Access token expiry is unreadable; proactive refresh disabled.");

				return None;
			},
		};
		let Some(fire_at) = expires_at.checked_sub(self.state.config.refresh_lead()) else {
			tracing::debug!(%expires_at, "Proactive refresh time is out of range; not scheduling.");

			return None;
		};
		let delay = fire_at - OffsetDateTime::now_utc();

		if !delay.is_positive() {
			tracing::debug!(%fire_at, "Proactive refresh time already passed; not scheduling.");

			return None;
		}

		let Ok(runtime) = Handle::try_current() else {
			tracing::warn!("No Tokio runtime available; proactive refresh not scheduled.");

			return None;
		};
		let id = self.next_sequence();
		// Weak so an armed timer does not keep a dropped gateway alive.
		let state = Arc::downgrade(&self.state);
		let sleep_for = delay.unsigned_abs();
		let mut slot = self.state.timer.lock();
		let handle = runtime.spawn(async move {
			tokio::time::sleep(sleep_for).await;

			let Some(state) = state.upgrade() else { return };
			let gateway = Gateway { state };

			if !gateway.disarm(id) {
				return;
			}
			if let Err(err) = gateway.refresh().await {
				tracing::warn!(error = %err, "Proactive session refresh failed.");
			}
		});

		if let Some(previous) = slot.replace(ScheduledRefresh { id, fire_at, handle }) {
			previous.handle.abort();
		}

		tracing::debug!(%fire_at, "Proactive refresh scheduled.");

		Some(fire_at)
	}

	/// Cancels the armed proactive refresh, if any.
	pub fn cancel_proactive_refresh(&self) {
		if let Some(previous) = self.state.timer.lock().take() {
			previous.handle.abort();
		}
	}

	/// Fire time of the armed proactive refresh, if one is armed.
	pub fn scheduled_refresh_at(&self) -> Option<OffsetDateTime> {
		self.state.timer.lock().as_ref().map(|scheduled| scheduled.fire_at)
	}

	/// Removes timer `id` from the slot without aborting it. Returns `false` when a newer
	/// timer has replaced it.
	fn disarm(&self, id: u64) -> bool {
		let mut slot = self.state.timer.lock();

		if slot.as_ref().is_some_and(|scheduled| scheduled.id == id) {
			*slot = None;

			true
		} else {
			false
		}
	}
}
