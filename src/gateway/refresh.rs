//! Shared token refresh with singleflight semantics.
//!
//! The first caller that needs a refresh spawns the network call and parks a cloneable
//! [`Shared`] handle to its outcome in the gateway. Every caller that arrives while the slot
//! is occupied awaits the same handle, so one expiry event costs exactly one
//! `POST refresh_path` and all waiters observe the same token or the same error. The task
//! empties the slot once it settles or dies; the next expiry starts a fresh refresh. A task
//! that dies without an outcome ends the session like a failed refresh.

mod stats;

pub use stats::RefreshMetrics;

// crates.io
use futures_util::future::{BoxFuture, FutureExt, Shared};
// self
use crate::{
	_prelude::*,
	auth::{AccessToken, SessionCredentials},
	gateway::Gateway,
	http::{ApiRequest, ApiTransport},
	obs::{self, GatewayOp, GatewaySpan, OpOutcome, RefreshEvent},
};

type RefreshOutcome = Result<AccessToken, Arc<Error>>;
type SharedRefresh = Shared<BoxFuture<'static, RefreshOutcome>>;

/// Occupant of the gateway's single refresh slot.
pub(super) struct InFlightRefresh {
	id: u64,
	future: SharedRefresh,
}

/// Empties refresh slot `id` when the refresh task finishes, panics, or is cancelled.
struct SlotRelease<T>
where
	T: ?Sized + ApiTransport,
{
	gateway: Gateway<T>,
	id: u64,
}
impl<T> Drop for SlotRelease<T>
where
	T: ?Sized + ApiTransport,
{
	fn drop(&mut self) {
		self.gateway.release_in_flight(self.id);
	}
}

impl<T> Gateway<T>
where
	T: ?Sized + ApiTransport,
{
	/// Refreshes the access token, joining the in-flight refresh when one is outstanding.
	///
	/// On success the new credentials are stored, the proactive timer is re-armed, and the new
	/// token is returned. On failure the session is cleared, the navigator is sent to the login
	/// route, and [`Error::RefreshFailed`] carries the shared cause.
	pub async fn refresh(&self) -> Result<AccessToken> {
		self.join_or_start_refresh().await.map_err(Error::RefreshFailed)
	}

	/// Returns `true` while a refresh call is outstanding.
	pub fn is_refreshing(&self) -> bool {
		self.state.in_flight.lock().is_some()
	}

	fn join_or_start_refresh(&self) -> SharedRefresh {
		let mut slot = self.state.in_flight.lock();

		if let Some(in_flight) = slot.as_ref() {
			self.state.metrics.record_join();

			tracing::debug!(refresh = in_flight.id, "Joining in-flight session refresh.");

			return in_flight.future.clone();
		}

		let id = self.next_sequence();
		let release = SlotRelease { gateway: self.clone(), id };
		let task =
			tokio::spawn(async move { release.gateway.perform_refresh().await.map_err(Arc::new) });
		let gateway = self.clone();
		let future = async move {
			match task.await {
				Ok(outcome) => outcome,
				Err(err) => {
					tracing::error!(refresh = id, error = %err, "Session refresh task did not complete.");

					obs::record_refresh_event(RefreshEvent::Aborted);
					gateway.state.metrics.record_failure();
					gateway.end_session().await;

					Err(Arc::new(Error::RefreshAborted))
				},
			}
		}
		.boxed()
		.shared();

		*slot = Some(InFlightRefresh { id, future: future.clone() });

		future
	}

	fn release_in_flight(&self, id: u64) {
		let mut slot = self.state.in_flight.lock();

		if slot.as_ref().is_some_and(|in_flight| in_flight.id == id) {
			*slot = None;
		}
	}

	async fn perform_refresh(&self) -> Result<AccessToken> {
		const OP: GatewayOp = GatewayOp::Refresh;

		let span = GatewaySpan::new(OP, "perform_refresh");

		obs::record_op_outcome(OP, OpOutcome::Attempt);
		self.state.metrics.record_attempt();

		let result = span
			.instrument(async {
				let _session = self.state.session_guard.lock().await;

				match self.request_new_session().await {
					Ok(credentials) => {
						self.schedule_proactive_refresh(&credentials.access_token);
						self.state.metrics.record_success();

						tracing::info!("Session refreshed.");

						Ok(credentials.access_token)
					},
					Err(err) => {
						self.state.metrics.record_failure();

						tracing::warn!(error = %err, "Session refresh failed; ending session.");

						self.end_session().await;

						Err(err)
					},
				}
			})
			.await;

		obs::record_op_outcome(OP, OpOutcome::of(&result));

		result
	}

	/// Calls the refresh endpoint and stores the returned credentials. The refresh credential
	/// travels out of band (cookie), so no bearer token is attached.
	async fn request_new_session(&self) -> Result<SessionCredentials> {
		let request = ApiRequest::post(self.state.config.refresh_path());
		let response = self.dispatch(&request).await?;
		let credentials = SessionCredentials::from_payload(response.json()?)?;

		self.state.session.save(credentials.clone()).await?;

		Ok(credentials)
	}

	/// Terminal teardown after a failed refresh: clear credentials, then navigate once.
	async fn end_session(&self) {
		self.cancel_proactive_refresh();

		if let Err(err) = self.state.session.clear().await {
			tracing::warn!(error = %err, "Failed to clear session after refresh failure.");
		}

		self.state.metrics.record_navigation();
		self.state.navigator.redirect(self.state.config.login_route());
	}
}
