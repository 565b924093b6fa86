//! Authenticated request gateway.
//!
//! [`Gateway`] attaches the session's bearer token to every outbound call, refreshes the
//! token ahead of expiry, and turns `401` responses into a single shared refresh followed by
//! a replay of each affected request. All clones of a gateway share one session context,
//! one in-flight refresh slot, and one proactive timer.

mod lifecycle;
mod refresh;
mod schedule;

pub use refresh::RefreshMetrics;

// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::{
	_prelude::*,
	auth::{AccessToken, SessionCredentials},
	config::GatewayConfig,
	http::{ApiRequest, ApiResponse, ApiTransport},
	navigation::Navigator,
	obs::{self, GatewayOp, GatewaySpan, OpOutcome},
	session::SessionStore,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

#[cfg(feature = "reqwest")]
/// Gateway specialized for the crate's default reqwest transport.
pub type ReqwestGateway = Gateway<ReqwestTransport>;

/// Coordinates authenticated calls against a single backend.
///
/// Cloning is cheap; every clone observes the same session, refresh slot, and timer. The
/// gateway must be driven from within a Tokio runtime because refreshes and proactive
/// timers run as spawned tasks, so they complete even if the caller that triggered them
/// is dropped.
pub struct Gateway<T>
where
	T: ?Sized + ApiTransport,
{
	state: Arc<GatewayState<T>>,
}
impl<T> Gateway<T>
where
	T: ?Sized + ApiTransport,
{
	/// Creates a gateway that reuses the caller-provided transport.
	pub fn with_transport(
		config: GatewayConfig,
		session: Arc<dyn SessionStore>,
		navigator: Arc<dyn Navigator>,
		transport: impl Into<Arc<T>>,
	) -> Self {
		Self {
			state: Arc::new(GatewayState {
				config,
				session,
				navigator,
				metrics: Default::default(),
				session_guard: AsyncMutex::new(()),
				in_flight: Mutex::new(None),
				timer: Mutex::new(None),
				sequence: AtomicU64::new(0),
				transport: transport.into(),
			}),
		}
	}

	/// Configuration the gateway was built with.
	pub fn config(&self) -> &GatewayConfig {
		&self.state.config
	}

	/// Shared session context; other components read the current user from it.
	pub fn session(&self) -> &Arc<dyn SessionStore> {
		&self.state.session
	}

	/// Refresh counters.
	pub fn metrics(&self) -> &RefreshMetrics {
		&self.state.metrics
	}

	/// Returns the current credentials, treating a failed store read as "signed out".
	pub async fn current_session(&self) -> Option<SessionCredentials> {
		match self.state.session.load().await {
			Ok(credentials) => credentials,
			Err(err) => {
				tracing::warn!(error = %err, "Session store read failed; treating session as absent.");

				None
			},
		}
	}

	/// Attaches the current bearer token to `request`.
	///
	/// Without a token the request goes out unauthenticated and the backend's `401`
	/// decides what happens next.
	pub async fn attach_token(&self, request: &mut ApiRequest) {
		if let Some(token) = self.current_token().await {
			request.authorize(&token);
		}
	}

	/// Sends `request` with the current token and recovers from an expired token once.
	pub async fn send(&self, mut request: ApiRequest) -> Result<ApiResponse> {
		const OP: GatewayOp = GatewayOp::Send;

		let span = GatewaySpan::new(OP, "send");

		obs::record_op_outcome(OP, OpOutcome::Attempt);

		let result = span
			.instrument(async move {
				self.attach_token(&mut request).await;

				match self.dispatch(&request).await {
					Ok(response) => Ok(response),
					Err(err) => self.on_response(request, err).await,
				}
			})
			.await;

		obs::record_op_outcome(OP, OpOutcome::of(&result));

		result
	}

	/// Intercepts a failed response for `request`.
	///
	/// Login/register failures and non-`401` statuses pass through unchanged. A first `401`
	/// joins (or starts) the shared refresh and replays the request with the new token; a
	/// request that was already replayed once is never retried again.
	pub async fn on_response(&self, mut request: ApiRequest, error: Error) -> Result<ApiResponse> {
		if self.state.config.is_credential_path(request.path()) {
			return Err(error);
		}
		if error.status() != Some(StatusCode::UNAUTHORIZED) || request.is_retried() {
			return Err(error);
		}

		request.mark_retried();

		let token = match self.rotated_token(&request).await {
			Some(token) => {
				tracing::debug!(path = request.path(), "Token already rotated; replaying without refresh.");

				token
			},
			None => self.refresh().await?,
		};

		self.replay(request, token).await
	}

	/// Sends a `GET` request.
	pub async fn get(&self, path: impl Into<String>) -> Result<ApiResponse> {
		self.send(ApiRequest::get(path)).await
	}

	/// Sends a `DELETE` request.
	pub async fn delete(&self, path: impl Into<String>) -> Result<ApiResponse> {
		self.send(ApiRequest::delete(path)).await
	}

	/// Sends a `POST` request with a JSON body.
	pub async fn post_json<B>(&self, path: impl Into<String>, body: &B) -> Result<ApiResponse>
	where
		B: ?Sized + Serialize,
	{
		self.send(ApiRequest::post(path).json(body)?).await
	}

	/// Sends a `PUT` request with a JSON body.
	pub async fn put_json<B>(&self, path: impl Into<String>, body: &B) -> Result<ApiResponse>
	where
		B: ?Sized + Serialize,
	{
		self.send(ApiRequest::put(path).json(body)?).await
	}

	async fn replay(&self, mut request: ApiRequest, token: AccessToken) -> Result<ApiResponse> {
		const OP: GatewayOp = GatewayOp::Replay;

		let span = GatewaySpan::new(OP, "replay");

		obs::record_op_outcome(OP, OpOutcome::Attempt);
		self.state.metrics.record_replay();
		request.authorize(&token);

		let result = span.instrument(self.dispatch(&request)).await;

		obs::record_op_outcome(OP, OpOutcome::of(&result));

		result
	}

	/// Executes `request` exactly as built and maps non-2xx statuses to [`Error::Api`].
	async fn dispatch(&self, request: &ApiRequest) -> Result<ApiResponse> {
		let http_request = request.to_http(&self.state.config)?;
		let response = ApiResponse::from(self.state.transport.execute(http_request).await?);

		Ok(response.error_for_status()?)
	}

	async fn current_token(&self) -> Option<AccessToken> {
		self.current_session().await.map(|credentials| credentials.access_token)
	}

	/// Returns the session token when it differs from the one `request` was sent with,
	/// meaning a refresh already completed after the request left.
	async fn rotated_token(&self, request: &ApiRequest) -> Option<AccessToken> {
		let current = self.current_token().await?;

		(request.sent_with() != Some(&current)).then_some(current)
	}

	fn next_sequence(&self) -> u64 {
		self.state.sequence.fetch_add(1, Ordering::Relaxed)
	}
}
#[cfg(feature = "reqwest")]
impl Gateway<ReqwestTransport> {
	/// Creates a gateway backed by the default cookie-aware reqwest transport.
	pub fn new(
		config: GatewayConfig,
		session: Arc<dyn SessionStore>,
		navigator: Arc<dyn Navigator>,
	) -> Result<Self> {
		let transport = ReqwestTransport::new()?;

		Ok(Self::with_transport(config, session, navigator, transport))
	}
}
impl<T> Clone for Gateway<T>
where
	T: ?Sized + ApiTransport,
{
	fn clone(&self) -> Self {
		Self { state: self.state.clone() }
	}
}
impl<T> Debug for Gateway<T>
where
	T: ?Sized + ApiTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Gateway")
			.field("config", &self.state.config)
			.field("refresh_in_flight", &self.state.in_flight.lock().is_some())
			.field("refresh_scheduled", &self.state.timer.lock().is_some())
			.finish()
	}
}

struct GatewayState<T>
where
	T: ?Sized + ApiTransport,
{
	config: GatewayConfig,
	session: Arc<dyn SessionStore>,
	navigator: Arc<dyn Navigator>,
	metrics: RefreshMetrics,
	/// Serializes session mutations (refresh, login, logout) against each other.
	session_guard: AsyncMutex<()>,
	in_flight: Mutex<Option<refresh::InFlightRefresh>>,
	timer: Mutex<Option<schedule::ScheduledRefresh>>,
	sequence: AtomicU64,
	transport: Arc<T>,
}
