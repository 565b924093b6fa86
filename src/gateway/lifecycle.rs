//! Session lifecycle edges: sign-in, registration, sign-out, and restore on startup.

// self
use crate::{
	_prelude::*,
	auth::SessionCredentials,
	gateway::Gateway,
	http::{ApiRequest, ApiTransport},
	obs::{self, GatewayOp, GatewaySpan, OpOutcome},
};

impl<T> Gateway<T>
where
	T: ?Sized + ApiTransport,
{
	/// Signs in with the caller's credential body and starts a session.
	///
	/// Failures are returned exactly as the backend produced them; a rejected login never
	/// triggers a refresh.
	pub async fn login<B>(&self, body: &B) -> Result<SessionCredentials>
	where
		B: ?Sized + Serialize,
	{
		let request = ApiRequest::post(self.state.config.login_path()).json(body)?;

		self.authenticate(GatewayOp::Login, request).await
	}

	/// Registers a new account and starts a session with the returned token.
	pub async fn register<B>(&self, body: &B) -> Result<SessionCredentials>
	where
		B: ?Sized + Serialize,
	{
		let request = ApiRequest::post(self.state.config.register_path()).json(body)?;

		self.authenticate(GatewayOp::Register, request).await
	}

	/// Ends the session locally, notifying the backend first when a logout path is configured.
	///
	/// Backend notification is best-effort; local teardown always happens.
	pub async fn logout(&self) -> Result<()> {
		const OP: GatewayOp = GatewayOp::Logout;

		let span = GatewaySpan::new(OP, "logout");

		obs::record_op_outcome(OP, OpOutcome::Attempt);

		let result: Result<()> = span
			.instrument(async {
				let _session = self.state.session_guard.lock().await;

				if let Some(path) = self.state.config.logout_path() {
					let mut request = ApiRequest::post(path);

					self.attach_token(&mut request).await;

					if let Err(err) = self.dispatch(&request).await {
						tracing::warn!(error = %err, "Backend logout failed; clearing local session anyway.");
					}
				}

				self.cancel_proactive_refresh();
				self.state.session.clear().await?;

				Ok(())
			})
			.await;

		obs::record_op_outcome(OP, OpOutcome::of(&result));

		result
	}

	/// Loads persisted credentials and arms the proactive refresh for them.
	pub async fn restore(&self) -> Result<Option<SessionCredentials>> {
		let credentials = self.state.session.load().await?;

		if let Some(credentials) = credentials.as_ref() {
			self.schedule_proactive_refresh(&credentials.access_token);
		}

		Ok(credentials)
	}

	async fn authenticate(&self, op: GatewayOp, request: ApiRequest) -> Result<SessionCredentials> {
		let span = GatewaySpan::new(op, "authenticate");

		obs::record_op_outcome(op, OpOutcome::Attempt);

		let result: Result<SessionCredentials> = span
			.instrument(async {
				let response = self.dispatch(&request).await?;
				let credentials = SessionCredentials::from_payload(response.json()?)?;
				let _session = self.state.session_guard.lock().await;

				self.state.session.save(credentials.clone()).await?;
				self.schedule_proactive_refresh(&credentials.access_token);

				Ok(credentials)
			})
			.await;

		obs::record_op_outcome(op, OpOutcome::of(&result));

		result
	}
}
