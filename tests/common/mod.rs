//! Fixtures shared by the integration suites.

#![allow(dead_code)]

// std
use std::sync::{
	Arc,
	atomic::{AtomicUsize, Ordering},
};
// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use parking_lot::Mutex;
use time::{Duration, OffsetDateTime};
// self
use session_gateway::{
	auth::{AccessToken, SessionCredentials, UserProfile},
	config::GatewayConfig,
	error::TransportError,
	gateway::Gateway,
	http::{ApiTransport, HttpRequest, HttpResponse, TransportFuture},
	navigation::Navigator,
	session::{MemorySessionStore, SessionStore},
	url::Url,
};

/// Mints an unsigned compact JWT whose `exp` claim is `expires_at`.
pub fn jwt_expiring_at(expires_at: OffsetDateTime, subject: &str) -> String {
	let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
	let payload = URL_SAFE_NO_PAD.encode(
		serde_json::json!({ "exp": expires_at.unix_timestamp(), "sub": subject }).to_string(),
	);

	format!("{header}.{payload}.c2lnbmF0dXJl")
}

/// Mints a token expiring `lifetime` from now.
pub fn jwt_expiring_in(lifetime: Duration, subject: &str) -> String {
	jwt_expiring_at(OffsetDateTime::now_utc() + lifetime, subject)
}

/// Builds a gateway config rooted at `base`.
pub fn test_config(base: &str) -> GatewayConfig {
	GatewayConfig::builder(Url::parse(base).expect("Failed to parse test base URL."))
		.build()
		.expect("Test gateway config should validate.")
}

/// Stores `token` as the current session.
pub async fn seed_session(store: &MemorySessionStore, token: &str) {
	store
		.save(SessionCredentials::new(
			AccessToken::new(token),
			UserProfile(serde_json::json!({ "id": 42, "name": "Asha" })),
		))
		.await
		.expect("Failed to seed session into the memory store.");
}

/// Navigator that records every route it is sent to.
#[derive(Debug, Default)]
pub struct RecordingNavigator(Mutex<Vec<String>>);
impl RecordingNavigator {
	pub fn routes(&self) -> Vec<String> {
		self.0.lock().clone()
	}
}
impl Navigator for RecordingNavigator {
	fn redirect(&self, route: &str) {
		self.0.lock().push(route.to_owned());
	}
}

/// In-process backend: the refresh endpoint mints a configured token (or fails), every other
/// path answers 200 only for the currently valid bearer token.
#[derive(Debug)]
pub struct FakeTransport {
	refresh_calls: AtomicUsize,
	refresh_status: u16,
	refresh_panics: bool,
	minted_token: String,
	valid_token: Mutex<Option<String>>,
	seen: Mutex<Vec<(String, Option<String>)>>,
}
impl FakeTransport {
	/// Backend whose refresh endpoint returns `minted_token`.
	pub fn refreshing_to(minted_token: impl Into<String>) -> Self {
		Self {
			refresh_calls: AtomicUsize::new(0),
			refresh_status: 200,
			refresh_panics: false,
			minted_token: minted_token.into(),
			valid_token: Mutex::new(None),
			seen: Mutex::new(Vec::new()),
		}
	}

	/// Backend whose refresh endpoint always answers `status`.
	pub fn failing_refresh(status: u16) -> Self {
		Self { refresh_status: status, ..Self::refreshing_to("unused") }
	}

	/// Backend whose refresh handler panics mid-call.
	pub fn panicking_refresh() -> Self {
		Self { refresh_panics: true, ..Self::refreshing_to("unused") }
	}

	pub fn refresh_calls(&self) -> usize {
		self.refresh_calls.load(Ordering::SeqCst)
	}

	/// Requests seen for non-refresh paths as `(path, authorization)` pairs.
	pub fn seen(&self) -> Vec<(String, Option<String>)> {
		self.seen.lock().clone()
	}

	fn respond(status: u16, body: String) -> HttpResponse {
		http::Response::builder()
			.status(status)
			.header("content-type", "application/json")
			.body(body.into_bytes())
			.expect("Fake response should build.")
	}
}
impl ApiTransport for FakeTransport {
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_> {
		Box::pin(async move {
			let path = request.uri().path().to_owned();
			let authorization = request
				.headers()
				.get("authorization")
				.and_then(|value| value.to_str().ok())
				.map(str::to_owned);

			if path.ends_with("/auth/refresh") {
				self.refresh_calls.fetch_add(1, Ordering::SeqCst);

				if self.refresh_panics {
					panic!("refresh handler crashed");
				}

				if self.refresh_status != 200 {
					return Ok(Self::respond(self.refresh_status, "{}".into()));
				}

				*self.valid_token.lock() = Some(self.minted_token.clone());

				let body = serde_json::json!({
					"accessToken": self.minted_token,
					"data": { "id": 42 }
				});

				return Ok(Self::respond(200, body.to_string()));
			}

			self.seen.lock().push((path.clone(), authorization.clone()));

			let expected = self.valid_token.lock().clone().map(|token| format!("Bearer {token}"));

			if expected.is_some() && authorization == expected {
				Ok(Self::respond(200, serde_json::json!({ "path": path }).to_string()))
			} else if path.ends_with("/unreachable") {
				Err(TransportError::Io(std::io::Error::other("connection reset")))
			} else {
				Ok(Self::respond(401, r#"{"message":"jwt expired"}"#.into()))
			}
		})
	}
}

/// Gateway over [`FakeTransport`] with fresh store and navigator.
pub fn fake_gateway(
	transport: FakeTransport,
) -> (Gateway<FakeTransport>, Arc<FakeTransport>, Arc<MemorySessionStore>, Arc<RecordingNavigator>)
{
	fake_gateway_with(test_config("https://api.example.test"), transport)
}

/// Same as [`fake_gateway`] with a caller-supplied config.
pub fn fake_gateway_with(
	config: GatewayConfig,
	transport: FakeTransport,
) -> (Gateway<FakeTransport>, Arc<FakeTransport>, Arc<MemorySessionStore>, Arc<RecordingNavigator>)
{
	let transport = Arc::new(transport);
	let store = Arc::new(MemorySessionStore::default());
	let navigator = Arc::new(RecordingNavigator::default());
	let gateway = Gateway::with_transport(
		config,
		store.clone(),
		navigator.clone(),
		transport.clone(),
	);

	(gateway, transport, store, navigator)
}

/// Reqwest-backed gateway pointed at `server`.
#[cfg(feature = "reqwest")]
pub fn reqwest_gateway(
	server: &httpmock::MockServer,
) -> (session_gateway::gateway::ReqwestGateway, Arc<MemorySessionStore>, Arc<RecordingNavigator>) {
	let store = Arc::new(MemorySessionStore::default());
	let navigator = Arc::new(RecordingNavigator::default());
	let gateway = Gateway::new(test_config(&server.base_url()), store.clone(), navigator.clone())
		.expect("Reqwest gateway should build for tests.");

	(gateway, store, navigator)
}
