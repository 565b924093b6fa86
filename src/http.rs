//! Transport primitives for gateway requests.
//!
//! [`ApiTransport`] is the gateway's only dependency on an HTTP stack. It executes a fully
//! built [`HttpRequest`] and hands back the raw [`HttpResponse`], whatever its status; status
//! classification and 401 recovery stay in the gateway so every transport gets the same
//! semantics. [`ApiRequest`] and [`ApiResponse`] are the caller-facing shapes.

// crates.io
use http::{
	HeaderName, HeaderValue,
	header::{AUTHORIZATION, CONTENT_TYPE},
};
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	auth::AccessToken,
	config::GatewayConfig,
	error::{ApiError, ConfigError, DecodeError, TransportError},
};

/// Fully built request handed to an [`ApiTransport`].
pub type HttpRequest = http::Request<Vec<u8>>;
/// Raw response returned by an [`ApiTransport`].
pub type HttpResponse = http::Response<Vec<u8>>;
/// Boxed future returned by [`ApiTransport::execute`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<HttpResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP stacks capable of executing gateway requests.
///
/// Implementations must be `Send + Sync + 'static` so one transport can be shared by every
/// clone of a gateway and by its background refresh tasks. The refresh endpoint identifies
/// the caller through an out-of-band credential (a cookie), so transports must keep cookie
/// state across calls.
pub trait ApiTransport
where
	Self: 'static + Send + Sync,
{
	/// Executes `request` and returns the response regardless of its status code.
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_>;
}

/// Outbound API call owned by the caller until the gateway dispatches it.
#[derive(Clone, Debug)]
pub struct ApiRequest {
	method: Method,
	path: String,
	query: Vec<(String, String)>,
	headers: HeaderMap,
	body: Option<Vec<u8>>,
	retried: bool,
	sent_with: Option<AccessToken>,
}
impl ApiRequest {
	/// Creates a request for `path`, resolved against the gateway base URL. Absolute URLs are
	/// refused at dispatch with [`ConfigError::AbsoluteRequestPath`].
	pub fn new(method: Method, path: impl Into<String>) -> Self {
		Self {
			method,
			path: path.into(),
			query: Vec::new(),
			headers: HeaderMap::new(),
			body: None,
			retried: false,
			sent_with: None,
		}
	}

	/// Shorthand for a `GET` request.
	pub fn get(path: impl Into<String>) -> Self {
		Self::new(Method::GET, path)
	}

	/// Shorthand for a `POST` request.
	pub fn post(path: impl Into<String>) -> Self {
		Self::new(Method::POST, path)
	}

	/// Shorthand for a `PUT` request.
	pub fn put(path: impl Into<String>) -> Self {
		Self::new(Method::PUT, path)
	}

	/// Shorthand for a `DELETE` request.
	pub fn delete(path: impl Into<String>) -> Self {
		Self::new(Method::DELETE, path)
	}

	/// Appends a query parameter.
	pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.query.push((key.into(), value.into()));

		self
	}

	/// Sets a header, replacing any previous value.
	pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
		self.headers.insert(name, value);

		self
	}

	/// Serializes `body` as the JSON payload.
	pub fn json<B>(mut self, body: &B) -> Result<Self, ConfigError>
	where
		B: ?Sized + Serialize,
	{
		let bytes = serde_json::to_vec(body).map_err(ConfigError::RequestBody)?;

		self.headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
		self.body = Some(bytes);

		Ok(self)
	}

	/// Sets a raw body.
	pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
		self.body = Some(body.into());

		self
	}

	/// HTTP method.
	pub fn method(&self) -> &Method {
		&self.method
	}

	/// Request path relative to the base URL.
	pub fn path(&self) -> &str {
		&self.path
	}

	/// Current headers, including `Authorization` once the gateway attached a token.
	pub fn headers(&self) -> &HeaderMap {
		&self.headers
	}

	/// Returns `true` once the gateway has replayed this request after a refresh.
	pub fn is_retried(&self) -> bool {
		self.retried
	}

	pub(crate) fn mark_retried(&mut self) {
		self.retried = true;
	}

	/// Token the request was last sent with.
	pub(crate) fn sent_with(&self) -> Option<&AccessToken> {
		self.sent_with.as_ref()
	}

	/// Attaches `token` as a bearer credential. A token that cannot be encoded as a header
	/// value leaves the request unauthenticated.
	pub(crate) fn authorize(&mut self, token: &AccessToken) {
		match HeaderValue::from_str(&token.bearer_value()) {
			Ok(mut value) => {
				value.set_sensitive(true);
				self.headers.insert(AUTHORIZATION, value);
				self.sent_with = Some(token.clone());
			},
			Err(_) => {
				tracing::warn!("Access token contains bytes that are invalid in a header; sending unauthenticated.");

				self.headers.remove(AUTHORIZATION);
				self.sent_with = None;
			},
		}
	}

	/// Builds the transport-level request against `config`.
	pub fn to_http(&self, config: &GatewayConfig) -> Result<HttpRequest, ConfigError> {
		let mut url = config.endpoint(&self.path)?;

		if !self.query.is_empty() {
			url.query_pairs_mut().extend_pairs(self.query.iter());
		}

		let mut request = http::Request::builder()
			.method(self.method.clone())
			.uri(url.as_str())
			.body(self.body.clone().unwrap_or_default())?;

		request.headers_mut().extend(self.headers.clone());

		Ok(request)
	}
}

/// Response returned to callers of the gateway.
#[derive(Clone, Debug)]
pub struct ApiResponse {
	/// Response status code.
	pub status: StatusCode,
	/// Response headers.
	pub headers: HeaderMap,
	/// Raw response body.
	pub body: Vec<u8>,
}
impl ApiResponse {
	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		self.status.is_success()
	}

	/// Decodes the body as JSON, reporting the failing field path on mismatch.
	pub fn json<T>(&self) -> Result<T, DecodeError>
	where
		T: DeserializeOwned,
	{
		let mut deserializer = serde_json::Deserializer::from_slice(&self.body);

		serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| DecodeError::Json { source, status: self.status.as_u16() })
	}

	/// Lossy UTF-8 view of the body.
	pub fn text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}

	/// Converts non-2xx responses into [`ApiError`].
	pub fn error_for_status(self) -> Result<Self, ApiError> {
		if self.is_success() {
			Ok(self)
		} else {
			Err(ApiError { status: self.status, headers: self.headers, body: self.body })
		}
	}
}
impl From<HttpResponse> for ApiResponse {
	fn from(response: HttpResponse) -> Self {
		let (parts, body) = response.into_parts();

		Self { status: parts.status, headers: parts.headers, body }
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// The default client keeps a cookie store, which carries the refresh credential, and does
/// not follow redirects so auth failures surface as-is instead of landing on an HTML page.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Builds the default cookie-aware client.
	pub fn new() -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder()
			.cookie_store(true)
			.redirect(reqwest::redirect::Policy::none())
			.build()?;

		Ok(Self(client))
	}

	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl ApiTransport for ReqwestTransport {
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let request = reqwest::Request::try_from(request)?;
			let response = client.execute(request).await?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let mut response_new = HttpResponse::new(response.bytes().await?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}
