//! Gateway-level error types shared across the transport, session, and refresh layers.

// self
use crate::_prelude::*;

/// Gateway-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical gateway error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Session store failure.
	#[error("{0}")]
	Session(
		#[from]
		#[source]
		crate::session::SessionError,
	),
	/// Local configuration or request construction problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Backend answered with a non-success status.
	#[error(transparent)]
	Api(#[from] ApiError),
	/// Backend answered with a body the gateway could not interpret.
	#[error(transparent)]
	Decode(#[from] DecodeError),

	/// The shared session refresh failed; every caller waiting on it receives the same cause.
	#[error("Session refresh failed: {0}")]
	RefreshFailed(#[source] Arc<Error>),
	/// The refresh task ended without producing an outcome (panic or runtime shutdown).
	#[error("Session refresh task terminated before completing.")]
	RefreshAborted,
}
impl Error {
	/// Returns the HTTP status carried by an [`Error::Api`] failure.
	pub fn status(&self) -> Option<StatusCode> {
		match self {
			Self::Api(err) => Some(err.status),
			_ => None,
		}
	}

	/// Returns the root cause of a shared refresh failure, or `self` otherwise.
	pub fn refresh_cause(&self) -> &Error {
		match self {
			Self::RefreshFailed(cause) => cause.refresh_cause(),
			other => other,
		}
	}
}

/// Configuration and request construction failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] http::Error),
	/// Base URL cannot carry relative API paths.
	#[error("Base URL `{url}` cannot be used as a base for API paths.")]
	InvalidBaseUrl {
		/// Offending URL.
		url: String,
	},
	/// Base URL uses a scheme other than `http`/`https`.
	#[error("Base URL scheme `{scheme}` is not supported.")]
	UnsupportedScheme {
		/// Offending scheme.
		scheme: String,
	},
	/// A configured path is empty or not rooted at `/`.
	#[error("The {field} path must start with `/`: {path:?}.")]
	InvalidPath {
		/// Configuration field name.
		field: &'static str,
		/// Offending value.
		path: String,
	},
	/// Proactive refresh lead time is negative.
	#[error("The refresh lead must not be negative.")]
	NegativeRefreshLead,
	/// A request path could not be joined onto the base URL.
	#[error("Request path {path:?} cannot be resolved against the base URL.")]
	InvalidRequestPath {
		/// Offending request path.
		path: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// A request path carries its own scheme and host instead of being relative to the base URL.
	#[error("Request path {path:?} is an absolute URL; only paths relative to the base URL are sent.")]
	AbsoluteRequestPath {
		/// Offending request path.
		path: String,
	},
	/// Request body could not be serialized.
	#[error("Request body could not be serialized.")]
	RequestBody(#[source] serde_json::Error),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the backend.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the backend.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// Non-success HTTP response returned by the backend.
#[derive(Clone, Debug, ThisError)]
#[error("Backend responded with HTTP {status}.")]
pub struct ApiError {
	/// Response status code.
	pub status: StatusCode,
	/// Response headers.
	pub headers: HeaderMap,
	/// Raw response body, kept so the UI layer can surface server messages.
	pub body: Vec<u8>,
}
impl ApiError {
	const PREVIEW_LIMIT: usize = 256;

	/// Returns a lossy, length-capped view of the body suitable for logs.
	pub fn body_preview(&self) -> String {
		let text = String::from_utf8_lossy(&self.body);

		match text.char_indices().nth(Self::PREVIEW_LIMIT) {
			Some((idx, _)) => format!("{}…", &text[..idx]),
			None => text.into_owned(),
		}
	}
}

/// Response bodies that do not match the expected shape.
#[derive(Debug, ThisError)]
pub enum DecodeError {
	/// Body was not valid JSON for the requested type.
	#[error("Backend returned malformed JSON.")]
	Json {
		/// Structured parsing failure including the offending path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status of the response.
		status: u16,
	},
	/// Auth response carried an empty access token.
	#[error("Auth response did not include an access token.")]
	MissingAccessToken,
}
