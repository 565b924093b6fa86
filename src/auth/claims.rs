//! Access-token claim decoding.
//!
//! The gateway only needs the expiry instant to schedule proactive refreshes, so it reads the
//! JWT payload segment without verifying the signature. The backend remains the only party
//! that validates tokens; a token the gateway cannot decode is still attached and sent.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
// self
use crate::_prelude::*;

/// Errors raised while reading claims out of an access token.
#[derive(Debug, ThisError)]
pub enum ClaimsError {
	/// Token is not a three-segment compact JWT.
	#[error("Access token is not a compact JWT.")]
	Malformed,
	/// Payload segment is not valid base64url.
	#[error("Access token payload is not valid base64url.")]
	Base64(#[from] base64::DecodeError),
	/// Payload segment is not the expected JSON object.
	#[error("Access token payload is not a valid claims object.")]
	Json(#[from] serde_json::Error),
	/// The `exp` claim does not fit in the supported timestamp range.
	#[error("Access token expiry {exp} is out of range.")]
	ExpiryOutOfRange {
		/// Raw `exp` value in seconds since the Unix epoch.
		exp: i64,
	},
}

/// Registered claims the gateway reads from an access token payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
	/// Expiry as seconds since the Unix epoch.
	pub exp: i64,
	/// Issued-at as seconds since the Unix epoch.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub iat: Option<i64>,
	/// Subject identifier.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub sub: Option<String>,
}
impl TokenClaims {
	/// Decodes the payload segment of a compact JWT.
	pub fn decode(token: &str) -> Result<Self, ClaimsError> {
		let mut segments = token.trim().split('.');
		let (Some(header), Some(payload), Some(_signature), None) =
			(segments.next(), segments.next(), segments.next(), segments.next())
		else {
			return Err(ClaimsError::Malformed);
		};

		if header.is_empty() || payload.is_empty() {
			return Err(ClaimsError::Malformed);
		}

		let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('='))?;

		Ok(serde_json::from_slice(&bytes)?)
	}

	/// Returns the expiry as an absolute instant.
	pub fn expires_at(&self) -> Result<OffsetDateTime, ClaimsError> {
		OffsetDateTime::from_unix_timestamp(self.exp)
			.map_err(|_| ClaimsError::ExpiryOutOfRange { exp: self.exp })
	}
}
