//! Access token, user profile, and the session credential pair owned by the gateway.

// self
use crate::{
	_prelude::*,
	auth::{ClaimsError, TokenClaims, TokenSecret},
	error::DecodeError,
};

/// Bearer credential attached to authenticated requests.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(TokenSecret);
impl AccessToken {
	/// Wraps a raw bearer string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(TokenSecret::new(value))
	}

	/// Returns the redacted secret.
	pub fn secret(&self) -> &TokenSecret {
		&self.0
	}

	/// Returns the `Authorization` header value for this token.
	pub fn bearer_value(&self) -> String {
		format!("Bearer {}", self.0.expose())
	}

	/// Decodes the embedded claims.
	pub fn claims(&self) -> Result<TokenClaims, ClaimsError> {
		TokenClaims::decode(self.0.expose())
	}

	/// Decodes the embedded expiry instant.
	pub fn expires_at(&self) -> Result<OffsetDateTime, ClaimsError> {
		self.claims()?.expires_at()
	}
}

/// Opaque user object returned by the backend alongside a token.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserProfile(pub serde_json::Value);
impl UserProfile {
	/// Returns a field of the profile, if the profile is an object containing it.
	pub fn get(&self, field: &str) -> Option<&serde_json::Value> {
		self.0.get(field)
	}
}

/// Body shape returned by the login, register, and refresh endpoints.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthPayload {
	/// Newly minted access token.
	pub access_token: String,
	/// User object mirrored into the session.
	#[serde(default)]
	pub data: UserProfile,
}

/// Session credential pair: the access token plus the user it was issued for.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionCredentials {
	/// Current bearer token.
	pub access_token: AccessToken,
	/// User object returned with the token.
	pub user: UserProfile,
	/// Instant the gateway stored this pair.
	pub issued_at: OffsetDateTime,
}
impl SessionCredentials {
	/// Creates a credential pair stamped with the current clock.
	pub fn new(access_token: AccessToken, user: UserProfile) -> Self {
		Self { access_token, user, issued_at: OffsetDateTime::now_utc() }
	}

	/// Converts an auth response body into credentials, rejecting blank tokens.
	pub fn from_payload(payload: AuthPayload) -> Result<Self, DecodeError> {
		let access_token = AccessToken::new(payload.access_token);

		if access_token.secret().is_blank() {
			return Err(DecodeError::MissingAccessToken);
		}

		Ok(Self::new(access_token, payload.data))
	}

	/// Expiry decoded from the access token, if it carries one.
	pub fn expires_at(&self) -> Option<OffsetDateTime> {
		self.access_token.expires_at().ok()
	}
}
