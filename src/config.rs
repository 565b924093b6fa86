//! Gateway configuration: backend base URL, auth endpoint paths, and refresh timing.
//!
//! [`GatewayConfig`] is immutable once built. It can be assembled in code through
//! [`GatewayConfig::builder`] or deserialized from any serde format; both paths run the
//! same validation.

// self
use crate::{_prelude::*, error::ConfigError};

const DEFAULT_REFRESH_PATH: &str = "/auth/refresh";
const DEFAULT_LOGIN_PATH: &str = "/auth/login";
const DEFAULT_REGISTER_PATH: &str = "/auth/register";
const DEFAULT_LOGIN_ROUTE: &str = "/login";
const DEFAULT_REFRESH_LEAD: Duration = Duration::seconds(60);

/// Validated gateway configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "GatewayConfigBuilder", into = "GatewayConfigBuilder")]
pub struct GatewayConfig {
	base_url: Url,
	refresh_path: String,
	login_path: String,
	register_path: String,
	logout_path: Option<String>,
	login_route: String,
	refresh_lead: Duration,
}
impl GatewayConfig {
	/// Creates a builder seeded with defaults for the provided backend base URL.
	pub fn builder(base_url: Url) -> GatewayConfigBuilder {
		GatewayConfigBuilder::new(base_url)
	}

	/// Backend base URL (always ends with `/`).
	pub fn base_url(&self) -> &Url {
		&self.base_url
	}

	/// Path of the token refresh endpoint, shared by proactive and reactive refreshes.
	pub fn refresh_path(&self) -> &str {
		&self.refresh_path
	}

	/// Path of the login endpoint.
	pub fn login_path(&self) -> &str {
		&self.login_path
	}

	/// Path of the registration endpoint.
	pub fn register_path(&self) -> &str {
		&self.register_path
	}

	/// Optional logout endpoint notified on sign-out.
	pub fn logout_path(&self) -> Option<&str> {
		self.logout_path.as_deref()
	}

	/// Route the navigator is sent to when the session ends unrecoverably.
	pub fn login_route(&self) -> &str {
		&self.login_route
	}

	/// How long before token expiry the proactive refresh fires.
	pub fn refresh_lead(&self) -> Duration {
		self.refresh_lead
	}

	/// Resolves a request path against the base URL.
	///
	/// Absolute URLs are rejected so the bearer token never leaves the configured backend.
	pub fn endpoint(&self, path: &str) -> Result<Url, ConfigError> {
		if Url::parse(path).is_ok() {
			return Err(ConfigError::AbsoluteRequestPath { path: path.to_owned() });
		}

		self.base_url
			.join(path.trim_start_matches('/'))
			.map_err(|source| ConfigError::InvalidRequestPath { path: path.to_owned(), source })
	}

	/// Returns `true` when `path` targets the login or register endpoint.
	///
	/// Failures from these endpoints are credential problems, never expiry, so they must not
	/// enter the refresh path.
	pub fn is_credential_path(&self, path: &str) -> bool {
		let path = normalize_request_path(path);

		path == normalize_request_path(&self.login_path)
			|| path == normalize_request_path(&self.register_path)
	}

	fn validate(&self) -> Result<(), ConfigError> {
		match self.base_url.scheme() {
			"http" | "https" => {},
			scheme => return Err(ConfigError::UnsupportedScheme { scheme: scheme.to_owned() }),
		}

		if self.base_url.cannot_be_a_base() {
			return Err(ConfigError::InvalidBaseUrl { url: self.base_url.to_string() });
		}

		validate_path("refresh", &self.refresh_path)?;
		validate_path("login", &self.login_path)?;
		validate_path("register", &self.register_path)?;

		if let Some(logout) = self.logout_path.as_deref() {
			validate_path("logout", logout)?;
		}

		validate_path("login route", &self.login_route)?;

		if self.refresh_lead.is_negative() {
			return Err(ConfigError::NegativeRefreshLead);
		}

		Ok(())
	}
}
impl TryFrom<GatewayConfigBuilder> for GatewayConfig {
	type Error = ConfigError;

	fn try_from(builder: GatewayConfigBuilder) -> Result<Self, Self::Error> {
		builder.build()
	}
}
impl From<GatewayConfig> for GatewayConfigBuilder {
	fn from(config: GatewayConfig) -> Self {
		Self {
			base_url: config.base_url,
			refresh_path: config.refresh_path,
			login_path: config.login_path,
			register_path: config.register_path,
			logout_path: config.logout_path,
			login_route: config.login_route,
			refresh_lead: config.refresh_lead,
		}
	}
}

/// Builder for [`GatewayConfig`] values.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GatewayConfigBuilder {
	/// Backend base URL; API paths are resolved relative to it.
	pub base_url: Url,
	/// Refresh endpoint path.
	#[serde(default = "default_refresh_path")]
	pub refresh_path: String,
	/// Login endpoint path.
	#[serde(default = "default_login_path")]
	pub login_path: String,
	/// Registration endpoint path.
	#[serde(default = "default_register_path")]
	pub register_path: String,
	/// Optional logout endpoint path.
	#[serde(default)]
	pub logout_path: Option<String>,
	/// Route used for forced navigation after an unrecoverable refresh failure.
	#[serde(default = "default_login_route")]
	pub login_route: String,
	/// Lead time before expiry at which the proactive refresh fires.
	#[serde(default = "default_refresh_lead", with = "duration_secs")]
	pub refresh_lead: Duration,
}
impl GatewayConfigBuilder {
	/// Creates a new builder seeded with the default paths.
	pub fn new(base_url: Url) -> Self {
		Self {
			base_url,
			refresh_path: default_refresh_path(),
			login_path: default_login_path(),
			register_path: default_register_path(),
			logout_path: None,
			login_route: default_login_route(),
			refresh_lead: DEFAULT_REFRESH_LEAD,
		}
	}

	/// Overrides the refresh endpoint path.
	pub fn refresh_path(mut self, path: impl Into<String>) -> Self {
		self.refresh_path = path.into();

		self
	}

	/// Overrides the login endpoint path.
	pub fn login_path(mut self, path: impl Into<String>) -> Self {
		self.login_path = path.into();

		self
	}

	/// Overrides the registration endpoint path.
	pub fn register_path(mut self, path: impl Into<String>) -> Self {
		self.register_path = path.into();

		self
	}

	/// Enables backend notification on logout.
	pub fn logout_path(mut self, path: impl Into<String>) -> Self {
		self.logout_path = Some(path.into());

		self
	}

	/// Overrides the forced-navigation route.
	pub fn login_route(mut self, route: impl Into<String>) -> Self {
		self.login_route = route.into();

		self
	}

	/// Overrides the proactive refresh lead time (defaults to 60 seconds).
	pub fn refresh_lead(mut self, lead: Duration) -> Self {
		self.refresh_lead = lead;

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<GatewayConfig, ConfigError> {
		let mut base_url = self.base_url;

		if !base_url.path().ends_with('/') {
			let path = format!("{}/", base_url.path());

			base_url.set_path(&path);
		}

		let config = GatewayConfig {
			base_url,
			refresh_path: self.refresh_path,
			login_path: self.login_path,
			register_path: self.register_path,
			logout_path: self.logout_path,
			login_route: self.login_route,
			refresh_lead: self.refresh_lead,
		};

		config.validate()?;

		Ok(config)
	}
}

fn validate_path(field: &'static str, path: &str) -> Result<(), ConfigError> {
	if path.starts_with('/') && !path.starts_with("//") && !path.contains(char::is_whitespace) {
		Ok(())
	} else {
		Err(ConfigError::InvalidPath { field, path: path.to_owned() })
	}
}

fn normalize_request_path(path: &str) -> &str {
	let path = path.split(['?', '#']).next().unwrap_or_default();
	let path = path.trim_end_matches('/');

	path.strip_prefix('/').unwrap_or(path)
}

fn default_refresh_path() -> String {
	DEFAULT_REFRESH_PATH.into()
}

fn default_login_path() -> String {
	DEFAULT_LOGIN_PATH.into()
}

fn default_register_path() -> String {
	DEFAULT_REGISTER_PATH.into()
}

fn default_login_route() -> String {
	DEFAULT_LOGIN_ROUTE.into()
}

fn default_refresh_lead() -> Duration {
	DEFAULT_REFRESH_LEAD
}

mod duration_secs {
	// crates.io
	use serde::{Deserializer, Serializer};
	// self
	use crate::_prelude::*;

	pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_i64(value.whole_seconds())
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
	where
		D: Deserializer<'de>,
	{
		i64::deserialize(deserializer).map(Duration::seconds)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn base() -> Url {
		Url::parse("https://api.example.com/api").expect("Base URL fixture should parse.")
	}

	#[test]
	fn builder_applies_defaults_and_normalizes_base() {
		let config = GatewayConfig::builder(base()).build().expect("Defaults should validate.");

		assert_eq!(config.base_url().as_str(), "https://api.example.com/api/");
		assert_eq!(config.refresh_path(), "/auth/refresh");
		assert_eq!(config.login_route(), "/login");
		assert_eq!(config.refresh_lead(), Duration::seconds(60));
		assert_eq!(config.logout_path(), None);
		assert_eq!(
			config.endpoint("/auth/refresh").expect("Path should resolve.").as_str(),
			"https://api.example.com/api/auth/refresh"
		);
	}

	#[test]
	fn endpoint_stays_on_the_configured_host() {
		let config = GatewayConfig::builder(base()).build().expect("Defaults should validate.");

		assert!(matches!(
			config.endpoint("https://other.host/steal"),
			Err(ConfigError::AbsoluteRequestPath { .. })
		));
		assert_eq!(
			config.endpoint("//other.host/cards").expect("Path should resolve.").as_str(),
			"https://api.example.com/api/other.host/cards"
		);
	}

	#[test]
	fn credential_paths_ignore_query_and_trailing_slash() {
		let config = GatewayConfig::builder(base()).build().expect("Defaults should validate.");

		assert!(config.is_credential_path("/auth/login"));
		assert!(config.is_credential_path("auth/register/"));
		assert!(config.is_credential_path("/auth/login?next=%2Fdashboard"));
		assert!(!config.is_credential_path("/auth/refresh"));
		assert!(!config.is_credential_path("/auth/login-history"));
	}

	#[test]
	fn builder_rejects_invalid_settings() {
		let err = GatewayConfig::builder(Url::parse("ftp://example.com").expect("URL should parse."))
			.build()
			.expect_err("Non-HTTP schemes should be rejected.");

		assert!(matches!(err, ConfigError::UnsupportedScheme { .. }));

		let err = GatewayConfig::builder(base())
			.refresh_path("auth/refresh")
			.build()
			.expect_err("Relative paths should be rejected.");

		assert!(matches!(err, ConfigError::InvalidPath { field: "refresh", .. }));

		let err = GatewayConfig::builder(base())
			.refresh_lead(Duration::seconds(-1))
			.build()
			.expect_err("Negative lead should be rejected.");

		assert!(matches!(err, ConfigError::NegativeRefreshLead));
	}

	#[test]
	fn deserialization_runs_validation_and_defaults() {
		let config: GatewayConfig = serde_json::from_str(
			r#"{"base_url":"http://localhost:8080","logout_path":"/auth/logout","refresh_lead":90}"#,
		)
		.expect("Config JSON should deserialize.");

		assert_eq!(config.logout_path(), Some("/auth/logout"));
		assert_eq!(config.refresh_lead(), Duration::seconds(90));
		assert_eq!(config.login_path(), "/auth/login");

		let err = serde_json::from_str::<GatewayConfig>(
			r#"{"base_url":"http://localhost:8080","login_route":"login"}"#,
		)
		.expect_err("Invalid route should fail deserialization.");

		assert!(err.to_string().contains("login route"));
	}
}
