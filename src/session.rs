//! Injected session context: storage contract and built-in backends for the credential pair.
//!
//! The gateway is the only writer. Other components hold the same `Arc<dyn SessionStore>` and
//! read the current user or token from it instead of reaching for ambient global state.

pub mod file;
pub mod memory;

pub use file::FileSessionStore;
pub use memory::MemorySessionStore;

// self
use crate::{_prelude::*, auth::SessionCredentials};

/// Boxed future returned by [`SessionStore`] methods.
pub type SessionFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, SessionError>> + 'a + Send>>;

/// Storage backend contract for the session credential pair.
pub trait SessionStore
where
	Self: Send + Sync,
{
	/// Returns the current credentials, if a session is active.
	fn load(&self) -> SessionFuture<'_, Option<SessionCredentials>>;

	/// Persists or replaces the current credentials.
	fn save(&self, credentials: SessionCredentials) -> SessionFuture<'_, ()>;

	/// Removes the current credentials, returning what was stored.
	fn clear(&self) -> SessionFuture<'_, Option<SessionCredentials>>;
}

/// Error type produced by [`SessionStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum SessionError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

#[cfg(test)]
mod tests {
	// std
	use std::error::Error as StdError;
	// self
	use super::*;

	#[test]
	fn session_error_converts_into_gateway_error_with_source() {
		let session_error = SessionError::Backend { message: "disk full".into() };
		let gateway_error: Error = session_error.clone().into();

		assert!(matches!(gateway_error, Error::Session(_)));
		assert!(gateway_error.to_string().contains("disk full"));

		let source = StdError::source(&gateway_error)
			.expect("Gateway error should expose the original session error as its source.");

		assert_eq!(source.to_string(), session_error.to_string());
	}
}
