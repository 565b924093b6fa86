//! Thread-safe in-memory [`SessionStore`] for browser-like lifetimes and tests.

// self
use crate::{
	_prelude::*,
	auth::SessionCredentials,
	session::{SessionFuture, SessionStore},
};

/// Keeps the credential pair in-process; the session ends with the process.
#[derive(Clone, Debug, Default)]
pub struct MemorySessionStore(Arc<RwLock<Option<SessionCredentials>>>);
impl MemorySessionStore {
	/// Creates a store already holding `credentials`.
	pub fn with_credentials(credentials: SessionCredentials) -> Self {
		Self(Arc::new(RwLock::new(Some(credentials))))
	}

	/// Synchronous snapshot for callers outside an async context.
	pub fn snapshot(&self) -> Option<SessionCredentials> {
		self.0.read().clone()
	}
}
impl SessionStore for MemorySessionStore {
	fn load(&self) -> SessionFuture<'_, Option<SessionCredentials>> {
		let slot = self.0.clone();

		Box::pin(async move { Ok(slot.read().clone()) })
	}

	fn save(&self, credentials: SessionCredentials) -> SessionFuture<'_, ()> {
		let slot = self.0.clone();

		Box::pin(async move {
			*slot.write() = Some(credentials);

			Ok(())
		})
	}

	fn clear(&self) -> SessionFuture<'_, Option<SessionCredentials>> {
		let slot = self.0.clone();

		Box::pin(async move { Ok(slot.write().take()) })
	}
}
