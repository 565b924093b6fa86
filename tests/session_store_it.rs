mod common;

// std
use std::sync::Arc;
// crates.io
use time::Duration;
// self
use common::*;
use session_gateway::{
	auth::{AccessToken, SessionCredentials, UserProfile},
	session::{FileSessionStore, MemorySessionStore, SessionStore},
};

fn credentials(token: &str) -> SessionCredentials {
	SessionCredentials::new(
		AccessToken::new(token),
		UserProfile(serde_json::json!({ "id": 7, "email": "asha@example.test" })),
	)
}

#[tokio::test]
async fn memory_store_is_shared_between_handles() {
	let store = MemorySessionStore::default();
	let reader: Arc<dyn SessionStore> = Arc::new(store.clone());

	assert!(reader.load().await.expect("Empty load should succeed.").is_none());

	store.save(credentials("access-1")).await.expect("Saving credentials should succeed.");

	let loaded =
		reader.load().await.expect("Load should succeed.").expect("Session should be visible.");

	assert_eq!(loaded.access_token.secret().expose(), "access-1");
	assert_eq!(loaded.user.get("email"), Some(&serde_json::json!("asha@example.test")));

	store.save(credentials("access-2")).await.expect("Replacing credentials should succeed.");

	let cleared = reader.clear().await.expect("Clear should succeed.");

	assert_eq!(cleared.map(|c| c.access_token), Some(AccessToken::new("access-2")));
	assert!(store.snapshot().is_none());
	assert!(reader.clear().await.expect("Clearing twice should succeed.").is_none());
}

#[tokio::test]
async fn file_store_survives_reopen() {
	let path = std::env::temp_dir()
		.join(format!("session-gateway-it-{}", std::process::id()))
		.join("session.json");
	let token = jwt_expiring_in(Duration::hours(1), "user-7");
	let store = FileSessionStore::open(&path).expect("Opening file store should succeed.");

	store.save(credentials(&token)).await.expect("Persisting credentials should succeed.");

	let reopened = FileSessionStore::open(&path).expect("Reopening file store should succeed.");
	let loaded = reopened
		.load()
		.await
		.expect("Load should succeed.")
		.expect("Persisted session should be restored.");

	assert_eq!(loaded.access_token.secret().expose(), token);
	assert!(loaded.expires_at().is_some());

	reopened.clear().await.expect("Clearing file store should succeed.");

	assert!(!path.exists());
	assert!(
		FileSessionStore::open(&path)
			.expect("Reopening cleared store should succeed.")
			.load()
			.await
			.expect("Load should succeed.")
			.is_none()
	);
}
