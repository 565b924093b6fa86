//! Demonstrates the gateway recovering from a server-side token expiry: sign in, hit a
//! protected endpoint that rejects the stale token, and let the shared refresh replay the call.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use session_gateway::{
	config::GatewayConfig,
	gateway::ReqwestGateway,
	navigation::FnNavigator,
	session::{MemorySessionStore, SessionStore},
	url::Url,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let login = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/login");
			then.status(200).header("content-type", "application/json").body(
				"{\"accessToken\":\"demo-access-1\",\"data\":{\"id\":1,\"email\":\"demo@example.test\"}}",
			);
		})
		.await;
	let stale = server
		.mock_async(|when, then| {
			when.method(GET).path("/me").header("authorization", "Bearer demo-access-1");
			then.status(401).body("{\"message\":\"jwt expired\"}");
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"accessToken\":\"demo-access-2\",\"data\":{\"id\":1}}");
		})
		.await;
	let me = server
		.mock_async(|when, then| {
			when.method(GET).path("/me").header("authorization", "Bearer demo-access-2");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"id\":1,\"email\":\"demo@example.test\"}");
		})
		.await;
	let config = GatewayConfig::builder(Url::parse(&server.base_url())?).build()?;
	let session: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::default());
	let navigator = Arc::new(FnNavigator::new(|route: &str| println!("navigate -> {route}")));
	let gateway = ReqwestGateway::new(config, session.clone(), navigator)?;
	let credentials = gateway
		.login(&serde_json::json!({ "email": "demo@example.test", "password": "demo" }))
		.await?;

	println!("signed in as {:?}", credentials.user.get("email"));

	let profile: serde_json::Value = gateway.get("/me").await?.json()?;

	println!("profile after transparent refresh: {profile}");
	println!(
		"refresh attempts: {}, replays: {}",
		gateway.metrics().attempts(),
		gateway.metrics().replays()
	);

	login.assert_async().await;
	stale.assert_async().await;
	refresh.assert_async().await;
	me.assert_async().await;

	if let Some(current) = session.load().await? {
		println!("session now holds {}", current.access_token.secret());
	}

	gateway.logout().await?;

	Ok(())
}
