mod common;

// crates.io
use time::Duration;
// self
use common::*;
use session_gateway::auth::AccessToken;

async fn advance(seconds: u64) {
	tokio::time::sleep(std::time::Duration::from_secs(seconds)).await;
}

#[tokio::test(start_paused = true)]
async fn timer_fires_one_lead_before_expiry() {
	let minted = jwt_expiring_in(Duration::hours(2), "user-1");
	let (gateway, transport, store, navigator) =
		fake_gateway(FakeTransport::refreshing_to(minted.clone()));
	let token = AccessToken::new(jwt_expiring_in(Duration::minutes(5), "user-1"));
	let expires_at = token.expires_at().expect("Fixture token should carry an expiry.");
	let fire_at = gateway.schedule_proactive_refresh(&token).expect("Timer should be armed.");

	assert_eq!(fire_at, expires_at - Duration::seconds(60));

	advance(200).await;

	assert_eq!(transport.refresh_calls(), 0);

	advance(100).await;

	assert_eq!(transport.refresh_calls(), 1);
	assert_eq!(
		store.snapshot().map(|credentials| credentials.access_token.secret().expose().to_owned()),
		Some(minted.clone())
	);
	assert!(navigator.routes().is_empty());

	let next = AccessToken::new(minted).expires_at().expect("Minted token should carry an expiry.");

	assert_eq!(gateway.scheduled_refresh_at(), Some(next - Duration::seconds(60)));
}

#[tokio::test(start_paused = true)]
async fn rearming_replaces_the_previous_timer() {
	let (gateway, transport, _, _) = fake_gateway(FakeTransport::refreshing_to(
		jwt_expiring_in(Duration::hours(2), "user-1"),
	));
	let first = AccessToken::new(jwt_expiring_in(Duration::minutes(5), "user-1"));
	let second = AccessToken::new(jwt_expiring_in(Duration::minutes(10), "user-1"));

	gateway.schedule_proactive_refresh(&first).expect("First timer should be armed.");

	let second_fire_at =
		gateway.schedule_proactive_refresh(&second).expect("Second timer should be armed.");

	assert_eq!(gateway.scheduled_refresh_at(), Some(second_fire_at));

	advance(300).await;

	assert_eq!(transport.refresh_calls(), 0);

	advance(300).await;

	assert_eq!(transport.refresh_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn elapsed_fire_time_is_not_scheduled() {
	let (gateway, transport, _, _) = fake_gateway(FakeTransport::refreshing_to("access-new"));
	let armed = AccessToken::new(jwt_expiring_in(Duration::minutes(5), "user-1"));
	let nearly_expired = AccessToken::new(jwt_expiring_in(Duration::seconds(30), "user-1"));
	let fire_at = gateway.schedule_proactive_refresh(&armed).expect("Timer should be armed.");

	assert_eq!(gateway.schedule_proactive_refresh(&nearly_expired), None);
	assert_eq!(gateway.scheduled_refresh_at(), Some(fire_at));

	gateway.cancel_proactive_refresh();
	advance(600).await;

	assert_eq!(transport.refresh_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn opaque_token_disables_proactive_refresh() {
	let (gateway, transport, _, _) = fake_gateway(FakeTransport::refreshing_to("access-new"));

	assert_eq!(gateway.schedule_proactive_refresh(&AccessToken::new("not-a-jwt")), None);
	assert_eq!(gateway.scheduled_refresh_at(), None);

	advance(3_600).await;

	assert_eq!(transport.refresh_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn logout_cancels_the_timer() {
	let (gateway, transport, store, _) = fake_gateway(FakeTransport::refreshing_to("access-new"));
	let token = jwt_expiring_in(Duration::minutes(5), "user-1");

	seed_session(&store, &token).await;
	gateway.schedule_proactive_refresh(&AccessToken::new(token)).expect("Timer should be armed.");
	gateway.logout().await.expect("Local logout should succeed.");

	assert_eq!(gateway.scheduled_refresh_at(), None);
	assert!(store.snapshot().is_none());

	advance(600).await;

	assert_eq!(transport.refresh_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn restore_arms_the_timer_for_persisted_credentials() {
	let (gateway, _, store, _) = fake_gateway(FakeTransport::refreshing_to("access-new"));
	let token = AccessToken::new(jwt_expiring_in(Duration::minutes(30), "user-1"));
	let expires_at = token.expires_at().expect("Fixture token should carry an expiry.");

	seed_session(&store, token.secret().expose()).await;

	let restored =
		gateway.restore().await.expect("Restore should succeed.").expect("Session should exist.");

	assert_eq!(restored.access_token, token);
	assert_eq!(gateway.scheduled_refresh_at(), Some(expires_at - Duration::seconds(60)));
}

#[tokio::test(start_paused = true)]
async fn failed_proactive_refresh_ends_the_session() {
	let (gateway, transport, store, navigator) = fake_gateway(FakeTransport::failing_refresh(500));
	let token = jwt_expiring_in(Duration::minutes(5), "user-1");

	seed_session(&store, &token).await;
	gateway.schedule_proactive_refresh(&AccessToken::new(token)).expect("Timer should be armed.");

	advance(300).await;

	assert_eq!(transport.refresh_calls(), 1);
	assert!(store.snapshot().is_none());
	assert_eq!(navigator.routes(), vec!["/login".to_owned()]);
	assert_eq!(gateway.scheduled_refresh_at(), None);
}
