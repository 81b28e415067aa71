#![cfg(feature = "reqwest")]

mod common;

// std
use std::sync::Arc;
// crates.io
use serde::Deserialize;
use time::Duration;
// self
use common::*;
use reddit_dispatch::{
	auth::{Credentials, DeviceId, SessionDuration, Token},
	dispatch::ApiRequest,
	error::{ConfigError, Error, FailureCause, Result},
	login::{
		GrantType, LoginStrategy, PasswordGrant, Renewal, TokenGrant, TokenRequest, UserlessGrant,
	},
};

#[derive(Debug)]
struct DurableApp;
impl LoginStrategy for DurableApp {
	fn grant_type(&self) -> GrantType {
		GrantType::ClientCredentials
	}

	fn token_request(&self, _: &Credentials, duration: SessionDuration) -> Result<TokenRequest> {
		Ok(TokenRequest::new(TokenGrant::ClientCredentials).param("duration", duration.as_str()))
	}
}

/// Durable app login whose renewal logs in again instead of using the refresh token.
#[derive(Debug)]
struct RelogApp;
impl LoginStrategy for RelogApp {
	fn grant_type(&self) -> GrantType {
		GrantType::ClientCredentials
	}

	fn token_request(&self, _: &Credentials, duration: SessionDuration) -> Result<TokenRequest> {
		Ok(TokenRequest::new(TokenGrant::ClientCredentials).param("duration", duration.as_str()))
	}

	fn renewal(&self, _: &Token) -> Renewal {
		Renewal::Login(SessionDuration::Permanent)
	}
}

#[derive(Debug, Deserialize)]
struct Me {
	name: String,
}

fn failure_cause(result: &Result<impl Sized>) -> Option<&FailureCause> {
	result.as_ref().err().and_then(Error::as_failed_request).map(|failed| failed.cause())
}

#[tokio::test]
async fn transport_outage_is_a_failed_request() {
	let client = ScriptedHttpClient::default();
	let dispatcher = scripted_dispatcher(
		&client,
		password_credentials(),
		Arc::new(PasswordGrant),
		manual_clock(),
	);

	client.script.lock().offline = true;

	let login = dispatcher.login(SessionDuration::Temporary).await;

	assert!(matches!(failure_cause(&login), Some(FailureCause::Transport(_))));
	assert!(!dispatcher.is_logged_in().await);
	assert_eq!(dispatcher.metrics.failures(), 1);
}

#[tokio::test]
async fn api_statuses_surface_with_the_provider_message() {
	let client = ScriptedHttpClient::default();
	let dispatcher = scripted_dispatcher(
		&client,
		password_credentials(),
		Arc::new(PasswordGrant),
		manual_clock(),
	);
	let session =
		dispatcher.login(SessionDuration::Temporary).await.expect("Password login should succeed.");
	let me = session
		.send(ApiRequest::get("api/v1/me"))
		.await
		.expect("The scripted API should answer.")
		.json::<Me>()
		.expect("The scripted body should decode.");

	assert_eq!(me.name, "spez");

	client.script.lock().api_status = Some(403);

	let denied = session.send(ApiRequest::get("api/v1/me")).await;

	assert!(matches!(
		failure_cause(&denied),
		Some(FailureCause::Status { status: 403, message, retry_after: None })
			if message == "Scripted failure"
	));
	assert!(dispatcher.is_logged_in().await, "API failures must not drop the token.");

	client.script.lock().offline = true;

	let offline = session.send(ApiRequest::get("api/v1/me")).await;

	assert!(matches!(failure_cause(&offline), Some(FailureCause::Transport(_))));

	let _ = session.detach();
}

#[tokio::test]
async fn explicit_refresh_uses_the_refresh_grant_and_keeps_the_refresh_token() {
	let client = ScriptedHttpClient::default();

	client.script.lock().issue_refresh_tokens = true;

	let dispatcher = scripted_dispatcher(
		&client,
		Credentials::app(CLIENT_ID, CLIENT_SECRET),
		Arc::new(DurableApp),
		manual_clock(),
	);

	assert!(matches!(dispatcher.refresh().await, Err(Error::NotLoggedIn)));

	dispatcher
		.login(SessionDuration::Permanent)
		.await
		.expect("Durable login should succeed.")
		.detach();
	dispatcher.refresh().await.expect("Refresh should succeed while a refresh token is held.");

	let token = dispatcher.token().await.expect("Refreshed token should be held.");

	assert_eq!(client.token_grants(), vec!["client_credentials", "refresh_token"]);
	assert_eq!(token.access_token.expose(), "access-2");
	assert_eq!(token.refresh_token.as_ref().map(|secret| secret.expose()), Some("refresh-1"));

	let forms = client.recorded.lock().token_forms.clone();

	assert_eq!(forms[1].get("refresh_token").map(String::as_str), Some("refresh-1"));
}

#[tokio::test]
async fn ephemeral_tokens_cannot_be_refreshed() {
	let client = ScriptedHttpClient::default();
	let dispatcher = scripted_dispatcher(
		&client,
		Credentials::app(CLIENT_ID, CLIENT_SECRET),
		Arc::new(DurableApp),
		manual_clock(),
	);

	dispatcher
		.login(SessionDuration::Temporary)
		.await
		.expect("Ephemeral login should succeed.")
		.detach();

	let refreshed = dispatcher.refresh().await;

	assert!(matches!(failure_cause(&refreshed), Some(FailureCause::MissingRefreshToken)));
	assert_eq!(client.token_grants(), vec!["client_credentials"]);
}

#[tokio::test]
async fn userless_logins_send_the_device_id() {
	let client = ScriptedHttpClient::default();
	let dispatcher = scripted_dispatcher(
		&client,
		Credentials::app(CLIENT_ID, CLIENT_SECRET),
		Arc::new(UserlessGrant::untracked()),
		manual_clock(),
	);

	dispatcher
		.login(SessionDuration::Temporary)
		.await
		.expect("Userless login should succeed.")
		.detach();

	let forms = client.recorded.lock().token_forms.clone();

	assert_eq!(forms.len(), 1);
	assert_eq!(forms[0].get("grant_type").map(String::as_str), Some("client_credentials"));
	assert_eq!(forms[0].get("device_id").map(String::as_str), Some(DeviceId::UNTRACKED));
	assert_eq!(forms[0].get("duration").map(String::as_str), Some("temporary"));
}

#[tokio::test]
async fn configuration_errors_never_reach_the_network() {
	let client = ScriptedHttpClient::default();
	let app_only = scripted_dispatcher(
		&client,
		Credentials::app(CLIENT_ID, CLIENT_SECRET),
		Arc::new(PasswordGrant),
		manual_clock(),
	);

	assert!(matches!(
		app_only.login(SessionDuration::Temporary).await,
		Err(Error::Config(ConfigError::MissingUserCredentials))
	));

	let session = scripted_dispatcher(
		&client,
		password_credentials(),
		Arc::new(PasswordGrant),
		manual_clock(),
	);

	session
		.login(SessionDuration::Temporary)
		.await
		.expect("Password login should succeed.")
		.detach();

	assert!(matches!(
		session.send(ApiRequest::get("https://evil.example/steal")).await,
		Err(Error::Config(ConfigError::RequestOutsideApi { .. }))
	));
	assert_eq!(client.token_grants(), vec!["password"]);
	assert!(client.bearers().is_empty());
}

#[tokio::test]
async fn userless_sessions_never_hold_a_refresh_token() {
	let client = ScriptedHttpClient::default();

	client.script.lock().issue_refresh_tokens = true;

	let dispatcher = scripted_dispatcher(
		&client,
		Credentials::app(CLIENT_ID, CLIENT_SECRET),
		Arc::new(UserlessGrant::untracked()),
		manual_clock(),
	);

	dispatcher
		.login(SessionDuration::Permanent)
		.await
		.expect("Userless login should succeed.")
		.detach();

	let token = dispatcher.token().await.expect("Userless token should be held.");

	assert!(token.refresh_token.is_none(), "A userless session must not keep a refresh token.");

	dispatcher.refresh().await.expect("Userless refresh should log in again.");
	dispatcher.logout().await.expect("Logout should succeed.");

	assert_eq!(client.token_grants(), vec!["client_credentials", "client_credentials"]);
	assert_eq!(client.revocations(), vec!["access_token"]);
}

#[tokio::test]
async fn relogin_renewal_revokes_the_displaced_refresh_token() {
	let client = ScriptedHttpClient::default();

	client.script.lock().issue_refresh_tokens = true;

	let dispatcher = scripted_dispatcher(
		&client,
		Credentials::app(CLIENT_ID, CLIENT_SECRET),
		Arc::new(RelogApp),
		manual_clock(),
	);

	dispatcher
		.login(SessionDuration::Permanent)
		.await
		.expect("Durable login should succeed.")
		.detach();
	dispatcher.refresh().await.expect("Re-login renewal should succeed.");

	let token = dispatcher.token().await.expect("Renewed token should be held.");

	assert_eq!(token.refresh_token.as_ref().map(|secret| secret.expose()), Some("refresh-2"));
	assert_eq!(client.revocations(), vec!["refresh_token"]);

	assert_eq!(client.token_grants(), vec!["client_credentials"; 2]);

	dispatcher.logout().await.expect("Logout should succeed.");

	assert_eq!(client.revocations(), vec!["refresh_token", "access_token", "refresh_token"]);
}

#[tokio::test]
async fn userless_renewals_post_one_ephemeral_login() {
	let client = ScriptedHttpClient::default();
	let clock = manual_clock();
	let dispatcher = scripted_dispatcher(
		&client,
		Credentials::app(CLIENT_ID, CLIENT_SECRET),
		Arc::new(UserlessGrant::untracked()),
		clock.clone(),
	);

	dispatcher
		.login(SessionDuration::Temporary)
		.await
		.expect("Userless login should succeed.")
		.detach();
	dispatcher.refresh().await.expect("Userless refresh should log in again.");

	assert_eq!(client.token_grants(), vec!["client_credentials"; 2]);

	clock.advance(Duration::hours(2));

	dispatcher
		.send(ApiRequest::get("api/v1/me"))
		.await
		.expect("Send should renew the expired token and succeed.");

	let forms = client.recorded.lock().token_forms.clone();

	assert_eq!(client.token_grants(), vec!["client_credentials"; 3]);
	assert!(
		forms[1..]
			.iter()
			.all(|form| form.get("duration").map(String::as_str) == Some("temporary"))
	);
	assert_eq!(client.bearers(), vec!["Bearer access-3"]);
}
