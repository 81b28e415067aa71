//! Logs in with the password grant against a local mock provider, calls `/api/v1/me`, and
//! logs out again.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde::Deserialize;
// self
use reddit_dispatch::{
	auth::{Credentials, SessionDuration, Username},
	dispatch::{ApiRequest, Dispatcher},
	http::ReqwestHttpClient,
	login::PasswordGrant,
	provider::{ProviderDescriptor, UserAgent},
	reqwest::Client,
	url::Url,
};

#[derive(Debug, Deserialize)]
struct Me {
	name: String,
	link_karma: i64,
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v1/access_token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-access\",\"token_type\":\"bearer\",\"expires_in\":3600,\"scope\":\"*\"}",
			);
		})
		.await;
	let me_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/v1/me").header("authorization", "Bearer demo-access");
			then.status(200)
				.header("content-type", "application/json")
				.header("x-ratelimit-used", "1")
				.header("x-ratelimit-remaining", "599.0")
				.header("x-ratelimit-reset", "420")
				.body("{\"name\":\"demo_user\",\"link_karma\":42}");
		})
		.await;
	let revoke_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v1/revoke_token");
			then.status(204);
		})
		.await;
	let username = Username::new("demo_user")?;
	let descriptor =
		ProviderDescriptor::builder(UserAgent::for_app("linux", "demo-app", "0.1.0", &username)?)
			.token_endpoint(Url::parse(&server.url("/api/v1/access_token"))?)
			.revocation_endpoint(Url::parse(&server.url("/api/v1/revoke_token"))?)
			.api_base(Url::parse(&server.url("/"))?)
			.build()?;
	let http_client = ReqwestHttpClient::with_client(
		Client::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()?,
	);
	let dispatcher = <Dispatcher<ReqwestHttpClient>>::with_http_client(
		descriptor,
		Credentials::app("demo-client", "demo-secret").with_user(username, "demo-password"),
		Arc::new(PasswordGrant),
		http_client,
	);
	let session = dispatcher.login(SessionDuration::Temporary).await?;
	let me = session.send(ApiRequest::get("api/v1/me")).await?.json::<Me>()?;
	let limits = dispatcher.rate_limit().await;

	println!("Logged in as {} with {} link karma.", me.name, me.link_karma);
	println!("Rate limit: {} used, {:?} remaining.", limits.used, limits.remaining);

	session.logout().await?;

	token_mock.assert_async().await;
	me_mock.assert_async().await;
	revoke_mock.assert_async().await;

	Ok(())
}
