#![cfg(feature = "reqwest")]

mod common;

// std
use std::{sync::Arc, time::Duration as StdDuration};
// crates.io
use time::Duration;
use tokio::time::{self as tokio_time, Instant};
// self
use common::*;
use reddit_dispatch::{
	auth::SessionDuration,
	dispatch::ApiRequest,
	login::PasswordGrant,
	ratelimit::{RateLimitHeaders, RateLimiter},
};

#[tokio::test(start_paused = true)]
async fn exhausted_budget_delays_the_next_call_until_reset() {
	let client = ScriptedHttpClient::default();
	let dispatcher = scripted_dispatcher(
		&client,
		password_credentials(),
		Arc::new(PasswordGrant),
		manual_clock(),
	);

	client.script.lock().api_rate_limit = Some(("600", "0", "5"));
	dispatcher
		.login(SessionDuration::Temporary)
		.await
		.expect("Password login should succeed.")
		.detach();
	dispatcher.send(ApiRequest::get("api/v1/me")).await.expect("First call should pass.");

	let limits = dispatcher.rate_limit().await;

	assert_eq!(limits.used, 600);
	assert_eq!(limits.remaining, Some(0));

	let started = Instant::now();

	dispatcher
		.send(ApiRequest::get("api/v1/me"))
		.await
		.expect("The call should go through once the window resets.");

	assert!(started.elapsed() >= StdDuration::from_secs(5));
	assert_eq!(client.bearers().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn remaining_budget_does_not_block() {
	let client = ScriptedHttpClient::default();
	let dispatcher = scripted_dispatcher(
		&client,
		password_credentials(),
		Arc::new(PasswordGrant),
		manual_clock(),
	);

	client.script.lock().api_rate_limit = Some(("10", "590", "300"));
	dispatcher
		.login(SessionDuration::Temporary)
		.await
		.expect("Password login should succeed.")
		.detach();

	let started = Instant::now();

	for _ in 0..3 {
		dispatcher.send(ApiRequest::get("api/v1/me")).await.expect("Calls within budget pass.");
	}

	assert!(started.elapsed() < StdDuration::from_secs(1));
	assert_eq!(dispatcher.rate_limit().await.remaining, Some(590));
}

#[tokio::test(start_paused = true)]
async fn dispatchers_can_share_one_budget() {
	let client = ScriptedHttpClient::default();
	let limiter = Arc::new(RateLimiter::new());
	let first = scripted_dispatcher(
		&client,
		password_credentials(),
		Arc::new(PasswordGrant),
		manual_clock(),
	)
	.with_rate_limiter(Arc::clone(&limiter));
	let second = scripted_dispatcher(
		&client,
		password_credentials(),
		Arc::new(PasswordGrant),
		manual_clock(),
	)
	.with_rate_limiter(Arc::clone(&limiter));

	client.script.lock().api_rate_limit = Some(("600", "0", "5"));

	for dispatcher in [&first, &second] {
		dispatcher
			.login(SessionDuration::Temporary)
			.await
			.expect("Password login should succeed.")
			.detach();
	}

	first.send(ApiRequest::get("api/v1/me")).await.expect("First call should pass.");

	let started = Instant::now();

	second.send(ApiRequest::get("api/v1/me")).await.expect("Second call should pass after reset.");

	assert!(started.elapsed() >= StdDuration::from_secs(5));
	assert_eq!(second.rate_limit().await.used, 600);
}

#[tokio::test(start_paused = true)]
async fn abandoned_wait_never_consumes_budget() {
	let limiter = RateLimiter::with_headers(RateLimitHeaders {
		used: 600,
		remaining: 0,
		reset_after: Duration::seconds(5),
	});

	assert!(
		tokio_time::timeout(StdDuration::from_secs(1), limiter.acquire()).await.is_err(),
		"Acquire should still be waiting for the reset."
	);

	let state = limiter.state().await;

	assert_eq!(state.used, 600);
	assert_eq!(state.remaining, Some(0));
	assert_eq!(state.reset_after, Duration::seconds(4));

	limiter
		.update(Some(&RateLimitHeaders {
			used: 0,
			remaining: 1,
			reset_after: Duration::seconds(60),
		}))
		.await;

	let started = Instant::now();

	limiter.acquire().await;

	assert_eq!(started.elapsed(), StdDuration::ZERO);
	assert_eq!(limiter.state().await.remaining, Some(0));
}
