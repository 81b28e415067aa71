//! Shared fixtures for the integration tests.

#![allow(dead_code)]

// std
use std::{
	collections::HashMap, future::Future, pin::Pin, sync::Arc, time::Duration as StdDuration,
};
// crates.io
use httpmock::MockServer;
use parking_lot::Mutex;
use time::macros;
// self
use reddit_dispatch::{
	auth::{Credentials, Username},
	clock::ManualClock,
	dispatch::Dispatcher,
	http::{ApiHttpClient, ReqwestHttpClient, ResponseMetadata, ResponseMetadataSlot},
	login::LoginStrategy,
	oauth::oauth2::{
		AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse,
		http::{
			HeaderName, HeaderValue, StatusCode,
			header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT},
		},
	},
	provider::{ProviderDescriptor, UserAgent},
	reqwest::Client as ReqwestClient,
	url::Url,
};

pub const CLIENT_ID: &str = "dispatch-client";
pub const CLIENT_SECRET: &str = "dispatch-secret";
pub const USERNAME: &str = "spez";
pub const PASSWORD: &str = "hunter2";
pub const AGENT: &str = "test:reddit-dispatch:0.1.0 (by /u/spez)";

pub fn user_agent() -> UserAgent {
	UserAgent::new(AGENT).expect("User-Agent fixture should be valid.")
}

pub fn password_credentials() -> Credentials {
	Credentials::app(CLIENT_ID, CLIENT_SECRET)
		.with_user(Username::new(USERNAME).expect("Username fixture should be valid."), PASSWORD)
}

pub fn manual_clock() -> Arc<ManualClock> {
	Arc::new(ManualClock::new(macros::datetime!(2025-01-01 00:00 UTC)))
}

/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
/// `httpmock` during tests.
pub fn test_reqwest_http_client() -> ReqwestHttpClient {
	let client = ReqwestClient::builder()
		.danger_accept_invalid_certs(true)
		.danger_accept_invalid_hostnames(true)
		.build()
		.expect("Failed to build insecure Reqwest client for tests.");

	ReqwestHttpClient::with_client(client)
}

/// Descriptor pointing every endpoint at the mock server.
pub fn mock_descriptor(server: &MockServer) -> ProviderDescriptor {
	let url = |path: &str| {
		Url::parse(&server.url(path)).expect("Mock endpoint URL should parse successfully.")
	};

	ProviderDescriptor::builder(user_agent())
		.token_endpoint(url("/api/v1/access_token"))
		.revocation_endpoint(url("/api/v1/revoke_token"))
		.api_base(url("/"))
		.build()
		.expect("Mock provider descriptor should build successfully.")
}

pub fn reqwest_dispatcher(
	server: &MockServer,
	strategy: Arc<dyn LoginStrategy>,
	clock: Arc<ManualClock>,
) -> Dispatcher<ReqwestHttpClient> {
	Dispatcher::with_http_client(
		mock_descriptor(server),
		password_credentials(),
		strategy,
		test_reqwest_http_client(),
	)
	.with_clock(clock)
}

pub fn scripted_dispatcher(
	client: &ScriptedHttpClient,
	credentials: Credentials,
	strategy: Arc<dyn LoginStrategy>,
	clock: Arc<ManualClock>,
) -> Dispatcher<ScriptedHttpClient> {
	let descriptor =
		ProviderDescriptor::reddit(user_agent()).expect("Production descriptor should build.");

	Dispatcher::with_http_client(descriptor, credentials, strategy, client.clone()).with_clock(clock)
}

#[derive(Debug, thiserror::Error)]
#[error("Scripted transport is offline.")]
pub struct ScriptedError;

/// Knobs controlling how the scripted provider answers.
#[derive(Debug, Default)]
pub struct Script {
	/// Every call fails before a response is produced.
	pub offline: bool,
	/// Access-token revocations answer `500`.
	pub fail_access_revoke: bool,
	/// Status returned by API calls (defaults to `200`).
	pub api_status: Option<u16>,
	/// Rate-limit headers attached to API responses as `(used, remaining, reset)`.
	pub api_rate_limit: Option<(&'static str, &'static str, &'static str)>,
	/// Durable logins (other than the password grant) receive a refresh token.
	pub issue_refresh_tokens: bool,
	/// Access-token lifetime in seconds.
	pub expires_in: Option<u64>,
}

/// Everything the scripted provider saw.
#[derive(Debug, Default)]
pub struct Recorded {
	/// `grant_type` of every token endpoint call.
	pub token_grants: Vec<String>,
	/// Form fields of every token endpoint call.
	pub token_forms: Vec<HashMap<String, String>>,
	/// `token_type_hint` of every revocation call.
	pub revocations: Vec<String>,
	/// `Authorization` header of every API call.
	pub bearers: Vec<String>,
	/// `User-Agent` of every call.
	pub user_agents: Vec<String>,
}

/// In-memory provider that answers token, revoke and API calls from a script.
#[derive(Clone, Debug, Default)]
pub struct ScriptedHttpClient {
	pub script: Arc<Mutex<Script>>,
	pub recorded: Arc<Mutex<Recorded>>,
}
impl ScriptedHttpClient {
	pub fn token_grants(&self) -> Vec<String> {
		self.recorded.lock().token_grants.clone()
	}

	pub fn revocations(&self) -> Vec<String> {
		self.recorded.lock().revocations.clone()
	}

	pub fn bearers(&self) -> Vec<String> {
		self.recorded.lock().bearers.clone()
	}

	fn respond(&self, request: &HttpRequest) -> HttpResponse {
		let form: HashMap<String, String> =
			url::form_urlencoded::parse(request.body()).into_owned().collect();
		let header = |name: HeaderName| {
			request
				.headers()
				.get(name)
				.and_then(|value: &HeaderValue| value.to_str().ok())
				.unwrap_or_default()
				.to_owned()
		};
		let script = self.script.lock();
		let mut recorded = self.recorded.lock();

		recorded.user_agents.push(header(USER_AGENT));

		match request.uri().path() {
			"/api/v1/access_token" => {
				let grant = form.get("grant_type").cloned().unwrap_or_default();

				recorded.token_grants.push(grant.clone());
				recorded.token_forms.push(form.clone());

				let serial = recorded.token_grants.len();
				let durable = form.get("duration").map(String::as_str) == Some("permanent");
				let refresh = if script.issue_refresh_tokens && durable && grant != "refresh_token" {
					format!(",\"refresh_token\":\"refresh-{serial}\"")
				} else {
					String::new()
				};
				let body = format!(
					"{{\"access_token\":\"access-{serial}\",\"token_type\":\"bearer\",\"expires_in\":{},\"scope\":\"*\"{refresh}}}",
					script.expires_in.unwrap_or(3600)
				);

				json_response(StatusCode::OK, body)
			},
			"/api/v1/revoke_token" => {
				let hint = form.get("token_type_hint").cloned().unwrap_or_default();
				let fail = script.fail_access_revoke && hint == "access_token";

				recorded.revocations.push(hint);

				if fail {
					json_response(
						StatusCode::INTERNAL_SERVER_ERROR,
						"{\"error\":\"server_error\"}".into(),
					)
				} else {
					let mut response = HttpResponse::new(Vec::new());

					*response.status_mut() = StatusCode::NO_CONTENT;

					response
				}
			},
			_ => {
				recorded.bearers.push(header(AUTHORIZATION));

				let status = script
					.api_status
					.and_then(|code| StatusCode::from_u16(code).ok())
					.unwrap_or(StatusCode::OK);
				let body = if status.is_success() {
					"{\"name\":\"spez\"}".to_owned()
				} else {
					format!("{{\"message\":\"Scripted failure\",\"error\":{}}}", status.as_u16())
				};
				let mut response = json_response(status, body);

				if let Some((used, remaining, reset)) = script.api_rate_limit {
					let headers = response.headers_mut();

					headers.insert("x-ratelimit-used", HeaderValue::from_static(used));
					headers.insert("x-ratelimit-remaining", HeaderValue::from_static(remaining));
					headers.insert("x-ratelimit-reset", HeaderValue::from_static(reset));
				}

				response
			},
		}
	}
}
impl ApiHttpClient for ScriptedHttpClient {
	type Handle = ScriptedHandle;
	type TransportError = ScriptedError;

	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle {
		ScriptedHandle { client: self.clone(), slot }
	}
}

pub struct ScriptedHandle {
	client: ScriptedHttpClient,
	slot: ResponseMetadataSlot,
}
impl<'c> AsyncHttpClient<'c> for ScriptedHandle {
	type Error = HttpClientError<ScriptedError>;
	type Future = Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		let client = self.client.clone();
		let slot = self.slot.clone();

		Box::pin(async move {
			slot.take();

			// Yield so concurrent callers genuinely interleave.
			tokio::time::sleep(StdDuration::from_millis(5)).await;

			if client.script.lock().offline {
				return Err(HttpClientError::Reqwest(Box::new(ScriptedError)));
			}

			let response = client.respond(&request);

			slot.store(ResponseMetadata {
				status: Some(response.status().as_u16()),
				retry_after: None,
			});

			Ok(response)
		})
	}
}

fn json_response(status: StatusCode, body: String) -> HttpResponse {
	let mut response = HttpResponse::new(body.into_bytes());

	*response.status_mut() = status;
	response.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

	response
}
