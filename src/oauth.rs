//! Token endpoint facade over the `oauth2` crate.
//!
//! Every call goes through a [`ThrottledHandle`], so token exchanges and revocations spend the
//! same rate-limit budget as API requests and carry the same User-Agent.

pub use oauth2;

// crates.io
use oauth2::{
	AccessToken, ClientId, ClientSecret, EndpointNotSet, EndpointSet, HttpClientError,
	RefreshToken, RequestTokenError, ResourceOwnerPassword, ResourceOwnerUsername, RevocationUrl,
	StandardRevocableToken, TokenResponse as _, TokenUrl,
	basic::{BasicClient, BasicTokenResponse},
};
// self
use crate::{
	_prelude::*,
	auth::{Credentials, ScopeSet, TokenBuildError, TokenResponse, TokenSecret},
	error::{ConfigError, FailureCause, TransportError},
	http::{ApiHttpClient, ResponseMetadata, ResponseMetadataSlot, ThrottledHandle},
	login::{TokenGrant, TokenRequest},
	provider::ProviderDescriptor,
	ratelimit::RateLimiter,
};

type ConfiguredBasicClient =
	BasicClient<EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet, EndpointSet>;

/// OAuth error body (`{"error": ..., "error_description": ...}`).
#[derive(Debug, Deserialize)]
struct OAuthErrorBody {
	error: String,
	#[serde(default)]
	error_description: Option<String>,
}

/// Which credential a revocation targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RevokedToken {
	Access,
	Refresh,
}

pub(crate) struct TokenEndpoint<'a, C>
where
	C: ?Sized + ApiHttpClient,
{
	oauth_client: ConfiguredBasicClient,
	http_client: &'a C,
	limiter: &'a Arc<RateLimiter>,
	descriptor: &'a ProviderDescriptor,
}
impl<'a, C> TokenEndpoint<'a, C>
where
	C: ?Sized + ApiHttpClient,
{
	pub(crate) fn new(
		descriptor: &'a ProviderDescriptor,
		credentials: &Credentials,
		http_client: &'a C,
		limiter: &'a Arc<RateLimiter>,
	) -> Self {
		// The secret is always set (empty for installed apps) so Basic auth is always sent.
		let oauth_client = BasicClient::new(ClientId::new(credentials.client_id.clone()))
			.set_client_secret(ClientSecret::new(credentials.client_secret.expose().to_owned()))
			.set_token_uri(TokenUrl::from_url(descriptor.endpoints.token.clone()))
			.set_revocation_url(RevocationUrl::from_url(descriptor.endpoints.revocation.clone()));

		Self { oauth_client, http_client, limiter, descriptor }
	}

	fn handle(&self, slot: &ResponseMetadataSlot) -> ThrottledHandle<C> {
		ThrottledHandle::new(
			self.http_client,
			slot.clone(),
			Arc::clone(self.limiter),
			self.descriptor.user_agent.header_value().clone(),
		)
	}

	/// Runs a login grant described by a strategy.
	pub(crate) async fn exchange(&self, request: &TokenRequest) -> Result<TokenResponse> {
		let slot = ResponseMetadataSlot::default();
		let handle = self.handle(&slot);
		let response = match &request.grant {
			TokenGrant::Password { username, password } => {
				let username = ResourceOwnerUsername::new(username.to_string());
				let password = ResourceOwnerPassword::new(password.expose().to_owned());
				let mut exchange = self.oauth_client.exchange_password(&username, &password);

				for (key, value) in &request.extra_params {
					exchange = exchange.add_extra_param(key.as_str(), value.as_str());
				}

				exchange.request_async(&handle).await
			},
			TokenGrant::ClientCredentials => {
				let mut exchange = self.oauth_client.exchange_client_credentials();

				for (key, value) in &request.extra_params {
					exchange = exchange.add_extra_param(key.as_str(), value.as_str());
				}

				exchange.request_async(&handle).await
			},
		}
		.map_err(|err| map_request_error(slot.take(), err))?;

		map_token_response(response)
	}

	/// Exchanges a refresh token through the `refresh_token` grant.
	pub(crate) async fn refresh(&self, refresh_token: &TokenSecret) -> Result<TokenResponse> {
		let slot = ResponseMetadataSlot::default();
		let handle = self.handle(&slot);
		let refresh_token = RefreshToken::new(refresh_token.expose().to_owned());
		let response = self
			.oauth_client
			.exchange_refresh_token(&refresh_token)
			.request_async(&handle)
			.await
			.map_err(|err| map_request_error(slot.take(), err))?;

		map_token_response(response)
	}

	/// Revokes one credential; any 2xx answer counts as success.
	pub(crate) async fn revoke(&self, kind: RevokedToken, secret: &TokenSecret) -> Result<()> {
		let token = match kind {
			RevokedToken::Access =>
				StandardRevocableToken::AccessToken(AccessToken::new(secret.expose().to_owned())),
			RevokedToken::Refresh =>
				StandardRevocableToken::RefreshToken(RefreshToken::new(secret.expose().to_owned())),
		};
		let slot = ResponseMetadataSlot::default();
		let handle = self.handle(&slot);
		let result = self
			.oauth_client
			.revoke_token(token)
			.map_err(ConfigError::from)?
			.request_async(&handle)
			.await;

		match result {
			Ok(()) => Ok(()),
			Err(err) => {
				let meta = slot.take();

				// The provider answers revocations with `204 No Content`, which `oauth2` only
				// accepts as `200`.
				if meta.as_ref().is_some_and(ResponseMetadata::is_success) {
					return Ok(());
				}

				Err(map_request_error(meta, err))
			},
		}
	}
}

fn map_token_response(response: BasicTokenResponse) -> Result<TokenResponse> {
	let expires_in = response
		.expires_in()
		.ok_or(FailureCause::InvalidTokenResponse(TokenBuildError::MissingExpiry))?
		.as_secs();
	// `oauth2` splits the scope on whitespace, so entries are never empty or padded.
	let scope = response
		.scopes()
		.and_then(|scopes| ScopeSet::new(scopes.iter().map(|scope| scope.to_string())).ok())
		.unwrap_or_default();

	Ok(TokenResponse {
		access_token: response.access_token().secret().to_owned(),
		token_type: response.token_type().as_ref().to_owned(),
		expires_in,
		scope,
		refresh_token: response.refresh_token().map(|token| token.secret().to_owned()),
	})
}

fn map_request_error<E, T>(
	meta: Option<ResponseMetadata>,
	err: RequestTokenError<HttpClientError<E>, T>,
) -> Error
where
	E: 'static + Send + Sync + StdError,
	T: oauth2::ErrorResponse,
{
	let status = meta.as_ref().and_then(|meta| meta.status);

	match err {
		RequestTokenError::ServerResponse(response) => {
			let body = serde_json::to_value(&response)
				.ok()
				.and_then(|value| serde_json::from_value::<OAuthErrorBody>(value).ok());

			match body {
				Some(body) => FailureCause::Rejected {
					status,
					error: body.error,
					description: body.error_description,
				},
				None => FailureCause::Rejected {
					status,
					error: response.to_string(),
					description: None,
				},
			}
			.into()
		},
		RequestTokenError::Request(error) => map_http_client_error(error).into(),
		// A `200` carrying an OAuth error body fails token parsing; report it as a rejection.
		RequestTokenError::Parse(source, body) =>
			match serde_json::from_slice::<OAuthErrorBody>(&body) {
				Ok(body) => FailureCause::Rejected {
					status,
					error: body.error,
					description: body.error_description,
				},
				Err(_) => FailureCause::MalformedResponse { source, status },
			}
			.into(),
		RequestTokenError::Other(message) => match status {
			Some(status) => FailureCause::Status {
				status,
				message,
				retry_after: meta.and_then(|meta| meta.retry_after),
			}
			.into(),
			None => TransportError::Other { message }.into(),
		},
	}
}

/// Converts an [`HttpClientError`] into the crate's transport error.
pub(crate) fn map_http_client_error<E>(err: HttpClientError<E>) -> TransportError
where
	E: 'static + Send + Sync + StdError,
{
	match err {
		HttpClientError::Reqwest(inner) => TransportError::network(*inner),
		HttpClientError::Http(inner) => TransportError::Request(inner),
		HttpClientError::Io(inner) => TransportError::Io(inner),
		HttpClientError::Other(message) => TransportError::Other { message },
		_ => TransportError::Other { message: "Unknown HTTP client failure.".into() },
	}
}
