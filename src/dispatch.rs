//! Authenticated request dispatcher.
//!
//! [`Dispatcher`] owns the current token, the rate limiter and the transport. All token state
//! transitions and API calls run inside one async critical section per instance, so when several
//! callers find the token expired at once, exactly one of them renews it and the rest reuse the
//! result.

mod metrics;
mod request;
mod session;

pub use metrics::DispatchMetrics;
pub use request::*;
pub use session::Session;

// crates.io
use oauth2::{
	AsyncHttpClient, HttpRequest, HttpResponse,
	http::{
		HeaderValue, Request,
		header::{AUTHORIZATION, CONTENT_TYPE},
	},
};
// self
use crate::{
	_prelude::*,
	auth::{Credentials, SessionDuration, Token},
	clock::{Clock, SystemClock},
	error::{FailureCause, TransportError},
	http::{ApiHttpClient, ResponseMetadata, ResponseMetadataSlot, ThrottledHandle},
	login::{LoginStrategy, Renewal},
	oauth::{self, RevokedToken, TokenEndpoint},
	obs::{self, Operation, OperationSpan, Outcome},
	provider::ProviderDescriptor,
	ratelimit::{self, RateLimitState, RateLimiter},
};
#[cfg(feature = "reqwest")] use crate::{http::ReqwestHttpClient, login};

#[cfg(feature = "reqwest")]
/// Dispatcher specialized for the crate's default reqwest transport.
pub type ReqwestDispatcher = Dispatcher<ReqwestHttpClient>;

/// Authenticated dispatcher for a single application (and optionally a single account).
pub struct Dispatcher<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// HTTP client wrapper used for every outbound call.
	pub http_client: Arc<C>,
	/// Provider descriptor that defines endpoints and the User-Agent.
	pub descriptor: ProviderDescriptor,
	/// Strategy that describes how tokens are obtained and renewed.
	pub strategy: Arc<dyn LoginStrategy>,
	/// Rate limiter fed by every response.
	pub rate_limiter: Arc<RateLimiter>,
	/// Clock used to evaluate token expiry.
	pub clock: Arc<dyn Clock>,
	/// Counters for dispatcher activity.
	pub metrics: Arc<DispatchMetrics>,
	credentials: Credentials,
	session: AsyncMutex<Option<Token>>,
}
impl<C> Dispatcher<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// Creates a dispatcher that reuses the caller-provided transport.
	pub fn with_http_client(
		descriptor: ProviderDescriptor,
		credentials: Credentials,
		strategy: Arc<dyn LoginStrategy>,
		http_client: impl Into<Arc<C>>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			descriptor,
			strategy,
			rate_limiter: Default::default(),
			clock: Arc::new(SystemClock),
			metrics: Default::default(),
			credentials,
			session: AsyncMutex::new(None),
		}
	}

	/// Replaces the clock used for expiry checks.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;

		self
	}

	/// Shares a rate limiter, e.g. between dispatchers using the same application id.
	pub fn with_rate_limiter(mut self, rate_limiter: Arc<RateLimiter>) -> Self {
		self.rate_limiter = rate_limiter;

		self
	}

	/// Credentials supplied at construction.
	pub fn credentials(&self) -> &Credentials {
		&self.credentials
	}

	/// Snapshot of the current token, if logged in.
	pub async fn token(&self) -> Option<Token> {
		self.session.lock().await.clone()
	}

	/// Returns true while a token is held.
	pub async fn is_logged_in(&self) -> bool {
		self.session.lock().await.is_some()
	}

	/// Current rate-limit counters.
	pub async fn rate_limit(&self) -> RateLimitState {
		self.rate_limiter.state().await
	}

	/// Obtains a fresh token through the login strategy.
	///
	/// Logging in again while a token is held replaces it without revoking the old one.
	pub async fn login(&self, duration: SessionDuration) -> Result<Session<'_, C>> {
		self.observe(Operation::Login, "login", async move {
			let mut session = self.session.lock().await;
			let token = self.obtain(duration).await?;
			let handle = Session::new(self, token.duration, token.issued_at);

			*session = Some(token);

			Ok(handle)
		})
		.await
	}

	/// Replaces the token through the strategy's renewal path.
	///
	/// On failure the held token is left untouched.
	pub async fn refresh(&self) -> Result<()> {
		self.observe(Operation::Refresh, "refresh", async move {
			let mut session = self.session.lock().await;
			let current = session.as_ref().ok_or(Error::NotLoggedIn)?;
			let renewed = self.renew(current, self.strategy.renewal(current)).await?;

			*session = Some(renewed);

			Ok(())
		})
		.await
	}

	/// Revokes the access token, then the refresh token, and forgets both.
	///
	/// A failed access-token revocation is logged and does not stop the refresh-token
	/// revocation, whose failure is returned. The token is cleared either way.
	pub async fn logout(&self) -> Result<()> {
		self.observe(Operation::Logout, "logout", async move {
			let mut session = self.session.lock().await;
			let token = session.take().ok_or(Error::NotLoggedIn)?;
			let endpoint = self.token_endpoint();

			self.metrics.record_revocation();

			if let Err(err) = endpoint.revoke(RevokedToken::Access, &token.access_token).await {
				obs::warn_event!(
					"Access token revocation failed; revoking the refresh token anyway: {err}"
				);
			}
			if let Some(refresh_token) = &token.refresh_token {
				self.metrics.record_revocation();

				endpoint.revoke(RevokedToken::Refresh, refresh_token).await?;
			}

			Ok(())
		})
		.await
	}

	/// Sends an authenticated API request, renewing an expired token first.
	pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
		self.observe(Operation::Send, "send", async move {
			let mut session = self.session.lock().await;
			let current = session.clone().ok_or(Error::NotLoggedIn)?;
			let token = if current.is_expired_at(self.clock.now()) {
				let renewed = self.renew(&current, self.strategy.expiry_renewal(&current)).await?;

				*session = Some(renewed.clone());

				renewed
			} else {
				current
			};
			let http_request = self.authorized_request(&token, &request)?;

			self.metrics.record_request();

			self.raw_send(http_request).await
		})
		.await
	}

	async fn observe<T, F>(&self, operation: Operation, stage: &'static str, fut: F) -> Result<T>
	where
		F: Future<Output = Result<T>>,
	{
		let span = OperationSpan::new(operation, stage);

		obs::record_outcome(operation, Outcome::Attempt);

		let result = span.instrument(fut).await;

		if result.is_err() {
			self.metrics.record_failure();
		}

		obs::record_result(operation, result)
	}

	fn token_endpoint(&self) -> TokenEndpoint<'_, C> {
		TokenEndpoint::new(
			&self.descriptor,
			&self.credentials,
			self.http_client.as_ref(),
			&self.rate_limiter,
		)
	}

	async fn obtain(&self, duration: SessionDuration) -> Result<Token> {
		let grant = self.strategy.grant_type();
		let request = self.strategy.token_request(&self.credentials, duration)?;
		let issued_at = self.clock.now();

		obs::debug_event!("Requesting a {duration} token through the {grant} grant.");
		self.metrics.record_token_grant();

		let response = self.token_endpoint().exchange(&request).await?;
		let mut token = Token::from_response(response, duration, issued_at)
			.map_err(FailureCause::InvalidTokenResponse)?;

		if !self.strategy.keeps_refresh_token() {
			token.refresh_token = None;
		}

		Ok(token)
	}

	async fn renew(&self, current: &Token, renewal: Renewal) -> Result<Token> {
		match renewal {
			Renewal::RefreshToken(refresh_token) => {
				self.metrics.record_renewal();

				let issued_at = self.clock.now();
				let response = self.token_endpoint().refresh(&refresh_token).await?;
				let mut token = Token::from_response(response, current.duration, issued_at)
					.map_err(FailureCause::InvalidTokenResponse)?;

				// Refresh responses usually omit the refresh token; it stays valid.
				token.refresh_token.get_or_insert(refresh_token);

				Ok(token)
			},
			Renewal::Login(duration) => {
				self.metrics.record_renewal();

				let token = self.obtain(duration).await?;

				// A re-login leaves the old refresh token unreachable, so revoke it now.
				let displaced = current
					.refresh_token
					.as_ref()
					.filter(|old| token.refresh_token.as_ref() != Some(*old));

				if let Some(displaced) = displaced {
					self.metrics.record_revocation();

					if let Err(err) =
						self.token_endpoint().revoke(RevokedToken::Refresh, displaced).await
					{
						obs::warn_event!("Revoking the displaced refresh token failed: {err}");
					}
				}

				Ok(token)
			},
			Renewal::Unavailable => Err(FailureCause::MissingRefreshToken.into()),
		}
	}

	fn authorized_request(&self, token: &Token, request: &ApiRequest) -> Result<HttpRequest> {
		let url = request.resolve(&self.descriptor.endpoints.api)?;
		let mut bearer = HeaderValue::try_from(format!("Bearer {}", token.access_token.expose()))
			.map_err(|err| TransportError::Request(err.into()))?;

		bearer.set_sensitive(true);

		let mut builder = Request::builder()
			.method(request.method.clone())
			.uri(url.as_str())
			.header(AUTHORIZATION, bearer);
		let body = match request.encoded_form() {
			Some(form) => {
				builder = builder.header(CONTENT_TYPE, "application/x-www-form-urlencoded");

				form.into_bytes()
			},
			None => Vec::new(),
		};

		builder.body(body).map_err(|err| TransportError::Request(err).into())
	}

	/// Throttled call without any token handling; shared by every API request.
	async fn raw_send(&self, request: HttpRequest) -> Result<ApiResponse> {
		let slot = ResponseMetadataSlot::default();
		let handle = ThrottledHandle::new(
			self.http_client.as_ref(),
			slot.clone(),
			Arc::clone(&self.rate_limiter),
			self.descriptor.user_agent.header_value().clone(),
		);
		let response = handle.call(request).await.map_err(oauth::map_http_client_error)?;

		classify(response, slot.take())
	}
}
#[cfg(feature = "reqwest")]
impl Dispatcher<ReqwestHttpClient> {
	/// Creates a dispatcher with its own reqwest transport and the strategy implied by the
	/// credentials (password grant when user credentials are present).
	pub fn new(descriptor: ProviderDescriptor, credentials: Credentials) -> Self {
		let strategy = login::default_strategy(&credentials);

		Self::with_http_client(descriptor, credentials, strategy, ReqwestHttpClient::default())
	}
}
impl<C> Debug for Dispatcher<C>
where
	C: ?Sized + ApiHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Dispatcher")
			.field("descriptor", &self.descriptor)
			.field("strategy", &self.strategy)
			.field("credentials", &self.credentials)
			.finish()
	}
}

fn classify(response: HttpResponse, meta: Option<ResponseMetadata>) -> Result<ApiResponse> {
	let status = response.status();

	if status.is_success() {
		let (parts, body) = response.into_parts();

		return Ok(ApiResponse { status: status.as_u16(), headers: parts.headers, body });
	}

	let retry_after = meta
		.and_then(|meta| meta.retry_after)
		.or_else(|| ratelimit::parse_retry_after(response.headers()));

	Err(FailureCause::Status {
		status: status.as_u16(),
		message: request::error_message(status, response.body()),
		retry_after,
	}
	.into())
}
