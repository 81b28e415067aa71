//! Pluggable login strategies.
//!
//! A strategy only knows how to describe a token request and how a held token should be
//! renewed. The dispatcher owns the token, the rate limiter and the transport, so the send path
//! stays identical whichever strategy is active.

pub mod password;
pub mod userless;

pub use password::*;
pub use userless::*;

// self
use crate::{
	_prelude::*,
	auth::{Credentials, SessionDuration, Token, TokenSecret, Username},
};

/// Form parameter carrying the requested session duration.
pub const DURATION_PARAM: &str = "duration";

/// Login grant a strategy sends to the token endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
	/// Acts for a named account with its password.
	Password,
	/// Acts for the application alone.
	ClientCredentials,
}
impl GrantType {
	/// Value of the `grant_type` form field.
	pub const fn as_str(self) -> &'static str {
		match self {
			GrantType::Password => "password",
			GrantType::ClientCredentials => "client_credentials",
		}
	}
}
impl Display for GrantType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Hook that tells the dispatcher how to obtain and renew tokens.
pub trait LoginStrategy: Send + Sync + Debug {
	/// Grant used for [`token_request`](LoginStrategy::token_request).
	fn grant_type(&self) -> GrantType;

	/// Describes the token endpoint call that logs in for `duration`.
	fn token_request(
		&self,
		credentials: &Credentials,
		duration: SessionDuration,
	) -> Result<TokenRequest>;

	/// Whether refresh tokens returned by the provider should be kept.
	fn keeps_refresh_token(&self) -> bool {
		true
	}

	/// Renewal path for an explicit `refresh()`.
	fn renewal(&self, current: &Token) -> Renewal {
		match &current.refresh_token {
			Some(secret) => Renewal::RefreshToken(secret.clone()),
			None => Renewal::Unavailable,
		}
	}

	/// Renewal path used when `send` finds the token expired.
	fn expiry_renewal(&self, current: &Token) -> Renewal {
		self.renewal(current)
	}
}

/// How a held token gets replaced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Renewal {
	/// Exchange the refresh token through the `refresh_token` grant.
	RefreshToken(TokenSecret),
	/// Run the strategy's login again for the given duration.
	Login(SessionDuration),
	/// The strategy cannot renew this token.
	Unavailable,
}

/// Grant-specific part of a token request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenGrant {
	/// `grant_type=password` with the account credentials.
	Password {
		/// Account name.
		username: Username,
		/// Account password.
		password: TokenSecret,
	},
	/// `grant_type=client_credentials`.
	ClientCredentials,
}

/// Token endpoint call assembled by a [`LoginStrategy`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenRequest {
	/// Grant and its credentials.
	pub grant: TokenGrant,
	/// Additional form fields sent with the request.
	pub extra_params: BTreeMap<String, String>,
}
impl TokenRequest {
	/// Creates a request without extra parameters.
	pub fn new(grant: TokenGrant) -> Self {
		Self { grant, extra_params: BTreeMap::new() }
	}

	/// Adds a form parameter, replacing any previous value.
	pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.extra_params.insert(key.into(), value.into());

		self
	}
}

/// Picks the password grant when user credentials are present, the userless grant otherwise.
pub fn default_strategy(credentials: &Credentials) -> Arc<dyn LoginStrategy> {
	if credentials.user.is_some() {
		Arc::new(PasswordGrant)
	} else {
		Arc::new(UserlessGrant::default())
	}
}
