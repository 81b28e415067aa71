//! Immutable token records, session durations, and the token builder.

// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, token::secret::TokenSecret},
};

/// Requested lifetime of a login session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionDuration {
	/// Ephemeral session: only a short-lived access token is requested.
	#[default]
	Temporary,
	/// Durable session: a refresh token is requested alongside the access token.
	Permanent,
}
impl SessionDuration {
	/// Returns the value sent in the token request's `duration` field.
	pub const fn as_str(self) -> &'static str {
		match self {
			SessionDuration::Temporary => "temporary",
			SessionDuration::Permanent => "permanent",
		}
	}

	/// Returns true for [`SessionDuration::Temporary`].
	pub const fn is_ephemeral(self) -> bool {
		matches!(self, SessionDuration::Temporary)
	}
}
impl Display for SessionDuration {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Lifecycle status for a token at a given instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenStatus {
	/// Token is not yet valid because the issued-at instant is in the future.
	Pending,
	/// Token is currently valid.
	Valid,
	/// Token reached its expiry instant.
	Expired,
}

/// Errors produced by [`TokenBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum TokenBuildError {
	/// Issued when no (or an empty) access token value was provided.
	#[error("Access token is required.")]
	MissingAccessToken,
	/// Issued when no expiry (absolute or relative) was configured.
	#[error("Expiry must be supplied via expires_at or expires_in.")]
	MissingExpiry,
	/// The relative expiry is zero or negative.
	#[error("The expires_in value must be positive.")]
	NonPositiveExpiry,
	/// The relative expiry does not fit the supported range.
	#[error("The expires_in value exceeds the supported range.")]
	ExpiryOutOfRange,
}

/// Credential state held by a logged-in dispatcher.
///
/// Tokens are replaced wholesale on renewal and never edited field by field.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
	/// Bearer credential; never empty.
	pub access_token: TokenSecret,
	/// Refresh credential, present only for durable sessions the provider honoured.
	pub refresh_token: Option<TokenSecret>,
	/// Token type reported by the provider (normally `bearer`).
	pub token_type: String,
	/// Scopes granted to this token.
	pub scope: ScopeSet,
	/// Session duration requested when the token was obtained.
	pub duration: SessionDuration,
	/// Instant the token endpoint call was issued.
	pub issued_at: OffsetDateTime,
	/// Instant the access token stops being valid.
	pub expires_at: OffsetDateTime,
}
impl Token {
	/// Returns a builder for constructing tokens.
	pub fn builder() -> TokenBuilder {
		TokenBuilder::default()
	}

	/// Computes the lifecycle status at a given instant.
	pub fn status_at(&self, instant: OffsetDateTime) -> TokenStatus {
		if instant < self.issued_at {
			return TokenStatus::Pending;
		}
		if instant >= self.expires_at {
			return TokenStatus::Expired;
		}

		TokenStatus::Valid
	}

	/// Returns `true` if the token has expired at the provided instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		matches!(self.status_at(instant), TokenStatus::Expired)
	}

	/// Remaining lifetime at `instant`, clamped at zero.
	pub fn expires_in_at(&self, instant: OffsetDateTime) -> Duration {
		let remaining = self.expires_at - instant;

		if remaining.is_negative() { Duration::ZERO } else { remaining }
	}

	/// Returns `true` when a refresh token is held.
	pub fn is_durable(&self) -> bool {
		self.refresh_token.is_some()
	}
}
impl Debug for Token {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Token")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("token_type", &self.token_type)
			.field("scope", &self.scope)
			.field("duration", &self.duration)
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

/// Builder for [`Token`].
#[derive(Clone, Debug, Default)]
pub struct TokenBuilder {
	access_token: Option<TokenSecret>,
	refresh_token: Option<TokenSecret>,
	token_type: Option<String>,
	scope: ScopeSet,
	duration: SessionDuration,
	issued_at: Option<OffsetDateTime>,
	expires_at: Option<OffsetDateTime>,
	expires_in: Option<Duration>,
}
impl TokenBuilder {
	/// Provides the access token value.
	pub fn access_token(mut self, token: impl Into<String>) -> Self {
		self.access_token = Some(TokenSecret::new(token));

		self
	}

	/// Provides the refresh token value.
	pub fn refresh_token(mut self, token: impl Into<String>) -> Self {
		self.refresh_token = Some(TokenSecret::new(token));

		self
	}

	/// Sets the token type (defaults to `bearer`).
	pub fn token_type(mut self, token_type: impl Into<String>) -> Self {
		self.token_type = Some(token_type.into());

		self
	}

	/// Sets the granted scopes.
	pub fn scope(mut self, scope: ScopeSet) -> Self {
		self.scope = scope;

		self
	}

	/// Sets the requested session duration.
	pub fn duration(mut self, duration: SessionDuration) -> Self {
		self.duration = duration;

		self
	}

	/// Sets the issued-at instant.
	pub fn issued_at(mut self, instant: OffsetDateTime) -> Self {
		self.issued_at = Some(instant);

		self
	}

	/// Sets an absolute expiry instant.
	pub fn expires_at(mut self, instant: OffsetDateTime) -> Self {
		self.expires_at = Some(instant);

		self
	}

	/// Sets a relative expiry duration from the issued instant.
	pub fn expires_in(mut self, duration: Duration) -> Self {
		self.expires_in = Some(duration);

		self
	}

	/// Sets a relative expiry from the provider's `expires_in` seconds.
	pub fn expires_in_secs(self, secs: u64) -> Result<Self, TokenBuildError> {
		let secs = i64::try_from(secs).map_err(|_| TokenBuildError::ExpiryOutOfRange)?;

		Ok(self.expires_in(Duration::seconds(secs)))
	}

	/// Consumes the builder and produces a [`Token`].
	pub fn build(self) -> Result<Token, TokenBuildError> {
		let access_token = self
			.access_token
			.filter(|secret| !secret.is_empty())
			.ok_or(TokenBuildError::MissingAccessToken)?;
		let issued_at = self.issued_at.unwrap_or_else(OffsetDateTime::now_utc);
		let expires_at = match (self.expires_at, self.expires_in) {
			(Some(instant), _) => instant,
			(None, Some(delta)) if !delta.is_positive() =>
				return Err(TokenBuildError::NonPositiveExpiry),
			(None, Some(delta)) =>
				issued_at.checked_add(delta).ok_or(TokenBuildError::ExpiryOutOfRange)?,
			(None, None) => return Err(TokenBuildError::MissingExpiry),
		};

		Ok(Token {
			access_token,
			refresh_token: self.refresh_token.filter(|secret| !secret.is_empty()),
			token_type: self.token_type.unwrap_or_else(|| "bearer".into()),
			scope: self.scope,
			duration: self.duration,
			issued_at,
			expires_at,
		})
	}
}
