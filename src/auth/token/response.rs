//! Wire form of token endpoint responses.

// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, SessionDuration, Token, TokenBuildError},
};

/// JSON body returned by the token endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
	/// Bearer credential.
	pub access_token: String,
	/// Token type (normally `bearer`).
	pub token_type: String,
	/// Lifetime of the access token in seconds.
	pub expires_in: u64,
	/// Space-delimited granted scopes.
	#[serde(default)]
	pub scope: ScopeSet,
	/// Refresh credential for durable sessions.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub refresh_token: Option<String>,
}
impl TokenResponse {
	/// Parses a token endpoint body, reporting the JSON path of any mismatch.
	pub fn parse(body: &[u8]) -> Result<Self, serde_path_to_error::Error<serde_json::Error>> {
		let mut de = serde_json::Deserializer::from_slice(body);

		serde_path_to_error::deserialize(&mut de)
	}
}

impl Token {
	/// Builds a token from a token endpoint response received at `issued_at`.
	pub fn from_response(
		response: TokenResponse,
		duration: SessionDuration,
		issued_at: OffsetDateTime,
	) -> Result<Self, TokenBuildError> {
		let mut builder = Token::builder()
			.access_token(response.access_token)
			.token_type(response.token_type)
			.scope(response.scope)
			.duration(duration)
			.issued_at(issued_at)
			.expires_in_secs(response.expires_in)?;

		if let Some(refresh) = response.refresh_token {
			builder = builder.refresh_token(refresh);
		}

		builder.build()
	}

	/// Renders the token in wire form, with `expires_in` relative to `now`.
	pub fn to_response(&self, now: OffsetDateTime) -> TokenResponse {
		let remaining = self.expires_in_at(now).whole_seconds();

		TokenResponse {
			access_token: self.access_token.expose().to_owned(),
			token_type: self.token_type.clone(),
			expires_in: u64::try_from(remaining).unwrap_or_default(),
			scope: self.scope.clone(),
			refresh_token: self.refresh_token.as_ref().map(|secret| secret.expose().to_owned()),
		}
	}
}
