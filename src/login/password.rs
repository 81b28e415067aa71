//! Password grant acting on behalf of a named account.

// self
use crate::{
	_prelude::*,
	auth::{Credentials, SessionDuration, Token},
	error::ConfigError,
	login::{DURATION_PARAM, GrantType, LoginStrategy, Renewal, TokenGrant, TokenRequest},
	obs,
};

/// Logs in with the account's username and password.
///
/// The provider ignores `duration` for this grant and never issues a refresh token, so an
/// explicit `refresh()` is [`Renewal::Unavailable`]. When `send` finds the token expired the
/// strategy logs in again for the same duration instead.
#[derive(Clone, Copy, Debug, Default)]
pub struct PasswordGrant;
impl LoginStrategy for PasswordGrant {
	fn grant_type(&self) -> GrantType {
		GrantType::Password
	}

	fn token_request(
		&self,
		credentials: &Credentials,
		duration: SessionDuration,
	) -> Result<TokenRequest> {
		let user = credentials.user.as_ref().ok_or(ConfigError::MissingUserCredentials)?;

		if !duration.is_ephemeral() {
			obs::warn_event!(
				"The password grant never yields a refresh token; the {duration} session will re-login on expiry."
			);
		}

		Ok(TokenRequest::new(TokenGrant::Password {
			username: user.username.clone(),
			password: user.password.clone(),
		})
		.param(DURATION_PARAM, duration.as_str()))
	}

	fn keeps_refresh_token(&self) -> bool {
		false
	}

	fn renewal(&self, _: &Token) -> Renewal {
		Renewal::Unavailable
	}

	fn expiry_renewal(&self, current: &Token) -> Renewal {
		Renewal::Login(current.duration)
	}
}
