//! Client-credentials grant acting without a user context.

// self
use crate::{
	_prelude::*,
	auth::{Credentials, DeviceId, SessionDuration, Token},
	login::{DURATION_PARAM, GrantType, LoginStrategy, Renewal, TokenGrant, TokenRequest},
	obs,
};

/// Form parameter carrying the device identifier.
pub const DEVICE_ID_PARAM: &str = "device_id";

/// App-only login identified by a per-process device id.
///
/// The grant re-sends the client credentials on every renewal, so durable sessions add
/// nothing; requesting one is allowed but logged.
#[derive(Clone, Debug)]
pub struct UserlessGrant {
	device_id: DeviceId,
}
impl UserlessGrant {
	/// Uses the given device id.
	pub fn new(device_id: DeviceId) -> Self {
		Self { device_id }
	}

	/// Uses the provider's opt-out sentinel instead of a tracked device id.
	pub fn untracked() -> Self {
		Self::new(DeviceId::untracked())
	}

	/// Device id sent with every token request.
	pub fn device_id(&self) -> &DeviceId {
		&self.device_id
	}
}
impl Default for UserlessGrant {
	fn default() -> Self {
		Self::new(DeviceId::generate())
	}
}
impl LoginStrategy for UserlessGrant {
	fn grant_type(&self) -> GrantType {
		GrantType::ClientCredentials
	}

	fn token_request(&self, _: &Credentials, duration: SessionDuration) -> Result<TokenRequest> {
		if !duration.is_ephemeral() {
			obs::warn_event!(
				"A {duration} session was requested for the userless grant; renewals log in again regardless."
			);
		}

		Ok(TokenRequest::new(TokenGrant::ClientCredentials)
			.param(DEVICE_ID_PARAM, self.device_id.to_string())
			.param(DURATION_PARAM, duration.as_str()))
	}

	// The grant has no refresh-token concept; a stray one would outlive every renewal.
	fn keeps_refresh_token(&self) -> bool {
		false
	}

	fn renewal(&self, _: &Token) -> Renewal {
		Renewal::Login(SessionDuration::Temporary)
	}
}
