//! Immutable application and user credentials supplied at dispatcher construction.

// self
use crate::{
	_prelude::*,
	auth::{TokenSecret, Username},
};

/// Application credentials, optionally paired with the account the app acts for.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
	/// OAuth client identifier issued for the application.
	pub client_id: String,
	/// OAuth client secret; installed apps use an empty secret.
	pub client_secret: TokenSecret,
	/// Account credentials used by the password grant.
	pub user: Option<UserCredentials>,
}
impl Credentials {
	/// Credentials for an application acting without a user context.
	pub fn app(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
		Self {
			client_id: client_id.into(),
			client_secret: TokenSecret::new(client_secret),
			user: None,
		}
	}

	/// Credentials for an installed application, which has no client secret.
	pub fn installed_app(client_id: impl Into<String>) -> Self {
		Self::app(client_id, "")
	}

	/// Attaches the account the application acts for.
	pub fn with_user(mut self, username: Username, password: impl Into<String>) -> Self {
		self.user = Some(UserCredentials { username, password: TokenSecret::new(password) });

		self
	}
}
impl Debug for Credentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credentials")
			.field("client_id", &self.client_id)
			.field("client_secret", &"<redacted>")
			.field("user", &self.user)
			.finish()
	}
}

/// Account name and password for the password grant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserCredentials {
	/// Account name.
	pub username: Username,
	/// Account password; redacted when formatted.
	pub password: TokenSecret,
}
