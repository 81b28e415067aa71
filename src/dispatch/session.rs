//! Scoped handle returned by [`Dispatcher::login`].

// self
use crate::{
	_prelude::*,
	auth::SessionDuration,
	dispatch::{ApiRequest, ApiResponse, Dispatcher},
	http::ApiHttpClient,
	obs,
};

/// Logged-in session borrowed from a [`Dispatcher`].
///
/// Ending the session is the caller's job: call [`Session::logout`] to revoke the tokens, or
/// [`Session::detach`] to keep them alive past the handle. Dropping an ephemeral session
/// without either only logs a warning; nothing is revoked behind the caller's back.
#[must_use = "call `logout` (or `detach`) to end the session explicitly"]
pub struct Session<'a, C>
where
	C: ?Sized + ApiHttpClient,
{
	dispatcher: &'a Dispatcher<C>,
	duration: SessionDuration,
	issued_at: OffsetDateTime,
	armed: bool,
}
impl<'a, C> Session<'a, C>
where
	C: ?Sized + ApiHttpClient,
{
	pub(crate) fn new(
		dispatcher: &'a Dispatcher<C>,
		duration: SessionDuration,
		issued_at: OffsetDateTime,
	) -> Self {
		Self { dispatcher, duration, issued_at, armed: true }
	}

	/// Dispatcher that owns the token.
	pub fn dispatcher(&self) -> &'a Dispatcher<C> {
		self.dispatcher
	}

	/// Duration requested at login.
	pub fn duration(&self) -> SessionDuration {
		self.duration
	}

	/// Instant the login token was requested.
	pub fn issued_at(&self) -> OffsetDateTime {
		self.issued_at
	}

	/// Sends an API request through the owning dispatcher.
	pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
		self.dispatcher.send(request).await
	}

	/// Revokes the session's tokens.
	pub async fn logout(mut self) -> Result<()> {
		self.armed = false;

		self.dispatcher.logout().await
	}

	/// Releases the handle and leaves the tokens in place.
	pub fn detach(mut self) -> &'a Dispatcher<C> {
		self.armed = false;

		self.dispatcher
	}
}
impl<C> Debug for Session<'_, C>
where
	C: ?Sized + ApiHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Session")
			.field("duration", &self.duration)
			.field("issued_at", &self.issued_at)
			.finish()
	}
}
impl<C> Drop for Session<'_, C>
where
	C: ?Sized + ApiHttpClient,
{
	fn drop(&mut self) {
		if self.armed && self.duration.is_ephemeral() {
			obs::warn_event!(
				"Temporary session issued at {} was dropped without logout; its token stays valid until it expires.",
				self.issued_at
			);
		}
	}
}
