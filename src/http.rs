//! Transport primitives shared by token exchanges and API calls.
//!
//! The module exposes [`ApiHttpClient`] alongside [`ResponseMetadata`] and
//! [`ResponseMetadataSlot`] so downstream crates can plug in custom HTTP clients
//! without losing the dispatcher's throttling and error classification. Implementations call
//! [`ResponseMetadataSlot::take`] before dispatching a request and
//! [`ResponseMetadataSlot::store`] once an HTTP status or retry hint is known.

// std
use std::ops::Deref;
// crates.io
use oauth2::{
	AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse,
	http::{HeaderValue, header::USER_AGENT},
};
// self
use crate::{
	_prelude::*,
	ratelimit::{RateLimitHeaders, RateLimiter},
};

/// Abstraction over HTTP transports used for every outbound call the dispatcher makes.
///
/// The trait is the dispatcher's only dependency on an HTTP stack. Callers provide an
/// implementation (typically behind `Arc<T>` where `T: ApiHttpClient`) and the dispatcher
/// requests short-lived [`AsyncHttpClient`] handles that each carry a clone of a
/// [`ResponseMetadataSlot`]. Handles must own whatever state they need so their request
/// futures stay `Send` for the lifetime of the in-flight call.
pub trait ApiHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// [`AsyncHttpClient`] handle tied to a [`ResponseMetadataSlot`].
	type Handle: for<'c> AsyncHttpClient<
			'c,
			Error = HttpClientError<Self::TransportError>,
			Future: 'c + Send,
		>
		+ 'static
		+ Send
		+ Sync;

	/// Builds an [`AsyncHttpClient`] handle that records outcomes in `slot`.
	///
	/// # Metadata Contract
	///
	/// - Call [`ResponseMetadataSlot::take`] before submitting the HTTP request so stale
	///   information never leaks across calls.
	/// - Once a response (successful or not) is received, save its status and retry hint with
	///   [`ResponseMetadataSlot::store`].
	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle;
}

/// Captures metadata from the most recent HTTP response for downstream error mapping.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadata {
	/// HTTP status code, if a response was received.
	pub status: Option<u16>,
	/// Retry-After hint expressed as a relative duration.
	pub retry_after: Option<Duration>,
}
impl ResponseMetadata {
	/// Returns true when the recorded status is in the 2xx range.
	pub fn is_success(&self) -> bool {
		matches!(self.status, Some(200..=299))
	}
}

/// Thread-safe slot for sharing [`ResponseMetadata`] between transport and error layers.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadataSlot(Arc<Mutex<Option<ResponseMetadata>>>);
impl ResponseMetadataSlot {
	/// Stores new metadata for the current request.
	pub fn store(&self, meta: ResponseMetadata) {
		*self.0.lock() = Some(meta);
	}

	/// Returns the captured metadata, if any, consuming it from the slot.
	pub fn take(&self) -> Option<ResponseMetadata> {
		self.0.lock().take()
	}
}

/// Handle wrapper applied to every outbound call.
///
/// Stamps the User-Agent, waits for a rate-limit permit, runs the call, then feeds the response
/// headers back into the limiter. Transport failures leave the limiter untouched.
pub(crate) struct ThrottledHandle<C>
where
	C: ?Sized + ApiHttpClient,
{
	inner: C::Handle,
	limiter: Arc<RateLimiter>,
	user_agent: HeaderValue,
}
impl<C> ThrottledHandle<C>
where
	C: ?Sized + ApiHttpClient,
{
	pub(crate) fn new(
		http_client: &C,
		slot: ResponseMetadataSlot,
		limiter: Arc<RateLimiter>,
		user_agent: HeaderValue,
	) -> Self {
		Self { inner: http_client.with_metadata(slot), limiter, user_agent }
	}
}
impl<'c, C> AsyncHttpClient<'c> for ThrottledHandle<C>
where
	C: ?Sized + ApiHttpClient,
{
	type Error = HttpClientError<C::TransportError>;
	type Future = Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send>>;

	fn call(&'c self, mut request: HttpRequest) -> Self::Future {
		Box::pin(async move {
			request.headers_mut().insert(USER_AGENT, self.user_agent.clone());

			self.limiter.acquire().await;

			let response = self.inner.call(request).await?;
			let observed = RateLimitHeaders::from_response(response.status(), response.headers());

			self.limiter.update(observed.as_ref()).await;

			Ok(response)
		})
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Token and revoke endpoints answer directly, so a custom [`ReqwestClient`] should disable
/// redirect following before it is handed to the dispatcher.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds an instrumented HTTP client that captures response metadata.
	pub(crate) fn instrumented(&self, slot: ResponseMetadataSlot) -> InstrumentedHandle {
		InstrumentedHandle::new(self.0.clone(), slot)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl ApiHttpClient for ReqwestHttpClient {
	type Handle = InstrumentedHandle;
	type TransportError = ReqwestError;

	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle {
		self.instrumented(slot)
	}
}

#[cfg(feature = "reqwest")]
struct InstrumentedHttpClient {
	client: ReqwestClient,
	slot: ResponseMetadataSlot,
}

/// Handle returned by [`ReqwestHttpClient`] that satisfies [`ApiHttpClient`].
#[cfg(feature = "reqwest")]
#[derive(Clone)]
pub struct InstrumentedHandle(Arc<InstrumentedHttpClient>);
#[cfg(feature = "reqwest")]
impl InstrumentedHandle {
	fn new(client: ReqwestClient, slot: ResponseMetadataSlot) -> Self {
		Self(Arc::new(InstrumentedHttpClient { client, slot }))
	}
}
#[cfg(feature = "reqwest")]
impl<'c> AsyncHttpClient<'c> for InstrumentedHandle {
	type Error = HttpClientError<ReqwestError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		let client = Arc::clone(&self.0);

		Box::pin(async move {
			client.slot.take();

			let response = client
				.client
				.execute(request.try_into().map_err(Box::new)?)
				.await
				.map_err(Box::new)?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let retry_after = crate::ratelimit::parse_retry_after(&headers);

			client.slot.store(ResponseMetadata { status: Some(status.as_u16()), retry_after });

			let mut response_new =
				HttpResponse::new(response.bytes().await.map_err(Box::new)?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn metadata_slot_take_consumes() {
		let slot = ResponseMetadataSlot::default();

		slot.store(ResponseMetadata { status: Some(204), retry_after: None });

		let meta = slot.take().expect("Stored metadata should be returned.");

		assert!(meta.is_success());
		assert!(slot.take().is_none());
		assert!(!ResponseMetadata { status: Some(500), retry_after: None }.is_success());
	}
}
