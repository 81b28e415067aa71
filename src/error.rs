//! Dispatcher-level error types shared across login, renewal, revocation, and API calls.

// crates.io
use oauth2::http::Error as HttpError;
// self
use crate::{_prelude::*, auth::TokenBuildError};

/// Dispatcher-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical dispatcher error exposed by public APIs.
///
/// Every failure that involved (or tried to involve) the network surfaces as
/// [`Error::FailedRequest`]; callers inspect [`FailedRequest::cause`] when they need to tell a
/// transport outage from an HTTP rejection.
#[derive(Debug, ThisError)]
pub enum Error {
	/// An outbound call failed or could not complete.
	#[error(transparent)]
	FailedRequest(#[from] FailedRequest),
	/// An operation that needs a token ran before `login` (or after `logout`).
	#[error("Dispatcher is not logged in; call `login` first.")]
	NotLoggedIn,
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
}
impl Error {
	/// Returns the wrapped [`FailedRequest`], if this error is one.
	pub fn as_failed_request(&self) -> Option<&FailedRequest> {
		match self {
			Self::FailedRequest(inner) => Some(inner),
			_ => None,
		}
	}
}
impl From<FailureCause> for Error {
	fn from(cause: FailureCause) -> Self {
		Self::FailedRequest(FailedRequest::new(cause))
	}
}
impl From<TransportError> for Error {
	fn from(e: TransportError) -> Self {
		FailureCause::Transport(e).into()
	}
}

/// Uniform failure raised by `login`, `refresh`, `logout`, and `send`.
#[derive(Debug, ThisError)]
#[error("Request failed: {cause}")]
pub struct FailedRequest {
	/// Underlying reason for the failure.
	#[source]
	pub cause: FailureCause,
}
impl FailedRequest {
	/// Wraps a failure cause.
	pub fn new(cause: FailureCause) -> Self {
		Self { cause }
	}

	/// Returns the underlying failure cause.
	pub fn cause(&self) -> &FailureCause {
		&self.cause
	}

	/// Returns the HTTP status associated with the failure, when a response was received.
	pub fn status(&self) -> Option<u16> {
		match &self.cause {
			FailureCause::Status { status, .. } => Some(*status),
			FailureCause::Rejected { status, .. } | FailureCause::MalformedResponse { status, .. } =>
				*status,
			FailureCause::Transport(_)
			| FailureCause::InvalidTokenResponse(_)
			| FailureCause::MissingRefreshToken => None,
		}
	}
}

/// Reasons a [`FailedRequest`] can carry.
#[derive(Debug, ThisError)]
pub enum FailureCause {
	/// Network or I/O failure before a response was received.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Endpoint answered with a non-success HTTP status.
	#[error("Endpoint returned HTTP {status}: {message}.")]
	Status {
		/// HTTP status code.
		status: u16,
		/// Provider- or dispatcher-supplied message.
		message: String,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Token endpoint answered with an OAuth error body.
	#[error("Token endpoint rejected the request: {error}.")]
	Rejected {
		/// HTTP status code, when available.
		status: Option<u16>,
		/// OAuth `error` code.
		error: String,
		/// OAuth `error_description`, when supplied.
		description: Option<String>,
	},
	/// Response body could not be parsed.
	#[error("Endpoint returned malformed JSON.")]
	MalformedResponse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Token endpoint response could not be turned into a token.
	#[error("Token endpoint returned an unusable token: {0}")]
	InvalidTokenResponse(#[from] TokenBuildError),
	/// A refresh was requested but no refresh token is held.
	#[error("No refresh token is available for this session.")]
	MissingRefreshToken,
}

/// Configuration and validation failures raised by the dispatcher.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Request path cannot be resolved against the API base URL.
	#[error("Request path `{path}` is invalid.")]
	InvalidRequestPath {
		/// Offending path.
		path: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Request URL resolved outside the API base origin.
	#[error("Request URL `{url}` leaves the API origin.")]
	RequestOutsideApi {
		/// Resolved URL.
		url: String,
	},
	/// Revocation endpoint was rejected by the OAuth client.
	#[error("Revocation endpoint is not usable.")]
	Revocation(#[from] oauth2::ConfigurationError),
	/// The password grant was selected without user credentials.
	#[error("The password grant requires a username and password.")]
	MissingUserCredentials,
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the endpoint.")]
	Io(#[from] std::io::Error),
	/// The HTTP request could not be assembled.
	#[error("HTTP request could not be built.")]
	Request(#[from] HttpError),
	/// Any other transport failure, described by the HTTP client.
	#[error("HTTP client error occurred while calling the endpoint: {message}.")]
	Other {
		/// Client-supplied description.
		message: String,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
