// crates.io
use oauth2::http::HeaderValue;
// self
use crate::{_prelude::*, auth::Username};

/// Prefixes of stock client agents the provider throttles or blocks outright.
const GENERIC_AGENTS: &[&str] = &[
	"axios/",
	"curl/",
	"go-http-client/",
	"java/",
	"mozilla/",
	"node-fetch/",
	"okhttp/",
	"python-requests/",
	"python-urllib/",
	"reqwest/",
	"wget/",
];

/// Errors raised while validating a User-Agent.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum UserAgentError {
	/// The agent was empty or whitespace.
	#[error("User-Agent cannot be empty.")]
	Empty,
	/// The agent contains characters that are not valid in an HTTP header.
	#[error("User-Agent is not a valid header value.")]
	InvalidHeader,
	/// The agent is a stock library agent.
	#[error("User-Agent `{agent}` is a generic client agent; describe the application instead.")]
	Generic {
		/// Offending agent string.
		agent: String,
	},
}

/// Descriptive User-Agent sent with every outbound call.
#[derive(Clone, PartialEq, Eq)]
pub struct UserAgent(HeaderValue);
impl UserAgent {
	/// Validates a User-Agent string.
	pub fn new(agent: impl AsRef<str>) -> Result<Self, UserAgentError> {
		let agent = agent.as_ref().trim();

		if agent.is_empty() {
			return Err(UserAgentError::Empty);
		}
		if !agent.is_ascii() {
			return Err(UserAgentError::InvalidHeader);
		}

		let lowered = agent.to_ascii_lowercase();

		if GENERIC_AGENTS.iter().any(|prefix| lowered.starts_with(prefix)) {
			return Err(UserAgentError::Generic { agent: agent.to_owned() });
		}

		HeaderValue::from_str(agent).map(Self).map_err(|_| UserAgentError::InvalidHeader)
	}

	/// Renders the recommended `<platform>:<app id>:<version> (by /u/<username>)` form.
	pub fn for_app(
		platform: &str,
		app_id: &str,
		version: &str,
		username: &Username,
	) -> Result<Self, UserAgentError> {
		Self::new(format!("{platform}:{app_id}:{version} (by /u/{username})"))
	}

	/// Returns the agent as a header value.
	pub fn header_value(&self) -> &HeaderValue {
		&self.0
	}

	/// Returns the agent as text.
	pub fn as_str(&self) -> &str {
		// Construction only admits ASCII that `HeaderValue::from_str` accepts.
		self.0.to_str().unwrap_or_default()
	}
}
impl Debug for UserAgent {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("UserAgent").field(&self.as_str()).finish()
	}
}
impl Display for UserAgent {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for UserAgent {
	type Err = UserAgentError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}
