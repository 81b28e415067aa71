// self
use crate::{
	_prelude::*,
	provider::{ProviderDescriptor, ProviderEndpoints, UserAgent},
};

/// Errors raised while constructing or validating descriptors.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum ProviderDescriptorError {
	/// Token endpoint is mandatory.
	#[error("Missing token endpoint.")]
	MissingTokenEndpoint,
	/// Revocation endpoint is mandatory because `logout` revokes tokens.
	#[error("Missing revocation endpoint.")]
	MissingRevocationEndpoint,
	/// API base URL is mandatory for request dispatch.
	#[error("Missing API base URL.")]
	MissingApiBase,
	/// Endpoints must use HTTPS.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Endpoint string could not be parsed as a URL.
	#[error("The {endpoint} endpoint is not a valid URL: {url}.")]
	InvalidEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint string that failed to parse.
		url: String,
	},
	/// The API base cannot carry path segments (`mailto:` style URLs).
	#[error("The API base URL cannot be used as a base: {url}.")]
	CannotBeABase {
		/// Offending URL.
		url: String,
	},
}

/// Builder for [`ProviderDescriptor`] values.
#[derive(Debug)]
pub struct ProviderDescriptorBuilder {
	/// User-Agent stamped on every outbound call.
	pub user_agent: UserAgent,
	/// Token endpoint used for logins and refreshes.
	pub token_endpoint: Option<Url>,
	/// Revocation endpoint used by `logout`.
	pub revocation_endpoint: Option<Url>,
	/// Base URL that request paths are resolved against.
	pub api_base: Option<Url>,
}
impl ProviderDescriptorBuilder {
	/// Creates a new builder seeded with the provided User-Agent.
	pub fn new(user_agent: UserAgent) -> Self {
		Self {
			user_agent,
			token_endpoint: None,
			revocation_endpoint: None,
			api_base: None,
		}
	}

	/// Sets the token endpoint.
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token_endpoint = Some(url);

		self
	}

	/// Sets the revocation endpoint.
	pub fn revocation_endpoint(mut self, url: Url) -> Self {
		self.revocation_endpoint = Some(url);

		self
	}

	/// Sets the API base URL.
	pub fn api_base(mut self, url: Url) -> Self {
		self.api_base = Some(url);

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<ProviderDescriptor, ProviderDescriptorError> {
		let token = self.token_endpoint.ok_or(ProviderDescriptorError::MissingTokenEndpoint)?;
		let revocation =
			self.revocation_endpoint.ok_or(ProviderDescriptorError::MissingRevocationEndpoint)?;
		let api = normalize_base(self.api_base.ok_or(ProviderDescriptorError::MissingApiBase)?)?;
		let descriptor = ProviderDescriptor {
			endpoints: ProviderEndpoints { token, revocation, api },
			user_agent: self.user_agent,
		};

		descriptor.validate()?;

		Ok(descriptor)
	}
}

impl ProviderDescriptor {
	/// Validates invariants for the descriptor.
	fn validate(&self) -> Result<(), ProviderDescriptorError> {
		validate_endpoint("token", &self.endpoints.token)?;
		validate_endpoint("revocation", &self.endpoints.revocation)?;
		validate_endpoint("api", &self.endpoints.api)?;

		Ok(())
	}
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), ProviderDescriptorError> {
	if url.scheme() != "https" {
		Err(ProviderDescriptorError::InsecureEndpoint { endpoint: name, url: url.to_string() })
	} else {
		Ok(())
	}
}

// Request paths are joined onto the base, so it must end with `/` to keep its own path.
fn normalize_base(mut url: Url) -> Result<Url, ProviderDescriptorError> {
	if url.cannot_be_a_base() {
		return Err(ProviderDescriptorError::CannotBeABase { url: url.to_string() });
	}
	if !url.path().ends_with('/') {
		let path = format!("{}/", url.path());

		url.set_path(&path);
	}

	Ok(url)
}
