//! Provider descriptor data structures and helpers shared by the dispatcher.

/// Builder API for assembling provider descriptors.
pub mod builder;
/// User-Agent validation.
pub mod user_agent;

pub use builder::*;
pub use user_agent::*;

// self
use crate::_prelude::*;

/// Production token endpoint.
pub const REDDIT_TOKEN_ENDPOINT: &str = "https://www.reddit.com/api/v1/access_token";
/// Production revocation endpoint.
pub const REDDIT_REVOCATION_ENDPOINT: &str = "https://www.reddit.com/api/v1/revoke_token";
/// Base URL for OAuth-authenticated API calls.
pub const REDDIT_API_BASE: &str = "https://oauth.reddit.com";

/// Endpoint set declared by a provider descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEndpoints {
	/// Token endpoint used for logins and refreshes.
	pub token: Url,
	/// Revocation endpoint used by `logout`.
	pub revocation: Url,
	/// Base URL that request paths are resolved against.
	pub api: Url,
}

/// Immutable provider descriptor consumed by the dispatcher.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderDescriptor {
	/// Endpoint definitions exposed by the provider.
	pub endpoints: ProviderEndpoints,
	/// User-Agent stamped on every outbound call.
	pub user_agent: UserAgent,
}
impl ProviderDescriptor {
	/// Creates a new builder for the provided User-Agent.
	pub fn builder(user_agent: UserAgent) -> ProviderDescriptorBuilder {
		ProviderDescriptorBuilder::new(user_agent)
	}

	/// Descriptor for the production endpoints.
	pub fn reddit(user_agent: UserAgent) -> Result<Self, ProviderDescriptorError> {
		Self::builder(user_agent)
			.token_endpoint(parse_endpoint("token", REDDIT_TOKEN_ENDPOINT)?)
			.revocation_endpoint(parse_endpoint("revocation", REDDIT_REVOCATION_ENDPOINT)?)
			.api_base(parse_endpoint("api", REDDIT_API_BASE)?)
			.build()
	}
}

fn parse_endpoint(endpoint: &'static str, raw: &str) -> Result<Url, ProviderDescriptorError> {
	Url::parse(raw)
		.map_err(|_| ProviderDescriptorError::InvalidEndpoint { endpoint, url: raw.to_owned() })
}
