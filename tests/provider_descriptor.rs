// self
use reddit_dispatch::{
	auth::{Credentials, Username},
	login::{self, GrantType, LoginStrategy},
	provider::{
		ProviderDescriptor, ProviderDescriptorBuilder, ProviderDescriptorError, REDDIT_API_BASE,
		UserAgent, UserAgentError,
	},
	url::Url,
};

fn url(value: &str) -> Url {
	Url::parse(value).expect("Failed to parse mock provider URL.")
}

fn builder() -> ProviderDescriptorBuilder {
	let agent = UserAgent::new("linux:descriptor-tests:1.0 (by /u/tester)")
		.expect("User-Agent fixture should be valid.");

	ProviderDescriptor::builder(agent)
}

#[test]
fn descriptor_rejects_insecure_and_missing_endpoints() {
	let err = builder()
		.token_endpoint(url("https://example.com/token"))
		.revocation_endpoint(url("https://example.com/revoke"))
		.build()
		.expect_err("Descriptor builder should require an API base.");

	assert!(matches!(err, ProviderDescriptorError::MissingApiBase));

	let err = builder()
		.token_endpoint(url("https://example.com/token"))
		.revocation_endpoint(url("http://example.com/revoke"))
		.api_base(url("https://api.example.com"))
		.build()
		.expect_err("Descriptor builder should reject insecure revocation endpoints.");

	assert!(matches!(err, ProviderDescriptorError::InsecureEndpoint { endpoint: "revocation", .. }));
}

#[test]
fn descriptor_keeps_endpoints_and_agent() {
	let descriptor = builder()
		.token_endpoint(url("https://example.com/token"))
		.revocation_endpoint(url("https://example.com/revoke"))
		.api_base(url("https://api.example.com/v2"))
		.build()
		.expect("Descriptor builder should succeed for secure endpoints.");

	assert_eq!(descriptor.endpoints.token.as_str(), "https://example.com/token");
	assert_eq!(descriptor.endpoints.revocation.as_str(), "https://example.com/revoke");
	assert_eq!(descriptor.endpoints.api.as_str(), "https://api.example.com/v2/");
	assert_eq!(descriptor.user_agent.as_str(), "linux:descriptor-tests:1.0 (by /u/tester)");
}

#[test]
fn production_descriptor_requires_a_descriptive_agent() {
	assert!(matches!(UserAgent::new("reqwest/0.12"), Err(UserAgentError::Generic { .. })));

	let username = Username::new("tester").expect("Username fixture should be valid.");
	let agent = UserAgent::for_app("android", "com.example.reader", "v3.1", &username)
		.expect("Recommended agents should validate.");
	let descriptor =
		ProviderDescriptor::reddit(agent).expect("Production descriptor should build.");

	assert_eq!(descriptor.endpoints.api.as_str(), format!("{REDDIT_API_BASE}/"));
	assert_eq!(descriptor.user_agent.to_string(), "android:com.example.reader:v3.1 (by /u/tester)");
}

#[test]
fn default_strategy_follows_credentials() {
	let app = Credentials::app("client", "secret");
	let user =
		app.clone().with_user(Username::new("tester").expect("Username should be valid."), "pw");

	assert_eq!(login::default_strategy(&app).grant_type(), GrantType::ClientCredentials);
	assert_eq!(login::default_strategy(&user).grant_type(), GrantType::Password);
}
