//! API request and response values.

// std
use std::borrow::Cow;
// crates.io
use oauth2::http::{HeaderMap, Method, StatusCode};
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	error::{ConfigError, FailureCause},
};

const MESSAGE_PREVIEW_LIMIT: usize = 256;

/// Request against the provider's API, relative to the descriptor's API base URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiRequest {
	/// HTTP method.
	pub method: Method,
	/// Path relative to the API base (a leading `/` is ignored).
	pub path: String,
	/// Query parameters appended to the URL.
	pub query: Vec<(String, String)>,
	/// Form fields sent as an `application/x-www-form-urlencoded` body.
	pub form: Option<Vec<(String, String)>>,
}
impl ApiRequest {
	/// Creates a request for `method` and `path`.
	pub fn new(method: Method, path: impl Into<String>) -> Self {
		Self { method, path: path.into(), query: Vec::new(), form: None }
	}

	/// `GET` request.
	pub fn get(path: impl Into<String>) -> Self {
		Self::new(Method::GET, path)
	}

	/// `POST` request.
	pub fn post(path: impl Into<String>) -> Self {
		Self::new(Method::POST, path)
	}

	/// `PUT` request.
	pub fn put(path: impl Into<String>) -> Self {
		Self::new(Method::PUT, path)
	}

	/// `PATCH` request.
	pub fn patch(path: impl Into<String>) -> Self {
		Self::new(Method::PATCH, path)
	}

	/// `DELETE` request.
	pub fn delete(path: impl Into<String>) -> Self {
		Self::new(Method::DELETE, path)
	}

	/// Appends a query parameter.
	pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.query.push((key.into(), value.into()));

		self
	}

	/// Appends a form field; the request then carries a form body.
	pub fn form(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.form.get_or_insert_with(Vec::new).push((key.into(), value.into()));

		self
	}

	/// Resolves the request URL against `base`, refusing anything that leaves the API origin.
	pub fn resolve(&self, base: &Url) -> Result<Url, ConfigError> {
		let mut url = base.join(self.path.trim_start_matches('/')).map_err(|source| {
			ConfigError::InvalidRequestPath { path: self.path.clone(), source }
		})?;

		if url.origin() != base.origin() {
			return Err(ConfigError::RequestOutsideApi { url: url.to_string() });
		}
		if !self.query.is_empty() {
			url.query_pairs_mut().extend_pairs(self.query.iter());
		}

		Ok(url)
	}

	/// Encodes the form body, if any.
	pub(crate) fn encoded_form(&self) -> Option<String> {
		self.form.as_ref().map(|fields| {
			url::form_urlencoded::Serializer::new(String::new()).extend_pairs(fields.iter()).finish()
		})
	}
}

/// Successful API response.
#[derive(Clone, Debug)]
pub struct ApiResponse {
	/// HTTP status code (always 2xx).
	pub status: u16,
	/// Response headers.
	pub headers: HeaderMap,
	/// Raw response body.
	pub body: Vec<u8>,
}
impl ApiResponse {
	/// Body decoded as UTF-8, replacing invalid sequences.
	pub fn text(&self) -> Cow<'_, str> {
		String::from_utf8_lossy(&self.body)
	}

	/// Parses the body as JSON, reporting the path of any mismatch.
	pub fn json<T>(&self) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let mut de = serde_json::Deserializer::from_slice(&self.body);

		serde_path_to_error::deserialize(&mut de).map_err(|source| {
			FailureCause::MalformedResponse { source, status: Some(self.status) }.into()
		})
	}
}

/// Extracts a human-readable message from an error response body.
pub(crate) fn error_message(status: StatusCode, body: &[u8]) -> String {
	if let Ok(serde_json::Value::Object(fields)) = serde_json::from_slice(body) {
		for key in ["message", "error"] {
			match fields.get(key) {
				Some(serde_json::Value::String(text)) if !text.is_empty() => return text.clone(),
				Some(serde_json::Value::Number(code)) => return code.to_string(),
				_ => {},
			}
		}
	}

	let text = String::from_utf8_lossy(body);
	let text = text.trim();

	if !text.is_empty() {
		return truncate_preview(text);
	}

	status.canonical_reason().unwrap_or("Unknown status").to_owned()
}

fn truncate_preview(body: &str) -> String {
	if body.chars().count() <= MESSAGE_PREVIEW_LIMIT {
		return body.to_owned();
	}

	let mut buf = body.chars().take(MESSAGE_PREVIEW_LIMIT).collect::<String>();

	buf.push('…');

	buf
}
