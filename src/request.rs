//! Transport-agnostic request and response values exchanged with the admin API.

// std
use std::time::Duration as StdDuration;
// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	config::strip_query,
	error::{ConfigError, HttpError},
	http,
};

/// HTTP methods used by the admin API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
	/// Reads (lists, detail views, CSV exports).
	Get,
	/// Creates records and drives the auth endpoints.
	Post,
	/// Replaces records.
	Put,
	/// Partially updates records.
	Patch,
	/// Deletes records.
	Delete,
}
impl Method {
	/// Returns the canonical method token.
	pub const fn as_str(self) -> &'static str {
		match self {
			Method::Get => "GET",
			Method::Post => "POST",
			Method::Put => "PUT",
			Method::Patch => "PATCH",
			Method::Delete => "DELETE",
		}
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outbound call to the API.
///
/// The `retried` flag records whether this exact call already went through one refresh cycle;
/// the client sets it before the replay and never refreshes on behalf of a retried call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiRequest {
	method: Method,
	path: String,
	query: Vec<(String, String)>,
	headers: BTreeMap<String, String>,
	body: Option<Vec<u8>>,
	timeout: Option<StdDuration>,
	retried: bool,
}
impl ApiRequest {
	/// Creates a request for `path`, resolved later against the configured base URL.
	pub fn new(method: Method, path: impl Into<String>) -> Self {
		Self {
			method,
			path: path.into(),
			query: Vec::new(),
			headers: BTreeMap::new(),
			body: None,
			timeout: None,
			retried: false,
		}
	}

	/// Shorthand for a `GET` request.
	pub fn get(path: impl Into<String>) -> Self {
		Self::new(Method::Get, path)
	}

	/// Shorthand for a `POST` request.
	pub fn post(path: impl Into<String>) -> Self {
		Self::new(Method::Post, path)
	}

	/// Shorthand for a `PUT` request.
	pub fn put(path: impl Into<String>) -> Self {
		Self::new(Method::Put, path)
	}

	/// Shorthand for a `DELETE` request.
	pub fn delete(path: impl Into<String>) -> Self {
		Self::new(Method::Delete, path)
	}

	/// Appends a query parameter (pagination, filters, export formats).
	pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
		self.query.push((key.into(), value.to_string()));

		self
	}

	/// Sets a header; names are stored lower-cased.
	pub fn header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
		self.headers.insert(name.as_ref().to_ascii_lowercase(), value.into());

		self
	}

	/// Serializes `body` as the JSON payload.
	pub fn json<T>(mut self, body: &T) -> Result<Self>
	where
		T: ?Sized + Serialize,
	{
		let bytes = serde_json::to_vec(body).map_err(Error::Encode)?;

		self.headers.insert("content-type".into(), "application/json".into());
		self.body = Some(bytes);

		Ok(self)
	}

	/// Overrides the configured timeout for this call only.
	pub fn timeout(mut self, timeout: StdDuration) -> Self {
		self.timeout = Some(timeout);

		self
	}

	/// HTTP method.
	pub fn method(&self) -> Method {
		self.method
	}

	/// Path relative to the base URL, as supplied by the caller.
	pub fn path(&self) -> &str {
		&self.path
	}

	/// Path without query string or fragment.
	pub fn route(&self) -> &str {
		strip_query(&self.path)
	}

	/// Query parameters in insertion order.
	pub fn query_pairs(&self) -> &[(String, String)] {
		&self.query
	}

	/// Lower-cased request headers.
	pub fn headers(&self) -> &BTreeMap<String, String> {
		&self.headers
	}

	/// Encoded request body.
	pub fn body(&self) -> Option<&[u8]> {
		self.body.as_deref()
	}

	/// Timeout override for this call.
	pub fn timeout_override(&self) -> Option<StdDuration> {
		self.timeout
	}

	/// Whether this call already went through a refresh-retry cycle.
	pub fn is_retried(&self) -> bool {
		self.retried
	}

	pub(crate) fn mark_retried(&mut self) {
		self.retried = true;
	}

	/// Resolves the full URL (path + query) against `base`.
	pub fn url(&self, base: &Url) -> Result<Url> {
		let mut url = base
			.join(&self.path)
			.map_err(|source| ConfigError::InvalidPath { path: self.path.clone(), source })?;

		if !self.query.is_empty() {
			url.query_pairs_mut().extend_pairs(&self.query);
		}

		Ok(url)
	}
}

/// Response received from the API, independent of the transport that produced it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiResponse {
	status: u16,
	headers: BTreeMap<String, String>,
	body: Vec<u8>,
}
impl ApiResponse {
	/// Creates a response; header names are lower-cased.
	pub fn new<I, K, V>(status: u16, headers: I, body: impl Into<Vec<u8>>) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: AsRef<str>,
		V: Into<String>,
	{
		let headers =
			headers.into_iter().map(|(k, v)| (k.as_ref().to_ascii_lowercase(), v.into())).collect();

		Self { status, headers, body: body.into() }
	}

	/// Shorthand for a JSON response without extra headers.
	pub fn json_body(status: u16, body: impl Into<Vec<u8>>) -> Self {
		Self::new(status, [("content-type", "application/json")], body)
	}

	/// HTTP status code.
	pub fn status(&self) -> u16 {
		self.status
	}

	/// True for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// True when the API reports an expired or missing access token.
	pub fn is_unauthorized(&self) -> bool {
		self.status == 401
	}

	/// Looks up a header by (case-insensitive) name.
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
	}

	/// Raw body bytes.
	pub fn bytes(&self) -> &[u8] {
		&self.body
	}

	/// Body decoded as UTF-8 (lossy), e.g. for CSV exports.
	pub fn text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}

	/// Retry-After hint expressed as a relative duration.
	pub fn retry_after(&self) -> Option<Duration> {
		self.header("retry-after").and_then(http::parse_retry_after)
	}

	/// Decodes the JSON body; an empty body decodes as `null`.
	pub fn json<T>(&self) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let raw: &[u8] =
			if self.body.iter().all(u8::is_ascii_whitespace) { b"null" } else { &self.body };
		let de = &mut serde_json::Deserializer::from_slice(raw);

		serde_path_to_error::deserialize(de)
			.map_err(|source| Error::Decode { source, status: self.status })
	}

	/// Converts a non-success response into [`Error::Http`].
	pub fn error_for_status(self) -> Result<Self> {
		if self.is_success() { Ok(self) } else { Err(HttpError::from_response(&self).into()) }
	}
}
