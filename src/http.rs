//! Transport primitives for calls to the admin API.
//!
//! The module exposes [`HttpTransport`], the client's only dependency on an HTTP stack, alongside
//! the [`TransportCall`] value handed to it for each dispatch. Implementations must send the
//! session cookies with every call and report "no response" conditions as [`TransportError`]
//! so the client can keep them out of the refresh flow.

// std
use std::time::Duration as StdDuration;
// crates.io
#[cfg(feature = "reqwest")]
use reqwest::{Method as ReqwestMethod, header::HeaderMap};
use time::format_description::well_known::Rfc2822;
// self
use crate::{
	_prelude::*,
	error::TransportError,
	request::{ApiRequest, ApiResponse},
};
#[cfg(feature = "reqwest")]
use crate::{error::ConfigError, request::Method};

/// Boxed future returned by [`HttpTransport::execute`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<ApiResponse, TransportError>> + 'a + Send>>;

/// One dispatch of an [`ApiRequest`] with its URL and timeout resolved by the client.
#[derive(Clone, Copy, Debug)]
pub struct TransportCall<'a> {
	/// Fully resolved URL, query string included.
	pub url: &'a Url,
	/// Request being dispatched (method, headers, body).
	pub request: &'a ApiRequest,
	/// Effective timeout for this dispatch.
	pub timeout: StdDuration,
}

/// Abstraction over HTTP transports capable of executing cookie-credentialed API calls.
///
/// Implementations must be `Send + Sync + 'static` so one transport can be shared by every clone
/// of a client, and the futures they return must be `Send` so callers can drive requests from any
/// task. A transport only moves bytes: it never interprets status codes, so a 401 comes back as an
/// ordinary [`ApiResponse`] and the client decides whether to refresh.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Sends the call and collects the full response.
	///
	/// Return [`TransportError::Timeout`] when the call exceeds `call.timeout`, and
	/// [`TransportError::Network`] for any other failure that produced no response.
	fn execute<'a>(&'a self, call: TransportCall<'a>) -> TransportFuture<'a>;
}

/// Thin wrapper around [`ReqwestClient`] with a cookie store so session cookies set by the login
/// and refresh endpoints ride along on every later call.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Builds a transport with an in-memory cookie store.
	pub fn new() -> Result<Self> {
		let client = ReqwestClient::builder()
			.cookie_store(true)
			.build()
			.map_err(ConfigError::http_client_build)?;

		Ok(Self(client))
	}

	/// Wraps an existing reqwest [`ReqwestClient`].
	///
	/// The client must have a cookie store enabled (`cookie_store(true)` or a custom
	/// `cookie_provider`); otherwise refreshed session cookies are never sent back.
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestTransport {
	fn execute<'a>(&'a self, call: TransportCall<'a>) -> TransportFuture<'a> {
		Box::pin(async move {
			let mut builder = self
				.0
				.request(reqwest_method(call.request.method()), call.url.clone())
				.timeout(call.timeout);

			for (name, value) in call.request.headers() {
				builder = builder.header(name.as_str(), value.as_str());
			}
			if let Some(body) = call.request.body() {
				builder = builder.body(body.to_vec());
			}

			let response = builder.send().await?;
			let status = response.status().as_u16();
			let headers = collect_headers(response.headers());
			let body = response.bytes().await?;

			Ok(ApiResponse::new(status, headers, body.to_vec()))
		})
	}
}

#[cfg(feature = "reqwest")]
fn reqwest_method(method: Method) -> ReqwestMethod {
	match method {
		Method::Get => ReqwestMethod::GET,
		Method::Post => ReqwestMethod::POST,
		Method::Put => ReqwestMethod::PUT,
		Method::Patch => ReqwestMethod::PATCH,
		Method::Delete => ReqwestMethod::DELETE,
	}
}

#[cfg(feature = "reqwest")]
fn collect_headers(headers: &HeaderMap) -> Vec<(String, String)> {
	headers
		.iter()
		.filter_map(|(name, value)| {
			value.to_str().ok().map(|value| (name.as_str().to_owned(), value.to_owned()))
		})
		.collect()
}

/// Parses a `Retry-After` value given in seconds or as an RFC 2822 date.
pub(crate) fn parse_retry_after(raw: &str) -> Option<Duration> {
	let raw = raw.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return Some(Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX)));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}
