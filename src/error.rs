//! Client-level error types shared across the transport, session, and request layers.

// self
use crate::{_prelude::*, request::ApiResponse};

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// No response was received (DNS, TCP, TLS, timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Server answered with a non-success status other than a recoverable 401.
	#[error(transparent)]
	Http(#[from] HttpError),

	/// Terminal authorization failure: the call already went through a refresh cycle or targets
	/// an auth endpoint.
	#[error("Request was rejected as unauthorized with status {}.", .0.status)]
	Unauthorized(HttpError),
	/// Session refresh failed (or was abandoned) while this request waited on it.
	#[error("{failure}")]
	RefreshFailed {
		/// Shared failure observed by every request released with the refresh.
		#[source]
		failure: RefreshFailure,
		/// The caller's own 401 response that led into the refresh, when there was one.
		rejected: Option<HttpError>,
	},
	/// Response body did not match the expected JSON shape.
	#[error("Response body with status {status} could not be decoded.")]
	Decode {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code of the response.
		status: u16,
	},
	/// Request body could not be serialized to JSON.
	#[error("Request body could not be encoded.")]
	Encode(#[source] serde_json::Error),
}
impl Error {
	/// Returns the HTTP status code attached to the failure, if any.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Http(e) | Self::Unauthorized(e) => Some(e.status),
			Self::RefreshFailed { rejected, failure } =>
				rejected.as_ref().map(|e| e.status).or(failure.status),
			Self::Decode { status, .. } => Some(*status),
			_ => None,
		}
	}

	/// Returns true when the caller must sign in again to continue.
	pub fn requires_login(&self) -> bool {
		matches!(self, Self::Unauthorized(_) | Self::RefreshFailed { .. })
	}
}

/// Configuration and validation failures raised by the client.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Client configuration failed validation.
	#[error(transparent)]
	InvalidConfig(#[from] crate::config::ClientConfigError),
	/// Request path cannot be resolved against the base URL.
	#[error("Request path `{path}` cannot be resolved against the base URL.")]
	InvalidPath {
		/// Path supplied by the caller.
		path: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Configuration document could not be parsed.
	#[error("Client configuration could not be parsed.")]
	Parse(#[source] serde_path_to_error::Error<serde_json::Error>),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}

/// Transport-level failures (no response received).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The request exceeded its timeout before a response arrived.
	#[error("Request timed out before the API responded.")]
	Timeout {
		/// Transport-specific timeout error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the API.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Wraps a transport-specific timeout error.
	pub fn timeout(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Timeout { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::timeout(e) } else { Self::network(e) }
	}
}

/// Non-success HTTP response captured for the caller.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Request failed with status {status}.")]
pub struct HttpError {
	/// HTTP status code returned by the API.
	pub status: u16,
	/// Response body decoded as UTF-8 (lossy).
	pub body: String,
	/// Retry-After hint from upstream, if supplied.
	pub retry_after: Option<Duration>,
}
impl HttpError {
	/// Builds an error snapshot from a non-success response.
	pub fn from_response(response: &ApiResponse) -> Self {
		Self {
			status: response.status(),
			body: response.text(),
			retry_after: response.retry_after(),
		}
	}

	/// Returns the API's human-readable message.
	///
	/// The admin API answers failures with `{"error": "..."}` or `{"message": "..."}`; either
	/// field is preferred over the raw body.
	pub fn message(&self) -> String {
		#[derive(Deserialize)]
		struct Envelope {
			error: Option<String>,
			message: Option<String>,
		}

		serde_json::from_str::<Envelope>(&self.body)
			.ok()
			.and_then(|envelope| envelope.error.or(envelope.message))
			.unwrap_or_else(|| self.body.clone())
	}
}

/// Shared outcome handed to every request released by a failed refresh.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Session refresh failed: {reason}.")]
pub struct RefreshFailure {
	/// Status returned by the refresh endpoint, when it answered at all.
	pub status: Option<u16>,
	/// Human-readable failure summary.
	pub reason: String,
}
impl RefreshFailure {
	/// Refresh endpoint answered with a non-success status.
	pub fn rejected(error: &HttpError) -> Self {
		Self {
			status: Some(error.status),
			reason: format!("refresh endpoint answered {}: {}", error.status, error.message()),
		}
	}

	/// Refresh call never received a response.
	pub fn unreachable(error: &TransportError) -> Self {
		Self { status: None, reason: error.to_string() }
	}

	/// The task driving the refresh was dropped before it settled.
	pub fn abandoned() -> Self {
		Self { status: None, reason: "refresh was abandoned before it settled".into() }
	}
}
