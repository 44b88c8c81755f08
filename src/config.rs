//! Client configuration: where the API lives, which paths are auth endpoints, and which views are
//! protected.
//!
//! [`ClientConfig`] is immutable once built. Construct it through [`ClientConfig::builder`] or
//! deserialize it with [`ClientConfig::from_json`]; both paths run the same validation so a
//! client never starts with relative paths, colliding auth endpoints, or a zero timeout.

/// Builder API and validation errors for client configuration.
pub mod builder;

pub use builder::*;

// std
use std::time::Duration as StdDuration;
// self
use crate::{_prelude::*, error::ConfigError};

/// Auth endpoints that never enter the refresh-retry flow.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthEndpoints {
	/// Credential exchange issuing the session cookies.
	pub login: String,
	/// Rotates the session cookies; `POST` with no body.
	pub refresh: String,
	/// Clears the session cookies.
	pub logout: String,
}
impl AuthEndpoints {
	/// Checks whether `path` targets one of the auth endpoints (query strings ignored).
	pub fn is_auth_endpoint(&self, path: &str) -> bool {
		let path = strip_query(path);

		[&self.login, &self.refresh, &self.logout].into_iter().any(|endpoint| endpoint == path)
	}
}
impl Default for AuthEndpoints {
	fn default() -> Self {
		Self {
			login: "/api/auth/login".into(),
			refresh: "/api/auth/refresh".into(),
			logout: "/api/auth/logout".into(),
		}
	}
}

/// Cookie names the server uses for the session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionCookieNames {
	/// Short-lived access token cookie.
	pub access: String,
	/// Long-lived refresh token cookie.
	pub refresh: String,
}
impl Default for SessionCookieNames {
	fn default() -> Self {
		Self { access: "access_token".into(), refresh: "refresh_token".into() }
	}
}

/// Immutable client configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
	/// Origin every request path is resolved against; it must not carry a path of its own.
	pub base_url: Url,
	/// Auth endpoint paths.
	#[serde(default)]
	pub endpoints: AuthEndpoints,
	/// Path prefix of the admin views that require a session.
	#[serde(default = "ClientConfig::default_protected_prefix")]
	pub protected_prefix: String,
	/// Location the navigation hook is sent to when the session cannot be recovered.
	#[serde(default = "ClientConfig::default_login_location")]
	pub login_location: String,
	/// Landing view for signed-in users who open the login page.
	#[serde(default = "ClientConfig::default_dashboard_location")]
	pub dashboard_location: String,
	/// Session cookie names consulted by the route gate.
	#[serde(default)]
	pub cookies: SessionCookieNames,
	/// Per-request timeout in milliseconds.
	#[serde(default = "ClientConfig::default_timeout_ms")]
	pub timeout_ms: u64,
}
impl ClientConfig {
	const DEFAULT_TIMEOUT_MS: u64 = 10_000;

	/// Creates a new builder for the provided base URL.
	pub fn builder(base_url: Url) -> ClientConfigBuilder {
		ClientConfigBuilder::new(base_url)
	}

	/// Parses and validates a JSON configuration document.
	///
	/// Only `base_url` is mandatory; every other field falls back to the builder defaults.
	pub fn from_json(raw: &str) -> Result<Self> {
		let de = &mut serde_json::Deserializer::from_str(raw);
		let config: Self = serde_path_to_error::deserialize(de).map_err(ConfigError::Parse)?;

		config.validate().map_err(ConfigError::from)?;

		Ok(config)
	}

	/// Default per-request timeout.
	pub fn timeout(&self) -> StdDuration {
		StdDuration::from_millis(self.timeout_ms)
	}

	/// Checks whether a view location sits under the protected prefix.
	///
	/// Matching is segment-aware: `/admin` and `/admin/users` are protected, `/administrator` is
	/// not.
	pub fn is_protected(&self, location: &str) -> bool {
		path_has_prefix(strip_query(location), &self.protected_prefix)
	}

	/// Checks whether a resolved request URL hits one of the auth endpoints on the API origin.
	pub fn targets_auth_endpoint(&self, url: &Url) -> bool {
		url.origin() == self.base_url.origin() && self.endpoints.is_auth_endpoint(url.path())
	}

	fn default_protected_prefix() -> String {
		"/admin".into()
	}

	fn default_login_location() -> String {
		"/login".into()
	}

	fn default_dashboard_location() -> String {
		"/admin".into()
	}

	fn default_timeout_ms() -> u64 {
		Self::DEFAULT_TIMEOUT_MS
	}
}

pub(crate) fn strip_query(path: &str) -> &str {
	path.split(['?', '#']).next().unwrap_or(path)
}

pub(crate) fn path_has_prefix(path: &str, prefix: &str) -> bool {
	let prefix = prefix.trim_end_matches('/');

	if prefix.is_empty() {
		return true;
	}

	match path.strip_prefix(prefix) {
		Some(rest) => rest.is_empty() || rest.starts_with('/'),
		None => false,
	}
}
