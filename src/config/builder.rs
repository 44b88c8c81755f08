// std
use std::time::Duration as StdDuration;
// self
use crate::{
	_prelude::*,
	config::{AuthEndpoints, ClientConfig, SessionCookieNames},
};

/// Errors raised while constructing or validating client configuration.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ClientConfigError {
	/// The base URL must speak HTTP(S).
	#[error("The base URL must use http or https: {url}.")]
	UnsupportedScheme {
		/// Base URL that failed validation.
		url: String,
	},
	/// The base URL must be a bare origin; request paths are resolved from its root.
	#[error("The base URL must not carry a path, query, or fragment: {url}.")]
	BaseUrlNotOrigin {
		/// Base URL that failed validation.
		url: String,
	},
	/// Paths and view locations must be absolute.
	#[error("The {field} value must start with `/`: {value}.")]
	RelativePath {
		/// Which field failed validation.
		field: &'static str,
		/// Value that failed validation.
		value: String,
	},
	/// Two auth endpoints share the same path.
	#[error("The {first} and {second} endpoints must use distinct paths.")]
	DuplicateEndpoint {
		/// First colliding endpoint.
		first: &'static str,
		/// Second colliding endpoint.
		second: &'static str,
	},
	/// Cookie names must be valid cookie tokens.
	#[error("The {field} cookie name is invalid: {value:?}.")]
	InvalidCookieName {
		/// Which cookie failed validation.
		field: &'static str,
		/// Value that failed validation.
		value: String,
	},
	/// Requests need a positive timeout.
	#[error("The request timeout must be positive.")]
	ZeroTimeout,
}

/// Builder for [`ClientConfig`] values.
#[derive(Debug)]
pub struct ClientConfigBuilder {
	/// Origin (and optional base path) of the API.
	pub base_url: Url,
	/// Auth endpoint paths.
	pub endpoints: AuthEndpoints,
	/// Protected view prefix.
	pub protected_prefix: String,
	/// Login view location.
	pub login_location: String,
	/// Dashboard view location.
	pub dashboard_location: String,
	/// Session cookie names.
	pub cookies: SessionCookieNames,
	/// Per-request timeout.
	pub timeout: StdDuration,
}
impl ClientConfigBuilder {
	/// Creates a new builder seeded with defaults and the provided base URL.
	pub fn new(base_url: Url) -> Self {
		Self {
			base_url,
			endpoints: AuthEndpoints::default(),
			protected_prefix: ClientConfig::default_protected_prefix(),
			login_location: ClientConfig::default_login_location(),
			dashboard_location: ClientConfig::default_dashboard_location(),
			cookies: SessionCookieNames::default(),
			timeout: StdDuration::from_millis(ClientConfig::DEFAULT_TIMEOUT_MS),
		}
	}

	/// Sets the login endpoint path.
	pub fn login_path(mut self, path: impl Into<String>) -> Self {
		self.endpoints.login = path.into();

		self
	}

	/// Sets the refresh endpoint path.
	pub fn refresh_path(mut self, path: impl Into<String>) -> Self {
		self.endpoints.refresh = path.into();

		self
	}

	/// Sets the logout endpoint path.
	pub fn logout_path(mut self, path: impl Into<String>) -> Self {
		self.endpoints.logout = path.into();

		self
	}

	/// Sets the protected view prefix.
	pub fn protected_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.protected_prefix = prefix.into();

		self
	}

	/// Sets the login view location.
	pub fn login_location(mut self, location: impl Into<String>) -> Self {
		self.login_location = location.into();

		self
	}

	/// Sets the dashboard view location.
	pub fn dashboard_location(mut self, location: impl Into<String>) -> Self {
		self.dashboard_location = location.into();

		self
	}

	/// Overrides the session cookie names.
	pub fn cookies(mut self, cookies: SessionCookieNames) -> Self {
		self.cookies = cookies;

		self
	}

	/// Overrides the per-request timeout (defaults to 10 seconds).
	pub fn timeout(mut self, timeout: StdDuration) -> Self {
		self.timeout = timeout;

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<ClientConfig, ClientConfigError> {
		let timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
		let config = ClientConfig {
			base_url: self.base_url,
			endpoints: self.endpoints,
			protected_prefix: self.protected_prefix,
			login_location: self.login_location,
			dashboard_location: self.dashboard_location,
			cookies: self.cookies,
			timeout_ms,
		};

		config.validate()?;

		Ok(config)
	}
}

impl ClientConfig {
	/// Validates invariants for the configuration.
	pub fn validate(&self) -> Result<(), ClientConfigError> {
		if !matches!(self.base_url.scheme(), "http" | "https") {
			return Err(ClientConfigError::UnsupportedScheme { url: self.base_url.to_string() });
		}
		if self.base_url.path() != "/"
			|| self.base_url.query().is_some()
			|| self.base_url.fragment().is_some()
		{
			return Err(ClientConfigError::BaseUrlNotOrigin { url: self.base_url.to_string() });
		}
		if self.timeout_ms == 0 {
			return Err(ClientConfigError::ZeroTimeout);
		}

		let endpoints = [
			("login", &self.endpoints.login),
			("refresh", &self.endpoints.refresh),
			("logout", &self.endpoints.logout),
		];

		for (field, value) in endpoints {
			validate_path(field, value)?;
		}
		for (idx, (first, a)) in endpoints.iter().enumerate() {
			for (second, b) in &endpoints[idx + 1..] {
				if a == b {
					return Err(ClientConfigError::DuplicateEndpoint {
						first: *first,
						second: *second,
					});
				}
			}
		}

		validate_path("protected_prefix", &self.protected_prefix)?;
		validate_path("login_location", &self.login_location)?;
		validate_path("dashboard_location", &self.dashboard_location)?;
		validate_cookie_name("access", &self.cookies.access)?;
		validate_cookie_name("refresh", &self.cookies.refresh)?;

		Ok(())
	}
}

fn validate_path(field: &'static str, value: &str) -> Result<(), ClientConfigError> {
	if value.starts_with('/') {
		Ok(())
	} else {
		Err(ClientConfigError::RelativePath { field, value: value.to_owned() })
	}
}

fn validate_cookie_name(field: &'static str, value: &str) -> Result<(), ClientConfigError> {
	let invalid = value.is_empty()
		|| value
			.chars()
			.any(|c| c.is_whitespace() || c.is_control() || matches!(c, '=' | ';' | ','));

	if invalid {
		Err(ClientConfigError::InvalidCookieName { field, value: value.to_owned() })
	} else {
		Ok(())
	}
}
