//! Coarse route gate for admin views, driven by session cookie presence.
//!
//! The gate only checks that a session cookie exists; it never validates tokens. A stale cookie
//! lets the view load, after which the first API call goes through the normal 401 and refresh
//! flow. Either cookie opens the gate, since a refresh cookie alone can recover a missing access
//! token.

// self
use crate::{
	_prelude::*,
	config::{ClientConfig, SessionCookieNames, path_has_prefix, strip_query},
};

/// Session cookies present on an incoming view request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionCookies {
	/// Access token cookie present.
	pub access: bool,
	/// Refresh token cookie present.
	pub refresh: bool,
}
impl SessionCookies {
	/// Reads presence of the named cookies from a `Cookie` header (`a=1; b=2`).
	///
	/// Cookies with an empty value count as absent; that is how the logout endpoint clears them.
	pub fn from_cookie_header(header: &str, names: &SessionCookieNames) -> Self {
		let mut cookies = Self::default();

		for pair in header.split(';') {
			let Some((name, value)) = pair.split_once('=') else {
				continue;
			};

			if value.trim().is_empty() {
				continue;
			}

			let name = name.trim();

			if name == names.access {
				cookies.access = true;
			} else if name == names.refresh {
				cookies.refresh = true;
			}
		}

		cookies
	}

	/// True when either session cookie is present.
	pub fn any(&self) -> bool {
		self.access || self.refresh
	}
}

/// What to do with a view request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RouteDecision {
	/// Render the requested view.
	Allow,
	/// Protected view without a session.
	RedirectToLogin {
		/// Login view location.
		location: String,
	},
	/// Login view while a session already exists.
	RedirectToDashboard {
		/// Dashboard view location.
		location: String,
	},
}

/// Route gate bound to one client configuration.
#[derive(Clone, Debug)]
pub struct RouteGate {
	config: Arc<ClientConfig>,
}
impl RouteGate {
	/// Creates a gate over `config`.
	pub fn new(config: impl Into<Arc<ClientConfig>>) -> Self {
		Self { config: config.into() }
	}

	/// Decides whether the view at `path` may render given the session cookies present.
	pub fn evaluate(&self, path: &str, cookies: &SessionCookies) -> RouteDecision {
		let route = strip_query(path);

		if self.config.is_protected(route) && !cookies.any() {
			return RouteDecision::RedirectToLogin { location: self.config.login_location.clone() };
		}
		if path_has_prefix(route, &self.config.login_location) && cookies.any() {
			return RouteDecision::RedirectToDashboard {
				location: self.config.dashboard_location.clone(),
			};
		}

		RouteDecision::Allow
	}

	/// Like [`RouteGate::evaluate`], reading cookies straight from a `Cookie` header.
	pub fn evaluate_header(&self, path: &str, cookie_header: Option<&str>) -> RouteDecision {
		let cookies = cookie_header
			.map(|header| SessionCookies::from_cookie_header(header, &self.config.cookies))
			.unwrap_or_default();

		self.evaluate(path, &cookies)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn gate() -> RouteGate {
		let base = Url::parse("https://portal.example.org").expect("Base URL fixture should parse.");

		RouteGate::new(ClientConfig::builder(base).build().expect("Default config should build."))
	}

	#[test]
	fn cookie_header_parsing_ignores_unrelated_and_cleared_cookies() {
		let names = SessionCookieNames::default();

		assert_eq!(
			SessionCookies::from_cookie_header("theme=dark; access_token=abc", &names),
			SessionCookies { access: true, refresh: false }
		);
		assert_eq!(
			SessionCookies::from_cookie_header("access_token=; refresh_token=xyz", &names),
			SessionCookies { access: false, refresh: true }
		);
		assert!(!SessionCookies::from_cookie_header("", &names).any());
	}

	#[test]
	fn protected_views_require_a_session_cookie() {
		let gate = gate();

		assert_eq!(
			gate.evaluate_header("/admin/contributions", None),
			RouteDecision::RedirectToLogin { location: "/login".into() }
		);
		assert_eq!(
			gate.evaluate_header("/admin?tab=users", Some("refresh_token=r1")),
			RouteDecision::Allow
		);
		assert_eq!(gate.evaluate_header("/administrator", None), RouteDecision::Allow);
	}

	#[test]
	fn login_view_bounces_signed_in_users() {
		let gate = gate();

		assert_eq!(
			gate.evaluate_header("/login", Some("access_token=a1")),
			RouteDecision::RedirectToDashboard { location: "/admin".into() }
		);
		assert_eq!(gate.evaluate_header("/login", None), RouteDecision::Allow);
		assert_eq!(gate.evaluate_header("/", Some("access_token=a1")), RouteDecision::Allow);
	}
}
