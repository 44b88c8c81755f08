// self
use crate::{_prelude::*, auth::Secret};

/// Email + password pair posted to the login endpoint as `{"email": .., "password": ..}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LoginCredentials {
	/// Admin account email.
	pub email: String,
	/// Account password.
	pub password: Secret,
}
impl LoginCredentials {
	/// Pairs an email with its password.
	pub fn new(email: impl Into<String>, password: impl Into<Secret>) -> Self {
		Self { email: email.into(), password: password.into() }
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn credentials_encode_as_login_body_and_debug_redacts() {
		let credentials = LoginCredentials::new("treasurer@example.org", "correct horse");
		let body = serde_json::to_value(&credentials).expect("Credentials should serialize.");

		assert_eq!(
			body,
			serde_json::json!({ "email": "treasurer@example.org", "password": "correct horse" })
		);
		assert!(!format!("{credentials:?}").contains("correct horse"));
	}
}
