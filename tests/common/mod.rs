//! Helpers shared by the integration tests.

#![allow(dead_code)]

// crates.io
use parking_lot::Mutex;
// self
use donation_portal_client::{ClientConfig, navigation::NavigationHook, url::Url};

/// Navigation hook that reports a fixed view and records every redirect.
#[derive(Debug, Default)]
pub struct RecordingNavigation {
	location: Mutex<Option<String>>,
	redirects: Mutex<Vec<String>>,
}
impl RecordingNavigation {
	pub fn at(location: &str) -> Self {
		Self { location: Mutex::new(Some(location.to_owned())), redirects: Default::default() }
	}

	pub fn redirects(&self) -> Vec<String> {
		self.redirects.lock().clone()
	}
}
impl NavigationHook for RecordingNavigation {
	fn current_location(&self) -> Option<String> {
		self.location.lock().clone()
	}

	fn redirect(&self, location: &str) {
		self.redirects.lock().push(location.to_owned());
		*self.location.lock() = Some(location.to_owned());
	}
}

/// Default configuration rooted at `base_url`.
pub fn config(base_url: &str) -> ClientConfig {
	ClientConfig::builder(Url::parse(base_url).expect("Test base URL should parse."))
		.build()
		.expect("Default test configuration should validate.")
}
