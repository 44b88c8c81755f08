//! Optional observability hooks for client calls.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to wrap every client call in an `info` span named
//!   `donation_portal_client.call` carrying `call` (request, refresh, replay, login, logout) and
//!   `stage` (the client method that opened it).
//! - Enable `metrics` to increment the `donation_portal_client_call_total` counter labeled by
//!   `call` + `outcome` (attempt, success, failure).
//!
//! Both hooks compile down to nothing when their feature is off.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Kinds of calls the client issues on behalf of its caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallKind {
	/// First dispatch of a caller's request.
	Request,
	/// Call to the refresh endpoint.
	Refresh,
	/// Resend of a request released by a successful refresh.
	Replay,
	/// Call to the login endpoint.
	Login,
	/// Call to the logout endpoint.
	Logout,
}
impl CallKind {
	/// Stable label used in span and metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CallKind::Request => "request",
			CallKind::Refresh => "refresh",
			CallKind::Replay => "replay",
			CallKind::Login => "login",
			CallKind::Logout => "logout",
		}
	}
}
impl Display for CallKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded per call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallOutcome {
	/// The call was started.
	Attempt,
	/// The call produced a usable response.
	Success,
	/// The call surfaced an error to its caller.
	Failure,
}
impl CallOutcome {
	/// Stable label used in span and metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CallOutcome::Attempt => "attempt",
			CallOutcome::Success => "success",
			CallOutcome::Failure => "failure",
		}
	}

	/// Maps a finished call's result onto its outcome label.
	pub fn of<T, E>(result: &std::result::Result<T, E>) -> Self {
		if result.is_ok() { CallOutcome::Success } else { CallOutcome::Failure }
	}
}
impl Display for CallOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
