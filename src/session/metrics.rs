// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Per-client session refresh counters, shared by every clone of an [`AuthenticatedClient`].
///
/// Only the batch leader touches `refresh_calls` and its outcome counters, so
/// `refresh_calls() == renewed() + rejected()` once no refresh is in flight (a leader dropped
/// mid-call is counted as a call with neither outcome). `parked` counts requests that waited on a
/// batch instead of calling the refresh endpoint themselves.
///
/// [`AuthenticatedClient`]: crate::client::AuthenticatedClient
#[derive(Debug, Default)]
pub struct RefreshMetrics {
	refresh_calls: AtomicU64,
	renewed: AtomicU64,
	rejected: AtomicU64,
	parked: AtomicU64,
}
impl RefreshMetrics {
	/// Calls made to the refresh endpoint.
	pub fn attempts(&self) -> u64 {
		self.refresh_calls.load(Ordering::Relaxed)
	}

	/// Refresh calls that answered 2xx and renewed the session cookies.
	pub fn successes(&self) -> u64 {
		self.renewed.load(Ordering::Relaxed)
	}

	/// Refresh calls that were refused or never got a response; each one failed a whole batch.
	pub fn failures(&self) -> u64 {
		self.rejected.load(Ordering::Relaxed)
	}

	/// Requests parked behind another request's refresh.
	pub fn queued(&self) -> u64 {
		self.parked.load(Ordering::Relaxed)
	}

	pub(crate) fn record_attempt(&self) {
		self.refresh_calls.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_success(&self) {
		self.renewed.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.rejected.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_queued(&self) {
		self.parked.fetch_add(1, Ordering::Relaxed);
	}
}
