// self
use crate::obs::{CallKind, CallOutcome};

/// Bumps the call counter on the global metrics recorder (no-op without the `metrics` feature).
pub fn record_call_outcome(kind: CallKind, outcome: CallOutcome) {
	#[cfg(feature = "metrics")]
	metrics::counter!(
		"donation_portal_client_call_total",
		"call" => kind.as_str(),
		"outcome" => outcome.as_str()
	)
	.increment(1);

	#[cfg(not(feature = "metrics"))]
	let _ = (kind, outcome);
}
