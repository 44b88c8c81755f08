// self
use crate::{_prelude::*, obs::CallKind};

/// Future returned by [`CallSpan::instrument`]; a plain passthrough without `tracing`.
#[cfg(feature = "tracing")]
pub type InstrumentedCall<F> = tracing::instrument::Instrumented<F>;
/// Future returned by [`CallSpan::instrument`]; a plain passthrough without `tracing`.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedCall<F> = F;

/// Span wrapping one client call.
#[derive(Clone, Debug)]
pub struct CallSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl CallSpan {
	/// Opens a span for `kind`, tagged with the calling `stage`.
	pub fn new(kind: CallKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			Self {
				span: tracing::info_span!(
					"donation_portal_client.call",
					call = kind.as_str(),
					stage
				),
			}
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Records a diagnostic event inside the span.
	pub fn note(&self, message: &str) {
		#[cfg(feature = "tracing")]
		self.span.in_scope(|| tracing::debug!("{message}"));

		#[cfg(not(feature = "tracing"))]
		let _ = message;
	}

	/// Attaches the span to `fut` so it is entered on every poll, never across an `.await`.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedCall<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			tracing::Instrument::instrument(fut, self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn instrumented_future_keeps_its_output() {
		let span = CallSpan::new(CallKind::Request, "instrumented_future_keeps_its_output");

		span.note("dispatching");

		assert_eq!(span.instrument(async { "receipt" }).await, "receipt");
	}
}
