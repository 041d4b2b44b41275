// self
use crate::{_prelude::*, obs::StageKind};

/// Type alias that resolves to an instrumented future when tracing is
/// enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedStage<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedStage<F> = F;

/// A span builder used by broker pipeline stages.
#[derive(Clone, Debug)]
pub struct StageSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl StageSpan {
	/// Creates a new span tagged with the provided stage.
	pub fn new(kind: StageKind) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("embed_broker.stage", stage = kind.as_str());

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = kind;

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await`
	/// points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedStage<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
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
	async fn instrument_passes_the_value_through() {
		let span = StageSpan::new(StageKind::Assemble);
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}
}
