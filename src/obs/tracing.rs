// self
use crate::{_prelude::*, msg::RequestType};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedCall<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedCall<F> = F;

/// A span builder used by client operations.
#[derive(Clone, Debug)]
pub struct CallSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl CallSpan {
	/// Creates a new span tagged with the operation and the stage (call site).
	pub fn new(operation: RequestType, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span =
				tracing::info_span!("handler_runtime.call", operation = operation.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (operation, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedCall<Fut>
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
	async fn instrument_wraps_future() {
		let span = CallSpan::new(RequestType::Describe, "instrument_wraps_future");
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}
}
