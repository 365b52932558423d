// self
use crate::{msg::RequestType, obs::CallOutcome};

/// Records a call outcome via the global metrics recorder (when enabled).
pub fn record_call_outcome(operation: RequestType, outcome: CallOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"handler_runtime_call_total",
			"operation" => operation.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (operation, outcome);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn record_call_outcome_noop_without_metrics() {
		record_call_outcome(RequestType::Grant, CallOutcome::Failure);
	}
}
