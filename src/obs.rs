//! Optional observability helpers for handler calls.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `handler_runtime.call` with the `operation`
//!   (wire tag) and `stage` (call site) fields, plus diagnostic events from the executors.
//! - Enable `metrics` to increment the `handler_runtime_call_total` counter for every
//!   attempt/success/failure, labeled by `operation` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Outcome labels recorded for each call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallOutcome {
	/// Entry to a client operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl CallOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CallOutcome::Attempt => "attempt",
			CallOutcome::Success => "success",
			CallOutcome::Failure => "failure",
		}
	}
}
impl Display for CallOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Emits a `tracing` event at `$level` when the feature is enabled; otherwise evaluates nothing.
macro_rules! event {
	($level:ident, $($arg:tt)+) => {
		#[cfg(feature = "tracing")]
		{
			::tracing::$level!($($arg)+);
		}
	};
}
pub(crate) use event;
