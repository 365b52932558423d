//! Execution backends that carry one framed request to a handler and bring back its result.
//!
//! [`Executor`] is the runtime's only dependency on a transport. The client hands it a
//! [`Request`], the executor frames it as an [`Envelope`](crate::envelope::Envelope), performs
//! the invocation, and returns the raw [`ExecutionResult`] without interpreting the payload.
//! Implementations must acquire and release every transport resource inside one `execute`
//! call; dropping the returned future must abort the invocation.

#[cfg(feature = "reqwest")] pub mod lambda;
pub mod local;
pub mod mock;

#[cfg(feature = "reqwest")] pub use lambda::*;
pub use local::*;
pub use mock::*;

// self
use crate::{_prelude::*, envelope::ExecutionResult, msg::Request};

/// Boxed future returned by [`Executor::execute`].
pub type ExecuteFuture<'a> = Pin<Box<dyn Future<Output = Result<ExecutionResult>> + 'a + Send>>;

/// Capability to perform one request/response invocation against a handler.
pub trait Executor
where
	Self: Send + Sync,
{
	/// Invokes the handler with `request` and returns its framed result.
	///
	/// Failures are classified as [`Error::Transport`], [`Error::Execution`], or
	/// [`Error::Decode`]; implementations never retry.
	fn execute<'a>(&'a self, request: &'a Request) -> ExecuteFuture<'a>;
}
impl<E> Executor for Arc<E>
where
	E: ?Sized + Executor,
{
	fn execute<'a>(&'a self, request: &'a Request) -> ExecuteFuture<'a> {
		E::execute(self, request)
	}
}
