//! Scripted executor for exercising clients without a handler.

// self
use crate::{
	_prelude::*,
	envelope::ExecutionResult,
	executor::{ExecuteFuture, Executor},
	msg::Request,
};

type Responder = dyn Fn(&Request) -> Result<ExecutionResult> + Send + Sync;

/// Executor that answers every request from a caller-supplied closure and records what it saw.
///
/// ```
/// use handler_runtime::{envelope::ExecutionResult, executor::MockExecutor};
///
/// let executor = MockExecutor::returning(ExecutionResult::from_response_bytes("{}"));
///
/// assert!(executor.requests().is_empty());
/// ```
pub struct MockExecutor {
	responder: Box<Responder>,
	requests: Mutex<Vec<Request>>,
}
impl MockExecutor {
	/// Answers each request by calling `responder`.
	pub fn new<F>(responder: F) -> Self
	where
		F: 'static + Fn(&Request) -> Result<ExecutionResult> + Send + Sync,
	{
		Self { responder: Box::new(responder), requests: Mutex::new(Vec::new()) }
	}

	/// Answers every request with a clone of `result`.
	pub fn returning(result: ExecutionResult) -> Self {
		Self::new(move |_| Ok(result.clone()))
	}

	/// Answers every request with an error built by `make_error`.
	pub fn failing<F>(make_error: F) -> Self
	where
		F: 'static + Fn() -> Error + Send + Sync,
	{
		Self::new(move |_| Err(make_error()))
	}

	/// Requests received so far, oldest first.
	pub fn requests(&self) -> Vec<Request> {
		self.requests.lock().clone()
	}
}
impl Executor for MockExecutor {
	fn execute<'a>(&'a self, request: &'a Request) -> ExecuteFuture<'a> {
		Box::pin(async move {
			self.requests.lock().push(request.clone());

			(self.responder)(request)
		})
	}
}
impl Debug for MockExecutor {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("MockExecutor").field("requests", &self.requests.lock().len()).finish()
	}
}
