//! Typed façade that turns operations into envelope calls and decodes the answers.
//!
//! [`HandlerClient`] is stateless: every method issues exactly one request through its
//! [`Executor`] and decodes the response for that operation. Resource enumeration never loops
//! here; pending tasks come back verbatim and the [`continuation`] module offers opt-in helpers
//! for draining them.

pub mod continuation;

pub use continuation::*;

// crates.io
use serde::de::IgnoredAny;
// self
use crate::{
	_prelude::*,
	executor::Executor,
	id::{SubjectId, TaskName},
	msg::{
		Describe, DescribeResponse, Grant, GrantResponse, LoadResources, LoadResponse, Request,
		RequestPayload, Revoke, Target,
	},
	obs::{self, CallOutcome, CallSpan},
};

/// Runtime client bound to one handler backend.
///
/// Cloning is cheap and clones share the executor. Concurrent calls are allowed and are not
/// coordinated with each other.
#[derive(Clone)]
pub struct HandlerClient {
	executor: Arc<dyn Executor>,
}
impl HandlerClient {
	/// Creates a client that owns `executor`.
	pub fn new<E>(executor: E) -> Self
	where
		E: 'static + Executor,
	{
		Self { executor: Arc::new(executor) }
	}

	/// Creates a client over an executor shared with other owners.
	pub fn from_shared(executor: Arc<dyn Executor>) -> Self {
		Self { executor }
	}

	/// Runs one resource-loading round for `task`.
	///
	/// Follow-up tasks are returned as-is in [`LoadResponse::tasks`]; nothing is resubmitted.
	pub async fn fetch_resources(&self, task: &TaskName, ctx: JsonObject) -> Result<LoadResponse> {
		self.call(LoadResources { task: task.clone(), ctx }, "fetch_resources").await
	}

	/// Asks the handler for its identity, health, config, and schema.
	pub async fn describe(&self) -> Result<DescribeResponse> {
		self.call(Describe {}, "describe").await
	}

	/// Grants `subject` access to `target`.
	///
	/// The returned [`GrantResponse::state`] must be persisted and handed back unchanged to
	/// [`HandlerClient::revoke`].
	pub async fn grant(&self, subject: &SubjectId, target: &Target) -> Result<GrantResponse> {
		self.call(Grant { subject: subject.clone(), target: target.clone() }, "grant").await
	}

	/// Revokes a previous grant, replaying the state it returned.
	///
	/// The state is forwarded without inspection. The handler's response carries no payload but
	/// must still be well-formed JSON.
	pub async fn revoke(
		&self,
		subject: &SubjectId,
		target: &Target,
		state: JsonObject,
	) -> Result<()> {
		self.call::<_, IgnoredAny>(
			Revoke { subject: subject.clone(), target: target.clone(), state },
			"revoke",
		)
		.await
		.map(|_| ())
	}

	async fn call<P, R>(&self, payload: P, stage: &'static str) -> Result<R>
	where
		P: RequestPayload,
		R: DeserializeOwned,
	{
		let operation = P::TYPE;
		let span = CallSpan::new(operation, stage);

		obs::record_call_outcome(operation, CallOutcome::Attempt);

		let result = span
			.instrument(async move {
				let request: Request = payload.into();
				let outcome = self.executor.execute(&request).await?;

				outcome.decode::<R>(operation)
			})
			.await;

		match &result {
			Ok(_) => obs::record_call_outcome(operation, CallOutcome::Success),
			Err(_e) => {
				obs::event!(warn, operation = %operation, error = %_e, "handler call failed");
				obs::record_call_outcome(operation, CallOutcome::Failure);
			},
		}

		result
	}
}
impl Debug for HandlerClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("HandlerClient").finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{envelope::ExecutionResult, executor::MockExecutor, msg::RequestType};

	#[tokio::test]
	async fn fetch_resources_issues_a_single_load() {
		let executor = Arc::new(MockExecutor::returning(ExecutionResult::from_response_bytes(
			r#"{"resources":[],"tasks":[{"task":"next","ctx":{"page":2}}]}"#,
		)));
		let client = HandlerClient::from_shared(executor.clone());
		let task = TaskName::new("first").expect("Task fixture should be valid.");
		let response = client
			.fetch_resources(&task, JsonObject::new())
			.await
			.expect("Load response should decode.");

		assert_eq!(response.tasks.len(), 1);
		assert_eq!(executor.requests().len(), 1);
		assert_eq!(executor.requests()[0].request_type(), RequestType::LoadResources);
	}

	#[tokio::test]
	async fn revoke_accepts_any_json_payload() {
		let client = HandlerClient::new(MockExecutor::returning(
			ExecutionResult::from_response_bytes(r#"{"anything":[1,2,3]}"#),
		));
		let subject = SubjectId::new("bob@example.com").expect("Subject fixture should be valid.");

		client
			.revoke(&subject, &Target::new("Role"), JsonObject::new())
			.await
			.expect("Revoke should ignore the payload shape.");
	}
}
