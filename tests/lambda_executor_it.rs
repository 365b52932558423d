#![cfg(feature = "reqwest")]

// crates.io
use base64::{Engine, engine::general_purpose::STANDARD};
use httpmock::prelude::*;
// self
use handler_runtime::{
	client::HandlerClient,
	error::{DecodeError, Error, ExecutionError, TransportError},
	executor::LambdaExecutor,
	id::{FunctionName, SubjectId, TaskName},
	msg::{JsonObject, Target},
	url::Url,
};

const FUNCTION: &str = "access-handler";
const INVOKE_PATH: &str = "/2015-03-31/functions/access-handler/invocations";

fn build_client(server: &MockServer) -> HandlerClient {
	let endpoint = Url::parse(&server.base_url()).expect("Mock endpoint should parse.");
	let function = FunctionName::new(FUNCTION).expect("Function name should be valid.");
	let executor =
		LambdaExecutor::new(endpoint, function).expect("Lambda executor should build for mock.");

	HandlerClient::new(executor)
}

#[tokio::test]
async fn load_round_trips_through_invoke_api() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path(INVOKE_PATH)
				.header("x-amz-invocation-type", "RequestResponse")
				.header("x-amz-log-type", "Tail");
			then.status(200).header("content-type", "application/json").body(
				r#"{"response":{"resources":[{"type":"Test","id":"123","name":"Test"}],"tasks":[]}}"#,
			);
		})
		.await;
	let client = build_client(&server);
	let task = TaskName::new("list_tests").expect("Task should be valid.");
	let response = client
		.fetch_resources(&task, JsonObject::new())
		.await
		.expect("Load response should decode.");

	assert!(response.is_terminal());
	assert_eq!(response.resources.len(), 1);
	assert_eq!(response.resources[0].kind, "Test");
	assert_eq!(response.resources[0].id, "123");

	mock.assert_async().await;
}

#[tokio::test]
async fn function_error_surfaces_decoded_logs() {
	let server = MockServer::start_async().await;
	let logs = "START RequestId: 1\nTraceback: KeyError 'group'\nEND RequestId: 1\n";

	server
		.mock_async(|when, then| {
			when.method(POST).path(INVOKE_PATH);
			then.status(200)
				.header("x-amz-function-error", "Unhandled")
				.header("x-amz-log-result", STANDARD.encode(logs))
				.body(r#"{"errorMessage":"'group'","errorType":"KeyError"}"#);
		})
		.await;

	let client = build_client(&server);
	let subject = SubjectId::new("alice@example.com").expect("Subject should be valid.");
	let err = client
		.grant(&subject, &Target::new("Group").with_argument("groupId", "admins"))
		.await
		.expect_err("Function error should fail the grant.");

	match err {
		Error::Execution(ExecutionError::Function { kind, logs: captured }) => {
			assert_eq!(kind, "Unhandled");
			assert_eq!(captured, logs);
		},
		other => panic!("Unexpected error: {other:?}"),
	}
}

#[tokio::test]
async fn non_success_status_is_a_transport_failure() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(POST).path(INVOKE_PATH);
			then.status(403).body(r#"{"message":"not authorized"}"#);
		})
		.await;

	let err = build_client(&server).describe().await.expect_err("403 should fail describe.");

	assert!(err.is_transport());
	assert!(matches!(err, Error::Transport(TransportError::Rejected { status: 403, .. })));
}

#[tokio::test]
async fn unparsable_body_is_a_decode_failure() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(POST).path(INVOKE_PATH);
			then.status(200).body("not json at all");
		})
		.await;

	let err = build_client(&server).describe().await.expect_err("Garbage should fail describe.");

	assert!(matches!(err, Error::Decode(DecodeError::Result { .. })));
}

#[tokio::test]
async fn unreachable_endpoint_is_a_transport_failure() {
	let endpoint = Url::parse("http://127.0.0.1:1").expect("Endpoint should parse.");
	let function = FunctionName::new(FUNCTION).expect("Function name should be valid.");
	let client = HandlerClient::new(
		LambdaExecutor::new(endpoint, function).expect("Lambda executor should build."),
	);
	let err = client.describe().await.expect_err("Closed port should fail describe.");

	assert!(matches!(err, Error::Transport(TransportError::Network { .. })));
}
