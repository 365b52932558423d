#![cfg(unix)]

// std
use std::{
	fs::{self, Permissions},
	os::unix::fs::PermissionsExt,
	sync::Arc,
	time::Duration,
};
// crates.io
use parking_lot::Mutex;
use tempfile::TempDir;
// self
use handler_runtime::{
	client::HandlerClient,
	envelope::Envelope,
	error::{Error, ExecutionError, TransportError},
	executor::{DEFAULT_ENTRY_POINT, Executor, LocalExecutor, ProcessEnvironment, StderrSink},
	id::{SubjectId, TaskName},
	msg::{Describe, JsonObject, Request, RequestType, Target},
	serde_json::{self, Value},
};

// Shell startup may define these on its own, so they say nothing about what was inherited.
const SHELL_DEFAULTS: &[&str] = &[
	"HOME", "HOSTNAME", "HOSTTYPE", "IFS", "MACHTYPE", "OLDPWD", "OPTIND", "OSTYPE", "PATH", "PPID",
	"PS1", "PS2", "PS4", "PWD", "SHELL", "SHLVL", "TERM", "UID", "EUID", "_",
];

/// Picks a variable this test process already carries and no shell defines by itself.
///
/// The test harness exports `CARGO_*` variables, so those are preferred.
fn inherited_variable() -> String {
	let names = std::env::vars_os()
		.filter_map(|(name, _)| name.into_string().ok())
		.filter(|name| {
			name.starts_with(|c: char| c.is_ascii_uppercase())
				&& name.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
				&& !name.starts_with("BASH")
				&& name != "HANDLER_TOKEN"
				&& !SHELL_DEFAULTS.contains(&name.as_str())
		})
		.collect::<Vec<_>>();

	names
		.iter()
		.find(|name| name.starts_with("CARGO_"))
		.or_else(|| names.first())
		.cloned()
		.expect("Test process should carry at least one ordinary environment variable.")
}

/// Installs `body` as the handler entry point inside a fresh checkout.
fn install_handler(body: &str) -> TempDir {
	let dir = tempfile::tempdir().expect("Temporary checkout should be created.");
	let entry = dir.path().join(DEFAULT_ENTRY_POINT);

	fs::create_dir_all(entry.parent().expect("Entry point should have a parent."))
		.expect("Entry point directory should be created.");
	fs::write(&entry, format!("#!/bin/sh\n{body}\n")).expect("Entry point should be written.");
	fs::set_permissions(&entry, Permissions::from_mode(0o755))
		.expect("Entry point should be made executable.");

	dir
}

#[tokio::test]
async fn handler_receives_envelope_and_answers_on_stdout() {
	let checkout = install_handler(
		r#"[ "$1" = run ] || exit 64
printf '%s' "$2" > request.json
printf '{"response":{"access_instructions":"use the console","state":{"b":1.50,"a":"x"}}}'"#,
	);
	let client = HandlerClient::new(LocalExecutor::new(
		checkout.path(),
		ProcessEnvironment::Inherit,
	));
	let subject = SubjectId::new("alice@example.com").expect("Subject should be valid.");
	let target = Target::new("Group").with_argument("groupId", "admins");
	let grant = client.grant(&subject, &target).await.expect("Grant should succeed.");

	assert_eq!(grant.access_instructions, "use the console");
	assert_eq!(
		serde_json::to_string(&grant.state).expect("State should serialize."),
		r#"{"b":1.50,"a":"x"}"#
	);

	let sent = fs::read(checkout.path().join("request.json"))
		.expect("Handler should have recorded its payload.");
	let request = Envelope::decode(&sent).expect("Recorded payload should be an envelope.");

	assert!(matches!(request, Request::Grant(ref g) if g.subject == subject && g.target == target));
}

#[tokio::test]
async fn non_zero_exit_reports_stderr_tail() {
	let checkout = install_handler("echo 'Traceback: boom' >&2\nexit 3");
	let captured = Arc::new(Mutex::new(Vec::<u8>::new()));
	let client = HandlerClient::new(
		LocalExecutor::new(checkout.path(), ProcessEnvironment::Inherit)
			.with_stderr(StderrSink::Writer(captured.clone())),
	);
	let task = TaskName::new("list_groups").expect("Task should be valid.");
	let err = client
		.fetch_resources(&task, JsonObject::new())
		.await
		.expect_err("Failing handler should fail the load.");

	match err {
		Error::Execution(ExecutionError::ProcessExit { code, stderr }) => {
			assert_eq!(code, Some(3));
			assert!(stderr.contains("Traceback: boom"), "Unexpected stderr: {stderr}.");
		},
		other => panic!("Unexpected error: {other:?}"),
	}

	assert_eq!(captured.lock().as_slice(), b"Traceback: boom\n");
}

#[tokio::test]
async fn garbage_stdout_is_a_decode_failure() {
	let checkout = install_handler("echo 'starting up'");
	let client =
		HandlerClient::new(LocalExecutor::new(checkout.path(), ProcessEnvironment::Inherit));
	let err = client.describe().await.expect_err("Log lines are not a result envelope.");

	assert!(err.is_decode());
}

#[tokio::test]
async fn missing_entry_point_is_a_spawn_failure() {
	let checkout = tempfile::tempdir().expect("Temporary checkout should be created.");
	let client =
		HandlerClient::new(LocalExecutor::new(checkout.path(), ProcessEnvironment::Inherit));
	let err = client.describe().await.expect_err("Missing entry point should fail.");

	assert!(matches!(err, Error::Transport(TransportError::Spawn { .. })));
}

#[tokio::test]
async fn explicit_environment_replaces_parent_variables() {
	let parent = inherited_variable();
	let checkout = install_handler(&format!(
		r#"printf '{{"response":{{"token":"%s","parent":"%s"}}}}' "${{HANDLER_TOKEN:-unset}}" "${{{parent}+present}}""#
	));
	let request = Request::from(Describe {});
	let run = |environment| {
		let executor = LocalExecutor::new(checkout.path(), environment);
		let request = &request;

		async move {
			executor
				.execute(request)
				.await
				.expect("Environment-echoing handler should succeed.")
				.decode::<Value>(RequestType::Describe)
				.expect("Handler output should be JSON.")
		}
	};
	let explicit = run(ProcessEnvironment::explicit([("HANDLER_TOKEN", "t-1")])).await;
	let inherited = run(ProcessEnvironment::Inherit).await;

	assert_eq!(explicit, serde_json::json!({ "token": "t-1", "parent": "" }), "{parent} leaked.");
	assert_eq!(inherited["parent"], "present", "{parent} should be inherited.");
}

#[tokio::test]
async fn dropping_the_call_kills_the_handler() {
	let checkout = install_handler("sleep 1\necho done > marker");
	let client =
		HandlerClient::new(LocalExecutor::new(checkout.path(), ProcessEnvironment::Inherit));
	let started = tokio::time::Instant::now();
	let outcome = tokio::time::timeout(Duration::from_millis(200), client.describe()).await;

	assert!(outcome.is_err(), "Call should still be running when the timeout fires.");
	assert!(started.elapsed() < Duration::from_millis(900));

	tokio::time::sleep(Duration::from_millis(1_500)).await;

	assert!(!checkout.path().join("marker").exists(), "Handler should have been killed.");
}

#[tokio::test]
async fn background_descendants_do_not_hold_the_call_open() {
	let checkout = install_handler(
		"(sleep 5; echo late) &\nprintf '{\"response\":{\"resources\":[{\"type\":\"Group\",\"id\":\"g-1\"}]}}'",
	);
	let client =
		HandlerClient::new(LocalExecutor::new(checkout.path(), ProcessEnvironment::Inherit));
	let task = TaskName::new("list_groups").expect("Task fixture should be valid.");
	let started = tokio::time::Instant::now();
	let round = tokio::time::timeout(
		Duration::from_secs(3),
		client.fetch_resources(&task, JsonObject::new()),
	)
	.await
	.expect("Call should finish once the handler exits.")
	.expect("Output written before exit should decode.");

	assert!(started.elapsed() < Duration::from_secs(3));
	assert_eq!(round.resources.len(), 1);
	assert_eq!(round.resources[0].id, "g-1");
}
