//! Local-process executor that runs a handler from its source checkout.
//!
//! The handler is launched as `{working_dir}/.venv/bin/commonfate-provider-py run <envelope>`.
//! Standard output carries the result envelope; standard error is diagnostic only and is
//! forwarded to a [`StderrSink`] without being parsed. The child is killed when the call future
//! is dropped, so cancelling a call never leaves the handler running.
//!
//! Only the direct child is killed. Processes the handler starts in the background keep running,
//! and may keep its pipes open after it exits; reading stops [`PIPE_DRAIN_GRACE`] after the
//! handler exits, with whatever output arrived by then.

// std
use std::{
	io::Write,
	path::{Path, PathBuf},
	pin::pin,
	process::Stdio,
	time::Duration,
};
// crates.io
use tokio::{
	io::{AsyncRead, AsyncReadExt},
	process::Command,
};
// self
use crate::{
	_prelude::*,
	envelope::{Envelope, ExecutionResult},
	error::{ExecutionError, TransportError},
	executor::{ExecuteFuture, Executor},
	msg::Request,
	obs,
};

/// Entry point installed by the provider framework inside a handler checkout.
pub const DEFAULT_ENTRY_POINT: &str = ".venv/bin/commonfate-provider-py";

const RUN_SUBCOMMAND: &str = "run";
const STDERR_TAIL_LIMIT: usize = 4 * 1024;
const READ_CHUNK: usize = 8 * 1024;

/// How long pipes may stay open once the handler itself has exited.
pub const PIPE_DRAIN_GRACE: Duration = Duration::from_millis(250);

/// Environment handed to the handler process.
///
/// Has no default. [`ProcessEnvironment::Inherit`] passes every credential in the caller's
/// environment on to the handler.
#[derive(Clone, PartialEq, Eq)]
pub enum ProcessEnvironment {
	/// The child sees the caller's full environment.
	Inherit,
	/// The child sees exactly these variables and nothing else.
	Explicit(Vec<(String, String)>),
}
impl ProcessEnvironment {
	/// Builds an explicit environment from key/value pairs.
	pub fn explicit<I, K, V>(vars: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		Self::Explicit(vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
	}

	fn apply(&self, command: &mut Command) {
		if let Self::Explicit(vars) = self {
			command.env_clear();
			command.envs(vars.iter().map(|(k, v)| (k.as_str(), v.as_str())));
		}
	}
}
impl Debug for ProcessEnvironment {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Inherit => f.write_str("Inherit"),
			// Values may be secrets.
			Self::Explicit(vars) => {
				let keys = vars.iter().map(|(k, _)| k).collect::<Vec<_>>();

				f.debug_tuple("Explicit").field(&keys).finish()
			},
		}
	}
}

/// Destination for the handler's standard error.
#[derive(Clone, Default)]
pub enum StderrSink {
	/// Share the caller's standard error.
	#[default]
	Inherit,
	/// Drop diagnostics entirely.
	Discard,
	/// Stream diagnostics into a shared writer.
	Writer(Arc<Mutex<dyn Write + Send>>),
}
impl StderrSink {
	/// Streams diagnostics into `writer`.
	pub fn writer<W>(writer: W) -> Self
	where
		W: 'static + Write + Send,
	{
		Self::Writer(Arc::new(Mutex::new(writer)))
	}

	fn stdio(&self) -> Stdio {
		match self {
			Self::Inherit => Stdio::inherit(),
			Self::Discard => Stdio::null(),
			Self::Writer(_) => Stdio::piped(),
		}
	}

	/// Copies `stream` into the sink, keeping the last [`STDERR_TAIL_LIMIT`] bytes in `tail`.
	async fn pump<R>(&self, mut stream: R, tail: &mut Vec<u8>) -> std::io::Result<()>
	where
		R: AsyncRead + Unpin,
	{
		let mut chunk = vec![0_u8; READ_CHUNK];

		loop {
			let n = stream.read(&mut chunk).await?;

			if n == 0 {
				break;
			}
			if let Self::Writer(writer) = self {
				writer.lock().write_all(&chunk[..n])?;
			}

			tail.extend_from_slice(&chunk[..n]);

			if tail.len() > STDERR_TAIL_LIMIT {
				tail.drain(..tail.len() - STDERR_TAIL_LIMIT);
			}
		}

		Ok(())
	}
}
impl Debug for StderrSink {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Inherit => f.write_str("Inherit"),
			Self::Discard => f.write_str("Discard"),
			Self::Writer(_) => f.write_str("Writer(..)"),
		}
	}
}

/// Runs handlers as local subprocesses.
#[derive(Clone, Debug)]
pub struct LocalExecutor {
	working_dir: PathBuf,
	environment: ProcessEnvironment,
	entry_point: PathBuf,
	stderr: StderrSink,
}
impl LocalExecutor {
	/// Creates an executor for the handler checked out at `working_dir`.
	pub fn new(working_dir: impl Into<PathBuf>, environment: ProcessEnvironment) -> Self {
		Self {
			working_dir: working_dir.into(),
			environment,
			entry_point: PathBuf::from(DEFAULT_ENTRY_POINT),
			stderr: StderrSink::default(),
		}
	}

	/// Overrides where the handler's standard error goes.
	pub fn with_stderr(mut self, sink: StderrSink) -> Self {
		self.stderr = sink;

		self
	}

	/// Overrides the entry point; relative paths resolve against the working directory.
	pub fn with_entry_point(mut self, entry_point: impl Into<PathBuf>) -> Self {
		self.entry_point = entry_point.into();

		self
	}

	/// Working directory the handler runs in.
	pub fn working_dir(&self) -> &Path {
		&self.working_dir
	}

	/// Resolved program path.
	pub fn program(&self) -> PathBuf {
		self.working_dir.join(&self.entry_point)
	}

	fn command(&self, program: &Path, payload: &str) -> Command {
		let mut command = Command::new(program);

		command
			.arg(RUN_SUBCOMMAND)
			.arg(payload)
			.current_dir(&self.working_dir)
			.stdin(Stdio::null())
			.stdout(Stdio::piped())
			.stderr(self.stderr.stdio())
			.kill_on_drop(true);
		self.environment.apply(&mut command);

		command
	}

	async fn run(&self, request: &Request) -> Result<ExecutionResult> {
		let envelope = Envelope::from_request(request)?;
		let payload = serde_json::to_string(&envelope).map_err(Error::Encode)?;
		let program = self.program();

		obs::event!(
			debug,
			program = %program.display(),
			operation = %envelope.kind,
			"spawning local handler"
		);

		let mut child = self.command(&program, &payload).spawn().map_err(|source| {
			TransportError::Spawn { program: program.display().to_string(), source }
		})?;
		let stdout = child.stdout.take();
		let stderr = child.stderr.take();
		let mut output = Vec::new();
		let mut stderr_tail = Vec::new();
		let status = {
			let read_stdout = async {
				if let Some(stdout) = stdout {
					read_into(stdout, &mut output).await?;
				}

				Ok::<_, std::io::Error>(())
			};
			let read_stderr = async {
				match stderr {
					Some(stderr) => self.stderr.pump(stderr, &mut stderr_tail).await,
					None => Ok(()),
				}
			};
			let mut streams = pin!(async { tokio::try_join!(read_stdout, read_stderr) });
			let mut wait = pin!(child.wait());

			let status = tokio::select! {
				streams_closed = &mut streams => {
					streams_closed.map_err(TransportError::from)?;

					(&mut wait).await.map_err(TransportError::from)?
				},
				status = &mut wait => {
					let status = status.map_err(TransportError::from)?;

					match tokio::time::timeout(PIPE_DRAIN_GRACE, &mut streams).await {
						Ok(streams_closed) => {
							streams_closed.map_err(TransportError::from)?;
						},
						Err(_) => {
							obs::event!(
								warn,
								program = %program.display(),
								"local handler exited but its pipes stayed open"
							);
						},
					}

					status
				},
			};

			status
		};
		let stderr_tail = String::from_utf8_lossy(&stderr_tail).into_owned();

		if !status.success() {
			obs::event!(warn, code = ?status.code(), "local handler exited unsuccessfully");

			return Err(
				ExecutionError::ProcessExit { code: status.code(), stderr: stderr_tail }.into()
			);
		}

		ExecutionResult::from_slice(&output)
	}
}

/// Reads `stream` into `buf` one chunk at a time, so an interrupted read keeps what arrived.
async fn read_into<R>(mut stream: R, buf: &mut Vec<u8>) -> std::io::Result<()>
where
	R: AsyncRead + Unpin,
{
	let mut chunk = vec![0_u8; READ_CHUNK];

	loop {
		let n = stream.read(&mut chunk).await?;

		if n == 0 {
			return Ok(());
		}

		buf.extend_from_slice(&chunk[..n]);
	}
}

impl Executor for LocalExecutor {
	fn execute<'a>(&'a self, request: &'a Request) -> ExecuteFuture<'a> {
		Box::pin(self.run(request))
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn relative_entry_point_resolves_against_working_dir() {
		let executor = LocalExecutor::new("/srv/provider", ProcessEnvironment::Inherit);

		assert_eq!(
			executor.program(),
			PathBuf::from("/srv/provider/.venv/bin/commonfate-provider-py")
		);

		let executor = executor.with_entry_point("/usr/local/bin/handler");

		assert_eq!(executor.program(), PathBuf::from("/usr/local/bin/handler"));
	}

	#[test]
	fn explicit_environment_debug_hides_values() {
		let env = ProcessEnvironment::explicit([("API_TOKEN", "hunter2")]);
		let rendered = format!("{env:?}");

		assert!(rendered.contains("API_TOKEN"));
		assert!(!rendered.contains("hunter2"));
	}

	#[tokio::test]
	async fn pump_keeps_only_the_tail() {
		let captured = Arc::new(Mutex::new(Vec::<u8>::new()));
		let sink = StderrSink::Writer(captured.clone());
		let input = vec![b'x'; STDERR_TAIL_LIMIT * 2 + 7];
		let mut tail = Vec::new();

		sink.pump(input.as_slice(), &mut tail)
			.await
			.expect("Pumping an in-memory stream should succeed.");

		assert_eq!(tail.len(), STDERR_TAIL_LIMIT);
		assert_eq!(captured.lock().len(), input.len());
	}
}
