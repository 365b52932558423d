//! Runtime-level error types shared across executors, the client, and config resolution.

// self
use crate::{_prelude::*, msg::RequestType};

/// Runtime-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn StdError + Send + Sync>;

/// Path-aware JSON failure produced while decoding handler output.
#[derive(Debug, ThisError)]
#[error("JSON does not match the expected shape at `{path}`.")]
pub struct JsonError {
	/// Location of the failure, `.` for the document root.
	pub path: String,
	/// Underlying parser failure.
	#[source]
	pub source: serde_json::Error,
}
impl JsonError {
	/// Wraps a failure that has no meaningful path (e.g. trailing bytes).
	pub fn at_root(source: serde_json::Error) -> Self {
		Self { path: ".".into(), source }
	}
}
impl From<serde_path_to_error::Error<serde_json::Error>> for JsonError {
	fn from(e: serde_path_to_error::Error<serde_json::Error>) -> Self {
		Self { path: e.path().to_string(), source: e.into_inner() }
	}
}

/// Canonical runtime error exposed by public APIs.
///
/// The three invocation classes stay distinct so callers can tell "the backend could not be
/// reached" ([`Error::Transport`]) from "the handler ran and failed" ([`Error::Execution`])
/// from "the handler violated the wire contract" ([`Error::Decode`]).
#[derive(Debug, ThisError)]
pub enum Error {
	/// The backend could not be reached at all.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// The backend was reached but the handler reported failure.
	#[error(transparent)]
	Execution(#[from] ExecutionError),
	/// The backend returned bytes that do not match the expected shape.
	#[error(transparent)]
	Decode(#[from] DecodeError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),

	/// The request could not be serialized into an envelope.
	#[error("Request could not be encoded.")]
	Encode(#[source] serde_json::Error),
	/// Resource enumeration still had pending tasks after the caller's round limit.
	#[error("Resource enumeration exceeded {limit} rounds with {pending} task(s) pending.")]
	RoundLimit {
		/// Maximum number of rounds the caller allowed.
		limit: usize,
		/// Number of tasks left unprocessed.
		pending: usize,
	},
}
impl Error {
	/// Returns `true` for failures reaching the backend.
	pub fn is_transport(&self) -> bool {
		matches!(self, Self::Transport(_))
	}

	/// Returns `true` when the handler itself reported failure.
	pub fn is_execution(&self) -> bool {
		matches!(self, Self::Execution(_))
	}

	/// Returns `true` when the handler's output violated the wire contract.
	pub fn is_decode(&self) -> bool {
		matches!(self, Self::Decode(_))
	}
}

/// Transport-level failures (network, process spawn, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while invoking the handler.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Invocation API refused the call before the handler ran.
	#[error("Invocation API rejected the call with status {status}: {message}.")]
	Rejected {
		/// HTTP status code.
		status: u16,
		/// Response body preview.
		message: String,
	},
	/// Handler process could not be started.
	#[error("Failed to spawn handler process `{program}`.")]
	Spawn {
		/// Program that failed to launch.
		program: String,
		/// Underlying OS failure.
		#[source]
		source: std::io::Error,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while invoking the handler.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// Failures reported by the handler after it was reached.
#[derive(Debug, ThisError)]
pub enum ExecutionError {
	/// Managed function reported an error; `logs` holds the captured log tail.
	#[error("Function execution error: {kind}: {logs}")]
	Function {
		/// Error kind reported by the function runtime (e.g. `Unhandled`).
		kind: String,
		/// Decoded log output captured alongside the invocation.
		logs: String,
	},
	/// Local handler process exited unsuccessfully.
	#[error("Handler process exited with {}: {stderr}", exit_label(.code))]
	ProcessExit {
		/// Exit code, absent when the process was terminated by a signal.
		code: Option<i32>,
		/// Tail of the captured standard error, when it was piped.
		stderr: String,
	},
}

fn exit_label(code: &Option<i32>) -> String {
	match code {
		Some(code) => format!("status {code}"),
		None => "a signal".into(),
	}
}

/// Handler output that does not match the wire contract.
#[derive(Debug, ThisError)]
pub enum DecodeError {
	/// Output is not a `{"response": ...}` object.
	#[error("Handler output is not a valid result envelope.")]
	Result {
		/// Structured parsing failure.
		#[source]
		source: JsonError,
	},
	/// Response payload does not match the shape expected for the operation.
	#[error("Handler returned a malformed {operation} response.")]
	Response {
		/// Operation whose response failed to decode.
		operation: RequestType,
		/// Structured parsing failure.
		#[source]
		source: JsonError,
	},
	/// Envelope bytes or payload could not be decoded into a request.
	#[error("Request envelope is malformed.")]
	Envelope {
		/// Structured parsing failure.
		#[source]
		source: JsonError,
	},
}

/// Configuration and validation failures raised by the runtime.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Invocation endpoint cannot carry a path.
	#[error("Invocation endpoint `{endpoint}` is not a valid base URL.")]
	InvalidEndpoint {
		/// Offending endpoint.
		endpoint: String,
	},
	/// A config resolver failed fatally.
	#[error("Config resolver failed for `{key}`.")]
	Resolver {
		/// Config key being resolved.
		key: String,
		/// Underlying resolver failure.
		#[source]
		source: BoxError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}

	/// Wraps a resolver failure for `key`.
	pub fn resolver(key: impl Into<String>, src: impl Into<BoxError>) -> Self {
		Self::Resolver { key: key.into(), source: src.into() }
	}
}
