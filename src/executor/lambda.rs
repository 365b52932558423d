//! Managed-function executor backed by the Lambda Invoke REST API.
//!
//! Each call is a synchronous `RequestResponse` invocation with the log tail requested, so a
//! function-level failure can be reported together with the output the function printed before
//! it died. Request signing is delegated to a caller-supplied [`RequestSigner`]; the executor
//! only frames, sends, and classifies.

// crates.io
use base64::{
	Engine,
	engine::general_purpose::{STANDARD, URL_SAFE},
};
use reqwest::{
	Request as ReqwestRequest,
	header::{CONTENT_TYPE, HeaderMap},
};
// self
use crate::{
	_prelude::*,
	envelope::{Envelope, ExecutionResult},
	error::{ConfigError, ExecutionError, TransportError},
	executor::{ExecuteFuture, Executor},
	id::FunctionName,
	msg::Request,
	obs,
};

const INVOKE_API_VERSION: &str = "2015-03-31";
const INVOCATION_TYPE_HEADER: &str = "x-amz-invocation-type";
const LOG_TYPE_HEADER: &str = "x-amz-log-type";
const FUNCTION_ERROR_HEADER: &str = "x-amz-function-error";
const LOG_RESULT_HEADER: &str = "x-amz-log-result";
const ERROR_PREVIEW_LIMIT: usize = 512;

/// Attaches credentials to an outbound invocation without tying the executor to one scheme.
///
/// Implementations typically add SigV4 headers. A signer failure is reported as a transport
/// error because the function was never reached.
pub trait RequestSigner
where
	Self: 'static + Send + Sync,
{
	/// Consumes the prepared request and returns it signed.
	fn sign(&self, request: ReqwestRequest) -> Result<ReqwestRequest, TransportError>;
}

/// Invokes handlers deployed as managed functions.
#[derive(Clone)]
pub struct LambdaExecutor {
	http_client: ReqwestClient,
	endpoint: Url,
	function: FunctionName,
	signer: Option<Arc<dyn RequestSigner>>,
}
impl LambdaExecutor {
	/// Creates an executor that calls `function` through the Invoke API at `endpoint`.
	pub fn new(endpoint: Url, function: FunctionName) -> Result<Self> {
		if endpoint.cannot_be_a_base() {
			return Err(ConfigError::InvalidEndpoint { endpoint: endpoint.into() }.into());
		}

		let http_client = ReqwestClient::builder().build().map_err(ConfigError::http_client_build)?;

		Ok(Self { http_client, endpoint, function, signer: None })
	}

	/// Creates an executor for the public regional endpoint, e.g. `us-west-2`.
	pub fn for_region(region: &str, function: FunctionName) -> Result<Self> {
		let raw = format!("https://lambda.{region}.amazonaws.com");
		let endpoint =
			Url::parse(&raw).map_err(|_| ConfigError::InvalidEndpoint { endpoint: raw })?;

		Self::new(endpoint, function)
	}

	/// Replaces the HTTP client, e.g. to share a connection pool or set timeouts.
	pub fn with_http_client(mut self, client: ReqwestClient) -> Self {
		self.http_client = client;

		self
	}

	/// Signs every invocation with `signer`.
	pub fn with_signer(mut self, signer: impl RequestSigner) -> Self {
		self.signer = Some(Arc::new(signer));

		self
	}

	/// Function this executor invokes.
	pub fn function(&self) -> &FunctionName {
		&self.function
	}

	/// Full invocation URL for the configured function.
	pub fn invoke_url(&self) -> Result<Url> {
		let mut url = self.endpoint.clone();

		url.path_segments_mut()
			.map_err(|_| ConfigError::InvalidEndpoint { endpoint: self.endpoint.to_string() })?
			.pop_if_empty()
			.extend([INVOKE_API_VERSION, "functions", self.function.as_str(), "invocations"]);

		Ok(url)
	}

	async fn invoke(&self, request: &Request) -> Result<ExecutionResult> {
		let payload = Envelope::encode(request)?;
		let outbound = self
			.http_client
			.post(self.invoke_url()?)
			.header(CONTENT_TYPE, "application/json")
			.header(INVOCATION_TYPE_HEADER, "RequestResponse")
			.header(LOG_TYPE_HEADER, "Tail")
			.body(payload)
			.build()
			.map_err(TransportError::from)?;
		let outbound = match &self.signer {
			Some(signer) => signer.sign(outbound)?,
			None => outbound,
		};

		obs::event!(
			debug,
			function = %self.function,
			operation = %request.request_type(),
			"invoking managed handler"
		);

		let response = self.http_client.execute(outbound).await.map_err(TransportError::from)?;
		let status = response.status();
		let headers = response.headers().clone();
		let body = response.bytes().await.map_err(TransportError::from)?;

		if !status.is_success() {
			return Err(TransportError::Rejected {
				status: status.as_u16(),
				message: preview(&body),
			}
			.into());
		}
		if let Some(kind) = header_str(&headers, FUNCTION_ERROR_HEADER) {
			let logs = header_str(&headers, LOG_RESULT_HEADER).map(decode_logs).unwrap_or_default();

			return Err(ExecutionError::Function { kind: kind.to_owned(), logs }.into());
		}

		ExecutionResult::from_slice(&body)
	}
}
impl Executor for LambdaExecutor {
	fn execute<'a>(&'a self, request: &'a Request) -> ExecuteFuture<'a> {
		Box::pin(self.invoke(request))
	}
}
impl Debug for LambdaExecutor {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("LambdaExecutor")
			.field("endpoint", &self.endpoint.as_str())
			.field("function", &self.function)
			.field("signed", &self.signer.is_some())
			.finish()
	}
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
	headers.get(name).and_then(|value| value.to_str().ok())
}

/// Decodes the base64 log tail; the standard alphabet is tried before the URL-safe one.
#[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
fn decode_logs(encoded: &str) -> String {
	let trimmed = encoded.trim();

	match STANDARD.decode(trimmed).or_else(|_| URL_SAFE.decode(trimmed)) {
		Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
		Err(e) => {
			obs::event!(warn, error = %e, "failed to decode function log tail");

			String::new()
		},
	}
}

fn preview(body: &[u8]) -> String {
	let text = String::from_utf8_lossy(body);
	let mut cut = text.len().min(ERROR_PREVIEW_LIMIT);

	while !text.is_char_boundary(cut) {
		cut -= 1;
	}

	text[..cut].trim().to_owned()
}
