//! Wire framing shared by every executor.
//!
//! Requests travel as `{"type": <tag>, "data": <payload>}` where `data` holds the payload's
//! own fields. Handlers answer with `{"response": <payload>}`; the payload stays opaque until
//! the client decodes it for the operation it issued. Both executors speak exactly this format,
//! so no decoding logic depends on the transport.

// crates.io
use serde_json::value::RawValue;
// self
use crate::{
	_prelude::*,
	error::{DecodeError, JsonError},
	msg::{Describe, Grant, LoadResources, Request, RequestType, Revoke},
};

/// Discriminant-tagged request as transmitted to a handler.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
	/// Discriminant selecting the operation.
	#[serde(rename = "type")]
	pub kind: RequestType,
	/// Payload fields of the request.
	pub data: Value,
}
impl Envelope {
	/// Frames `request`.
	pub fn from_request(request: &Request) -> Result<Self> {
		Ok(Self { kind: request.request_type(), data: request.payload().map_err(Error::Encode)? })
	}

	/// Serializes `request` straight to wire bytes.
	pub fn encode(request: &Request) -> Result<Vec<u8>> {
		Self::from_request(request)?.to_vec()
	}

	/// Parses wire bytes back into the request they carry.
	pub fn decode(bytes: &[u8]) -> Result<Request> {
		Self::from_slice(bytes)?.into_request()
	}

	/// Serializes the envelope.
	pub fn to_vec(&self) -> Result<Vec<u8>> {
		serde_json::to_vec(self).map_err(Error::Encode)
	}

	/// Parses an envelope without interpreting its payload.
	pub fn from_slice(bytes: &[u8]) -> Result<Self> {
		Ok(parse_slice(bytes).map_err(|source| DecodeError::Envelope { source })?)
	}

	/// Decodes the payload according to the discriminant.
	pub fn into_request(self) -> Result<Request> {
		let data = self.data;
		let request = match self.kind {
			RequestType::Describe => Request::from(decode_value::<Describe>(data)?),
			RequestType::LoadResources => Request::from(decode_value::<LoadResources>(data)?),
			RequestType::Grant => Request::from(decode_value::<Grant>(data)?),
			RequestType::Revoke => Request::from(decode_value::<Revoke>(data)?),
		};

		Ok(request)
	}
}

fn decode_value<T>(data: Value) -> Result<T>
where
	T: DeserializeOwned,
{
	Ok(serde_path_to_error::deserialize(data)
		.map_err(|e| DecodeError::Envelope { source: e.into() })?)
}

/// Parses a complete JSON document, rejecting trailing bytes.
pub(crate) fn parse_slice<T>(bytes: &[u8]) -> Result<T, JsonError>
where
	T: DeserializeOwned,
{
	let mut de = serde_json::Deserializer::from_slice(bytes);
	let value = serde_path_to_error::deserialize(&mut de)?;

	de.end().map_err(JsonError::at_root)?;

	Ok(value)
}

/// Raw outcome of one handler invocation.
///
/// Holds the exact bytes of the `response` field so decoding can be deferred to the caller that
/// knows which operation was issued.
#[derive(Clone, PartialEq, Eq)]
pub struct ExecutionResult {
	response: Vec<u8>,
}
impl ExecutionResult {
	/// Wraps an already-serialized response payload.
	///
	/// The bytes are not validated here; malformed payloads surface when decoded.
	pub fn from_response_bytes(response: impl Into<Vec<u8>>) -> Self {
		Self { response: response.into() }
	}

	/// Wraps a response payload value.
	pub fn from_response<T>(response: &T) -> Result<Self>
	where
		T: ?Sized + Serialize,
	{
		Ok(Self { response: serde_json::to_vec(response).map_err(Error::Encode)? })
	}

	/// Parses handler output framed as `{"response": ...}`.
	///
	/// Unknown sibling fields are ignored. A missing `response` or bytes that are not JSON are
	/// decode errors.
	pub fn from_slice(bytes: &[u8]) -> Result<Self> {
		#[derive(Deserialize)]
		struct Wire {
			response: Box<RawValue>,
		}

		let wire: Wire = serde_json::from_slice(bytes)
			.map_err(|e| DecodeError::Result { source: JsonError::at_root(e) })?;

		Ok(Self { response: wire.response.get().as_bytes().to_vec() })
	}

	/// Serializes the result back to its wire form.
	pub fn to_vec(&self) -> Result<Vec<u8>> {
		let mut buf = Vec::with_capacity(self.response.len() + 14);

		buf.extend_from_slice(b"{\"response\":");
		buf.extend_from_slice(&self.response);
		buf.push(b'}');

		Ok(buf)
	}

	/// Raw response payload bytes.
	pub fn response(&self) -> &[u8] {
		&self.response
	}

	/// Decodes the response payload for `operation`.
	pub fn decode<T>(&self, operation: RequestType) -> Result<T>
	where
		T: DeserializeOwned,
	{
		Ok(parse_slice(&self.response)
			.map_err(|source| DecodeError::Response { operation, source })?)
	}
}
impl Debug for ExecutionResult {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ExecutionResult")
			.field("response", &String::from_utf8_lossy(&self.response))
			.finish()
	}
}
