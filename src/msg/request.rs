//! Request payloads and their discriminant tags.

// self
use crate::{
	_prelude::*,
	id::{SubjectId, TaskName},
};

/// Discriminant tag carried in the envelope's `type` field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestType {
	/// Provider metadata and health.
	#[serde(rename = "describe")]
	Describe,
	/// Resource enumeration.
	#[serde(rename = "load")]
	LoadResources,
	/// Grant access to a subject.
	#[serde(rename = "grant")]
	Grant,
	/// Revoke previously granted access.
	#[serde(rename = "revoke")]
	Revoke,
}
impl RequestType {
	/// Returns the wire tag, also used as a stable span or metric label.
	pub const fn as_str(self) -> &'static str {
		match self {
			RequestType::Describe => "describe",
			RequestType::LoadResources => "load",
			RequestType::Grant => "grant",
			RequestType::Revoke => "revoke",
		}
	}
}
impl Display for RequestType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Implemented by every request payload so its discriminant travels with it.
pub trait RequestPayload
where
	Self: Serialize + DeserializeOwned + Into<Request>,
{
	/// Discriminant shared by every value of this payload type.
	const TYPE: RequestType;

	/// Returns the discriminant for this payload.
	fn request_type(&self) -> RequestType {
		Self::TYPE
	}
}

/// Selects which provider behavior a grant or revoke exercises.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
	/// Provider-defined kind, e.g. `Group` or `PermissionSet`.
	pub kind: String,
	/// Kind-specific arguments.
	#[serde(default)]
	pub arguments: BTreeMap<String, String>,
}
impl Target {
	/// Creates a target of `kind` with no arguments.
	pub fn new(kind: impl Into<String>) -> Self {
		Self { kind: kind.into(), arguments: BTreeMap::new() }
	}

	/// Adds or replaces one argument.
	pub fn with_argument(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.arguments.insert(key.into(), value.into());

		self
	}
}

/// Asks the provider for its metadata, health, and schema.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Describe {}
impl RequestPayload for Describe {
	const TYPE: RequestType = RequestType::Describe;
}

/// Runs one resource-loading task.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LoadResources {
	/// Task to run.
	pub task: TaskName,
	/// Task context, either caller supplied or echoed from a pending task.
	#[serde(default)]
	pub ctx: JsonObject,
}
impl RequestPayload for LoadResources {
	const TYPE: RequestType = RequestType::LoadResources;
}

/// Grants `subject` the access described by `target`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
	/// Identity receiving access.
	pub subject: SubjectId,
	/// Access to grant.
	pub target: Target,
}
impl RequestPayload for Grant {
	const TYPE: RequestType = RequestType::Grant;
}

/// Revokes access previously granted to `subject`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Revoke {
	/// Identity losing access.
	pub subject: SubjectId,
	/// Access to revoke.
	pub target: Target,
	/// State returned by the matching grant, replayed verbatim.
	#[serde(default)]
	pub state: JsonObject,
}
impl RequestPayload for Revoke {
	const TYPE: RequestType = RequestType::Revoke;
}

/// Any request a handler understands.
#[derive(Clone, Debug, PartialEq)]
pub enum Request {
	/// See [`Describe`].
	Describe(Describe),
	/// See [`LoadResources`].
	LoadResources(LoadResources),
	/// See [`Grant`].
	Grant(Grant),
	/// See [`Revoke`].
	Revoke(Revoke),
}
impl Request {
	/// Returns the discriminant of the wrapped payload.
	pub fn request_type(&self) -> RequestType {
		match self {
			Request::Describe(inner) => inner.request_type(),
			Request::LoadResources(inner) => inner.request_type(),
			Request::Grant(inner) => inner.request_type(),
			Request::Revoke(inner) => inner.request_type(),
		}
	}

	/// Serializes the wrapped payload's own fields.
	pub fn payload(&self) -> Result<Value, serde_json::Error> {
		match self {
			Request::Describe(inner) => serde_json::to_value(inner),
			Request::LoadResources(inner) => serde_json::to_value(inner),
			Request::Grant(inner) => serde_json::to_value(inner),
			Request::Revoke(inner) => serde_json::to_value(inner),
		}
	}
}
impl From<Describe> for Request {
	fn from(value: Describe) -> Self {
		Self::Describe(value)
	}
}
impl From<LoadResources> for Request {
	fn from(value: LoadResources) -> Self {
		Self::LoadResources(value)
	}
}
impl From<Grant> for Request {
	fn from(value: Grant) -> Self {
		Self::Grant(value)
	}
}
impl From<Revoke> for Request {
	fn from(value: Revoke) -> Self {
		Self::Revoke(value)
	}
}
