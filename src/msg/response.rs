//! Response shapes for resource loading and access grants.

// crates.io
use serde::Deserializer;
// self
use crate::{_prelude::*, id::TaskName};

/// One resource discovered by a loading task.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Resource {
	/// Provider-defined resource type.
	#[serde(rename = "type")]
	pub kind: String,
	/// Provider-unique identifier.
	pub id: String,
	/// Human-readable name.
	#[serde(default, deserialize_with = "null_as_default")]
	pub name: String,
	/// Additional attributes.
	#[serde(default, deserialize_with = "null_as_default")]
	pub data: JsonObject,
}

/// Enumeration work the caller must resubmit as a new load request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PendingTask {
	/// Task to run next.
	pub task: TaskName,
	/// Context the handler wants echoed back.
	#[serde(default, deserialize_with = "null_as_default")]
	pub ctx: JsonObject,
}

/// Result of one resource-loading round.
///
/// A response with pending tasks is not terminal; see
/// [`TaskQueue`](crate::client::TaskQueue) for draining them.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadResponse {
	/// Resources produced in this round.
	#[serde(default, deserialize_with = "null_as_default")]
	pub resources: Vec<Resource>,
	/// Follow-up tasks, in the order the handler returned them.
	#[serde(default, deserialize_with = "null_as_default")]
	pub tasks: Vec<PendingTask>,
}

/// Outcome of a successful grant.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GrantResponse {
	/// Instructions shown to the subject on how to use the access.
	#[serde(default, deserialize_with = "null_as_default")]
	pub access_instructions: String,
	/// Opaque state to persist and replay unchanged into the matching revoke.
	#[serde(default, deserialize_with = "null_as_default")]
	pub state: JsonObject,
}

// Handlers written against loosely typed encoders send `null` for absent values.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
	D: Deserializer<'de>,
	T: Default + Deserialize<'de>,
{
	Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn load_response_defaults_missing_fields() {
		let response: LoadResponse =
			serde_json::from_str(r#"{"resources":[{"type":"Test","id":"123"}]}"#)
				.expect("Minimal load response should decode.");

		assert_eq!(response.resources.len(), 1);
		assert_eq!(response.resources[0].kind, "Test");
		assert_eq!(response.resources[0].id, "123");
		assert!(response.resources[0].name.is_empty());
		assert!(response.tasks.is_empty());
	}

	#[test]
	fn explicit_nulls_read_as_empty_values() {
		let response: LoadResponse = serde_json::from_str(
			r#"{"resources":[{"type":"Test","id":"123","name":null,"data":null}],"tasks":null}"#,
		)
		.expect("Nulls should decode as empty values.");

		assert_eq!(response.resources[0].name, "");
		assert!(response.resources[0].data.is_empty());
		assert!(response.tasks.is_empty());

		let pending: PendingTask = serde_json::from_str(r#"{"task":"next","ctx":null}"#)
			.expect("Null context should decode as empty.");

		assert!(pending.ctx.is_empty());

		let grant: GrantResponse =
			serde_json::from_str(r#"{"access_instructions":null,"state":null}"#)
				.expect("Null grant fields should decode as empty.");

		assert_eq!(grant, GrantResponse::default());
		assert!(serde_json::from_str::<LoadResponse>(r#"{"resources":null,"tasks":[]}"#).is_ok());
	}

	#[test]
	fn resource_requires_type_and_id() {
		assert!(serde_json::from_str::<Resource>(r#"{"type":"Test"}"#).is_err());
		assert!(serde_json::from_str::<Resource>(r#"{"id":"123"}"#).is_err());
		assert!(serde_json::from_str::<Resource>(r#"{"type":null,"id":"123"}"#).is_err());
	}

	#[test]
	fn grant_state_keeps_key_order_and_numbers() {
		let raw = r#"{"access_instructions":"","state":{"z":1,"a":1.50,"m":{"y":true,"b":null}}}"#;
		let response: GrantResponse =
			serde_json::from_str(raw).expect("Grant response should decode.");
		let keys = response.state.keys().map(String::as_str).collect::<Vec<_>>();

		assert_eq!(keys, ["z", "a", "m"]);
		assert_eq!(
			serde_json::to_string(&response.state).expect("State should serialize."),
			r#"{"z":1,"a":1.50,"m":{"y":true,"b":null}}"#
		);
	}
}
