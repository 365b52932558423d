//! Operation vocabulary exchanged with provider handlers.
//!
//! Requests ([`Describe`], [`LoadResources`], [`Grant`], [`Revoke`]) carry only the fields their
//! operation needs and report their discriminant through [`RequestPayload::request_type`].
//! Responses are decoded by the client from the opaque payload of an
//! [`ExecutionResult`](crate::envelope::ExecutionResult).

pub mod describe;
pub mod request;
pub mod response;

pub use describe::*;
pub use request::*;
pub use response::*;

/// Free-form JSON object used for task contexts, resource data, and grant state.
///
/// Key order is preserved so a map decoded from a handler serializes back to the same bytes.
pub type JsonObject = serde_json::Map<String, serde_json::Value>;
