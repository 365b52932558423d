//! Transport-agnostic execution protocol for access provider handlers. Describe, enumerate,
//! grant, and revoke through one typed client whether the handler runs as a managed function
//! or as a local process.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod executor;
pub mod id;
pub mod msg;
pub mod obs;

mod _prelude {
	pub use std::{
		collections::BTreeMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::Mutex;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize, de::DeserializeOwned};
	pub use serde_json::Value;
	pub use thiserror::Error as ThisError;
	#[cfg(feature = "reqwest")] pub use url::Url;

	pub use crate::{
		error::{Error, Result},
		msg::JsonObject,
	};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use serde_json;
#[cfg(feature = "reqwest")] pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _, tempfile as _};
