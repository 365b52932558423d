//! Strongly typed identifiers used across handler requests.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

// Caller-built values always go through `new`. The second arm keeps wire decoding verbatim for
// names a handler hands back to us.
macro_rules! def_id {
	($name:ident, $doc:literal, $kind:literal) => {
		def_id!(@common $name, $doc, $kind, try_from);

		impl TryFrom<String> for $name {
			type Error = IdentifierError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				validate_view($kind, &value)?;

				Ok(Self(value))
			}
		}
	};
	($name:ident, $doc:literal, $kind:literal, verbatim) => {
		def_id!(@common $name, $doc, $kind, from);

		impl From<String> for $name {
			fn from(value: String) -> Self {
				Self(value)
			}
		}
		impl $name {
			/// Returns `true` when the value would also pass [`Self::new`].
			pub fn is_well_formed(&self) -> bool {
				validate_view($kind, &self.0).is_ok()
			}
		}
	};
	(@common $name:ident, $doc:literal, $kind:literal, $wire:ident) => {
		#[doc = $doc]
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde($wire = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Creates a new identifier after validation.
			pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
				let view = value.as_ref();

				validate_view($kind, view)?;

				Ok(Self(view.to_owned()))
			}

			/// Returns the identifier as a string slice.
			pub fn as_str(&self) -> &str {
				&self.0
			}
		}
		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &Self::Target {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl Borrow<str> for $name {
			fn borrow(&self) -> &str {
				&self.0
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, concat!($kind, "({})"), self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
		impl FromStr for $name {
			type Err = IdentifierError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
	};
}

const IDENTIFIER_MAX_LEN: usize = 256;

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("{kind} identifier cannot be empty.")]
	Empty {
		/// Kind of identifier (subject, task, function).
		kind: &'static str,
	},
	/// The identifier contains whitespace characters.
	#[error("{kind} identifier contains whitespace.")]
	ContainsWhitespace {
		/// Kind of identifier (subject, task, function).
		kind: &'static str,
	},
	/// The identifier exceeded the allowed character count.
	#[error("{kind} identifier exceeds {max} characters.")]
	TooLong {
		/// Kind of identifier (subject, task, function).
		kind: &'static str,
		/// Maximum permitted character count.
		max: usize,
	},
}

def_id! {
	SubjectId,
	"Identity receiving or losing access (usually an email address).\n\nDecoded verbatim from the wire.",
	"Subject",
	verbatim
}
def_id! {
	TaskName,
	"Name of a resource-loading task understood by the provider.\n\nHandlers choose their own task \
	 names, so decoding never rejects one; [`TaskName::new`] still validates names built locally.",
	"Task",
	verbatim
}
def_id! { FunctionName, "Managed function name, alias, or ARN.", "Function" }

fn validate_view(kind: &'static str, view: &str) -> Result<(), IdentifierError> {
	if view.is_empty() {
		return Err(IdentifierError::Empty { kind });
	}
	if view.chars().any(char::is_whitespace) {
		return Err(IdentifierError::ContainsWhitespace { kind });
	}
	if view.len() > IDENTIFIER_MAX_LEN {
		return Err(IdentifierError::TooLong { kind, max: IDENTIFIER_MAX_LEN });
	}

	Ok(())
}
