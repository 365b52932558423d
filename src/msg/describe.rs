//! Provider metadata returned by the describe operation.

// self
use crate::_prelude::*;

/// Provider metadata, health, and schema.
///
/// `provider` and `healthy` are required; every other field defaults when absent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DescribeResponse {
	/// Provider release answering the call.
	pub provider: Provider,
	/// Whether the provider considers its configuration usable.
	pub healthy: bool,
	/// Diagnostic messages gathered while checking health.
	#[serde(default)]
	pub diagnostics: Vec<DiagnosticLog>,
	/// Non-secret configuration the provider is running with.
	#[serde(default)]
	pub config: JsonObject,
	/// Capabilities the provider declares.
	#[serde(default)]
	pub schema: ProviderSchema,
}
impl DescribeResponse {
	/// Returns diagnostics at [`LogLevel::Error`].
	pub fn errors(&self) -> impl Iterator<Item = &DiagnosticLog> {
		self.diagnostics.iter().filter(|log| log.level == LogLevel::Error)
	}
}

/// A published provider release, written `publisher/name@version`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Provider {
	/// Publishing organisation.
	pub publisher: String,
	/// Provider name.
	pub name: String,
	/// Release version.
	pub version: String,
}
impl Display for Provider {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{}/{}@{}", self.publisher, self.name, self.version)
	}
}
impl FromStr for Provider {
	type Err = ProviderParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let invalid = || ProviderParseError { input: s.to_owned() };
		let (path, version) = s.split_once('@').ok_or_else(invalid)?;
		let (publisher, name) = path.split_once('/').ok_or_else(invalid)?;

		if !is_word(publisher) || !is_word(name) || version.is_empty() {
			return Err(invalid());
		}

		Ok(Self { publisher: publisher.into(), name: name.into(), version: version.into() })
	}
}

fn is_word(segment: &str) -> bool {
	!segment.is_empty() && segment.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Error returned when a provider reference is not `publisher/name@version`.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Invalid provider reference `{input}`; expected publisher/name@version.")]
pub struct ProviderParseError {
	/// Rejected input.
	pub input: String,
}

/// Severity of a [`DiagnosticLog`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
	/// Informational.
	Info,
	/// Degraded but usable.
	Warning,
	/// Broken.
	Error,
}

/// One diagnostic message from a describe call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticLog {
	/// Severity.
	pub level: LogLevel,
	/// Message text.
	pub msg: String,
}

/// Capabilities declared by a provider.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderSchema {
	/// Schema identifier.
	#[serde(rename = "$id", default)]
	pub id: String,
	/// JSON schema dialect.
	#[serde(rename = "$schema", default)]
	pub schema: String,
	/// Configuration the provider expects.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub config: Option<ConfigSchema>,
	/// Framework metadata.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub meta: Option<MetaSchema>,
	/// Resource loaders and types.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub resources: Option<ResourcesSchema>,
	/// Grantable target kinds.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub targets: Option<TargetSchema>,
}

/// Config keys a provider expects, by key.
pub type ConfigSchema = BTreeMap<String, ConfigArgument>;

/// Declaration of one config key.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigArgument {
	/// Value type; currently always `string`.
	#[serde(rename = "type", default)]
	pub kind: String,
	/// Help text.
	#[serde(default)]
	pub description: String,
	/// Whether the value must be stored as a secret.
	#[serde(default)]
	pub secret: bool,
}

/// Metadata about the framework that produced the schema.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaSchema {
	/// Framework identifier.
	#[serde(default)]
	pub framework: String,
}

/// Resource loaders and the resource types they produce.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourcesSchema {
	/// Loaders keyed by task name.
	#[serde(default)]
	pub loaders: BTreeMap<String, ResourceLoader>,
	/// Resource type definitions keyed by type name.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub types: Option<BTreeMap<String, Value>>,
}

/// A resource loader exposed by the provider.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLoader {
	/// Display title.
	#[serde(default)]
	pub title: String,
}

/// Target kinds keyed by kind name.
pub type TargetSchema = BTreeMap<String, TargetKind>;

/// Shape of one target kind.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetKind {
	/// Always `object`.
	#[serde(rename = "type", default)]
	pub kind: String,
	/// Arguments accepted by this kind.
	#[serde(default)]
	pub properties: BTreeMap<String, TargetArgument>,
}

/// Metadata for one target argument.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetArgument {
	/// Argument identifier.
	pub id: String,
	/// Display title.
	#[serde(default)]
	pub title: String,
	/// Help text.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	/// Resource type whose ids are valid values.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub resource: Option<String>,
}
