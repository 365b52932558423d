//! Provider configuration assembled from a handler's described schema.
//!
//! [`ProviderConfig::from_schema`] creates one empty [`ConfigValue`] per declared key;
//! [`ProviderConfig::fill`] then resolves each key through the resolver chains in
//! [`FillOptions`]. Secret keys never hold their value, only a reference to where it lives.

pub mod resolver;

pub use resolver::*;

// self
use crate::{
	_prelude::*,
	error::ConfigError,
	msg::{ConfigSchema, DescribeResponse},
	obs,
};

/// One config entry and its resolved value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigValue {
	/// Whether the value must be stored as a secret.
	pub secret: bool,
	/// Schema description of the key.
	pub description: String,
	/// Resolved plain value; stays empty for secret keys.
	pub value: String,
	/// Location of the secret, e.g. a parameter-store path; only used for secret keys.
	pub secret_ref: String,
}

/// Named input for a deployment stack.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackParameter {
	/// Parameter name.
	#[serde(rename = "ParameterKey")]
	pub key: String,
	/// Parameter value.
	#[serde(rename = "ParameterValue")]
	pub value: String,
}

/// Config values keyed by schema key, in key order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
	values: BTreeMap<String, ConfigValue>,
}
impl ProviderConfig {
	/// Creates an unresolved entry for every key in `schema`.
	pub fn from_schema(schema: &ConfigSchema) -> Self {
		let values = schema
			.iter()
			.map(|(key, argument)| {
				let value = ConfigValue {
					secret: argument.secret,
					description: argument.description.clone(),
					..Default::default()
				};

				(key.clone(), value)
			})
			.collect();

		Self { values }
	}

	/// Creates entries from a describe response; a handler without a config schema yields an
	/// empty config.
	pub fn from_describe(describe: &DescribeResponse) -> Self {
		describe.schema.config.as_ref().map(Self::from_schema).unwrap_or_default()
	}

	/// Entry for `key`.
	pub fn get(&self, key: &str) -> Option<&ConfigValue> {
		self.values.get(key)
	}

	/// All entries in key order.
	pub fn values(&self) -> &BTreeMap<String, ConfigValue> {
		&self.values
	}

	/// Resolves every key through the matching chain in `options`.
	///
	/// The first resolver returning a non-empty value wins. Keys no resolver knows keep their
	/// previous value. A resolver error stops the fill and leaves later keys untouched.
	pub fn fill(&mut self, options: &FillOptions) -> Result<()> {
		for (key, entry) in &mut self.values {
			let chain =
				if entry.secret { &options.secret_resolvers } else { &options.config_resolvers };
			let mut resolved = None;

			for resolver in chain {
				if let Some(value) = resolver.resolve(key, entry)?.filter(|v| !v.is_empty()) {
					resolved = Some(value);

					break;
				}
			}

			let Some(value) = resolved else {
				obs::event!(debug, key = %key, "no resolver produced a config value");

				continue;
			};

			if entry.secret {
				entry.secret_ref = value;
			} else {
				entry.value = value;
			}
		}

		Ok(())
	}

	/// Fails with [`ConfigError::Resolver`] naming the first key that is still unresolved.
	pub fn ensure_complete(&self) -> Result<()> {
		match self.values.iter().find(|(_, entry)| entry.resolved().is_empty()) {
			Some((key, _)) => Err(ConfigError::resolver(key.as_str(), "no value was resolved").into()),
			None => Ok(()),
		}
	}

	/// Stack parameters: PascalCase key names, with a `Secret` suffix and the secret reference
	/// as value for secret keys.
	pub fn stack_parameters(&self) -> Vec<StackParameter> {
		self.values
			.iter()
			.map(|(key, entry)| {
				let mut name = pascal_case(key);

				if entry.secret {
					name.push_str("Secret");
				}

				StackParameter { key: name, value: entry.resolved().to_owned() }
			})
			.collect()
	}

	/// Repeated command-line flags of the form `"{flag} key=value"` for non-secret keys.
	pub fn cli_flags(&self, flag: &str) -> Vec<String> {
		self.plain_values().map(|(key, value)| format!("{flag} {key}={value}")).collect()
	}

	/// Non-secret values as a JSON object, e.g. to seed a load request's context.
	pub fn to_context(&self) -> JsonObject {
		self.plain_values()
			.filter(|(_, value)| !value.is_empty())
			.map(|(key, value)| (key.to_owned(), Value::from(value)))
			.collect()
	}

	fn plain_values(&self) -> impl Iterator<Item = (&str, &str)> {
		self.values
			.iter()
			.filter(|(_, entry)| !entry.secret)
			.map(|(key, entry)| (key.as_str(), entry.value.as_str()))
	}
}
impl ConfigValue {
	fn resolved(&self) -> &str {
		if self.secret { &self.secret_ref } else { &self.value }
	}
}

fn pascal_case(key: &str) -> String {
	key.split('_')
		.filter(|segment| !segment.is_empty())
		.flat_map(|segment| {
			let mut chars = segment.chars();
			let head = chars.next().map(|c| c.to_uppercase().collect::<String>());

			head.into_iter().chain([chars.as_str().to_owned()])
		})
		.collect()
}
