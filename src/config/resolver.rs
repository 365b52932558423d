//! Pluggable sources for provider config values.

// std
use std::env::{self, VarError};
// self
use crate::{_prelude::*, config::ConfigValue, error::ConfigError};

/// Looks up the value for one config key.
///
/// Returning `Ok(None)` (or an empty string) passes the key on to the next resolver in the
/// chain. Errors are fatal and abort the whole fill.
pub trait Resolver
where
	Self: Send + Sync,
{
	/// Resolves `key`, whose schema entry is `value`.
	fn resolve(&self, key: &str, value: &ConfigValue) -> Result<Option<String>, ConfigError>;
}
impl<F> Resolver for F
where
	F: Fn(&str, &ConfigValue) -> Result<Option<String>, ConfigError> + Send + Sync,
{
	fn resolve(&self, key: &str, value: &ConfigValue) -> Result<Option<String>, ConfigError> {
		self(key, value)
	}
}

/// Reads `{prefix}{KEY}` from the process environment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnvVarResolver {
	/// Prepended to the upper-cased key.
	pub prefix: String,
}
impl EnvVarResolver {
	/// Creates a resolver for variables starting with `prefix`.
	pub fn new(prefix: impl Into<String>) -> Self {
		Self { prefix: prefix.into() }
	}

	/// Environment variable consulted for `key`.
	pub fn var_name(&self, key: &str) -> String {
		format!("{}{}", self.prefix, key.to_uppercase())
	}
}
impl Resolver for EnvVarResolver {
	fn resolve(&self, key: &str, _: &ConfigValue) -> Result<Option<String>, ConfigError> {
		match env::var(self.var_name(key)) {
			Ok(value) => Ok(Some(value)),
			Err(VarError::NotPresent) => Ok(None),
			Err(e @ VarError::NotUnicode(_)) => Err(ConfigError::resolver(key, e)),
		}
	}
}

/// Serves values from an in-memory map keyed by config key.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MapResolver {
	values: BTreeMap<String, String>,
}
impl MapResolver {
	/// Adds or replaces the value for `key`.
	pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.values.insert(key.into(), value.into());

		self
	}
}
impl<K, V> FromIterator<(K, V)> for MapResolver
where
	K: Into<String>,
	V: Into<String>,
{
	fn from_iter<I>(iter: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
	{
		Self { values: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
	}
}
impl Resolver for MapResolver {
	fn resolve(&self, key: &str, _: &ConfigValue) -> Result<Option<String>, ConfigError> {
		Ok(self.values.get(key).cloned())
	}
}

/// Resolver chains used by [`ProviderConfig::fill`](crate::config::ProviderConfig::fill).
///
/// Non-secret keys are tried against `config_resolvers`, secret keys against
/// `secret_resolvers`; each chain is walked in order.
#[derive(Default)]
pub struct FillOptions {
	/// Chain for non-secret keys.
	pub config_resolvers: Vec<Box<dyn Resolver>>,
	/// Chain for secret keys; results are stored as secret references.
	pub secret_resolvers: Vec<Box<dyn Resolver>>,
}
impl FillOptions {
	/// Local development defaults: `PROVIDER_CONFIG_*` and `PROVIDER_SECRET_*` variables.
	pub fn dev() -> Self {
		Self::default()
			.with_config_resolver(EnvVarResolver::new("PROVIDER_CONFIG_"))
			.with_secret_resolver(EnvVarResolver::new("PROVIDER_SECRET_"))
	}

	/// Appends a resolver to the non-secret chain.
	pub fn with_config_resolver(mut self, resolver: impl 'static + Resolver) -> Self {
		self.config_resolvers.push(Box::new(resolver));

		self
	}

	/// Appends a resolver to the secret chain.
	pub fn with_secret_resolver(mut self, resolver: impl 'static + Resolver) -> Self {
		self.secret_resolvers.push(Box::new(resolver));

		self
	}
}
impl Debug for FillOptions {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("FillOptions")
			.field("config_resolvers", &self.config_resolvers.len())
			.field("secret_resolvers", &self.secret_resolvers.len())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn env_resolver_uppercases_key() {
		let resolver = EnvVarResolver::new("PROVIDER_CONFIG_");

		assert_eq!(resolver.var_name("api_url"), "PROVIDER_CONFIG_API_URL");

		// `PATH` is present in every test environment.
		let found = EnvVarResolver::new("PA")
			.resolve("th", &ConfigValue::default())
			.expect("Reading PATH should succeed.");

		assert!(found.is_some());
	}

	#[test]
	fn env_resolver_reports_missing_variable_as_none() {
		let found = EnvVarResolver::new("HANDLER_RUNTIME_UNSET_")
			.resolve("nothing_here", &ConfigValue::default())
			.expect("A missing variable should not be an error.");

		assert_eq!(found, None);
	}

	#[test]
	fn map_resolver_serves_known_keys() {
		let resolver = MapResolver::from_iter([("api_url", "https://api.example.com")]);

		assert_eq!(
			resolver.resolve("api_url", &ConfigValue::default()).expect("Map lookup is infallible."),
			Some("https://api.example.com".into())
		);
		assert_eq!(
			resolver.resolve("other", &ConfigValue::default()).expect("Map lookup is infallible."),
			None
		);
	}

	#[test]
	fn dev_options_use_prefixed_env_chains() {
		let options = FillOptions::dev();

		assert_eq!(options.config_resolvers.len(), 1);
		assert_eq!(options.secret_resolvers.len(), 1);
	}
}
