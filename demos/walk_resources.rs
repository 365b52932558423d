//! Drains a paginated resource enumeration with a capped walker, seeding the first round with
//! config resolved from `PROVIDER_CONFIG_*` variables.

// crates.io
use color_eyre::Result;
// self
use handler_runtime::{
	client::{HandlerClient, ResourceWalker},
	config::{FillOptions, MapResolver, ProviderConfig},
	envelope::ExecutionResult,
	executor::MockExecutor,
	id::TaskName,
	msg::{ConfigArgument, ConfigSchema, Request},
	serde_json::{Value, json},
};

const MAX_ROUNDS: usize = 16;

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let mut schema = ConfigSchema::new();

	schema.insert("org".into(), ConfigArgument::default());

	let mut config = ProviderConfig::from_schema(&schema);
	let options = FillOptions::dev().with_config_resolver(MapResolver::from_iter([("org", "acme")]));

	config.fill(&options)?;

	// Three pages of users, each page pointing at the next.
	let executor = MockExecutor::new(|request| {
		let Request::LoadResources(load) = request else {
			return ExecutionResult::from_response(&json!({}));
		};
		let page = load.ctx.get("page").and_then(Value::as_u64).unwrap_or(0);
		let org = load.ctx.get("org").cloned().unwrap_or(Value::Null);
		let tasks = if page < 2 {
			json!([{ "task": "list_users", "ctx": { "org": org, "page": page + 1 } }])
		} else {
			json!([])
		};

		ExecutionResult::from_response(&json!({
			"resources": [{ "type": "User", "id": format!("user-{page}"), "name": format!("User {page}") }],
			"tasks": tasks,
		}))
	});
	let client = HandlerClient::new(executor);
	let resources = ResourceWalker::new(&client, MAX_ROUNDS)
		.run(&TaskName::new("list_users")?, config.to_context())
		.await?;

	for resource in resources {
		println!("{} {} ({})", resource.kind, resource.id, resource.name);
	}

	Ok(())
}
