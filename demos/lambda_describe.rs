//! Describes a handler deployed as a managed function, with a mock Invoke API standing in for
//! the real regional endpoint.

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use handler_runtime::{
	client::HandlerClient, executor::LambdaExecutor, id::FunctionName, url::Url,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let invoke_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/2015-03-31/functions/demo-handler/invocations");
			then.status(200).header("content-type", "application/json").body(
				r#"{"response":{
					"provider":{"publisher":"common-fate","name":"demo","version":"v0.1.0"},
					"healthy":true,
					"diagnostics":[{"level":"INFO","msg":"credentials verified"}],
					"schema":{"config":{"api_url":{"type":"string","description":"API base URL"}}}
				}}"#,
			);
		})
		.await;
	let executor =
		LambdaExecutor::new(Url::parse(&server.base_url())?, FunctionName::new("demo-handler")?)?;
	let client = HandlerClient::new(executor);
	let describe = client.describe().await?;

	println!("Provider {} healthy: {}.", describe.provider, describe.healthy);

	for log in &describe.diagnostics {
		println!("[{:?}] {}", log.level, log.msg);
	}

	invoke_mock.assert_async().await;

	Ok(())
}
