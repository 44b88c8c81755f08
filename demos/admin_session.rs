//! Signs in to a mocked admin API, lets the access cookie expire, and shows the client renewing
//! the session transparently before listing contributions.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde_json::{Value, json};
// self
use donation_portal_client::{
	ApiRequest, ClientConfig, ReqwestAuthenticatedClient, auth::LoginCredentials,
	navigation::FnNavigation, url::Url,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let login = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/login");
			then.status(200)
				.header("set-cookie", "access_token=expired; Path=/")
				.json_body(json!({ "user": { "email": "treasurer@example.org" } }));
		})
		.await;
	let stale = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/contributions").header("cookie", "access_token=expired");
			then.status(401).json_body(json!({ "error": "Access token expired" }));
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/refresh");
			then.status(200).header("set-cookie", "access_token=renewed; Path=/");
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/api/contributions").header("cookie", "access_token=renewed");
			then.status(200).json_body(json!({
				"items": [{ "receipt_no": "RCPT-2024-0001", "amount": 5000 }],
				"total": 1
			}));
		})
		.await;

	let config = ClientConfig::builder(Url::parse(&server.base_url())?).build()?;
	let client = ReqwestAuthenticatedClient::new(config)?.with_navigation(Arc::new(
		FnNavigation::new(
			|| Some("/admin/contributions".to_owned()),
			|location: &str| println!("Session lost, navigating to {location}."),
		),
	));

	client.login(&LoginCredentials::new("treasurer@example.org", "s3cret")).await?;

	let page: Value =
		client.send_json(ApiRequest::get("/api/contributions").query("page", 1)).await?;

	println!("Contributions: {page}.");
	println!(
		"Refresh attempts: {}, successes: {}.",
		client.refresh_metrics.attempts(),
		client.refresh_metrics.successes()
	);

	login.assert_async().await;
	stale.assert_async().await;
	refresh.assert_async().await;

	Ok(())
}
