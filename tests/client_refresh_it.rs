mod common;

// std
use std::{
	io,
	sync::{
		Arc,
		atomic::{AtomicBool, Ordering},
	},
};
// crates.io
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::Notify;
// self
use common::RecordingNavigation;
use donation_portal_client::{
	ApiRequest, ApiResponse, AuthenticatedClient, Error,
	error::{RefreshFailure, TransportError},
	http::{HttpTransport, TransportCall, TransportFuture},
};

const REFRESH: &str = "/api/auth/refresh";
const REFRESH_EXPIRED: &str = "{\"error\":\"Refresh token expired\"}";
const DATABASE_DOWN: &str = "{\"error\":\"Database unavailable\"}";

#[derive(Clone, Copy, Debug)]
enum RefreshScript {
	Renew,
	Reject(u16),
	Unreachable,
}

/// In-process admin API: protected routes answer 401 until the session is renewed.
///
/// With a gate installed the refresh endpoint parks until [`ScriptedApi::release_refresh`], which
/// lets tests pile requests onto an in-flight refresh deterministically.
struct ScriptedApi {
	refresh: RefreshScript,
	gate: Option<Notify>,
	session_fresh: AtomicBool,
	log: Mutex<Vec<String>>,
}
impl ScriptedApi {
	fn new(refresh: RefreshScript) -> Self {
		Self { refresh, gate: None, session_fresh: AtomicBool::new(false), log: Default::default() }
	}

	fn gated(mut self) -> Self {
		self.gate = Some(Notify::new());

		self
	}

	fn release_refresh(&self) {
		if let Some(gate) = &self.gate {
			gate.notify_one();
		}
	}

	fn expire_session(&self) {
		self.session_fresh.store(false, Ordering::SeqCst);
	}

	fn calls(&self, route: &str) -> usize {
		self.log.lock().iter().filter(|logged| logged.as_str() == route).count()
	}
}
impl HttpTransport for ScriptedApi {
	fn execute<'a>(&'a self, call: TransportCall<'a>) -> TransportFuture<'a> {
		Box::pin(async move {
			let route = call.url.path().to_owned();

			self.log.lock().push(route.clone());

			match route.as_str() {
				REFRESH => {
					if let Some(gate) = &self.gate {
						gate.notified().await;
					}

					match self.refresh {
						RefreshScript::Renew => {
							self.session_fresh.store(true, Ordering::SeqCst);

							Ok(ApiResponse::json_body(200, "{\"ok\":true}"))
						},
						RefreshScript::Reject(status) =>
							Ok(ApiResponse::json_body(status, REFRESH_EXPIRED)),
						RefreshScript::Unreachable => Err(TransportError::network(io::Error::new(
							io::ErrorKind::ConnectionRefused,
							"connection refused",
						))),
					}
				},
				"/api/offline" => Err(TransportError::network(io::Error::new(
					io::ErrorKind::ConnectionReset,
					"connection reset",
				))),
				"/api/broken" => Ok(ApiResponse::json_body(500, DATABASE_DOWN)),
				"/api/users/locked" =>
					Ok(ApiResponse::json_body(401, "{\"error\":\"Account disabled\"}")),
				_ if self.session_fresh.load(Ordering::SeqCst) =>
					Ok(ApiResponse::json_body(200, format!("{{\"route\":\"{route}\"}}"))),
				_ => Ok(ApiResponse::json_body(401, "{\"error\":\"Access token expired\"}")),
			}
		})
	}
}

fn client(api: &Arc<ScriptedApi>) -> AuthenticatedClient<ScriptedApi> {
	let config = common::config("https://portal.example.org");

	AuthenticatedClient::with_transport(config, Arc::clone(api))
		.expect("Client should construct over the scripted API.")
}

async fn wait_for_queue(client: &AuthenticatedClient<ScriptedApi>, depth: usize) {
	while client.queued_requests() < depth {
		tokio::task::yield_now().await;
	}
}

#[tokio::test]
async fn concurrent_unauthorized_requests_share_one_refresh() {
	let api = Arc::new(ScriptedApi::new(RefreshScript::Renew).gated());
	let client = client(&api);
	let (contributions, committees, donors, ()) = tokio::join!(
		client.get::<Value>("/api/contributions"),
		client.get::<Value>("/api/committees"),
		client.get::<Value>("/api/land-donors"),
		async {
			wait_for_queue(&client, 2).await;

			assert!(client.is_refreshing());

			api.release_refresh();
		},
	);

	assert_eq!(
		contributions.expect("Leader should succeed after the refresh."),
		serde_json::json!({ "route": "/api/contributions" })
	);
	assert_eq!(
		committees.expect("Queued request should succeed after the refresh."),
		serde_json::json!({ "route": "/api/committees" })
	);
	assert_eq!(
		donors.expect("Queued request should succeed after the refresh."),
		serde_json::json!({ "route": "/api/land-donors" })
	);
	assert_eq!(api.calls(REFRESH), 1);
	assert_eq!(api.calls("/api/contributions"), 2);
	assert_eq!(api.calls("/api/committees"), 2);
	assert_eq!(api.calls("/api/land-donors"), 2);
	assert_eq!(client.refresh_metrics.attempts(), 1);
	assert_eq!(client.refresh_metrics.successes(), 1);
	assert_eq!(client.refresh_metrics.queued(), 2);
	assert!(!client.is_refreshing());
	assert_eq!(client.queued_requests(), 0);
}

#[tokio::test]
async fn failed_refresh_rejects_the_batch_and_redirects_once() {
	let api = Arc::new(ScriptedApi::new(RefreshScript::Reject(401)).gated());
	let navigation = Arc::new(RecordingNavigation::at("/admin/contributions"));
	let client = client(&api).with_navigation(navigation.clone());
	let (first, second, third, ()) = tokio::join!(
		client.get::<Value>("/api/contributions"),
		client.get::<Value>("/api/gallery"),
		client.get::<Value>("/api/settings"),
		async {
			wait_for_queue(&client, 2).await;
			api.release_refresh();
		},
	);

	for result in [first, second, third] {
		match result.expect_err("Every request in the batch should fail.") {
			Error::RefreshFailed { failure, rejected } => {
				assert_eq!(failure.status, Some(401));
				assert!(failure.reason.contains("Refresh token expired"));
				assert_eq!(rejected.map(|e| e.status), Some(401));
			},
			other => panic!("Unexpected error variant: {other:?}."),
		}
	}

	assert_eq!(api.calls(REFRESH), 1);
	assert_eq!(navigation.redirects(), vec!["/login".to_owned()]);
	assert_eq!(client.refresh_metrics.failures(), 1);
	assert!(!client.is_refreshing());
}

#[tokio::test]
async fn unauthorized_replay_is_surfaced_without_a_second_refresh() {
	let api = Arc::new(ScriptedApi::new(RefreshScript::Renew));
	let client = client(&api);
	let err = client
		.send(ApiRequest::get("/api/users/locked"))
		.await
		.expect_err("A 401 on the replay should be terminal.");

	match err {
		Error::Unauthorized(e) => {
			assert_eq!(e.status, 401);
			assert_eq!(e.message(), "Account disabled");
		},
		other => panic!("Unexpected error variant: {other:?}."),
	}

	assert_eq!(api.calls(REFRESH), 1);
	assert_eq!(api.calls("/api/users/locked"), 2);
}

#[tokio::test]
async fn refresh_endpoint_unauthorized_is_surfaced_directly() {
	let api = Arc::new(ScriptedApi::new(RefreshScript::Reject(401)));
	let client = client(&api);
	let err = client
		.send(ApiRequest::post(REFRESH))
		.await
		.expect_err("Refresh endpoint 401 should be surfaced.");

	assert!(matches!(err, Error::Unauthorized(ref e) if e.status == 401));
	assert_eq!(api.calls(REFRESH), 1);
	assert_eq!(client.refresh_metrics.attempts(), 0);
	assert!(!client.is_refreshing());
}

#[tokio::test]
async fn auth_endpoints_are_recognized_by_their_resolved_url() {
	for path in ["api/auth/refresh", "https://portal.example.org/api/auth/refresh"] {
		let api = Arc::new(ScriptedApi::new(RefreshScript::Reject(401)));
		let navigation = Arc::new(RecordingNavigation::at("/admin/settings"));
		let client = client(&api).with_navigation(navigation.clone());
		let err = client
			.send(ApiRequest::post(path))
			.await
			.expect_err("Refresh endpoint 401 should be surfaced.");

		assert!(matches!(err, Error::Unauthorized(ref e) if e.status == 401));
		assert_eq!(api.calls(REFRESH), 1);
		assert_eq!(client.refresh_metrics.attempts(), 0);
		assert!(navigation.redirects().is_empty());
	}

	let api = Arc::new(ScriptedApi::new(RefreshScript::Renew));
	let client = client(&api);
	let err = client
		.send(ApiRequest::post("https://portal.example.org/api/auth/logout"))
		.await
		.expect_err("Logout 401 should be surfaced.");

	assert!(matches!(err, Error::Unauthorized(ref e) if e.status == 401));
	assert_eq!(api.calls("/api/auth/logout"), 1);
	assert_eq!(api.calls(REFRESH), 0);
}

#[tokio::test]
async fn transport_and_server_failures_skip_the_refresh() {
	let api = Arc::new(ScriptedApi::new(RefreshScript::Renew));
	let client = client(&api);
	let offline = client
		.send(ApiRequest::get("/api/offline"))
		.await
		.expect_err("Network failures should propagate.");

	assert!(matches!(offline, Error::Transport(TransportError::Network { .. })));
	assert!(!offline.requires_login());

	let broken = client
		.send(ApiRequest::get("/api/broken"))
		.await
		.expect_err("Server errors should propagate.");

	match broken {
		Error::Http(e) => {
			assert_eq!(e.status, 500);
			assert_eq!(e.message(), "Database unavailable");
		},
		other => panic!("Unexpected error variant: {other:?}."),
	}

	assert_eq!(api.calls(REFRESH), 0);
}

#[tokio::test]
async fn unreachable_refresh_outside_protected_views_does_not_redirect() {
	let api = Arc::new(ScriptedApi::new(RefreshScript::Unreachable));
	let navigation = Arc::new(RecordingNavigation::at("/donate"));
	let client = client(&api).with_navigation(navigation.clone());
	let err = client
		.get::<Value>("/api/contributions")
		.await
		.expect_err("Unreachable refresh should fail the request.");

	match err {
		Error::RefreshFailed { failure, .. } => assert_eq!(failure.status, None),
		other => panic!("Unexpected error variant: {other:?}."),
	}

	assert!(navigation.redirects().is_empty());
}

#[tokio::test]
async fn expiry_after_a_settled_refresh_starts_a_new_one() {
	let api = Arc::new(ScriptedApi::new(RefreshScript::Renew));
	let client = client(&api);

	client.get::<Value>("/api/contributions").await.expect("First refresh should recover.");
	api.expire_session();
	client.get::<Value>("/api/contributions").await.expect("Second refresh should recover.");

	assert_eq!(api.calls(REFRESH), 2);
	assert_eq!(client.refresh_metrics.attempts(), 2);
	assert_eq!(client.refresh_metrics.queued(), 0);
}

#[tokio::test]
async fn explicit_refresh_joins_the_one_in_flight() {
	let api = Arc::new(ScriptedApi::new(RefreshScript::Renew).gated());
	let client = client(&api);
	let (request, refresh, ()) = tokio::join!(
		client.get::<Value>("/api/activity-log"),
		async {
			while !client.is_refreshing() {
				tokio::task::yield_now().await;
			}

			client.refresh_session().await
		},
		async {
			wait_for_queue(&client, 1).await;
			api.release_refresh();
		},
	);

	request.expect("Request should succeed after the shared refresh.");
	refresh.expect("Explicit refresh should share the in-flight outcome.");

	assert_eq!(api.calls(REFRESH), 1);
}

#[tokio::test]
async fn abandoned_leader_releases_waiters() {
	let api = Arc::new(ScriptedApi::new(RefreshScript::Renew).gated());
	let client = client(&api);
	let leader = {
		let client = client.clone();

		tokio::spawn(async move { client.get::<Value>("/api/contributions").await })
	};

	while !client.is_refreshing() {
		tokio::task::yield_now().await;
	}

	let (follower, ()) = tokio::join!(client.get::<Value>("/api/committees"), async {
		wait_for_queue(&client, 1).await;
		leader.abort();
	});

	match follower.expect_err("Waiter should be released when the leader is dropped.") {
		Error::RefreshFailed { failure, rejected } => {
			assert_eq!(failure, RefreshFailure::abandoned());
			assert_eq!(rejected.map(|e| e.status), Some(401));
		},
		other => panic!("Unexpected error variant: {other:?}."),
	}

	assert!(!client.is_refreshing());
	assert_eq!(client.queued_requests(), 0);
}
