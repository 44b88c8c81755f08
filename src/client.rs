//! Cookie-credentialed API client with transparent, single-flight session refresh.
//!
//! [`AuthenticatedClient::send`] dispatches a request and, when the API answers `401` for a call
//! that is neither an auth endpoint nor already retried, drives the session through the shared
//! [`RefreshCoordinator`]:
//!
//! - the first such request leads the refresh and calls the refresh endpoint;
//! - requests that fail while the refresh is in flight park on it;
//! - when it settles every parked request is released with the same outcome, then each resends
//!   itself once (success) or fails with [`Error::RefreshFailed`] (failure).
//!
//! A failed refresh also sends the navigation hook to the login view, once, and only when the
//! current view is protected. Transport failures and non-401 statuses never touch the session.

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	auth::LoginCredentials,
	config::ClientConfig,
	error::{ConfigError, HttpError, RefreshFailure},
	http::{HttpTransport, TransportCall},
	navigation::{DetachedNavigation, NavigationHook},
	obs::{self, CallKind, CallOutcome, CallSpan},
	request::{ApiRequest, ApiResponse},
	session::{RefreshCoordinator, RefreshLease, RefreshMetrics, RefreshOutcome, RefreshTicket},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

/// Client specialized for the crate's default reqwest transport.
#[cfg(feature = "reqwest")]
pub type ReqwestAuthenticatedClient = AuthenticatedClient<ReqwestTransport>;

/// Admin API client that keeps the cookie session alive across expired access tokens.
///
/// Clones share the transport, the configuration, the navigation hook, the refresh metrics and,
/// most importantly, the refresh coordinator, so concurrent requests issued through any clone
/// trigger at most one refresh. Separately constructed clients never coordinate with each other.
pub struct AuthenticatedClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Transport every call is dispatched through.
	pub transport: Arc<T>,
	/// Validated client configuration.
	pub config: Arc<ClientConfig>,
	/// Hook notified when the session cannot be recovered.
	pub navigation: Arc<dyn NavigationHook>,
	/// Shared counters for refresh attempts and queued requests.
	pub refresh_metrics: Arc<RefreshMetrics>,
	coordinator: Arc<RefreshCoordinator>,
}
impl<T> AuthenticatedClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates a client over a caller-provided transport.
	///
	/// The configuration is validated again here because its fields are public and may have been
	/// edited after it was built.
	pub fn with_transport(config: ClientConfig, transport: impl Into<Arc<T>>) -> Result<Self> {
		config.validate().map_err(ConfigError::from)?;

		Ok(Self {
			transport: transport.into(),
			config: Arc::new(config),
			navigation: Arc::new(DetachedNavigation),
			refresh_metrics: Default::default(),
			coordinator: RefreshCoordinator::new(),
		})
	}

	/// Replaces the navigation hook (headless by default).
	pub fn with_navigation(mut self, navigation: Arc<dyn NavigationHook>) -> Self {
		self.navigation = navigation;

		self
	}

	/// Sends `request`, refreshing the session at most once if the API rejects it with `401`.
	///
	/// Returns the response for any 2xx status. Every other outcome is an error:
	///
	/// - [`Error::Transport`] when no response arrived (timeouts included); the session is left
	///   alone.
	/// - [`Error::Http`] for non-401 failures.
	/// - [`Error::Unauthorized`] for a 401 from an auth endpoint, or a 401 on the resend that
	///   follows a successful refresh.
	/// - [`Error::RefreshFailed`] when the refresh this request led or waited on failed.
	pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
		const KIND: CallKind = CallKind::Request;

		let span = CallSpan::new(KIND, "send");

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let result = span.instrument(self.send_with_refresh(request)).await;

		obs::record_call_outcome(KIND, CallOutcome::of(&result));

		result
	}

	/// Sends `request` and decodes the JSON response body.
	pub async fn send_json<R>(&self, request: ApiRequest) -> Result<R>
	where
		R: DeserializeOwned,
	{
		self.send(request).await?.json()
	}

	/// `GET`s `path` and decodes the JSON response.
	pub async fn get<R>(&self, path: impl Into<String>) -> Result<R>
	where
		R: DeserializeOwned,
	{
		self.send_json(ApiRequest::get(path)).await
	}

	/// `POST`s `body` as JSON to `path` and decodes the JSON response.
	pub async fn post<B, R>(&self, path: impl Into<String>, body: &B) -> Result<R>
	where
		B: ?Sized + Serialize,
		R: DeserializeOwned,
	{
		self.send_json(ApiRequest::post(path).json(body)?).await
	}

	/// `PUT`s `body` as JSON to `path` and decodes the JSON response.
	pub async fn put<B, R>(&self, path: impl Into<String>, body: &B) -> Result<R>
	where
		B: ?Sized + Serialize,
		R: DeserializeOwned,
	{
		self.send_json(ApiRequest::put(path).json(body)?).await
	}

	/// `DELETE`s `path` and decodes the JSON response (an empty body decodes as `()`).
	pub async fn delete<R>(&self, path: impl Into<String>) -> Result<R>
	where
		R: DeserializeOwned,
	{
		self.send_json(ApiRequest::delete(path)).await
	}

	/// Exchanges credentials for session cookies at the login endpoint.
	///
	/// A `401` here means the credentials were rejected and is surfaced as
	/// [`Error::Unauthorized`]; it never starts a refresh.
	pub async fn login(&self, credentials: &LoginCredentials) -> Result<ApiResponse> {
		let request = ApiRequest::post(self.config.endpoints.login.as_str()).json(credentials)?;

		self.send_once(CallKind::Login, "login", request).await
	}

	/// Clears the session at the logout endpoint; never retried.
	pub async fn logout(&self) -> Result<ApiResponse> {
		let request = ApiRequest::post(self.config.endpoints.logout.as_str());

		self.send_once(CallKind::Logout, "logout", request).await
	}

	/// Refreshes the session now, or joins the refresh already in flight.
	pub async fn refresh_session(&self) -> Result<()> {
		self.await_refresh()
			.await
			.map_err(|failure| Error::RefreshFailed { failure, rejected: None })
	}

	/// Returns true while a refresh is in flight.
	pub fn is_refreshing(&self) -> bool {
		self.coordinator.is_refreshing()
	}

	/// Returns how many requests are parked on the refresh in flight.
	pub fn queued_requests(&self) -> usize {
		self.coordinator.queued()
	}

	async fn send_with_refresh(&self, mut request: ApiRequest) -> Result<ApiResponse> {
		let url = request.url(&self.config.base_url)?;
		let response = self.dispatch_to(&url, &request).await?;

		if !response.is_unauthorized() {
			return response.error_for_status();
		}

		let rejected = HttpError::from_response(&response);

		if request.is_retried() || self.config.targets_auth_endpoint(&url) {
			return Err(Error::Unauthorized(rejected));
		}
		if let Err(failure) = self.await_refresh().await {
			return Err(Error::RefreshFailed { failure, rejected: Some(rejected) });
		}

		request.mark_retried();

		self.send_once(CallKind::Replay, "send_with_refresh", request).await
	}

	async fn send_once(
		&self,
		kind: CallKind,
		stage: &'static str,
		request: ApiRequest,
	) -> Result<ApiResponse> {
		let span = CallSpan::new(kind, stage);

		obs::record_call_outcome(kind, CallOutcome::Attempt);

		let result = span
			.instrument(async {
				let response = self.dispatch(&request).await?;

				if response.is_unauthorized() {
					Err(Error::Unauthorized(HttpError::from_response(&response)))
				} else {
					response.error_for_status()
				}
			})
			.await;

		obs::record_call_outcome(kind, CallOutcome::of(&result));

		result
	}

	async fn dispatch(&self, request: &ApiRequest) -> Result<ApiResponse> {
		let url = request.url(&self.config.base_url)?;

		self.dispatch_to(&url, request).await
	}

	async fn dispatch_to(&self, url: &Url, request: &ApiRequest) -> Result<ApiResponse> {
		let timeout = request.timeout_override().unwrap_or_else(|| self.config.timeout());
		let response = self.transport.execute(TransportCall { url, request, timeout }).await?;

		Ok(response)
	}

	async fn await_refresh(&self) -> RefreshOutcome {
		match self.coordinator.enter() {
			RefreshTicket::Lead(lease) => self.lead_refresh(lease).await,
			RefreshTicket::Follow(waiter) => {
				self.refresh_metrics.record_queued();

				waiter.wait().await
			},
		}
	}

	async fn lead_refresh(&self, lease: RefreshLease) -> RefreshOutcome {
		const KIND: CallKind = CallKind::Refresh;

		let span = CallSpan::new(KIND, "lead_refresh");

		obs::record_call_outcome(KIND, CallOutcome::Attempt);
		self.refresh_metrics.record_attempt();

		let outcome = span.instrument(self.call_refresh_endpoint()).await;

		match &outcome {
			Ok(()) => self.refresh_metrics.record_success(),
			Err(_) => self.refresh_metrics.record_failure(),
		}

		obs::record_call_outcome(KIND, CallOutcome::of(&outcome));

		let released = lease.settle(outcome.clone());

		span.note(&format!("refresh settled, released {released} queued requests"));

		if outcome.is_err() {
			self.redirect_to_login();
		}

		outcome
	}

	async fn call_refresh_endpoint(&self) -> RefreshOutcome {
		let request = ApiRequest::post(self.config.endpoints.refresh.as_str());

		match self.dispatch(&request).await {
			Ok(response) if response.is_success() => Ok(()),
			Ok(response) => Err(RefreshFailure::rejected(&HttpError::from_response(&response))),
			Err(Error::Transport(e)) => Err(RefreshFailure::unreachable(&e)),
			Err(e) => Err(RefreshFailure { status: None, reason: e.to_string() }),
		}
	}

	fn redirect_to_login(&self) {
		let Some(location) = self.navigation.current_location() else {
			return;
		};

		if self.config.is_protected(&location) {
			self.navigation.redirect(&self.config.login_location);
		}
	}
}
#[cfg(feature = "reqwest")]
impl AuthenticatedClient<ReqwestTransport> {
	/// Creates a client backed by a reqwest transport with its own cookie store.
	pub fn new(config: ClientConfig) -> Result<Self> {
		Self::with_transport(config, ReqwestTransport::new()?)
	}
}
impl<T> Clone for AuthenticatedClient<T>
where
	T: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self {
			transport: Arc::clone(&self.transport),
			config: Arc::clone(&self.config),
			navigation: Arc::clone(&self.navigation),
			refresh_metrics: Arc::clone(&self.refresh_metrics),
			coordinator: Arc::clone(&self.coordinator),
		}
	}
}
impl<T> Debug for AuthenticatedClient<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthenticatedClient")
			.field("base_url", &self.config.base_url.as_str())
			.field("refreshing", &self.coordinator.is_refreshing())
			.field("queued", &self.coordinator.queued())
			.finish()
	}
}
