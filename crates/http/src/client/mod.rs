//! Stockroom API client

pub mod auth;
pub mod error;
pub mod refresh;
pub mod request;
pub mod resources;

pub use error::{ApiErrorBody, ClientError};
pub use refresh::{RefreshOutcome, RefreshState};
pub use request::{Body, FormPart, RequestOptions};
pub use resources::Resource;

use refresh::RefreshCoordinator;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Client, ClientBuilder, Method, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use stockroom_core::{ApiSettings, SavedCookies};

/// Called once per failed refresh with the login route the user should be sent to
pub type SessionExpiredHook = Arc<dyn Fn(&str) + Send + Sync>;

/// Authenticated request gateway.
///
/// Cheap to clone; clones share the cookie jar and the refresh state.
#[derive(Clone)]
pub struct Gateway {
    inner: Arc<GatewayInner>,
}

struct GatewayInner {
    client: Client,
    jar: Arc<Jar>,
    base_url: String,
    bearer_token: Option<String>,
    refresh_path: String,
    login_route: String,
    auth_expired_statuses: Vec<StatusCode>,
    timeout: Option<Duration>,
    on_session_expired: Option<SessionExpiredHook>,
    refresh: Arc<RefreshCoordinator>,
}

impl fmt::Debug for Gateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gateway")
            .field("base_url", &self.inner.base_url)
            .field("refresh_path", &self.inner.refresh_path)
            .field("refresh_state", &self.refresh_state())
            .finish_non_exhaustive()
    }
}

impl Gateway {
    /// Create a new gateway with default configuration
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::builder().base_url(base_url).build()
    }

    /// Create a new gateway builder
    pub fn builder() -> GatewayBuilder {
        GatewayBuilder::default()
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Current refresh state
    pub fn refresh_state(&self) -> RefreshState {
        self.inner.refresh.state()
    }

    /// Number of refresh episodes started by this gateway
    pub fn refresh_count(&self) -> u64 {
        self.inner.refresh.episodes()
    }

    /// Snapshot of the cookie jar, for restoring the session in a later process.
    ///
    /// Holds the cookies sent to the API root and, separately, any extra ones
    /// scoped to the refresh endpoint.
    pub fn saved_cookies(&self) -> Vec<SavedCookies> {
        let api_url = format!("{}/", self.inner.base_url);
        let refresh_url = self.url(&self.inner.refresh_path);

        let api = self.cookie_header(&api_url);
        let refresh = self.cookie_header(&refresh_url).map(|header| {
            let api_pairs: Vec<&str> = api
                .as_deref()
                .map_or_else(Vec::new, |h| h.split("; ").collect());
            header
                .split("; ")
                .filter(|pair| !api_pairs.contains(pair))
                .collect::<Vec<_>>()
                .join("; ")
        });

        [(api_url, api), (refresh_url, refresh)]
            .into_iter()
            .filter_map(|(url, header)| {
                let header = header.filter(|h| !h.is_empty())?;
                Some(SavedCookies { url, header })
            })
            .collect()
    }

    fn cookie_header(&self, url: &str) -> Option<String> {
        let url = Url::parse(url).ok()?;
        let header = self.inner.jar.cookies(&url)?;
        header.to_str().ok().map(str::to_string)
    }

    /// Send a request, refreshing the session and replaying once if the credential expired.
    ///
    /// Returns the response when its status is a success.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        options: RequestOptions,
    ) -> Result<Response, ClientError> {
        let response = self.send(&method, path, &options).await?;

        if options.skip_refresh || !self.is_auth_expired_status(response.status()) {
            return Self::check(response).await;
        }

        debug!(%method, path, status = %response.status(), "Access credential expired");

        match self.refresh_session().await {
            RefreshOutcome::Refreshed => {
                debug!(%method, path, "Replaying request after refresh");
                // The replay never re-enters the refresh protocol
                let replay = self.send(&method, path, &options).await?;
                Self::check(replay).await
            }
            RefreshOutcome::Failed => Err(ClientError::SessionExpired),
        }
    }

    /// Send a request and decode its JSON body
    pub async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, ClientError> {
        let response = self.request(method, path, options).await?;
        let bytes = response.bytes().await.map_err(ClientError::Network)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Send a request whose response body is not needed
    pub async fn execute_empty(
        &self,
        method: Method,
        path: &str,
        options: RequestOptions,
    ) -> Result<(), ClientError> {
        self.request(method, path, options).await.map(drop)
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.inner.base_url, path)
        } else {
            format!("{}/{}", self.inner.base_url, path)
        }
    }

    fn is_auth_expired_status(&self, status: StatusCode) -> bool {
        self.inner.auth_expired_statuses.contains(&status)
    }

    /// One network round trip with credentials attached
    async fn send(
        &self,
        method: &Method,
        path: &str,
        options: &RequestOptions,
    ) -> Result<Response, ClientError> {
        let mut request = self.inner.client.request(method.clone(), self.url(path));

        if let Some(token) = &self.inner.bearer_token {
            request = request.bearer_auth(token);
        }
        if let Some(timeout) = self.inner.timeout {
            request = request.timeout(timeout);
        }
        // Per-request options come last so their timeout wins
        let request = options.apply(request)?;

        let response = request.send().await.map_err(ClientError::Network)?;
        trace!(%method, path, status = %response.status(), "Response received");
        Ok(response)
    }

    async fn check(response: Response) -> Result<Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let error = ClientError::from_response(status, &body);
        debug!(status = %status, "Request failed: {error}");
        Err(error)
    }

    /// Join the in-flight refresh or start one
    async fn refresh_session(&self) -> RefreshOutcome {
        self.inner
            .refresh
            .run(|guard| {
                // Everything the episode needs is owned, so it never keeps the gateway alive
                let request = self.refresh_request();
                let login_route = self.inner.login_route.clone();
                let hook = self.inner.on_session_expired.clone();

                async move {
                    let outcome = Self::call_refresh(request).await;
                    drop(guard);

                    match outcome {
                        RefreshOutcome::Refreshed => info!("Credential refresh succeeded"),
                        RefreshOutcome::Failed => {
                            warn!(%login_route, "Credential refresh failed, session is over");
                            if let Some(hook) = hook {
                                hook(&login_route);
                            }
                        }
                    }

                    outcome
                }
            })
            .await
    }

    /// POST with no body; the refresh credential travels in the cookie jar
    fn refresh_request(&self) -> reqwest::RequestBuilder {
        let mut request = self.inner.client.post(self.url(&self.inner.refresh_path));

        if let Some(token) = &self.inner.bearer_token {
            request = request.bearer_auth(token);
        }
        if let Some(timeout) = self.inner.timeout {
            request = request.timeout(timeout);
        }
        request
    }

    async fn call_refresh(request: reqwest::RequestBuilder) -> RefreshOutcome {
        match request.send().await {
            Ok(response) if response.status().is_success() => RefreshOutcome::Refreshed,
            Ok(response) => {
                debug!(status = %response.status(), "Refresh endpoint rejected the session");
                RefreshOutcome::Failed
            }
            Err(e) => {
                debug!("Refresh endpoint unreachable: {e}");
                RefreshOutcome::Failed
            }
        }
    }
}

/// Builder for [`Gateway`]
pub struct GatewayBuilder {
    base_url: Option<String>,
    bearer_token: Option<String>,
    refresh_path: String,
    login_route: String,
    auth_expired_statuses: Vec<u16>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
    cookies: Vec<SavedCookies>,
    on_session_expired: Option<SessionExpiredHook>,
}

impl Default for GatewayBuilder {
    fn default() -> Self {
        let defaults = ApiSettings::default();
        let timeout = defaults.timeout();
        Self {
            base_url: None,
            bearer_token: None,
            refresh_path: defaults.refresh_path,
            login_route: defaults.login_route,
            auth_expired_statuses: defaults.auth_expired_statuses,
            timeout,
            user_agent: None,
            cookies: Vec::new(),
            on_session_expired: None,
        }
    }
}

impl GatewayBuilder {
    /// Start from loaded settings
    pub fn from_settings(settings: &ApiSettings) -> Self {
        Self {
            base_url: Some(settings.base_url.clone()),
            refresh_path: settings.refresh_path.clone(),
            login_route: settings.login_route.clone(),
            auth_expired_statuses: settings.auth_expired_statuses.clone(),
            timeout: settings.timeout(),
            user_agent: settings.user_agent.clone(),
            ..Self::default()
        }
    }

    /// Set the base URL
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Send a bearer token in addition to the cookie jar
    #[must_use]
    pub fn bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Set the refresh endpoint path
    #[must_use]
    pub fn refresh_path(mut self, path: impl Into<String>) -> Self {
        self.refresh_path = path.into();
        self
    }

    /// Set the route handed to the session-expired hook
    #[must_use]
    pub fn login_route(mut self, route: impl Into<String>) -> Self {
        self.login_route = route.into();
        self
    }

    /// Set the statuses that mean "access credential expired"
    #[must_use]
    pub fn auth_expired_statuses(mut self, statuses: impl IntoIterator<Item = u16>) -> Self {
        self.auth_expired_statuses = statuses.into_iter().collect();
        self
    }

    /// Set the default per-request timeout
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Disable the default per-request timeout
    #[must_use]
    pub const fn no_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }

    /// Set the user agent
    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Restore cookies saved by [`Gateway::saved_cookies`]
    #[must_use]
    pub fn cookies(mut self, cookies: impl IntoIterator<Item = SavedCookies>) -> Self {
        self.cookies.extend(cookies);
        self
    }

    /// Called once per failed refresh, with the login route
    #[must_use]
    pub fn on_session_expired(mut self, hook: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_session_expired = Some(Arc::new(hook));
        self
    }

    /// Build the gateway
    pub fn build(self) -> Result<Gateway, ClientError> {
        let base_url = self
            .base_url
            .ok_or_else(|| ClientError::Configuration("base_url is required".into()))?;

        // Ensure base_url ends without a trailing slash
        let base_url = base_url.trim_end_matches('/').to_string();
        url::Url::parse(&base_url).map_err(|e| {
            ClientError::Configuration(format!("base_url '{base_url}' is invalid: {e}"))
        })?;

        if !self.refresh_path.starts_with('/') {
            return Err(ClientError::Configuration(
                "refresh_path must start with '/'".into(),
            ));
        }

        if self.auth_expired_statuses.is_empty() {
            return Err(ClientError::Configuration(
                "at least one auth-expired status is required".into(),
            ));
        }
        let auth_expired_statuses = self
            .auth_expired_statuses
            .iter()
            .map(|&code| {
                StatusCode::from_u16(code).map_err(|_| {
                    ClientError::Configuration(format!("{code} is not a valid HTTP status"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("stockroom-client/{}", env!("CARGO_PKG_VERSION")));

        let jar = Arc::new(Jar::default());
        for saved in &self.cookies {
            let url = Url::parse(&saved.url).map_err(|e| {
                ClientError::Configuration(format!(
                    "saved cookie url '{}' is invalid: {e}",
                    saved.url
                ))
            })?;
            for pair in saved.header.split("; ").filter(|p| !p.is_empty()) {
                jar.add_cookie_str(pair, &url);
            }
        }

        let client = ClientBuilder::new()
            .cookie_provider(Arc::clone(&jar))
            .user_agent(user_agent)
            .build()
            .map_err(|e| {
                ClientError::Configuration(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Gateway {
            inner: Arc::new(GatewayInner {
                client,
                jar,
                base_url,
                bearer_token: self.bearer_token,
                refresh_path: self.refresh_path,
                login_route: self.login_route,
                auth_expired_statuses,
                timeout: self.timeout,
                on_session_expired: self.on_session_expired,
                refresh: RefreshCoordinator::new(),
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_requires_base_url() {
        let result = Gateway::builder().build();
        assert!(matches!(result, Err(ClientError::Configuration(_))));
    }

    #[test]
    fn test_builder_trims_trailing_slash() {
        let gateway = Gateway::new("http://localhost:3000/api/").unwrap();
        assert_eq!(gateway.base_url(), "http://localhost:3000/api");
        assert_eq!(gateway.url("/products"), "http://localhost:3000/api/products");
        assert_eq!(gateway.url("products"), "http://localhost:3000/api/products");
    }

    #[test]
    fn test_builder_rejects_invalid_settings() {
        assert!(Gateway::new("not a url").is_err());
        assert!(
            Gateway::builder()
                .base_url("http://localhost")
                .refresh_path("auth/refresh")
                .build()
                .is_err()
        );
        assert!(
            Gateway::builder()
                .base_url("http://localhost")
                .auth_expired_statuses(Vec::new())
                .build()
                .is_err()
        );
        assert!(
            Gateway::builder()
                .base_url("http://localhost")
                .auth_expired_statuses([42])
                .build()
                .is_err()
        );
    }

    #[test]
    fn test_builder_from_settings() {
        let settings = ApiSettings {
            base_url: "https://stock.example.com/api".to_string(),
            auth_expired_statuses: vec![401],
            ..ApiSettings::default()
        };
        let gateway = GatewayBuilder::from_settings(&settings).build().unwrap();
        assert_eq!(gateway.base_url(), "https://stock.example.com/api");
        assert!(gateway.is_auth_expired_status(StatusCode::UNAUTHORIZED));
        assert!(!gateway.is_auth_expired_status(StatusCode::FORBIDDEN));
        assert_eq!(gateway.refresh_state(), RefreshState::Idle);
        assert_eq!(gateway.refresh_count(), 0);
    }
}
