//! API client for communicating with the Callsheet REST API.
//!
//! This module provides the `ApiClient` struct for logging in,
//! registering, and submitting or listing artist and availability data.
//!
//! The API uses JWT bearer token authentication. Access tokens are
//! short-lived; a request rejected with 401 is replayed once after the
//! refresh coordinator has obtained a new token.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, Method, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::auth::{
    AuthEvent, CredentialStore, RefreshCoordinator, Session, SessionGate, SessionStore,
    TokenRefresher,
};
use crate::config::Config;
use crate::models::{
    Artist, AvailabilitySlot, NewArtist, NewAvailability, RegisterOutcome, User,
};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum automatic replays of a request after an authorization
/// failure. One replay per request keeps a stale token from looping.
const MAX_AUTH_RETRIES: u8 = 1;

// Wire types for the auth endpoints

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    access: String,
    refresh: String,
    #[serde(default)]
    user: Option<User>,
}

#[derive(Debug, Serialize)]
struct RegisterRequest<'a> {
    username: &'a str,
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct RegisterResponse {
    #[serde(default)]
    access: Option<String>,
    #[serde(default)]
    refresh: Option<String>,
    #[serde(default)]
    user: Option<User>,
}

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access: String,
}

/// Artists and availability fetched together for a host dashboard.
#[derive(Debug, Clone)]
pub struct Overview {
    pub artists: Vec<Artist>,
    pub availability: Vec<AvailabilitySlot>,
}

/// Issues the token refresh call.
///
/// Kept apart from the authenticated request path: the refresh call
/// carries no bearer header, uses the refresh token only, and is never
/// itself retried.
struct RefreshEndpoint {
    http: Client,
    base_url: String,
}

#[async_trait]
impl TokenRefresher for RefreshEndpoint {
    async fn refresh(&self, refresh_token: &str) -> Result<String, ApiError> {
        let url = format!("{}/refresh/", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&RefreshRequest {
                refresh: refresh_token,
            })
            .send()
            .await?;
        let response = check_response(response).await?;
        let parsed: RefreshResponse = response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse refresh response: {}", e)))?;
        Ok(parsed.access)
    }
}

/// API client for the Callsheet service.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    store: SessionStore,
    gate: SessionGate,
    refresh: RefreshCoordinator,
}

impl ApiClient {
    /// Create a new API client wired to the given session store and gate.
    pub fn new(config: &Config, store: SessionStore, gate: SessionGate) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        let base_url = config.base_url.trim_end_matches('/').to_string();

        let refresher = Arc::new(RefreshEndpoint {
            http: http.clone(),
            base_url: base_url.clone(),
        });
        let refresh = RefreshCoordinator::new(store.clone(), gate.clone(), refresher);

        Ok(Self {
            http,
            base_url,
            store,
            gate,
            refresh,
        })
    }

    /// Snapshot of the current session.
    pub fn session(&self) -> Session {
        self.store.get()
    }

    pub fn is_authenticated(&self) -> bool {
        self.store.is_authenticated()
    }

    /// Subscribe to forced-logout signals.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<AuthEvent> {
        self.gate.subscribe()
    }

    // ===== Auth endpoints =====

    /// Authenticate and commit the session. With `remember`, the
    /// password is also stored in the OS keychain for prefilled logins.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        remember: bool,
    ) -> Result<Session, ApiError> {
        let url = format!("{}/login/", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&LoginRequest { username, password })
            .send()
            .await?;
        let response = check_response(response).await?;
        let auth: LoginResponse = response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse login response: {}", e)))?;

        // The in-memory session wins over a failed durable write.
        if let Err(e) = self.store.set_auth(auth.user, &auth.access, &auth.refresh) {
            warn!(error = %e, "Failed to persist session");
        }

        if remember {
            if let Err(e) = CredentialStore::remember(username, password) {
                warn!(error = %e, "Failed to store credentials in keychain");
            }
        }

        info!(username, "Login successful");
        Ok(self.store.get())
    }

    /// Create an account. The service may auto-login by returning a
    /// token pair; without tokens the account awaits a normal login.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<RegisterOutcome, ApiError> {
        let url = format!("{}/register/", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&RegisterRequest {
                username,
                email,
                password,
            })
            .send()
            .await?;
        let response = check_response(response).await?;
        let parsed: RegisterResponse = response.json().await.map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse register response: {}", e))
        })?;

        match (parsed.access, parsed.refresh) {
            (Some(access), Some(refresh)) => {
                if let Err(e) = self.store.set_auth(parsed.user, &access, &refresh) {
                    warn!(error = %e, "Failed to persist session");
                }
                info!(username, "Registered and logged in");
                Ok(RegisterOutcome::LoggedIn(self.store.get()))
            }
            _ => {
                info!(username, "Registered without auto-login");
                Ok(RegisterOutcome::Registered)
            }
        }
    }

    /// Drop the session and signal the host to navigate to login.
    pub fn logout(&self) {
        self.gate.terminate();
    }

    // ===== Resource endpoints =====

    /// Fetch all artist profiles.
    pub async fn fetch_artists(&self) -> Result<Vec<Artist>, ApiError> {
        self.send(Method::GET, "/artists/", None::<&()>).await
    }

    /// Submit a new artist profile.
    pub async fn submit_artist(&self, artist: &NewArtist) -> Result<Artist, ApiError> {
        self.send(Method::POST, "/artists/", Some(artist)).await
    }

    /// Fetch all availability entries.
    pub async fn fetch_availability(&self) -> Result<Vec<AvailabilitySlot>, ApiError> {
        self.send(Method::GET, "/availability/", None::<&()>).await
    }

    /// Submit a new availability entry.
    pub async fn submit_availability(
        &self,
        slot: &NewAvailability,
    ) -> Result<AvailabilitySlot, ApiError> {
        self.send(Method::POST, "/availability/", Some(slot)).await
    }

    /// Fetch artists and availability concurrently for a host dashboard.
    pub async fn fetch_overview(&self) -> Result<Overview, ApiError> {
        let (artists, availability) =
            futures::future::try_join(self.fetch_artists(), self.fetch_availability()).await?;
        Ok(Overview {
            artists,
            availability,
        })
    }

    // ===== Request plumbing =====

    /// Attach the bearer credential if an access token is present.
    ///
    /// An absent token is not a failure; the request goes out
    /// unauthenticated and the server's verdict is handled downstream.
    /// The refresh token is never attached to a request.
    fn auth_headers(session: &Session) -> header::HeaderMap {
        let mut headers = header::HeaderMap::new();
        if let Some(ref token) = session.access_token {
            match header::HeaderValue::from_str(&format!("Bearer {}", token)) {
                Ok(value) => {
                    headers.insert(header::AUTHORIZATION, value);
                }
                Err(_) => warn!("Access token is not a valid header value; sending unauthenticated"),
            }
        }
        headers
    }

    /// Retry eligibility is a pure function of the per-request counter.
    fn should_recover(status: StatusCode, attempt: u8) -> bool {
        status == StatusCode::UNAUTHORIZED && attempt < MAX_AUTH_RETRIES
    }

    /// Send an authenticated request, absorbing at most one
    /// authorization failure through the refresh flow.
    async fn send<T, B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);
        // Explicit replay counter for this request.
        let mut attempt: u8 = 0;

        loop {
            // Token attachment reads the store at dispatch, so a replay
            // picks up the value committed by the refresh.
            let headers = Self::auth_headers(&self.store.get());
            let mut request = self.http.request(method.clone(), &url).headers(headers);
            if let Some(body) = body {
                request = request.json(body);
            }

            // Transport failures (including timeouts) surface
            // immediately and leave the session untouched.
            let response = request.send().await?;
            let status = response.status();

            if Self::should_recover(status, attempt) {
                attempt += 1;
                debug!(url = %url, attempt, "Authorization failure, recovering via refresh");
                if self.refresh.recover().await.is_err() {
                    // The session is gone; surface the original
                    // authorization failure, not the refresh error.
                    return Err(ApiError::Unauthorized);
                }
                continue;
            }

            let response = check_response(response).await?;
            return response.json().await.map_err(|e| {
                ApiError::InvalidResponse(format!("Failed to parse response from {}: {}", url, e))
            });
        }
    }
}

/// Check if a response is successful, returning a typed error with the
/// body if not.
async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::from_status(status, &body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authed_session(token: &str) -> Session {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().to_path_buf());
        store.set_auth(None, token, "ref-1").unwrap();
        store.get()
    }

    #[test]
    fn test_auth_headers_attach_bearer() {
        let headers = ApiClient::auth_headers(&authed_session("acc-1"));
        assert_eq!(
            headers.get(header::AUTHORIZATION).unwrap(),
            "Bearer acc-1"
        );
    }

    #[test]
    fn test_auth_headers_absent_token() {
        let headers = ApiClient::auth_headers(&Session::default());
        assert!(headers.get(header::AUTHORIZATION).is_none());
    }

    #[test]
    fn test_auth_headers_skip_malformed_token() {
        let headers = ApiClient::auth_headers(&authed_session("bad\ntoken"));
        assert!(headers.get(header::AUTHORIZATION).is_none());
    }

    #[test]
    fn test_recovery_admits_exactly_one_replay() {
        assert!(ApiClient::should_recover(StatusCode::UNAUTHORIZED, 0));
        assert!(!ApiClient::should_recover(StatusCode::UNAUTHORIZED, 1));
        assert!(!ApiClient::should_recover(StatusCode::FORBIDDEN, 0));
        assert!(!ApiClient::should_recover(StatusCode::BAD_GATEWAY, 0));
    }

    #[test]
    fn test_parse_login_response() {
        let json = r#"{
            "access": "acc-1",
            "refresh": "ref-1",
            "user": {"id": 42, "username": "stagehand", "email": "crew@example.com"}
        }"#;
        let parsed: LoginResponse = serde_json::from_str(json).expect("Failed to parse login JSON");
        assert_eq!(parsed.access, "acc-1");
        assert_eq!(parsed.refresh, "ref-1");
        assert_eq!(parsed.user.unwrap().username, "stagehand");
    }

    #[test]
    fn test_parse_login_response_without_user() {
        let json = r#"{"access": "acc-1", "refresh": "ref-1"}"#;
        let parsed: LoginResponse = serde_json::from_str(json).expect("Failed to parse login JSON");
        assert!(parsed.user.is_none());
    }

    #[test]
    fn test_parse_register_response_without_tokens() {
        let json = r#"{"user": {"id": 7, "username": "newbie", "email": "new@example.com"}}"#;
        let parsed: RegisterResponse =
            serde_json::from_str(json).expect("Failed to parse register JSON");
        assert!(parsed.access.is_none());
        assert!(parsed.refresh.is_none());
        assert_eq!(parsed.user.unwrap().id, 7);
    }

    #[test]
    fn test_base_url_trailing_slash_normalized() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().to_path_buf());
        let (gate, _events) = SessionGate::new(store.clone());
        let config = Config {
            base_url: "https://callsheet.example.com/api/".to_string(),
            ..Config::default()
        };
        let client = ApiClient::new(&config, store, gate).unwrap();
        assert_eq!(client.base_url, "https://callsheet.example.com/api");
        assert!(!client.is_authenticated());
    }
}
