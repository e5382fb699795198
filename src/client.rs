//! HTTP client for the Panorama backend
//!
//! [`ApiClient`] attaches the bearer token from the [`CredentialStore`] to
//! every request and recovers from a single 401 per request by refreshing
//! the token pair. Concurrent 401s caused by the same expired token share
//! one refresh call.

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use panorama_protocol::api::{RefreshTokenRequest, RefreshTokenResponse};
use panorama_protocol::common::ApiErrorBody;

use crate::config::ClientConfig;
use crate::error::{PanoramaError, Result};
use crate::navigation::{NavigationMode, Navigator};
use crate::routing::Route;
use crate::store::{CredentialStore, TokenPair};

pub const REFRESH_ENDPOINT: &str = "/auth/refresh";

/// One outgoing request
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub endpoint: String,
    pub body: Option<serde_json::Value>,
    /// Full `Authorization` header value
    pub bearer: Option<String>,
    /// Set once the request has been re-issued after a refresh
    pub retried: bool,
    /// Opt out of the 401 refresh, used for the credential endpoints
    pub skip_refresh: bool,
}

impl ApiRequest {
    pub fn new(method: Method, endpoint: impl Into<String>, body: Option<serde_json::Value>) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            body,
            bearer: None,
            retried: false,
            skip_refresh: false,
        }
    }

    pub fn without_refresh(mut self) -> Self {
        self.skip_refresh = true;
        self
    }

    fn is_refresh_call(&self) -> bool {
        self.endpoint.trim_end_matches('/') == REFRESH_ENDPOINT
    }

    fn may_refresh(&self) -> bool {
        !self.retried && !self.skip_refresh && !self.is_refresh_call()
    }
}

/// Raw reply: status plus undecoded body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiReply {
    pub status: u16,
    pub body: String,
}

impl ApiReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Moves an [`ApiRequest`] over the wire
pub trait Transport: Send + Sync {
    fn send(&self, request: &ApiRequest) -> impl Future<Output = Result<ApiReply>> + Send;
}

/// `reqwest`-backed transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    config: ClientConfig,
}

impl HttpTransport {
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

impl Transport for HttpTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiReply> {
        let url = self.config.endpoint_url(&request.endpoint);

        let mut request_builder = self
            .client
            .request(request.method.clone(), &url)
            .header(CONTENT_TYPE, "application/json");

        if let Some(bearer) = &request.bearer {
            request_builder = request_builder.header(AUTHORIZATION, bearer);
        }
        if let Some(body) = &request.body {
            request_builder = request_builder.json(body);
        }

        let response = request_builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(ApiReply { status, body })
    }
}

/// Shared API client
#[derive(Debug)]
pub struct ApiClient<T> {
    transport: T,
    store: Arc<CredentialStore>,
    navigator: Arc<dyn Navigator>,
    refresh_gate: Mutex<()>,
    refresh_calls: AtomicUsize,
}

impl ApiClient<HttpTransport> {
    pub fn from_config(
        config: ClientConfig,
        store: Arc<CredentialStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        Ok(Self::new(HttpTransport::new(config)?, store, navigator))
    }
}

impl<T: Transport> ApiClient<T> {
    pub fn new(transport: T, store: Arc<CredentialStore>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            transport,
            store,
            navigator,
            refresh_gate: Mutex::new(()),
            refresh_calls: AtomicUsize::new(0),
        }
    }

    pub fn store(&self) -> &Arc<CredentialStore> {
        &self.store
    }

    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// `Authorization` value the next request will carry
    pub fn authorization_header(&self) -> Option<String> {
        self.store.authorization_header()
    }

    /// Number of refresh calls sent so far
    pub fn refresh_count(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub async fn get<R>(&self, endpoint: &str) -> Result<R>
    where
        R: DeserializeOwned,
    {
        self.send_json::<(), R>(Method::GET, endpoint, None).await
    }

    pub async fn post<B, R>(&self, endpoint: &str, body: &B) -> Result<R>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        self.send_json(Method::POST, endpoint, Some(body)).await
    }

    pub async fn send_json<B, R>(&self, method: Method, endpoint: &str, body: Option<&B>) -> Result<R>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        let body = body.map(serde_json::to_value).transpose()?;
        let reply = self.execute(ApiRequest::new(method, endpoint, body)).await?;
        decode(&reply)
    }

    /// Send a request, refreshing once on 401
    ///
    /// Non-2xx replies come back as [`PanoramaError::Api`].
    pub async fn execute(&self, mut request: ApiRequest) -> Result<ApiReply> {
        request.bearer = self.store.authorization_header();
        debug!(method = %request.method, endpoint = %request.endpoint, "request");

        let reply = self.transport.send(&request).await?;
        if reply.status != StatusCode::UNAUTHORIZED.as_u16() || !request.may_refresh() {
            return into_result(reply);
        }

        debug!(endpoint = %request.endpoint, "401 received, attempting token refresh");
        match self.refresh_after_rejection(request.bearer.as_deref()).await {
            Ok(Some(bearer)) => {
                request.retried = true;
                request.bearer = Some(bearer);
                let retried = self.transport.send(&request).await?;
                into_result(retried)
            }
            Ok(None) => {
                debug!("No refresh token stored, dropping rejected credentials");
                if let Err(clear_err) = self.store.clear_auth_tokens() {
                    warn!("Failed to clear credentials: {}", clear_err);
                }
                into_result(reply)
            }
            Err(e) => {
                warn!("Token refresh failed: {}", e);
                if let Err(clear_err) = self.store.clear_auth_tokens() {
                    warn!("Failed to clear credentials: {}", clear_err);
                }
                self.navigator.navigate(Route::Login, NavigationMode::Hard);
                Err(PanoramaError::session_expired(format!(
                    "Could not refresh the session: {}",
                    e
                )))
            }
        }
    }

    /// Refresh the token pair unless a concurrent caller already did
    ///
    /// Returns the bearer to retry with, or `None` when no refresh token is
    /// stored.
    async fn refresh_after_rejection(&self, rejected: Option<&str>) -> Result<Option<String>> {
        let _gate = self.refresh_gate.lock().await;

        if let Some(current) = self.store.authorization_header() {
            if Some(current.as_str()) != rejected {
                debug!("Access token already rotated by a concurrent request");
                return Ok(Some(current));
            }
        }

        let Some(refresh_token) = self.store.refresh_token() else {
            debug!("No refresh token stored, giving up");
            return Ok(None);
        };

        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        let body = serde_json::to_value(RefreshTokenRequest { refresh_token })?;
        let request = ApiRequest::new(Method::POST, REFRESH_ENDPOINT, Some(body));
        let reply = into_result(self.transport.send(&request).await?)?;
        let tokens: RefreshTokenResponse = decode(&reply)?;

        let tokens = TokenPair::from(tokens);
        self.store.set_tokens(&tokens)?;
        debug!("Token pair refreshed");

        Ok(Some(format!("Bearer {}", tokens.access_token)))
    }
}

fn into_result(reply: ApiReply) -> Result<ApiReply> {
    if reply.is_success() {
        return Ok(reply);
    }
    let message = error_message(&reply);
    Err(PanoramaError::api(reply.status, message))
}

fn error_message(reply: &ApiReply) -> String {
    if let Some(message) = serde_json::from_str::<ApiErrorBody>(&reply.body)
        .ok()
        .and_then(ApiErrorBody::into_message)
    {
        return message;
    }

    let text = reply.body.trim();
    if !text.is_empty() && text.len() <= 200 && !text.starts_with('{') {
        return text.to_string();
    }

    StatusCode::from_u16(reply.status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unknown API error")
        .to_string()
}

pub(crate) fn decode<R: DeserializeOwned>(reply: &ApiReply) -> Result<R> {
    serde_json::from_str(&reply.body).map_err(|e| {
        PanoramaError::invalid_response(format!("Invalid API response ({}): {}", e, reply.body))
    })
}
