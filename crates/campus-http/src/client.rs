//! Authenticated JSON client

use parking_lot::RwLock;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

use campus_storage::{PersistedStore, SESSION_KEYS, TOKEN_KEY};

use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::Result;

/// Receives the global "credential rejected" signal.
///
/// Called after the client has already cleared the persisted session.
/// Implementations must not issue requests through the same client.
pub trait UnauthorizedHandler: Send + Sync {
    fn on_unauthorized(&self);
}

/// Supplies the live bearer token ahead of the persisted one.
///
/// `None` means "ask the store". Must not block on network work.
pub trait TokenSource: Send + Sync {
    fn token(&self) -> Option<String>;
}

pub struct ApiClient {
    http: reqwest::Client,
    config: ApiConfig,
    store: Arc<dyn PersistedStore>,
    unauthorized_handler: Arc<RwLock<Option<Arc<dyn UnauthorizedHandler>>>>,
    token_source: Arc<RwLock<Option<Arc<dyn TokenSource>>>>,
}

impl ApiClient {
    pub fn new(config: ApiConfig, store: Arc<dyn PersistedStore>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http,
            config,
            store,
            unauthorized_handler: Arc::new(RwLock::new(None)),
            token_source: Arc::new(RwLock::new(None)),
        })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// The store tokens are read from and cleared on 401.
    pub fn store(&self) -> Arc<dyn PersistedStore> {
        Arc::clone(&self.store)
    }

    /// Register the component told about 401 responses. Replaces any
    /// previous handler.
    pub fn set_unauthorized_handler(&self, handler: Arc<dyn UnauthorizedHandler>) {
        *self.unauthorized_handler.write() = Some(handler);
    }

    /// Register where the in-memory token comes from. Replaces any previous
    /// source.
    pub fn set_token_source(&self, source: Arc<dyn TokenSource>) {
        *self.token_source.write() = Some(source);
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request::<(), T>(Method::GET, path, None).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(Method::POST, path, Some(body)).await
    }

    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request::<(), T>(Method::POST, path, None).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(Method::PUT, path, Some(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request::<(), T>(Method::DELETE, path, None).await
    }

    pub async fn request<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.config.endpoint(path)?;
        let mut request = self.http.request(method.clone(), url);

        if let Some(token) = self.bearer_token() {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            tracing::warn!(method = %method, path = %path, error = %e, "Request failed");
            ApiError::from(e)
        })?;

        let status = response.status();
        let bytes = response.bytes().await?;

        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!(method = %method, path = %path, "Credential rejected by server");
            self.handle_unauthorized();
            return Err(ApiError::Unauthorized {
                message: server_message(&bytes),
            });
        }

        if !status.is_success() {
            tracing::debug!(method = %method, path = %path, status = status.as_u16(), "Request returned error status");
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: server_message(&bytes),
            });
        }

        // An empty body decodes like `null`, so callers may ask for `()`
        // or `Option<_>` on endpoints that return nothing.
        if bytes.is_empty() {
            return Ok(serde_json::from_slice(b"null")?);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Token from the registered source, else from the store. A store
    /// failure means "no token".
    fn bearer_token(&self) -> Option<String> {
        let source = self.token_source.read().clone();
        if let Some(token) = source.and_then(|s| s.token()).filter(|t| !t.is_empty()) {
            return Some(token);
        }

        match self.store.get(TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                tracing::warn!(error = %e, "Token lookup failed, sending request unauthenticated");
                None
            }
        }
    }

    fn handle_unauthorized(&self) {
        if let Err(e) = self.store.remove_many(&SESSION_KEYS) {
            tracing::warn!(error = %e, "Failed to clear persisted session");
        }

        // Clone out so the handler runs without the lock held
        let handler = self.unauthorized_handler.read().clone();
        if let Some(handler) = handler {
            handler.on_unauthorized();
        }
    }
}

impl Clone for ApiClient {
    fn clone(&self) -> Self {
        Self {
            http: self.http.clone(),
            config: self.config.clone(),
            store: Arc::clone(&self.store),
            unauthorized_handler: Arc::clone(&self.unauthorized_handler),
            token_source: Arc::clone(&self.token_source),
        }
    }
}

fn server_message(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<serde_json::Value>(body)
        .ok()?
        .get("message")?
        .as_str()
        .map(str::to_string)
}
