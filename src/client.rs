//! Authenticated HTTP client for the Falcon REST API.
//!
//! `FalconClient` wraps a `reqwest::Client` and a `TokenProvider` behind a
//! `Mutex`, providing JSON request helpers (`get`, `post`, `delete`) that
//! parse every response into the standard Falcon envelope
//! (`meta` / `resources` / `errors`).
//!
//! Error detection:
//! - Any status code outside [200, 299] fails with `FalconError::Api`. The
//!   error message is the newline-joined concatenation of every
//!   `"{message} ({code})"` pair found in the response's error list, so the
//!   vendor's diagnostics are never discarded. This is the single
//!   error-detection point for every domain operation in the crate.
//!
//! Token lifecycle:
//! - Lazy acquisition: the first request that finds no cached token triggers
//!   `refresh_token()` automatically via `bearer_token()`.
//! - Expiry-aware: `TokenProvider::token()` returns `None` when the cached
//!   token has expired, which triggers a fresh refresh on the next request.
//! - One-shot 401 retry: if the API returns `401 Unauthorized` (token
//!   revoked server-side before our local expiry check caught it), the
//!   client invalidates the cached token, refreshes once, and retries the
//!   request exactly once. A second 401 is a hard failure.

use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::Mutex;

use crate::auth::TokenProvider;
use crate::error::{FalconError, Result};

const BASE_URL: &str = "https://api.crowdstrike.com";

/// Connect timeout for the Falcon API HTTP client.
/// Covers TCP + TLS handshake only.
const API_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Overall request timeout for Falcon API calls. All operations in this
/// crate are small JSON exchanges; one minute is ample headroom for slow
/// paginated queries.
const API_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

fn build_api_client() -> Client {
    Client::builder()
        .connect_timeout(API_CONNECT_TIMEOUT)
        .timeout(API_REQUEST_TIMEOUT)
        .build()
        .expect("failed to build HTTP client for the Falcon API")
}

// ── Response envelope ──────────────────────────────────────────────────

/// A single entry in the Falcon error list.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    /// Vendor error code (often mirrors the HTTP status).
    #[serde(default)]
    pub code: i64,
    /// Human-readable description of the failure.
    #[serde(default)]
    pub message: String,
}

/// Pagination block reported by listing endpoints under `meta.pagination`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Pagination {
    /// Total number of matching resources across all pages.
    #[serde(default)]
    pub total: u64,
    /// Offset to pass for the next page.
    #[serde(default)]
    pub offset: u64,
    /// Page size the server applied.
    #[serde(default)]
    pub limit: u64,
}

/// Response metadata. Only the pagination block matters to this crate;
/// everything else (query time, trace ID, quota) is ignored by serde.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Meta {
    /// Pagination block; present on listing endpoints only.
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

/// The standard Falcon response envelope: `{ meta, resources, errors }`.
///
/// `resources` holds ID strings for query endpoints and full entities for
/// detail endpoints, so the wrapper is generic over the item type. All
/// fields default so sparse responses (e.g. a bare `errors` array, or a
/// DELETE returning only `meta`) still deserialize.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    /// Response metadata (pagination and other bookkeeping).
    #[serde(default)]
    pub meta: Meta,
    /// The returned resources: ID strings or full entities.
    #[serde(default = "Vec::new")]
    pub resources: Vec<T>,
    /// Error-list entries; may be non-empty even on 2xx responses.
    #[serde(default)]
    pub errors: Vec<ApiError>,
}

/// Minimal envelope used to pull the error list out of a failed response
/// without caring about the resource type.
#[derive(Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    errors: Vec<ApiError>,
}

/// Builds the API-error message from a failed response body: every
/// `"{message} ({code})"` pair from the error list, joined by newlines.
/// Falls back to the raw body when the error list is absent or unparseable.
fn join_api_errors(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(env) if !env.errors.is_empty() => env
            .errors
            .iter()
            .map(|e| format!("{} ({})", e.message, e.code))
            .collect::<Vec<_>>()
            .join("\n"),
        _ => body.to_string(),
    }
}

// ── Client ─────────────────────────────────────────────────────────────

/// Authenticated HTTP client for the Falcon REST API.
///
/// - `auth` is behind a `Mutex` because `refresh_token()` requires
///   `&mut self` while API methods only need `&self`. The lock is held only
///   for the brief token check/refresh, never across an HTTP round-trip.
/// - `base_url` is stored as a `String` rather than a `&'static str` so it
///   can be overridden in tests (pointing at a wiremock server).
pub struct FalconClient {
    client: Client,
    base_url: String,
    auth: Mutex<TokenProvider>,
}

impl FalconClient {
    /// Creates a client against the production Falcon API base URL.
    pub fn new(auth: TokenProvider) -> Self {
        FalconClient {
            client: build_api_client(),
            base_url: BASE_URL.to_string(),
            auth: Mutex::new(auth),
        }
    }

    /// Constructor that accepts a custom base URL, used by tests to point
    /// at a local mock server instead of the real Falcon API.
    pub fn with_base_url(auth: TokenProvider, base_url: &str) -> Self {
        FalconClient {
            client: build_api_client(),
            base_url: base_url.trim_end_matches('/').to_string(),
            auth: Mutex::new(auth),
        }
    }

    /// Returns a valid bearer token, refreshing if none is cached or if the
    /// current token has expired. The mutex is held only for the token
    /// check and optional refresh.
    async fn bearer_token(&self) -> Result<String> {
        let mut auth = self.auth.lock().await;
        if auth.token().is_none() {
            auth.refresh_token().await?;
        }

        auth.token()
            .map(str::to_owned)
            .ok_or_else(|| FalconError::Auth {
                message: "token missing after refresh".to_string(),
                source: None,
            })
    }

    /// Invalidates the current token and acquires a fresh one. Called when
    /// the API returns 401, indicating the token was rejected server-side
    /// before our local expiry tracking detected it.
    async fn force_refresh(&self) -> Result<String> {
        let mut auth = self.auth.lock().await;
        auth.invalidate();
        auth.refresh_token().await?;

        auth.token()
            .map(str::to_owned)
            .ok_or_else(|| FalconError::Auth {
                message: "token missing after forced refresh".to_string(),
                source: None,
            })
    }

    /// Core HTTP method: sends an authenticated request and parses the
    /// Falcon envelope. All verb-specific methods delegate here.
    ///
    /// `path` is relative to `base_url` and starts with a slash.
    /// `query` pairs are appended to the URL; `body` is serialized as JSON
    /// when present.
    ///
    /// 401 retry behavior:
    /// - On `401 Unauthorized`, the client invalidates the cached token,
    ///   acquires a fresh one, and retries the request exactly once.
    /// - Any other non-2xx status (including a second 401) becomes
    ///   `FalconError::Api` with the joined error-list message.
    async fn send<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<ApiResponse<T>> {
        let url = format!("{}{}", self.base_url, path);

        let token = self.bearer_token().await?;
        let resp = self
            .build_request(method.clone(), &url, query, &token, body)
            .send()
            .await?;

        let resp = if resp.status() == StatusCode::UNAUTHORIZED {
            let fresh_token = self.force_refresh().await?;
            self.build_request(method, &url, query, &fresh_token, body)
                .send()
                .await?
        } else {
            resp
        };

        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(FalconError::Api {
                status,
                message: join_api_errors(&text),
            });
        }

        Ok(serde_json::from_str(&text)?)
    }

    /// Constructs an authenticated request builder with optional query
    /// pairs and JSON body. Factored out so the first attempt and the 401
    /// retry build identical requests.
    fn build_request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: &str,
        query: &[(&str, String)],
        token: &str,
        body: Option<&B>,
    ) -> reqwest::RequestBuilder {
        let mut req = self.client.request(method, url).bearer_auth(token);
        if !query.is_empty() {
            req = req.query(query);
        }
        if let Some(payload) = body {
            req = req.json(payload);
        }
        req
    }

    /// Sends an authenticated GET request and parses the envelope.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<ApiResponse<T>> {
        self.send::<T, ()>(Method::GET, path, query, None).await
    }

    /// Sends an authenticated POST request with a JSON body and parses the
    /// envelope.
    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        body: &B,
    ) -> Result<ApiResponse<T>> {
        self.send(Method::POST, path, query, Some(body)).await
    }

    /// Sends an authenticated DELETE request and parses the envelope.
    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<ApiResponse<T>> {
        self.send::<T, ()>(Method::DELETE, path, query, None).await
    }
}
