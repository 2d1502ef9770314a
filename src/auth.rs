//! OAuth2 client-credentials authentication for the Falcon platform.
//!
//! Acquires bearer tokens from the `/oauth2/token` endpoint using the two
//! API credential values from the static configuration. The token is cached
//! in `TokenProvider` and can be refreshed on demand. Consumers (i.e.
//! `FalconClient`) read the cached token via `token()` and call
//! `refresh_token()` when it is absent or stale.

use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::{FalconError, Result};

/// Form body sent to the token endpoint.
/// Serialized as `application/x-www-form-urlencoded` by reqwest's `.form()`.
#[derive(Serialize)]
pub struct TokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
}

/// Subset of the token response that we need. The endpoint returns
/// additional fields which serde silently ignores because the struct is not
/// marked `deny_unknown_fields`.
#[derive(Deserialize)]
pub struct TokenResponse {
    /// The bearer token to attach to API requests.
    pub access_token: String,
    /// Always `"bearer"` for this endpoint.
    pub token_type: String,
    /// Token lifetime in seconds from acquisition.
    pub expires_in: u64,
}

/// Safety buffer subtracted from `expires_in` to trigger refresh before the
/// token actually expires. Prevents requests from racing the expiry boundary.
const EXPIRY_BUFFER_SECS: u64 = 60;

/// Manages OAuth2 token acquisition and caching.
///
/// Invariants:
/// - `response` is `None` until the first successful `refresh_token()` call.
/// - After a successful refresh, `token()` returns `Some` until the token
///   expires (with a 60-second safety buffer) or is replaced by a
///   subsequent refresh.
/// - `acquired_at` is always `Some` when `response` is `Some`.
pub struct TokenProvider {
    client: reqwest::Client,
    base_url: String,
    client_id: String,
    client_secret: String,
    response: Option<TokenResponse>,
    acquired_at: Option<Instant>,
}

impl TokenProvider {
    /// Creates a provider for the given API base URL and credential pair.
    /// No token is acquired until the first `refresh_token()` call.
    pub fn new(base_url: &str, client_id: &str, client_secret: &str) -> Self {
        TokenProvider {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            response: None,
            acquired_at: None,
        }
    }

    /// Creates a `TokenProvider` with a pre-set token, bypassing the token
    /// endpoint. Used by tests to avoid real HTTP calls during token
    /// acquisition. The token is treated as freshly acquired (expires_in = 1800s).
    pub fn with_token(token: &str) -> Self {
        TokenProvider {
            client: reqwest::Client::new(),
            base_url: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            response: Some(TokenResponse {
                access_token: token.to_string(),
                token_type: "bearer".to_string(),
                expires_in: 1800,
            }),
            acquired_at: Some(Instant::now()),
        }
    }

    /// Fetches a new token and caches it.
    ///
    /// The response body is read as text first so that on failure the
    /// endpoint's raw error message is preserved in the error —
    /// `error_for_status()` would discard this diagnostic information.
    pub async fn refresh_token(&mut self) -> Result<()> {
        let body = TokenRequest {
            client_id: &self.client_id,
            client_secret: &self.client_secret,
        };

        let url = format!("{}/oauth2/token", self.base_url);

        let response = self.client.post(&url).form(&body).send().await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(FalconError::Auth {
                message: format!("token request failed ({status}): {body}"),
                source: None,
            });
        }

        let resp: TokenResponse =
            serde_json::from_str(&body).map_err(|e| FalconError::Auth {
                message: "failed to parse token response".to_string(),
                source: Some(Box::new(e)),
            })?;
        self.acquired_at = Some(Instant::now());
        self.response = Some(resp);

        Ok(())
    }

    /// Returns `true` if a token exists but has exceeded its lifetime
    /// (minus the safety buffer). Returns `false` if no token is cached.
    fn is_expired(&self) -> bool {
        match (&self.response, self.acquired_at) {
            (Some(resp), Some(acquired)) => {
                let lifetime = resp.expires_in.saturating_sub(EXPIRY_BUFFER_SECS);
                acquired.elapsed().as_secs() >= lifetime
            }
            _ => false,
        }
    }

    /// Returns the cached access token, or `None` if no token exists or the
    /// token has expired (with the safety buffer applied).
    pub fn token(&self) -> Option<&str> {
        if self.is_expired() {
            return None;
        }
        self.response.as_ref().map(|ret| ret.access_token.as_str())
    }

    /// Drops the cached token so the next `token()` call returns `None`.
    /// Used by the client's 401 retry path.
    pub fn invalidate(&mut self) {
        self.response = None;
        self.acquired_at = None;
    }
}
