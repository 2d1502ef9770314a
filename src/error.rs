//! Typed error hierarchy for the falcon-admin crate.
//!
//! `FalconError` is a structured enum that preserves diagnostic context at
//! each failure boundary. Every variant carries enough information for
//! callers to:
//! - Distinguish the failure category (auth, API, config, parse, network).
//! - Inspect the original cause via `source()` (thiserror derives this
//!   automatically from `#[source]` fields).
//! - Display a human-readable message that includes the relevant context.
//!
//! Variants map to real system boundaries: `Auth` covers the Falcon OAuth2
//! token endpoint; `Api` covers the Falcon REST API (a non-2xx response
//! carrying the joined message/code pairs from the response's error list);
//! `Config` covers the static TOML configuration; `Network` wraps
//! `reqwest::Error` for transport-level failures that never produced an
//! HTTP status code.

use reqwest::StatusCode;

/// Unified error type for all falcon-admin library operations.
#[derive(Debug, thiserror::Error)]
pub enum FalconError {
    /// Authentication failure at the Falcon OAuth2 token endpoint.
    ///
    /// Covers non-2xx responses from `/oauth2/token` (invalid or expired
    /// API credentials), network failures reaching the token endpoint, and
    /// a missing token after a refresh attempt.
    #[error("authentication failed: {message}")]
    Auth {
        /// Human-readable description, including the HTTP status and the
        /// token endpoint's error body when available.
        message: String,
        /// The underlying transport or parse error, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The Falcon API returned a status code outside [200, 299].
    ///
    /// `message` is the newline-joined concatenation of every
    /// `"{message} ({code})"` pair found in the response's error list, so
    /// the vendor's diagnostics survive into logs and terminal output.
    #[error("API error {status}: {message}")]
    Api {
        /// The HTTP status code returned by the Falcon API.
        status: StatusCode,
        /// Joined error-list entries, or the raw body if the error list
        /// could not be parsed.
        message: String,
    },

    /// The static configuration file could not be read or parsed, or is
    /// missing a value the requested operation needs (e.g. an unknown
    /// profile name).
    #[error("configuration error: {0}")]
    Config(String),

    /// JSON deserialization failed when parsing an API response body.
    #[error("failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),

    /// A network-level failure (DNS, TCP, TLS, request timeout). No HTTP
    /// status code is available because the request did not complete.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Convenience alias used throughout the library.
pub type Result<T> = std::result::Result<T, FalconError>;
