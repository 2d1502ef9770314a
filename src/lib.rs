//! Async Rust client library and CLI toolkit for administering a
//! CrowdStrike Falcon tenant.
//!
//! Provides OAuth2 authentication, an authenticated HTTP client with 401
//! retry, pagination/batching helpers, and typed wrappers for the vendor
//! operations behind three admin tools: `retag` (move safe devices into a
//! tagging group), `runscript` (execute a cloud script on a device list via
//! real-time-response sessions), and `setprofile` (bulk-assign permission
//! roles from a CSV).
//!
//! # Modules
//!
//! - [`auth`] — OAuth2 client-credentials token provider with expiry tracking.
//! - [`client`] — Authenticated HTTP wrapper and the Falcon response envelope.
//! - [`config`] — Static TOML configuration (credentials, tag namespace, profiles).
//! - [`detects`] — Detection query and summary lookup.
//! - [`error`] — Typed error hierarchy (`FalconError`).
//! - [`host_groups`] — Host-group query and details.
//! - [`hosts`] — Device query, details, and tag updates.
//! - [`logging`] — Per-tool log-file setup for the binaries.
//! - [`paging`] — Paginated query runner and batched detail fetcher.
//! - [`retag`] — Date windows, tag generation, and safe/unsafe classification.
//! - [`rtr`] — Real-time-response sessions, command execution, and polling.
//! - [`users`] — User UUID and permission-role operations.
//!
//! # Quick Start
//!
//! ```ignore
//! use falcon_admin::auth::TokenProvider;
//! use falcon_admin::client::FalconClient;
//! use falcon_admin::hosts;
//!
//! let tp = TokenProvider::new("https://api.crowdstrike.com", "client_id", "secret");
//! let client = FalconClient::new(tp);
//! let ids = hosts::query_devices_by_filter(&client, Some("first_seen:>='2026-08-23'"), None).await?;
//! let devices = hosts::get_device_details(&client, &ids).await?;
//! ```

#![warn(missing_docs)]

pub mod auth;
pub mod client;
pub mod config;
pub mod detects;
pub mod error;
pub mod host_groups;
pub mod hosts;
pub mod logging;
pub mod paging;
pub mod retag;
pub mod rtr;
pub mod users;
