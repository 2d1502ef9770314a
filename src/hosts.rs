//! Device lookup and tag management for the Falcon API.
//!
//! This module covers the hosts endpoint family:
//!
//! - [`query_devices_by_filter`] — paginated device-ID query with an
//!   optional FQL filter and sort expression.
//! - [`get_device_details`] — batched detail lookup for a list of device IDs.
//! - [`update_device_tags`] — add or remove grouping tags on a set of
//!   devices in one call.
//!
//! The response type [`Device`] captures the device properties these tools
//! consume. Fields use `Option` or default where the API may omit them
//! depending on sensor state or platform; unknown fields are ignored so new
//! API fields never break deserialization.

use serde::{Deserialize, Serialize};

use crate::client::FalconClient;
use crate::error::Result;
use crate::paging::{fetch_in_batches, query_ids, BATCH_SIZE};

// ── Response types ─────────────────────────────────────────────────────

/// A device (host) as returned by the Falcon API.
///
/// Field names use snake_case to match the API contract exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    /// Unique Falcon identifier for this device.
    pub device_id: String,

    /// Hostname reported by the sensor.
    #[serde(default)]
    pub hostname: Option<String>,

    /// ISO 8601 timestamp of when the sensor first checked in.
    #[serde(default)]
    pub first_seen: Option<String>,

    /// ISO 8601 timestamp of the most recent sensor check-in.
    #[serde(default)]
    pub last_seen: Option<String>,

    /// Operating system version string (e.g. `"Windows 11"`).
    #[serde(default)]
    pub os_version: Option<String>,

    /// Host-group IDs this device belongs to.
    #[serde(default)]
    pub groups: Vec<String>,

    /// Grouping tags currently assigned to this device.
    #[serde(default)]
    pub tags: Vec<String>,
}

// ── Request types ──────────────────────────────────────────────────────

/// Tag-update direction for [`update_device_tags`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TagAction {
    /// Attach the given tags to the devices.
    Add,
    /// Detach the given tags from the devices.
    Remove,
}

/// Request body for the detail-lookup endpoints that take an ID list.
#[derive(Debug, Serialize)]
struct IdsBody {
    ids: Vec<String>,
}

/// Request body for the tag-update endpoint.
#[derive(Debug, Serialize)]
struct UpdateTagsBody<'a> {
    action: TagAction,
    device_ids: &'a [String],
    tags: &'a [String],
}

/// Per-device result entry returned by the tag-update endpoint.
#[derive(Debug, Deserialize)]
pub struct TagUpdateResult {
    /// The device this entry refers to.
    #[serde(default)]
    pub device_id: Option<String>,
    /// Whether the tag set on this device actually changed.
    #[serde(default)]
    pub updated: bool,
}

// ── Endpoint functions ─────────────────────────────────────────────────

/// Queries device IDs matching an optional FQL filter, following
/// pagination to completion.
///
/// # Examples of filter expressions
///
/// - `"first_seen:>='2026-08-01'"` — devices first seen after a date.
/// - `"hostname:'WS-*'"` — hostname prefix match.
///
/// # Errors
///
/// - `FalconError::Api` — non-2xx status (e.g. 400 for a malformed filter).
/// - `FalconError::Auth` — token acquisition or refresh failed.
/// - `FalconError::Network` — transport-level failure.
pub async fn query_devices_by_filter(
    client: &FalconClient,
    filter: Option<&str>,
    sort: Option<&str>,
) -> Result<Vec<String>> {
    query_ids(client, "/devices/queries/devices/v1", filter, sort).await
}

/// Fetches full device details for a list of device IDs, batching the
/// lookups in chunks of at most 100 IDs per call. Results preserve the
/// input chunk order.
pub async fn get_device_details(client: &FalconClient, ids: &[String]) -> Result<Vec<Device>> {
    fetch_in_batches(ids, BATCH_SIZE, |chunk| async move {
        let resp = client
            .post::<_, Device>("/devices/entities/devices/v2", &[], &IdsBody { ids: chunk })
            .await?;
        Ok(resp.resources)
    })
    .await
}

/// Adds or removes grouping tags on a set of devices in one batched call.
///
/// Fire-and-forget from the caller's perspective: the platform's resulting
/// state is the source of truth. The per-device results are returned for
/// logging.
pub async fn update_device_tags(
    client: &FalconClient,
    action: TagAction,
    device_ids: &[String],
    tags: &[String],
) -> Result<Vec<TagUpdateResult>> {
    let body = UpdateTagsBody {
        action,
        device_ids,
        tags,
    };
    let resp = client
        .post::<_, TagUpdateResult>("/devices/entities/devices/tags/v1", &[], &body)
        .await?;
    Ok(resp.resources)
}
