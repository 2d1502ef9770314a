//! Detection query and summary lookup for the Falcon API.
//!
//! - [`query_detects`] — paginated detection-ID query with an optional FQL
//!   filter (typically on `last_behavior`).
//! - [`get_detect_summaries`] — batched summary lookup for a list of
//!   detection IDs.
//!
//! The retagging workflow only needs to know *which device* each detection
//! fired on, so [`DetectionSummary`] models the device association and the
//! last-behavior timestamp and ignores the rest of the (large) summary
//! payload.

use serde::{Deserialize, Serialize};

use crate::client::FalconClient;
use crate::error::Result;
use crate::paging::{fetch_in_batches, query_ids, BATCH_SIZE};

/// The device a detection fired on. Nested under `device` in the summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionDevice {
    /// Falcon device identifier, matching `Device::device_id`.
    pub device_id: String,
}

/// A detection summary as returned by the Falcon API, reduced to the
/// fields the admin tools consume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionSummary {
    /// Composite detection identifier.
    #[serde(default)]
    pub detection_id: Option<String>,

    /// The device this detection is associated with. Optional because a
    /// summary for a since-deleted host can omit the block; such entries
    /// simply never match any device during classification.
    #[serde(default)]
    pub device: Option<DetectionDevice>,

    /// ISO 8601 timestamp of the most recent behavior in this detection.
    #[serde(default)]
    pub last_behavior: Option<String>,

    /// Highest severity across the detection's behaviors.
    #[serde(default)]
    pub max_severity_displayname: Option<String>,
}

/// Request body for the summary-lookup endpoint.
#[derive(Debug, Serialize)]
struct IdsBody {
    ids: Vec<String>,
}

/// Queries detection IDs matching an optional FQL filter, following
/// pagination to completion.
pub async fn query_detects(
    client: &FalconClient,
    filter: Option<&str>,
    sort: Option<&str>,
) -> Result<Vec<String>> {
    query_ids(client, "/detects/queries/detects/v1", filter, sort).await
}

/// Fetches detection summaries for a list of detection IDs, batching the
/// lookups in chunks of at most 100 IDs per call.
pub async fn get_detect_summaries(
    client: &FalconClient,
    ids: &[String],
) -> Result<Vec<DetectionSummary>> {
    fetch_in_batches(ids, BATCH_SIZE, |chunk| async move {
        let resp = client
            .post::<_, DetectionSummary>(
                "/detects/entities/summaries/GET/v1",
                &[],
                &IdsBody { ids: chunk },
            )
            .await?;
        Ok(resp.resources)
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_deserializes_with_device_association() {
        let json = r#"{
            "detection_id": "ldt:a1b2c3:12345",
            "device": {"device_id": "a1b2c3d4e5f6"},
            "last_behavior": "2026-08-27T12:00:00Z",
            "max_severity_displayname": "High"
        }"#;
        let summary: DetectionSummary = serde_json::from_str(json).unwrap();
        assert_eq!(summary.detection_id.as_deref(), Some("ldt:a1b2c3:12345"));
        assert_eq!(summary.device.unwrap().device_id, "a1b2c3d4e5f6");
        assert_eq!(
            summary.max_severity_displayname.as_deref(),
            Some("High")
        );
    }

    #[test]
    fn summary_tolerates_missing_device_block() {
        let json = r#"{"detection_id": "ldt:deadbeef:1"}"#;
        let summary: DetectionSummary = serde_json::from_str(json).unwrap();
        assert!(summary.device.is_none());
    }

    #[test]
    fn summary_ignores_unmodeled_fields() {
        // The full summary payload carries behaviors, hostinfo, quarantined
        // files and more; none of it should break deserialization.
        let json = r#"{
            "detection_id": "ldt:a1:2",
            "device": {"device_id": "a1", "platform_name": "Windows"},
            "behaviors": [{"tactic": "Execution"}],
            "status": "new"
        }"#;
        let summary: DetectionSummary = serde_json::from_str(json).unwrap();
        assert_eq!(summary.device.unwrap().device_id, "a1");
    }
}
