//! Host-group query and detail lookup for the Falcon API.
//!
//! Host groups are opaque to these tools: the retagging workflow only uses
//! them to resolve a group name passed on the command line, so the model
//! carries identity and membership criteria and nothing else.

use serde::{Deserialize, Serialize};

use crate::client::FalconClient;
use crate::error::Result;
use crate::paging::{fetch_in_batches, query_ids, BATCH_SIZE};

/// A host group as returned by the Falcon API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostGroup {
    /// Unique Falcon identifier for this group.
    pub id: String,

    /// Display name shown in the console.
    #[serde(default)]
    pub name: Option<String>,

    /// `"static"` or `"dynamic"`.
    #[serde(default)]
    pub group_type: Option<String>,

    /// Membership criteria for dynamic groups. Opaque to this system.
    #[serde(default)]
    pub assignment_rule: Option<String>,
}

/// Queries host-group IDs matching an optional FQL filter, following
/// pagination to completion.
pub async fn query_host_groups(
    client: &FalconClient,
    filter: Option<&str>,
    sort: Option<&str>,
) -> Result<Vec<String>> {
    query_ids(client, "/devices/queries/host-groups/v1", filter, sort).await
}

/// Fetches host-group details for a list of group IDs, batching the
/// lookups in chunks of at most 100 IDs per call. This endpoint takes its
/// IDs as repeated query parameters rather than a JSON body.
pub async fn get_host_groups(client: &FalconClient, ids: &[String]) -> Result<Vec<HostGroup>> {
    fetch_in_batches(ids, BATCH_SIZE, |chunk| async move {
        let query: Vec<(&str, String)> = chunk.into_iter().map(|id| ("ids", id)).collect();
        let resp = client
            .get::<HostGroup>("/devices/entities/host-groups/v1", &query)
            .await?;
        Ok(resp.resources)
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_group_deserializes_full_response() {
        let json = r#"{
            "id": "0bd018b7bd8c4f5fb556f6e9d0ebef17",
            "name": "Workstations EU",
            "group_type": "dynamic",
            "assignment_rule": "hostname:'EU-*'"
        }"#;
        let group: HostGroup = serde_json::from_str(json).unwrap();
        assert_eq!(group.id, "0bd018b7bd8c4f5fb556f6e9d0ebef17");
        assert_eq!(group.name.as_deref(), Some("Workstations EU"));
        assert_eq!(group.group_type.as_deref(), Some("dynamic"));
        assert_eq!(group.assignment_rule.as_deref(), Some("hostname:'EU-*'"));
    }

    #[test]
    fn host_group_deserializes_minimal_response() {
        let json = r#"{"id": "group-sparse"}"#;
        let group: HostGroup = serde_json::from_str(json).unwrap();
        assert_eq!(group.id, "group-sparse");
        assert!(group.name.is_none());
        assert!(group.assignment_rule.is_none());
    }
}
