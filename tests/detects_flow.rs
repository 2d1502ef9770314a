//! Integration tests for the detections endpoint family using wiremock.
//!
//! - GET  /detects/queries/detects/v1         — query_detects
//! - POST /detects/entities/summaries/GET/v1  — get_detect_summaries

use falcon_admin::auth::TokenProvider;
use falcon_admin::client::FalconClient;
use falcon_admin::detects::*;
use falcon_admin::host_groups;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mock_client(server: &MockServer) -> FalconClient {
    let tp = TokenProvider::with_token("mock-token");
    FalconClient::with_base_url(tp, &server.uri())
}

#[tokio::test]
async fn query_detects_passes_last_behavior_filter() {
    let server = MockServer::start().await;
    let client = mock_client(&server).await;

    Mock::given(method("GET"))
        .and(path("/detects/queries/detects/v1"))
        .and(query_param("filter", "last_behavior:>='2026-08-23'"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "meta": {"pagination": {"offset": 1, "limit": 100, "total": 1}},
            "resources": ["ldt:a1b2:100"],
            "errors": []
        })))
        .mount(&server)
        .await;

    let ids = query_detects(&client, Some("last_behavior:>='2026-08-23'"), None)
        .await
        .unwrap();
    assert_eq!(ids, vec!["ldt:a1b2:100"]);
}

#[tokio::test]
async fn detect_summaries_expose_device_association() {
    let server = MockServer::start().await;
    let client = mock_client(&server).await;
    let ids = vec!["ldt:a1b2:100".to_string(), "ldt:c3d4:200".to_string()];

    Mock::given(method("POST"))
        .and(path("/detects/entities/summaries/GET/v1"))
        .and(body_json(serde_json::json!({
            "ids": ["ldt:a1b2:100", "ldt:c3d4:200"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "meta": {},
            "resources": [
                {
                    "detection_id": "ldt:a1b2:100",
                    "device": {"device_id": "a1b2"},
                    "last_behavior": "2026-08-27T12:00:00Z",
                    "max_severity_displayname": "High",
                    "behaviors": [{"tactic": "Execution"}]
                },
                {
                    "detection_id": "ldt:c3d4:200",
                    "device": {"device_id": "c3d4"}
                }
            ],
            "errors": []
        })))
        .mount(&server)
        .await;

    let summaries = get_detect_summaries(&client, &ids).await.unwrap();
    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].device.as_ref().unwrap().device_id, "a1b2");
    assert_eq!(
        summaries[0].max_severity_displayname.as_deref(),
        Some("High")
    );
    assert_eq!(summaries[1].device.as_ref().unwrap().device_id, "c3d4");
}

#[tokio::test]
async fn host_groups_query_and_details_round_trip() {
    let server = MockServer::start().await;
    let client = mock_client(&server).await;

    Mock::given(method("GET"))
        .and(path("/devices/queries/host-groups/v1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "meta": {"pagination": {"offset": 1, "limit": 100, "total": 1}},
            "resources": ["grp-1"],
            "errors": []
        })))
        .mount(&server)
        .await;

    // The details endpoint takes repeated ids query parameters.
    Mock::given(method("GET"))
        .and(path("/devices/entities/host-groups/v1"))
        .and(query_param("ids", "grp-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "meta": {},
            "resources": [
                {"id": "grp-1", "name": "Workstations EU", "group_type": "dynamic"}
            ],
            "errors": []
        })))
        .mount(&server)
        .await;

    let ids = host_groups::query_host_groups(&client, None, None)
        .await
        .unwrap();
    assert_eq!(ids, vec!["grp-1"]);

    let groups = host_groups::get_host_groups(&client, &ids).await.unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].name.as_deref(), Some("Workstations EU"));
}
