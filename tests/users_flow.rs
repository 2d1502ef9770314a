//! Integration tests for the user and role endpoints using wiremock.
//!
//! Exercises the full revoke-then-grant sequence the setprofile tool
//! performs, plus the individual lookups.

use falcon_admin::auth::TokenProvider;
use falcon_admin::client::FalconClient;
use falcon_admin::users::*;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mock_client(server: &MockServer) -> FalconClient {
    let tp = TokenProvider::with_token("mock-token");
    FalconClient::with_base_url(tp, &server.uri())
}

fn resources_body(resources: serde_json::Value) -> serde_json::Value {
    serde_json::json!({"meta": {}, "resources": resources, "errors": []})
}

#[tokio::test]
async fn username_resolves_to_uuid() {
    let server = MockServer::start().await;
    let client = mock_client(&server).await;

    Mock::given(method("GET"))
        .and(path("/users/queries/user-uuids-by-email/v1"))
        .and(query_param("uid", "jo@example.com"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(resources_body(serde_json::json!(["uuid-1234"]))),
        )
        .mount(&server)
        .await;

    let uuids = retrieve_user_uuid(&client, "jo@example.com").await.unwrap();
    assert_eq!(uuids, vec!["uuid-1234"]);
}

#[tokio::test]
async fn unknown_username_yields_empty_list() {
    let server = MockServer::start().await;
    let client = mock_client(&server).await;

    Mock::given(method("GET"))
        .and(path("/users/queries/user-uuids-by-email/v1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(resources_body(serde_json::json!([]))),
        )
        .mount(&server)
        .await;

    let uuids = retrieve_user_uuid(&client, "ghost@example.com")
        .await
        .unwrap();
    assert!(uuids.is_empty(), "caller decides what an empty match means");
}

#[tokio::test]
async fn current_roles_are_listed_by_uuid() {
    let server = MockServer::start().await;
    let client = mock_client(&server).await;

    Mock::given(method("GET"))
        .and(path("/user-roles/queries/user-role-ids-by-user-uuid/v1"))
        .and(query_param("user_uuid", "uuid-1234"))
        .respond_with(ResponseTemplate::new(200).set_body_json(resources_body(
            serde_json::json!(["detections_read", "rtr_read"]),
        )))
        .mount(&server)
        .await;

    let roles = get_user_role_ids(&client, "uuid-1234").await.unwrap();
    assert_eq!(roles, vec!["detections_read", "rtr_read"]);
}

#[tokio::test]
async fn grant_posts_camel_case_role_ids_for_user() {
    let server = MockServer::start().await;
    let client = mock_client(&server).await;

    Mock::given(method("POST"))
        .and(path("/user-roles/entities/user-roles/v1"))
        .and(query_param("user_uuid", "uuid-1234"))
        .and(body_json(serde_json::json!({
            "roleIds": ["detections_read", "rtr_admin"]
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(resources_body(serde_json::json!([]))),
        )
        .expect(1)
        .mount(&server)
        .await;

    let roles = vec!["detections_read".to_string(), "rtr_admin".to_string()];
    grant_user_role_ids(&client, "uuid-1234", &roles)
        .await
        .unwrap();

    server.verify().await;
}

#[tokio::test]
async fn revoke_deletes_each_role_id_as_query_param() {
    let server = MockServer::start().await;
    let client = mock_client(&server).await;

    Mock::given(method("DELETE"))
        .and(path("/user-roles/entities/user-roles/v1"))
        .and(query_param("user_uuid", "uuid-1234"))
        .and(query_param("ids", "detections_read"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(resources_body(serde_json::json!([]))),
        )
        .expect(1)
        .mount(&server)
        .await;

    let roles = vec!["detections_read".to_string()];
    revoke_user_role_ids(&client, "uuid-1234", &roles)
        .await
        .unwrap();

    server.verify().await;
}

#[tokio::test]
async fn revoke_of_missing_role_propagates_api_error() {
    let server = MockServer::start().await;
    let client = mock_client(&server).await;

    Mock::given(method("DELETE"))
        .and(path("/user-roles/entities/user-roles/v1"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "errors": [{"code": 404, "message": "role not assigned"}]
        })))
        .mount(&server)
        .await;

    let roles = vec!["never_had_it".to_string()];
    let err = revoke_user_role_ids(&client, "uuid-1234", &roles)
        .await
        .unwrap_err()
        .to_string();
    assert!(err.contains("role not assigned"));
}
