//! User account and permission-role management for the Falcon API.
//!
//! This module covers the operations the role-profile tool needs:
//!
//! - [`retrieve_user_uuid`] — resolve a username (email) to its UUID.
//! - [`get_user_role_ids`] — list the role IDs a user currently holds.
//! - [`grant_user_role_ids`] / [`revoke_user_role_ids`] — assign or remove
//!   a set of roles in one call each.
//!
//! Grants and revokes are fire-and-forget: the platform's resulting state
//! is the source of truth, and callers re-fetch the role list afterwards to
//! display it.

use serde::Serialize;

use crate::client::FalconClient;
use crate::error::Result;

/// Request body for the role-grant endpoint. The API expects camelCase
/// `roleIds` here, unlike the snake_case used elsewhere.
#[derive(Debug, Serialize)]
struct GrantRolesBody<'a> {
    #[serde(rename = "roleIds")]
    role_ids: &'a [String],
}

/// Resolves a username to its account UUIDs.
///
/// Returns the raw resource list; a username that matches nothing yields an
/// empty list, which callers must treat as "user not found".
pub async fn retrieve_user_uuid(client: &FalconClient, username: &str) -> Result<Vec<String>> {
    let query = [("uid", username.to_string())];
    let resp = client
        .get::<String>("/users/queries/user-uuids-by-email/v1", &query)
        .await?;
    Ok(resp.resources)
}

/// Lists the permission-role IDs currently held by a user.
pub async fn get_user_role_ids(client: &FalconClient, user_uuid: &str) -> Result<Vec<String>> {
    let query = [("user_uuid", user_uuid.to_string())];
    let resp = client
        .get::<String>("/user-roles/queries/user-role-ids-by-user-uuid/v1", &query)
        .await?;
    Ok(resp.resources)
}

/// Grants a set of permission roles to a user in one call.
pub async fn grant_user_role_ids(
    client: &FalconClient,
    user_uuid: &str,
    role_ids: &[String],
) -> Result<()> {
    let query = [("user_uuid", user_uuid.to_string())];
    client
        .post::<_, serde_json::Value>(
            "/user-roles/entities/user-roles/v1",
            &query,
            &GrantRolesBody { role_ids },
        )
        .await?;
    Ok(())
}

/// Revokes a set of permission roles from a user in one call. The role IDs
/// are passed as repeated `ids` query parameters.
pub async fn revoke_user_role_ids(
    client: &FalconClient,
    user_uuid: &str,
    role_ids: &[String],
) -> Result<()> {
    let mut query: Vec<(&str, String)> = vec![("user_uuid", user_uuid.to_string())];
    query.extend(role_ids.iter().map(|id| ("ids", id.clone())));
    client
        .delete::<serde_json::Value>("/user-roles/entities/user-roles/v1", &query)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grant_body_serializes_camel_case_role_ids() {
        let roles = vec!["security_lead".to_string(), "rtr_admin".to_string()];
        let body = GrantRolesBody { role_ids: &roles };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json["roleIds"],
            serde_json::json!(["security_lead", "rtr_admin"])
        );
        assert!(
            json.get("role_ids").is_none(),
            "snake_case key must not appear in the grant body"
        );
    }
}
