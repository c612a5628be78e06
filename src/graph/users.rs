//! User endpoints: listing, the user table, updates, creation and managers.

use reqwest::Method;
use serde_json::{Map, Value};
use tracing::info;

use super::client::GraphClient;
use super::models::{create_user_body, ManagerReference, USER_TABLE_EXPAND, USER_TABLE_SELECT};
use crate::auth::BearerToken;
use crate::error::ApiError;
use crate::table::Table;
use crate::util::gen_password;

impl GraphClient {
    /// Fetch every user with the directory fields used for reconciliation,
    /// including the manager's `id` and `employeeId`.
    pub async fn get_user_table(&self, token: &BearerToken) -> Result<Table, ApiError> {
        let query = format!("$select={}&$expand={}", USER_TABLE_SELECT, USER_TABLE_EXPAND);
        let url = self.endpoint_with_query(&["users"], &query)?;

        let table = Table::from_records(self.get_all_pages(url, token).await?);

        info!(
            "User table has {} rows and {} columns",
            table.len(),
            table.columns().len()
        );
        Ok(table)
    }

    /// List users, optionally narrowed by an OData query such as
    /// `$filter=department eq 'Finance'`.
    pub async fn get_users(
        &self,
        token: &BearerToken,
        odata_query: Option<&str>,
    ) -> Result<Vec<Value>, ApiError> {
        let url = self.endpoint_with_query(&["users"], odata_query.unwrap_or_default())?;
        self.get_all_pages(url, token).await
    }

    /// Update user properties. `properties` is sent verbatim as the PATCH body.
    ///
    /// Valid properties: <https://learn.microsoft.com/en-us/graph/api/user-update>
    pub async fn patch_user(
        &self,
        token: &BearerToken,
        user_principal_name: &str,
        properties: &Map<String, Value>,
    ) -> Result<(), ApiError> {
        let url = self.endpoint(&["users", user_principal_name])?;

        self.send_json(Method::PATCH, url, token, properties).await?;

        info!("Updated {} ({} properties)", user_principal_name, properties.len());
        Ok(())
    }

    /// Create a user with sensible defaults and a generated initial password.
    ///
    /// Returns the created user as echoed back by Graph.
    pub async fn create_user(
        &self,
        token: &BearerToken,
        user_principal_name: &str,
        properties: Map<String, Value>,
    ) -> Result<Option<Value>, ApiError> {
        let url = self.endpoint(&["users"])?;
        let body = create_user_body(user_principal_name, properties, gen_password());

        let created = self.send_json(Method::POST, url, token, &body).await?;

        info!("Created user {}", user_principal_name);
        Ok(created)
    }

    /// Point a user's manager reference at another directory user.
    pub async fn set_manager(
        &self,
        token: &BearerToken,
        user_principal_name: &str,
        manager_id: &str,
    ) -> Result<(), ApiError> {
        let url = self.endpoint(&["users", user_principal_name, "manager", "$ref"])?;
        let body = ManagerReference {
            odata_id: self.endpoint(&["users", manager_id])?.to_string(),
        };

        self.send_json(Method::PUT, url, token, &body).await?;

        info!("Set manager of {} to {}", user_principal_name, manager_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use crate::table::get_ms_id_dict;
    use chrono::{Duration, Utc};
    use serde_json::json;
    use wiremock::{
        matchers::{body_json, body_partial_json, header, method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    fn token() -> BearerToken {
        BearerToken::new("test-token", Utc::now() + Duration::hours(1))
    }

    async fn client_for(server: &MockServer) -> GraphClient {
        GraphClient::new(&test_config(&server.uri())).unwrap()
    }

    #[tokio::test]
    async fn test_get_user_table_request_and_pagination() {
        let server = MockServer::start().await;
        let next = format!("{}/v1.0/users?$skiptoken=page2", server.uri());

        Mock::given(method("GET"))
            .and(path("/v1.0/users"))
            .and(query_param("$select", USER_TABLE_SELECT))
            .and(query_param("$expand", USER_TABLE_EXPAND))
            .and(header("authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": [{
                    "userPrincipalName": "ada@contoso.com",
                    "id": "id-ada",
                    "employeeId": "1001",
                    "manager": {"id": "id-grace", "employeeId": "1000"}
                }],
                "@odata.nextLink": next
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v1.0/users"))
            .and(query_param("$skiptoken", "page2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": [{
                    "userPrincipalName": "grace@contoso.com",
                    "id": "id-grace",
                    "employeeId": "1000",
                    "manager": null
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let table = client.get_user_table(&token()).await.unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.get(0, "manager.id"), Some(&json!("id-grace")));

        let ids = get_ms_id_dict(&table).unwrap();
        assert_eq!(ids["1000"], "id-grace");
        assert_eq!(ids["1001"], "id-ada");
    }

    #[tokio::test]
    async fn test_get_users_with_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1.0/users"))
            .and(query_param("$filter", "department eq 'Finance'"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": [{"id": "id-1"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let users = client
            .get_users(&token(), Some("?$filter=department eq 'Finance'"))
            .await
            .unwrap();

        assert_eq!(users, vec![json!({"id": "id-1"})]);
    }

    #[tokio::test]
    async fn test_patch_user_sends_properties_verbatim() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/v1.0/users/ada@contoso.com"))
            .and(header("authorization", "Bearer test-token"))
            .and(body_json(json!({"jobTitle": "Analyst", "officeLocation": "Oslo"})))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let mut properties = Map::new();
        properties.insert("jobTitle".into(), json!("Analyst"));
        properties.insert("officeLocation".into(), json!("Oslo"));

        let client = client_for(&server).await;
        client
            .patch_user(&token(), "ada@contoso.com", &properties)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_patch_user_bad_request_surfaces_message() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/v1.0/users/ada@contoso.com"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {
                    "code": "Request_BadRequest",
                    "message": "Property 'nope' does not exist."
                }
            })))
            .mount(&server)
            .await;

        let mut properties = Map::new();
        properties.insert("nope".into(), json!(1));

        let client = client_for(&server).await;
        let result = client.patch_user(&token(), "ada@contoso.com", &properties).await;

        match result {
            Err(ApiError::BadRequest(msg)) => assert_eq!(msg, "Property 'nope' does not exist."),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_user_defaults() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1.0/users"))
            .and(body_partial_json(json!({
                "accountEnabled": true,
                "userPrincipalName": "new.hire@contoso.com",
                "mailNickname": "new.hire",
                "displayName": "New Hire",
                "passwordProfile": {"forceChangePasswordNextSignIn": true}
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": "id-new",
                "userPrincipalName": "new.hire@contoso.com"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut properties = Map::new();
        properties.insert("displayName".into(), json!("New Hire"));

        let client = client_for(&server).await;
        let created = client
            .create_user(&token(), "new.hire@contoso.com", properties)
            .await
            .unwrap();

        assert_eq!(created.unwrap()["id"], "id-new");
    }

    #[tokio::test]
    async fn test_set_manager_request_shape() {
        let server = MockServer::start().await;
        let manager_ref = format!("{}/v1.0/users/id-grace", server.uri());

        Mock::given(method("PUT"))
            .and(path("/v1.0/users/ada@contoso.com/manager/$ref"))
            .and(header("authorization", "Bearer test-token"))
            .and(body_json(json!({"@odata.id": manager_ref})))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        client
            .set_manager(&token(), "ada@contoso.com", "id-grace")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_set_manager_unknown_user() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let result = client.set_manager(&token(), "ghost@contoso.com", "id-x").await;

        assert!(matches!(result, Err(ApiError::NotFound)));
    }
}
