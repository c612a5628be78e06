//! License endpoints: assignment and subscribed SKUs.

use std::collections::BTreeMap;

use reqwest::Method;
use serde_json::Value;
use tracing::{info, warn};

use super::client::GraphClient;
use super::models::{AssignLicenseBody, SubscribedSku};
use crate::auth::BearerToken;
use crate::error::{ApiError, TableError};
use crate::table::Table;

impl GraphClient {
    /// Assign one license SKU to a user without removing any.
    ///
    /// Returns the updated user as echoed back by Graph.
    pub async fn assign_license(
        &self,
        token: &BearerToken,
        user_principal_name: &str,
        license_sku_id: &str,
    ) -> Result<Option<Value>, ApiError> {
        let url = self.endpoint(&["users", user_principal_name, "assignLicense"])?;
        let body = AssignLicenseBody::add(license_sku_id);

        let updated = self.send_json(Method::POST, url, token, &body).await?;

        info!("Assigned license {} to {}", license_sku_id, user_principal_name);
        Ok(updated)
    }

    /// Fetch the tenant's subscribed SKUs with only `skuPartNumber` and `skuId`.
    pub async fn get_subscribed_sku_ids(&self, token: &BearerToken) -> Result<Value, ApiError> {
        let url = self.endpoint_with_query(&["subscribedSkus"], "$select=skuPartNumber,skuId")?;
        self.get_json(url, token).await
    }

    /// Fetch every subscribed SKU in full, flattened into a table.
    pub async fn get_license_report(&self, token: &BearerToken) -> Result<Table, ApiError> {
        let url = self.endpoint(&["subscribedSkus"])?;
        let table = Table::from_records(self.get_all_pages(url, token).await?);

        info!("License report has {} SKUs", table.len());
        Ok(table)
    }
}

/// Map `skuPartNumber -> skuId` from a `/subscribedSkus` response body.
///
/// Entries missing either field are skipped.
pub fn build_license_dict(data: &Value) -> Result<BTreeMap<String, String>, TableError> {
    let skus = data
        .get("value")
        .and_then(Value::as_array)
        .ok_or(TableError::NotACollection)?;

    let mut sku_dict = BTreeMap::new();
    for sku in skus {
        let sku: SubscribedSku = match serde_json::from_value(sku.clone()) {
            Ok(sku) => sku,
            Err(e) => {
                warn!("Skipping malformed SKU entry: {}", e);
                continue;
            }
        };

        match (sku.sku_part_number, sku.sku_id) {
            (Some(part_number), Some(sku_id)) if !part_number.is_empty() && !sku_id.is_empty() => {
                sku_dict.insert(part_number, sku_id);
            }
            _ => {}
        }
    }

    Ok(sku_dict)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use chrono::{Duration, Utc};
    use serde_json::json;
    use wiremock::{
        matchers::{body_json, header, method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    fn token() -> BearerToken {
        BearerToken::new("test-token", Utc::now() + Duration::hours(1))
    }

    #[test]
    fn test_build_license_dict() {
        let data = json!({
            "value": [
                {"skuPartNumber": "ENTERPRISEPACK", "skuId": "6fd2c87f-b296-42f0-b197-1e91e994b900"},
                {"skuPartNumber": "FLOW_FREE", "skuId": "f30db892-07e9-47e9-837c-80727f46fd3d"},
                {"skuPartNumber": "", "skuId": "ignored"},
                {"skuId": "no-part-number"},
                {"skuPartNumber": "NO_ID"}
            ]
        });

        let dict = build_license_dict(&data).unwrap();

        assert_eq!(dict.len(), 2);
        assert_eq!(dict["ENTERPRISEPACK"], "6fd2c87f-b296-42f0-b197-1e91e994b900");
        assert_eq!(dict["FLOW_FREE"], "f30db892-07e9-47e9-837c-80727f46fd3d");
    }

    #[test]
    fn test_build_license_dict_requires_collection() {
        assert_eq!(
            build_license_dict(&json!({"error": "nope"})),
            Err(TableError::NotACollection)
        );
    }

    #[tokio::test]
    async fn test_assign_license_request_shape() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1.0/users/ada@contoso.com/assignLicense"))
            .and(header("authorization", "Bearer test-token"))
            .and(body_json(json!({
                "addLicenses": [{"skuId": "sku-e3"}],
                "removeLicenses": []
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "id-ada",
                "userPrincipalName": "ada@contoso.com"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = GraphClient::new(&test_config(&server.uri())).unwrap();
        let updated = client
            .assign_license(&token(), "ada@contoso.com", "sku-e3")
            .await
            .unwrap();

        assert_eq!(updated.unwrap()["id"], "id-ada");
    }

    #[tokio::test]
    async fn test_subscribed_sku_ids_feed_license_dict() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1.0/subscribedSkus"))
            .and(query_param("$select", "skuPartNumber,skuId"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": [{"skuPartNumber": "SPE_E3", "skuId": "sku-e3"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = GraphClient::new(&test_config(&server.uri())).unwrap();
        let data = client.get_subscribed_sku_ids(&token()).await.unwrap();
        let dict = build_license_dict(&data).unwrap();

        assert_eq!(dict["SPE_E3"], "sku-e3");
    }

    #[tokio::test]
    async fn test_license_report_flattens_units() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1.0/subscribedSkus"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": [{
                    "skuPartNumber": "SPE_E3",
                    "consumedUnits": 12,
                    "prepaidUnits": {"enabled": 25, "suspended": 0, "warning": 0}
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = GraphClient::new(&test_config(&server.uri())).unwrap();
        let report = client.get_license_report(&token()).await.unwrap();

        assert_eq!(report.len(), 1);
        assert_eq!(report.get(0, "prepaidUnits.enabled"), Some(&json!(25)));
        assert_eq!(report.get(0, "consumedUnits"), Some(&json!(12)));
    }
}
