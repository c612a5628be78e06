//! Request and response shapes for the Graph endpoints we call.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Fields selected for the user table.
pub const USER_TABLE_SELECT: &str =
    "userprincipalname,id,mail,displayname,usertype,officeLocation,department,jobTitle,companyName,employeeid";

/// Manager fields expanded into the user table.
pub const USER_TABLE_EXPAND: &str = "manager($select=id,employeeId)";

/// Keys of `create_user` properties that belong inside `passwordProfile`.
pub const PASSWORD_PROFILE_KEYS: [&str; 3] = [
    "forceChangePasswordNextSignIn",
    "forceChangePasswordNextSignInWithMfa",
    "password",
];

// --- API Response Types ---

/// One page of an OData collection.
#[derive(Debug, Deserialize)]
pub struct ODataPage {
    #[serde(default)]
    pub value: Vec<Value>,
    #[serde(rename = "@odata.nextLink")]
    pub next_link: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GraphErrorBody {
    pub error: GraphErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct GraphErrorDetail {
    #[serde(default)]
    pub code: String,
    pub message: String,
}

/// A subscribed SKU as returned by `/subscribedSkus?$select=skuPartNumber,skuId`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribedSku {
    pub sku_part_number: Option<String>,
    pub sku_id: Option<String>,
}

// --- Request Body Types ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignLicenseBody {
    pub add_licenses: Vec<AddLicense>,
    pub remove_licenses: Vec<String>,
}

impl AssignLicenseBody {
    /// Add a single SKU and remove nothing.
    pub fn add(sku_id: &str) -> Self {
        Self {
            add_licenses: vec![AddLicense {
                sku_id: sku_id.to_string(),
            }],
            remove_licenses: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddLicense {
    pub sku_id: String,
}

/// Body of `PUT /users/{upn}/manager/$ref`.
#[derive(Debug, Serialize)]
pub struct ManagerReference {
    #[serde(rename = "@odata.id")]
    pub odata_id: String,
}

/// Build the body of `POST /users`.
///
/// Defaults are applied first and then overridden by `properties`. Password
/// profile keys are routed into `passwordProfile`.
pub fn create_user_body(
    user_principal_name: &str,
    properties: Map<String, Value>,
    generated_password: String,
) -> Map<String, Value> {
    let prefix = user_principal_name
        .split('@')
        .next()
        .unwrap_or(user_principal_name);

    let mut password_profile = Map::new();
    password_profile.insert("forceChangePasswordNextSignIn".into(), Value::Bool(true));
    password_profile.insert("password".into(), Value::String(generated_password));

    let mut body = Map::new();
    body.insert("accountEnabled".into(), Value::Bool(true));
    body.insert(
        "userPrincipalName".into(),
        Value::String(user_principal_name.to_string()),
    );
    body.insert("mailNickname".into(), Value::String(prefix.to_string()));
    body.insert("displayName".into(), Value::String(prefix.to_string()));

    for (key, value) in properties {
        if PASSWORD_PROFILE_KEYS.contains(&key.as_str()) {
            password_profile.insert(key, value);
        } else if key == "passwordProfile" {
            if let Value::Object(profile) = value {
                password_profile.extend(profile);
            }
        } else {
            body.insert(key, value);
        }
    }

    body.insert("passwordProfile".into(), Value::Object(password_profile));
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn props(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_assign_license_body_shape() {
        let body = serde_json::to_value(AssignLicenseBody::add("sku-1")).unwrap();
        assert_eq!(
            body,
            json!({"addLicenses": [{"skuId": "sku-1"}], "removeLicenses": []})
        );
    }

    #[test]
    fn test_manager_reference_shape() {
        let body = serde_json::to_value(ManagerReference {
            odata_id: "https://graph.microsoft.com/v1.0/users/m-1".into(),
        })
        .unwrap();
        assert_eq!(
            body,
            json!({"@odata.id": "https://graph.microsoft.com/v1.0/users/m-1"})
        );
    }

    #[test]
    fn test_create_user_body_defaults() {
        let body = create_user_body("jane.doe@contoso.com", Map::new(), "Abc12345".into());

        assert_eq!(
            Value::Object(body),
            json!({
                "accountEnabled": true,
                "userPrincipalName": "jane.doe@contoso.com",
                "mailNickname": "jane.doe",
                "displayName": "jane.doe",
                "passwordProfile": {
                    "forceChangePasswordNextSignIn": true,
                    "password": "Abc12345"
                }
            })
        );
    }

    #[test]
    fn test_create_user_body_overrides() {
        let body = create_user_body(
            "jane.doe@contoso.com",
            props(json!({
                "displayName": "Jane Doe",
                "department": "Finance",
                "password": "Chosen#Pass1",
                "forceChangePasswordNextSignIn": false
            })),
            "Abc12345".into(),
        );

        assert_eq!(body["displayName"], "Jane Doe");
        assert_eq!(body["department"], "Finance");
        assert!(body.get("password").is_none());
        assert_eq!(
            body["passwordProfile"],
            json!({"forceChangePasswordNextSignIn": false, "password": "Chosen#Pass1"})
        );
    }

    #[test]
    fn test_odata_page_parsing() {
        let page: ODataPage = serde_json::from_value(json!({
            "value": [{"id": "1"}],
            "@odata.nextLink": "https://graph.microsoft.com/v1.0/users?$skiptoken=X"
        }))
        .unwrap();
        assert_eq!(page.value.len(), 1);
        assert!(page.next_link.is_some());

        let page: ODataPage = serde_json::from_value(json!({})).unwrap();
        assert!(page.value.is_empty());
        assert!(page.next_link.is_none());
    }
}
