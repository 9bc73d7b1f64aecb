//! Authenticated user profile

use crate::schema::org::OrgBrief;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Profile returned by `GET /v2/apps/user`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetail {
    pub id: String,
    pub created_date: DateTime<Utc>,
    pub updated_date: DateTime<Utc>,
    pub name: String,
    pub email: String,
    /// Organisations the user belongs to, in the order the API lists them
    pub organisations: Vec<OrgBrief>,
    #[serde(rename = "type", default = "default_user_type")]
    pub kind: String,
}

fn default_user_type() -> String {
    "User".to_string()
}

impl UserDetail {
    /// Id of the first listed organisation, used as the default scope
    pub fn default_org_id(&self) -> Option<&str> {
        self.organisations.first().map(|org| org.id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn org(id: &str) -> serde_json::Value {
        json!({
            "id": id,
            "isDefault": false,
            "role": 1,
            "createdDate": "2021-08-19T02:29:44.593Z",
            "name": format!("Org {}", id),
            "slug": id,
            "tier": 1,
            "tierDetails": null,
            "updatedDate": "2021-08-19T02:29:44.593Z"
        })
    }

    #[test]
    fn test_user_detail_decoding() {
        let payload = json!({
            "id": "6c4a37f7-3b1a-4a23-a0a0-0c83f1f3e6f0",
            "createdDate": "2021-08-19T02:29:44.593Z",
            "updatedDate": "2022-01-02T03:04:05Z",
            "name": "Jane Doe",
            "email": "jane@example.com",
            "organisations": [org("org-a"), org("org-b")]
        });

        let user: UserDetail = serde_json::from_value(payload).unwrap();
        assert_eq!(user.kind, "User");
        assert_eq!(user.organisations.len(), 2);
        assert_eq!(user.default_org_id(), Some("org-a"));
    }

    #[test]
    fn test_user_without_organisations() {
        let payload = json!({
            "id": "u-1",
            "createdDate": "2021-08-19T02:29:44.593Z",
            "updatedDate": "2021-08-19T02:29:44.593Z",
            "name": "Solo",
            "email": "solo@example.com",
            "organisations": []
        });

        let user: UserDetail = serde_json::from_value(payload).unwrap();
        assert_eq!(user.default_org_id(), None);
    }

    #[test]
    fn test_user_missing_email_is_rejected() {
        let payload = json!({
            "id": "u-1",
            "createdDate": "2021-08-19T02:29:44.593Z",
            "updatedDate": "2021-08-19T02:29:44.593Z",
            "name": "Solo",
            "organisations": []
        });

        assert!(serde_json::from_value::<UserDetail>(payload).is_err());
    }
}
