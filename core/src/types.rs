//! Wire DTOs for the content API.
//!
//! # Design
//! Envelopes keep `data` as `Option` so a response that parses but lacks
//! the field can be told apart from a transport or status failure; callers
//! turn the `None` case into a soft failure. Record payloads stay as
//! `serde_json::Value` because attribute sets are open-ended.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// Pagination block of list responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub page_size: u32,
    #[serde(default)]
    pub page_count: u32,
    #[serde(default)]
    pub total: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

/// `{ data: [...], meta: { pagination } }`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListEnvelope {
    #[serde(default)]
    pub data: Option<Vec<Value>>,
    #[serde(default)]
    pub meta: Option<Meta>,
}

impl ListEnvelope {
    /// Decode `data` and `meta.pagination` independently, so a bad
    /// pagination block never costs the records. Unreadable pagination
    /// counts as a single page.
    pub fn from_value(value: Value) -> Self {
        let Value::Object(mut fields) = value else {
            return Self::default();
        };
        let data = match fields.remove("data") {
            Some(Value::Array(items)) => Some(items),
            _ => None,
        };
        let pagination = fields
            .get_mut("meta")
            .and_then(|meta| meta.get_mut("pagination"))
            .map(Value::take)
            .filter(|p| !p.is_null())
            .and_then(|p| {
                serde_json::from_value::<Pagination>(p)
                    .map_err(|e| warn!(error = %e, "ignoring malformed pagination"))
                    .ok()
            });
        Self {
            data,
            meta: pagination.map(|p| Meta { pagination: Some(p) }),
        }
    }

    /// Total pages reported by the server; at least 1.
    pub fn page_count(&self) -> u32 {
        self.meta
            .as_ref()
            .and_then(|m| m.pagination)
            .map_or(1, |p| p.page_count.max(1))
    }
}

/// `{ data: {...} }`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SingleEnvelope {
    #[serde(default)]
    pub data: Option<Value>,
}

/// Structured error the backend attaches to 4xx/5xx responses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub details: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    #[serde(default)]
    pub error: Option<ErrorBody>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginCredentials {
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterCredentials {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForgotPassword {
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPassword {
    pub code: String,
    pub password: String,
    pub password_confirmation: String,
}

/// An end user of the backend's users-permissions plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub document_id: Option<String>,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub confirmed: Option<bool>,
    #[serde(default)]
    pub blocked: Option<bool>,
}

/// Response of login, register and reset-password.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub jwt: String,
    pub user: User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentTypeSchema {
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub collection_name: String,
}

/// One entry of the content-type metadata listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentType {
    #[serde(default)]
    pub uid: Option<String>,
    pub schema: ContentTypeSchema,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentTypesEnvelope {
    #[serde(default)]
    pub data: Option<Vec<ContentType>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_envelope_reads_pagination() {
        let env: ListEnvelope = serde_json::from_str(
            r#"{"data":[{"documentId":"a"}],"meta":{"pagination":{"page":1,"pageSize":100,"pageCount":3,"total":250}}}"#,
        )
        .unwrap();
        assert_eq!(env.data.as_ref().map(Vec::len), Some(1));
        assert_eq!(env.page_count(), 3);
    }

    #[test]
    fn missing_meta_counts_as_one_page() {
        let env: ListEnvelope = serde_json::from_str(r#"{"data":[]}"#).unwrap();
        assert_eq!(env.page_count(), 1);
        let zero: ListEnvelope =
            serde_json::from_str(r#"{"data":[],"meta":{"pagination":{"pageCount":0}}}"#).unwrap();
        assert_eq!(zero.page_count(), 1);
    }

    #[test]
    fn malformed_pagination_keeps_data() {
        let env = ListEnvelope::from_value(serde_json::json!({
            "data": [{ "documentId": "a" }, { "documentId": "b" }],
            "meta": { "pagination": { "pageCount": 4, "total": -1 } }
        }));
        assert_eq!(env.data.as_ref().map(Vec::len), Some(2));
        assert_eq!(env.page_count(), 1);

        let env = ListEnvelope::from_value(serde_json::json!({
            "data": [],
            "meta": { "pagination": { "pageCount": 2 } }
        }));
        assert_eq!(env.page_count(), 2);

        let env = ListEnvelope::from_value(serde_json::json!({ "data": {}, "meta": "x" }));
        assert!(env.data.is_none());
        assert_eq!(env.page_count(), 1);
        assert_eq!(ListEnvelope::from_value(Value::Null), ListEnvelope::default());
    }

    #[test]
    fn missing_data_is_none_not_an_error() {
        let env: SingleEnvelope = serde_json::from_str(r#"{"meta":{}}"#).unwrap();
        assert!(env.data.is_none());
        let null: SingleEnvelope = serde_json::from_str(r#"{"data":null}"#).unwrap();
        assert!(null.data.is_none());
    }

    #[test]
    fn reset_password_uses_camel_case() {
        let body = serde_json::to_value(ResetPassword {
            code: "c".to_string(),
            password: "p".to_string(),
            password_confirmation: "p".to_string(),
        })
        .unwrap();
        assert_eq!(body["passwordConfirmation"], "p");
    }

    #[test]
    fn content_types_parse() {
        let env: ContentTypesEnvelope = serde_json::from_str(
            r#"{"data":[{"uid":"api::widget.widget","schema":{"kind":"collectionType","collectionName":"widgets","displayName":"Widget"}}]}"#,
        )
        .unwrap();
        let data = env.data.unwrap();
        assert_eq!(data[0].schema.collection_name, "widgets");
        assert_eq!(data[0].schema.kind, "collectionType");
    }
}
