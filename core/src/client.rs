//! Authenticated request layer and collection registry.
//!
//! # Design
//! `Session` is the shared core: base URL, prefix, transport, current
//! token and the GET memoization table. It is held in an `Arc` by the
//! `ApiClient` and by every `Collection`, so collections can issue requests
//! without a reference back to the client. Token and memo table use interior
//! locks because they change through `&self` calls (login, sign-out, any
//! request), but every call still runs to completion before the next one
//! starts.
//!
//! Status interpretation lives here and nowhere else: 2xx passes, 404 is
//! `NotFound`, anything else becomes `Http` with the server's structured
//! error when it sent one.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, error, info, trace, warn};

use crate::collection::{Collection, ListOptions};
use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport};
use crate::record::Record;
use crate::transport::UreqTransport;
use crate::types::{
    AuthResponse, ContentTypesEnvelope, ErrorEnvelope, ForgotPassword, LoginCredentials,
    RegisterCredentials, ResetPassword, User,
};

/// Metadata endpoint listing content types. Served outside the prefix.
pub const CONTENT_TYPES_PATH: &str = "content-type-builder/content-types";

/// Built-in collections owned by the backend itself, never exposed as
/// content collections.
pub const SYSTEM_COLLECTIONS: [&str; 9] = [
    "admin_permissions",
    "admin_users",
    "admin_roles",
    "strapi_api_tokens",
    "files",
    "up_permissions",
    "up_roles",
    "up_users",
    "i18n_locale",
];

pub(crate) struct Session {
    base_url: String,
    prefix: String,
    transport: Box<dyn Transport>,
    token: RwLock<Option<String>>,
    request_log: Mutex<HashMap<String, HttpResponse>>,
}

impl Session {
    pub(crate) fn new(config: &ClientConfig, transport: Box<dyn Transport>) -> Self {
        Self {
            base_url: config.normalized_base_url(),
            prefix: config.normalized_prefix(),
            transport,
            token: RwLock::new(config.token.clone()),
            request_log: Mutex::new(HashMap::new()),
        }
    }

    /// Path under the API prefix.
    pub(crate) fn content_path(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        if self.prefix.is_empty() {
            path.to_string()
        } else {
            format!("{}/{path}", self.prefix)
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub(crate) fn token(&self) -> Option<String> {
        self.token.read().clone()
    }

    /// Memoized responses belong to the previous identity and are dropped.
    pub(crate) fn set_token(&self, token: Option<String>) {
        *self.token.write() = token;
        self.request_log.lock().clear();
    }

    pub(crate) fn auth_headers(&self) -> Vec<(String, String)> {
        match self.token.read().as_deref() {
            Some(token) => vec![("Authorization".to_string(), format!("Bearer {token}"))],
            None => Vec::new(),
        }
    }

    pub(crate) fn build_request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&Value>,
    ) -> ApiResult<HttpRequest> {
        let mut headers = self.auth_headers();
        let body = match body {
            Some(body) => {
                headers.push(("content-type".to_string(), "application/json".to_string()));
                Some(serde_json::to_string(body).map_err(|e| ApiError::Serialization(e.to_string()))?)
            }
            None => None,
        };
        Ok(HttpRequest {
            method,
            url: self.url(path),
            headers,
            body,
        })
    }

    /// Issue one request and return its JSON body (`Null` when empty).
    ///
    /// Unforced GETs are answered from the memo table when the same URL was
    /// fetched before. Any successful write clears the table.
    pub(crate) fn send(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&Value>,
        force: bool,
    ) -> ApiResult<Value> {
        let request = self.build_request(method, path, body)?;
        let url = request.url.clone();
        let key = format!("{method}{url}");

        if method == HttpMethod::Get && !force {
            let memoized = self.request_log.lock().get(&key).cloned();
            if let Some(response) = memoized {
                trace!(%url, "serving memoized response");
                return parse_body(&response);
            }
        }

        debug!(%method, %url, "sending request");
        let response = self.transport.execute(request).map_err(|e| {
            error!(%method, %url, error = %e, "transport failure");
            ApiError::from(e)
        })?;
        check_status(&response)?;

        let mut log = self.request_log.lock();
        if method == HttpMethod::Get {
            log.insert(key, response.clone());
        } else {
            log.clear();
        }
        drop(log);

        parse_body(&response)
    }

    pub(crate) fn clear_request_log(&self) {
        self.request_log.lock().clear();
    }

    pub(crate) fn discover_collections(&self) -> ApiResult<Vec<String>> {
        let body = self.send(HttpMethod::Get, CONTENT_TYPES_PATH, None, true)?;
        let envelope: ContentTypesEnvelope = decode(body)?;
        let content_types = envelope
            .data
            .ok_or_else(|| ApiError::Discovery("response carried no content types".to_string()))?;
        Ok(content_types
            .into_iter()
            .filter(|ct| {
                ct.schema.kind == "collectionType"
                    && !SYSTEM_COLLECTIONS.contains(&ct.schema.collection_name.as_str())
            })
            .map(|ct| ct.schema.collection_name)
            .collect())
    }
}

/// Map non-success status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse) -> ApiResult<()> {
    if response.is_success() {
        return Ok(());
    }
    if response.status == 404 {
        return Err(ApiError::NotFound);
    }
    let structured = serde_json::from_str::<ErrorEnvelope>(&response.body)
        .ok()
        .and_then(|envelope| envelope.error);
    Err(match structured {
        Some(error) => ApiError::Http {
            status: response.status,
            name: error.name,
            message: error.message,
            details: error.details,
        },
        None => ApiError::Http {
            status: response.status,
            name: "HttpError".to_string(),
            message: response.body.clone(),
            details: None,
        },
    })
}

fn parse_body(response: &HttpResponse) -> ApiResult<Value> {
    if response.body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
}

/// Strict conversion: a shape mismatch is an error.
pub(crate) fn decode<T: DeserializeOwned>(value: Value) -> ApiResult<T> {
    serde_json::from_value(value).map_err(|e| ApiError::Deserialization(e.to_string()))
}

/// Lenient conversion for record envelopes: an empty body or unexpected
/// shape yields the empty envelope.
pub(crate) fn decode_envelope<T: DeserializeOwned + Default>(value: Value) -> T {
    if value.is_null() {
        return T::default();
    }
    serde_json::from_value(value).unwrap_or_else(|e| {
        warn!(error = %e, "unexpected response shape");
        T::default()
    })
}

pub(crate) fn to_json<B: Serialize>(body: &B) -> ApiResult<Value> {
    serde_json::to_value(body).map_err(|e| ApiError::Serialization(e.to_string()))
}

/// Entry point: owns the session and one `Collection` per configured name.
pub struct ApiClient {
    session: Arc<Session>,
    collections: Vec<Collection>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.session.base_url)
            .field("prefix", &self.session.prefix)
            .field("authenticated", &self.is_authenticated())
            .field("collections", &self.collection_names())
            .finish()
    }
}

impl ApiClient {
    /// Build a ready client. Without a static collection list, collections
    /// are discovered first; failing to discover them fails the connect.
    pub fn connect<T: Transport + 'static>(config: ClientConfig, transport: T) -> ApiResult<Self> {
        let session = Arc::new(Session::new(&config, Box::new(transport)));
        let names = match config.collections {
            Some(names) => names,
            None => session.discover_collections().map_err(|e| match e {
                ApiError::Discovery(_) => e,
                other => ApiError::Discovery(other.to_string()),
            })?,
        };
        let collections = names
            .iter()
            .map(|name| Collection::new(name, Arc::clone(&session)))
            .collect::<Vec<_>>();
        info!(
            base_url = %session.base_url,
            collections = collections.len(),
            "content API client ready"
        );
        Ok(Self {
            session,
            collections,
        })
    }

    /// `connect` over the default blocking HTTP transport.
    pub fn connect_http(config: ClientConfig) -> ApiResult<Self> {
        Self::connect(config, UreqTransport::new())
    }

    pub fn base_url(&self) -> &str {
        &self.session.base_url
    }

    pub fn prefix(&self) -> &str {
        &self.session.prefix
    }

    pub fn token(&self) -> Option<String> {
        self.session.token()
    }

    pub fn set_token(&self, token: &str) {
        self.session.set_token(Some(token.to_string()));
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.token.read().is_some()
    }

    /// `Authorization` header for the current token, or nothing.
    pub fn auth_headers(&self) -> Vec<(String, String)> {
        self.session.auth_headers()
    }

    /// Forget the token locally. Nothing is revoked server-side.
    pub fn sign_out(&self) {
        self.session.set_token(None);
    }

    pub fn clear_request_log(&self) {
        self.session.clear_request_log();
    }

    /// Raw request against a path relative to the base URL (no prefix).
    pub fn request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&Value>,
        force: bool,
    ) -> ApiResult<Value> {
        self.session.send(method, path, body, force)
    }

    pub fn get(&self, path: &str, force: bool) -> ApiResult<Value> {
        let path = self.session.content_path(path);
        self.session.send(HttpMethod::Get, &path, None, force)
    }

    /// POST `{ data: body }` under the prefix.
    pub fn post<B: Serialize>(&self, path: &str, body: &B) -> ApiResult<Value> {
        let envelope = json!({ "data": to_json(body)? });
        let path = self.session.content_path(path);
        self.session.send(HttpMethod::Post, &path, Some(&envelope), true)
    }

    /// PUT `{ data: body }` under the prefix.
    pub fn put<B: Serialize>(&self, path: &str, body: &B) -> ApiResult<Value> {
        let envelope = json!({ "data": to_json(body)? });
        let path = self.session.content_path(path);
        self.session.send(HttpMethod::Put, &path, Some(&envelope), true)
    }

    /// DELETE under the prefix. A body, when given, is sent as is.
    pub fn delete<B: Serialize>(&self, path: &str, body: Option<&B>) -> ApiResult<Value> {
        let body = body.map(to_json).transpose()?;
        let path = self.session.content_path(path);
        self.session.send(HttpMethod::Delete, &path, body.as_ref(), true)
    }

    /// Content collections advertised by the metadata endpoint, without the
    /// backend's own system collections.
    pub fn all_collection_names(&self) -> ApiResult<Vec<String>> {
        self.session.discover_collections()
    }

    pub fn collection(&self, name: &str) -> ApiResult<&Collection> {
        self.collections
            .iter()
            .find(|c| c.name() == name)
            .ok_or_else(|| ApiError::UnknownCollection(name.to_string()))
    }

    pub fn collections(&self) -> impl Iterator<Item = &Collection> {
        self.collections.iter()
    }

    pub fn collection_names(&self) -> Vec<&str> {
        self.collections.iter().map(Collection::name).collect()
    }

    /// List every configured collection, one after another.
    pub fn all_data(&self) -> ApiResult<BTreeMap<String, Vec<Record>>> {
        let mut result = BTreeMap::new();
        for collection in &self.collections {
            let records = collection.list(&ListOptions::default())?;
            result.insert(collection.name().to_string(), records);
        }
        Ok(result)
    }

    /// Authenticate and keep the returned token for later requests.
    pub fn login(&self, credentials: &LoginCredentials) -> ApiResult<AuthResponse> {
        let body = to_json(credentials)?;
        let path = self.session.content_path("auth/local");
        let value = self.session.send(HttpMethod::Post, &path, Some(&body), true)?;
        let auth: AuthResponse = decode(value)?;
        self.session.set_token(Some(auth.jwt.clone()));
        info!(user = %auth.user.username, "logged in");
        Ok(auth)
    }

    /// Create an account. The client stays in its current auth state.
    pub fn register(&self, credentials: &RegisterCredentials) -> ApiResult<AuthResponse> {
        let body = to_json(credentials)?;
        let path = self.session.content_path("auth/local/register");
        let value = self.session.send(HttpMethod::Post, &path, Some(&body), true)?;
        decode(value)
    }

    pub fn forgot_password(&self, data: &ForgotPassword) -> ApiResult<Value> {
        let body = to_json(data)?;
        let path = self.session.content_path("auth/forgot-password");
        self.session.send(HttpMethod::Post, &path, Some(&body), true)
    }

    pub fn reset_password(&self, data: &ResetPassword) -> ApiResult<AuthResponse> {
        let body = to_json(data)?;
        let path = self.session.content_path("auth/reset-password");
        let value = self.session.send(HttpMethod::Post, &path, Some(&body), true)?;
        decode(value)
    }

    /// The user the current token belongs to.
    pub fn me(&self) -> ApiResult<User> {
        let path = self.session.content_path("users/me");
        let value = self.session.send(HttpMethod::Get, &path, None, true)?;
        decode(value)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::testing::ScriptedTransport;

    fn content_types() -> Value {
        json!({
            "data": [
                { "uid": "api::widget.widget", "schema": { "kind": "collectionType", "collectionName": "widgets" } },
                { "uid": "admin::user", "schema": { "kind": "collectionType", "collectionName": "admin_users" } },
                { "uid": "api::home.home", "schema": { "kind": "singleType", "collectionName": "homes" } },
                { "uid": "plugin::upload.file", "schema": { "kind": "collectionType", "collectionName": "files" } },
                { "uid": "api::team.team", "schema": { "kind": "collectionType", "collectionName": "teams" } }
            ]
        })
    }

    fn static_client(transport: &ScriptedTransport) -> ApiClient {
        let config = ClientConfig::new("http://cms.local/").with_collections(["widgets"]);
        ApiClient::connect(config, transport.clone()).unwrap()
    }

    #[test]
    fn discovery_filters_system_and_single_types() {
        let transport = ScriptedTransport::new();
        transport.push_json(200, content_types());
        let client = ApiClient::connect(ClientConfig::new("http://cms.local"), transport.clone()).unwrap();
        assert_eq!(client.collection_names(), vec!["widgets", "teams"]);
        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url, "http://cms.local/content-type-builder/content-types");
    }

    #[test]
    fn discovery_failure_aborts_connect() {
        let transport = ScriptedTransport::new();
        transport.push_json(500, json!({ "error": { "status": 500, "name": "InternalServerError", "message": "boom" } }));
        let err = ApiClient::connect(ClientConfig::new("http://cms.local"), transport).unwrap_err();
        assert!(matches!(err, ApiError::Discovery(_)));

        let transport = ScriptedTransport::new();
        transport.push_json(200, json!({ "meta": {} }));
        let err = ApiClient::connect(ClientConfig::new("http://cms.local"), transport).unwrap_err();
        assert!(matches!(err, ApiError::Discovery(_)));

        let transport = ScriptedTransport::new();
        transport.push_transport_error("connection refused");
        let err = ApiClient::connect(ClientConfig::new("http://cms.local"), transport).unwrap_err();
        assert!(matches!(err, ApiError::Discovery(ref m) if m.contains("connection refused")));
    }

    #[test]
    fn static_collections_skip_discovery() {
        let transport = ScriptedTransport::new();
        let client = static_client(&transport);
        assert!(transport.requests().is_empty());
        assert!(client.collection("widgets").is_ok());
        assert!(matches!(
            client.collection("missing").unwrap_err(),
            ApiError::UnknownCollection(ref n) if n == "missing"
        ));
    }

    #[test]
    fn bearer_header_follows_token_lifecycle() {
        let transport = ScriptedTransport::new();
        let client = static_client(&transport);
        assert!(!client.is_authenticated());

        transport.push_json(200, json!({ "jwt": "tok-1", "user": { "id": 1, "username": "ada", "email": "ada@example.com" } }));
        let auth = client
            .login(&LoginCredentials {
                identifier: "ada".to_string(),
                password: "pw".to_string(),
            })
            .unwrap();
        assert_eq!(auth.user.username, "ada");
        assert_eq!(client.token().as_deref(), Some("tok-1"));

        transport.push_json(200, json!({ "id": 1, "username": "ada", "email": "ada@example.com" }));
        client.me().unwrap();

        client.sign_out();
        assert!(!client.is_authenticated());
        transport.push_json(200, json!({ "data": [] }));
        client.get("widgets", true).unwrap();

        let requests = transport.requests();
        assert_eq!(requests[0].url, "http://cms.local/api/auth/local");
        assert_eq!(requests[0].header("authorization"), None);
        let login_body: Value = serde_json::from_str(requests[0].body.as_deref().unwrap()).unwrap();
        assert_eq!(login_body, json!({ "identifier": "ada", "password": "pw" }));
        assert_eq!(requests[1].url, "http://cms.local/api/users/me");
        assert_eq!(requests[1].header("authorization"), Some("Bearer tok-1"));
        assert_eq!(requests[2].header("authorization"), None);
    }

    #[test]
    fn register_does_not_authenticate() {
        let transport = ScriptedTransport::new();
        let client = static_client(&transport);
        transport.push_json(200, json!({ "jwt": "new", "user": { "username": "bob", "email": "bob@example.com" } }));
        let auth = client
            .register(&RegisterCredentials {
                username: "bob".to_string(),
                email: "bob@example.com".to_string(),
                password: "pw".to_string(),
            })
            .unwrap();
        assert_eq!(auth.jwt, "new");
        assert!(!client.is_authenticated());
        assert_eq!(transport.requests()[0].url, "http://cms.local/api/auth/local/register");
    }

    #[test]
    fn configured_token_is_sent() {
        let transport = ScriptedTransport::new();
        let config = ClientConfig::new("http://cms.local")
            .with_collections(Vec::<String>::new())
            .with_token("static");
        let client = ApiClient::connect(config, transport.clone()).unwrap();
        transport.push_json(200, json!({ "ok": true }));
        client
            .forgot_password(&ForgotPassword {
                email: "a@b.c".to_string(),
            })
            .unwrap();
        let req = &transport.requests()[0];
        assert_eq!(req.url, "http://cms.local/api/auth/forgot-password");
        assert_eq!(req.header("Authorization"), Some("Bearer static"));
    }

    #[test]
    fn unforced_gets_are_memoized_until_a_write() {
        let transport = ScriptedTransport::new();
        let client = static_client(&transport);
        transport.push_json(200, json!({ "data": 1 }));
        transport.push_json(200, json!({ "data": 2 }));
        transport.push_json(200, json!({ "data": 3 }));
        transport.push_json(200, json!({ "data": 4 }));

        assert_eq!(client.get("widgets", false).unwrap()["data"], 1);
        assert_eq!(client.get("widgets", false).unwrap()["data"], 1);
        assert_eq!(client.get("widgets", true).unwrap()["data"], 2);
        assert_eq!(client.get("widgets", false).unwrap()["data"], 2);
        client.post("widgets", &json!({ "name": "A" })).unwrap();
        assert_eq!(client.get("widgets", false).unwrap()["data"], 4);
        assert_eq!(transport.requests().len(), 4);
    }

    #[test]
    fn token_changes_drop_memoized_responses() {
        let transport = ScriptedTransport::new();
        let client = static_client(&transport);
        client.set_token("first");
        transport.push_json(200, json!({ "data": "private" }));
        transport.push_json(200, json!({ "data": "public" }));
        transport.push_json(200, json!({ "data": "second" }));

        assert_eq!(client.get("widgets", false).unwrap()["data"], "private");
        client.sign_out();
        assert_eq!(client.get("widgets", false).unwrap()["data"], "public");
        client.set_token("second");
        assert_eq!(client.get("widgets", false).unwrap()["data"], "second");

        let requests = transport.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0].header("authorization"), Some("Bearer first"));
        assert_eq!(requests[1].header("authorization"), None);
        assert_eq!(requests[2].header("authorization"), Some("Bearer second"));
    }

    #[test]
    fn delete_sends_optional_body_unwrapped() {
        let transport = ScriptedTransport::new();
        let client = static_client(&transport);
        transport.push_raw(204, "");
        transport.push_json(200, json!({ "data": { "documentId": "a" } }));
        assert!(client.delete::<Value>("widgets/a", None).unwrap().is_null());
        let deleted = client
            .delete("widgets/b", Some(&json!({ "reason": "spam" })))
            .unwrap();
        assert_eq!(deleted["data"]["documentId"], "a");

        let requests = transport.requests();
        assert_eq!(requests[0].method, HttpMethod::Delete);
        assert_eq!(requests[0].url, "http://cms.local/api/widgets/a");
        assert!(requests[0].body.is_none());
        let body: Value = serde_json::from_str(requests[1].body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({ "reason": "spam" }));
        assert_eq!(requests[1].header("content-type"), Some("application/json"));
    }

    #[test]
    fn post_and_put_wrap_body_in_data_envelope() {
        let transport = ScriptedTransport::new();
        let client = static_client(&transport);
        transport.push_json(200, json!({}));
        transport.push_json(200, json!({}));
        client.post("widgets", &json!({ "name": "A" })).unwrap();
        client.put("widgets/abc", &json!({ "name": "B" })).unwrap();
        let requests = transport.requests();
        assert_eq!(requests[0].method, HttpMethod::Post);
        assert_eq!(requests[0].header("content-type"), Some("application/json"));
        let body: Value = serde_json::from_str(requests[0].body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({ "data": { "name": "A" } }));
        assert_eq!(requests[1].method, HttpMethod::Put);
        assert_eq!(requests[1].url, "http://cms.local/api/widgets/abc");
    }

    #[test]
    fn http_errors_carry_server_details() {
        let transport = ScriptedTransport::new();
        let client = static_client(&transport);
        transport.push_json(
            400,
            json!({ "data": null, "error": { "status": 400, "name": "ValidationError", "message": "Invalid identifier or password", "details": { "field": "identifier" } } }),
        );
        let err = client
            .login(&LoginCredentials {
                identifier: "x".to_string(),
                password: "y".to_string(),
            })
            .unwrap_err();
        match err {
            ApiError::Http {
                status,
                name,
                message,
                details,
            } => {
                assert_eq!(status, 400);
                assert_eq!(name, "ValidationError");
                assert_eq!(message, "Invalid identifier or password");
                assert_eq!(details, Some(json!({ "field": "identifier" })));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!client.is_authenticated());
    }

    #[test]
    fn unstructured_errors_and_not_found() {
        let transport = ScriptedTransport::new();
        let client = static_client(&transport);
        transport.push_raw(502, "bad gateway");
        transport.push_raw(404, "");
        let err = client.get("widgets", true).unwrap_err();
        assert!(matches!(err, ApiError::Http { status: 502, ref message, .. } if message == "bad gateway"));
        assert!(client.get("widgets/nope", true).unwrap_err().is_not_found());
    }

    #[test]
    fn non_json_success_is_a_deserialization_error() {
        let transport = ScriptedTransport::new();
        let client = static_client(&transport);
        transport.push_raw(200, "<html>");
        assert!(matches!(
            client.get("widgets", true).unwrap_err(),
            ApiError::Deserialization(_)
        ));
    }

    #[test]
    fn transport_failures_are_distinct() {
        let transport = ScriptedTransport::new();
        let client = static_client(&transport);
        transport.push_transport_error("dns failure");
        assert!(matches!(
            client.get("widgets", true).unwrap_err(),
            ApiError::Transport(ref m) if m == "dns failure"
        ));
    }

    #[test]
    fn all_data_lists_each_collection() {
        let transport = ScriptedTransport::new();
        let config = ClientConfig::new("http://cms.local").with_collections(["widgets", "teams"]);
        let client = ApiClient::connect(config, transport.clone()).unwrap();
        transport.push_json(200, json!({ "data": [{ "documentId": "w1", "name": "A" }], "meta": { "pagination": { "page": 1, "pageSize": 100, "pageCount": 1, "total": 1 } } }));
        transport.push_json(200, json!({ "data": [], "meta": { "pagination": { "page": 1, "pageSize": 100, "pageCount": 0, "total": 0 } } }));
        let all = client.all_data().unwrap();
        assert_eq!(all["widgets"].len(), 1);
        assert!(all["teams"].is_empty());
        let requests = transport.requests();
        assert!(requests[0].url.starts_with("http://cms.local/api/widgets?"));
        assert!(requests[1].url.starts_with("http://cms.local/api/teams?"));
    }

    #[test]
    fn empty_prefix_is_allowed() {
        let transport = ScriptedTransport::new();
        let config = ClientConfig::new("http://cms.local")
            .with_collections(["widgets"])
            .with_prefix("");
        let client = ApiClient::connect(config, transport.clone()).unwrap();
        transport.push_json(200, json!({}));
        client.get("widgets", true).unwrap();
        assert_eq!(transport.requests()[0].url, "http://cms.local/widgets");
    }
}
