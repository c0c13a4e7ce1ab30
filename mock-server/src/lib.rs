//! In-memory stand-in for a Strapi-style content backend.
//!
//! Collections are created on first write and keyed by their route segment.
//! Records use the flat shape (`documentId` plus fields); list responses
//! carry `meta.pagination`. Only `$eq` and `$containsi` filters are honored.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

pub const DEFAULT_PAGE_SIZE: usize = 25;
pub const MAX_PAGE_SIZE: usize = 100;

/// Collections present before any write, advertised by discovery.
pub const SEED_COLLECTIONS: [&str; 2] = ["articles", "widgets"];

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    pub id: u64,
    pub document_id: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub provider: String,
    pub confirmed: bool,
    pub blocked: bool,
}

#[derive(Debug, Default)]
pub struct Store {
    pub collections: HashMap<String, Vec<Map<String, Value>>>,
    pub users: Vec<UserAccount>,
    /// jwt -> index into `users`
    pub sessions: HashMap<String, usize>,
    /// reset code -> index into `users`
    pub reset_codes: HashMap<String, usize>,
    next_id: u64,
}

impl Store {
    pub fn seeded() -> Self {
        let mut store = Self::default();
        for name in SEED_COLLECTIONS {
            store.collections.insert(name.to_string(), Vec::new());
        }
        store
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn issue_token(&mut self, user: usize) -> String {
        let jwt = Uuid::new_v4().simple().to_string();
        self.sessions.insert(jwt.clone(), user);
        jwt
    }
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    app_with_state(Arc::new(RwLock::new(Store::seeded())))
}

pub fn app_with_state(db: Db) -> Router {
    Router::new()
        .route("/api/auth/local", post(login))
        .route("/api/auth/local/register", post(register))
        .route("/api/auth/forgot-password", post(forgot_password))
        .route("/api/auth/reset-password", post(reset_password))
        .route("/api/users/me", get(me))
        .route("/content-type-builder/content-types", get(content_types))
        .route("/api/{collection}", get(list_records).post(create_record))
        .route(
            "/api/{collection}/{id}",
            get(get_record).put(update_record).delete(delete_record),
        )
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "mock content API listening");
    }
    axum::serve(listener, app()).await
}

/// Error response in the backend's `{ data: null, error: {...} }` shape.
#[derive(Debug)]
pub struct ApiFailure {
    status: StatusCode,
    name: &'static str,
    message: String,
}

impl ApiFailure {
    fn new(status: StatusCode, name: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            name,
            message: message.into(),
        }
    }

    fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "NotFoundError", "Not Found")
    }

    fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "ValidationError", message)
    }

    fn unauthorized() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            "UnauthorizedError",
            "Missing or invalid credentials",
        )
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let body = json!({
            "data": null,
            "error": {
                "status": self.status.as_u16(),
                "name": self.name,
                "message": self.message,
                "details": {}
            }
        });
        (self.status, Json(body)).into_response()
    }
}

type Reply = Result<Json<Value>, ApiFailure>;

fn query_value<'a>(query: &'a [(String, String)], key: &str) -> Option<&'a str> {
    query
        .iter()
        .rev()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `filters[field][$op]=value` clauses this server understands.
fn record_matches(record: &Map<String, Value>, query: &[(String, String)]) -> bool {
    query.iter().all(|(key, expected)| {
        let Some(rest) = key.strip_prefix("filters[") else {
            return true;
        };
        let Some((field, op)) = rest.split_once("][") else {
            return true;
        };
        let actual = record.get(field).map(as_text).unwrap_or_default();
        match op {
            "$eq]" => actual == *expected,
            "$containsi]" => actual.to_lowercase().contains(&expected.to_lowercase()),
            _ => true,
        }
    })
}

fn data_object(body: Value) -> Result<Map<String, Value>, ApiFailure> {
    match body {
        Value::Object(mut envelope) => match envelope.remove("data") {
            Some(Value::Object(data)) => Ok(data),
            _ => Err(ApiFailure::validation("Missing \"data\" payload in the request body")),
        },
        _ => Err(ApiFailure::validation("Request body must be a JSON object")),
    }
}

async fn list_records(
    State(db): State<Db>,
    Path(collection): Path<String>,
    Query(query): Query<Vec<(String, String)>>,
) -> Reply {
    let page = query_value(&query, "pagination[page]")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(1)
        .max(1);
    let page_size = query_value(&query, "pagination[pageSize]")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);

    let store = db.read().await;
    let records = store.collections.get(&collection).ok_or_else(ApiFailure::not_found)?;
    let matching: Vec<&Map<String, Value>> = records
        .iter()
        .filter(|record| record_matches(record, &query))
        .collect();
    let total = matching.len();
    let page_count = total.div_ceil(page_size);
    let data: Vec<Value> = matching
        .into_iter()
        .skip((page - 1) * page_size)
        .take(page_size)
        .map(|record| Value::Object(record.clone()))
        .collect();
    debug!(%collection, page, page_size, total, "list");

    Ok(Json(json!({
        "data": data,
        "meta": {
            "pagination": {
                "page": page,
                "pageSize": page_size,
                "pageCount": page_count,
                "total": total
            }
        }
    })))
}

async fn create_record(
    State(db): State<Db>,
    Path(collection): Path<String>,
    Json(body): Json<Value>,
) -> Reply {
    let mut record = data_object(body)?;
    let mut store = db.write().await;
    let id = store.next_id();
    record.insert("id".to_string(), json!(id));
    record.insert("documentId".to_string(), json!(Uuid::new_v4().simple().to_string()));
    store
        .collections
        .entry(collection.clone())
        .or_default()
        .push(record.clone());
    debug!(%collection, id, "create");
    Ok(Json(json!({ "data": record, "meta": {} })))
}

async fn get_record(State(db): State<Db>, Path((collection, id)): Path<(String, String)>) -> Reply {
    let store = db.read().await;
    let record = store
        .collections
        .get(&collection)
        .and_then(|records| records.iter().find(|r| r["documentId"] == id.as_str()))
        .ok_or_else(ApiFailure::not_found)?;
    Ok(Json(json!({ "data": record, "meta": {} })))
}

async fn update_record(
    State(db): State<Db>,
    Path((collection, id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Reply {
    let patch = data_object(body)?;
    let mut store = db.write().await;
    let record = store
        .collections
        .get_mut(&collection)
        .and_then(|records| records.iter_mut().find(|r| r["documentId"] == id.as_str()))
        .ok_or_else(ApiFailure::not_found)?;
    for (key, value) in patch {
        if key != "id" && key != "documentId" {
            record.insert(key, value);
        }
    }
    debug!(%collection, %id, "update");
    Ok(Json(json!({ "data": record, "meta": {} })))
}

async fn delete_record(
    State(db): State<Db>,
    Path((collection, id)): Path<(String, String)>,
) -> Result<StatusCode, ApiFailure> {
    let mut store = db.write().await;
    let records = store
        .collections
        .get_mut(&collection)
        .ok_or_else(ApiFailure::not_found)?;
    let position = records
        .iter()
        .position(|r| r["documentId"] == id.as_str())
        .ok_or_else(ApiFailure::not_found)?;
    records.remove(position);
    debug!(%collection, %id, "delete");
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct Login {
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct Register {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct Forgot {
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reset {
    pub code: String,
    pub password: String,
    pub password_confirmation: String,
}

fn auth_reply(jwt: String, user: &UserAccount) -> Json<Value> {
    Json(json!({ "jwt": jwt, "user": user }))
}

async fn register(State(db): State<Db>, Json(input): Json<Register>) -> Reply {
    if input.password.len() < 6 {
        return Err(ApiFailure::validation("password must be at least 6 characters"));
    }
    let mut store = db.write().await;
    let taken = store
        .users
        .iter()
        .any(|u| u.email == input.email || u.username == input.username);
    if taken {
        return Err(ApiFailure::new(
            StatusCode::BAD_REQUEST,
            "ApplicationError",
            "Email or Username are already taken",
        ));
    }
    let id = store.next_id();
    store.users.push(UserAccount {
        id,
        document_id: Uuid::new_v4().simple().to_string(),
        username: input.username,
        email: input.email,
        password: input.password,
        provider: "local".to_string(),
        confirmed: true,
        blocked: false,
    });
    let index = store.users.len() - 1;
    let jwt = store.issue_token(index);
    Ok(auth_reply(jwt, &store.users[index]))
}

async fn login(State(db): State<Db>, Json(input): Json<Login>) -> Reply {
    let mut store = db.write().await;
    let index = store
        .users
        .iter()
        .position(|u| {
            (u.email == input.identifier || u.username == input.identifier)
                && u.password == input.password
        })
        .ok_or_else(|| ApiFailure::validation("Invalid identifier or password"))?;
    let jwt = store.issue_token(index);
    Ok(auth_reply(jwt, &store.users[index]))
}

async fn forgot_password(State(db): State<Db>, Json(input): Json<Forgot>) -> Reply {
    let mut store = db.write().await;
    if let Some(index) = store.users.iter().position(|u| u.email == input.email) {
        let code = Uuid::new_v4().simple().to_string();
        debug!(email = %input.email, %code, "reset code issued");
        store.reset_codes.insert(code, index);
    }
    Ok(Json(json!({ "ok": true })))
}

async fn reset_password(State(db): State<Db>, Json(input): Json<Reset>) -> Reply {
    if input.password != input.password_confirmation {
        return Err(ApiFailure::validation("Passwords do not match"));
    }
    let mut store = db.write().await;
    let index = store
        .reset_codes
        .remove(&input.code)
        .ok_or_else(|| ApiFailure::validation("Incorrect code provided"))?;
    store.users[index].password = input.password;
    let jwt = store.issue_token(index);
    Ok(auth_reply(jwt, &store.users[index]))
}

async fn me(State(db): State<Db>, headers: HeaderMap) -> Reply {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(ApiFailure::unauthorized)?;
    let store = db.read().await;
    let index = *store.sessions.get(token).ok_or_else(ApiFailure::unauthorized)?;
    Ok(Json(json!(store.users[index])))
}

async fn content_types(State(db): State<Db>) -> Json<Value> {
    let store = db.read().await;
    let mut names: Vec<&String> = store.collections.keys().collect();
    names.sort();
    let mut data: Vec<Value> = names
        .into_iter()
        .map(|name| {
            json!({
                "uid": format!("api::{name}.{name}"),
                "schema": { "kind": "collectionType", "collectionName": name }
            })
        })
        .collect();
    data.push(json!({
        "uid": "plugin::users-permissions.user",
        "schema": { "kind": "collectionType", "collectionName": "up_users" }
    }));
    data.push(json!({
        "uid": "api::homepage.homepage",
        "schema": { "kind": "singleType", "collectionName": "homepages" }
    }));
    Json(json!({ "data": data }))
}
