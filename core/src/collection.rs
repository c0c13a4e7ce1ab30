//! Collection accessor: CRUD, pagination and cache reconciliation for one
//! named collection.
//!
//! # Design
//! `Collection` is a cheap handle over `Arc<CollectionInner>`. Records keep
//! a `Weak` to the inner value, so they can route `update`/`delete`/
//! `refresh` back here without keeping the collection alive.
//!
//! The cache holds owned snapshots. Callers always receive a clone, never a
//! reference into the cache, so what a caller holds only changes when the
//! caller reassigns it.
//!
//! Page fetches in `list` run strictly one after another; the next page is
//! requested only once the previous one has been absorbed.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::cache::ObjectCache;
use crate::client::{decode_envelope, to_json, Session};
use crate::error::{ApiError, ApiResult};
use crate::http::HttpMethod;
use crate::query::{Filter, Populate, PublicationState, QueryBuilder, Sort};
use crate::record::Record;
use crate::types::{ListEnvelope, SingleEnvelope};

/// Page size used when walking a collection.
pub const PAGE_SIZE: u32 = 100;

/// Options for `Collection::list`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListOptions {
    pub filters: Vec<Filter>,
    pub fields: Vec<String>,
    pub sort: Vec<Sort>,
    pub populate: Populate,
    pub locale: Option<String>,
    pub publication: Option<PublicationState>,
    /// Bypass the client's GET memoization.
    pub force: bool,
}

impl ListOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn sort(mut self, sort: Sort) -> Self {
        self.sort.push(sort);
        self
    }

    pub fn populate(mut self, populate: Populate) -> Self {
        self.populate = populate;
        self
    }

    pub fn locale(mut self, code: &str) -> Self {
        self.locale = Some(code.to_string());
        self
    }

    pub fn publication(mut self, state: PublicationState) -> Self {
        self.publication = Some(state);
        self
    }

    pub fn force(mut self) -> Self {
        self.force = true;
        self
    }

    fn query(&self, path: &str) -> QueryBuilder {
        let mut query = QueryBuilder::new(path)
            .filters(&self.filters)
            .fields(&self.fields)
            .sort(&self.sort)
            .populate(&self.populate);
        if let Some(locale) = &self.locale {
            query = query.locale(locale);
        }
        if let Some(state) = self.publication {
            query = query.publication_state(state);
        }
        query
    }
}

/// Map a collection name to its route segment: a dash goes between a
/// lowercase letter and a following uppercase letter.
pub fn route_for(name: &str) -> String {
    let mut route = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for c in name.chars() {
        if prev_lower && c.is_ascii_uppercase() {
            route.push('-');
        }
        route.push(c);
        prev_lower = c.is_ascii_lowercase();
    }
    route
}

pub(crate) struct CollectionInner {
    pub(crate) name: String,
    route: String,
    session: Arc<Session>,
    cache: Mutex<ObjectCache<Record>>,
}

#[derive(Clone)]
pub struct Collection {
    inner: Arc<CollectionInner>,
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("name", &self.inner.name)
            .field("route", &self.inner.route)
            .field("cached", &self.cache_len())
            .finish()
    }
}

impl Collection {
    pub(crate) fn new(name: &str, session: Arc<Session>) -> Self {
        Self {
            inner: Arc::new(CollectionInner {
                name: name.to_string(),
                route: route_for(name),
                session,
                cache: Mutex::new(ObjectCache::new()),
            }),
        }
    }

    pub(crate) fn from_inner(inner: Arc<CollectionInner>) -> Self {
        Self { inner }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// URL path segment for this collection.
    pub fn path(&self) -> &str {
        &self.inner.route
    }

    fn record_path(&self, id: &str) -> String {
        format!("{}/{id}", self.inner.route)
    }

    fn send(&self, method: HttpMethod, url: &str, body: Option<&Value>, force: bool) -> ApiResult<Value> {
        let path = self.inner.session.content_path(url);
        self.inner.session.send(method, &path, body, force)
    }

    fn wrap(&self, item: &Value, fallback_id: Option<&str>) -> Option<Record> {
        Record::from_value(item, fallback_id, &self.inner)
    }

    /// Drop `id` from the cache once the server has said it does not exist.
    fn forget_if_missing(&self, id: &str, err: &ApiError) {
        if err.is_not_found() && self.inner.cache.lock().remove(id).is_some() {
            debug!(collection = %self.inner.name, %id, "evicted record missing on server");
        }
    }

    /// Every record matching `options`, across all pages, in server order.
    pub fn list(&self, options: &ListOptions) -> ApiResult<Vec<Record>> {
        let query = options.query(&self.inner.route);
        let mut records = Vec::new();

        let first = self.fetch_page(&query, 1, options.force)?;
        let page_count = first.page_count();
        self.absorb_page(first, &mut records);

        for page in 2..=page_count {
            let envelope = self.fetch_page(&query, page, options.force)?;
            self.absorb_page(envelope, &mut records);
        }
        debug!(collection = %self.inner.name, pages = page_count, records = records.len(), "listed collection");
        Ok(records)
    }

    fn fetch_page(&self, query: &QueryBuilder, page: u32, force: bool) -> ApiResult<ListEnvelope> {
        let url = query.clone().paginate(page, PAGE_SIZE).build();
        let body = self.send(HttpMethod::Get, &url, None, force)?;
        Ok(ListEnvelope::from_value(body))
    }

    fn absorb_page(&self, envelope: ListEnvelope, out: &mut Vec<Record>) {
        let Some(items) = envelope.data else {
            warn!(collection = %self.inner.name, "list page carried no data");
            return;
        };
        let mut cache = self.inner.cache.lock();
        for item in &items {
            match self.wrap(item, None) {
                Some(record) => {
                    cache.insert(record.id(), record.clone());
                    out.push(record);
                }
                None => warn!(collection = %self.inner.name, "skipping malformed list item"),
            }
        }
    }

    /// Fetch one record. A response without data is `NotFound`, and a
    /// `NotFound` evicts any cached snapshot for `id`.
    pub fn get(&self, id: &str, populate: &Populate, force: bool) -> ApiResult<Record> {
        self.fetch_one(id, populate, force)
            .inspect_err(|e| self.forget_if_missing(id, e))
    }

    fn fetch_one(&self, id: &str, populate: &Populate, force: bool) -> ApiResult<Record> {
        let url = QueryBuilder::new(&self.record_path(id))
            .populate(populate)
            .build();
        let body = self.send(HttpMethod::Get, &url, None, force)?;
        let envelope: SingleEnvelope = decode_envelope(body);
        let record = envelope
            .data
            .as_ref()
            .and_then(|data| self.wrap(data, Some(id)))
            .ok_or(ApiError::NotFound)?;
        self.inner.cache.lock().insert(record.id(), record.clone());
        Ok(record)
    }

    /// Create a record. `Ok(None)` when the server answered without data.
    pub fn create<B: Serialize>(&self, body: &B) -> ApiResult<Option<Record>> {
        let envelope = json!({ "data": to_json(body)? });
        let response = self.send(HttpMethod::Post, &self.inner.route, Some(&envelope), true)?;
        let envelope: SingleEnvelope = decode_envelope(response);
        let Some(record) = envelope.data.as_ref().and_then(|data| self.wrap(data, None)) else {
            warn!(collection = %self.inner.name, "create returned no record");
            return Ok(None);
        };
        self.inner.cache.lock().insert(record.id(), record.clone());
        Ok(Some(record))
    }

    /// Apply a partial update.
    ///
    /// If the record is cached and differs from `partial` on any of its
    /// keys, the cached snapshot is patched with `partial` and returned.
    /// Otherwise a snapshot is built from the server response and cached.
    pub fn update<B: Serialize>(&self, id: &str, partial: &B) -> ApiResult<Option<Record>> {
        let partial = object_body(partial)?;
        let envelope = json!({ "data": Value::Object(partial.clone()) });
        let response = self
            .send(HttpMethod::Put, &self.record_path(id), Some(&envelope), true)
            .inspect_err(|e| self.forget_if_missing(id, e))?;
        let envelope: SingleEnvelope = decode_envelope(response);
        let Some(data) = envelope.data else {
            warn!(collection = %self.inner.name, %id, "update returned no record");
            return Ok(None);
        };

        let mut cache = self.inner.cache.lock();
        if let Some(cached) = cache.get_mut(id) {
            if !cached.matches(&partial) {
                cached.merge(&partial);
                debug!(collection = %self.inner.name, %id, "patched cached record");
                return Ok(Some(cached.clone()));
            }
        }
        let Some(record) = self.wrap(&data, Some(id)) else {
            return Ok(None);
        };
        cache.insert(record.id(), record.clone());
        Ok(Some(record))
    }

    /// Delete a record and evict it. Returns the evicted snapshot, or one
    /// built from the response when nothing was cached. A `NotFound` still
    /// evicts.
    pub fn delete(&self, id: &str) -> ApiResult<Option<Record>> {
        let response = self
            .send(HttpMethod::Delete, &self.record_path(id), None, true)
            .inspect_err(|e| self.forget_if_missing(id, e))?;
        let removed = self.inner.cache.lock().remove(id);
        if removed.is_some() {
            return Ok(removed);
        }
        let envelope: SingleEnvelope = decode_envelope(response);
        Ok(envelope.data.as_ref().and_then(|data| self.wrap(data, Some(id))))
    }

    /// Create each body in turn. One outcome per input, in input order.
    pub fn create_many<B: Serialize>(&self, bodies: &[B]) -> Vec<ApiResult<Option<Record>>> {
        bodies.iter().map(|body| self.create(body)).collect()
    }

    pub fn update_many<B: Serialize>(&self, updates: &[(String, B)]) -> Vec<ApiResult<Option<Record>>> {
        updates
            .iter()
            .map(|(id, partial)| self.update(id, partial))
            .collect()
    }

    pub fn delete_many<S: AsRef<str>>(&self, ids: &[S]) -> Vec<ApiResult<Option<Record>>> {
        ids.iter().map(|id| self.delete(id.as_ref())).collect()
    }

    /// Cached snapshot for `id`, without touching the network.
    pub fn cached(&self, id: &str) -> Option<Record> {
        self.inner.cache.lock().get(id).cloned()
    }

    /// First cached record satisfying `predicate(record, id)`.
    ///
    /// The predicate runs over a snapshot taken with the lock released, so
    /// it may call back into this collection.
    pub fn find<F>(&self, mut predicate: F) -> Option<Record>
    where
        F: FnMut(&Record, &str) -> bool,
    {
        let entries: Vec<(String, Record)> = self
            .inner
            .cache
            .lock()
            .iter()
            .map(|(id, record)| (id.to_string(), record.clone()))
            .collect();
        entries
            .into_iter()
            .find(|(id, record)| predicate(record, id.as_str()))
            .map(|(_, record)| record)
    }

    pub fn cache_len(&self) -> usize {
        self.inner.cache.lock().len()
    }

    pub fn clear_cache(&self) {
        self.inner.cache.lock().clear();
    }
}

fn object_body<B: Serialize>(body: &B) -> ApiResult<Map<String, Value>> {
    match to_json(body)? {
        Value::Object(map) => Ok(map),
        other => Err(ApiError::Serialization(format!(
            "update body must be a JSON object, got {other}"
        ))),
    }
}
