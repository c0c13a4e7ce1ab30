//! One content record: an id, its collection name and a flat attribute map.
//!
//! Records are snapshots. They carry a weak link to the collection that
//! produced them so that `update`, `delete` and `refresh` can be routed back
//! through it; when that collection is gone those calls fail with
//! `ApiError::Detached`.

use std::fmt;
use std::sync::{Arc, Weak};

use serde::Serialize;
use serde_json::{Map, Value};

use crate::client::to_json;
use crate::collection::{Collection, CollectionInner};
use crate::encoding::{decode_map, encode_tree};
use crate::error::{ApiError, ApiResult};
use crate::query::Populate;

#[derive(Clone)]
pub struct Record {
    id: String,
    kind: String,
    attributes: Map<String, Value>,
    collection: Weak<CollectionInner>,
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("attributes", &self.attributes)
            .finish()
    }
}

/// Equal when id, kind and attributes are equal; the collection link is
/// not compared.
impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.kind == other.kind && self.attributes == other.attributes
    }
}

fn id_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl Record {
    /// Wrap one item of a response's `data`.
    ///
    /// Accepts the flat shape (`{documentId, ...fields}`) and the nested
    /// one (`{id, attributes: {...}}`). The id is taken from `documentId`,
    /// then `id`, then `fallback_id`. Returns `None` for non-objects and
    /// items with no usable id. Keys and string values are percent-decoded.
    pub(crate) fn from_value(
        value: &Value,
        fallback_id: Option<&str>,
        collection: &Arc<CollectionInner>,
    ) -> Option<Self> {
        let item = value.as_object()?;
        let id = item
            .get("documentId")
            .and_then(id_of)
            .or_else(|| item.get("id").and_then(id_of))
            .or_else(|| fallback_id.map(str::to_string))?;
        let attributes = match item.get("attributes") {
            Some(Value::Object(nested)) => decode_map(nested),
            _ => decode_map(item),
        };
        Some(Self {
            id,
            kind: collection.name.clone(),
            attributes,
            collection: Arc::downgrade(collection),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Name of the collection this record belongs to.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// The owning collection, if the client that created it is still alive.
    pub fn collection(&self) -> Option<Collection> {
        self.collection.upgrade().map(Collection::from_inner)
    }

    fn owner(&self) -> ApiResult<Collection> {
        self.collection().ok_or(ApiError::Detached)
    }

    /// Attributes percent-encoded for transmission.
    pub fn to_wire(&self) -> Value {
        encode_tree(&Value::Object(self.attributes.clone()))
    }

    /// Send a partial update and adopt the collection's resulting snapshot.
    pub fn update<B: Serialize>(&mut self, partial: &B) -> ApiResult<Option<Record>> {
        let owner = self.owner()?;
        let updated = owner.update(&self.id, partial)?;
        match &updated {
            Some(snapshot) => *self = snapshot.clone(),
            None => {
                if let Value::Object(partial) = to_json(partial)? {
                    self.merge(&partial);
                }
            }
        }
        Ok(updated)
    }

    pub fn delete(&self) -> ApiResult<Option<Record>> {
        self.owner()?.delete(&self.id)
    }

    /// Re-fetch from the server, bypassing memoization, and adopt the result.
    pub fn refresh(&mut self) -> ApiResult<Record> {
        let fresh = self.owner()?.get(&self.id, &Populate::All, true)?;
        *self = fresh.clone();
        Ok(fresh)
    }

    /// True when every key of `partial` already holds the same value.
    pub(crate) fn matches(&self, partial: &Map<String, Value>) -> bool {
        partial
            .iter()
            .all(|(key, value)| self.attributes.get(key) == Some(value))
    }

    pub(crate) fn merge(&mut self, partial: &Map<String, Value>) {
        for (key, value) in partial {
            self.attributes.insert(key.clone(), value.clone());
        }
    }
}
