//! Percent transcoding for query values and attribute trees.
//!
//! Two character sets are in play. Query string values use the RFC 3986
//! unreserved set (`A-Za-z0-9-_.~` pass through), which is what the
//! backend's bracket-notation parser expects. Attribute trees use the
//! component set (`A-Za-z0-9-_.!~*'()` pass through), matching how text
//! fields were stored by browser clients.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::{Map, Value};

const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

pub fn encode_query_value(value: &str) -> String {
    utf8_percent_encode(value, QUERY_VALUE).to_string()
}

pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

/// Decode percent escapes. Input that does not decode to UTF-8 is returned
/// unchanged.
pub fn decode_component(value: &str) -> String {
    match percent_decode_str(value).decode_utf8() {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => value.to_string(),
    }
}

/// Recursively decode every object key and string value.
pub fn decode_tree(value: &Value) -> Value {
    map_tree(value, &decode_component)
}

/// Recursively encode every object key and string value.
pub fn encode_tree(value: &Value) -> Value {
    map_tree(value, &encode_component)
}

pub(crate) fn decode_map(map: &Map<String, Value>) -> Map<String, Value> {
    map.iter()
        .map(|(k, v)| (decode_component(k), decode_tree(v)))
        .collect()
}

fn map_tree(value: &Value, f: &dyn Fn(&str) -> String) -> Value {
    match value {
        Value::String(s) => Value::String(f(s)),
        Value::Array(items) => Value::Array(items.iter().map(|v| map_tree(v, f)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (f(k), map_tree(v, f)))
                .collect(),
        ),
        other => other.clone(),
    }
}
