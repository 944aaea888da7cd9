//! Path operations on the JSON tree.
//!
//! A path is a `/`-separated list of key segments. Writing `null` (or an
//! object that normalises to nothing) deletes the node, and parents left
//! without children disappear with it.

use estate_shared::utils::is_valid_key_segment;
use serde_json::{Map, Value};

use super::error::StoreError;

pub fn split_path(path: &str) -> Result<Vec<String>, StoreError> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(|s| {
            if is_valid_key_segment(s) {
                Ok(s.to_string())
            } else {
                Err(StoreError::InvalidPath(path.to_string()))
            }
        })
        .collect()
}

pub fn join_path(segments: &[String]) -> String {
    segments.join("/")
}

pub fn get<'a>(root: &'a Value, segments: &[String]) -> Option<&'a Value> {
    let mut node = root;
    for seg in segments {
        node = node.as_object()?.get(seg)?;
    }
    Some(node)
}

pub fn set(root: &mut Value, segments: &[String], value: Value) {
    let value = normalize(value);
    let Some((last, parents)) = segments.split_last() else {
        *root = if value.is_null() { Value::Object(Map::new()) } else { value };
        return;
    };
    if value.is_null() {
        remove(root, segments);
        return;
    }

    let mut node = root;
    for seg in parents {
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        let Value::Object(map) = node else { return };
        node = map
            .entry(seg.clone())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    if let Value::Object(map) = node {
        map.insert(last.clone(), value);
    }
}

/// Applies each field as its own write below `base`. Field keys may be
/// nested paths such as `platformFee/status`.
pub fn update(root: &mut Value, base: &[String], fields: Map<String, Value>) -> Result<(), StoreError> {
    let mut writes = Vec::with_capacity(fields.len());
    for (key, value) in fields {
        let mut path = base.to_vec();
        path.extend(split_path(&key)?);
        if path.len() == base.len() {
            return Err(StoreError::InvalidPath(key));
        }
        writes.push((path, value));
    }
    for (path, value) in writes {
        set(root, &path, value);
    }
    Ok(())
}

pub fn remove(root: &mut Value, segments: &[String]) {
    if segments.is_empty() {
        *root = Value::Object(Map::new());
        return;
    }
    remove_below(root, segments);
}

/// Returns true when `node` is left empty.
fn remove_below(node: &mut Value, segments: &[String]) -> bool {
    let Value::Object(map) = node else {
        return false;
    };
    if let Some((first, rest)) = segments.split_first() {
        if rest.is_empty() {
            map.remove(first);
        } else if let Some(child) = map.get_mut(first) {
            if remove_below(child, rest) {
                map.remove(first);
            }
        }
    }
    map.is_empty()
}

/// Drops null members and empty objects.
pub fn normalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let cleaned: Map<String, Value> = map
                .into_iter()
                .map(|(k, v)| (k, normalize(v)))
                .filter(|(_, v)| !v.is_null())
                .collect();
            if cleaned.is_empty() {
                Value::Null
            } else {
                Value::Object(cleaned)
            }
        }
        other => other,
    }
}

/// Whether a change at `changed` can affect a listener at `topic`: one path
/// is an ancestor of (or equal to) the other.
pub fn paths_overlap(topic: &str, changed: &str) -> bool {
    fn is_prefix(prefix: &str, path: &str) -> bool {
        prefix.is_empty()
            || path == prefix
            || (path.starts_with(prefix) && path.as_bytes().get(prefix.len()) == Some(&b'/'))
    }
    is_prefix(topic, changed) || is_prefix(changed, topic)
}
