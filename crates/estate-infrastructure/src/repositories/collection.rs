//! Record encoding shared by the tree repositories. A record's id is its key
//! in the collection and is not repeated inside the stored object.

use estate_core::DomainError;
use estate_shared::utils::is_valid_key_segment;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{error, warn};

use crate::realtime::StoreError;

/// `{collection}/{id}`, refusing ids that would address another node.
pub fn record_path(collection: &str, id: &str) -> Result<String, DomainError> {
    if is_valid_key_segment(id) {
        Ok(format!("{}/{}", collection, id))
    } else {
        Err(StoreError::InvalidPath(id.to_string()).into())
    }
}

pub fn encode<T: Serialize>(entity: &T) -> Result<Value, DomainError> {
    let mut value = serde_json::to_value(entity).map_err(|e| {
        error!("Failed to encode record: {}", e);
        DomainError::from(StoreError::from(e))
    })?;
    if let Value::Object(map) = &mut value {
        map.remove("id");
    }
    Ok(value)
}

/// Decodes one record. Malformed records are logged and treated as absent.
pub fn decode<T: DeserializeOwned>(kind: &str, id: &str, value: Value) -> Option<T> {
    let mut value = value;
    match &mut value {
        Value::Object(map) => {
            map.insert("id".into(), Value::String(id.to_string()));
        }
        _ => {
            warn!(kind, id, "Skipping non-object record");
            return None;
        }
    }
    match serde_json::from_value(value) {
        Ok(entity) => Some(entity),
        Err(e) => {
            warn!(kind, id, "Skipping malformed record: {}", e);
            None
        }
    }
}

/// Decodes every child of a collection node, in key order.
pub fn decode_all<T: DeserializeOwned>(kind: &str, node: Option<Value>) -> Vec<T> {
    match node {
        Some(Value::Object(map)) => map
            .into_iter()
            .filter_map(|(id, value)| decode(kind, &id, value))
            .collect(),
        _ => Vec::new(),
    }
}
