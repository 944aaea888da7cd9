// ============================================================================
// Estate Infrastructure - Property Repository
// File: crates/estate-infrastructure/src/repositories/property_repo_impl.rs
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use serde_json::{Map, Value};
use tracing::{debug, info};

use estate_core::domain::Property;
use estate_core::error::DomainError;
use estate_core::repositories::{PropertyRepository, SnapshotStream};
use estate_shared::constants::PROPERTIES_PATH;
use estate_shared::EntityId;

use super::collection::{decode, decode_all, encode, record_path};
use crate::realtime::RealtimeStore;

const KIND: &str = "property";

pub struct TreePropertyRepository {
    store: Arc<RealtimeStore>,
}

impl TreePropertyRepository {
    pub fn new(store: Arc<RealtimeStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl PropertyRepository for TreePropertyRepository {
    fn next_id(&self) -> EntityId {
        self.store.push_id()
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Property>, DomainError> {
        let path = record_path(PROPERTIES_PATH, id)?;
        let node = self.store.get(&path).await?;
        Ok(node.and_then(|v| decode(KIND, id, v)))
    }

    async fn list(&self) -> Result<Vec<Property>, DomainError> {
        let node = self.store.get(PROPERTIES_PATH).await?;
        let properties: Vec<Property> = decode_all(KIND, node);
        debug!(count = properties.len(), "Loaded properties");
        Ok(properties)
    }

    async fn create(&self, property: &Property) -> Result<Property, DomainError> {
        let path = record_path(PROPERTIES_PATH, &property.id)?;
        self.store.set(&path, encode(property)?).await?;
        info!(property_id = %property.id, "Property stored");
        Ok(property.clone())
    }

    async fn update_fields(&self, id: &str, fields: Map<String, Value>) -> Result<(), DomainError> {
        let path = record_path(PROPERTIES_PATH, id)?;
        if self.store.update_existing(&path, fields).await? {
            Ok(())
        } else {
            Err(DomainError::not_found("Property", id))
        }
    }

    async fn delete(&self, id: &str) -> Result<(), DomainError> {
        let path = record_path(PROPERTIES_PATH, id)?;
        self.store.remove(&path).await?;
        Ok(())
    }

    fn subscribe(&self) -> SnapshotStream<Vec<Property>> {
        self.store
            .subscribe(PROPERTIES_PATH)
            .map(|snapshot| {
                snapshot
                    .map(|node| decode_all::<Property>(KIND, node))
                    .map_err(DomainError::from)
            })
            .boxed()
    }
}
