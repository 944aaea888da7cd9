//! Property repository trait (port)

use async_trait::async_trait;
use estate_shared::EntityId;
use serde_json::{Map, Value};

use super::SnapshotStream;
use crate::domain::Property;
use crate::error::DomainError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PropertyRepository: Send + Sync {
    /// Fresh time-ordered key for a new listing.
    fn next_id(&self) -> EntityId;
    async fn find_by_id(&self, id: &str) -> Result<Option<Property>, DomainError>;
    async fn list(&self) -> Result<Vec<Property>, DomainError>;
    /// Writes the full record at `properties/{id}`.
    async fn create(&self, property: &Property) -> Result<Property, DomainError>;
    /// Merge patch. Keys may be nested paths such as `platformFee/status`.
    async fn update_fields(&self, id: &str, fields: Map<String, Value>) -> Result<(), DomainError>;
    async fn delete(&self, id: &str) -> Result<(), DomainError>;
    fn subscribe(&self) -> SnapshotStream<Vec<Property>>;
}
