//! Account repository trait (port)

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::domain::Account;
use crate::error::DomainError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Account>, DomainError>;
    async fn list(&self) -> Result<Vec<Account>, DomainError>;
    /// Merge patch at `accounts/{id}`, creating the record when absent.
    async fn upsert_fields(&self, id: &str, fields: Map<String, Value>) -> Result<(), DomainError>;
    async fn delete(&self, id: &str) -> Result<(), DomainError>;
}
