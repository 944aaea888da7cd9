//! Ledger repository trait (port)

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::domain::Transaction;
use crate::error::DomainError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TransactionRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Transaction>, DomainError>;
    async fn list(&self) -> Result<Vec<Transaction>, DomainError>;
    /// Appends at a fresh push id.
    async fn append(&self, tx: &Transaction) -> Result<Transaction, DomainError>;
    /// Writes at `tx.id` unless an entry already exists there. Returns the
    /// stored entry and whether this call created it.
    async fn insert_if_absent(&self, tx: &Transaction) -> Result<(Transaction, bool), DomainError>;
    async fn update_fields(&self, id: &str, fields: Map<String, Value>) -> Result<(), DomainError>;
}
