// ============================================================================
// Estate Infrastructure - Ledger Repository
// File: crates/estate-infrastructure/src/repositories/transaction_repo_impl.rs
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::error;

use estate_core::domain::Transaction;
use estate_core::error::DomainError;
use estate_core::repositories::TransactionRepository;
use estate_shared::constants::TRANSACTIONS_PATH;

use super::collection::{decode, decode_all, encode, record_path};
use crate::realtime::RealtimeStore;

const KIND: &str = "transaction";

pub struct TreeTransactionRepository {
    store: Arc<RealtimeStore>,
}

impl TreeTransactionRepository {
    pub fn new(store: Arc<RealtimeStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl TransactionRepository for TreeTransactionRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Transaction>, DomainError> {
        let path = record_path(TRANSACTIONS_PATH, id)?;
        Ok(self.store.get(&path).await?.and_then(|v| decode(KIND, id, v)))
    }

    async fn list(&self) -> Result<Vec<Transaction>, DomainError> {
        Ok(decode_all(KIND, self.store.get(TRANSACTIONS_PATH).await?))
    }

    async fn append(&self, tx: &Transaction) -> Result<Transaction, DomainError> {
        let id = self.store.push(TRANSACTIONS_PATH, encode(tx)?).await?;
        Ok(Transaction { id, ..tx.clone() })
    }

    async fn insert_if_absent(&self, tx: &Transaction) -> Result<(Transaction, bool), DomainError> {
        let path = record_path(TRANSACTIONS_PATH, &tx.id)?;
        let (stored, created) = self.store.set_if_absent(&path, encode(tx)?).await?;
        let stored = decode(KIND, &tx.id, stored).ok_or_else(|| {
            error!(transaction_id = %tx.id, "Existing ledger entry is unreadable");
            DomainError::StoreUnavailable(format!("unreadable ledger entry {}", tx.id))
        })?;
        Ok((stored, created))
    }

    async fn update_fields(&self, id: &str, fields: Map<String, Value>) -> Result<(), DomainError> {
        let path = record_path(TRANSACTIONS_PATH, id)?;
        if self.store.update_existing(&path, fields).await? {
            Ok(())
        } else {
            Err(DomainError::not_found("Transaction", id))
        }
    }
}
