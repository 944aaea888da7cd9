// ============================================================================
// Estate Infrastructure - Account Repository
// File: crates/estate-infrastructure/src/repositories/account_repo_impl.rs
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use estate_core::domain::Account;
use estate_core::error::DomainError;
use estate_core::repositories::AccountRepository;
use estate_shared::constants::ACCOUNTS_PATH;

use super::collection::{decode, decode_all, record_path};
use crate::realtime::RealtimeStore;

const KIND: &str = "account";

pub struct TreeAccountRepository {
    store: Arc<RealtimeStore>,
}

impl TreeAccountRepository {
    pub fn new(store: Arc<RealtimeStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl AccountRepository for TreeAccountRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Account>, DomainError> {
        let path = record_path(ACCOUNTS_PATH, id)?;
        Ok(self.store.get(&path).await?.and_then(|v| decode(KIND, id, v)))
    }

    async fn list(&self) -> Result<Vec<Account>, DomainError> {
        Ok(decode_all(KIND, self.store.get(ACCOUNTS_PATH).await?))
    }

    async fn upsert_fields(&self, id: &str, fields: Map<String, Value>) -> Result<(), DomainError> {
        let path = record_path(ACCOUNTS_PATH, id)?;
        self.store.update(&path, fields).await?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), DomainError> {
        let path = record_path(ACCOUNTS_PATH, id)?;
        self.store.remove(&path).await?;
        Ok(())
    }
}
