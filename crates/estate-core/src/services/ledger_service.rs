// ============================================================================
// Estate Core - Ledger Service
// File: crates/estate-core/src/services/ledger_service.rs
// ============================================================================
//! Single transactions collection for fees, inquiries and property payments.
//! Fees embedded in older property records are read through a projection.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::{json, Map, Value};
use tracing::{info, warn};
use validator::Validate;

use crate::domain::{
    idempotent_id, Actor, InquiryRequest, LedgerScope, LedgerView, Property, PropertyPaymentRequest,
    Receipt, Transaction, TransactionStatus,
};
use crate::error::DomainError;
use crate::repositories::{PropertyRepository, TransactionRepository};
use crate::services::MockPaymentGateway;

pub struct LedgerService {
    transactions: Arc<dyn TransactionRepository>,
    properties: Arc<dyn PropertyRepository>,
    payments: Arc<MockPaymentGateway>,
}

impl LedgerService {
    pub fn new(
        transactions: Arc<dyn TransactionRepository>,
        properties: Arc<dyn PropertyRepository>,
        payments: Arc<MockPaymentGateway>,
    ) -> Self {
        Self {
            transactions,
            properties,
            payments,
        }
    }

    /// Appends `tx`. With an idempotency key the entry id is derived from the
    /// key and a repeat call returns the entry written the first time.
    pub async fn record(
        &self,
        mut tx: Transaction,
        idempotency_key: Option<&str>,
    ) -> Result<Transaction, DomainError> {
        tx.embedded_in = None;
        let stored = match idempotency_key {
            Some(key) => {
                tx.id = idempotent_id(key);
                let (stored, created) = self.transactions.insert_if_absent(&tx).await?;
                if !created {
                    info!(transaction_id = %stored.id, "Idempotent replay, returning existing entry");
                }
                stored
            }
            None => self.transactions.append(&tx).await?,
        };
        info!(
            transaction_id = %stored.id,
            kind = ?stored.kind,
            amount = stored.amount,
            status = stored.status.as_str(),
            "Ledger entry recorded"
        );
        Ok(stored)
    }

    pub async fn record_platform_fee(
        &self,
        property: &Property,
        receipt: &Receipt,
    ) -> Result<Transaction, DomainError> {
        let tx = Transaction::platform_fee(property, receipt, estate_shared::now_millis());
        self.record(tx, Some(&format!("platform-fee:{}", property.id))).await
    }

    pub async fn record_admin_creation(&self, property: &Property) -> Result<Transaction, DomainError> {
        let tx = Transaction::admin_creation(property, estate_shared::now_millis());
        self.record(tx, Some(&format!("admin-creation:{}", property.id))).await
    }

    pub async fn record_inquiry(
        &self,
        actor: &Actor,
        request: InquiryRequest,
    ) -> Result<Transaction, DomainError> {
        request.validate()?;
        let property = self.listed_property(actor, &request.property_id).await?;
        let tx = Transaction::inquiry(&property, actor, &request, estate_shared::now_millis());
        let key = request
            .idempotency_key
            .as_deref()
            .map(|k| format!("inquiry:{}:{}", actor.user_id, k));
        self.record(tx, key.as_deref()).await
    }

    /// Charges the buyer through the mock gateway and records a pending sale
    /// or rental at the listed price.
    pub async fn record_property_payment(
        &self,
        actor: &Actor,
        request: PropertyPaymentRequest,
    ) -> Result<Transaction, DomainError> {
        request.validate()?;
        let property = self.listed_property(actor, &request.property_id).await?;
        if property.is_owned_by(&actor.user_id) {
            return Err(DomainError::invalid("You cannot pay for your own property"));
        }
        let receipt = self.payments.charge(&request.payment, property.price)?;
        let tx = Transaction::property_payment(&property, actor, &request, &receipt, estate_shared::now_millis());
        let key = request
            .idempotency_key
            .as_deref()
            .map(|k| format!("payment:{}:{}", actor.user_id, k));
        self.record(tx, key.as_deref()).await
    }

    /// Admin status change. Entries projected from a legacy embedded fee are
    /// patched on the owning property record.
    pub async fn update_status(
        &self,
        actor: &Actor,
        id: &str,
        status: TransactionStatus,
    ) -> Result<Transaction, DomainError> {
        if !actor.is_admin() {
            warn!(user_id = %actor.user_id, "Non-admin attempted a transaction status change");
            return Err(DomainError::denied("Only admins can change transaction status"));
        }

        if let Some(existing) = self.transactions.find_by_id(id).await? {
            let now = estate_shared::next_timestamp(existing.updated_at);
            let mut fields = Map::new();
            fields.insert("status".into(), json!(status));
            fields.insert("updatedAt".into(), json!(now));
            self.transactions.update_fields(id, fields).await?;
            info!(transaction_id = %id, status = status.as_str(), "Transaction status updated");
            return self
                .transactions
                .find_by_id(id)
                .await?
                .ok_or_else(|| DomainError::not_found("Transaction", id));
        }

        let property = self
            .properties
            .list()
            .await?
            .into_iter()
            .find(|p| {
                p.platform_fee.as_ref().is_some_and(|fee| {
                    fee.transaction_id.as_deref() == Some(id)
                        || (fee.transaction_id.is_none() && p.id == id)
                })
            })
            .ok_or_else(|| DomainError::not_found("Transaction", id))?;

        let now = estate_shared::next_timestamp(property.updated_at);
        let mut fields = Map::new();
        fields.insert("platformFee/status".into(), json!(status));
        fields.insert("updatedAt".into(), json!(now));
        fields.insert("adminUpdated".into(), Value::Bool(true));
        self.properties.update_fields(&property.id, fields).await?;
        info!(
            transaction_id = %id,
            property_id = %property.id,
            status = status.as_str(),
            "Embedded platform fee status updated"
        );

        self.properties
            .find_by_id(&property.id)
            .await?
            .as_ref()
            .and_then(Transaction::from_embedded_fee)
            .ok_or_else(|| DomainError::not_found("Transaction", id))
    }

    /// Entries the actor may see, newest first, with totals.
    pub async fn view(&self, actor: &Actor) -> Result<LedgerView, DomainError> {
        let scope = LedgerScope::for_actor(actor);
        let entries = self.all_entries().await?;
        Ok(LedgerView::new(entries.into_iter().filter(|tx| scope.matches(tx)).collect()))
    }

    async fn all_entries(&self) -> Result<Vec<Transaction>, DomainError> {
        let mut entries = self.transactions.list().await?;
        let known: HashSet<String> = entries.iter().map(|tx| tx.id.clone()).collect();
        let projected = self
            .properties
            .list()
            .await?
            .iter()
            .filter_map(Transaction::from_embedded_fee)
            .filter(|tx| !known.contains(&tx.id))
            .collect::<Vec<_>>();
        entries.extend(projected);
        Ok(entries)
    }

    /// Inquiries and payments target listed properties only. Unverified
    /// listings are reported as missing to everyone but their managers.
    async fn listed_property(&self, actor: &Actor, id: &str) -> Result<Property, DomainError> {
        match self.properties.find_by_id(id).await? {
            Some(p) if p.is_tenant_visible() || actor.can_manage(&p) => Ok(p),
            _ => Err(DomainError::not_found("Property", id)),
        }
    }
}
