// ============================================================================
// Estate Core - Ledger Entities
// File: crates/estate-core/src/domain/transaction.rs
// Description: Unified transaction records, views and totals
// ============================================================================

use estate_shared::{EntityId, Timestamp};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use validator::Validate;

use super::account::Actor;
use super::payment::{PaymentDetails, Receipt};
use super::property::{ListingType, Property};

pub const ADMIN_CREATION_METHOD: &str = "Admin Creation";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionType {
    #[serde(rename = "Platform Fee")]
    PlatformFee,
    #[serde(rename = "Property Inquiry")]
    PropertyInquiry,
    #[serde(rename = "Property Sale")]
    PropertySale,
    #[serde(rename = "Property Rental")]
    PropertyRental,
    #[serde(rename = "Admin Property Creation")]
    AdminPropertyCreation,
}

impl TransactionType {
    pub fn for_listing(listing: ListingType) -> Self {
        match listing {
            ListingType::Sale => TransactionType::PropertySale,
            ListingType::Rent | ListingType::Pledge => TransactionType::PropertyRental,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    #[default]
    Pending,
    Completed,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Failed => "failed",
        }
    }
}

/// Ledger entry at `transactions/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(default)]
    pub id: EntityId,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    #[serde(default)]
    pub amount: i64,
    #[serde(default)]
    pub status: TransactionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landlord_id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landlord_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buyer_id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buyer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buyer_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buyer_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inquiry_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub timestamp: Timestamp,
    #[serde(default)]
    pub created_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
    #[serde(default)]
    pub is_admin_created: bool,
    /// Set on entries projected from a fee embedded in `properties/{id}`.
    /// Never stored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedded_in: Option<EntityId>,
}

impl Transaction {
    fn base(kind: TransactionType, amount: i64, status: TransactionStatus, property: &Property, now: Timestamp) -> Self {
        Self {
            id: EntityId::new(),
            kind,
            amount,
            status,
            property_id: Some(property.id.clone()),
            property_name: Some(property.name.clone()),
            landlord_id: property.landlord_id.clone(),
            landlord_name: property.landlord_name.clone(),
            tenant_id: None,
            tenant_name: None,
            tenant_email: None,
            tenant_phone: None,
            buyer_id: None,
            buyer_name: None,
            buyer_email: None,
            buyer_phone: None,
            inquiry_type: None,
            message: None,
            payment_method: None,
            payment_reference: None,
            description: None,
            timestamp: now,
            created_at: now,
            updated_at: None,
            is_admin_created: false,
            embedded_in: None,
        }
    }

    /// Completed listing fee paid by the landlord.
    pub fn platform_fee(property: &Property, receipt: &Receipt, now: Timestamp) -> Self {
        Self {
            payment_method: Some(receipt.method.clone()),
            payment_reference: Some(receipt.reference.clone()),
            description: Some(format!("Platform fee payment for property: {}", property.name)),
            ..Self::base(TransactionType::PlatformFee, receipt.amount, TransactionStatus::Completed, property, now)
        }
    }

    /// Zero-amount record of an admin-created listing.
    pub fn admin_creation(property: &Property, now: Timestamp) -> Self {
        Self {
            payment_method: Some(ADMIN_CREATION_METHOD.to_string()),
            description: Some(format!("Property created by admin: {}", property.name)),
            is_admin_created: true,
            ..Self::base(TransactionType::AdminPropertyCreation, 0, TransactionStatus::Completed, property, now)
        }
    }

    pub fn inquiry(property: &Property, tenant: &Actor, request: &InquiryRequest, now: Timestamp) -> Self {
        Self {
            tenant_id: Some(tenant.user_id.clone()),
            tenant_name: Some(tenant.name_or("Tenant")),
            tenant_email: tenant.email.clone(),
            tenant_phone: request.phone.clone(),
            inquiry_type: request.inquiry_type.clone(),
            message: request.message.clone(),
            description: Some(format!("Inquiry about property: {}", property.name)),
            ..Self::base(TransactionType::PropertyInquiry, 0, TransactionStatus::Pending, property, now)
        }
    }

    /// Pending sale or rental at the listed price.
    pub fn property_payment(
        property: &Property,
        buyer: &Actor,
        request: &PropertyPaymentRequest,
        receipt: &Receipt,
        now: Timestamp,
    ) -> Self {
        let kind = TransactionType::for_listing(property.listing_type);
        let verb = if kind == TransactionType::PropertySale { "Purchase" } else { "Rental" };
        Self {
            buyer_id: Some(buyer.user_id.clone()),
            buyer_name: Some(buyer.name_or("Buyer")),
            buyer_email: buyer.email.clone(),
            buyer_phone: request.phone.clone(),
            payment_method: Some(receipt.method.clone()),
            payment_reference: Some(receipt.reference.clone()),
            description: Some(format!("{} of property: {}", verb, property.name)),
            ..Self::base(kind, property.price, TransactionStatus::Pending, property, now)
        }
    }

    /// Projects a fee embedded in a legacy property record into a listing
    /// entry. The id is the fee's own transaction id, or the property id.
    pub fn from_embedded_fee(property: &Property) -> Option<Self> {
        let fee = property.platform_fee.as_ref()?;
        let (kind, description) = if fee.is_admin_created {
            (
                TransactionType::AdminPropertyCreation,
                format!("Property created by admin: {}", property.name),
            )
        } else {
            (
                TransactionType::PlatformFee,
                format!("Platform fee payment for property: {}", property.name),
            )
        };
        let at = fee.paid_at.unwrap_or(property.created_at);
        let mut tx = Self::base(kind, fee.amount, fee.status, property, at);
        tx.id = fee.transaction_id.clone().unwrap_or_else(|| property.id.clone());
        tx.landlord_id = Some(property.landlord_id.clone().unwrap_or_else(|| "admin".into()));
        tx.landlord_name = Some(property.landlord_name.clone().unwrap_or_else(|| "Admin".into()));
        tx.payment_method = fee.payment_method.clone();
        tx.description = Some(description);
        tx.is_admin_created = fee.is_admin_created;
        tx.embedded_in = Some(property.id.clone());
        Some(tx)
    }

    pub fn involves_tenant(&self, user_id: &str, email: Option<&str>) -> bool {
        self.tenant_id.as_deref() == Some(user_id)
            || self.buyer_id.as_deref() == Some(user_id)
            || matches!(
                (email, self.tenant_email.as_deref()),
                (Some(a), Some(b)) if a.eq_ignore_ascii_case(b)
            )
    }
}

/// Deterministic ledger id for an idempotency key.
pub fn idempotent_id(key: &str) -> EntityId {
    hex::encode(Sha256::digest(key.as_bytes()))
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct InquiryRequest {
    #[validate(length(min = 1, message = "Property is required"))]
    pub property_id: EntityId,
    #[validate(length(max = 50))]
    pub inquiry_type: Option<String>,
    #[validate(length(max = 2000))]
    pub message: Option<String>,
    #[validate(length(max = 30))]
    pub phone: Option<String>,
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PropertyPaymentRequest {
    #[validate(length(min = 1, message = "Property is required"))]
    pub property_id: EntityId,
    pub payment: PaymentDetails,
    #[validate(length(max = 30))]
    pub phone: Option<String>,
    pub idempotency_key: Option<String>,
}

/// Which ledger entries a caller sees.
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerScope {
    All,
    Landlord(EntityId),
    Tenant { user_id: EntityId, email: Option<String> },
}

impl LedgerScope {
    pub fn for_actor(actor: &Actor) -> Self {
        use super::account::AccountType;
        match actor.account_type {
            AccountType::Admin => LedgerScope::All,
            AccountType::Landlord => LedgerScope::Landlord(actor.user_id.clone()),
            _ => LedgerScope::Tenant {
                user_id: actor.user_id.clone(),
                email: actor.email.clone(),
            },
        }
    }

    pub fn matches(&self, tx: &Transaction) -> bool {
        match self {
            LedgerScope::All => true,
            LedgerScope::Landlord(id) => {
                tx.landlord_id.as_deref() == Some(id.as_str()) && !tx.is_admin_created
            }
            LedgerScope::Tenant { user_id, email } => tx.involves_tenant(user_id, email.as_deref()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSummary {
    pub count: usize,
    pub completed: usize,
    pub pending: usize,
    pub failed: usize,
    pub completed_amount: i64,
}

impl LedgerSummary {
    pub fn of(transactions: &[Transaction]) -> Self {
        transactions.iter().fold(Self::default(), |mut s, tx| {
            s.count += 1;
            match tx.status {
                TransactionStatus::Completed => {
                    s.completed += 1;
                    s.completed_amount += tx.amount;
                }
                TransactionStatus::Pending => s.pending += 1,
                TransactionStatus::Failed => s.failed += 1,
            }
            s
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerView {
    pub transactions: Vec<Transaction>,
    pub summary: LedgerSummary,
}

impl LedgerView {
    /// Newest first.
    pub fn new(mut transactions: Vec<Transaction>) -> Self {
        transactions.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| b.id.cmp(&a.id)));
        let summary = LedgerSummary::of(&transactions);
        Self { transactions, summary }
    }
}
