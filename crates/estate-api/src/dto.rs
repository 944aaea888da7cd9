//! Request payloads that wrap domain inputs.

use estate_core::domain::{NewProperty, PaymentDetails, TransactionStatus};
use estate_shared::EntityId;
use serde::{Deserialize, Serialize};

/// `POST /properties`: listing fields plus the platform fee payment.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePropertyRequest {
    #[serde(flatten)]
    pub property: NewProperty,
    #[serde(default)]
    pub payment: Option<PaymentDetails>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenChatRequest {
    pub property_id: EntityId,
    #[serde(default)]
    pub landlord_id: Option<EntityId>,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: TransactionStatus,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub id: EntityId,
    pub deleted: bool,
}
