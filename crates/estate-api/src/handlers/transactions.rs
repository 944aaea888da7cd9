// ============================================================================
// Estate API - Transaction Handlers
// File: crates/estate-api/src/handlers/transactions.rs
// ============================================================================

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use estate_core::domain::{InquiryRequest, LedgerView, PropertyPaymentRequest, Transaction};

use super::{created, ok, ApiResult, CreatedResult};
use crate::dto::StatusUpdateRequest;
use crate::middleware::Caller;
use crate::state::AppState;

/// GET /api/v1/transactions
pub async fn list(
    State(state): State<AppState>,
    Extension(Caller(actor)): Extension<Caller>,
) -> ApiResult<LedgerView> {
    ok(state.ledger.view(&actor).await?)
}

/// POST /api/v1/transactions/inquiries
pub async fn inquiry(
    State(state): State<AppState>,
    Extension(Caller(actor)): Extension<Caller>,
    Json(payload): Json<InquiryRequest>,
) -> CreatedResult<Transaction> {
    let tx = state.ledger.record_inquiry(&actor, payload).await?;
    created(tx)
}

/// POST /api/v1/transactions/payments
pub async fn payment(
    State(state): State<AppState>,
    Extension(Caller(actor)): Extension<Caller>,
    Json(payload): Json<PropertyPaymentRequest>,
) -> CreatedResult<Transaction> {
    let tx = state.ledger.record_property_payment(&actor, payload).await?;
    created(tx)
}

/// PATCH /api/v1/transactions/{id}/status
pub async fn update_status(
    State(state): State<AppState>,
    Extension(Caller(actor)): Extension<Caller>,
    Path(id): Path<String>,
    Json(payload): Json<StatusUpdateRequest>,
) -> ApiResult<Transaction> {
    ok(state.ledger.update_status(&actor, &id, payload.status).await?)
}
