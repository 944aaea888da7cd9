// ============================================================================
// Estate API - Verification Handlers
// File: crates/estate-api/src/handlers/verification.rs
// ============================================================================

use std::convert::Infallible;

use axum::{
    extract::{Path, State},
    response::sse::{Event, Sse},
    Extension,
};
use estate_core::domain::{Property, PropertyFilter, VerificationAction};
use futures::Stream;

use super::{ok, snapshot_events, ApiResult};
use crate::error::ApiError;
use crate::middleware::Caller;
use crate::state::AppState;

/// POST /api/v1/properties/{id}/verification/{action}
pub async fn apply(
    State(state): State<AppState>,
    Extension(Caller(actor)): Extension<Caller>,
    Path((id, action)): Path<(String, String)>,
) -> ApiResult<Property> {
    let action = VerificationAction::parse(&action)
        .ok_or_else(|| ApiError::BadRequest(format!("Unknown verification action: {}", action)))?;
    ok(state.verification.apply(&actor, &id, action).await?)
}

/// GET /api/v1/verification/admin-queue
pub async fn admin_queue(
    State(state): State<AppState>,
    Extension(Caller(actor)): Extension<Caller>,
) -> ApiResult<Vec<Property>> {
    ok(state.verification.admin_queue(&actor).await?)
}

/// GET /api/v1/verification/council-queue
pub async fn council_queue(
    State(state): State<AppState>,
    Extension(Caller(actor)): Extension<Caller>,
) -> ApiResult<Vec<Property>> {
    ok(state.verification.council_queue(&actor).await?)
}

/// GET /api/v1/verification/{queue}/stream
pub async fn stream_queue(
    State(state): State<AppState>,
    Extension(Caller(actor)): Extension<Caller>,
    Path(queue): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let filter = match queue.as_str() {
        "admin-queue" => PropertyFilter::AdminQueue,
        "council-queue" => PropertyFilter::CouncilQueue,
        other => return Err(ApiError::NotFound(format!("Unknown review queue: {}", other))),
    };
    Ok(snapshot_events(state.verification.subscribe_queue(&actor, filter)?))
}
