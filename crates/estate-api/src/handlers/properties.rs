// ============================================================================
// Estate API - Property Handlers
// File: crates/estate-api/src/handlers/properties.rs
// ============================================================================

use std::convert::Infallible;

use axum::{
    extract::{Path, State},
    response::sse::{Event, Sse},
    Extension, Json,
};
use estate_core::domain::{Property, PropertyFilter, PropertyUpdate};
use futures::Stream;

use super::{created, ok, snapshot_events, ApiResult, CreatedResult};
use crate::dto::{CreatePropertyRequest, DeletedResponse};
use crate::middleware::Caller;
use crate::state::AppState;

/// GET /api/v1/properties
pub async fn list_listed(State(state): State<AppState>) -> ApiResult<Vec<Property>> {
    ok(state.properties.tenant_listings().await?)
}

/// GET /api/v1/properties/mine
pub async fn list_mine(
    State(state): State<AppState>,
    Extension(Caller(actor)): Extension<Caller>,
) -> ApiResult<Vec<Property>> {
    ok(state.properties.owned_by(&actor).await?)
}

/// GET /api/v1/properties/stream
pub async fn stream_listed(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    snapshot_events(state.properties.subscribe(PropertyFilter::TenantVisible))
}

/// POST /api/v1/properties
pub async fn create(
    State(state): State<AppState>,
    Extension(Caller(actor)): Extension<Caller>,
    Json(payload): Json<CreatePropertyRequest>,
) -> CreatedResult<Property> {
    let property = state
        .properties
        .create(&actor, payload.property, payload.payment)
        .await?;
    created(property)
}

/// GET /api/v1/properties/{id}
pub async fn get(
    State(state): State<AppState>,
    Extension(Caller(actor)): Extension<Caller>,
    Path(id): Path<String>,
) -> ApiResult<Property> {
    ok(state.properties.get_for(&actor, &id).await?)
}

/// PATCH /api/v1/properties/{id}
pub async fn update(
    State(state): State<AppState>,
    Extension(Caller(actor)): Extension<Caller>,
    Path(id): Path<String>,
    Json(payload): Json<PropertyUpdate>,
) -> ApiResult<Property> {
    ok(state.properties.update(&actor, &id, payload).await?)
}

/// DELETE /api/v1/properties/{id}
pub async fn delete(
    State(state): State<AppState>,
    Extension(Caller(actor)): Extension<Caller>,
    Path(id): Path<String>,
) -> ApiResult<DeletedResponse> {
    state.properties.delete(&actor, &id).await?;
    ok(DeletedResponse { id, deleted: true })
}
