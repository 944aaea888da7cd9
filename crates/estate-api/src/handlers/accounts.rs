// ============================================================================
// Estate API - Account Handlers
// File: crates/estate-api/src/handlers/accounts.rs
// ============================================================================

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use estate_core::domain::{Account, AccountAdminUpdate, AccountProfile};

use super::{ok, ApiResult};
use crate::dto::DeletedResponse;
use crate::middleware::Caller;
use crate::state::AppState;

/// GET /api/v1/accounts
pub async fn list(
    State(state): State<AppState>,
    Extension(Caller(actor)): Extension<Caller>,
) -> ApiResult<Vec<Account>> {
    ok(state.accounts.list(&actor).await?)
}

/// PUT /api/v1/accounts/me
pub async fn update_me(
    State(state): State<AppState>,
    Extension(Caller(actor)): Extension<Caller>,
    Json(payload): Json<AccountProfile>,
) -> ApiResult<Account> {
    ok(state.accounts.update_profile(&actor, payload).await?)
}

/// PATCH /api/v1/accounts/{id}
pub async fn admin_update(
    State(state): State<AppState>,
    Extension(Caller(actor)): Extension<Caller>,
    Path(id): Path<String>,
    Json(payload): Json<AccountAdminUpdate>,
) -> ApiResult<Account> {
    ok(state.accounts.admin_update(&actor, &id, payload).await?)
}

/// DELETE /api/v1/accounts/{id}
pub async fn delete(
    State(state): State<AppState>,
    Extension(Caller(actor)): Extension<Caller>,
    Path(id): Path<String>,
) -> ApiResult<DeletedResponse> {
    state.accounts.delete(&actor, &id).await?;
    ok(DeletedResponse { id, deleted: true })
}
