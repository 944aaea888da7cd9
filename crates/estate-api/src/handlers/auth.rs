// ============================================================================
// Estate API - Auth Handlers
// File: crates/estate-api/src/handlers/auth.rs
// ============================================================================

use axum::{extract::State, Extension};
use estate_core::domain::{Account, Session};

use super::{ok, ApiResult};
use crate::middleware::Caller;
use crate::state::AppState;

/// POST /api/v1/auth/anonymous
pub async fn sign_in_anonymously(State(state): State<AppState>) -> ApiResult<Session> {
    ok(state.identity.sign_in_anonymously().await?)
}

/// GET /api/v1/me
pub async fn me(
    State(state): State<AppState>,
    Extension(Caller(actor)): Extension<Caller>,
) -> ApiResult<Account> {
    ok(state.accounts.me(&actor).await?)
}
