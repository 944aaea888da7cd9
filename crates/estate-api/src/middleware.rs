//! Caller resolution for protected routes.

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::Response,
};
use estate_core::domain::Actor;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::state::AppState;

/// Response header carrying a token issued for a caller that presented none.
pub const SESSION_TOKEN_HEADER: &str = "x-session-token";

/// The resolved caller, available to handlers as `Extension<Caller>`.
#[derive(Debug, Clone)]
pub struct Caller(pub Actor);

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Resolves `Authorization: Bearer <token>` to an actor. Without a token an
/// anonymous identity is provisioned and its token returned in
/// `x-session-token`.
pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(&request).map(str::to_string);
    let resolved = state.identity.resolve_caller(token.as_deref()).await?;
    debug!(
        user_id = %resolved.actor.user_id,
        role = resolved.actor.account_type.as_str(),
        "Caller resolved"
    );

    request.extensions_mut().insert(Caller(resolved.actor));
    let mut response = next.run(request).await;

    if let Some(issued) = resolved.issued_token {
        match HeaderValue::from_str(&issued) {
            Ok(value) => {
                response.headers_mut().insert(SESSION_TOKEN_HEADER, value);
            }
            Err(e) => warn!("Issued token is not a valid header value: {}", e),
        }
    }
    Ok(response)
}
