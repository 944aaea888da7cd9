// ============================================================================
// Estate API - Chat Handlers
// File: crates/estate-api/src/handlers/chats.rs
// ============================================================================

use std::convert::Infallible;

use axum::{
    extract::{Path, State},
    response::sse::{Event, Sse},
    Extension, Json,
};
use estate_core::domain::{Chat, Message};
use futures::Stream;

use super::{created, ok, snapshot_events, ApiResult, CreatedResult};
use crate::dto::{OpenChatRequest, SendMessageRequest};
use crate::error::ApiError;
use crate::middleware::Caller;
use crate::state::AppState;

/// POST /api/v1/chats
pub async fn open(
    State(state): State<AppState>,
    Extension(Caller(actor)): Extension<Caller>,
    Json(payload): Json<OpenChatRequest>,
) -> ApiResult<Chat> {
    let chat = state
        .chats
        .open_or_create(&actor, &payload.property_id, payload.landlord_id.as_deref())
        .await?;
    ok(chat)
}

/// GET /api/v1/chats
pub async fn list(
    State(state): State<AppState>,
    Extension(Caller(actor)): Extension<Caller>,
) -> ApiResult<Vec<Chat>> {
    ok(state.chats.list_chats(&actor).await?)
}

/// GET /api/v1/chats/stream
pub async fn stream_list(
    State(state): State<AppState>,
    Extension(Caller(actor)): Extension<Caller>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    snapshot_events(state.chats.subscribe_chats(&actor))
}

/// GET /api/v1/chats/{id}/messages
pub async fn messages(
    State(state): State<AppState>,
    Extension(Caller(actor)): Extension<Caller>,
    Path(chat_id): Path<String>,
) -> ApiResult<Vec<Message>> {
    ok(state.chats.messages(&actor, &chat_id).await?)
}

/// GET /api/v1/chats/{id}/messages/stream
pub async fn stream_messages(
    State(state): State<AppState>,
    Extension(Caller(actor)): Extension<Caller>,
    Path(chat_id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let stream = state.chats.subscribe_messages(&actor, &chat_id).await?;
    Ok(snapshot_events(stream))
}

/// POST /api/v1/chats/{id}/messages
pub async fn send(
    State(state): State<AppState>,
    Extension(Caller(actor)): Extension<Caller>,
    Path(chat_id): Path<String>,
    Json(payload): Json<SendMessageRequest>,
) -> CreatedResult<Message> {
    let message = state.chats.send_message(&actor, &chat_id, &payload.text).await?;
    created(message)
}
