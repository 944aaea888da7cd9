//! HTTP handlers

pub mod accounts;
pub mod auth;
pub mod chats;
pub mod health;
pub mod properties;
pub mod transactions;
pub mod verification;

use std::convert::Infallible;

use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use estate_core::repositories::SnapshotStream;
use futures::{Stream, StreamExt};
use serde::Serialize;

use crate::error::ApiError;
use crate::response::ApiResponse;

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;
pub type CreatedResult<T> = Result<(StatusCode, Json<ApiResponse<T>>), ApiError>;

pub(crate) fn ok<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::success(data)))
}

pub(crate) fn created<T: Serialize>(data: T) -> CreatedResult<T> {
    Ok((StatusCode::CREATED, Json(ApiResponse::success(data))))
}

fn sse_event<T: Serialize>(event_type: &str, data: &T) -> Event {
    Event::default()
        .event(event_type)
        .data(serde_json::to_string(data).unwrap_or_else(|_| "{}".to_string()))
}

/// Forwards a live view as `snapshot` events. Store failures are sent as an
/// `error` event carrying the error envelope; the subscription stays open.
pub(crate) fn snapshot_events<T>(
    stream: SnapshotStream<T>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>>
where
    T: Serialize + Send + 'static,
{
    let events = stream.map(|snapshot| {
        Ok(match snapshot {
            Ok(data) => sse_event("snapshot", &data),
            Err(e) => {
                let err = ApiError::from(e);
                let (_, code) = err.status_and_code();
                tracing::warn!(code, "Subscription error: {}", err);
                sse_event("error", &ApiResponse::error(code, err.to_string()))
            }
        })
    });
    Sse::new(events).keep_alive(KeepAlive::default())
}
