//! Common types

use chrono::Utc;
use uuid::Uuid;

/// Opaque string identifier used for every record key in the store.
pub type EntityId = String;

/// Epoch milliseconds, the timestamp unit of every stored record.
pub type Timestamp = i64;

pub fn new_id() -> EntityId {
    Uuid::new_v4().to_string()
}

pub fn now_millis() -> Timestamp {
    Utc::now().timestamp_millis()
}

/// Returns a timestamp strictly greater than `previous`, even when the wall
/// clock has not advanced (or went backwards) since it was taken.
pub fn next_timestamp(previous: Option<Timestamp>) -> Timestamp {
    let now = now_millis();
    match previous {
        Some(prev) if prev >= now => prev + 1,
        _ => now,
    }
}
