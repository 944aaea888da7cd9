//! Realtime tree store

pub mod bus;
pub mod error;
pub mod metrics;
pub mod push_id;
pub mod store;
pub mod tree;

pub use error::StoreError;
pub use metrics::{MetricsSnapshot, StoreMetrics};
pub use store::{RealtimeStore, ValueStream};
