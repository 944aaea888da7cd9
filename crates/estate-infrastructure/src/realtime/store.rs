// ============================================================================
// Estate Infrastructure - Realtime Tree Store
// File: crates/estate-infrastructure/src/realtime/store.rs
// ============================================================================
//! In-process hierarchical JSON store with path-scoped live subscriptions.
//!
//! Every operation runs under a client-imposed timeout and fails fast with
//! `StoreError::Unavailable` while the store is marked offline. There are no
//! automatic retries.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use estate_shared::config::StoreSettings;
use futures::stream::BoxStream;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tracing::{debug, error, warn};

use super::bus::PubSubBus;
use super::error::StoreError;
use super::metrics::{MetricsSnapshot, StoreMetrics};
use super::push_id::PushIdGenerator;
use super::tree;

pub type ValueStream = BoxStream<'static, Result<Option<Value>, StoreError>>;

pub struct RealtimeStore {
    root: RwLock<Value>,
    bus: PubSubBus,
    ids: PushIdGenerator,
    online: AtomicBool,
    latency_ms: AtomicU64,
    op_timeout: Duration,
    metrics: Arc<StoreMetrics>,
}

impl RealtimeStore {
    pub fn new(pubsub_capacity: usize, op_timeout: Duration) -> Self {
        let metrics = Arc::new(StoreMetrics::default());
        Self {
            root: RwLock::new(Value::Object(Map::new())),
            bus: PubSubBus::new(pubsub_capacity, metrics.clone()),
            ids: PushIdGenerator::default(),
            online: AtomicBool::new(true),
            latency_ms: AtomicU64::new(0),
            op_timeout,
            metrics,
        }
    }

    pub fn from_settings(settings: &StoreSettings) -> Self {
        Self::new(
            settings.pubsub_capacity,
            Duration::from_millis(settings.op_timeout_ms),
        )
    }

    /// Marks the store reachable or not. While offline every operation
    /// fails with `Unavailable`.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
        warn!(online, "Store connectivity changed");
    }

    /// Artificial round-trip delay applied before each operation.
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn push_id(&self) -> String {
        self.ids.next_id()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot(self.bus.topic_count())
    }

    pub async fn get(&self, path: &str) -> Result<Option<Value>, StoreError> {
        let segments = tree::split_path(path)?;
        self.read(&segments).await
    }

    /// Replaces the node at `path`. `null` deletes it.
    pub async fn set(&self, path: &str, value: Value) -> Result<(), StoreError> {
        let segments = tree::split_path(path)?;
        self.write("set", &segments, |root| {
            tree::set(root, &segments, value);
            Ok(())
        })
        .await
    }

    /// Merge patch: each field is written independently below `path`.
    pub async fn update(&self, path: &str, fields: Map<String, Value>) -> Result<(), StoreError> {
        let segments = tree::split_path(path)?;
        self.write("update", &segments, |root| tree::update(root, &segments, fields))
            .await
    }

    /// Merge patch that only applies when the node exists. Returns false,
    /// writing nothing, when it does not.
    pub async fn update_existing(
        &self,
        path: &str,
        fields: Map<String, Value>,
    ) -> Result<bool, StoreError> {
        let segments = tree::split_path(path)?;
        self.write("update", &segments, |root| {
            if tree::get(root, &segments).is_none() {
                return Ok(false);
            }
            tree::update(root, &segments, fields)?;
            Ok(true)
        })
        .await
    }

    pub async fn remove(&self, path: &str) -> Result<(), StoreError> {
        let segments = tree::split_path(path)?;
        self.write("remove", &segments, |root| {
            tree::remove(root, &segments);
            Ok(())
        })
        .await
    }

    /// Appends `value` under a fresh push id and returns the id.
    pub async fn push(&self, path: &str, value: Value) -> Result<String, StoreError> {
        let mut segments = tree::split_path(path)?;
        let id = self.push_id();
        segments.push(id.clone());
        self.write("push", &segments, |root| {
            tree::set(root, &segments, value);
            Ok(())
        })
        .await?;
        Ok(id)
    }

    /// Writes `value` only when nothing exists at `path`. Returns the stored
    /// value and whether this call wrote it.
    pub async fn set_if_absent(&self, path: &str, value: Value) -> Result<(Value, bool), StoreError> {
        let segments = tree::split_path(path)?;
        self.write("set_if_absent", &segments, |root| {
            if let Some(existing) = tree::get(root, &segments) {
                return Ok((existing.clone(), false));
            }
            tree::set(root, &segments, value);
            let stored = tree::get(root, &segments).cloned().unwrap_or(Value::Null);
            Ok((stored, true))
        })
        .await
    }

    /// Live view of `path`: the current value first, then the fresh value
    /// after every change at, above or below it. Notifications that pile up
    /// are coalesced into one re-read. Dropping the stream unsubscribes.
    pub fn subscribe(self: &Arc<Self>, path: &str) -> ValueStream {
        let store = Arc::clone(self);
        let segments = tree::split_path(path);

        Box::pin(async_stream::stream! {
            let segments = match segments {
                Ok(s) => s,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };
            let topic = tree::join_path(&segments);
            let mut rx = store.bus.subscribe(&topic);
            debug!(topic = %topic, "Subscription opened");

            yield store.read(&segments).await;

            loop {
                match rx.recv().await {
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        store.metrics.inc_lagged();
                        debug!(topic = %topic, skipped, "Subscriber lagged, re-reading");
                    }
                    Err(RecvError::Closed) => break,
                }
                loop {
                    match rx.try_recv() {
                        Ok(_) | Err(TryRecvError::Lagged(_)) => continue,
                        Err(_) => break,
                    }
                }
                yield store.read(&segments).await;
            }
        })
    }

    async fn read(&self, segments: &[String]) -> Result<Option<Value>, StoreError> {
        self.round_trip("get").await?;
        let root = self.root.read();
        Ok(tree::get(&root, segments).cloned())
    }

    async fn write<T>(
        &self,
        op: &str,
        segments: &[String],
        apply: impl FnOnce(&mut Value) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        self.round_trip(op).await?;
        let result = {
            let mut root = self.root.write();
            apply(&mut root)?
        };
        self.metrics.inc_writes();
        self.bus.publish(&tree::join_path(segments));
        Ok(result)
    }

    /// Connectivity check plus simulated latency, bounded by the op timeout.
    async fn round_trip(&self, op: &str) -> Result<(), StoreError> {
        if !self.online.load(Ordering::SeqCst) {
            error!(op, "Store unavailable");
            return Err(StoreError::Unavailable);
        }
        let latency = Duration::from_millis(self.latency_ms.load(Ordering::SeqCst));
        if latency.is_zero() {
            return Ok(());
        }
        match tokio::time::timeout(self.op_timeout, tokio::time::sleep(latency)).await {
            Ok(()) => Ok(()),
            Err(_) => {
                self.metrics.inc_timeouts();
                error!(op, timeout_ms = self.op_timeout.as_millis() as u64, "Store operation timed out");
                Err(StoreError::Timeout(op.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use serde_json::json;

    fn store() -> Arc<RealtimeStore> {
        Arc::new(RealtimeStore::new(16, Duration::from_millis(200)))
    }

    #[tokio::test]
    async fn push_appends_in_order() {
        let s = store();
        let a = s.push("chats/c1/messages", json!({"text": "a"})).await.unwrap();
        let b = s.push("chats/c1/messages", json!({"text": "b"})).await.unwrap();
        assert!(b > a);
        let all = s.get("chats/c1/messages").await.unwrap().unwrap();
        assert_eq!(all.as_object().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn set_if_absent_keeps_first_writer() {
        let s = store();
        let (_, created) = s.set_if_absent("chats/c1", json!({"n": 1})).await.unwrap();
        assert!(created);
        let (stored, created) = s.set_if_absent("chats/c1", json!({"n": 2})).await.unwrap();
        assert!(!created);
        assert_eq!(stored, json!({"n": 1}));
    }

    #[tokio::test]
    async fn offline_store_fails_fast() {
        let s = store();
        s.set_online(false);
        assert_eq!(s.get("properties").await, Err(StoreError::Unavailable));
        assert_eq!(s.set("properties/p1", json!({"a": 1})).await, Err(StoreError::Unavailable));
        s.set_online(true);
        assert_eq!(s.get("properties/p1").await, Ok(None));
    }

    #[tokio::test]
    async fn slow_round_trip_times_out() {
        let s = store();
        s.set_latency(Duration::from_millis(1_000));
        let err = s.set("properties/p1", json!({"a": 1})).await.unwrap_err();
        assert_eq!(err, StoreError::Timeout("set".into()));
        s.set_latency(Duration::ZERO);
        assert_eq!(s.get("properties/p1").await, Ok(None));
    }

    #[tokio::test]
    async fn subscription_emits_snapshot_then_changes() {
        let s = store();
        s.set("properties/p1", json!({"name": "A"})).await.unwrap();

        let mut sub = s.subscribe("properties");
        let first = sub.next().await.unwrap().unwrap().unwrap();
        assert_eq!(first["p1"]["name"], json!("A"));

        s.set("properties/p2", json!({"name": "B"})).await.unwrap();
        let second = sub.next().await.unwrap().unwrap().unwrap();
        assert_eq!(second.as_object().unwrap().len(), 2);

        drop(sub);
        s.set("accounts/u1", json!({"accountType": "tenant"})).await.unwrap();
        assert_eq!(s.metrics().topics, 0);
    }

    #[tokio::test]
    async fn invalid_paths_are_rejected() {
        let s = store();
        assert!(matches!(s.get("properties/a.b").await, Err(StoreError::InvalidPath(_))));
    }
}
