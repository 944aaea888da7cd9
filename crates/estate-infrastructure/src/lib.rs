//! # Estate Infrastructure
//!
//! Realtime tree store, the repositories built on it, and the anonymous
//! identity provider (adapters).

pub mod identity;
pub mod realtime;
pub mod repositories;

pub use identity::AnonymousIdentityProvider;
pub use realtime::{RealtimeStore, StoreError, StoreMetrics};
pub use repositories::{
    TreeAccountRepository, TreeChatRepository, TreePropertyRepository, TreeTransactionRepository,
};
