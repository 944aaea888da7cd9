//! Repository traits (ports)

pub mod account_repository;
pub mod chat_repository;
pub mod identity_provider;
pub mod property_repository;
pub mod transaction_repository;

use futures::stream::BoxStream;

use crate::error::DomainError;

pub use account_repository::AccountRepository;
pub use chat_repository::ChatRepository;
pub use identity_provider::IdentityProvider;
pub use property_repository::PropertyRepository;
pub use transaction_repository::TransactionRepository;

/// Live view of a collection: the current snapshot first, then a fresh one
/// after every change. Dropping the stream ends the subscription.
pub type SnapshotStream<T> = BoxStream<'static, Result<T, DomainError>>;

#[cfg(test)]
pub use account_repository::MockAccountRepository;
#[cfg(test)]
pub use chat_repository::MockChatRepository;
#[cfg(test)]
pub use identity_provider::MockIdentityProvider;
#[cfg(test)]
pub use property_repository::MockPropertyRepository;
#[cfg(test)]
pub use transaction_repository::MockTransactionRepository;
