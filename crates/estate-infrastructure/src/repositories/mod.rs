//! Repository implementations on the realtime tree store

mod collection;
pub mod account_repo_impl;
pub mod chat_repo_impl;
pub mod property_repo_impl;
pub mod transaction_repo_impl;

pub use account_repo_impl::TreeAccountRepository;
pub use chat_repo_impl::TreeChatRepository;
pub use property_repo_impl::TreePropertyRepository;
pub use transaction_repo_impl::TreeTransactionRepository;
