//! Domain entities

pub mod account;
pub mod chat;
pub mod payment;
pub mod property;
pub mod transaction;
pub mod verification;

pub use account::*;
pub use chat::*;
pub use payment::*;
pub use property::*;
pub use transaction::*;
pub use verification::*;
