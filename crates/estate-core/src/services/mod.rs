//! Domain services (business logic)

pub mod account_service;
pub mod chat_service;
pub mod identity_service;
pub mod ledger_service;
pub mod payment_gateway;
pub mod property_service;
pub mod verification_service;

pub use account_service::AccountService;
pub use chat_service::ChatService;
pub use identity_service::{IdentityService, ResolvedCaller};
pub use ledger_service::LedgerService;
pub use payment_gateway::MockPaymentGateway;
pub use property_service::PropertyService;
pub use verification_service::VerificationService;
