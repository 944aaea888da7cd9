//! Identity provider trait (port)

use async_trait::async_trait;

use crate::domain::{Identity, Session};
use crate::error::DomainError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Provisions a new anonymous user and issues its session token.
    async fn sign_in_anonymously(&self) -> Result<Session, DomainError>;
    /// Validates a session token. Invalid or expired tokens are
    /// `PermissionDenied`; an unreachable provider is `AuthUnavailable`.
    async fn verify_token(&self, token: &str) -> Result<Identity, DomainError>;
}
