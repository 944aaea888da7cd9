// ============================================================================
// Estate Infrastructure - Anonymous Identity Provider
// File: crates/estate-infrastructure/src/identity/anonymous_provider.rs
// ============================================================================

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tracing::{info, warn};
use uuid::Uuid;

use estate_core::domain::{Identity, Session};
use estate_core::error::DomainError;
use estate_core::repositories::IdentityProvider;

use super::jwt::{JwtError, JwtService};

/// Issues a signed session for every anonymous sign-in. User ids are random
/// and carry no profile; the account record is created lazily elsewhere.
pub struct AnonymousIdentityProvider {
    jwt: JwtService,
    online: AtomicBool,
}

impl AnonymousIdentityProvider {
    pub fn new(secret: String, expiry_secs: i64) -> Self {
        Self {
            jwt: JwtService::new(secret, expiry_secs),
            online: AtomicBool::new(true),
        }
    }

    /// While offline every call fails with `AuthUnavailable`.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
        warn!(online, "Identity provider connectivity changed");
    }

    fn ensure_online(&self) -> Result<(), DomainError> {
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(DomainError::AuthUnavailable("identity provider is offline".into()))
        }
    }
}

#[async_trait]
impl IdentityProvider for AnonymousIdentityProvider {
    async fn sign_in_anonymously(&self) -> Result<Session, DomainError> {
        self.ensure_online()?;
        let user_id = Uuid::new_v4().simple().to_string();
        let (token, claims) = self
            .jwt
            .issue(&user_id, true)
            .map_err(|e| DomainError::AuthUnavailable(e.to_string()))?;
        info!(user_id = %user_id, "Anonymous session issued");
        Ok(Session {
            identity: Identity {
                user_id,
                anonymous: claims.anon,
                expires_at: claims.exp,
            },
            token,
        })
    }

    async fn verify_token(&self, token: &str) -> Result<Identity, DomainError> {
        self.ensure_online()?;
        let claims = self.jwt.validate(token).map_err(|e| {
            warn!("Rejected session token: {}", e);
            match e {
                JwtError::TokenExpired => DomainError::denied("Session expired"),
                _ => DomainError::denied("Invalid session token"),
            }
        })?;
        Ok(Identity {
            user_id: claims.sub,
            anonymous: claims.anon,
            expires_at: claims.exp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn signed_in_session_verifies() {
        let provider = AnonymousIdentityProvider::new("secret".into(), 3600);
        let session = provider.sign_in_anonymously().await.unwrap();
        let identity = provider.verify_token(&session.token).await.unwrap();
        assert_eq!(identity, session.identity);
        assert!(identity.anonymous);
    }

    #[tokio::test]
    async fn garbage_token_is_denied() {
        let provider = AnonymousIdentityProvider::new("secret".into(), 3600);
        let err = provider.verify_token("not-a-token").await.unwrap_err();
        assert!(matches!(err, DomainError::PermissionDenied(_)));
    }

    #[tokio::test]
    async fn offline_provider_is_unavailable() {
        let provider = AnonymousIdentityProvider::new("secret".into(), 3600);
        provider.set_online(false);
        assert!(matches!(
            provider.sign_in_anonymously().await,
            Err(DomainError::AuthUnavailable(_))
        ));
    }
}
