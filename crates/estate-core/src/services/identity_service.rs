// ============================================================================
// Estate Core - Identity Service
// File: crates/estate-core/src/services/identity_service.rs
// ============================================================================
//! Resolves the caller of every operation: token → identity → actor.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use estate_shared::constants::DEFAULT_IDENTITY_CACHE_CAPACITY;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::domain::{Actor, Identity, Session};
use crate::error::DomainError;
use crate::repositories::{AccountRepository, IdentityProvider};

/// Caller resolved for a request. `issued_token` is set when no token was
/// presented and a new anonymous identity was provisioned.
#[derive(Debug, Clone)]
pub struct ResolvedCaller {
    pub actor: Actor,
    pub issued_token: Option<String>,
}

pub struct IdentityService {
    provider: Arc<dyn IdentityProvider>,
    accounts: Arc<dyn AccountRepository>,
    cache: RwLock<HashMap<String, Identity>>,
    cache_capacity: usize,
    timeout: Duration,
}

impl IdentityService {
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        accounts: Arc<dyn AccountRepository>,
        timeout: Duration,
    ) -> Self {
        Self {
            provider,
            accounts,
            cache: RwLock::new(HashMap::new()),
            cache_capacity: DEFAULT_IDENTITY_CACHE_CAPACITY,
            timeout,
        }
    }

    /// Upper bound on cached token verifications.
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity.max(1);
        self
    }

    pub async fn sign_in_anonymously(&self) -> Result<Session, DomainError> {
        // Cached on first verification, not at issue.
        let session = self.call(self.provider.sign_in_anonymously()).await?;
        info!(user_id = %session.identity.user_id, "Provisioned anonymous identity");
        Ok(session)
    }

    /// Validates `token`, or provisions a fresh anonymous identity when none
    /// is given. Validated tokens are cached until they expire.
    pub async fn resolve_identity(
        &self,
        token: Option<&str>,
    ) -> Result<(Identity, Option<String>), DomainError> {
        let token = match token.map(str::trim).filter(|t| !t.is_empty()) {
            Some(token) => token,
            None => {
                let session = self.sign_in_anonymously().await?;
                return Ok((session.identity, Some(session.token)));
            }
        };

        if let Some(identity) = self.cached(token).await {
            debug!(user_id = %identity.user_id, "Identity served from cache");
            return Ok((identity, None));
        }

        let identity = self.call(self.provider.verify_token(token)).await.map_err(|e| {
            warn!("Token rejected: {}", e);
            e
        })?;
        self.remember(token, &identity).await;
        Ok((identity, None))
    }

    /// Attaches the stored role to an identity. No account means tenant.
    pub async fn actor_for(&self, identity: &Identity) -> Result<Actor, DomainError> {
        let account = self.accounts.find_by_id(&identity.user_id).await?;
        Ok(Actor::new(identity, account.as_ref()))
    }

    pub async fn resolve_caller(&self, token: Option<&str>) -> Result<ResolvedCaller, DomainError> {
        let (identity, issued_token) = self.resolve_identity(token).await?;
        let actor = self.actor_for(&identity).await?;
        Ok(ResolvedCaller { actor, issued_token })
    }

    async fn call<T>(
        &self,
        fut: impl Future<Output = Result<T, DomainError>>,
    ) -> Result<T, DomainError> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                error!("Identity provider did not answer within {:?}", self.timeout);
                Err(DomainError::AuthUnavailable("identity provider timed out".into()))
            }
        }
    }

    async fn cached(&self, token: &str) -> Option<Identity> {
        let now = now_secs();
        let hit = self.cache.read().await.get(token).cloned();
        match hit {
            Some(identity) if identity.expires_at > now => Some(identity),
            Some(_) => {
                self.cache.write().await.remove(token);
                None
            }
            None => None,
        }
    }

    /// Caches a verified token. When full, expired entries go first, then
    /// the entry closest to expiry.
    async fn remember(&self, token: &str, identity: &Identity) {
        let mut cache = self.cache.write().await;
        if cache.len() >= self.cache_capacity && !cache.contains_key(token) {
            let now = now_secs();
            cache.retain(|_, id| id.expires_at > now);
            if cache.len() >= self.cache_capacity {
                let oldest = cache
                    .iter()
                    .min_by_key(|(_, id)| id.expires_at)
                    .map(|(t, _)| t.clone());
                if let Some(oldest) = oldest {
                    cache.remove(&oldest);
                    debug!("Identity cache full, evicted one entry");
                }
            }
        }
        cache.insert(token.to_string(), identity.clone());
    }
}

fn now_secs() -> i64 {
    estate_shared::now_millis() / 1000
}
