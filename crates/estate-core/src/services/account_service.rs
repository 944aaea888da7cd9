//! Account management: self-service profile and admin operations

use std::sync::Arc;

use tracing::{info, warn};
use validator::Validate;

use crate::domain::{Account, AccountAdminUpdate, AccountPatch, AccountProfile, AccountType, Actor};
use crate::error::DomainError;
use crate::repositories::AccountRepository;

pub struct AccountService {
    accounts: Arc<dyn AccountRepository>,
}

impl AccountService {
    pub fn new(accounts: Arc<dyn AccountRepository>) -> Self {
        Self { accounts }
    }

    pub async fn find(&self, id: &str) -> Result<Option<Account>, DomainError> {
        self.accounts.find_by_id(id).await
    }

    /// Best display name for a user, if the account has one.
    pub async fn display_name(&self, id: &str) -> Result<Option<String>, DomainError> {
        Ok(self.accounts.find_by_id(id).await?.and_then(|a| a.resolved_name()))
    }

    /// The caller's account. Callers without a stored account get an unsaved
    /// tenant record.
    pub async fn me(&self, actor: &Actor) -> Result<Account, DomainError> {
        Ok(self
            .accounts
            .find_by_id(&actor.user_id)
            .await?
            .unwrap_or_else(|| Account {
                id: actor.user_id.clone(),
                username: None,
                email: None,
                account_type: AccountType::default(),
                display_name: None,
                phone: None,
                created_at: 0,
                updated_at: None,
                extra: Default::default(),
            }))
    }

    /// Creates or updates the caller's own account. Tenant, landlord and
    /// technician roles are self-assignable; `admin` only while no admin
    /// exists yet.
    pub async fn update_profile(
        &self,
        actor: &Actor,
        profile: AccountProfile,
    ) -> Result<Account, DomainError> {
        profile.validate()?;
        if let Some(role) = profile.account_type {
            self.check_self_assignment(actor, role).await?;
        }

        let existing = self.accounts.find_by_id(&actor.user_id).await?;
        let now = estate_shared::next_timestamp(existing.as_ref().and_then(|a| a.updated_at));
        let mut patch = AccountPatch::from(profile);
        if existing.is_none() {
            patch.created_at = Some(now);
        }
        patch.updated_at = Some(now);

        self.accounts.upsert_fields(&actor.user_id, patch.to_fields()).await?;
        info!(user_id = %actor.user_id, "Account profile saved");
        self.reload(&actor.user_id).await
    }

    pub async fn list(&self, actor: &Actor) -> Result<Vec<Account>, DomainError> {
        require_admin(actor)?;
        let mut accounts = self.accounts.list().await?;
        accounts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(accounts)
    }

    /// Admin change of another account's email or role.
    pub async fn admin_update(
        &self,
        actor: &Actor,
        id: &str,
        update: AccountAdminUpdate,
    ) -> Result<Account, DomainError> {
        require_admin(actor)?;
        update.validate()?;
        let existing = self
            .accounts
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Account", id))?;

        let mut patch = AccountPatch::from(update);
        if patch.is_empty() {
            return Ok(existing);
        }
        patch.updated_at = Some(estate_shared::next_timestamp(existing.updated_at));
        self.accounts.upsert_fields(id, patch.to_fields()).await?;
        info!(admin_id = %actor.user_id, account_id = %id, "Account updated by admin");
        self.reload(id).await
    }

    pub async fn delete(&self, actor: &Actor, id: &str) -> Result<(), DomainError> {
        require_admin(actor)?;
        if self.accounts.find_by_id(id).await?.is_none() {
            return Err(DomainError::not_found("Account", id));
        }
        self.accounts.delete(id).await?;
        info!(admin_id = %actor.user_id, account_id = %id, "Account deleted");
        Ok(())
    }

    async fn check_self_assignment(&self, actor: &Actor, role: AccountType) -> Result<(), DomainError> {
        if role.is_self_assignable() || role == actor.account_type {
            return Ok(());
        }
        if role == AccountType::Admin {
            let has_admin = self
                .accounts
                .list()
                .await?
                .iter()
                .any(|a| a.account_type == AccountType::Admin);
            if !has_admin {
                warn!(user_id = %actor.user_id, "Bootstrapping first admin account");
                return Ok(());
            }
        }
        warn!(user_id = %actor.user_id, role = role.as_str(), "Rejected self-assigned role");
        Err(DomainError::denied(format!("The {} role is granted by an admin", role.as_str())))
    }

    async fn reload(&self, id: &str) -> Result<Account, DomainError> {
        self.accounts
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Account", id))
    }
}

fn require_admin(actor: &Actor) -> Result<(), DomainError> {
    if actor.is_admin() {
        Ok(())
    } else {
        warn!(user_id = %actor.user_id, "Admin operation refused");
        Err(DomainError::denied("Admin access required"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::MockAccountRepository;

    fn actor(role: AccountType) -> Actor {
        Actor {
            user_id: "u1".into(),
            account_type: role,
            display_name: None,
            email: None,
        }
    }

    fn stored(role: AccountType) -> Account {
        Account {
            id: "u1".into(),
            username: None,
            email: None,
            account_type: role,
            display_name: None,
            phone: None,
            created_at: 1,
            updated_at: Some(1),
            extra: Default::default(),
        }
    }

    #[tokio::test]
    async fn council_role_cannot_be_self_assigned() {
        let svc = AccountService::new(Arc::new(MockAccountRepository::new()));
        let profile = AccountProfile {
            account_type: Some(AccountType::Council),
            ..Default::default()
        };
        let err = svc.update_profile(&actor(AccountType::Tenant), profile).await.unwrap_err();
        assert!(matches!(err, DomainError::PermissionDenied(_)));
    }

    #[tokio::test]
    async fn first_admin_can_bootstrap() {
        let mut repo = MockAccountRepository::new();
        repo.expect_list().returning(|| Ok(vec![stored(AccountType::Tenant)]));
        let mut calls = 0;
        repo.expect_find_by_id().returning(move |_| {
            calls += 1;
            Ok((calls > 1).then(|| stored(AccountType::Admin)))
        });
        repo.expect_upsert_fields()
            .withf(|id, fields| id == "u1" && fields.get("accountType") == Some(&serde_json::json!("admin")))
            .times(1)
            .returning(|_, _| Ok(()));
        let svc = AccountService::new(Arc::new(repo));

        let profile = AccountProfile {
            account_type: Some(AccountType::Admin),
            ..Default::default()
        };
        let account = svc.update_profile(&actor(AccountType::Tenant), profile).await.unwrap();
        assert_eq!(account.account_type, AccountType::Admin);
    }

    #[tokio::test]
    async fn admin_operations_require_admin() {
        let svc = AccountService::new(Arc::new(MockAccountRepository::new()));
        assert!(svc.list(&actor(AccountType::Landlord)).await.is_err());
        assert!(svc.delete(&actor(AccountType::Tenant), "u2").await.is_err());
    }

    #[tokio::test]
    async fn deleting_missing_account_is_not_found() {
        let mut repo = MockAccountRepository::new();
        repo.expect_find_by_id().returning(|_| Ok(None));
        let svc = AccountService::new(Arc::new(repo));
        let err = svc.delete(&actor(AccountType::Admin), "ghost").await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }
}
