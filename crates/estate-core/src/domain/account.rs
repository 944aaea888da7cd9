// ============================================================================
// Estate Core - Account Entity
// File: crates/estate-core/src/domain/account.rs
// Description: Accounts, roles and the resolved caller
// ============================================================================

use estate_shared::{EntityId, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

use super::property::Property;

/// Account role stored as `accountType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Admin,
    Landlord,
    #[default]
    Tenant,
    Technician,
    Council,
    Government,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Admin => "admin",
            AccountType::Landlord => "landlord",
            AccountType::Tenant => "tenant",
            AccountType::Technician => "technician",
            AccountType::Council => "council",
            AccountType::Government => "government",
        }
    }

    /// Council and government reviewers share the second review stage.
    pub fn is_government(&self) -> bool {
        matches!(self, AccountType::Council | AccountType::Government)
    }

    /// Roles a user may pick for themselves. The rest are granted by an admin.
    pub fn is_self_assignable(&self) -> bool {
        matches!(
            self,
            AccountType::Tenant | AccountType::Landlord | AccountType::Technician
        )
    }
}

/// Account record at `accounts/{uid}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    #[serde(default)]
    pub id: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub account_type: AccountType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default)]
    pub created_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Account {
    /// Best available human name: display name, then username, then the
    /// local part of the email.
    pub fn resolved_name(&self) -> Option<String> {
        non_blank(self.display_name.as_deref())
            .or_else(|| non_blank(self.username.as_deref()))
            .or_else(|| {
                self.email
                    .as_deref()
                    .and_then(|e| e.split('@').next())
                    .and_then(|local| non_blank(Some(local)))
            })
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// A resolved, authenticated user id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub user_id: EntityId,
    pub anonymous: bool,
    pub expires_at: i64,
}

/// Identity plus a freshly issued token.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub identity: Identity,
    pub token: String,
}

/// The caller of a service operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub user_id: EntityId,
    pub account_type: AccountType,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

impl Actor {
    pub fn new(identity: &Identity, account: Option<&Account>) -> Self {
        Self {
            user_id: identity.user_id.clone(),
            account_type: account.map(|a| a.account_type).unwrap_or_default(),
            display_name: account.and_then(Account::resolved_name),
            email: account.and_then(|a| a.email.clone()),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.account_type == AccountType::Admin
    }

    /// Admins manage every property; landlords only their own.
    pub fn can_manage(&self, property: &Property) -> bool {
        self.is_admin()
            || (self.account_type == AccountType::Landlord && property.is_owned_by(&self.user_id))
    }

    pub fn name_or(&self, fallback: &str) -> String {
        self.display_name.clone().unwrap_or_else(|| fallback.to_string())
    }
}

/// Self-service profile update (`PUT /accounts/me`).
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AccountProfile {
    #[validate(length(min = 1, max = 50, message = "Username must be 1-50 characters"))]
    pub username: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    #[validate(length(max = 100))]
    pub display_name: Option<String>,
    #[validate(length(max = 30))]
    pub phone: Option<String>,
    pub account_type: Option<AccountType>,
}

/// Admin-side account change: email and role only.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AccountAdminUpdate {
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub account_type: Option<AccountType>,
}

/// Merge patch for `accounts/{uid}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_type: Option<AccountType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

impl AccountPatch {
    pub fn to_fields(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.to_fields().is_empty()
    }
}

impl From<AccountProfile> for AccountPatch {
    fn from(profile: AccountProfile) -> Self {
        Self {
            username: profile.username.map(|u| u.trim().to_string()),
            email: profile.email.map(|e| e.trim().to_lowercase()),
            account_type: profile.account_type,
            display_name: profile.display_name.map(|d| d.trim().to_string()),
            phone: profile.phone,
            ..Default::default()
        }
    }
}

impl From<AccountAdminUpdate> for AccountPatch {
    fn from(update: AccountAdminUpdate) -> Self {
        Self {
            email: update.email.map(|e| e.trim().to_lowercase()),
            account_type: update.account_type,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(display: Option<&str>, username: Option<&str>, email: Option<&str>) -> Account {
        Account {
            id: "u1".into(),
            username: username.map(Into::into),
            email: email.map(Into::into),
            account_type: AccountType::Tenant,
            display_name: display.map(Into::into),
            phone: None,
            created_at: 0,
            updated_at: None,
            extra: Map::new(),
        }
    }

    #[test]
    fn resolves_names_in_preference_order() {
        assert_eq!(
            account(Some("Ann"), Some("ann01"), Some("ann@x.cm")).resolved_name().as_deref(),
            Some("Ann")
        );
        assert_eq!(
            account(Some("  "), Some("ann01"), None).resolved_name().as_deref(),
            Some("ann01")
        );
        assert_eq!(
            account(None, None, Some("ann@x.cm")).resolved_name().as_deref(),
            Some("ann")
        );
        assert_eq!(account(None, None, None).resolved_name(), None);
    }

    #[test]
    fn missing_account_type_defaults_to_tenant() {
        let a: Account = serde_json::from_value(serde_json::json!({ "email": "a@b.cm" })).unwrap();
        assert_eq!(a.account_type, AccountType::Tenant);

        let identity = Identity { user_id: "u9".into(), anonymous: true, expires_at: 0 };
        let actor = Actor::new(&identity, None);
        assert_eq!(actor.account_type, AccountType::Tenant);
        assert!(!actor.is_admin());
    }

    #[test]
    fn privileged_roles_are_not_self_assignable() {
        assert!(AccountType::Landlord.is_self_assignable());
        assert!(!AccountType::Admin.is_self_assignable());
        assert!(!AccountType::Council.is_self_assignable());
        assert!(AccountType::Government.is_government());
    }

    #[test]
    fn profile_patch_normalizes_email() {
        let patch: AccountPatch = AccountProfile {
            email: Some(" Ann@X.cm ".into()),
            ..Default::default()
        }
        .into();
        assert_eq!(patch.email.as_deref(), Some("ann@x.cm"));
        assert_eq!(patch.to_fields().len(), 1);
    }
}
