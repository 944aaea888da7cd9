// ============================================================================
// Estate Core - Chat Entities
// File: crates/estate-core/src/domain/chat.rs
// Description: Tenant/landlord conversations scoped to a property
// ============================================================================

use estate_shared::constants::CHAT_ID_PREFIX;
use estate_shared::{EntityId, Timestamp};
use serde::{Deserialize, Serialize};

use super::account::AccountType;

pub const FALLBACK_TENANT_NAME: &str = "Tenant";
pub const FALLBACK_LANDLORD_NAME: &str = "Landlord";
pub const FALLBACK_PROPERTY_NAME: &str = "Property";

/// Deterministic conversation id for a (tenant, landlord, property) triple.
pub fn chat_id(tenant_id: &str, landlord_id: &str, property_id: &str) -> EntityId {
    format!("{}_{}_{}_{}", CHAT_ID_PREFIX, tenant_id, landlord_id, property_id)
}

/// Chat metadata at `chats/{chatId}`. Messages live in the `messages` child
/// and are read separately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    #[serde(default)]
    pub id: EntityId,
    pub tenant_id: EntityId,
    pub landlord_id: EntityId,
    pub property_id: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landlord_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_name: Option<String>,
    #[serde(default)]
    pub created_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message_time: Option<Timestamp>,
}

impl Chat {
    /// Whether this record is the conversation for exactly this triple.
    /// Ids are joined with `_`, so different triples can derive the same key.
    pub fn is_between(&self, tenant_id: &str, landlord_id: &str, property_id: &str) -> bool {
        self.tenant_id == tenant_id && self.landlord_id == landlord_id && self.property_id == property_id
    }

    pub fn is_participant(&self, user_id: &str) -> bool {
        self.tenant_id == user_id || self.landlord_id == user_id
    }

    /// Which side of the conversation `user_id` is on.
    pub fn side_of(&self, user_id: &str) -> Option<SenderType> {
        if self.tenant_id == user_id {
            Some(SenderType::Tenant)
        } else if self.landlord_id == user_id {
            Some(SenderType::Landlord)
        } else {
            None
        }
    }

    pub fn activity_time(&self) -> Timestamp {
        self.last_message_time.unwrap_or(self.created_at)
    }

    pub fn visible_to(&self, user_id: &str, role: AccountType) -> bool {
        match role {
            AccountType::Tenant => self.tenant_id == user_id,
            AccountType::Landlord => self.landlord_id == user_id,
            _ => self.is_participant(user_id),
        }
    }

    /// Replaces the denormalised names with live ones where known, keeping the
    /// stored copy and then a generic label as fallbacks.
    pub fn with_resolved_names(
        mut self,
        tenant: Option<String>,
        landlord: Option<String>,
        property: Option<String>,
    ) -> Self {
        self.tenant_name = Some(pick(tenant, self.tenant_name.take(), FALLBACK_TENANT_NAME));
        self.landlord_name = Some(pick(landlord, self.landlord_name.take(), FALLBACK_LANDLORD_NAME));
        self.property_name = Some(pick(property, self.property_name.take(), FALLBACK_PROPERTY_NAME));
        self
    }
}

fn pick(live: Option<String>, stored: Option<String>, fallback: &str) -> String {
    live.filter(|s| !s.trim().is_empty())
        .or_else(|| stored.filter(|s| !s.trim().is_empty()))
        .unwrap_or_else(|| fallback.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SenderType {
    Tenant,
    Landlord,
}

/// Message at `chats/{chatId}/messages/{pushId}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(default)]
    pub id: EntityId,
    pub text: String,
    pub sender_id: EntityId,
    pub sender_type: SenderType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_name: Option<String>,
    #[serde(default)]
    pub timestamp: Timestamp,
}

/// Oldest first; push ids break timestamp ties in append order.
pub fn sort_messages(messages: &mut [Message]) {
    messages.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));
}

/// Most recently active first.
pub fn sort_chats(chats: &mut [Chat]) {
    chats.sort_by(|a, b| b.activity_time().cmp(&a.activity_time()));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chat(created: Timestamp, last: Option<Timestamp>) -> Chat {
        Chat {
            id: chat_id("t1", "l1", "p1"),
            tenant_id: "t1".into(),
            landlord_id: "l1".into(),
            property_id: "p1".into(),
            tenant_name: None,
            landlord_name: Some("Stored Landlord".into()),
            property_name: None,
            created_at: created,
            last_message: None,
            last_message_time: last,
        }
    }

    #[test]
    fn derives_chat_id() {
        assert_eq!(chat_id("t1", "l1", "p1"), "chat_t1_l1_p1");
    }

    #[test]
    fn sorts_chats_by_activity() {
        let mut chats = vec![chat(10, None), chat(1, Some(50)), chat(20, None)];
        sort_chats(&mut chats);
        let order: Vec<Timestamp> = chats.iter().map(Chat::activity_time).collect();
        assert_eq!(order, vec![50, 20, 10]);
    }

    #[test]
    fn sorts_messages_with_tie_break() {
        let msg = |id: &str, ts| Message {
            id: id.into(),
            text: "hi".into(),
            sender_id: "t1".into(),
            sender_type: SenderType::Tenant,
            sender_name: None,
            timestamp: ts,
        };
        let mut messages = vec![msg("c", 5), msg("b", 3), msg("a", 5)];
        sort_messages(&mut messages);
        let ids: Vec<&str> = messages.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[test]
    fn resolves_names_with_fallbacks() {
        let c = chat(1, None).with_resolved_names(Some("Ann".into()), None, None);
        assert_eq!(c.tenant_name.as_deref(), Some("Ann"));
        assert_eq!(c.landlord_name.as_deref(), Some("Stored Landlord"));
        assert_eq!(c.property_name.as_deref(), Some(FALLBACK_PROPERTY_NAME));
    }

    #[test]
    fn visibility_follows_role() {
        let c = chat(1, None);
        assert!(c.visible_to("t1", AccountType::Tenant));
        assert!(!c.visible_to("t1", AccountType::Landlord));
        assert!(c.visible_to("l1", AccountType::Landlord));
        assert_eq!(c.side_of("l1"), Some(SenderType::Landlord));
        assert_eq!(c.side_of("x"), None);
    }
}
