// ============================================================================
// Estate Core - Chat Service
// File: crates/estate-core/src/services/chat_service.rs
// ============================================================================
//! Tenant/landlord conversations. Display names are resolved when chats are
//! read, with the copies stored at creation as a fallback.

use std::collections::HashMap;
use std::sync::Arc;

use estate_shared::EntityId;
use futures::StreamExt;
use serde_json::{json, Map};
use tracing::{debug, info, warn};

use crate::domain::{
    chat_id, sort_chats, sort_messages, AccountType, Actor, Chat, Message, FALLBACK_LANDLORD_NAME,
    FALLBACK_TENANT_NAME,
};
use crate::error::DomainError;
use crate::repositories::{AccountRepository, ChatRepository, PropertyRepository, SnapshotStream};

const MAX_MESSAGE_CHARS: usize = 4000;

pub struct ChatService {
    chats: Arc<dyn ChatRepository>,
    accounts: Arc<dyn AccountRepository>,
    properties: Arc<dyn PropertyRepository>,
}

impl ChatService {
    pub fn new(
        chats: Arc<dyn ChatRepository>,
        accounts: Arc<dyn AccountRepository>,
        properties: Arc<dyn PropertyRepository>,
    ) -> Self {
        Self {
            chats,
            accounts,
            properties,
        }
    }

    /// Opens the caller's conversation about a property, creating it on first
    /// use. Concurrent opens converge on the same record.
    pub async fn open_or_create(
        &self,
        actor: &Actor,
        property_id: &str,
        landlord_id: Option<&str>,
    ) -> Result<Chat, DomainError> {
        let property = self
            .properties
            .find_by_id(property_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Property", property_id))?;

        let landlord_id = landlord_id
            .map(str::to_string)
            .or_else(|| property.landlord_id.clone())
            .ok_or_else(|| DomainError::invalid("Property has no landlord to contact"))?;
        if landlord_id == actor.user_id {
            return Err(DomainError::invalid("You cannot open a chat with yourself"));
        }

        let id = chat_id(&actor.user_id, &landlord_id, property_id);
        if let Some(existing) = self.chats.find_by_id(&id).await? {
            let existing = own_chat(existing, &actor.user_id, &landlord_id, property_id)?;
            debug!(chat_id = %id, "Reusing existing chat");
            return Ok(existing);
        }

        let landlord_name = match self.accounts.find_by_id(&landlord_id).await? {
            Some(account) => account.resolved_name(),
            None => None,
        }
        .or_else(|| property.landlord_name.clone());

        let chat = Chat {
            id: id.clone(),
            tenant_id: actor.user_id.clone(),
            landlord_id,
            property_id: property_id.to_string(),
            tenant_name: Some(actor.name_or(FALLBACK_TENANT_NAME)),
            landlord_name: Some(landlord_name.unwrap_or_else(|| FALLBACK_LANDLORD_NAME.to_string())),
            property_name: Some(property.name.clone()),
            created_at: estate_shared::now_millis(),
            last_message: None,
            last_message_time: None,
        };
        let stored = self.chats.create_if_absent(&chat).await?;
        let stored = own_chat(stored, &chat.tenant_id, &chat.landlord_id, property_id)?;
        info!(chat_id = %stored.id, "Chat opened");
        Ok(stored)
    }

    /// Appends a message, then refreshes the chat summary. The summary write
    /// is best effort: its failure is logged and the message still stands.
    pub async fn send_message(
        &self,
        actor: &Actor,
        chat_id: &str,
        text: &str,
    ) -> Result<Message, DomainError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(DomainError::invalid("Message text cannot be empty"));
        }
        if text.chars().count() > MAX_MESSAGE_CHARS {
            return Err(DomainError::invalid(format!(
                "Message cannot exceed {} characters",
                MAX_MESSAGE_CHARS
            )));
        }

        let chat = self.participant_chat(actor, chat_id).await?;
        let sender_type = chat
            .side_of(&actor.user_id)
            .ok_or_else(|| DomainError::denied("Not a participant of this chat"))?;
        let now = estate_shared::next_timestamp(chat.last_message_time);

        let message = Message {
            id: EntityId::new(),
            text: text.to_string(),
            sender_id: actor.user_id.clone(),
            sender_type,
            sender_name: actor.display_name.clone(),
            timestamp: now,
        };
        let stored = self.chats.append_message(chat_id, &message).await?;

        let mut summary = Map::new();
        summary.insert("lastMessage".into(), json!(stored.text));
        summary.insert("lastMessageTime".into(), json!(stored.timestamp));
        if let Err(e) = self.chats.update_fields(chat_id, summary).await {
            warn!(chat_id, message_id = %stored.id, "Chat summary update failed: {}", e);
        }

        debug!(chat_id, message_id = %stored.id, "Message sent");
        Ok(stored)
    }

    pub async fn messages(&self, actor: &Actor, chat_id: &str) -> Result<Vec<Message>, DomainError> {
        self.participant_chat(actor, chat_id).await?;
        let mut messages = self.chats.messages(chat_id).await?;
        sort_messages(&mut messages);
        Ok(messages)
    }

    pub async fn subscribe_messages(
        &self,
        actor: &Actor,
        chat_id: &str,
    ) -> Result<SnapshotStream<Vec<Message>>, DomainError> {
        self.participant_chat(actor, chat_id).await?;
        Ok(self
            .chats
            .subscribe_messages(chat_id)
            .map(|snapshot| {
                snapshot.map(|mut messages| {
                    sort_messages(&mut messages);
                    messages
                })
            })
            .boxed())
    }

    /// Chats for the caller's role, most recently active first, with live
    /// display names.
    pub async fn list_chats(&self, actor: &Actor) -> Result<Vec<Chat>, DomainError> {
        let all = self.chats.list().await?;
        resolve_summaries(
            &self.accounts,
            &self.properties,
            visible(all, &actor.user_id, actor.account_type),
        )
        .await
    }

    pub fn subscribe_chats(&self, actor: &Actor) -> SnapshotStream<Vec<Chat>> {
        let accounts = self.accounts.clone();
        let properties = self.properties.clone();
        let user_id = actor.user_id.clone();
        let role = actor.account_type;
        self.chats
            .subscribe()
            .then(move |snapshot| {
                let accounts = accounts.clone();
                let properties = properties.clone();
                let user_id = user_id.clone();
                async move {
                    let chats = visible(snapshot?, &user_id, role);
                    resolve_summaries(&accounts, &properties, chats).await
                }
            })
            .boxed()
    }

    async fn participant_chat(&self, actor: &Actor, chat_id: &str) -> Result<Chat, DomainError> {
        let chat = self
            .chats
            .find_by_id(chat_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Chat", chat_id))?;
        if chat.is_participant(&actor.user_id) {
            Ok(chat)
        } else {
            warn!(user_id = %actor.user_id, chat_id, "Chat access refused");
            Err(DomainError::denied("Not a participant of this chat"))
        }
    }
}

fn visible(chats: Vec<Chat>, user_id: &str, role: AccountType) -> Vec<Chat> {
    chats.into_iter().filter(|c| c.visible_to(user_id, role)).collect()
}

/// Looks up each distinct account and property once. Lookup failures fall
/// back to the stored names.
async fn resolve_summaries(
    accounts: &Arc<dyn AccountRepository>,
    properties: &Arc<dyn PropertyRepository>,
    chats: Vec<Chat>,
) -> Result<Vec<Chat>, DomainError> {
    let mut names: HashMap<String, Option<String>> = HashMap::new();
    let mut titles: HashMap<String, Option<String>> = HashMap::new();

    for chat in &chats {
        for uid in [&chat.tenant_id, &chat.landlord_id] {
            if !names.contains_key(uid) {
                let name = match accounts.find_by_id(uid).await {
                    Ok(account) => account.and_then(|a| a.resolved_name()),
                    Err(e) => {
                        debug!(user_id = %uid, "Name lookup failed: {}", e);
                        None
                    }
                };
                names.insert(uid.clone(), name);
            }
        }
        if !titles.contains_key(&chat.property_id) {
            let title = match properties.find_by_id(&chat.property_id).await {
                Ok(property) => property.map(|p| p.name),
                Err(e) => {
                    debug!(property_id = %chat.property_id, "Property lookup failed: {}", e);
                    None
                }
            };
            titles.insert(chat.property_id.clone(), title);
        }
    }

    let mut resolved: Vec<Chat> = chats
        .into_iter()
        .map(|chat| {
            let tenant = names.get(&chat.tenant_id).cloned().flatten();
            let landlord = names.get(&chat.landlord_id).cloned().flatten();
            let property = titles.get(&chat.property_id).cloned().flatten();
            chat.with_resolved_names(tenant, landlord, property)
        })
        .collect();
    sort_chats(&mut resolved);
    Ok(resolved)
}

/// Refuses a chat stored under the derived key for a different triple.
fn own_chat(chat: Chat, tenant_id: &str, landlord_id: &str, property_id: &str) -> Result<Chat, DomainError> {
    if chat.is_between(tenant_id, landlord_id, property_id) {
        return Ok(chat);
    }
    warn!(chat_id = %chat.id, tenant_id, property_id, "Chat key collides with another conversation");
    Err(DomainError::denied("Chat belongs to another conversation"))
}
