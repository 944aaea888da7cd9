// ============================================================================
// Estate Infrastructure - Chat Repository
// File: crates/estate-infrastructure/src/repositories/chat_repo_impl.rs
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use serde_json::{Map, Value};
use tracing::error;

use estate_core::domain::{Chat, Message};
use estate_core::error::DomainError;
use estate_core::repositories::{ChatRepository, SnapshotStream};
use estate_shared::constants::{CHATS_PATH, MESSAGES_SEGMENT};

use super::collection::{decode, decode_all, encode, record_path};
use crate::realtime::RealtimeStore;

const CHAT_KIND: &str = "chat";
const MESSAGE_KIND: &str = "message";

pub struct TreeChatRepository {
    store: Arc<RealtimeStore>,
}

impl TreeChatRepository {
    pub fn new(store: Arc<RealtimeStore>) -> Self {
        Self { store }
    }

    fn messages_path(chat_id: &str) -> Result<String, DomainError> {
        Ok(format!("{}/{}", record_path(CHATS_PATH, chat_id)?, MESSAGES_SEGMENT))
    }
}

#[async_trait]
impl ChatRepository for TreeChatRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Chat>, DomainError> {
        let path = record_path(CHATS_PATH, id)?;
        Ok(self.store.get(&path).await?.and_then(|v| decode(CHAT_KIND, id, v)))
    }

    async fn list(&self) -> Result<Vec<Chat>, DomainError> {
        Ok(decode_all(CHAT_KIND, self.store.get(CHATS_PATH).await?))
    }

    async fn create_if_absent(&self, chat: &Chat) -> Result<Chat, DomainError> {
        let path = record_path(CHATS_PATH, &chat.id)?;
        let (stored, _) = self.store.set_if_absent(&path, encode(chat)?).await?;
        decode(CHAT_KIND, &chat.id, stored).ok_or_else(|| {
            error!(chat_id = %chat.id, "Existing chat record is unreadable");
            DomainError::StoreUnavailable(format!("unreadable chat {}", chat.id))
        })
    }

    async fn update_fields(&self, id: &str, fields: Map<String, Value>) -> Result<(), DomainError> {
        let path = record_path(CHATS_PATH, id)?;
        if self.store.update_existing(&path, fields).await? {
            Ok(())
        } else {
            Err(DomainError::not_found("Chat", id))
        }
    }

    async fn append_message(&self, chat_id: &str, message: &Message) -> Result<Message, DomainError> {
        let path = Self::messages_path(chat_id)?;
        let id = self.store.push(&path, encode(message)?).await?;
        Ok(Message { id, ..message.clone() })
    }

    async fn messages(&self, chat_id: &str) -> Result<Vec<Message>, DomainError> {
        let path = Self::messages_path(chat_id)?;
        Ok(decode_all(MESSAGE_KIND, self.store.get(&path).await?))
    }

    fn subscribe(&self) -> SnapshotStream<Vec<Chat>> {
        self.store
            .subscribe(CHATS_PATH)
            .map(|snapshot| {
                snapshot
                    .map(|node| decode_all::<Chat>(CHAT_KIND, node))
                    .map_err(DomainError::from)
            })
            .boxed()
    }

    fn subscribe_messages(&self, chat_id: &str) -> SnapshotStream<Vec<Message>> {
        let path = match Self::messages_path(chat_id) {
            Ok(path) => path,
            Err(e) => return futures::stream::once(async move { Err::<Vec<Message>, _>(e) }).boxed(),
        };
        self.store
            .subscribe(&path)
            .map(|snapshot| {
                snapshot
                    .map(|node| decode_all::<Message>(MESSAGE_KIND, node))
                    .map_err(DomainError::from)
            })
            .boxed()
    }
}
