//! Chat repository trait (port)

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::SnapshotStream;
use crate::domain::{Chat, Message};
use crate::error::DomainError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Chat>, DomainError>;
    async fn list(&self) -> Result<Vec<Chat>, DomainError>;
    /// Writes `chat` only if nothing exists at its id; returns whichever
    /// record ends up stored.
    async fn create_if_absent(&self, chat: &Chat) -> Result<Chat, DomainError>;
    async fn update_fields(&self, id: &str, fields: Map<String, Value>) -> Result<(), DomainError>;
    /// Appends at a fresh push id and returns the stored message.
    async fn append_message(&self, chat_id: &str, message: &Message) -> Result<Message, DomainError>;
    async fn messages(&self, chat_id: &str) -> Result<Vec<Message>, DomainError>;
    fn subscribe(&self) -> SnapshotStream<Vec<Chat>>;
    fn subscribe_messages(&self, chat_id: &str) -> SnapshotStream<Vec<Message>>;
}
