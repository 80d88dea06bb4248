use async_trait::async_trait;

use tripwise_core::error::Result;

use crate::types::{Conversation, ConversationSummary, Message, NewMessage};

/// Async storage backend for conversations and their turns.
///
/// Implementations must be thread-safe (`Send + Sync`).
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Create an empty conversation.
    async fn create_conversation(&self, title: &str) -> Result<Conversation>;

    /// All conversations with message counts, most recently updated first.
    async fn list_conversations(&self) -> Result<Vec<ConversationSummary>>;

    async fn get_conversation(&self, id: &str) -> Result<Option<Conversation>>;

    /// Turns of a conversation ordered by step number, then insertion order.
    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<Message>>;

    /// Delete a conversation and its messages. Returns `false` when absent.
    async fn delete_conversation(&self, id: &str) -> Result<bool>;

    /// Append a turn. Fails with `ConversationNotFound` when absent.
    async fn append_message(&self, conversation_id: &str, message: NewMessage) -> Result<Message>;

    /// Bump `updated_at` to now.
    async fn touch(&self, id: &str) -> Result<()>;

    /// Rename a conversation and bump `updated_at`.
    async fn set_title(&self, id: &str, title: &str) -> Result<()>;
}
