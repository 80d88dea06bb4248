use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;

use tripwise_core::error::{Result, StoreError};

use crate::store::ConversationStore;
use crate::types::{Conversation, ConversationSummary, Message, NewMessage};

struct Record {
    /// Creation order, used to break `updated_at` ties.
    seq: u64,
    conversation: Conversation,
    messages: Vec<Message>,
}

#[derive(Default)]
struct Inner {
    next_seq: u64,
    records: HashMap<String, Record>,
}

/// In-memory conversation store for tests and demo runs.
///
/// Thread-safe via `RwLock`. All data is lost when the store is dropped.
#[derive(Default)]
pub struct MemoryConversationStore {
    inner: RwLock<Inner>,
}

impl MemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|e| StoreError::Query(format!("store lock poisoned: {e}")).into())
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|e| StoreError::Query(format!("store lock poisoned: {e}")).into())
    }

    fn update<F>(&self, id: &str, f: F) -> Result<()>
    where
        F: FnOnce(&mut Conversation),
    {
        let mut inner = self.write()?;
        let record = inner
            .records
            .get_mut(id)
            .ok_or_else(|| StoreError::ConversationNotFound(id.to_string()))?;
        f(&mut record.conversation);
        Ok(())
    }
}

#[async_trait]
impl ConversationStore for MemoryConversationStore {
    async fn create_conversation(&self, title: &str) -> Result<Conversation> {
        let conversation = Conversation::new(title);
        let mut inner = self.write()?;
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.records.insert(
            conversation.id.clone(),
            Record {
                seq,
                conversation: conversation.clone(),
                messages: Vec::new(),
            },
        );
        Ok(conversation)
    }

    async fn list_conversations(&self) -> Result<Vec<ConversationSummary>> {
        let inner = self.read()?;
        let mut records: Vec<&Record> = inner.records.values().collect();
        records.sort_by(|a, b| {
            b.conversation
                .updated_at
                .cmp(&a.conversation.updated_at)
                .then(b.seq.cmp(&a.seq))
        });
        Ok(records
            .into_iter()
            .map(|r| ConversationSummary {
                id: r.conversation.id.clone(),
                title: r.conversation.title.clone(),
                created_at: r.conversation.created_at,
                updated_at: r.conversation.updated_at,
                message_count: r.messages.len() as u64,
            })
            .collect())
    }

    async fn get_conversation(&self, id: &str) -> Result<Option<Conversation>> {
        let inner = self.read()?;
        Ok(inner.records.get(id).map(|r| r.conversation.clone()))
    }

    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<Message>> {
        let inner = self.read()?;
        let mut messages = inner
            .records
            .get(conversation_id)
            .map(|r| r.messages.clone())
            .unwrap_or_default();
        // Stable sort keeps insertion order within a step.
        messages.sort_by_key(|m| m.step_number);
        Ok(messages)
    }

    async fn delete_conversation(&self, id: &str) -> Result<bool> {
        let mut inner = self.write()?;
        Ok(inner.records.remove(id).is_some())
    }

    async fn append_message(&self, conversation_id: &str, message: NewMessage) -> Result<Message> {
        let mut inner = self.write()?;
        let record = inner
            .records
            .get_mut(conversation_id)
            .ok_or_else(|| StoreError::ConversationNotFound(conversation_id.to_string()))?;
        let message = message.into_message(conversation_id);
        record.messages.push(message.clone());
        Ok(message)
    }

    async fn touch(&self, id: &str) -> Result<()> {
        self.update(id, |c| c.updated_at = Utc::now())
    }

    async fn set_title(&self, id: &str, title: &str) -> Result<()> {
        self.update(id, |c| {
            c.title = title.to_string();
            c.updated_at = Utc::now();
        })
    }
}
