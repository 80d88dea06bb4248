use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, params};

use tripwise_core::error::{Result, StoreError};

use crate::store::ConversationStore;
use crate::types::{Conversation, ConversationSummary, Message, MessageRole, NewMessage};

/// SQLite-backed conversation store.
///
/// Thread-safe via `Arc<Mutex<Connection>>`. All SQLite operations are
/// dispatched to a blocking thread via `tokio::task::spawn_blocking`.
pub struct SqliteConversationStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteConversationStore {
    /// Open (or create) a SQLite database at the given path.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path).map_err(|e| StoreError::Open(e.to_string()))?;
        Self::from_connection(conn)
    }

    /// Create an in-memory SQLite database.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| StoreError::Open(e.to_string()))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.create_tables()?;
        tracing::debug!("conversation tables ready");
        Ok(store)
    }

    fn create_tables(&self) -> Result<()> {
        let conn = lock(&self.conn)?;
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
            CREATE TABLE IF NOT EXISTS conversations (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS messages (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                conversation_id TEXT NOT NULL
                    REFERENCES conversations(id) ON DELETE CASCADE,
                role TEXT NOT NULL,
                author_name TEXT,
                content TEXT NOT NULL,
                step_number INTEGER NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_messages_conversation
                ON messages(conversation_id, step_number, seq);",
        )
        .map_err(|e| StoreError::Open(format!("failed to create tables: {e}")))?;
        Ok(())
    }

    /// Run `f` against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = lock(&conn)?;
            f(&conn)
        })
        .await
        .map_err(|e| StoreError::Query(format!("spawn_blocking: {e}")))?
    }
}

fn lock(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>> {
    conn.lock().map_err(|e| {
        tracing::error!("SQLite connection lock poisoned: {e}");
        StoreError::Query(format!("connection lock poisoned: {e}")).into()
    })
}

fn query_err(context: &str) -> impl FnOnce(rusqlite::Error) -> StoreError + '_ {
    move |e| StoreError::Query(format!("{context}: {e}"))
}

/// Fixed-width RFC 3339 so lexical order matches time order.
fn timestamp(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|e| {
            tracing::warn!(value = s, "unreadable timestamp, using now: {e}");
            Utc::now()
        })
}

fn row_to_conversation(row: &rusqlite::Row<'_>) -> rusqlite::Result<Conversation> {
    let created_at: String = row.get(2)?;
    let updated_at: String = row.get(3)?;
    Ok(Conversation {
        id: row.get(0)?,
        title: row.get(1)?,
        created_at: parse_timestamp(&created_at),
        updated_at: parse_timestamp(&updated_at),
    })
}

fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<Message> {
    let role: String = row.get(2)?;
    let step: i64 = row.get(5)?;
    let created_at: String = row.get(6)?;
    Ok(Message {
        id: row.get(0)?,
        conversation_id: row.get(1)?,
        role: role.parse().unwrap_or(MessageRole::Assistant),
        author_name: row.get(3)?,
        content: row.get(4)?,
        step_number: step as u32,
        created_at: parse_timestamp(&created_at),
    })
}

fn ensure_updated(changed: usize, id: &str) -> Result<()> {
    if changed == 0 {
        return Err(StoreError::ConversationNotFound(id.to_string()).into());
    }
    Ok(())
}

#[async_trait]
impl ConversationStore for SqliteConversationStore {
    async fn create_conversation(&self, title: &str) -> Result<Conversation> {
        let conversation = Conversation::new(title);
        let row = conversation.clone();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO conversations (id, title, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    row.id,
                    row.title,
                    timestamp(&row.created_at),
                    timestamp(&row.updated_at),
                ],
            )
            .map_err(query_err("insert conversation"))?;
            Ok(())
        })
        .await?;
        Ok(conversation)
    }

    async fn list_conversations(&self) -> Result<Vec<ConversationSummary>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT c.id, c.title, c.created_at, c.updated_at,
                            (SELECT COUNT(*) FROM messages m WHERE m.conversation_id = c.id)
                     FROM conversations c
                     ORDER BY c.updated_at DESC, c.rowid DESC",
                )
                .map_err(query_err("prepare list"))?;
            let rows = stmt
                .query_map([], |row| {
                    let conversation = row_to_conversation(row)?;
                    let count: i64 = row.get(4)?;
                    Ok(ConversationSummary {
                        id: conversation.id,
                        title: conversation.title,
                        created_at: conversation.created_at,
                        updated_at: conversation.updated_at,
                        message_count: count as u64,
                    })
                })
                .map_err(query_err("list conversations"))?;
            let summaries = rows
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(query_err("read conversation row"))?;
            Ok(summaries)
        })
        .await
    }

    async fn get_conversation(&self, id: &str) -> Result<Option<Conversation>> {
        let id = id.to_string();
        self.with_conn(move |conn| {
            let conversation = conn
                .query_row(
                    "SELECT id, title, created_at, updated_at FROM conversations WHERE id = ?1",
                    params![id],
                    row_to_conversation,
                )
                .optional()
                .map_err(query_err("get conversation"))?;
            Ok(conversation)
        })
        .await
    }

    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<Message>> {
        let conversation_id = conversation_id.to_string();
        self.with_conn(move |conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, conversation_id, role, author_name, content, step_number, created_at
                     FROM messages WHERE conversation_id = ?1
                     ORDER BY step_number ASC, seq ASC",
                )
                .map_err(query_err("prepare messages"))?;
            let rows = stmt
                .query_map(params![conversation_id], row_to_message)
                .map_err(query_err("list messages"))?;
            let messages = rows
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(query_err("read message row"))?;
            Ok(messages)
        })
        .await
    }

    async fn delete_conversation(&self, id: &str) -> Result<bool> {
        let id = id.to_string();
        self.with_conn(move |conn| {
            let deleted = conn
                .execute("DELETE FROM conversations WHERE id = ?1", params![id])
                .map_err(query_err("delete conversation"))?;
            tracing::debug!(conversation = %id, deleted, "conversation delete");
            Ok(deleted > 0)
        })
        .await
    }

    async fn append_message(&self, conversation_id: &str, message: NewMessage) -> Result<Message> {
        let message = message.into_message(conversation_id);
        let row = message.clone();
        self.with_conn(move |conn| {
            let exists: Option<String> = conn
                .query_row(
                    "SELECT id FROM conversations WHERE id = ?1",
                    params![row.conversation_id],
                    |r| r.get(0),
                )
                .optional()
                .map_err(query_err("check conversation"))?;
            if exists.is_none() {
                return Err(StoreError::ConversationNotFound(row.conversation_id).into());
            }
            conn.execute(
                "INSERT INTO messages
                    (id, conversation_id, role, author_name, content, step_number, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    row.id,
                    row.conversation_id,
                    row.role.as_str(),
                    row.author_name,
                    row.content,
                    row.step_number as i64,
                    timestamp(&row.created_at),
                ],
            )
            .map_err(query_err("insert message"))?;
            Ok(())
        })
        .await?;
        Ok(message)
    }

    async fn touch(&self, id: &str) -> Result<()> {
        let id = id.to_string();
        self.with_conn(move |conn| {
            let changed = conn
                .execute(
                    "UPDATE conversations SET updated_at = ?1 WHERE id = ?2",
                    params![timestamp(&Utc::now()), id],
                )
                .map_err(query_err("touch conversation"))?;
            ensure_updated(changed, &id)
        })
        .await
    }

    async fn set_title(&self, id: &str, title: &str) -> Result<()> {
        let id = id.to_string();
        let title = title.to_string();
        self.with_conn(move |conn| {
            let changed = conn
                .execute(
                    "UPDATE conversations SET title = ?1, updated_at = ?2 WHERE id = ?3",
                    params![title, timestamp(&Utc::now()), id],
                )
                .map_err(query_err("rename conversation"))?;
            ensure_updated(changed, &id)
        })
        .await
    }
}
