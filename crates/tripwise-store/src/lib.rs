pub mod memory;
pub mod sqlite;
pub mod store;
pub mod types;

pub mod prelude {
    pub use crate::memory::MemoryConversationStore;
    pub use crate::sqlite::SqliteConversationStore;
    pub use crate::store::ConversationStore;
    pub use crate::types::{
        Conversation, ConversationDetail, ConversationSummary, DEFAULT_TITLE, Message,
        MessageRole, NewMessage,
    };
}
