pub mod aggregate;
pub mod clean;
pub mod context;
pub mod extract;
pub mod relay;
pub mod sse;

pub mod prelude {
    pub use crate::aggregate::{AgentBuffer, Aggregator};
    pub use crate::clean::clean_output;
    pub use crate::context::{ContextTurn, DEFAULT_MAX_CONTEXT_CHARS, build_context};
    pub use crate::extract::{extract_text, last_assistant_text, terminal_text};
    pub use crate::relay::{SseStream, error_message, relay};
    pub use crate::sse::SseEvent;
}
