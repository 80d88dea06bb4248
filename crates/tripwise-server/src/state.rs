use std::sync::Arc;

use tripwise_core::pipeline::AgentPipeline;
use tripwise_relay::context::DEFAULT_MAX_CONTEXT_CHARS;
use tripwise_store::store::ConversationStore;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ConversationStore>,
    pub pipeline: Arc<dyn AgentPipeline>,
    pub context_max_chars: usize,
}

impl AppState {
    pub fn new(store: Arc<dyn ConversationStore>, pipeline: Arc<dyn AgentPipeline>) -> Self {
        Self {
            store,
            pipeline,
            context_max_chars: DEFAULT_MAX_CONTEXT_CHARS,
        }
    }

    pub fn with_context_max_chars(mut self, max_chars: usize) -> Self {
        self.context_max_chars = max_chars;
        self
    }
}
