use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::Response;
use axum::{Json, Router, routing::post};
use futures::{Stream, StreamExt};
use serde::Deserialize;

use tripwise_relay::context::{ContextTurn, build_context};
use tripwise_relay::relay::{SseStream, relay};
use tripwise_relay::sse::SseEvent;
use tripwise_store::store::ConversationStore;
use tripwise_store::types::{DEFAULT_TITLE, NewMessage};

use crate::error::AppError;
use crate::sse::sse_response;
use crate::state::AppState;

const MAX_CONTENT_CHARS: usize = 4096;
const TITLE_CHARS: usize = 50;

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/conversations/{id}/messages", post(send_message))
}

/// Title derived from the first message of a conversation.
pub fn title_from_message(content: &str) -> String {
    let head: String = content.chars().take(TITLE_CHARS).collect();
    let mut title = head.trim().to_string();
    if content.chars().count() > TITLE_CHARS {
        title.push_str("...");
    }
    title
}

async fn send_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SendMessageRequest>,
) -> Result<Response, AppError> {
    let len = req.content.chars().count();
    if len == 0 || len > MAX_CONTENT_CHARS {
        return Err(AppError::BadRequest(format!(
            "content must be between 1 and {MAX_CONTENT_CHARS} characters"
        )));
    }

    let conversation = state
        .store
        .get_conversation(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Conversation not found".into()))?;

    let history = state.store.list_messages(&id).await?;
    let turns: Vec<ContextTurn<'_>> = history
        .iter()
        .map(|m| ContextTurn::new(m.role.as_str(), m.author_name.as_deref(), &m.content))
        .collect();
    let prefix = build_context(&turns, state.context_max_chars);

    state
        .store
        .append_message(&id, NewMessage::user(req.content.as_str()))
        .await?;
    if conversation.title == DEFAULT_TITLE {
        state
            .store
            .set_title(&id, &title_from_message(&req.content))
            .await?;
    }

    tracing::info!(
        conversation = %id,
        history = history.len(),
        context_chars = prefix.len(),
        "starting travel planner run"
    );
    let query = format!("{prefix}{}", req.content);
    let events = relay(state.pipeline.clone(), query);
    Ok(sse_response(persist_events(state.store.clone(), id, events)))
}

/// Save agent outputs as they stream past.
///
/// Each event is recorded before it is forwarded, so a client that
/// disconnects right after an `agent_completed` frame still has that turn
/// in its history. Persistence failures are logged and never interrupt
/// the stream.
pub fn persist_events(
    store: Arc<dyn ConversationStore>,
    conversation_id: String,
    mut events: SseStream,
) -> impl Stream<Item = SseEvent> + Send {
    async_stream::stream! {
        while let Some(event) = events.next().await {
            record(store.as_ref(), &conversation_id, &event).await;
            yield event;
        }
    }
}

async fn record(store: &dyn ConversationStore, conversation_id: &str, event: &SseEvent) {
    let result = match event {
        SseEvent::AgentCompleted {
            agent,
            step,
            output,
        } if !output.trim().is_empty() => store
            .append_message(
                conversation_id,
                NewMessage::agent(agent.as_str(), *step, output.as_str()),
            )
            .await
            .map(|_| ()),
        SseEvent::WorkflowCompleted { .. } => store.touch(conversation_id).await,
        _ => Ok(()),
    };
    if let Err(e) = result {
        tracing::warn!(
            conversation = conversation_id,
            event = event.event_type(),
            error = %e,
            "failed to persist agent event"
        );
    }
}
