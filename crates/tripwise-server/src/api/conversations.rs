use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Json, Router, routing::get};
use serde::Deserialize;

use tripwise_store::types::{ConversationDetail, ConversationSummary, DEFAULT_TITLE};

use crate::error::AppError;
use crate::state::AppState;

const MAX_TITLE_CHARS: usize = 255;

#[derive(Debug, Deserialize)]
pub struct CreateConversationRequest {
    #[serde(default = "default_title")]
    pub title: String,
}

fn default_title() -> String {
    DEFAULT_TITLE.into()
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/conversations",
            get(list_conversations).post(create_conversation),
        )
        .route(
            "/conversations/{id}",
            get(get_conversation).delete(delete_conversation),
        )
}

async fn create_conversation(
    State(state): State<AppState>,
    Json(req): Json<CreateConversationRequest>,
) -> Result<(StatusCode, Json<ConversationDetail>), AppError> {
    if req.title.chars().count() > MAX_TITLE_CHARS {
        return Err(AppError::BadRequest(format!(
            "title must be at most {MAX_TITLE_CHARS} characters"
        )));
    }
    let conversation = state.store.create_conversation(&req.title).await?;
    tracing::info!(conversation = %conversation.id, "conversation created");
    Ok((
        StatusCode::CREATED,
        Json(ConversationDetail {
            conversation,
            messages: Vec::new(),
        }),
    ))
}

async fn list_conversations(
    State(state): State<AppState>,
) -> Result<Json<Vec<ConversationSummary>>, AppError> {
    Ok(Json(state.store.list_conversations().await?))
}

async fn get_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ConversationDetail>, AppError> {
    let conversation = state
        .store
        .get_conversation(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Conversation not found".into()))?;
    let messages = state.store.list_messages(&id).await?;
    Ok(Json(ConversationDetail {
        conversation,
        messages,
    }))
}

async fn delete_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if !state.store.delete_conversation(&id).await? {
        return Err(AppError::NotFound("Conversation not found".into()));
    }
    tracing::info!(conversation = %id, "conversation deleted");
    Ok(StatusCode::NO_CONTENT)
}
