use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing::get, routing::post};
use serde_json::{Value, json};

use tripwise_core::error::{ToolError, TripwiseError};
use tripwise_core::tool::ToolDefinition;

use crate::tools::TravelTools;

/// Tool-server error mapped to an HTTP response.
#[derive(Debug)]
pub struct ToolServerError(TripwiseError);

impl From<TripwiseError> for ToolServerError {
    fn from(err: TripwiseError) -> Self {
        ToolServerError(err)
    }
}

impl IntoResponse for ToolServerError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            TripwiseError::Tool(ToolError::NotFound(_)) => StatusCode::NOT_FOUND,
            TripwiseError::Tool(ToolError::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

pub fn router() -> Router {
    router_with_tools(Arc::new(TravelTools::all()))
}

pub fn router_with_tools(tools: Arc<TravelTools>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/tools", get(list_tools))
        .route("/tools/{name}", post(call_tool))
        .with_state(tools)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy", "service": "travel-mcp-tools" }))
}

async fn list_tools(State(tools): State<Arc<TravelTools>>) -> Json<Vec<ToolDefinition>> {
    Json(tools.definitions())
}

async fn call_tool(
    State(tools): State<Arc<TravelTools>>,
    Path(name): Path<String>,
    Json(input): Json<Value>,
) -> Result<Json<Value>, ToolServerError> {
    let tool = tools
        .get(&name)
        .ok_or_else(|| TripwiseError::from(ToolError::NotFound(name.clone())))?;
    let result = tool.call(input).await?;
    tracing::info!(tool = %name, result_len = result.len(), "tool called");
    Ok(Json(json!({ "result": result })))
}
