use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tripwise_core::pipeline::AgentPipeline;
use tripwise_pipeline::remote::RemotePipeline;
use tripwise_pipeline::scripted::ScriptedPipeline;
use tripwise_server::config::{PipelineMode, Settings};
use tripwise_server::state::AppState;
use tripwise_store::memory::MemoryConversationStore;
use tripwise_store::sqlite::SqliteConversationStore;
use tripwise_store::store::ConversationStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tripwise_server=info,tripwise_relay=info".into()),
        )
        .init();

    let settings = Settings::from_env()?;

    let store: Arc<dyn ConversationStore> = if settings.in_memory_store() {
        Arc::new(MemoryConversationStore::new())
    } else {
        Arc::new(SqliteConversationStore::new(&settings.database_path)?)
    };

    let pipeline: Arc<dyn AgentPipeline> = match settings.pipeline_mode {
        PipelineMode::Remote => Arc::new(RemotePipeline::new(
            settings.pipeline_url.as_str(),
            settings.tool_server_url.as_str(),
        )),
        PipelineMode::Demo => Arc::new(ScriptedPipeline::travel_demo()),
    };

    let state = AppState::new(store, pipeline).with_context_max_chars(settings.context_max_chars);
    let app = tripwise_server::app_router(state, &settings.cors_origins);

    let addr = settings.addr()?;
    tracing::info!(
        database = %settings.database_path,
        pipeline = ?settings.pipeline_mode,
        runtime = %settings.pipeline_url,
        tools = %settings.tool_server_url,
        "Travel planner API listening on {addr}"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
