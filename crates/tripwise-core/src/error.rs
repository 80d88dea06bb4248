use thiserror::Error;

/// Top-level error type for the Tripwise crates.
#[derive(Debug, Error)]
pub enum TripwiseError {
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

/// Failures raised by the external agent pipeline or its transport.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to reach agent runtime: {0}")]
    Connect(String),

    #[error("agent runtime returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("stream interrupted: {0}")]
    Transport(String),

    #[error("malformed event: {0}")]
    Decode(String),

    #[error("tool server unavailable: {0}")]
    ToolConnection(String),

    #[error("{0}")]
    Runtime(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to open database: {0}")]
    Open(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("Conversation not found: {0}")]
    ConversationNotFound(String),
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, TripwiseError>;
