pub mod agent;
pub mod error;
pub mod event;
pub mod pipeline;
pub mod tool;

pub mod prelude {
    pub use crate::agent::{AgentName, AgentSpec, WORKFLOW_NAME, travel_planner_agents};
    pub use crate::error::{PipelineError, Result, StoreError, ToolError, TripwiseError};
    pub use crate::event::{AgentResponse, ChatMessage, EventKind, Payload, PipelineEvent, Role};
    pub use crate::pipeline::{AgentPipeline, EventStream, PipelineSession, SessionResource};
    pub use crate::tool::{Tool, ToolDefinition};
}
