//! Client-facing SSE protocol.
//!
//! Every frame is `event: <type>\ndata: <json>\n\n`. JSON objects are written
//! with `", "` and `": "` separators so frames match the established wire
//! format byte for byte.

use std::io;

use serde::Serialize;
use serde_json::ser::Formatter;

use tripwise_core::agent::{AgentName, WORKFLOW_NAME};

/// One event of the client-facing stream.
///
/// Serializes to the `data` object only; the type tag lives on the
/// `event:` line.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SseEvent {
    WorkflowStarted {
        workflow: String,
    },
    AgentStarted {
        agent: AgentName,
        step: u32,
    },
    AgentCompleted {
        agent: AgentName,
        step: u32,
        output: String,
    },
    WorkflowCompleted {
        final_output: String,
    },
    Error {
        message: String,
    },
}

impl SseEvent {
    pub fn workflow_started() -> Self {
        SseEvent::WorkflowStarted {
            workflow: WORKFLOW_NAME.into(),
        }
    }

    pub fn agent_started(agent: AgentName) -> Self {
        SseEvent::AgentStarted {
            agent,
            step: agent.step(),
        }
    }

    pub fn agent_completed(agent: AgentName, output: impl Into<String>) -> Self {
        SseEvent::AgentCompleted {
            agent,
            step: agent.step(),
            output: output.into(),
        }
    }

    pub fn workflow_completed(final_output: impl Into<String>) -> Self {
        SseEvent::WorkflowCompleted {
            final_output: final_output.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        SseEvent::Error {
            message: message.into(),
        }
    }

    /// The `event:` tag.
    pub fn event_type(&self) -> &'static str {
        match self {
            SseEvent::WorkflowStarted { .. } => "workflow_started",
            SseEvent::AgentStarted { .. } => "agent_started",
            SseEvent::AgentCompleted { .. } => "agent_completed",
            SseEvent::WorkflowCompleted { .. } => "workflow_completed",
            SseEvent::Error { .. } => "error",
        }
    }

    /// Whether this event ends the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SseEvent::WorkflowCompleted { .. } | SseEvent::Error { .. }
        )
    }

    /// The `data` JSON object.
    pub fn data_json(&self) -> String {
        let mut buf = Vec::with_capacity(64);
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, SpacedFormatter);
        if self.serialize(&mut ser).is_err() {
            return "{}".into();
        }
        String::from_utf8(buf).unwrap_or_else(|_| "{}".into())
    }

    /// The complete wire frame, blank-line terminator included.
    pub fn encode(&self) -> String {
        format!("event: {}\ndata: {}\n\n", self.event_type(), self.data_json())
    }
}

/// Compact JSON with a space after each `,` and `:`.
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}
