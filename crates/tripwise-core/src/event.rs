//! Raw lifecycle events produced by the external agent runtime.
//!
//! The runtime emits one JSON object per event:
//! `{"type": "executor_invoked", "executor_id": "Researcher", "data": ...}`.
//! `data` is heterogeneous; it is decoded into the closed [`Payload`] enum.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Lifecycle event kind. Unknown tags decode to [`EventKind::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    ExecutorInvoked,
    ExecutorCompleted,
    Output,
    #[serde(other)]
    Other,
}

/// Author role of a chat message inside a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
    #[serde(other)]
    Other,
}

impl Role {
    fn parse(s: &str) -> Self {
        match s {
            "system" => Role::System,
            "user" => Role::User,
            "assistant" => Role::Assistant,
            "tool" => Role::Tool,
            _ => Role::Other,
        }
    }
}

/// A message-like object carrying text.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: Option<Role>,
    pub text: String,
}

impl ChatMessage {
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Some(Role::Assistant),
            text: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Some(Role::User),
            text: text.into(),
        }
    }

    pub fn tool(text: impl Into<String>) -> Self {
        Self {
            role: Some(Role::Tool),
            text: text.into(),
        }
    }

    /// Authored by the assistant, or with no role at all.
    pub fn is_assistant_like(&self) -> bool {
        matches!(self.role, None | Some(Role::Assistant))
    }
}

/// A rich agent response: the aggregated reply text plus its transcript.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AgentResponse {
    pub text: Option<String>,
    pub messages: Vec<ChatMessage>,
}

/// Event payload in one of the shapes the runtime produces.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(from = "Value")]
pub enum Payload {
    #[default]
    Empty,
    Text(String),
    Response(AgentResponse),
    Message(ChatMessage),
    List(Vec<Payload>),
}

impl Payload {
    pub fn text(s: impl Into<String>) -> Self {
        Payload::Text(s.into())
    }

    pub fn list(items: impl IntoIterator<Item = Payload>) -> Self {
        Payload::List(items.into_iter().collect())
    }

    pub fn messages(messages: impl IntoIterator<Item = ChatMessage>) -> Self {
        Payload::List(messages.into_iter().map(Payload::Message).collect())
    }

    pub fn response(text: Option<&str>, messages: Vec<ChatMessage>) -> Self {
        Payload::Response(AgentResponse {
            text: text.map(str::to_string),
            messages,
        })
    }
}

fn string_field<'a>(obj: &'a serde_json::Map<String, Value>, key: &str) -> Option<&'a str> {
    obj.get(key).and_then(Value::as_str)
}

fn message_from_object(obj: &serde_json::Map<String, Value>) -> Option<ChatMessage> {
    let text = string_field(obj, "text");
    let text = text
        .filter(|t| !t.is_empty())
        .or_else(|| string_field(obj, "content"))
        .or(text)?;
    Some(ChatMessage {
        role: string_field(obj, "role").map(Role::parse),
        text: text.to_string(),
    })
}

fn response_from_object(obj: &serde_json::Map<String, Value>) -> AgentResponse {
    let messages = obj
        .get("messages")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_object)
                .filter_map(message_from_object)
                .collect()
        })
        .unwrap_or_default();
    AgentResponse {
        text: string_field(obj, "text").map(str::to_string),
        messages,
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Payload::Empty,
            Value::String(s) => Payload::Text(s),
            Value::Array(items) => Payload::List(items.into_iter().map(Payload::from).collect()),
            Value::Object(obj) => {
                let wrapped = obj
                    .get("agent_response")
                    .or_else(|| obj.get("response"))
                    .and_then(Value::as_object);
                if let Some(inner) = wrapped {
                    let response = response_from_object(inner);
                    let blank = response.text.as_deref().is_none_or(|t| t.trim().is_empty());
                    // A blank wrapper defers to the object's own assistant text.
                    match message_from_object(&obj) {
                        Some(own) if blank && own.is_assistant_like() && !own.text.trim().is_empty() => {
                            Payload::Message(own)
                        }
                        _ => Payload::Response(response),
                    }
                } else if obj.get("messages").is_some_and(Value::is_array) {
                    Payload::Response(response_from_object(&obj))
                } else if let Some(message) = message_from_object(&obj) {
                    Payload::Message(message)
                } else {
                    Payload::Empty
                }
            }
            Value::Bool(_) | Value::Number(_) => Payload::Empty,
        }
    }
}

/// One raw event from the agent runtime.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PipelineEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    #[serde(default)]
    pub executor_id: Option<String>,
    #[serde(default, rename = "data")]
    pub payload: Payload,
}

impl PipelineEvent {
    pub fn invoked(executor_id: impl Into<String>) -> Self {
        Self {
            kind: EventKind::ExecutorInvoked,
            executor_id: Some(executor_id.into()),
            payload: Payload::Empty,
        }
    }

    pub fn completed(executor_id: impl Into<String>, payload: Payload) -> Self {
        Self {
            kind: EventKind::ExecutorCompleted,
            executor_id: Some(executor_id.into()),
            payload,
        }
    }

    pub fn output(payload: Payload) -> Self {
        Self {
            kind: EventKind::Output,
            executor_id: None,
            payload,
        }
    }

    pub fn other(executor_id: Option<&str>) -> Self {
        Self {
            kind: EventKind::Other,
            executor_id: executor_id.map(str::to_string),
            payload: Payload::Empty,
        }
    }

    /// Decode one NDJSON line from the runtime.
    pub fn from_json_line(line: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(line)?)
    }
}
