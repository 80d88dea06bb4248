//! Client for an external agent runtime that streams NDJSON events.

use std::fmt::Display;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use tripwise_core::agent::{AgentSpec, WORKFLOW_NAME, travel_planner_agents};
use tripwise_core::error::{PipelineError, Result, TripwiseError};
use tripwise_core::event::PipelineEvent;
use tripwise_core::pipeline::{AgentPipeline, PipelineSession};

use crate::connection::ToolConnection;

/// Body of `POST {runtime}/runs`.
#[derive(Debug, Serialize)]
struct RunRequest<'a> {
    workflow: &'a str,
    query: &'a str,
    agents: &'a [AgentSpec],
    tool_server_url: &'a str,
}

/// Pipeline backed by a remote agent runtime.
///
/// Each run holds a [`ToolConnection`] to the tool server for as long as
/// the runtime's event stream is consumed.
pub struct RemotePipeline {
    client: reqwest::Client,
    runtime_url: String,
    tool_server_url: String,
    agents: Vec<AgentSpec>,
}

impl RemotePipeline {
    pub fn new(runtime_url: impl Into<String>, tool_server_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            runtime_url: runtime_url.into().trim_end_matches('/').to_string(),
            tool_server_url: tool_server_url.into().trim_end_matches('/').to_string(),
            agents: travel_planner_agents(),
        }
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_agents(mut self, agents: Vec<AgentSpec>) -> Self {
        self.agents = agents;
        self
    }
}

#[async_trait]
impl AgentPipeline for RemotePipeline {
    async fn open(&self, query: &str) -> Result<PipelineSession> {
        let connection = ToolConnection::acquire(&self.client, &self.tool_server_url).await?;

        let body = RunRequest {
            workflow: WORKFLOW_NAME,
            query,
            agents: &self.agents,
            tool_server_url: &self.tool_server_url,
        };
        let response = self
            .client
            .post(format!("{}/runs", self.runtime_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| PipelineError::Connect(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::Status {
                status: status.as_u16(),
                body,
            }
            .into());
        }
        info!(runtime = %self.runtime_url, "agent run started");

        let events = decode_ndjson(response.bytes_stream());
        Ok(PipelineSession::new(Box::pin(events)).with_resource(Box::new(connection)))
    }
}

/// Decode one NDJSON line. Lines may carry an SSE-style `data: ` prefix.
///
/// Returns `Ok(None)` for blank lines. A line of type `error` is the
/// runtime reporting a failed run.
pub fn decode_line(line: &str) -> Result<Option<PipelineEvent>> {
    let line = line.trim();
    let line = line.strip_prefix("data:").map(str::trim_start).unwrap_or(line);
    if line.is_empty() {
        return Ok(None);
    }

    let value: Value =
        serde_json::from_str(line).map_err(|e| PipelineError::Decode(format!("{e}: {line}")))?;
    if value.get("type").and_then(Value::as_str) == Some("error") {
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("agent runtime reported an error");
        return Err(PipelineError::Runtime(message.to_string()).into());
    }
    let event: PipelineEvent =
        serde_json::from_value(value).map_err(|e| PipelineError::Decode(e.to_string()))?;
    Ok(Some(event))
}

/// Turn a byte stream of NDJSON into pipeline events.
///
/// The first transport or decode failure is yielded as an error and ends
/// the stream.
pub fn decode_ndjson<S, B, E>(byte_stream: S) -> impl Stream<Item = Result<PipelineEvent>> + Send
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send,
    E: Display + Send,
{
    async_stream::stream! {
        let mut buffer: Vec<u8> = Vec::new();
        let mut byte_stream = Box::pin(byte_stream);

        while let Some(chunk) = byte_stream.next().await {
            let chunk = match chunk {
                Ok(bytes) => bytes,
                Err(e) => {
                    yield Err(TripwiseError::from(PipelineError::Transport(e.to_string())));
                    return;
                }
            };
            buffer.extend_from_slice(chunk.as_ref());

            while let Some(pos) = buffer.iter().position(|&b| b == b'\n') {
                let line: Vec<u8> = buffer.drain(..=pos).collect();
                match decode_line(&String::from_utf8_lossy(&line)) {
                    Ok(Some(event)) => yield Ok(event),
                    Ok(None) => {}
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                }
            }
        }

        // A final line without a trailing newline.
        match decode_line(&String::from_utf8_lossy(&buffer)) {
            Ok(Some(event)) => yield Ok(event),
            Ok(None) => {}
            Err(e) => yield Err(e),
        }
        debug!("runtime event stream ended");
    }
}
