//! Per-run aggregation of raw runtime events into agent lifecycle events.
//!
//! The runtime may fire several executor rounds for one agent (tool-calling
//! rounds in particular) and adapter executors that belong to no agent. The
//! aggregator attributes events by executor identifier, keeps the best
//! cleaned output per agent and emits exactly one start/complete pair per
//! agent, in pipeline order, followed by one `workflow_completed`.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};
use tripwise_core::agent::AgentName;
use tripwise_core::event::{EventKind, PipelineEvent};

use crate::clean::clean_output;
use crate::extract::{extract_text, terminal_text};
use crate::sse::SseEvent;

/// Output state of a single agent during one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentBuffer {
    pub started: bool,
    pub completed: bool,
    pub best_output: String,
}

impl AgentBuffer {
    fn is_open(&self) -> bool {
        self.started && !self.completed
    }
}

/// What an empty last-agent buffer is replaced with when it is flushed.
#[derive(Clone, Copy)]
enum LastAgentFill<'a> {
    None,
    Fallback,
    Terminal(&'a str),
}

/// Aggregation state for one pipeline run.
#[derive(Debug, Default)]
pub struct Aggregator {
    buffers: BTreeMap<AgentName, AgentBuffer>,
    current: Option<AgentName>,
    last_meaningful_output: String,
    finished: bool,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn current_agent(&self) -> Option<AgentName> {
        self.current
    }

    pub fn buffer(&self, agent: AgentName) -> Option<&AgentBuffer> {
        self.buffers.get(&agent)
    }

    /// Most recent non-empty agent output flushed so far.
    pub fn last_meaningful_output(&self) -> &str {
        &self.last_meaningful_output
    }

    /// Feed one raw event; returns the client events it produces.
    pub fn observe(&mut self, event: &PipelineEvent) -> Vec<SseEvent> {
        if self.finished {
            return Vec::new();
        }
        debug!(kind = ?event.kind, executor_id = ?event.executor_id, "runtime event");

        match event.kind {
            EventKind::ExecutorInvoked => match self.attribute(event) {
                Some(agent) => self.on_invoked(agent),
                None => Vec::new(),
            },
            EventKind::ExecutorCompleted => {
                if let Some(agent) = self.attribute(event) {
                    self.on_completed(agent, event);
                }
                Vec::new()
            }
            EventKind::Output => self.on_output(event),
            EventKind::Other => Vec::new(),
        }
    }

    /// Close the run when the raw stream ended without a terminal output.
    pub fn finish(&mut self) -> Vec<SseEvent> {
        if self.finished {
            return Vec::new();
        }
        warn!("no output event received, flushing remaining state");
        let mut out = self.flush_open(LastAgentFill::Fallback);
        out.push(SseEvent::workflow_completed(self.last_meaningful_output.clone()));
        self.finished = true;
        out
    }

    /// Abort the run with an error; nothing is flushed.
    pub fn fail(&mut self, message: impl Into<String>) -> SseEvent {
        self.finished = true;
        SseEvent::error(message)
    }

    fn attribute(&self, event: &PipelineEvent) -> Option<AgentName> {
        event
            .executor_id
            .as_deref()
            .and_then(AgentName::from_executor_id)
    }

    fn on_invoked(&mut self, agent: AgentName) -> Vec<SseEvent> {
        let mut out = Vec::new();

        let previous = self
            .current
            .filter(|&c| c != agent)
            .filter(|c| self.buffers.get(c).is_some_and(AgentBuffer::is_open));
        if let Some(previous) = previous {
            out.push(self.flush(previous, LastAgentFill::None));
        }

        let buffer = self.buffers.entry(agent).or_default();
        if !buffer.started {
            buffer.started = true;
            info!(agent = %agent, step = agent.step(), "agent started");
            out.push(SseEvent::agent_started(agent));
        }
        self.current = Some(agent);
        out
    }

    fn on_completed(&mut self, agent: AgentName, event: &PipelineEvent) {
        let raw = extract_text(&event.payload);
        let candidate = clean_output(&raw);
        let buffer = self.buffers.entry(agent).or_default();
        if candidate.len() > buffer.best_output.len() {
            buffer.best_output = candidate;
        }
        debug!(
            agent = %agent,
            raw_len = raw.len(),
            best_len = buffer.best_output.len(),
            "executor completed"
        );
    }

    fn on_output(&mut self, event: &PipelineEvent) -> Vec<SseEvent> {
        let terminal = clean_output(&terminal_text(&event.payload));
        let mut out = self.flush_open(LastAgentFill::Terminal(&terminal));

        let final_output = if terminal.is_empty() {
            self.last_meaningful_output.clone()
        } else {
            terminal
        };
        info!(output_len = final_output.len(), "workflow completed");
        out.push(SseEvent::workflow_completed(final_output));
        self.finished = true;
        out
    }

    fn flush_open(&mut self, fill: LastAgentFill<'_>) -> Vec<SseEvent> {
        let open: Vec<AgentName> = self
            .buffers
            .iter()
            .filter(|(_, buffer)| buffer.is_open())
            .map(|(agent, _)| *agent)
            .collect();
        open.into_iter().map(|agent| self.flush(agent, fill)).collect()
    }

    fn flush(&mut self, agent: AgentName, fill: LastAgentFill<'_>) -> SseEvent {
        let fallback = self.last_meaningful_output.clone();
        let buffer = self.buffers.entry(agent).or_default();
        buffer.completed = true;

        let mut output = buffer.best_output.clone();
        if output.is_empty() && agent.is_last() {
            output = match fill {
                LastAgentFill::None => output,
                LastAgentFill::Fallback => fallback,
                LastAgentFill::Terminal(text) if !text.is_empty() => text.to_string(),
                LastAgentFill::Terminal(_) => fallback,
            };
        }
        if !output.is_empty() {
            self.last_meaningful_output = output.clone();
        }
        info!(
            agent = %agent,
            step = agent.step(),
            output_len = output.len(),
            "agent completed"
        );
        SseEvent::agent_completed(agent, output)
    }
}
