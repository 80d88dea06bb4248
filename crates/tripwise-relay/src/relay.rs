use std::pin::Pin;
use std::sync::Arc;

use futures::{Stream, StreamExt};
use tracing::{error, info};
use tripwise_core::error::TripwiseError;
use tripwise_core::pipeline::AgentPipeline;

use crate::aggregate::Aggregator;
use crate::sse::SseEvent;

/// Boxed stream of client events for one run.
pub type SseStream = Pin<Box<dyn Stream<Item = SseEvent> + Send>>;

/// Message reported to the client for a failed run.
pub fn error_message(err: &TripwiseError) -> String {
    match err {
        TripwiseError::Pipeline(inner) => inner.to_string(),
        other => other.to_string(),
    }
}

/// Run `query` through `pipeline` and translate its events.
///
/// Emits `workflow_started`, then the aggregated agent events, and always
/// ends with exactly one `workflow_completed` or `error`. The pipeline
/// session is held only while its events are consumed and is released on
/// every exit path, including the consumer dropping the stream.
pub fn relay(pipeline: Arc<dyn AgentPipeline>, query: String) -> SseStream {
    Box::pin(async_stream::stream! {
        yield SseEvent::workflow_started();

        let mut session = match pipeline.open(&query).await {
            Ok(session) => session,
            Err(e) => {
                error!(error = %e, "failed to start workflow");
                yield SseEvent::error(error_message(&e));
                return;
            }
        };
        info!(query_len = query.len(), "workflow running");

        let mut aggregator = Aggregator::new();
        while let Some(item) = session.next().await {
            match item {
                Ok(event) => {
                    for out in aggregator.observe(&event) {
                        yield out;
                    }
                    if aggregator.is_finished() {
                        break;
                    }
                }
                Err(e) => {
                    error!(error = %e, "workflow execution failed");
                    session.close();
                    yield aggregator.fail(error_message(&e));
                    return;
                }
            }
        }
        session.close();

        for out in aggregator.finish() {
            yield out;
        }
    })
}
