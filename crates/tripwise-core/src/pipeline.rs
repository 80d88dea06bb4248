use std::pin::Pin;
use std::task::{Context, Poll};

use async_trait::async_trait;
use futures::Stream;

use crate::error::Result;
use crate::event::PipelineEvent;

/// Boxed stream of raw runtime events.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<PipelineEvent>> + Send>>;

/// A resource held for the lifetime of one pipeline run.
///
/// `release` runs exactly once, either from [`PipelineSession::close`] or
/// when the session is dropped.
pub trait SessionResource: Send {
    fn release(self: Box<Self>);
}

/// An opaque multi-agent pipeline that turns a query into lifecycle events.
#[async_trait]
pub trait AgentPipeline: Send + Sync {
    /// Acquire the run's resources and start streaming events for `query`.
    async fn open(&self, query: &str) -> Result<PipelineSession>;
}

/// One open pipeline run: its event stream plus the resources it holds.
pub struct PipelineSession {
    events: EventStream,
    resource: Option<Box<dyn SessionResource>>,
}

impl PipelineSession {
    pub fn new(events: EventStream) -> Self {
        Self {
            events,
            resource: None,
        }
    }

    pub fn with_resource(mut self, resource: Box<dyn SessionResource>) -> Self {
        self.resource = Some(resource);
        self
    }

    pub fn holds_resource(&self) -> bool {
        self.resource.is_some()
    }

    /// Release the held resource and end the run.
    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(resource) = self.resource.take() {
            resource.release();
            tracing::debug!("pipeline session released");
        }
    }
}

impl Drop for PipelineSession {
    fn drop(&mut self) {
        self.release();
    }
}

impl Stream for PipelineSession {
    type Item = Result<PipelineEvent>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.events.as_mut().poll_next(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use futures::StreamExt;

    struct Counted(Arc<AtomicUsize>);

    impl SessionResource for Counted {
        fn release(self: Box<Self>) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn session_with_counter(events: Vec<PipelineEvent>) -> (PipelineSession, Arc<AtomicUsize>) {
        let counter = Arc::new(AtomicUsize::new(0));
        let stream = futures::stream::iter(events.into_iter().map(Ok));
        let session = PipelineSession::new(Box::pin(stream))
            .with_resource(Box::new(Counted(Arc::clone(&counter))));
        (session, counter)
    }

    #[tokio::test]
    async fn streams_inner_events() {
        let (mut session, _) = session_with_counter(vec![
            PipelineEvent::invoked("Researcher"),
            PipelineEvent::invoked("Planner"),
        ]);
        let first = session.next().await.unwrap().unwrap();
        assert_eq!(first.executor_id.as_deref(), Some("Researcher"));
        let second = session.next().await.unwrap().unwrap();
        assert_eq!(second.executor_id.as_deref(), Some("Planner"));
        assert!(session.next().await.is_none());
    }

    #[test]
    fn close_releases_once() {
        let (session, counter) = session_with_counter(vec![]);
        assert!(session.holds_resource());
        session.close();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn drop_releases() {
        let (session, counter) = session_with_counter(vec![PipelineEvent::invoked("Researcher")]);
        drop(session);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn session_without_resource() {
        let session = PipelineSession::new(Box::pin(futures::stream::empty()));
        assert!(!session.holds_resource());
        session.close();
    }
}
