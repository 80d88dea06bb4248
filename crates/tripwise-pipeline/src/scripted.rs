use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use tripwise_core::error::{PipelineError, Result, TripwiseError};
use tripwise_core::event::{ChatMessage, Payload, PipelineEvent};
use tripwise_core::pipeline::{AgentPipeline, PipelineSession, SessionResource};

/// Counts how many scripted sessions have been released.
#[derive(Clone, Default)]
struct ReleaseCounter(Arc<AtomicUsize>);

impl SessionResource for ReleaseCounter {
    fn release(self: Box<Self>) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// Pipeline that replays a fixed list of runtime events.
///
/// Used for the offline demo mode and for tests of everything downstream
/// of the runtime.
#[derive(Clone)]
pub struct ScriptedPipeline {
    events: Vec<PipelineEvent>,
    fail_after: Option<(usize, String)>,
    refuse: Option<String>,
    delay: Option<Duration>,
    opened: Arc<AtomicUsize>,
    released: ReleaseCounter,
}

impl ScriptedPipeline {
    pub fn new(events: Vec<PipelineEvent>) -> Self {
        Self {
            events,
            fail_after: None,
            refuse: None,
            delay: None,
            opened: Arc::new(AtomicUsize::new(0)),
            released: ReleaseCounter::default(),
        }
    }

    /// Yield a runtime error after the first `n` events.
    pub fn failing_after(mut self, n: usize, message: impl Into<String>) -> Self {
        self.fail_after = Some((n, message.into()));
        self
    }

    /// Fail to open, as when the tool server is down.
    pub fn refusing(mut self, message: impl Into<String>) -> Self {
        self.refuse = Some(message.into());
        self
    }

    /// Pause before each event.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn open_count(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn release_count(&self) -> usize {
        self.released.0.load(Ordering::SeqCst)
    }

    /// A plausible three-agent run including adapter executors and a
    /// tool-calling round.
    pub fn travel_demo() -> Self {
        Self::new(demo_events())
    }
}

#[async_trait]
impl AgentPipeline for ScriptedPipeline {
    async fn open(&self, _query: &str) -> Result<PipelineSession> {
        if let Some(message) = &self.refuse {
            return Err(PipelineError::ToolConnection(message.clone()).into());
        }
        self.opened.fetch_add(1, Ordering::SeqCst);

        let events = self.events.clone();
        let fail_after = self.fail_after.clone();
        let delay = self.delay;
        let stream = async_stream::stream! {
            for (i, event) in events.into_iter().enumerate() {
                if let Some((n, message)) = &fail_after {
                    if i == *n {
                        yield Err(TripwiseError::from(PipelineError::Runtime(message.clone())));
                        return;
                    }
                }
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                yield Ok(event);
            }
            if let Some((_, message)) = fail_after {
                yield Err(TripwiseError::from(PipelineError::Runtime(message)));
            }
        };
        Ok(PipelineSession::new(Box::pin(stream)).with_resource(Box::new(self.released.clone())))
    }
}

const DEMO_BRIEF: &str = "- Key attractions: Prado Museum, Royal Palace, Retiro Park\n\
- Culture: late dinners (21:00+), tapas bars, siesta hours in small shops\n\
- Transport: Metro covers the centre; airport express bus runs 24/7\n\
- Best time to visit: April to June, September to October\n\
- Tips: many museums are free in the last two opening hours";

const DEMO_WEATHER: &str = "Weather in Madrid: Sunny, 28°C, 30% humidity, clear skies";

const DEMO_ANALYSIS: &str = "- Current conditions: sunny and warm at 28°C; pack light clothing, sunscreen and a hat\n\
- Best outdoor windows: mornings before 12:00 and evenings after 19:00\n\
- Advisories: stay hydrated during midday heat";

const DEMO_PLAN: &str = "**Day 1**: Prado Museum in the morning, Retiro Park in the afternoon, tapas in La Latina\n\
**Day 2**: Royal Palace, Almudena Cathedral, sunset at Templo de Debod\n\
**Day 3**: Day trip to Toledo, evening flamenco show\n\
**Packing list**: light clothes, sunscreen, comfortable shoes\n\
**Budget**: about 120 USD per day\n\
**Pro tip**: book the Prado online to skip the queue";

fn demo_events() -> Vec<PipelineEvent> {
    let query = ChatMessage::user("Plan a trip to Madrid");
    vec![
        PipelineEvent::invoked("input-conversation"),
        PipelineEvent::completed("input-conversation", Payload::messages([query.clone()])),
        PipelineEvent::invoked("Researcher"),
        PipelineEvent::completed(
            "Researcher",
            Payload::response(Some(DEMO_BRIEF), vec![ChatMessage::assistant(DEMO_BRIEF)]),
        ),
        PipelineEvent::invoked("WeatherAnalyst"),
        PipelineEvent::completed(
            "WeatherAnalyst",
            Payload::messages([ChatMessage::assistant(""), ChatMessage::tool(DEMO_WEATHER)]),
        ),
        PipelineEvent::invoked("WeatherAnalyst"),
        PipelineEvent::completed(
            "WeatherAnalyst",
            Payload::messages([ChatMessage::assistant(DEMO_ANALYSIS)]),
        ),
        PipelineEvent::invoked("Planner"),
        PipelineEvent::completed("Planner", Payload::messages([ChatMessage::assistant(DEMO_PLAN)])),
        PipelineEvent::other(Some("Planner")),
        PipelineEvent::output(Payload::messages([
            query,
            ChatMessage::assistant(DEMO_BRIEF),
            ChatMessage::assistant(DEMO_ANALYSIS),
            ChatMessage::assistant(DEMO_PLAN),
        ])),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use tripwise_core::event::EventKind;

    #[tokio::test]
    async fn replays_events_and_releases() {
        let pipeline = ScriptedPipeline::new(vec![
            PipelineEvent::invoked("Researcher"),
            PipelineEvent::output(Payload::text("done")),
        ]);
        let session = pipeline.open("q").await.unwrap();
        let events: Vec<_> = session.collect().await;
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.is_ok()));
        assert_eq!(pipeline.open_count(), 1);
        assert_eq!(pipeline.release_count(), 1);
    }

    #[tokio::test]
    async fn fails_after_n_events() {
        let pipeline = ScriptedPipeline::new(vec![
            PipelineEvent::invoked("Researcher"),
            PipelineEvent::invoked("WeatherAnalyst"),
        ])
        .failing_after(1, "boom");
        let events: Vec<_> = pipeline.open("q").await.unwrap().collect().await;
        assert_eq!(events.len(), 2);
        assert!(events[0].is_ok());
        assert_eq!(events[1].as_ref().unwrap_err().to_string(), "Pipeline error: boom");
    }

    #[tokio::test]
    async fn fails_at_end_when_n_exceeds_script() {
        let pipeline = ScriptedPipeline::new(vec![PipelineEvent::invoked("Researcher")])
            .failing_after(5, "late");
        let events: Vec<_> = pipeline.open("q").await.unwrap().collect().await;
        assert_eq!(events.len(), 2);
        assert!(events[1].is_err());
    }

    #[tokio::test]
    async fn refusing_pipeline_does_not_open() {
        let pipeline = ScriptedPipeline::travel_demo().refusing("tool server down");
        assert!(pipeline.open("q").await.is_err());
        assert_eq!(pipeline.open_count(), 0);
        assert_eq!(pipeline.release_count(), 0);
    }

    #[test]
    fn demo_script_shape() {
        let events = demo_events();
        assert_eq!(events.first().unwrap().executor_id.as_deref(), Some("input-conversation"));
        assert_eq!(events.last().unwrap().kind, EventKind::Output);
        let weather_rounds = events
            .iter()
            .filter(|e| {
                e.kind == EventKind::ExecutorInvoked
                    && e.executor_id.as_deref() == Some("WeatherAnalyst")
            })
            .count();
        assert_eq!(weather_rounds, 2);
    }
}
