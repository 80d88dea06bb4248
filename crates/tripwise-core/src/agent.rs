//! The fixed agent roster of the travel-planning pipeline.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Name of the workflow reported to clients in `workflow_started`.
pub const WORKFLOW_NAME: &str = "travel_planner";

/// One of the three sequential agents.
///
/// Declaration order is pipeline order; `step()` is the 1-based position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AgentName {
    Researcher,
    WeatherAnalyst,
    Planner,
}

impl AgentName {
    /// All agents in pipeline order.
    pub const ORDER: [AgentName; 3] = [
        AgentName::Researcher,
        AgentName::WeatherAnalyst,
        AgentName::Planner,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentName::Researcher => "Researcher",
            AgentName::WeatherAnalyst => "WeatherAnalyst",
            AgentName::Planner => "Planner",
        }
    }

    /// 1-based position in the pipeline.
    pub fn step(&self) -> u32 {
        match self {
            AgentName::Researcher => 1,
            AgentName::WeatherAnalyst => 2,
            AgentName::Planner => 3,
        }
    }

    pub fn is_last(&self) -> bool {
        *self == AgentName::Planner
    }

    /// Map an executor identifier from the runtime onto an agent.
    ///
    /// Adapter executors (input/output conversion nodes and the like) return
    /// `None` and are ignored by the aggregator.
    pub fn from_executor_id(id: &str) -> Option<Self> {
        id.parse().ok()
    }
}

impl fmt::Display for AgentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Researcher" => Ok(AgentName::Researcher),
            "WeatherAnalyst" => Ok(AgentName::WeatherAnalyst),
            "Planner" => Ok(AgentName::Planner),
            other => Err(format!("unknown agent: {other}")),
        }
    }
}

/// Definition of one agent as handed to the external runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSpec {
    pub name: AgentName,
    pub instructions: String,
    /// Names of tool-server tools the agent may call.
    #[serde(default)]
    pub tools: Vec<String>,
}

impl AgentSpec {
    pub fn new(name: AgentName, instructions: impl Into<String>) -> Self {
        Self {
            name,
            instructions: instructions.into(),
            tools: Vec::new(),
        }
    }

    pub fn with_tools(mut self, tools: &[&str]) -> Self {
        self.tools = tools.iter().map(|t| t.to_string()).collect();
        self
    }
}

const RESEARCHER_INSTRUCTIONS: &str = "You are an expert travel researcher. Given a travel query, provide a concise \
research brief covering:\n\
1. Key attractions and points of interest\n\
2. Local culture and customs\n\
3. Transportation options\n\
4. Best time to visit\n\
5. Practical travel tips\n\n\
Be factual, concise, and well-organized. Use bullet points.\n\
Output ONLY the research brief, no greetings or filler.";

const WEATHER_ANALYST_INSTRUCTIONS: &str = "You are a weather and travel conditions analyst. Based on the research brief \
from the previous agent and the destination mentioned, you MUST:\n\
1. Use the get_weather tool to fetch current weather for the destination(s)\n\
2. Use the get_current_time tool to check local time\n\
3. Optionally use search_restaurants to find dining options\n\n\
Then provide a weather analysis covering:\n\
- Current conditions and what to pack\n\
- Best outdoor activity windows\n\
- Weather-related travel advisories\n\n\
ALWAYS call the tools first, do NOT guess weather data.\n\
Output ONLY the weather analysis, no greetings or filler.";

const PLANNER_INSTRUCTIONS: &str = "You are a professional travel planner. Based on the research brief and \
weather analysis from the previous agents, create a complete travel plan:\n\n\
1. **Day-by-Day Itinerary**: Suggest a 3-day itinerary with morning, \
afternoon, and evening activities\n\
2. **Packing List**: Based on weather conditions\n\
3. **Budget Estimate**: Rough daily budget in USD\n\
4. **Restaurant Recommendations**: If dining data is available\n\
5. **Pro Tips**: Insider advice for the destination\n\n\
Make the plan practical, well-structured, and actionable.\n\
Output ONLY the travel plan, no greetings or filler.";

/// The three agents of the travel planner, in pipeline order.
pub fn travel_planner_agents() -> Vec<AgentSpec> {
    vec![
        AgentSpec::new(AgentName::Researcher, RESEARCHER_INSTRUCTIONS),
        AgentSpec::new(AgentName::WeatherAnalyst, WEATHER_ANALYST_INSTRUCTIONS).with_tools(&[
            "get_weather",
            "get_current_time",
            "search_restaurants",
        ]),
        AgentSpec::new(AgentName::Planner, PLANNER_INSTRUCTIONS),
    ]
}
