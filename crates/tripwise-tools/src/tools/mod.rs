pub mod clock;
pub mod restaurants;
pub mod weather;

use tripwise_core::tool::{Tool, ToolDefinition};

/// The travel tools served by the tool server.
pub struct TravelTools {
    tools: Vec<Box<dyn Tool>>,
}

impl TravelTools {
    pub fn all() -> Self {
        Self {
            tools: vec![
                Box::new(weather::WeatherTool),
                Box::new(clock::ClockTool),
                Box::new(restaurants::RestaurantTool),
            ],
        }
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|t| t.definition().name == name)
            .map(|t| t.as_ref())
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }
}
