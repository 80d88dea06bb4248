use async_trait::async_trait;
use tripwise_core::error::Result;
use tripwise_core::tool::{Tool, ToolDefinition, required_str};

/// Canned conditions, matched by substring of the lowercased location.
const CONDITIONS: [(&str, &str); 13] = [
    ("seattle", "Cloudy, 12°C, 80% humidity, light rain expected"),
    ("madrid", "Sunny, 28°C, 30% humidity, clear skies"),
    ("amsterdam", "Rainy, 8°C, 90% humidity, strong winds"),
    ("tokyo", "Clear skies, 22°C, 55% humidity, pleasant"),
    ("london", "Foggy, 10°C, 85% humidity, overcast"),
    ("paris", "Partly cloudy, 18°C, 65% humidity, mild breeze"),
    ("new york", "Sunny, 24°C, 50% humidity, warm"),
    ("barcelona", "Sunny, 26°C, 40% humidity, sea breeze"),
    ("rome", "Warm, 30°C, 35% humidity, clear skies"),
    ("berlin", "Overcast, 14°C, 75% humidity, cool"),
    ("lisbon", "Sunny, 25°C, 45% humidity, light wind"),
    ("bangkok", "Hot and humid, 34°C, 80% humidity, chance of thunderstorms"),
    ("sydney", "Partly cloudy, 20°C, 60% humidity, mild"),
];

const DEFAULT_CONDITIONS: &str = "Partly cloudy, 18°C, 60% humidity (default estimate)";

/// Current weather for a location.
pub struct WeatherTool;

pub fn weather_report(location: &str) -> String {
    let key = location.trim().to_lowercase();
    let conditions = CONDITIONS
        .iter()
        .find(|(city, _)| key.contains(city))
        .map(|(_, conditions)| *conditions)
        .unwrap_or(DEFAULT_CONDITIONS);
    format!("Weather in {location}: {conditions}")
}

#[async_trait]
impl Tool for WeatherTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "get_weather".into(),
            description: "Get the current weather for a given location.".into(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "location": {
                        "type": "string",
                        "description": "The city or location to get weather for"
                    }
                },
                "required": ["location"]
            }),
        }
    }

    async fn call(&self, input: serde_json::Value) -> Result<String> {
        let location = required_str(&input, "location")?;
        Ok(weather_report(location))
    }
}
