use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use tripwise_core::error::Result;
use tripwise_core::tool::{Tool, ToolDefinition, required_str};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current date and time for a timezone.
///
/// Resolves UTC and fixed offsets (`UTC`, `Z`, `GMT`, `+02:00`,
/// `UTC-05:30`). Anything else is reported in UTC with a note.
pub struct ClockTool;

fn parse_offset(spec: &str) -> Option<FixedOffset> {
    let spec = spec.trim();
    let upper = spec.to_ascii_uppercase();
    if matches!(upper.as_str(), "UTC" | "Z" | "GMT" | "ETC/UTC") {
        return FixedOffset::east_opt(0);
    }
    let rest = upper
        .strip_prefix("UTC")
        .or_else(|| upper.strip_prefix("GMT"))
        .unwrap_or(&upper);
    let (sign, digits) = match rest.chars().next()? {
        '+' => (1, &rest[1..]),
        '-' => (-1, &rest[1..]),
        _ => return None,
    };
    let (hours, minutes) = match digits.split_once(':') {
        Some((h, m)) => (h.parse::<i32>().ok()?, m.parse::<i32>().ok()?),
        None => (digits.parse::<i32>().ok()?, 0),
    };
    if hours > 14 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Render the time at `now` for `timezone_name`.
pub fn format_time(timezone_name: &str, now: DateTime<Utc>) -> String {
    match parse_offset(timezone_name) {
        Some(offset) if offset.local_minus_utc() == 0 => format!(
            "Current time in {timezone_name}: {} UTC",
            now.format(TIME_FORMAT)
        ),
        Some(offset) => format!(
            "Current time in {timezone_name}: {} {offset}",
            now.with_timezone(&offset).format(TIME_FORMAT)
        ),
        None => format!(
            "Current time (UTC, '{timezone_name}' not resolved): {} UTC",
            now.format(TIME_FORMAT)
        ),
    }
}

#[async_trait]
impl Tool for ClockTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "get_current_time".into(),
            description: "Get the current date and time for a given timezone.".into(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "timezone_name": {
                        "type": "string",
                        "description": "Timezone, e.g. 'UTC' or '+09:00'"
                    }
                },
                "required": ["timezone_name"]
            }),
        }
    }

    async fn call(&self, input: serde_json::Value) -> Result<String> {
        let tz = required_str(&input, "timezone_name")?;
        Ok(format_time(tz, Utc::now()))
    }
}
