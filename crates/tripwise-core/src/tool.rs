use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Metadata describing a tool exposed by the tool server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema of the tool's arguments.
    pub parameters: serde_json::Value,
}

/// A callable travel tool.
#[async_trait]
pub trait Tool: Send + Sync {
    fn definition(&self) -> ToolDefinition;

    /// Run the tool with JSON arguments and return its text result.
    async fn call(&self, input: serde_json::Value) -> Result<String>;
}

/// Read a required string argument from a tool input object.
pub fn required_str<'a>(input: &'a serde_json::Value, key: &str) -> Result<&'a str> {
    input
        .get(key)
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| crate::error::ToolError::InvalidInput(format!("missing '{key}'")).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ToolError, TripwiseError};
    use serde_json::json;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition {
                name: "echo".into(),
                description: "Echoes its input".into(),
                parameters: json!({
                    "type": "object",
                    "properties": { "text": { "type": "string" } },
                    "required": ["text"]
                }),
            }
        }

        async fn call(&self, input: serde_json::Value) -> Result<String> {
            Ok(required_str(&input, "text")?.to_string())
        }
    }

    #[tokio::test]
    async fn tool_call_reads_argument() {
        let out = EchoTool.call(json!({"text": "hola"})).await.unwrap();
        assert_eq!(out, "hola");
    }

    #[tokio::test]
    async fn missing_argument_is_invalid_input() {
        let err = EchoTool.call(json!({})).await.unwrap_err();
        assert!(matches!(
            err,
            TripwiseError::Tool(ToolError::InvalidInput(ref msg)) if msg == "missing 'text'"
        ));
    }

    #[test]
    fn definition_serializes() {
        let def = EchoTool.definition();
        let json = serde_json::to_value(&def).unwrap();
        assert_eq!(json["name"], "echo");
        assert_eq!(json["parameters"]["required"][0], "text");
    }

    #[test]
    fn tool_is_object_safe() {
        let tools: Vec<Box<dyn Tool>> = vec![Box::new(EchoTool)];
        assert_eq!(tools[0].definition().name, "echo");
    }
}
