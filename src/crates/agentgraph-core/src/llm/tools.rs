//! Tool schemas advertised to completion providers
//!
//! Invocation records and results live in [`messages`](crate::messages) as
//! [`ToolCall`](crate::ToolCall) and [`ToolResult`](crate::ToolResult) parts.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Definition of a tool the model may call.
///
/// ```rust
/// use agentgraph_core::llm::ToolDefinition;
/// use serde_json::json;
///
/// let tool = ToolDefinition::new("get_weather", "Current weather for a city")
///     .with_parameters(json!({
///         "type": "object",
///         "properties": { "location": { "type": "string" } },
///         "required": ["location"]
///     }));
/// assert!(tool.parameters.is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Unique name the model uses to call the tool
    pub name: String,

    /// What the tool does; the model uses this to decide when to call it
    pub description: String,

    /// JSON Schema of the arguments
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<JsonValue>,
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: None,
        }
    }

    pub fn with_parameters(mut self, parameters: JsonValue) -> Self {
        self.parameters = Some(parameters);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serialization_skips_missing_schema() {
        let tool = ToolDefinition::new("noop", "Does nothing");
        let value = serde_json::to_value(&tool).unwrap();
        assert_eq!(value, json!({"name": "noop", "description": "Does nothing"}));
    }
}
