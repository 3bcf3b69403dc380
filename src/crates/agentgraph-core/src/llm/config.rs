//! Request types for completion providers
//!
//! Every call carries its own [`ChatOptions`]. Overriding the model for one call is a
//! matter of setting [`ChatOptions::model`] on that request.

use crate::llm::tools::ToolDefinition;
use crate::messages::Message;
use serde::{Deserialize, Serialize};

/// A request to a chat model containing messages and options.
///
/// ```rust
/// use agentgraph_core::llm::ChatRequest;
/// use agentgraph_core::Message;
///
/// let request = ChatRequest::new(vec![
///     Message::system("You are a helpful assistant"),
///     Message::human("What is the capital of France?"),
/// ])
/// .with_temperature(0.2)
/// .with_max_tokens(256)
/// .with_model("small-fast");
/// assert_eq!(request.options.model.as_deref(), Some("small-fast"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    /// The conversation messages to send to the model.
    pub messages: Vec<Message>,

    /// Generation options for this call only.
    pub options: ChatOptions,
}

impl ChatRequest {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            options: ChatOptions::default(),
        }
    }

    /// Replace all options at once
    pub fn with_options(mut self, options: ChatOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.options.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.options.max_tokens = Some(max_tokens);
        self
    }

    /// Bind tools the model may call.
    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.options.tools = tools;
        self
    }

    /// Use a different model for this call only.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.options.model = Some(model.into());
        self
    }
}

/// Per-call generation options.
///
/// Not every provider honours every field; unset fields mean "provider default".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatOptions {
    /// Sampling temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Maximum output tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<usize>,

    /// Tool schemas the model may call
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,

    /// Model override for this call
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl ChatOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}
