//! Response types returned by completion providers

use crate::messages::{Message, ToolCall};
use serde::{Deserialize, Serialize};

/// Token accounting reported by the provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageMetadata {
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub total_tokens: usize,
}

impl UsageMetadata {
    pub fn new(input_tokens: usize, output_tokens: usize) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens: input_tokens + output_tokens,
        }
    }
}

/// A complete reply from a [`ChatModel`](super::ChatModel)
#[derive(Debug, Clone, PartialEq)]
pub struct ChatResponse {
    /// The assistant message, including any pending tool calls
    pub message: Message,

    /// Token usage, if the provider reports it
    pub usage: Option<UsageMetadata>,
}

impl ChatResponse {
    pub fn new(message: Message) -> Self {
        Self {
            message,
            usage: None,
        }
    }

    pub fn with_usage(mut self, usage: UsageMetadata) -> Self {
        self.usage = Some(usage);
        self
    }

    /// Text content of the reply
    pub fn content(&self) -> String {
        self.message.text()
    }

    /// Pending tool calls requested by the reply
    pub fn tool_calls(&self) -> Vec<&ToolCall> {
        self.message.tool_calls().collect()
    }
}
