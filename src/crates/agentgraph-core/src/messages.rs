//! Conversation messages and their content parts
//!
//! A [`Message`] is a role-tagged list of [`ContentPart`]s. Parts are a closed sum type
//! over the three kinds of content the engine cares about:
//!
//! ```text
//! ContentPart
//! ├── Text        plain text
//! ├── ToolCall    a tool invocation requested by the model
//! └── ToolResult  the result of a tool invocation, keyed by call id
//! ```
//!
//! Code that needs to know "does this message ask for tools" pattern-matches on the parts
//! instead of probing shapes at runtime:
//!
//! ```rust
//! use agentgraph_core::messages::{ContentPart, Message, ToolCall};
//! use serde_json::json;
//!
//! let msg = Message::assistant("let me check")
//!     .with_tool_calls(vec![ToolCall::new("call_1", "search", json!({"q": "rust"}))]);
//!
//! let names: Vec<&str> = msg
//!     .parts
//!     .iter()
//!     .filter_map(|p| match p {
//!         ContentPart::ToolCall(call) => Some(call.name.as_str()),
//!         _ => None,
//!     })
//!     .collect();
//! assert_eq!(names, vec!["search"]);
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Role of the message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Instructions and context for the model
    System,
    /// End-user input
    Human,
    /// Model output
    Assistant,
    /// Tool execution results
    Tool,
}

/// A tool invocation requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Invocation id, unique within a response
    pub id: String,

    /// Name of the tool to run
    pub name: String,

    /// Tool arguments
    #[serde(default)]
    pub arguments: Value,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// The outcome of one tool invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Id of the [`ToolCall`] this answers
    pub call_id: String,

    /// Name of the tool that was called
    pub name: String,

    /// Result content shown to the model
    pub content: String,

    /// Whether the content describes a failure
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl ToolResult {
    /// Successful result
    pub fn success(
        call_id: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            call_id: call_id.into(),
            name: name.into(),
            content: content.into(),
            is_error: false,
        }
    }

    /// Error-content result
    pub fn error(
        call_id: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            call_id: call_id.into(),
            name: name.into(),
            content: content.into(),
            is_error: true,
        }
    }
}

/// One piece of message content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    /// Plain text
    Text {
        /// The text
        text: String,
    },
    /// A tool invocation request
    ToolCall(ToolCall),
    /// A tool invocation result
    ToolResult(ToolResult),
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::Text { text: text.into() }
    }
}

/// Base message type for conversational AI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier for this message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Role of the message sender
    pub role: MessageRole,

    /// Message content
    #[serde(default)]
    pub parts: Vec<ContentPart>,

    /// Optional sender name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Message {
    /// Create a text message with the given role
    pub fn new(role: MessageRole, text: impl Into<String>) -> Self {
        let text = text.into();
        let parts = if text.is_empty() {
            Vec::new()
        } else {
            vec![ContentPart::Text { text }]
        };
        Self {
            id: Some(Uuid::new_v4().to_string()),
            role,
            parts,
            name: None,
        }
    }

    /// Create a system message
    pub fn system(text: impl Into<String>) -> Self {
        Self::new(MessageRole::System, text)
    }

    /// Create a human message
    pub fn human(text: impl Into<String>) -> Self {
        Self::new(MessageRole::Human, text)
    }

    /// Create an assistant message
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, text)
    }

    /// Create a tool message carrying a batch of results
    pub fn tool_results(results: Vec<ToolResult>) -> Self {
        Self {
            id: Some(Uuid::new_v4().to_string()),
            role: MessageRole::Tool,
            parts: results.into_iter().map(ContentPart::ToolResult).collect(),
            name: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Append tool call requests
    pub fn with_tool_calls(mut self, calls: Vec<ToolCall>) -> Self {
        self.parts.extend(calls.into_iter().map(ContentPart::ToolCall));
        self
    }

    /// Concatenated text of all text parts
    pub fn text(&self) -> String {
        let mut out = String::new();
        for part in &self.parts {
            if let ContentPart::Text { text } = part {
                out.push_str(text);
            }
        }
        out
    }

    /// Tool call requests in this message
    pub fn tool_calls(&self) -> impl Iterator<Item = &ToolCall> {
        self.parts.iter().filter_map(|part| match part {
            ContentPart::ToolCall(call) => Some(call),
            _ => None,
        })
    }

    /// Tool results in this message
    pub fn tool_results_iter(&self) -> impl Iterator<Item = &ToolResult> {
        self.parts.iter().filter_map(|part| match part {
            ContentPart::ToolResult(result) => Some(result),
            _ => None,
        })
    }

    /// Whether the message requests at least one tool call
    pub fn has_tool_calls(&self) -> bool {
        self.tool_calls().next().is_some()
    }

    pub fn is_assistant(&self) -> bool {
        self.role == MessageRole::Assistant
    }
}

/// Shrink a history to its first message plus the most recent `keep_last` messages.
///
/// The first message (usually the system prompt) is always kept. Tool messages at the
/// start of the kept window are dropped as well, since their matching tool calls were
/// trimmed away. Returns the number of removed messages.
///
/// ```rust
/// use agentgraph_core::messages::{compact_history, Message};
///
/// let mut history = vec![
///     Message::system("be brief"),
///     Message::human("one"),
///     Message::assistant("1"),
///     Message::human("two"),
///     Message::assistant("2"),
/// ];
/// let removed = compact_history(&mut history, 2);
/// assert_eq!(removed, 2);
/// assert_eq!(history[0].text(), "be brief");
/// assert_eq!(history[1].text(), "two");
/// ```
pub fn compact_history(history: &mut Vec<Message>, keep_last: usize) -> usize {
    if history.len() <= keep_last.saturating_add(1) {
        return 0;
    }

    let mut start = history.len() - keep_last;
    while start < history.len() && history[start].role == MessageRole::Tool {
        start += 1;
    }

    let before = history.len();
    history.drain(1..start);
    before - history.len()
}
