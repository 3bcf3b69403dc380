//! Completion-provider contract
//!
//! The engine does not talk to any model API itself. A provider is anything that
//! implements [`ChatModel`]: it receives the conversation history plus explicit
//! per-call [`ChatOptions`] and returns the assistant's reply, which may carry pending
//! tool calls.
//!
//! # Architecture
//!
//! - Core library provides the **trait** and request/response types
//! - Callers implement [`ChatModel`] for their provider
//! - Options travel with each request; there is no ambient model selection
//!
//! # Quick Start
//!
//! ```rust
//! use agentgraph_core::llm::{ChatModel, ChatRequest, ChatResponse, ProviderError};
//! use agentgraph_core::Message;
//! use async_trait::async_trait;
//!
//! struct Parrot;
//!
//! #[async_trait]
//! impl ChatModel for Parrot {
//!     async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, ProviderError> {
//!         let last = request.messages.last().map(|m| m.text()).unwrap_or_default();
//!         Ok(ChatResponse::new(Message::assistant(last)))
//!     }
//! }
//! ```

pub mod config;
pub mod response;
pub mod tools;
pub mod traits;

pub use config::{ChatOptions, ChatRequest};
pub use response::{ChatResponse, UsageMetadata};
pub use tools::ToolDefinition;
pub use traits::{ChatModel, ProviderError};
