//! # agentgraph-prebuilt - Tool-Using Agents
//!
//! Ready-made building blocks on top of `agentgraph-core`:
//!
//! - **[Tools](tools)** - [`Tool`] (single-call) and [`BatchTool`] contracts, the
//!   [`ToolRegistry`]
//! - **[ToolNode](tool_node)** - concurrent tool dispatch with per-call error results
//!   and a cumulative tool-call limit
//! - **[ReAct agent](agents::react)** - a model-call node looping with tool dispatch,
//!   with optional history compaction, response validation and sub-agent delegation
//!
//! # Quick Start
//!
//! ```rust
//! use agentgraph_core::{ChatModel, ChatRequest, ChatResponse, Message, ProviderError, State};
//! use agentgraph_prebuilt::{create_react_agent, AgentConfig};
//! use async_trait::async_trait;
//! use std::sync::Arc;
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
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let agent = create_react_agent(Arc::new(Parrot), vec![])
//!     .with_config(AgentConfig::new().with_max_tool_calls(4))
//!     .build()?;
//!
//! let outcome = agent
//!     .invoke(State::new().with_messages(vec![Message::human("polly")]))
//!     .await?;
//! assert_eq!(outcome.state().last_response(), "polly");
//! # Ok(())
//! # }
//! ```
//!
//! # Failure Model
//!
//! Tool failures never fail a run; they come back to the model as error-content
//! results. Provider failures, cancellation and the step limit do fail the run, as
//! [`GraphError`](agentgraph_core::GraphError)s.

pub mod agents;
pub mod error;
pub mod tool_node;
pub mod tools;

pub use agents::{
    create_react_agent, reset_run_budgets, AgentConfig, CompactionHook, ModelHook, ModelNode,
    ReactAgentBuilder, SubAgentDelegation, ValidationHook, AGENT_NODE, DELEGATE_TOOL_NAME,
    PREPARE_NODE, VALIDATION_ATTEMPTS_KEY,
};
pub use error::{PrebuiltError, Result, ToolError};
pub use tool_node::{
    refuse_pending_calls, tools_condition, ToolNode, TOOLS_NODE, TOOL_CALLS_KEY, TOOL_LIMIT_NODE,
};
pub use tools::{
    BatchTool, FnTool, Tool, ToolCapability, ToolContext, ToolInput, ToolOutput, ToolRegistry,
};
