//! Agent Patterns
//!
//! The ReAct agent and the pieces it is assembled from:
//!
//! - [`react`] - [`create_react_agent`] and [`ReactAgentBuilder`]
//! - [`model`] - [`ModelNode`], the model-call node
//! - [`hooks`] - [`ModelHook`] plus the compaction and validation hooks
//! - [`delegation`] - [`SubAgentDelegation`], the reserved `delegate_task` tool
//! - [`config`] - [`AgentConfig`]
//!
//! The pieces are public so custom agent graphs can reuse them with a different shape.

pub mod config;
pub mod delegation;
pub mod hooks;
pub mod model;
pub mod react;

pub use config::AgentConfig;
pub use delegation::{SubAgentDelegation, DELEGATE_TOOL_NAME};
pub use hooks::{
    CompactionHook, ModelHook, ValidationHook, VALIDATION_ATTEMPTS_KEY, VALIDATION_RETRY_KEY,
};
pub use model::{ModelNode, AGENT_NODE};
pub use react::{create_react_agent, reset_run_budgets, ReactAgentBuilder, PREPARE_NODE};
