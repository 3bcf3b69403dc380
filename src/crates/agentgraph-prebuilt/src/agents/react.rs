//! ReAct Agent - Reasoning and Acting Pattern
//!
//! The **ReAct (Reasoning + Acting)** agent alternates between a model call and tool
//! dispatch until the model answers without requesting tools.
//!
//! # Architecture
//!
//! ```text
//!               START
//!                 │
//!                 ↓
//!              prepare   (reset per-run budgets)
//!                 │
//!                 ↓
//! ┌───────────────────────────────────┐
//! │  agent (ModelNode)                │ ◄──────────────┐
//! │  before hooks: compaction, ...    │ ──┐ retry      │
//! │  chat(history + tool schemas)     │ ◄─┘ (validate) │
//! │  after hooks: validation, ...     │                │
//! └───────────────┬───────────────────┘                │
//!                 │ tool calls pending                 │
//!        and within max_tool_calls?                    │
//!   [no calls] / [over limit] \ [yes]                  │
//!             ↓       ↓         ↓                      │
//!           END   tool_limit  ┌───────────────────┐    │
//!                     │       │  tools (ToolNode) │ ───┘
//!                     ↓       └───────────────────┘
//!                    END
//! ```
//!
//! `prepare` clears the tool-call count and the validation attempts, so each `execute`
//! gets the full budgets even when it continues a previous conversation's state.
//! Resuming a checkpointed run re-enters past `prepare` and keeps the counts.
//! `tool_limit` answers the refused calls with error results so the history stays
//! well formed.
//!
//! Every loop iteration costs two steps of the run's step limit, so
//! [`RunConfig::max_steps`](agentgraph_core::RunConfig::max_steps) also bounds validation
//! retries and runaway tool use.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use agentgraph_core::{ChatModel, Message, State};
//! use agentgraph_prebuilt::{create_react_agent, AgentConfig, Tool};
//! use std::sync::Arc;
//!
//! # async fn example(model: Arc<dyn ChatModel>, search: Arc<dyn Tool>) -> Result<(), Box<dyn std::error::Error>> {
//! let agent = create_react_agent(model, vec![search])
//!     .with_config(AgentConfig::new().with_max_tool_calls(5).with_system_prompt("Be precise."))
//!     .build()?;
//!
//! let input = State::new().with_messages(vec![Message::human("What is the capital of France?")]);
//! let outcome = agent.invoke(input).await?;
//! println!("{}", outcome.state().last_response());
//! # Ok(())
//! # }
//! ```

use super::config::AgentConfig;
use super::delegation::SubAgentDelegation;
use super::hooks::{
    needs_retry, CompactionHook, ModelHook, ValidationHook, VALIDATION_ATTEMPTS_KEY,
    VALIDATION_RETRY_KEY,
};
use super::model::{ModelNode, AGENT_NODE};
use crate::error::Result;
use crate::tool_node::{
    pending_tool_calls, refuse_pending_calls, tools_condition, ToolNode, TOOLS_NODE,
    TOOL_CALLS_KEY, TOOL_LIMIT_NODE,
};
use crate::tools::{BatchTool, Tool, ToolRegistry};
use agentgraph_checkpoint::Checkpointer;
use agentgraph_core::{
    ChatModel, CompiledGraph, Message, NodeOutcome, State, StateGraph, END, START,
};
use std::sync::Arc;

/// Entry node that resets the per-run budgets
pub const PREPARE_NODE: &str = "prepare";

/// Clear the tool-call count and validation attempts left by an earlier run
pub fn reset_run_budgets(state: &mut State) {
    for key in [TOOL_CALLS_KEY, VALIDATION_ATTEMPTS_KEY, VALIDATION_RETRY_KEY] {
        state.remove_metadata(key);
    }
}

/// Builder for a ReAct agent graph
pub struct ReactAgentBuilder {
    model: Arc<dyn ChatModel>,
    tools: Vec<Arc<dyn Tool>>,
    batch_tools: Vec<Arc<dyn BatchTool>>,
    config: AgentConfig,
    validator: Option<ValidationHook>,
    hooks: Vec<Arc<dyn ModelHook>>,
    delegation: Option<SubAgentDelegation>,
    checkpointer: Option<Arc<dyn Checkpointer>>,
}

impl ReactAgentBuilder {
    pub fn new(model: Arc<dyn ChatModel>, tools: Vec<Arc<dyn Tool>>) -> Self {
        Self {
            model,
            tools,
            batch_tools: Vec::new(),
            config: AgentConfig::default(),
            validator: None,
            hooks: Vec::new(),
            delegation: None,
            checkpointer: None,
        }
    }

    pub fn with_config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_batch_tool(mut self, tool: Arc<dyn BatchTool>) -> Self {
        self.batch_tools.push(tool);
        self
    }

    /// Check every final response; a failure sends the agent back to the model with the
    /// returned diagnostic
    pub fn with_validator<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Message) -> std::result::Result<(), String> + Send + Sync + 'static,
    {
        self.validator = Some(ValidationHook::new(predicate));
        self
    }

    /// Add a custom hook; runs after compaction and before validation
    pub fn with_hook(mut self, hook: Arc<dyn ModelHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Offer the `delegate_task` tool backed by `delegation`
    pub fn with_delegation(mut self, delegation: SubAgentDelegation) -> Self {
        self.delegation = Some(delegation);
        self
    }

    pub fn with_checkpointer(mut self, checkpointer: Arc<dyn Checkpointer>) -> Self {
        self.checkpointer = Some(checkpointer);
        self
    }

    /// Assemble and compile the agent graph
    ///
    /// # Errors
    ///
    /// - [`PrebuiltError::Configuration`](crate::PrebuiltError::Configuration) for an
    ///   invalid [`AgentConfig`]
    /// - [`PrebuiltError::DuplicateTool`](crate::PrebuiltError::DuplicateTool) and
    ///   [`PrebuiltError::ReservedToolName`](crate::PrebuiltError::ReservedToolName) from
    ///   tool registration
    pub fn build(self) -> Result<CompiledGraph> {
        self.config.validate()?;

        let mut registry = ToolRegistry::from_tools(self.tools)?;
        for tool in self.batch_tools {
            registry.register_batch(tool)?;
        }

        let mut tool_node = ToolNode::new(registry);
        if let Some(delegation) = self.delegation {
            tool_node = tool_node.with_delegation(delegation);
        }

        let mut options = self.config.chat_options();
        options.tools = tool_node.definitions();

        let mut model_node = ModelNode::new(self.model).with_options(options);
        if let Some(prompt) = &self.config.system_prompt {
            model_node = model_node.with_system_prompt(prompt.clone());
        }
        if let Some(keep_last) = self.config.keep_last_messages {
            model_node = model_node.with_hook(Arc::new(CompactionHook::new(keep_last)));
        }
        for hook in self.hooks {
            model_node = model_node.with_hook(hook);
        }

        let validates = self.validator.is_some();
        if let Some(validator) = self.validator {
            let validator = validator.with_max_retries(self.config.max_validation_retries);
            model_node = model_node.with_hook(Arc::new(validator));
        }

        let max_tool_calls = self.config.max_tool_calls;
        let mut candidates = vec![TOOLS_NODE, END];
        if validates {
            candidates.push(AGENT_NODE);
        }
        if max_tool_calls.is_some() {
            candidates.push(TOOL_LIMIT_NODE);
        }
        let to_tools = tools_condition(max_tool_calls);

        let mut graph = StateGraph::new();
        graph.add_fn(PREPARE_NODE, |_ctx, state| {
            reset_run_budgets(state);
            Ok(NodeOutcome::Continue)
        });
        graph.add_node(model_node);
        graph.add_node(tool_node);
        graph.add_edge(START, PREPARE_NODE);
        graph.add_edge(PREPARE_NODE, AGENT_NODE);
        graph.add_conditional_edge(AGENT_NODE, candidates, move |state: &State| {
            if validates && needs_retry(state) {
                return AGENT_NODE.to_string();
            }
            let next = to_tools(state);
            if next == END && !pending_tool_calls(state).is_empty() {
                TOOL_LIMIT_NODE.to_string()
            } else {
                next
            }
        });
        graph.add_edge(TOOLS_NODE, AGENT_NODE);

        if let Some(max) = max_tool_calls {
            let reason = format!("Tool call limit of {} reached; call not executed", max);
            graph.add_fn(TOOL_LIMIT_NODE, move |_ctx, state| {
                let refused = refuse_pending_calls(state, &reason);
                tracing::debug!(refused, "Refused tool calls over the limit");
                Ok(NodeOutcome::Continue)
            });
            graph.add_finish(TOOL_LIMIT_NODE);
        }

        let mut compiled = graph.compile()?.with_config(self.config.run.clone());
        if let Some(checkpointer) = self.checkpointer {
            compiled = compiled.with_checkpointer(checkpointer);
        }

        tracing::debug!(
            max_tool_calls = ?self.config.max_tool_calls,
            validates,
            "ReAct agent compiled"
        );
        Ok(compiled)
    }
}

impl std::fmt::Debug for ReactAgentBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tools: Vec<&str> = self.tools.iter().map(|t| t.name()).collect();
        f.debug_struct("ReactAgentBuilder")
            .field("tools", &tools)
            .field("batch_tools", &self.batch_tools.len())
            .field("config", &self.config)
            .field("validates", &self.validator.is_some())
            .field("delegation", &self.delegation.is_some())
            .finish()
    }
}

/// Start building a ReAct agent around `model` with single-call `tools`
pub fn create_react_agent(model: Arc<dyn ChatModel>, tools: Vec<Arc<dyn Tool>>) -> ReactAgentBuilder {
    ReactAgentBuilder::new(model, tools)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PrebuiltError;
    use crate::tools::FnTool;
    use agentgraph_core::{ChatRequest, ChatResponse, ProviderError};
    use async_trait::async_trait;
    use serde_json::json;

    struct Silent;

    #[async_trait]
    impl ChatModel for Silent {
        async fn chat(&self, _request: ChatRequest) -> std::result::Result<ChatResponse, ProviderError> {
            Ok(ChatResponse::new(Message::assistant("ok")))
        }
    }

    fn noop(name: &str) -> Arc<dyn Tool> {
        Arc::new(FnTool::new(name, "noop", |_| Box::pin(async { Ok(json!(null)) })))
    }

    #[test]
    fn test_graph_shape() {
        let agent = create_react_agent(Arc::new(Silent), vec![noop("a")])
            .build()
            .unwrap();
        assert_eq!(agent.node_names(), vec![AGENT_NODE, PREPARE_NODE, TOOLS_NODE]);

        let limited = create_react_agent(Arc::new(Silent), vec![noop("a")])
            .with_config(AgentConfig::new().with_max_tool_calls(1))
            .build()
            .unwrap();
        assert_eq!(
            limited.node_names(),
            vec![AGENT_NODE, PREPARE_NODE, TOOL_LIMIT_NODE, TOOLS_NODE]
        );
    }

    #[test]
    fn test_reset_run_budgets() {
        let mut state = State::new()
            .with_metadata(TOOL_CALLS_KEY, 4)
            .with_metadata(VALIDATION_ATTEMPTS_KEY, 2)
            .with_metadata("user_key", "kept");
        reset_run_budgets(&mut state);

        assert!(state.get_metadata_as::<usize>(TOOL_CALLS_KEY).is_none());
        assert!(state.get_metadata_as::<usize>(VALIDATION_ATTEMPTS_KEY).is_none());
        assert_eq!(state.get_metadata("user_key"), json!("kept"));
    }

    #[test]
    fn test_duplicate_tools_rejected() {
        let err = create_react_agent(Arc::new(Silent), vec![noop("a"), noop("a")])
            .build()
            .unwrap_err();
        assert!(matches!(err, PrebuiltError::DuplicateTool(name) if name == "a"));
    }

    #[tokio::test]
    async fn test_answer_without_tools_ends() {
        let agent = create_react_agent(Arc::new(Silent), vec![])
            .with_config(AgentConfig::new().with_system_prompt("sys"))
            .build()
            .unwrap();
        let state = agent
            .invoke(State::new().with_messages(vec![Message::human("hi")]))
            .await
            .unwrap()
            .into_completed()
            .unwrap();
        assert_eq!(state.history.len(), 2);
        assert_eq!(state.last_response(), "ok");
    }
}
