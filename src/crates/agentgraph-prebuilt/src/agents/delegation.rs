//! Sub-agent delegation
//!
//! Delegation is a reserved tool, [`DELEGATE_TOOL_NAME`], that the dispatch node routes
//! to a nested [`CompiledGraph`] instead of the tool registry:
//!
//! ```text
//! parent history                         child run (fresh State)
//! ┌───────────────────────────┐          ┌──────────────────────────┐
//! │ assistant: delegate_task  │ ──task─► │ human: <task>            │
//! │   {"task": "..."}         │          │ ... child nodes ...      │
//! │ tool: <final response>    │ ◄─text── │ assistant: <final>       │
//! └───────────────────────────┘          └──────────────────────────┘
//! ```
//!
//! The child never sees the parent's history or metadata, and the parent receives only
//! the child's last assistant text. The child runs on its own thread id derived from the
//! parent's and on a child of the parent's cancellation token. When the nested graph
//! has a checkpointer, a completed child thread is deleted afterwards; an interrupted
//! one is kept for inspection.

use crate::tools::ToolContext;
use agentgraph_core::{
    CompiledGraph, Message, RunOutcome, State, ToolCall, ToolDefinition, ToolResult,
};
use serde_json::json;
use uuid::Uuid;

/// Tool name reserved for delegation; registries refuse it
pub const DELEGATE_TOOL_NAME: &str = "delegate_task";

const DEFAULT_DESCRIPTION: &str =
    "Delegate a self-contained task to a sub-agent and receive its final answer";

/// Runs delegated tasks on a nested graph
#[derive(Clone)]
pub struct SubAgentDelegation {
    graph: CompiledGraph,
    description: String,
}

impl SubAgentDelegation {
    pub fn new(graph: CompiledGraph) -> Self {
        Self {
            graph,
            description: DEFAULT_DESCRIPTION.to_string(),
        }
    }

    /// Description shown to the model
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Schema of the reserved tool
    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(DELEGATE_TOOL_NAME, self.description.clone()).with_parameters(json!({
            "type": "object",
            "properties": {
                "task": {
                    "type": "string",
                    "description": "Complete description of the task for the sub-agent"
                }
            },
            "required": ["task"]
        }))
    }

    /// Run one delegated task to completion
    ///
    /// Never fails: a missing task, an interrupted child run and a failed child run all
    /// become error-content results.
    #[tracing::instrument(skip(self, ctx, call), fields(call_id = %call.id))]
    pub async fn delegate(&self, ctx: &ToolContext, call: &ToolCall) -> ToolResult {
        let Some(task) = call.arguments.get("task").and_then(|t| t.as_str()) else {
            return ToolResult::error(
                &call.id,
                &call.name,
                "delegate_task requires a string 'task' argument",
            );
        };

        let thread_id = format!("{}:sub:{}", ctx.thread_id(), Uuid::new_v4());
        let state =
            State::for_thread(thread_id.clone()).with_messages(vec![Message::human(task)]);
        tracing::debug!(thread_id = %state.thread_id(), "Delegating to sub-agent");

        match self
            .graph
            .execute(ctx.cancellation().child_token(), state, None)
            .await
        {
            Ok(RunOutcome::Completed(state)) => {
                if self.graph.checkpointer().is_some() {
                    if let Err(e) = self.graph.delete_thread(&thread_id).await {
                        tracing::warn!(%thread_id, error = %e, "Failed to delete sub-agent thread");
                    }
                }
                ToolResult::success(&call.id, &call.name, state.last_response())
            }
            Ok(RunOutcome::Interrupted { interrupt, .. }) => {
                tracing::warn!(node = %interrupt.node, "Sub-agent interrupted");
                ToolResult::error(
                    &call.id,
                    &call.name,
                    format!("Sub-agent stopped waiting for input at '{}'", interrupt.node),
                )
            }
            Err(e) => {
                tracing::warn!(error = %e, "Sub-agent failed");
                ToolResult::error(&call.id, &call.name, format!("Sub-agent failed: {}", e))
            }
        }
    }
}

impl std::fmt::Debug for SubAgentDelegation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubAgentDelegation")
            .field("nodes", &self.graph.node_names())
            .field("description", &self.description)
            .finish()
    }
}
