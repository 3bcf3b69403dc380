//! ToolNode - Graph Node for Tool Execution
//!
//! [`ToolNode`] answers the tool calls pending in the latest assistant message and
//! appends the results to history. Paired with [`tools_condition`] it forms the acting
//! half of a ReAct loop.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  history: [..., assistant{tool_calls: [c1, c2, c3, c4]}]    │
//! └────────────────────┬────────────────────────────────────────┘
//!                      │
//!                      ↓ ToolNode::run
//! ┌─────────────────────────────────────────────────────────────┐
//! │  1. check cancellation                                      │
//! │  2. partition calls                                         │
//! │     c1 single tool ─┐                                       │
//! │     c2 unknown     ─┼─ join_all ─► one Tool message         │
//! │     c3 delegate    ─┘                                       │
//! │     c4 batch tool  ──► run_batch, appends its own results   │
//! │  3. __tool_calls__ += 4                                     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Results are keyed by call id, so their order in history need not match the order of
//! the calls. Nothing a tool does fails the node: unknown tools, invalid input and tool
//! errors all become error-content results the model can react to.

use crate::agents::delegation::{SubAgentDelegation, DELEGATE_TOOL_NAME};
use crate::tools::{not_found, BatchTool, ToolCapability, ToolContext, ToolRegistry};
use agentgraph_core::{
    Message, MessageRole, Node, NodeContext, NodeOutcome, Result, State, ToolCall,
    ToolDefinition, ToolResult, END,
};
use async_trait::async_trait;
use futures::future::join_all;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

/// Default name of the dispatch node
pub const TOOLS_NODE: &str = "tools";

/// Metadata key of the cumulative tool-call count of the current run
pub const TOOL_CALLS_KEY: &str = "__tool_calls__";

/// Name of the node that refuses calls over the tool-call limit
pub const TOOL_LIMIT_NODE: &str = "tool_limit";

/// Graph node that runs pending tool calls
#[derive(Clone, Debug)]
pub struct ToolNode {
    name: String,
    registry: Arc<ToolRegistry>,
    delegation: Option<Arc<SubAgentDelegation>>,
}

impl ToolNode {
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            name: TOOLS_NODE.to_string(),
            registry: Arc::new(registry),
            delegation: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Route [`DELEGATE_TOOL_NAME`] calls to a sub-agent
    pub fn with_delegation(mut self, delegation: SubAgentDelegation) -> Self {
        self.delegation = Some(Arc::new(delegation));
        self
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Every schema this node can answer, delegation included
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut definitions = self.registry.definitions();
        if let Some(delegation) = &self.delegation {
            definitions.push(delegation.definition());
        }
        definitions
    }

    async fn dispatch_single(&self, ctx: &ToolContext, call: &ToolCall) -> ToolResult {
        if call.name == DELEGATE_TOOL_NAME {
            if let Some(delegation) = &self.delegation {
                return delegation.delegate(ctx, call).await;
            }
            tracing::warn!(call_id = %call.id, "Delegation requested but not configured");
            return not_found(call);
        }
        self.registry.dispatch(ctx, call).await
    }

    async fn run_batch_tool(
        &self,
        ctx: &ToolContext,
        state: &mut State,
        tool: Arc<dyn BatchTool>,
        calls: Vec<ToolCall>,
    ) {
        let start = state.history.len();
        let call_ids: Vec<(String, String)> = calls
            .iter()
            .map(|call| (call.id.clone(), call.name.clone()))
            .collect();

        let failure = match tool.run_batch(ctx, state, calls).await {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!(tool = %tool.name(), error = %e, "Batch tool failed");
                Some(e.to_string())
            }
        };

        let answered: HashSet<String> = state.history[start.min(state.history.len())..]
            .iter()
            .flat_map(|m| m.tool_results_iter())
            .map(|result| result.call_id.clone())
            .collect();

        let missing: Vec<ToolResult> = call_ids
            .into_iter()
            .filter(|(id, _)| !answered.contains(id))
            .map(|(id, name)| {
                let content = failure
                    .clone()
                    .unwrap_or_else(|| format!("Tool {} returned no result", name));
                ToolResult::error(id, name, content)
            })
            .collect();

        if !missing.is_empty() {
            tracing::debug!(tool = %tool.name(), count = missing.len(), "Synthesized batch results");
            state.append_message(Message::tool_results(missing));
        }
    }
}

#[async_trait]
impl Node for ToolNode {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, ctx: &NodeContext, state: &mut State) -> Result<NodeOutcome> {
        ctx.check_cancelled()?;

        let calls = pending_tool_calls(state);
        if calls.is_empty() {
            tracing::debug!("No pending tool calls");
            return Ok(NodeOutcome::Continue);
        }
        let total = calls.len();

        let mut singles = Vec::new();
        let mut batches: BTreeMap<String, (Arc<dyn BatchTool>, Vec<ToolCall>)> = BTreeMap::new();
        for call in calls {
            match self.registry.get(&call.name) {
                Some(ToolCapability::Batch(tool)) => {
                    batches
                        .entry(tool.name().to_string())
                        .or_insert_with(|| (tool.clone(), Vec::new()))
                        .1
                        .push(call);
                }
                _ => singles.push(call),
            }
        }

        let tool_ctx = ToolContext::from_node(ctx);
        tracing::debug!(
            single = singles.len(),
            batches = batches.len(),
            "Dispatching tool calls"
        );

        if !singles.is_empty() {
            let results = join_all(
                singles
                    .iter()
                    .map(|call| self.dispatch_single(&tool_ctx, call)),
            )
            .await;
            state.append_message(Message::tool_results(results));
        }

        for (_, (tool, calls)) in batches {
            self.run_batch_tool(&tool_ctx, state, tool, calls).await;
        }

        let count = tool_call_count(state) + total;
        state.set_metadata(TOOL_CALLS_KEY, count);
        Ok(NodeOutcome::Continue)
    }
}

/// Tool calls of the last message, if it is an assistant message
pub fn pending_tool_calls(state: &State) -> Vec<ToolCall> {
    match state.last_message() {
        Some(message) if message.role == MessageRole::Assistant => {
            message.tool_calls().cloned().collect()
        }
        _ => Vec::new(),
    }
}

/// Cumulative number of dispatched tool calls in this run
pub fn tool_call_count(state: &State) -> usize {
    state.get_metadata_as::<usize>(TOOL_CALLS_KEY).unwrap_or(0)
}

/// Routing decision after a model call
///
/// Returns [`TOOLS_NODE`] while the last assistant message has pending calls and
/// dispatching all of them stays within `max_tool_calls`, [`END`] otherwise. Reaching
/// the limit is a normal way to finish, not a fault.
pub fn tools_condition(
    max_tool_calls: Option<usize>,
) -> impl Fn(&State) -> String + Send + Sync + 'static {
    move |state: &State| {
        let pending = pending_tool_calls(state).len();
        if pending == 0 {
            return END.to_string();
        }

        let used = tool_call_count(state);
        match max_tool_calls {
            Some(max) if used + pending > max => {
                tracing::info!(used, pending, max, "Tool call limit reached, finishing");
                END.to_string()
            }
            _ => TOOLS_NODE.to_string(),
        }
    }
}

/// Answer every pending call with an error result without running it
///
/// Returns the number of refused calls. The history then holds a result for every call
/// the model made.
pub fn refuse_pending_calls(state: &mut State, reason: &str) -> usize {
    let results: Vec<ToolResult> = pending_tool_calls(state)
        .into_iter()
        .map(|call| ToolResult::error(call.id, call.name, reason))
        .collect();
    let refused = results.len();
    if refused > 0 {
        state.append_message(Message::tool_results(results));
    }
    refused
}
