//! Tools - Capabilities an Agent Can Call
//!
//! Two tool shapes are supported, selected by what a concrete tool implements:
//!
//! - **[`Tool`]** - single-call: gets one [`ToolCall`], returns one output. The dispatch
//!   node runs all single-call tools of a batch concurrently and appends their results
//!   itself.
//! - **[`BatchTool`]** - batch-oriented: gets every call addressed to it at once, plus
//!   the state, and inserts its own results into history.
//!
//! Both register into a [`ToolRegistry`] as a [`ToolCapability`].
//!
//! # Quick Start
//!
//! ```rust
//! use agentgraph_core::ToolCall;
//! use agentgraph_prebuilt::{Tool, ToolContext, ToolError, ToolOutput, ToolRegistry};
//! use async_trait::async_trait;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! struct SearchTool;
//!
//! #[async_trait]
//! impl Tool for SearchTool {
//!     fn name(&self) -> &str {
//!         "search"
//!     }
//!
//!     fn description(&self) -> &str {
//!         "Search the web for information"
//!     }
//!
//!     async fn invoke(&self, _ctx: &ToolContext, call: &ToolCall) -> Result<ToolOutput, ToolError> {
//!         let query = call.arguments["query"].as_str().unwrap_or("");
//!         Ok(json!({"results": format!("Results for: {}", query)}))
//!     }
//! }
//!
//! let mut registry = ToolRegistry::new();
//! registry.register(Arc::new(SearchTool)).unwrap();
//! assert_eq!(registry.names(), vec!["search"]);
//! ```
//!
//! # Failure Handling
//!
//! [`ToolRegistry::dispatch`] never fails. An unknown tool name yields a
//! "Tool not found" result, invalid input and execution errors yield error-content
//! results. The model sees them and can adjust.

use crate::agents::delegation::DELEGATE_TOOL_NAME;
use crate::error::{PrebuiltError, Result, ToolError};
use agentgraph_core::{NodeContext, State, ToolCall, ToolDefinition, ToolResult};
use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Tool arguments, as sent by the model
pub type ToolInput = Value;

/// Tool output type
pub type ToolOutput = Value;

/// What a tool knows about the run that called it
#[derive(Debug, Clone)]
pub struct ToolContext {
    thread_id: String,
    node: String,
    cancellation: CancellationToken,
}

impl ToolContext {
    pub fn new(
        thread_id: impl Into<String>,
        node: impl Into<String>,
        cancellation: CancellationToken,
    ) -> Self {
        Self {
            thread_id: thread_id.into(),
            node: node.into(),
            cancellation,
        }
    }

    /// Context derived from the dispatching node's context
    pub fn from_node(ctx: &NodeContext) -> Self {
        Self::new(ctx.thread_id(), ctx.node(), ctx.cancellation().clone())
    }

    /// Context outside of any run, e.g. in tests
    pub fn detached() -> Self {
        Self::new("detached", "tools", CancellationToken::new())
    }

    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    /// Name of the dispatching node
    pub fn node(&self) -> &str {
        &self.node
    }

    /// Token for best-effort cancellation of long-running calls
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}

/// Single-call tool
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool name
    fn name(&self) -> &str;

    /// Get the tool description
    fn description(&self) -> &str;

    /// JSON Schema of the arguments (optional)
    fn input_schema(&self) -> Option<Value> {
        None
    }

    /// Schema advertised to the model
    fn definition(&self) -> ToolDefinition {
        let definition = ToolDefinition::new(self.name(), self.description());
        match self.input_schema() {
            Some(schema) => definition.with_parameters(schema),
            None => definition,
        }
    }

    /// Check arguments before invocation (optional)
    fn validate_input(&self, _input: &ToolInput) -> std::result::Result<(), ToolError> {
        Ok(())
    }

    /// Run one call
    async fn invoke(
        &self,
        ctx: &ToolContext,
        call: &ToolCall,
    ) -> std::result::Result<ToolOutput, ToolError>;
}

/// Batch-oriented tool that manages its own history insertion
///
/// The dispatch node hands it every pending call whose name is in
/// [`definitions`](BatchTool::definitions). It is expected to append one
/// [`ToolResult`] per call to `state.history`; calls it leaves unanswered get an error
/// result synthesized for them, and so does every call if it returns `Err`.
#[async_trait]
pub trait BatchTool: Send + Sync {
    /// Identifier used in logs
    fn name(&self) -> &str;

    /// Every tool name this batch tool answers to
    fn definitions(&self) -> Vec<ToolDefinition>;

    /// Run all calls addressed to this tool
    async fn run_batch(
        &self,
        ctx: &ToolContext,
        state: &mut State,
        calls: Vec<ToolCall>,
    ) -> std::result::Result<(), ToolError>;
}

/// A registered tool, by shape
#[derive(Clone)]
pub enum ToolCapability {
    Single(Arc<dyn Tool>),
    Batch(Arc<dyn BatchTool>),
}

impl std::fmt::Debug for ToolCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolCapability::Single(tool) => f.debug_tuple("Single").field(&tool.name()).finish(),
            ToolCapability::Batch(tool) => f.debug_tuple("Batch").field(&tool.name()).finish(),
        }
    }
}

/// Tool registry for managing multiple tools
#[derive(Clone, Default, Debug)]
pub struct ToolRegistry {
    tools: HashMap<String, ToolCapability>,
    definitions: Vec<ToolDefinition>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from single-call tools
    pub fn from_tools(tools: impl IntoIterator<Item = Arc<dyn Tool>>) -> Result<Self> {
        let mut registry = Self::new();
        for tool in tools {
            registry.register(tool)?;
        }
        Ok(registry)
    }

    /// Register a single-call tool
    ///
    /// # Errors
    ///
    /// [`PrebuiltError::ReservedToolName`] for the delegation tool name,
    /// [`PrebuiltError::DuplicateTool`] if the name is taken.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<&mut Self> {
        let definition = tool.definition();
        self.claim(&definition.name)?;
        self.tools
            .insert(definition.name.clone(), ToolCapability::Single(tool));
        self.definitions.push(definition);
        Ok(self)
    }

    /// Register a batch tool under every name it defines
    pub fn register_batch(&mut self, tool: Arc<dyn BatchTool>) -> Result<&mut Self> {
        let definitions = tool.definitions();
        for definition in &definitions {
            self.claim(&definition.name)?;
        }
        for definition in definitions {
            self.tools
                .insert(definition.name.clone(), ToolCapability::Batch(tool.clone()));
            self.definitions.push(definition);
        }
        Ok(self)
    }

    fn claim(&self, name: &str) -> Result<()> {
        if name == DELEGATE_TOOL_NAME {
            return Err(PrebuiltError::ReservedToolName(name.to_string()));
        }
        if self.tools.contains_key(name) {
            return Err(PrebuiltError::DuplicateTool(name.to_string()));
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ToolCapability> {
        self.tools.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Registered tool names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Schemas of all registered tools, in registration order
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.definitions.clone()
    }

    /// Run one call against a single-call tool
    ///
    /// Never fails: unknown names, batch-only names, invalid input and tool errors all
    /// become error-content results keyed by the call id.
    pub async fn dispatch(&self, ctx: &ToolContext, call: &ToolCall) -> ToolResult {
        let tool = match self.tools.get(&call.name) {
            Some(ToolCapability::Single(tool)) => tool,
            Some(ToolCapability::Batch(_)) => {
                return ToolResult::error(
                    &call.id,
                    &call.name,
                    format!("Tool {} only runs in batches", call.name),
                );
            }
            None => {
                tracing::warn!(tool = %call.name, call_id = %call.id, "Tool not found");
                return not_found(call);
            }
        };

        if let Err(e) = tool.validate_input(&call.arguments) {
            return ToolResult::error(&call.id, &call.name, e.to_string());
        }

        match tool.invoke(ctx, call).await {
            Ok(output) => ToolResult::success(&call.id, &call.name, render_output(output)),
            Err(e) => {
                tracing::debug!(tool = %call.name, call_id = %call.id, error = %e, "Tool failed");
                ToolResult::error(&call.id, &call.name, e.to_string())
            }
        }
    }
}

/// Result for a call naming a tool that is not registered
pub fn not_found(call: &ToolCall) -> ToolResult {
    ToolResult::error(&call.id, &call.name, format!("Tool not found: {}", call.name))
}

/// Whether a result was synthesized for an unknown tool
pub fn is_not_found(result: &ToolResult) -> bool {
    result.is_error && result.content.starts_with("Tool not found")
}

fn render_output(output: ToolOutput) -> String {
    match output {
        Value::String(text) => text,
        other => other.to_string(),
    }
}

type ToolFn =
    dyn Fn(Value) -> BoxFuture<'static, std::result::Result<ToolOutput, ToolError>> + Send + Sync;

/// Single-call tool backed by an async closure over the arguments
///
/// ```rust
/// use agentgraph_prebuilt::FnTool;
/// use serde_json::json;
///
/// let echo = FnTool::new("echo", "Echo the input", |args| {
///     Box::pin(async move { Ok(json!({"echo": args})) })
/// });
/// ```
pub struct FnTool {
    name: String,
    description: String,
    schema: Option<Value>,
    f: Box<ToolFn>,
}

impl FnTool {
    pub fn new<F>(name: impl Into<String>, description: impl Into<String>, f: F) -> Self
    where
        F: Fn(Value) -> BoxFuture<'static, std::result::Result<ToolOutput, ToolError>>
            + Send
            + Sync
            + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            schema: None,
            f: Box::new(f),
        }
    }

    pub fn with_schema(mut self, schema: Value) -> Self {
        self.schema = Some(schema);
        self
    }
}

#[async_trait]
impl Tool for FnTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn input_schema(&self) -> Option<Value> {
        self.schema.clone()
    }

    async fn invoke(
        &self,
        _ctx: &ToolContext,
        call: &ToolCall,
    ) -> std::result::Result<ToolOutput, ToolError> {
        (self.f)(call.arguments.clone()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct MockTool;

    #[async_trait]
    impl Tool for MockTool {
        fn name(&self) -> &str {
            "mock"
        }

        fn description(&self) -> &str {
            "A mock tool for testing"
        }

        fn validate_input(&self, input: &Value) -> std::result::Result<(), ToolError> {
            if input.get("bad").is_some() {
                return Err(ToolError::InvalidInput("bad flag".into()));
            }
            Ok(())
        }

        async fn invoke(
            &self,
            _ctx: &ToolContext,
            call: &ToolCall,
        ) -> std::result::Result<ToolOutput, ToolError> {
            Ok(json!({ "echo": call.arguments }))
        }
    }

    fn failing() -> FnTool {
        FnTool::new("fail", "Always fails", |_| {
            Box::pin(async { Err(ToolError::Execution("boom".into())) })
        })
    }

    #[tokio::test]
    async fn test_dispatch_success() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(MockTool)).unwrap();

        let call = ToolCall::new("c1", "mock", json!({"q": 1}));
        let result = registry.dispatch(&ToolContext::detached(), &call).await;
        assert!(!result.is_error);
        assert_eq!(result.call_id, "c1");
        assert_eq!(result.content, r#"{"echo":{"q":1}}"#);
    }

    #[tokio::test]
    async fn test_dispatch_failures_become_results() {
        let registry = ToolRegistry::from_tools([
            Arc::new(MockTool) as Arc<dyn Tool>,
            Arc::new(failing()) as Arc<dyn Tool>,
        ])
        .unwrap();
        let ctx = ToolContext::detached();

        let missing = registry
            .dispatch(&ctx, &ToolCall::new("c1", "ghost", json!({})))
            .await;
        assert!(is_not_found(&missing));

        let failed = registry
            .dispatch(&ctx, &ToolCall::new("c2", "fail", json!({})))
            .await;
        assert!(failed.is_error);
        assert!(failed.content.contains("boom"));
        assert!(!is_not_found(&failed));

        let invalid = registry
            .dispatch(&ctx, &ToolCall::new("c3", "mock", json!({"bad": true})))
            .await;
        assert!(invalid.is_error);
        assert!(invalid.content.contains("bad flag"));
    }

    #[test]
    fn test_registry_rejects_duplicates_and_reserved() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(MockTool)).unwrap();
        assert!(matches!(
            registry.register(Arc::new(MockTool)),
            Err(PrebuiltError::DuplicateTool(_))
        ));

        let reserved = FnTool::new(DELEGATE_TOOL_NAME, "sneaky", |_| {
            Box::pin(async { Ok(Value::Null) })
        });
        assert!(matches!(
            registry.register(Arc::new(reserved)),
            Err(PrebuiltError::ReservedToolName(_))
        ));
    }

    #[test]
    fn test_definitions_carry_schema() {
        let tool = failing().with_schema(json!({"type": "object"}));
        let registry = ToolRegistry::from_tools([Arc::new(tool) as Arc<dyn Tool>]).unwrap();
        let definitions = registry.definitions();
        assert_eq!(definitions.len(), 1);
        assert_eq!(definitions[0].parameters, Some(json!({"type": "object"})));
    }
}
