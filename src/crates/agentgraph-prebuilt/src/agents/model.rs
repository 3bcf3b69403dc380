//! The model-call node
//!
//! [`ModelNode`] sends the current history, plus the bound tool schemas, to a
//! [`ChatModel`] and appends the reply. Hooks run around the call in registration
//! order.

use super::hooks::ModelHook;
use agentgraph_core::{
    ChatModel, ChatOptions, ChatRequest, Message, MessageRole, Node, NodeContext, NodeOutcome,
    Result, State,
};
use async_trait::async_trait;
use std::sync::Arc;

/// Default name of the model-call node
pub const AGENT_NODE: &str = "agent";

/// Graph node that calls the completion provider
#[derive(Clone)]
pub struct ModelNode {
    name: String,
    model: Arc<dyn ChatModel>,
    options: ChatOptions,
    system_prompt: Option<String>,
    hooks: Vec<Arc<dyn ModelHook>>,
}

impl ModelNode {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self {
            name: AGENT_NODE.to_string(),
            model,
            options: ChatOptions::default(),
            system_prompt: None,
            hooks: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Options sent with every request, tool schemas included
    pub fn with_options(mut self, options: ChatOptions) -> Self {
        self.options = options;
        self
    }

    /// Prepended to the request unless the history already starts with a system message
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_hook(mut self, hook: Arc<dyn ModelHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    pub fn options(&self) -> &ChatOptions {
        &self.options
    }

    fn request(&self, state: &State) -> ChatRequest {
        let mut messages = state.history.clone();
        if let Some(prompt) = &self.system_prompt {
            let has_system = messages
                .first()
                .is_some_and(|m| m.role == MessageRole::System);
            if !has_system {
                messages.insert(0, Message::system(prompt.clone()));
            }
        }
        ChatRequest::new(messages).with_options(self.options.clone())
    }
}

#[async_trait]
impl Node for ModelNode {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, ctx: &NodeContext, state: &mut State) -> Result<NodeOutcome> {
        for hook in &self.hooks {
            hook.before_model(ctx, state).await?;
        }

        ctx.check_cancelled()?;
        let request = self.request(state);
        tracing::debug!(
            messages = request.messages.len(),
            tools = request.options.tools.len(),
            "Calling model"
        );

        let response = self.model.chat(request).await.map_err(|e| {
            tracing::error!(node = %self.name, error = %e, "Model call failed");
            e
        })?;

        let text = response.content();
        if !text.is_empty() {
            ctx.emit_text(state, text)?;
        }
        state.append_message(response.message);

        for hook in &self.hooks {
            hook.after_model(ctx, state).await?;
        }
        Ok(NodeOutcome::Continue)
    }
}

impl std::fmt::Debug for ModelNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let hooks: Vec<&str> = self.hooks.iter().map(|h| h.name()).collect();
        f.debug_struct("ModelNode")
            .field("name", &self.name)
            .field("options", &self.options)
            .field("system_prompt", &self.system_prompt)
            .field("hooks", &hooks)
            .finish()
    }
}
