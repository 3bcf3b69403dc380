//! Pre/post hooks around the model-call node
//!
//! A [`ModelHook`] sees the state right before the provider is called and right after
//! the response was appended. Two hooks ship with the crate:
//!
//! - [`CompactionHook`] trims history before each call
//! - [`ValidationHook`] checks each final response and asks for another try

use agentgraph_core::messages::compact_history;
use agentgraph_core::{Message, NodeContext, Result, State};
use async_trait::async_trait;
use std::sync::Arc;

/// Metadata flag set when the last response failed validation
pub const VALIDATION_RETRY_KEY: &str = "__validation_retry__";

/// Metadata key counting validation retries in the current run
pub const VALIDATION_ATTEMPTS_KEY: &str = "__validation_attempts__";

/// Hook around every model call
#[async_trait]
pub trait ModelHook: Send + Sync {
    fn name(&self) -> &str;

    /// Runs before the request is built from the state
    async fn before_model(&self, _ctx: &NodeContext, _state: &mut State) -> Result<()> {
        Ok(())
    }

    /// Runs after the response was appended to history
    async fn after_model(&self, _ctx: &NodeContext, _state: &mut State) -> Result<()> {
        Ok(())
    }
}

/// Keeps the first message and the most recent `keep_last` messages
#[derive(Debug, Clone)]
pub struct CompactionHook {
    keep_last: usize,
}

impl CompactionHook {
    pub fn new(keep_last: usize) -> Self {
        Self { keep_last }
    }
}

#[async_trait]
impl ModelHook for CompactionHook {
    fn name(&self) -> &str {
        "compaction"
    }

    async fn before_model(&self, _ctx: &NodeContext, state: &mut State) -> Result<()> {
        let removed = compact_history(&mut state.history, self.keep_last);
        if removed > 0 {
            tracing::debug!(removed, kept = state.history.len(), "Compacted history");
        }
        Ok(())
    }
}

type Validator = dyn Fn(&Message) -> std::result::Result<(), String> + Send + Sync;

/// Checks final responses against a predicate
///
/// Responses that request tools are not final and are never checked. On failure the
/// hook appends a human message with the diagnostic and sets [`VALIDATION_RETRY_KEY`],
/// which sends the agent back to the model. After `max_retries` failed attempts the
/// response is accepted as is.
#[derive(Clone)]
pub struct ValidationHook {
    predicate: Arc<Validator>,
    max_retries: Option<usize>,
}

impl ValidationHook {
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&Message) -> std::result::Result<(), String> + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
            max_retries: None,
        }
    }

    /// Bound the number of retries; unbounded retries rely on the step limit
    pub fn with_max_retries(mut self, max_retries: Option<usize>) -> Self {
        self.max_retries = max_retries;
        self
    }
}

#[async_trait]
impl ModelHook for ValidationHook {
    fn name(&self) -> &str {
        "validation"
    }

    async fn before_model(&self, _ctx: &NodeContext, state: &mut State) -> Result<()> {
        state.remove_metadata(VALIDATION_RETRY_KEY);
        Ok(())
    }

    async fn after_model(&self, _ctx: &NodeContext, state: &mut State) -> Result<()> {
        let Some(response) = state.last_message() else {
            return Ok(());
        };
        if response.has_tool_calls() {
            return Ok(());
        }

        let diagnostic = match (self.predicate)(response) {
            Ok(()) => return Ok(()),
            Err(diagnostic) => diagnostic,
        };

        let attempts = state
            .get_metadata_as::<usize>(VALIDATION_ATTEMPTS_KEY)
            .unwrap_or(0);
        if self.max_retries.is_some_and(|max| attempts >= max) {
            tracing::warn!(attempts, %diagnostic, "Validation retries exhausted, accepting response");
            return Ok(());
        }

        tracing::info!(attempt = attempts + 1, %diagnostic, "Response failed validation");
        state.append_message(Message::human(format!(
            "Your previous response was rejected: {}. Please try again.",
            diagnostic
        )));
        state.set_metadata(VALIDATION_ATTEMPTS_KEY, attempts + 1);
        state.set_metadata(VALIDATION_RETRY_KEY, true);
        Ok(())
    }
}

impl std::fmt::Debug for ValidationHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationHook")
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

/// Whether the last response asked for another model call
pub fn needs_retry(state: &State) -> bool {
    state.get_metadata_as::<bool>(VALIDATION_RETRY_KEY) == Some(true)
}
