//! The execution loop: execute, invoke, resume
//!
//! Execution is an iterative state machine over the routing table, never a recursive
//! traversal:
//!
//! ```text
//!            ┌────────────────────────────────────────────┐
//!            ▼                                            │
//! START ─► RUNNING(n) ── n == END ──────────────────► COMPLETED
//!            │
//!            ├─ cancelled / step limit / node error ──► FAILED
//!            ├─ NodeOutcome::Interrupt(payload) ──────► INTERRUPTED
//!            └─ NodeOutcome::Continue
//!                 route(n) ─ outside candidates ──────► FAILED
//!                 save checkpoint(next) ──────────────────┘
//! ```
//!
//! Checkpoints are written when a run starts, after every transition, on interrupt
//! (with the interrupted node as next node) and on completion (with `END` as next node).

use super::types::{InterruptSignal, RunOutcome};
use super::CompiledGraph;
use crate::error::{GraphError, Result};
use crate::graph::{Edge, END, START};
use crate::node::NodeOutcome;
use crate::runtime::NodeContext;
use crate::state::{State, RESUME_VALUE_KEY};
use crate::stream::{StreamChunk, StreamSink};
use agentgraph_checkpoint::{Checkpoint, CheckpointMetadata, CheckpointSource};
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

impl CompiledGraph {
    /// Run the graph to a terminal outcome with a fresh cancellation token and no sink.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use agentgraph_core::{Message, State, StateGraph};
    ///
    /// # async fn example(graph: StateGraph) -> Result<(), Box<dyn std::error::Error>> {
    /// let compiled = graph.compile()?;
    /// let input = State::new().with_messages(vec![Message::human("hi")]);
    /// let outcome = compiled.invoke(input).await?;
    /// println!("{}", outcome.state().last_response());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn invoke(&self, state: State) -> Result<RunOutcome> {
        self.execute(CancellationToken::new(), state, None).await
    }

    /// Run the graph from [`START`] on the state's thread.
    ///
    /// # Arguments
    ///
    /// * `cancel` - Checked before every node; cancelling fails the run with
    ///   [`GraphError::Cancelled`]
    /// * `state` - Initial state; its thread id keys the checkpoints
    /// * `sink` - Optional receiver of streamed output
    ///
    /// # Returns
    ///
    /// - `Ok(RunOutcome::Completed(state))` when END is reached
    /// - `Ok(RunOutcome::Interrupted { .. })` when a node suspends the run
    /// - `Err(_)` on any failure, including [`GraphError::StepLimit`] and
    ///   [`GraphError::RoutingViolation`]
    ///
    /// Starting a thread that already has checkpoints starts it over; the previous
    /// checkpoints are superseded.
    #[tracing::instrument(
        skip(self, cancel, state, sink),
        fields(thread_id = tracing::field::Empty, node_count = self.graph.nodes.len())
    )]
    pub async fn execute(
        &self,
        cancel: CancellationToken,
        mut state: State,
        sink: Option<Arc<dyn StreamSink>>,
    ) -> Result<RunOutcome> {
        self.config.validate()?;
        state.ensure_thread_id();
        state.clear_interrupt();
        tracing::Span::current().record("thread_id", state.thread_id());
        tracing::info!("Starting graph execution");

        let first = self.route(START, &state)?;
        self.save(&state, &first, None, 0, CheckpointSource::Input)
            .await?;

        self.run_loop(cancel, state, first, 0, sink).await
    }

    /// Continue a suspended thread.
    ///
    /// Loads the thread's checkpoint, stores `resume_value` in the state under
    /// [`RESUME_VALUE_KEY`](crate::state::RESUME_VALUE_KEY) and re-enters the loop at the
    /// node that raised the interrupt. The step counter continues from the checkpoint.
    ///
    /// # Errors
    ///
    /// - [`GraphError::NoCheckpointer`] if the graph has no checkpointer
    /// - [`GraphError::ThreadNotFound`] if the thread was never saved
    /// - [`GraphError::NotInterrupted`] if the thread has no pending interrupt, including
    ///   threads that already completed; their checkpoint is left untouched
    #[tracing::instrument(skip(self, cancel, resume_value, sink))]
    pub async fn resume(
        &self,
        cancel: CancellationToken,
        thread_id: &str,
        resume_value: Value,
        sink: Option<Arc<dyn StreamSink>>,
    ) -> Result<RunOutcome> {
        let checkpointer = self.checkpointer.as_ref().ok_or(GraphError::NoCheckpointer)?;
        let checkpoint = checkpointer
            .try_load(thread_id)
            .await?
            .ok_or_else(|| GraphError::ThreadNotFound(thread_id.to_string()))?;

        if !checkpoint.is_interrupted() {
            tracing::warn!(next_node = %checkpoint.next_node, "Resume requested without pending interrupt");
            return Err(GraphError::NotInterrupted {
                thread_id: thread_id.to_string(),
                next_node: checkpoint.next_node,
            });
        }
        if !self.graph.nodes.contains_key(&checkpoint.next_node) {
            return Err(GraphError::UnknownNode(checkpoint.next_node));
        }

        let mut state: State = serde_json::from_value(checkpoint.state)?;
        state.set_resume_value(resume_value);
        tracing::info!(node = %checkpoint.next_node, "Resuming graph execution");

        self.run_loop(
            cancel,
            state,
            checkpoint.next_node,
            checkpoint.metadata.step,
            sink,
        )
        .await
    }

    /// Shorthand for [`resume`](Self::resume) with a fresh token and no sink
    pub async fn resume_with(&self, thread_id: &str, resume_value: Value) -> Result<RunOutcome> {
        self.resume(CancellationToken::new(), thread_id, resume_value, None)
            .await
    }

    async fn run_loop(
        &self,
        cancel: CancellationToken,
        mut state: State,
        mut current: String,
        mut step: usize,
        sink: Option<Arc<dyn StreamSink>>,
    ) -> Result<RunOutcome> {
        loop {
            if current == END {
                self.save(&state, END, None, step, CheckpointSource::Complete)
                    .await?;
                tracing::info!(steps = step, "Graph execution completed");
                return Ok(RunOutcome::Completed(state));
            }

            if cancel.is_cancelled() {
                tracing::info!(node = %current, "Graph execution cancelled");
                return Err(GraphError::Cancelled);
            }

            if step >= self.config.max_steps {
                tracing::error!(limit = self.config.max_steps, node = %current, "Step limit exceeded");
                return Err(GraphError::StepLimit {
                    limit: self.config.max_steps,
                    node: current,
                });
            }

            let node = self
                .graph
                .nodes
                .get(&current)
                .cloned()
                .ok_or_else(|| GraphError::UnknownNode(current.clone()))?;

            step += 1;
            let ctx = NodeContext::new(
                current.as_str(),
                step,
                state.thread_id(),
                cancel.clone(),
                sink.clone(),
            );

            tracing::debug!(node = %current, step, "Running node");
            let outcome = node.run(&ctx, &mut state).await.map_err(|e| {
                tracing::error!(node = %current, step, error = %e, "Node failed");
                e
            })?;

            match outcome {
                NodeOutcome::Interrupt(payload) => {
                    state.metadata.remove(RESUME_VALUE_KEY);
                    state.set_interrupt_payload(payload.clone());
                    self.save(
                        &state,
                        &current,
                        Some(payload.clone()),
                        step - 1,
                        CheckpointSource::Interrupt,
                    )
                    .await?;

                    tracing::info!(node = %current, "Graph execution interrupted");
                    let interrupt = InterruptSignal {
                        thread_id: state.thread_id().to_string(),
                        node: current,
                        payload,
                    };
                    return Ok(RunOutcome::Interrupted { interrupt, state });
                }
                NodeOutcome::Continue => {
                    state.clear_interrupt();
                    let next = self.route(&current, &state)?;
                    self.save(&state, &next, None, step, CheckpointSource::Loop)
                        .await?;

                    if self.config.emit_updates {
                        ctx.emit(&state, StreamChunk::Update)?;
                    }

                    tracing::debug!(from = %current, to = %next, "Transition");
                    current = next;
                }
            }
        }
    }

    /// Resolve the outgoing edge of `from`
    fn route(&self, from: &str, state: &State) -> Result<String> {
        let edge = self
            .graph
            .edges
            .get(from)
            .ok_or_else(|| GraphError::UnknownNode(from.to_string()))?;

        match edge {
            Edge::Direct(to) => Ok(to.clone()),
            Edge::Conditional { candidates, decide } => {
                let target = decide(state);
                if candidates.iter().any(|c| *c == target) {
                    Ok(target)
                } else {
                    tracing::error!(node = %from, target = %target, ?candidates, "Routing violation");
                    Err(GraphError::RoutingViolation {
                        node: from.to_string(),
                        target,
                        candidates: candidates.clone(),
                    })
                }
            }
        }
    }

    async fn save(
        &self,
        state: &State,
        next_node: &str,
        interrupt: Option<Value>,
        step: usize,
        source: CheckpointSource,
    ) -> Result<()> {
        let Some(checkpointer) = &self.checkpointer else {
            return Ok(());
        };

        let mut checkpoint = Checkpoint::new(state.thread_id(), next_node, serde_json::to_value(state)?)
            .with_metadata(CheckpointMetadata::new().with_source(source).with_step(step));
        if let Some(payload) = interrupt {
            checkpoint = checkpoint.with_interrupt(payload);
        }

        checkpointer.save(checkpoint).await.map_err(|e| {
            tracing::error!(error = %e, next_node, "Failed to save checkpoint");
            GraphError::from(e)
        })
    }
}
