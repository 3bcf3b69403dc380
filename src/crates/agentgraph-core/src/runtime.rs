//! Per-step execution context handed to nodes
//!
//! [`NodeContext`] is what a node knows about the run it is part of: its own name, the
//! step number, the thread id, the caller's cancellation token, and the stream sink.
//! The execution loop builds a fresh context for every step.

use crate::error::{GraphError, Result};
use crate::state::State;
use crate::stream::{StreamChunk, StreamEvent, StreamSink};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Execution context for one node invocation
#[derive(Clone)]
pub struct NodeContext {
    node: String,
    step: usize,
    thread_id: String,
    cancellation: CancellationToken,
    sink: Option<Arc<dyn StreamSink>>,
}

impl NodeContext {
    pub fn new(
        node: impl Into<String>,
        step: usize,
        thread_id: impl Into<String>,
        cancellation: CancellationToken,
        sink: Option<Arc<dyn StreamSink>>,
    ) -> Self {
        Self {
            node: node.into(),
            step,
            thread_id: thread_id.into(),
            cancellation,
            sink,
        }
    }

    /// Context for running a node outside of a graph, e.g. in tests
    pub fn detached(node: impl Into<String>) -> Self {
        Self::new(node, 1, "detached", CancellationToken::new(), None)
    }

    /// Name of the node being run
    pub fn node(&self) -> &str {
        &self.node
    }

    /// 1-based step number of this node execution within the thread
    pub fn step(&self) -> usize {
        self.step
    }

    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Fail with [`GraphError::Cancelled`] if the caller cancelled the run
    pub fn check_cancelled(&self) -> Result<()> {
        if self.cancellation.is_cancelled() {
            tracing::debug!(node = %self.node, "Run cancelled");
            Err(GraphError::Cancelled)
        } else {
            Ok(())
        }
    }

    pub fn has_sink(&self) -> bool {
        self.sink.is_some()
    }

    /// Send a chunk to the stream sink, if one is attached
    pub fn emit(&self, state: &State, chunk: StreamChunk) -> Result<()> {
        let Some(sink) = &self.sink else {
            return Ok(());
        };

        let event = StreamEvent {
            node: &self.node,
            step: self.step,
            chunk: &chunk,
            state,
        };
        sink.send(&event).map_err(|message| {
            tracing::error!(node = %self.node, error = %message, "Stream sink failed");
            GraphError::StreamSink {
                node: self.node.clone(),
                message,
            }
        })
    }

    /// Send text to the stream sink
    pub fn emit_text(&self, state: &State, text: impl Into<String>) -> Result<()> {
        self.emit(state, StreamChunk::Text(text.into()))
    }

    /// Context for a sub-run, sharing a child of this context's cancellation token
    /// and never the sink
    pub fn child(&self, node: impl Into<String>, thread_id: impl Into<String>) -> Self {
        Self::new(node, 1, thread_id, self.cancellation.child_token(), None)
    }
}

impl std::fmt::Debug for NodeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeContext")
            .field("node", &self.node)
            .field("step", &self.step)
            .field("thread_id", &self.thread_id)
            .field("cancelled", &self.cancellation.is_cancelled())
            .field("sink", &self.sink.is_some())
            .finish()
    }
}
