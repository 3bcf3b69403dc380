//! Error types and error handling for graph operations
//!
//! This module defines every error that can occur while building, validating, or running
//! a graph. All errors implement `std::error::Error` via the `thiserror` crate.
//!
//! # Error Hierarchy
//!
//! ```text
//! GraphError
//! ├── Validation         - Malformed graph detected at compile time
//! ├── RoutingViolation   - Router returned a target outside its candidates
//! ├── UnknownNode        - A node name that is not in the graph
//! ├── Configuration      - Invalid run or flow configuration
//! ├── StepLimit          - The run exceeded its maximum step count
//! ├── NodeExecution      - A node failed
//! ├── Provider           - The completion provider failed
//! ├── StreamSink         - The caller's sink refused an event
//! ├── Cancelled          - The caller cancelled the run
//! ├── ThreadNotFound     - Resume on a thread with no checkpoint
//! ├── NotInterrupted     - Resume on a thread that is not suspended
//! ├── NoCheckpointer     - Resume or inspection without a checkpointer
//! ├── Checkpoint         - Persistence errors
//! └── Serialization/Yaml/Io
//! ```
//!
//! An interrupt is **not** an error. Nodes that pause for human input return
//! [`NodeOutcome::Interrupt`](crate::NodeOutcome::Interrupt) and the run returns
//! [`RunOutcome::Interrupted`](crate::RunOutcome::Interrupted).
//!
//! # Matching on Fault Kind
//!
//! Most callers only care about the broad class of a failure. [`GraphError::kind`]
//! collapses the variants into a [`FaultKind`]:
//!
//! ```rust
//! use agentgraph_core::error::{FaultKind, GraphError};
//!
//! fn describe(err: &GraphError) -> &'static str {
//!     match err.kind() {
//!         FaultKind::Configuration => "the graph is broken, fix it",
//!         FaultKind::StepLimit => "the agent is looping",
//!         FaultKind::Provider => "the model call failed",
//!         FaultKind::StreamSink => "the consumer went away",
//!         _ => "the run failed",
//!     }
//! }
//!
//! let err = GraphError::StepLimit { limit: 25, node: "agent".into() };
//! assert_eq!(describe(&err), "the agent is looping");
//! ```

use crate::llm::ProviderError;
use agentgraph_checkpoint::CheckpointError;
use thiserror::Error;

/// Result type for graph operations
pub type Result<T> = std::result::Result<T, GraphError>;

/// Errors that can occur during graph construction and execution
#[derive(Error, Debug)]
pub enum GraphError {
    /// Graph structure validation failed
    ///
    /// Raised by [`StateGraph::compile`](crate::StateGraph::compile) for dangling edge
    /// targets, missing or duplicate START edges, duplicate node names, and nodes without
    /// an outgoing edge. Always fatal, never retried.
    #[error("Graph validation error: {0}")]
    Validation(String),

    /// A conditional edge decided on a target it did not declare
    #[error("Routing violation at '{node}': '{target}' is not one of {candidates:?}")]
    RoutingViolation {
        /// Node whose outgoing edge was evaluated
        node: String,
        /// Target returned by the decision function
        target: String,
        /// Declared candidate targets
        candidates: Vec<String>,
    },

    /// The run referenced a node that does not exist in the graph
    ///
    /// Happens when a checkpoint written by a different graph is resumed.
    #[error("Unknown node: {0}")]
    UnknownNode(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The run executed more node steps than allowed
    ///
    /// Distinct from a node failure so callers can tell "agent is looping" apart from
    /// "agent failed".
    #[error("Step limit of {limit} exceeded before running '{node}'")]
    StepLimit {
        /// Configured maximum step count
        limit: usize,
        /// Node that would have run next
        node: String,
    },

    /// Node execution failed
    #[error("Node '{node}' failed: {error}")]
    NodeExecution {
        /// Name of the failed node
        node: String,
        /// Failure description
        error: String,
    },

    /// The completion provider failed
    #[error("Completion provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The stream sink returned an error
    #[error("Stream sink rejected output from '{node}': {message}")]
    StreamSink {
        /// Node that produced the event
        node: String,
        /// Error reported by the sink
        message: String,
    },

    /// The caller cancelled the run
    #[error("Run cancelled")]
    Cancelled,

    /// Resume was requested for a thread without a checkpoint
    #[error("No checkpoint for thread '{0}'")]
    ThreadNotFound(String),

    /// Resume was requested for a thread that is not waiting on an interrupt
    #[error("Thread '{thread_id}' has no pending interrupt (next node: {next_node})")]
    NotInterrupted {
        /// Thread that was asked to resume
        thread_id: String,
        /// Node recorded in its latest checkpoint
        next_node: String,
    },

    /// The operation needs a checkpointer and none is configured
    #[error("No checkpointer configured")]
    NoCheckpointer,

    /// Checkpoint persistence error
    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),

    /// JSON serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Broad classification of a [`GraphError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// Malformed graph or configuration, including routing violations
    Configuration,
    /// The step counter ran out
    StepLimit,
    /// The completion provider failed
    Provider,
    /// The stream sink failed
    StreamSink,
    /// A node failed for its own reasons
    Node,
    /// Persistence failed
    Checkpoint,
    /// The caller cancelled
    Cancelled,
    /// Resume was not possible for the requested thread
    Resume,
}

impl GraphError {
    /// Create a node execution error
    pub fn node_execution(node: impl Into<String>, error: impl std::fmt::Display) -> Self {
        GraphError::NodeExecution {
            node: node.into(),
            error: error.to_string(),
        }
    }

    /// Classify the error
    pub fn kind(&self) -> FaultKind {
        match self {
            GraphError::Validation(_)
            | GraphError::RoutingViolation { .. }
            | GraphError::UnknownNode(_)
            | GraphError::Configuration(_)
            | GraphError::Yaml(_) => FaultKind::Configuration,
            GraphError::StepLimit { .. } => FaultKind::StepLimit,
            GraphError::Provider(_) => FaultKind::Provider,
            GraphError::StreamSink { .. } => FaultKind::StreamSink,
            GraphError::Cancelled => FaultKind::Cancelled,
            GraphError::ThreadNotFound(_)
            | GraphError::NotInterrupted { .. }
            | GraphError::NoCheckpointer => FaultKind::Resume,
            GraphError::Checkpoint(_) | GraphError::Serialization(_) | GraphError::Io(_) => {
                FaultKind::Checkpoint
            }
            GraphError::NodeExecution { .. } => FaultKind::Node,
        }
    }

    /// Whether the error is a configuration fault
    pub fn is_configuration_fault(&self) -> bool {
        self.kind() == FaultKind::Configuration
    }
}
