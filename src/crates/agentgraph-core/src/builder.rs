//! StateGraph builder for assembling executable graphs
//!
//! [`StateGraph`] collects nodes and edges, then [`compile`](StateGraph::compile)s them
//! into an immutable [`CompiledGraph`]. All structural mistakes are reported by
//! `compile` as [`GraphError::Validation`], never later at runtime:
//!
//! - duplicate node names, or nodes named after a sentinel
//! - more than one outgoing edge from the same source (including [`START`])
//! - a missing [`START`] edge
//! - edge targets or conditional candidates that are neither a node nor [`END`]
//! - nodes without an outgoing edge
//!
//! # Example: a counting loop
//!
//! ```rust
//! use agentgraph_core::{NodeOutcome, State, StateGraph, END, START};
//!
//! # async fn example() -> agentgraph_core::Result<()> {
//! let mut graph = StateGraph::new();
//! graph.add_fn("count", |_ctx, state| {
//!     let n = state.get_metadata_as::<u64>("count").unwrap_or(0);
//!     state.set_metadata("count", n + 1);
//!     Ok(NodeOutcome::Continue)
//! });
//! graph.add_edge(START, "count");
//! graph.add_conditional_edge("count", ["count", END], |state: &State| {
//!     if state.get_metadata_as::<u64>("count").unwrap_or(0) >= 3 {
//!         END.to_string()
//!     } else {
//!         "count".to_string()
//!     }
//! });
//!
//! let compiled = graph.compile()?;
//! let state = compiled.invoke(State::new()).await?.into_completed().unwrap();
//! assert_eq!(state.get_metadata_as::<u64>("count"), Some(3));
//! # Ok(())
//! # }
//! ```

use crate::compiled::CompiledGraph;
use crate::error::{GraphError, Result};
use crate::graph::{Edge, Graph, NodeId, END, START};
use crate::node::{AsyncFnNode, FnNode, Node, NodeOutcome};
use crate::runtime::NodeContext;
use crate::state::State;
use futures::future::BoxFuture;
use std::sync::Arc;

/// Builder for executable graphs
#[derive(Default)]
pub struct StateGraph {
    graph: Graph,
    problems: Vec<String>,
}

impl StateGraph {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node under its own [`Node::name`]
    pub fn add_node(&mut self, node: impl Node + 'static) -> &mut Self {
        self.add_shared_node(Arc::new(node))
    }

    /// Add a node that is already shared
    pub fn add_shared_node(&mut self, node: Arc<dyn Node>) -> &mut Self {
        let name = node.name().to_string();
        if name == START || name == END {
            self.problems
                .push(format!("Node name {} is reserved", name));
        } else if self.graph.nodes.contains_key(&name) {
            self.problems.push(format!("Duplicate node {}", name));
        } else {
            self.graph.nodes.insert(name, node);
        }
        self
    }

    /// Add a node backed by a synchronous closure
    pub fn add_fn<F>(&mut self, name: impl Into<NodeId>, f: F) -> &mut Self
    where
        F: Fn(&NodeContext, &mut State) -> Result<NodeOutcome> + Send + Sync + 'static,
    {
        self.add_node(FnNode::new(name, f))
    }

    /// Add a node backed by an async closure
    ///
    /// ```rust
    /// # use agentgraph_core::{NodeOutcome, StateGraph, Message};
    /// let mut graph = StateGraph::new();
    /// graph.add_async_fn("reply", |_ctx, state| {
    ///     Box::pin(async move {
    ///         state.append_message(Message::assistant("hi"));
    ///         Ok(NodeOutcome::Continue)
    ///     })
    /// });
    /// ```
    pub fn add_async_fn<F>(&mut self, name: impl Into<NodeId>, f: F) -> &mut Self
    where
        F: for<'a> Fn(&'a NodeContext, &'a mut State) -> BoxFuture<'a, Result<NodeOutcome>>
            + Send
            + Sync
            + 'static,
    {
        self.add_node(AsyncFnNode::new(name, f))
    }

    /// Add a direct edge
    pub fn add_edge(&mut self, from: impl Into<NodeId>, to: impl Into<NodeId>) -> &mut Self {
        self.insert_edge(from.into(), Edge::Direct(to.into()));
        self
    }

    /// Add a conditional edge
    ///
    /// # Arguments
    ///
    /// * `from` - Source node (or [`START`])
    /// * `candidates` - Every target `decide` may return
    /// * `decide` - Picks the next node from the current state
    pub fn add_conditional_edge<I, S, F>(
        &mut self,
        from: impl Into<NodeId>,
        candidates: I,
        decide: F,
    ) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<NodeId>,
        F: Fn(&State) -> String + Send + Sync + 'static,
    {
        let edge = Edge::Conditional {
            candidates: candidates.into_iter().map(Into::into).collect(),
            decide: Arc::new(decide),
        };
        self.insert_edge(from.into(), edge);
        self
    }

    /// Set the entry node, shorthand for `add_edge(START, node)`
    pub fn set_entry(&mut self, node: impl Into<NodeId>) -> &mut Self {
        self.add_edge(START, node)
    }

    /// Add a finish edge, shorthand for `add_edge(node, END)`
    pub fn add_finish(&mut self, node: impl Into<NodeId>) -> &mut Self {
        self.add_edge(node, END)
    }

    /// Get a reference to the graph under construction
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Validate and compile the graph
    ///
    /// # Errors
    ///
    /// [`GraphError::Validation`] describing the first structural problem found.
    pub fn compile(self) -> Result<CompiledGraph> {
        if let Some(problem) = self.problems.into_iter().next() {
            tracing::error!(error = %problem, "Graph validation failed");
            return Err(GraphError::Validation(problem));
        }

        self.graph.validate().map_err(|e| {
            tracing::error!(error = %e, "Graph validation failed");
            GraphError::Validation(e)
        })?;

        tracing::debug!(node_count = self.graph.nodes.len(), "Graph compiled");
        Ok(CompiledGraph::new(self.graph))
    }

    fn insert_edge(&mut self, from: NodeId, edge: Edge) {
        if self.graph.edges.contains_key(&from) {
            let problem = if from == START {
                format!("Graph has more than one edge from {}", START)
            } else {
                format!("Node {} has more than one outgoing edge", from)
            };
            self.problems.push(problem);
        } else {
            self.graph.edges.insert(from, edge);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> impl Fn(&NodeContext, &mut State) -> Result<NodeOutcome> + Send + Sync + 'static
    {
        |_, _| Ok(NodeOutcome::Continue)
    }

    #[test]
    fn test_linear_graph_compiles() {
        let mut graph = StateGraph::new();
        graph.add_fn("a", noop());
        graph.set_entry("a").add_finish("a");
        assert!(graph.compile().is_ok());
    }

    #[test]
    fn test_second_start_edge_rejected() {
        let mut graph = StateGraph::new();
        graph.add_fn("a", noop()).add_fn("b", noop());
        graph.add_edge(START, "a").add_edge(START, "b");
        graph.add_finish("a").add_finish("b");

        match graph.compile() {
            Err(GraphError::Validation(msg)) => assert!(msg.contains("more than one edge")),
            other => panic!("expected validation error, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_duplicate_and_reserved_names_rejected() {
        let mut graph = StateGraph::new();
        graph.add_fn("a", noop()).add_fn("a", noop());
        graph.set_entry("a").add_finish("a");
        assert!(graph.compile().is_err());

        let mut graph = StateGraph::new();
        graph.add_fn(END, noop());
        graph.set_entry(END);
        assert!(graph.compile().is_err());
    }

    #[test]
    fn test_dangling_target_rejected() {
        let mut graph = StateGraph::new();
        graph.add_fn("a", noop());
        graph.set_entry("a");
        graph.add_edge("a", "missing");
        let err = graph.compile().err().unwrap();
        assert!(err.is_configuration_fault());
    }

    #[test]
    fn test_conditional_candidates_validated() {
        let mut graph = StateGraph::new();
        graph.add_fn("a", noop());
        graph.set_entry("a");
        graph.add_conditional_edge("a", ["a", "nowhere"], |_: &State| "a".to_string());
        assert!(matches!(graph.compile(), Err(GraphError::Validation(_))));
    }
}
