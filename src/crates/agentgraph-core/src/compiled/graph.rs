//! CompiledGraph struct and builder methods

use crate::config::RunConfig;
use crate::graph::{Graph, NodeId};
use agentgraph_checkpoint::Checkpointer;
use std::sync::Arc;

/// Validated, immutable graph ready for execution
///
/// Cloning is cheap: the node arena and routing table are shared.
#[derive(Clone)]
pub struct CompiledGraph {
    pub(crate) graph: Arc<Graph>,
    pub(crate) checkpointer: Option<Arc<dyn Checkpointer>>,
    pub(crate) config: RunConfig,
}

impl CompiledGraph {
    pub(crate) fn new(graph: Graph) -> Self {
        Self {
            graph: Arc::new(graph),
            checkpointer: None,
            config: RunConfig::default(),
        }
    }

    /// Persist checkpoints through `checkpointer`; required for interrupt/resume
    pub fn with_checkpointer(mut self, checkpointer: Arc<dyn Checkpointer>) -> Self {
        self.checkpointer = Some(checkpointer);
        self
    }

    /// Replace the run configuration
    pub fn with_config(mut self, config: RunConfig) -> Self {
        self.config = config;
        self
    }

    /// Shorthand for overriding only the step limit
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.config.max_steps = max_steps;
        self
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Get a reference to the underlying graph
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn checkpointer(&self) -> Option<&Arc<dyn Checkpointer>> {
        self.checkpointer.as_ref()
    }

    /// Node names, sorted
    pub fn node_names(&self) -> Vec<NodeId> {
        let mut names: Vec<NodeId> = self.graph.nodes.keys().cloned().collect();
        names.sort();
        names
    }

    /// Render the graph as a Mermaid flowchart
    pub fn to_mermaid(&self) -> String {
        self.graph.to_mermaid()
    }
}

impl std::fmt::Debug for CompiledGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledGraph")
            .field("graph", &self.graph)
            .field("checkpointer", &self.checkpointer.is_some())
            .field("config", &self.config)
            .finish()
    }
}
