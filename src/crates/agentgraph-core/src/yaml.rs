//! YAML-based flow definitions
//!
//! A [`FlowDefinition`] describes the shape of a flow: node names, direct and
//! conditional edges, and optionally a [`RunConfig`]. Node behaviour and decision
//! functions cannot live in YAML; [`FlowDefinition::build`] asks the caller for them by
//! name.
//!
//! ```yaml
//! name: approval
//! entry: draft
//!
//! nodes:
//!   draft:
//!     description: "Write a proposal"
//!   review:
//!     handler: human_review
//!
//! edges:
//!   - from: draft
//!     to: review
//!   - from: review
//!     router: approved
//!     candidates: [draft, __end__]
//!
//! config:
//!   max_steps: 10
//! ```

use crate::compiled::CompiledGraph;
use crate::config::RunConfig;
use crate::error::{GraphError, Result};
use crate::graph::{NodeId, RouterFn, START};
use crate::node::{FnNode, Node, NodeOutcome};
use crate::state::State;
use crate::StateGraph;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

/// Top-level YAML flow definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowDefinition {
    /// Flow name
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Entry node; shorthand for an edge from `__start__`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<NodeId>,

    /// Node definitions by name
    pub nodes: BTreeMap<NodeId, NodeDef>,

    /// Edge definitions
    #[serde(default)]
    pub edges: Vec<EdgeDef>,

    /// Run configuration applied to the compiled flow
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<RunConfig>,
}

/// Node definition in YAML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeDef {
    /// Handler name passed to the resolver; defaults to the node name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handler: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Edge definition in YAML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EdgeDef {
    /// Direct edge
    Direct { from: NodeId, to: NodeId },

    /// Conditional edge with a named decision function
    Conditional {
        from: NodeId,
        router: String,
        candidates: Vec<NodeId>,
    },
}

impl EdgeDef {
    pub fn from(&self) -> &str {
        match self {
            EdgeDef::Direct { from, .. } | EdgeDef::Conditional { from, .. } => from,
        }
    }
}

impl FlowDefinition {
    /// Load a flow definition from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Parse a flow definition from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Convert to a YAML string
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Names of all routers referenced by conditional edges
    pub fn router_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .edges
            .iter()
            .filter_map(|edge| match edge {
                EdgeDef::Conditional { router, .. } => Some(router.as_str()),
                EdgeDef::Direct { .. } => None,
            })
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    /// Compile the flow's shape with placeholder nodes
    ///
    /// Reports the same configuration faults [`build`](Self::build) would, without
    /// needing real node implementations.
    pub fn check(&self) -> Result<CompiledGraph> {
        let placeholder_router: RouterFn = Arc::new(|_: &State| String::new());
        let routers: HashMap<String, RouterFn> = self
            .router_names()
            .into_iter()
            .map(|name| (name.to_string(), placeholder_router.clone()))
            .collect();

        self.build(
            |name, _def| {
                let node: Arc<dyn Node> =
                    Arc::new(FnNode::new(name, |_, _| Ok(NodeOutcome::Continue)));
                Some(node)
            },
            &routers,
        )
    }

    /// Compile the flow with real nodes and routers
    ///
    /// # Arguments
    ///
    /// * `resolver` - Returns the node for a node name and its definition. The node's
    ///   [`Node::name`] must equal the name it is registered under.
    /// * `routers` - Decision functions by the names used in conditional edges
    ///
    /// # Errors
    ///
    /// - [`GraphError::Configuration`] for unresolved handlers or routers
    /// - [`GraphError::Validation`] for structural problems
    pub fn build<R>(&self, resolver: R, routers: &HashMap<String, RouterFn>) -> Result<CompiledGraph>
    where
        R: Fn(&str, &NodeDef) -> Option<Arc<dyn Node>>,
    {
        let mut graph = StateGraph::new();

        for (name, def) in &self.nodes {
            let node = resolver(name, def).ok_or_else(|| {
                GraphError::Configuration(format!(
                    "No handler '{}' for node '{}'",
                    def.handler.as_deref().unwrap_or(name),
                    name
                ))
            })?;
            if node.name() != name {
                return Err(GraphError::Configuration(format!(
                    "Handler for node '{}' is named '{}'",
                    name,
                    node.name()
                )));
            }
            graph.add_shared_node(node);
        }

        if let Some(entry) = &self.entry {
            graph.add_edge(START, entry.clone());
        }

        for edge in &self.edges {
            match edge {
                EdgeDef::Direct { from, to } => {
                    graph.add_edge(from.clone(), to.clone());
                }
                EdgeDef::Conditional {
                    from,
                    router,
                    candidates,
                } => {
                    let decide = routers.get(router).cloned().ok_or_else(|| {
                        GraphError::Configuration(format!("Unknown router '{}'", router))
                    })?;
                    graph.add_conditional_edge(from.clone(), candidates.clone(), move |state| {
                        decide(state)
                    });
                }
            }
        }

        let compiled = graph.compile()?;
        tracing::debug!(flow = %self.name, "Flow definition compiled");
        Ok(match &self.config {
            Some(config) => {
                config.validate()?;
                compiled.with_config(config.clone())
            }
            None => compiled,
        })
    }
}
