//! Core graph data structures
//!
//! A [`Graph`] is an arena of nodes keyed by name plus a routing table mapping each
//! source to its single outgoing [`Edge`]. Two sentinels bound every graph: [`START`]
//! has exactly one outgoing edge and no node, [`END`] has a name but no node and no
//! outgoing edge.
//!
//! ```text
//!   START ──► agent ──(decide)──► tools ──► agent
//!                         └─────► END
//! ```
//!
//! Graphs are normally assembled through [`StateGraph`](crate::StateGraph) and only ever
//! executed after [`Graph::validate`] succeeds. Cycles are allowed; the execution loop's
//! step limit keeps them from running forever.

use crate::node::Node;
use crate::state::State;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt::Write as _;
use std::sync::Arc;

/// Node identifier type
pub type NodeId = String;

/// Special node identifier for graph entry point
pub const START: &str = "__start__";

/// Special node identifier for graph termination
pub const END: &str = "__end__";

/// Decision function of a conditional edge
pub type RouterFn = Arc<dyn Fn(&State) -> String + Send + Sync>;

/// Outgoing transition of a node
#[derive(Clone)]
pub enum Edge {
    /// Always continue with this node
    Direct(NodeId),

    /// Continue with whichever candidate `decide` picks
    ///
    /// `decide` must return one of `candidates`; anything else fails the run with
    /// [`GraphError::RoutingViolation`](crate::GraphError::RoutingViolation).
    Conditional {
        /// Every target the decision function may return
        candidates: Vec<NodeId>,
        /// Decision function over the current state
        decide: RouterFn,
    },
}

impl Edge {
    /// All targets this edge can lead to
    pub fn targets(&self) -> Vec<&str> {
        match self {
            Edge::Direct(to) => vec![to.as_str()],
            Edge::Conditional { candidates, .. } => candidates.iter().map(String::as_str).collect(),
        }
    }
}

impl std::fmt::Debug for Edge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Edge::Direct(node_id) => f.debug_tuple("Direct").field(node_id).finish(),
            Edge::Conditional { candidates, .. } => f
                .debug_struct("Conditional")
                .field("candidates", candidates)
                .field("decide", &"<function>")
                .finish(),
        }
    }
}

/// Node arena plus routing table
#[derive(Clone, Default)]
pub struct Graph {
    /// Nodes by name
    pub nodes: HashMap<NodeId, Arc<dyn Node>>,

    /// Outgoing edge of each source (a node name or [`START`])
    pub edges: HashMap<NodeId, Edge>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `name` can be routed to
    pub fn is_target(&self, name: &str) -> bool {
        name == END || self.nodes.contains_key(name)
    }

    /// Check that the graph can be executed
    ///
    /// - [`START`] has an outgoing edge
    /// - every edge source is a node or [`START`], and [`END`] has no outgoing edge
    /// - every direct target and every conditional candidate is a node or [`END`]
    /// - conditional edges declare at least one candidate
    /// - every node has an outgoing edge
    ///
    /// Reachability of [`END`] is not checked: cyclic graphs are bounded at runtime.
    pub fn validate(&self) -> Result<(), String> {
        if !self.edges.contains_key(START) {
            return Err(format!("Graph has no edge from {}", START));
        }

        let mut sources: Vec<&NodeId> = self.edges.keys().collect();
        sources.sort();

        for from in sources {
            if from == END {
                return Err(format!("{} cannot have outgoing edges", END));
            }
            if from != START && !self.nodes.contains_key(from) {
                return Err(format!("Edge source {} does not exist", from));
            }

            let edge = &self.edges[from];
            if let Edge::Conditional { candidates, .. } = edge {
                if candidates.is_empty() {
                    return Err(format!("Conditional edge from {} declares no candidates", from));
                }
            }
            for to in edge.targets() {
                if to == START {
                    return Err(format!("Edge from {} targets {}", from, START));
                }
                if !self.is_target(to) {
                    return Err(format!("Edge target {} (from {}) does not exist", to, from));
                }
            }
        }

        let mut names: Vec<&NodeId> = self.nodes.keys().collect();
        names.sort();
        for name in names {
            if !self.edges.contains_key(name) {
                return Err(format!("Node {} has no outgoing edge", name));
            }
        }

        let reachable = self.reachable();
        for name in self.nodes.keys() {
            if !reachable.contains(name.as_str()) {
                tracing::warn!(node = %name, "Node is not reachable from START");
            }
        }

        Ok(())
    }

    /// Names reachable from [`START`]
    pub fn reachable(&self) -> HashSet<&str> {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([START]);
        while let Some(current) = queue.pop_front() {
            if !seen.insert(current) {
                continue;
            }
            if let Some(edge) = self.edges.get(current) {
                queue.extend(edge.targets());
            }
        }
        seen
    }

    /// Render the routing table as a Mermaid flowchart
    ///
    /// Conditional candidates are drawn as dotted arrows.
    pub fn to_mermaid(&self) -> String {
        let mut out = String::from("flowchart TD\n");
        let _ = writeln!(out, "    {}([start])", mermaid_id(START));
        let _ = writeln!(out, "    {}([end])", mermaid_id(END));

        let mut names: Vec<&NodeId> = self.nodes.keys().collect();
        names.sort();
        for name in names {
            let _ = writeln!(out, "    {}[{}]", mermaid_id(name), name);
        }

        let mut sources: Vec<&NodeId> = self.edges.keys().collect();
        sources.sort();
        for from in sources {
            match &self.edges[from] {
                Edge::Direct(to) => {
                    let _ = writeln!(out, "    {} --> {}", mermaid_id(from), mermaid_id(to));
                }
                Edge::Conditional { candidates, .. } => {
                    for to in candidates {
                        let _ = writeln!(out, "    {} -.-> {}", mermaid_id(from), mermaid_id(to));
                    }
                }
            }
        }
        out
    }
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut nodes: Vec<&NodeId> = self.nodes.keys().collect();
        nodes.sort();
        f.debug_struct("Graph")
            .field("nodes", &nodes)
            .field("edges", &self.edges)
            .finish()
    }
}

fn mermaid_id(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}
