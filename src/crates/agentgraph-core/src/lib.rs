//! # agentgraph-core - Stateful Graphs for Tool-Using Agents
//!
//! A control-flow interpreter over named nodes and (possibly cyclic) edges, threading
//! one mutable [`State`] through every step, checkpointing progress, and supporting
//! mid-run suspension for human input.
//!
//! ## Overview
//!
//! - **Explicit routing table** - direct and conditional edges between named nodes,
//!   bounded by the [`START`] and [`END`] sentinels
//! - **Iterative execution** - a step-limited loop, never recursion, so agents can loop
//!   freely while staying safe
//! - **Checkpointing** - a [`Checkpointer`](agentgraph_checkpoint::Checkpointer) records
//!   the state and next node after every transition
//! - **Interrupt/resume** - a node returns [`NodeOutcome::Interrupt`]; the caller later
//!   resumes the thread with a value
//! - **Streaming** - nodes push output to a caller-supplied [`StreamSink`]
//! - **Cancellation** - every run honours a `CancellationToken`
//!
//! ## Core Concepts
//!
//! ### 1. State
//!
//! [`State`] is the conversation history plus a metadata map. Nodes share it by mutable
//! reference, one at a time.
//!
//! ### 2. Nodes and Edges
//!
//! A [`Node`] has a name and a `run` method. Edges are either [`Edge::Direct`] or
//! [`Edge::Conditional`]; a conditional edge's decision must be one of its declared
//! candidates or the run fails with [`GraphError::RoutingViolation`].
//!
//! ### 3. Outcomes
//!
//! Every run ends as exactly one of: [`RunOutcome::Completed`],
//! [`RunOutcome::Interrupted`], or an `Err(GraphError)`.
//!
//! ## Quick Start
//!
//! ```rust
//! use agentgraph_core::{Message, NodeOutcome, State, StateGraph, END, START};
//!
//! # async fn example() -> agentgraph_core::Result<()> {
//! let mut graph = StateGraph::new();
//! graph.add_fn("reply", |_ctx, state| {
//!     state.append_message(Message::assistant("hello"));
//!     Ok(NodeOutcome::Continue)
//! });
//! graph.add_edge(START, "reply");
//! graph.add_edge("reply", END);
//!
//! let compiled = graph.compile()?;
//! let input = State::new().with_messages(vec![Message::human("hi")]);
//! let state = compiled.invoke(input).await?.into_completed().unwrap();
//! assert_eq!(state.history.len(), 2);
//! # Ok(())
//! # }
//! ```
//!
//! ## Human-in-the-Loop
//!
//! ```rust
//! use agentgraph_checkpoint::InMemoryCheckpointer;
//! use agentgraph_core::{NodeOutcome, State, StateGraph};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # async fn example() -> agentgraph_core::Result<()> {
//! let mut graph = StateGraph::new();
//! graph.add_fn("approve", |_ctx, state| match state.resume_value() {
//!     Some(_) => Ok(NodeOutcome::Continue),
//!     None => Ok(NodeOutcome::interrupt(json!({"q": "approve?"}))),
//! });
//! graph.set_entry("approve").add_finish("approve");
//!
//! let compiled = graph
//!     .compile()?
//!     .with_checkpointer(Arc::new(InMemoryCheckpointer::new()));
//!
//! let outcome = compiled.invoke(State::for_thread("t1")).await?;
//! assert!(outcome.is_interrupted());
//!
//! let outcome = compiled.resume_with("t1", json!("yes")).await?;
//! assert!(outcome.is_completed());
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`builder`] - [`StateGraph`]
//! - [`compiled`] - [`CompiledGraph`] and the execution loop
//! - [`graph`] - nodes, edges, sentinels
//! - [`state`] / [`messages`] - the state container
//! - [`stream`] / [`runtime`] - sinks and per-step context
//! - [`llm`] - completion-provider contract
//! - [`config`] / [`yaml`] - run configuration and flow definitions

pub mod builder;
pub mod compiled;
pub mod config;
pub mod error;
pub mod graph;
pub mod llm;
pub mod messages;
pub mod node;
pub mod runtime;
pub mod state;
pub mod stream;
pub mod yaml;

pub use builder::StateGraph;
pub use compiled::{CompiledGraph, InterruptSignal, RunOutcome, StateSnapshot};
pub use config::{RunConfig, DEFAULT_MAX_STEPS};
pub use error::{FaultKind, GraphError, Result};
pub use graph::{Edge, Graph, NodeId, RouterFn, END, START};
pub use llm::{ChatModel, ChatOptions, ChatRequest, ChatResponse, ProviderError, ToolDefinition};
pub use messages::{ContentPart, Message, MessageRole, ToolCall, ToolResult};
pub use node::{AsyncFnNode, FnNode, Node, NodeOutcome};
pub use runtime::NodeContext;
pub use state::{State, INTERRUPT_PAYLOAD_KEY, RESUME_VALUE_KEY};
pub use stream::{sink_fn, ChannelSink, OwnedStreamEvent, StreamChunk, StreamEvent, StreamSink};
pub use yaml::{EdgeDef, FlowDefinition, NodeDef};

pub use tokio_util::sync::CancellationToken;
