//! Compiled graphs and the execution loop
//!
//! A [`CompiledGraph`] is the immutable, validated form of a
//! [`StateGraph`](crate::StateGraph). It can be executed any number of times, on any
//! number of threads concurrently; each run owns its own [`State`](crate::State).
//!
//! # Execution Modes
//!
//! - [`invoke`](CompiledGraph::invoke) - run to completion with defaults
//! - [`execute`](CompiledGraph::execute) - run with a cancellation token and stream sink
//! - [`resume`](CompiledGraph::resume) - continue a thread suspended by an interrupt
//!
//! # Inspection
//!
//! With a checkpointer attached, [`get_state`](CompiledGraph::get_state) and
//! [`get_state_history`](CompiledGraph::get_state_history) expose the persisted view of a
//! thread as [`StateSnapshot`]s.
//!
//! # Outcomes
//!
//! Every run ends as one of:
//!
//! ```text
//! Ok(RunOutcome::Completed(state))          END reached
//! Ok(RunOutcome::Interrupted { .. })        a node suspended the thread
//! Err(GraphError::..)                       anything else
//! ```

mod execution;
mod graph;
mod introspection;
mod types;

pub use graph::CompiledGraph;
pub use types::{InterruptSignal, RunOutcome, StateSnapshot};
