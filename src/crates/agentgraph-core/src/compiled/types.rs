//! Result and snapshot types returned by compiled graphs

use crate::state::State;
use agentgraph_checkpoint::{Checkpoint, CheckpointMetadata, END_NODE};
use chrono::{DateTime, Utc};
use serde_json::Value;

/// A node suspended the run and is waiting for a resume value
#[derive(Debug, Clone, PartialEq)]
pub struct InterruptSignal {
    /// Thread to pass to [`resume`](super::CompiledGraph::resume)
    pub thread_id: String,
    /// Node that raised the interrupt and will run again on resume
    pub node: String,
    /// Payload supplied by the node, e.g. a question for a human
    pub payload: Value,
}

/// Successful end of a call to `execute`/`resume`
///
/// Failures are the `Err` side of the surrounding [`Result`](crate::Result), so a caller
/// always handles exactly three cases: completed, interrupted, failed.
///
/// ```rust,ignore
/// match compiled.execute(token, state, None).await {
///     Ok(RunOutcome::Completed(state)) => println!("{}", state.last_response()),
///     Ok(RunOutcome::Interrupted { interrupt, .. }) => ask_human(interrupt.payload),
///     Err(e) => eprintln!("run failed: {e}"),
/// }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// The run reached END
    Completed(State),
    /// A node suspended the run
    Interrupted {
        /// What the node asked for
        interrupt: InterruptSignal,
        /// State at the moment of suspension
        state: State,
    },
}

impl RunOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, RunOutcome::Completed(_))
    }

    pub fn is_interrupted(&self) -> bool {
        matches!(self, RunOutcome::Interrupted { .. })
    }

    /// State at the end of the call, whichever way it ended
    pub fn state(&self) -> &State {
        match self {
            RunOutcome::Completed(state) | RunOutcome::Interrupted { state, .. } => state,
        }
    }

    /// Final state, if the run completed
    pub fn into_completed(self) -> Option<State> {
        match self {
            RunOutcome::Completed(state) => Some(state),
            RunOutcome::Interrupted { .. } => None,
        }
    }

    /// Interrupt signal, if the run was suspended
    pub fn into_interrupt(self) -> Option<InterruptSignal> {
        match self {
            RunOutcome::Interrupted { interrupt, .. } => Some(interrupt),
            RunOutcome::Completed(_) => None,
        }
    }
}

/// Point-in-time view of a thread, built from its checkpoint
#[derive(Debug, Clone, PartialEq)]
pub struct StateSnapshot {
    /// State as of the checkpoint
    pub state: State,

    /// Node that runs next on resume; [`END`](crate::END) once complete
    pub next_node: String,

    /// Pending interrupt payload
    pub interrupt: Option<Value>,

    /// Source and step of the checkpoint
    pub metadata: CheckpointMetadata,

    /// When the checkpoint was written
    pub created_at: DateTime<Utc>,
}

impl StateSnapshot {
    pub(crate) fn from_checkpoint(checkpoint: Checkpoint) -> crate::Result<Self> {
        Ok(Self {
            state: serde_json::from_value(checkpoint.state)?,
            next_node: checkpoint.next_node,
            interrupt: checkpoint.interrupt,
            metadata: checkpoint.metadata,
            created_at: checkpoint.ts,
        })
    }

    pub fn is_complete(&self) -> bool {
        self.next_node == END_NODE && self.interrupt.is_none()
    }

    pub fn is_interrupted(&self) -> bool {
        self.interrupt.is_some()
    }

    /// Number of completed node executions on the thread
    pub fn step(&self) -> usize {
        self.metadata.step
    }
}
