//! Checkpoint records for thread persistence
//!
//! A [`Checkpoint`] is the durable half of a run: the serialized state container, the
//! node the execution loop will run next, and the payload of a pending interrupt if
//! the run is suspended. One thread id maps to a sequence of checkpoints; backends are
//! free to keep the whole sequence or only the newest record.
//!
//! ```text
//! Checkpoint
//! ├── v, id, ts            format version, uuid, UTC timestamp
//! ├── thread_id            owning thread
//! ├── next_node            node to run on resume ("__end__" once completed)
//! ├── state                serialized state container (JSON)
//! ├── interrupt            pending interrupt payload, if suspended
//! └── metadata             source, step, extra
//! ```
//!
//! States are stored as [`serde_json::Value`] so that this crate stays independent of the
//! engine's state type. Equality of a saved and a loaded checkpoint is equality by value.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Unique identifier for a checkpoint
pub type CheckpointId = String;

/// Name of the terminal sentinel as stored in `next_node`
pub const END_NODE: &str = "__end__";

/// Why a checkpoint was written
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CheckpointSource {
    /// Written when a run starts from its initial state
    Input,
    /// Written after a node completed and the next node was resolved
    Loop,
    /// Written when a node suspended the run
    Interrupt,
    /// Written when the run reached the end sentinel
    Complete,
}

/// Metadata associated with a checkpoint
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CheckpointMetadata {
    /// The source of the checkpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<CheckpointSource>,

    /// Number of node executions completed on this thread when the checkpoint was taken
    #[serde(default)]
    pub step: usize,

    /// Additional custom metadata
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl CheckpointMetadata {
    /// Create empty metadata
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the source
    pub fn with_source(mut self, source: CheckpointSource) -> Self {
        self.source = Some(source);
        self
    }

    /// Set the step number
    pub fn with_step(mut self, step: usize) -> Self {
        self.step = step;
        self
    }

    /// Add custom metadata
    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// Persisted snapshot of one thread
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Checkpoint {
    /// The version of the checkpoint format (currently 1)
    pub v: i32,

    /// The ID of the checkpoint
    pub id: CheckpointId,

    /// The timestamp of the checkpoint
    pub ts: DateTime<Utc>,

    /// Thread this checkpoint belongs to
    pub thread_id: String,

    /// Node the execution loop enters when this checkpoint is resumed
    pub next_node: String,

    /// Serialized state container
    pub state: serde_json::Value,

    /// Payload of the interrupt that suspended the run, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interrupt: Option<serde_json::Value>,

    /// Source, step, and custom metadata
    #[serde(default)]
    pub metadata: CheckpointMetadata,
}

impl Checkpoint {
    /// Current checkpoint format version
    pub const CURRENT_VERSION: i32 = 1;

    /// Create a checkpoint for `thread_id` that resumes at `next_node`
    pub fn new(
        thread_id: impl Into<String>,
        next_node: impl Into<String>,
        state: serde_json::Value,
    ) -> Self {
        Self {
            v: Self::CURRENT_VERSION,
            id: Uuid::new_v4().to_string(),
            ts: Utc::now(),
            thread_id: thread_id.into(),
            next_node: next_node.into(),
            state,
            interrupt: None,
            metadata: CheckpointMetadata::default(),
        }
    }

    /// Attach a pending interrupt payload
    pub fn with_interrupt(mut self, payload: serde_json::Value) -> Self {
        self.interrupt = Some(payload);
        self
    }

    /// Replace the metadata
    pub fn with_metadata(mut self, metadata: CheckpointMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Whether the thread is suspended waiting for a resume value
    pub fn is_interrupted(&self) -> bool {
        self.interrupt.is_some()
    }

    /// Whether the thread ran to the end sentinel
    pub fn is_complete(&self) -> bool {
        self.next_node == END_NODE && self.interrupt.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_checkpoint_has_no_interrupt() {
        let cp = Checkpoint::new("t1", "agent", json!({"history": []}));
        assert_eq!(cp.v, Checkpoint::CURRENT_VERSION);
        assert_eq!(cp.thread_id, "t1");
        assert!(!cp.is_interrupted());
        assert!(!cp.is_complete());
    }

    #[test]
    fn test_completion_and_interrupt_flags() {
        let done = Checkpoint::new("t1", END_NODE, json!({}));
        assert!(done.is_complete());

        let paused = Checkpoint::new("t1", "review", json!({})).with_interrupt(json!({"q": "ok?"}));
        assert!(paused.is_interrupted());
        assert!(!paused.is_complete());
    }

    #[test]
    fn test_metadata_serializes_extra_flat() {
        let meta = CheckpointMetadata::new()
            .with_source(CheckpointSource::Loop)
            .with_step(3)
            .with_extra("node", json!("tools"));

        let value = serde_json::to_value(&meta).unwrap();
        assert_eq!(value["source"], "loop");
        assert_eq!(value["step"], 3);
        assert_eq!(value["node"], "tools");
    }
}
