//! In-memory checkpoint storage for development and testing
//!
//! [`InMemoryCheckpointer`] keeps the checkpoints saved for a thread in a
//! `Arc<RwLock<HashMap>>`. Loads return the newest record, [`Checkpointer::list`] walks
//! the history newest first. Nothing survives a process restart; use
//! [`FileCheckpointer`](crate::FileCheckpointer) or your own backend for that.
//!
//! Every step of every run adds a record, so by default memory grows with the total
//! number of steps ever taken. [`InMemoryCheckpointer::with_max_history`] caps each
//! thread's history and drops the oldest records first; threads themselves are only
//! forgotten through [`Checkpointer::delete_thread`].
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │  Arc<RwLock<HashMap<thread_id, Vec<..>>>>     │
//! │    "session-1"                                │
//! │      ├─ [0] Checkpoint (input, step 0)        │
//! │      ├─ [1] Checkpoint (loop, step 1)         │
//! │      └─ [2] Checkpoint (interrupt, step 1)    │
//! │    "session-2"                                │
//! │      └─ [0] Checkpoint (complete, step 4)     │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! Cloning the checkpointer shares the underlying storage.

use crate::{
    checkpoint::Checkpoint,
    error::{CheckpointError, Result},
    traits::{CheckpointStream, Checkpointer},
};
use async_trait::async_trait;
use futures::stream;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Thread-safe in-memory checkpoint storage
type CheckpointStorage = Arc<RwLock<HashMap<String, Vec<Checkpoint>>>>;

/// In-memory checkpointer
///
/// # Example
///
/// ```rust
/// use agentgraph_checkpoint::{Checkpoint, Checkpointer, InMemoryCheckpointer};
/// use serde_json::json;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let saver = InMemoryCheckpointer::new();
///     saver.save(Checkpoint::new("t1", "agent", json!({"history": []}))).await?;
///
///     let loaded = saver.load("t1").await?;
///     assert_eq!(loaded.next_node, "agent");
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct InMemoryCheckpointer {
    storage: CheckpointStorage,
    max_history: Option<usize>,
}

impl InMemoryCheckpointer {
    /// Create a new in-memory checkpointer
    pub fn new() -> Self {
        Self {
            storage: Arc::new(RwLock::new(HashMap::new())),
            max_history: None,
        }
    }

    /// Keep at most `max_history` checkpoints per thread, newest first
    ///
    /// Values below 1 are raised to 1 so the latest checkpoint is always loadable.
    pub fn with_max_history(mut self, max_history: usize) -> Self {
        self.max_history = Some(max_history.max(1));
        self
    }

    /// Get the number of threads being tracked
    pub async fn thread_count(&self) -> usize {
        self.storage.read().await.len()
    }

    /// Get the total number of checkpoints across all threads
    pub async fn checkpoint_count(&self) -> usize {
        self.storage
            .read()
            .await
            .values()
            .map(|entries| entries.len())
            .sum()
    }

    /// Clear all checkpoints (useful for testing)
    pub async fn clear(&self) {
        self.storage.write().await.clear();
    }
}

impl Default for InMemoryCheckpointer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Checkpointer for InMemoryCheckpointer {
    async fn save(&self, checkpoint: Checkpoint) -> Result<()> {
        if checkpoint.thread_id.is_empty() {
            return Err(CheckpointError::Invalid("thread_id is required".to_string()));
        }

        let mut storage = self.storage.write().await;
        let entries = storage.entry(checkpoint.thread_id.clone()).or_default();
        entries.push(checkpoint);
        if let Some(max) = self.max_history {
            if entries.len() > max {
                let excess = entries.len() - max;
                entries.drain(..excess);
            }
        }
        Ok(())
    }

    async fn load(&self, thread_id: &str) -> Result<Checkpoint> {
        let storage = self.storage.read().await;
        storage
            .get(thread_id)
            .and_then(|entries| entries.last())
            .cloned()
            .ok_or_else(|| CheckpointError::NotFound(thread_id.to_string()))
    }

    async fn list(&self, thread_id: &str, limit: Option<usize>) -> Result<CheckpointStream> {
        let storage = self.storage.read().await;
        let results: Vec<Result<Checkpoint>> = storage
            .get(thread_id)
            .map(|entries| {
                entries
                    .iter()
                    .rev()
                    .take(limit.unwrap_or(usize::MAX))
                    .cloned()
                    .map(Ok)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Box::pin(stream::iter(results)))
    }

    async fn delete_thread(&self, thread_id: &str) -> Result<()> {
        self.storage.write().await.remove(thread_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use serde_json::json;

    #[tokio::test]
    async fn test_load_returns_latest() {
        let saver = InMemoryCheckpointer::new();
        saver
            .save(Checkpoint::new("t1", "a", json!({"n": 1})))
            .await
            .unwrap();
        saver
            .save(Checkpoint::new("t1", "b", json!({"n": 2})))
            .await
            .unwrap();

        let latest = saver.load("t1").await.unwrap();
        assert_eq!(latest.next_node, "b");
        assert_eq!(latest.state, json!({"n": 2}));
        assert_eq!(saver.checkpoint_count().await, 2);
    }

    #[tokio::test]
    async fn test_load_missing_thread() {
        let saver = InMemoryCheckpointer::new();
        let err = saver.load("nobody").await.unwrap_err();
        assert!(err.is_not_found());
        assert!(saver.try_load("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_newest_first_with_limit() {
        let saver = InMemoryCheckpointer::new();
        for node in ["a", "b", "c"] {
            saver
                .save(Checkpoint::new("t1", node, json!({})))
                .await
                .unwrap();
        }

        let listed: Vec<_> = saver
            .list("t1", Some(2))
            .await
            .unwrap()
            .map(|r| r.unwrap().next_node)
            .collect()
            .await;
        assert_eq!(listed, vec!["c", "b"]);
    }

    #[tokio::test]
    async fn test_threads_are_isolated() {
        let saver = InMemoryCheckpointer::new();
        saver.save(Checkpoint::new("t1", "a", json!({}))).await.unwrap();
        saver.save(Checkpoint::new("t2", "b", json!({}))).await.unwrap();
        assert_eq!(saver.thread_count().await, 2);

        saver.delete_thread("t1").await.unwrap();
        assert!(saver.try_load("t1").await.unwrap().is_none());
        assert_eq!(saver.load("t2").await.unwrap().next_node, "b");
    }

    #[tokio::test]
    async fn test_max_history_drops_oldest() {
        let saver = InMemoryCheckpointer::new().with_max_history(2);
        for node in ["a", "b", "c", "d"] {
            saver
                .save(Checkpoint::new("t1", node, json!({})))
                .await
                .unwrap();
        }
        saver.save(Checkpoint::new("t2", "x", json!({}))).await.unwrap();

        let listed: Vec<_> = saver
            .list("t1", None)
            .await
            .unwrap()
            .map(|r| r.unwrap().next_node)
            .collect()
            .await;
        assert_eq!(listed, vec!["d", "c"]);
        assert_eq!(saver.load("t1").await.unwrap().next_node, "d");
        assert_eq!(saver.checkpoint_count().await, 3);

        let latest_only = InMemoryCheckpointer::new().with_max_history(0);
        latest_only.save(Checkpoint::new("t", "a", json!({}))).await.unwrap();
        latest_only.save(Checkpoint::new("t", "b", json!({}))).await.unwrap();
        assert_eq!(latest_only.checkpoint_count().await, 1);
        assert_eq!(latest_only.load("t").await.unwrap().next_node, "b");
    }

    #[tokio::test]
    async fn test_rejects_empty_thread_id() {
        let saver = InMemoryCheckpointer::new();
        let err = saver.save(Checkpoint::new("", "a", json!({}))).await;
        assert!(matches!(err, Err(CheckpointError::Invalid(_))));
    }
}
