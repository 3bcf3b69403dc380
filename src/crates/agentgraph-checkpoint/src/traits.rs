//! The checkpointer contract
//!
//! The execution loop only ever talks to a [`Checkpointer`] trait object. Any backend that
//! can store and return [`Checkpoint`] records keyed by thread id plugs in:
//!
//! ```text
//! CompiledGraph ──save()──► Arc<dyn Checkpointer> ──► InMemoryCheckpointer
//!               ◄─load()──                        └─► FileCheckpointer
//!                                                 └─► your backend
//! ```
//!
//! # Concurrency
//!
//! The loop never runs two steps of the same thread at once, so a backend only has to
//! tolerate one writer per thread. Writes for different threads may arrive concurrently
//! and must not contend on shared per-thread state.

use crate::{checkpoint::Checkpoint, error::Result};
use async_trait::async_trait;
use futures::stream::Stream;
use std::pin::Pin;

/// Type alias for async stream of checkpoints
pub type CheckpointStream = Pin<Box<dyn Stream<Item = Result<Checkpoint>> + Send + 'static>>;

/// Storage backend for thread checkpoints
///
/// ## Example: Custom Backend
///
/// ```rust,ignore
/// use agentgraph_checkpoint::{Checkpoint, CheckpointError, CheckpointStream, Checkpointer};
/// use async_trait::async_trait;
///
/// struct RedisCheckpointer { client: redis::Client }
///
/// #[async_trait]
/// impl Checkpointer for RedisCheckpointer {
///     async fn save(&self, checkpoint: Checkpoint) -> agentgraph_checkpoint::Result<()> {
///         let body = serde_json::to_string(&checkpoint)?;
///         // SET thread:<id> body
///         Ok(())
///     }
///
///     async fn load(&self, thread_id: &str) -> agentgraph_checkpoint::Result<Checkpoint> {
///         // GET thread:<id>
///         Err(CheckpointError::NotFound(thread_id.to_string()))
///     }
///
///     async fn list(
///         &self,
///         thread_id: &str,
///         limit: Option<usize>,
///     ) -> agentgraph_checkpoint::Result<CheckpointStream> {
///         unimplemented!()
///     }
/// }
/// ```
#[async_trait]
pub trait Checkpointer: Send + Sync {
    /// Persist a checkpoint, superseding the thread's previous latest record
    async fn save(&self, checkpoint: Checkpoint) -> Result<()>;

    /// Load the latest checkpoint for a thread
    ///
    /// Returns [`CheckpointError::NotFound`](crate::CheckpointError::NotFound) when the
    /// thread has never been saved.
    async fn load(&self, thread_id: &str) -> Result<Checkpoint>;

    /// List checkpoints of a thread, newest first
    async fn list(&self, thread_id: &str, limit: Option<usize>) -> Result<CheckpointStream>;

    /// Remove every checkpoint of a thread
    async fn delete_thread(&self, _thread_id: &str) -> Result<()> {
        Ok(())
    }

    /// Load the latest checkpoint, mapping `NotFound` to `None`
    async fn try_load(&self, thread_id: &str) -> Result<Option<Checkpoint>> {
        match self.load(thread_id).await {
            Ok(checkpoint) => Ok(Some(checkpoint)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}
