//! Reading persisted thread state

use super::types::StateSnapshot;
use super::CompiledGraph;
use crate::error::{GraphError, Result};
use futures::TryStreamExt;

impl CompiledGraph {
    /// Latest snapshot of a thread, or `None` if it was never saved
    ///
    /// # Errors
    ///
    /// [`GraphError::NoCheckpointer`] if the graph has no checkpointer.
    pub async fn get_state(&self, thread_id: &str) -> Result<Option<StateSnapshot>> {
        let checkpointer = self.checkpointer.as_ref().ok_or(GraphError::NoCheckpointer)?;
        match checkpointer.try_load(thread_id).await? {
            Some(checkpoint) => Ok(Some(StateSnapshot::from_checkpoint(checkpoint)?)),
            None => Ok(None),
        }
    }

    /// Snapshots of a thread, newest first
    ///
    /// Backends that only retain the latest checkpoint return at most one snapshot.
    pub async fn get_state_history(
        &self,
        thread_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<StateSnapshot>> {
        let checkpointer = self.checkpointer.as_ref().ok_or(GraphError::NoCheckpointer)?;
        let checkpoints: Vec<_> = checkpointer
            .list(thread_id, limit)
            .await?
            .try_collect()
            .await?;

        checkpoints
            .into_iter()
            .map(StateSnapshot::from_checkpoint)
            .collect()
    }

    /// Drop every checkpoint of a thread
    pub async fn delete_thread(&self, thread_id: &str) -> Result<()> {
        let checkpointer = self.checkpointer.as_ref().ok_or(GraphError::NoCheckpointer)?;
        checkpointer.delete_thread(thread_id).await?;
        tracing::debug!(thread_id, "Thread deleted");
        Ok(())
    }
}
