//! # agentgraph-checkpoint - Thread Persistence for Graph Execution
//!
//! **Trait-based checkpoint storage** for the agentgraph execution loop. A checkpoint
//! captures everything needed to reconstruct a run later: the serialized state
//! container, the node to execute next, and the payload of a pending interrupt.
//!
//! ## Overview
//!
//! Checkpoints make three things possible:
//!
//! - **Human-in-the-loop** - a node suspends the run, the caller answers later, the
//!   loop re-enters at the suspended node
//! - **Fault recovery** - a crashed process resumes a thread from its last transition
//! - **Inspection** - look at a thread's state and history without running it
//!
//! ## Core Concepts
//!
//! ### 1. Checkpointer Trait
//!
//! [`Checkpointer`] is the only thing the engine depends on:
//!
//! - **`save()`** - persist a [`Checkpoint`], superseding the previous latest one
//! - **`load()`** - fetch the latest checkpoint or fail with [`CheckpointError::NotFound`]
//! - **`list()`** - stream a thread's checkpoints, newest first
//! - **`delete_thread()`** - forget a thread
//!
//! ### 2. Backends
//!
//! | Backend | Survives restart | History |
//! |---------|------------------|---------|
//! | [`InMemoryCheckpointer`] | no | every checkpoint |
//! | [`FileCheckpointer`] | yes | latest only |
//!
//! Both sit behind `Arc<dyn Checkpointer>` and are interchangeable.
//!
//! ## Quick Start
//!
//! ```rust
//! use agentgraph_checkpoint::{Checkpoint, Checkpointer, InMemoryCheckpointer};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> agentgraph_checkpoint::Result<()> {
//!     let saver: Arc<dyn Checkpointer> = Arc::new(InMemoryCheckpointer::new());
//!
//!     let cp = Checkpoint::new("thread-1", "review", json!({"history": []}))
//!         .with_interrupt(json!({"q": "approve?"}));
//!     saver.save(cp.clone()).await?;
//!
//!     let loaded = saver.load("thread-1").await?;
//!     assert_eq!(loaded, cp);
//!     assert!(loaded.is_interrupted());
//!     Ok(())
//! }
//! ```

pub mod checkpoint;
pub mod error;
pub mod file;
pub mod memory;
pub mod serializer;
pub mod traits;

// Re-export main types
pub use checkpoint::{Checkpoint, CheckpointId, CheckpointMetadata, CheckpointSource, END_NODE};
pub use error::{CheckpointError, Result};
pub use file::FileCheckpointer;
pub use memory::InMemoryCheckpointer;
pub use serializer::{JsonSerializer, PrettyJsonSerializer, SerializerProtocol};
pub use traits::{CheckpointStream, Checkpointer};
