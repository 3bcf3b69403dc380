//! Streaming run output to the caller
//!
//! A run can be given a [`StreamSink`]. Nodes push incremental output through
//! [`NodeContext::emit`](crate::NodeContext::emit), and the execution loop pushes a
//! [`StreamChunk::Update`] after every completed node when
//! [`RunConfig::emit_updates`](crate::RunConfig::emit_updates) is set. Every event carries
//! the full state as it looks at that moment.
//!
//! Delivery is fire-and-forget, except that an `Err` returned by the sink fails the run
//! with [`GraphError::StreamSink`](crate::GraphError::StreamSink): the caller has told us
//! it cannot keep consuming.
//!
//! # Sinks
//!
//! - [`sink_fn`] wraps a closure
//! - [`ChannelSink`] forwards owned events to a tokio channel
//! - any type implementing [`StreamSink`]
//!
//! ```rust
//! use agentgraph_core::stream::{sink_fn, StreamChunk, StreamEvent};
//! use std::sync::{Arc, Mutex};
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let log = seen.clone();
//! let sink = sink_fn(move |event: &StreamEvent<'_>| {
//!     if let StreamChunk::Text(text) = event.chunk {
//!         log.lock().map_err(|e| e.to_string())?.push(text.clone());
//!     }
//!     Ok(())
//! });
//! # let _ = sink;
//! ```

use crate::state::State;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// A piece of incremental output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum StreamChunk {
    /// Text produced by a node, typically model output
    Text(String),
    /// Raw bytes produced by a node
    Bytes(Vec<u8>),
    /// A node finished; the event's state reflects its writes
    Update,
}

/// Event delivered to a [`StreamSink`]
#[derive(Debug, Clone, Copy)]
pub struct StreamEvent<'a> {
    /// Node that produced the event
    pub node: &'a str,
    /// Step number of that node within the thread
    pub step: usize,
    /// The output
    pub chunk: &'a StreamChunk,
    /// Full state at the time of the event
    pub state: &'a State,
}

impl StreamEvent<'_> {
    /// Copy the event into an owned value
    pub fn to_owned_event(&self) -> OwnedStreamEvent {
        OwnedStreamEvent {
            node: self.node.to_string(),
            step: self.step,
            chunk: self.chunk.clone(),
            state: self.state.clone(),
        }
    }
}

/// Owned copy of a [`StreamEvent`], as sent through channels
#[derive(Debug, Clone, PartialEq)]
pub struct OwnedStreamEvent {
    pub node: String,
    pub step: usize,
    pub chunk: StreamChunk,
    pub state: State,
}

/// Receiver of streamed run output
pub trait StreamSink: Send + Sync {
    /// Handle one event. An error aborts the run.
    fn send(&self, event: &StreamEvent<'_>) -> Result<(), String>;
}

/// Sink backed by a closure, see [`sink_fn`]
pub struct FnSink<F> {
    f: F,
}

impl<F> StreamSink for FnSink<F>
where
    F: for<'a> Fn(&StreamEvent<'a>) -> Result<(), String> + Send + Sync,
{
    fn send(&self, event: &StreamEvent<'_>) -> Result<(), String> {
        (self.f)(event)
    }
}

/// Build a sink from a closure
pub fn sink_fn<F>(f: F) -> FnSink<F>
where
    F: for<'a> Fn(&StreamEvent<'a>) -> Result<(), String> + Send + Sync,
{
    FnSink { f }
}

/// Sink that forwards owned events to an unbounded tokio channel
///
/// Dropping the receiver makes the next send fail, which fails the run.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<OwnedStreamEvent>,
}

impl ChannelSink {
    /// Create a sink and the receiver that reads from it
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<OwnedStreamEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl StreamSink for ChannelSink {
    fn send(&self, event: &StreamEvent<'_>) -> Result<(), String> {
        self.tx
            .send(event.to_owned_event())
            .map_err(|e| format!("Failed to send stream event: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_sink_delivers_and_fails_when_closed() {
        let (sink, mut rx) = ChannelSink::channel();
        let state = State::for_thread("t");
        let chunk = StreamChunk::Text("hi".into());
        let event = StreamEvent {
            node: "a",
            step: 1,
            chunk: &chunk,
            state: &state,
        };

        sink.send(&event).unwrap();
        let got = rx.try_recv().unwrap();
        assert_eq!(got.node, "a");
        assert_eq!(got.chunk, chunk);

        drop(rx);
        assert!(sink.is_closed());
        assert!(sink.send(&event).is_err());
    }

    #[test]
    fn test_fn_sink_propagates_error() {
        let sink = sink_fn(|event: &StreamEvent<'_>| {
            if event.step > 1 {
                Err("enough".to_string())
            } else {
                Ok(())
            }
        });
        let state = State::for_thread("t");
        let chunk = StreamChunk::Update;
        let mut event = StreamEvent {
            node: "a",
            step: 1,
            chunk: &chunk,
            state: &state,
        };
        assert!(sink.send(&event).is_ok());
        event.step = 2;
        assert_eq!(sink.send(&event), Err("enough".to_string()));
    }
}
