//! The node contract
//!
//! A node is a named unit of work over the [`State`]. It is stateless itself; everything
//! it reads or writes lives in the state it is lent for the duration of
//! [`Node::run`]. A run ends in one of three ways:
//!
//! - `Ok(NodeOutcome::Continue)` - done, follow the outgoing edge
//! - `Ok(NodeOutcome::Interrupt(payload))` - suspend the thread and hand `payload` to the
//!   caller; the same node runs again on resume with the caller's value in
//!   [`State::resume_value`]
//! - `Err(e)` - the run fails
//!
//! Plain logic nodes rarely need their own type; [`FnNode`] and [`AsyncFnNode`] wrap
//! closures and are what [`StateGraph::add_fn`](crate::StateGraph::add_fn) and
//! [`StateGraph::add_async_fn`](crate::StateGraph::add_async_fn) build.
//!
//! ```rust
//! use agentgraph_core::{Node, NodeContext, NodeOutcome, Result, State};
//! use async_trait::async_trait;
//! use serde_json::json;
//!
//! struct Approval;
//!
//! #[async_trait]
//! impl Node for Approval {
//!     fn name(&self) -> &str {
//!         "approval"
//!     }
//!
//!     async fn run(&self, _ctx: &NodeContext, state: &mut State) -> Result<NodeOutcome> {
//!         match state.resume_value() {
//!             Some(answer) => {
//!                 let approved = answer == "yes";
//!                 state.set_metadata("approved", approved);
//!                 Ok(NodeOutcome::Continue)
//!             }
//!             None => Ok(NodeOutcome::interrupt(json!({"q": "approve?"}))),
//!         }
//!     }
//! }
//! ```

use crate::error::Result;
use crate::runtime::NodeContext;
use crate::state::State;
use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;

/// What a node asks the execution loop to do next
#[derive(Debug, Clone, PartialEq)]
pub enum NodeOutcome {
    /// Evaluate the outgoing edge and move on
    Continue,
    /// Suspend the thread and return the payload to the caller
    Interrupt(Value),
}

impl NodeOutcome {
    pub fn interrupt(payload: impl Into<Value>) -> Self {
        NodeOutcome::Interrupt(payload.into())
    }
}

/// A named unit of work over the state container
#[async_trait]
pub trait Node: Send + Sync {
    /// Unique name of the node within its graph
    fn name(&self) -> &str;

    /// Run the node against the shared state
    async fn run(&self, ctx: &NodeContext, state: &mut State) -> Result<NodeOutcome>;
}

type SyncNodeFn = dyn Fn(&NodeContext, &mut State) -> Result<NodeOutcome> + Send + Sync;

/// Node backed by a synchronous closure
pub struct FnNode {
    name: String,
    f: Box<SyncNodeFn>,
}

impl FnNode {
    pub fn new<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&NodeContext, &mut State) -> Result<NodeOutcome> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            f: Box::new(f),
        }
    }
}

#[async_trait]
impl Node for FnNode {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, ctx: &NodeContext, state: &mut State) -> Result<NodeOutcome> {
        (self.f)(ctx, state)
    }
}

type AsyncNodeFn = dyn for<'a> Fn(&'a NodeContext, &'a mut State) -> BoxFuture<'a, Result<NodeOutcome>>
    + Send
    + Sync;

/// Node backed by an async closure returning a boxed future
pub struct AsyncFnNode {
    name: String,
    f: Box<AsyncNodeFn>,
}

impl AsyncFnNode {
    pub fn new<F>(name: impl Into<String>, f: F) -> Self
    where
        F: for<'a> Fn(&'a NodeContext, &'a mut State) -> BoxFuture<'a, Result<NodeOutcome>>
            + Send
            + Sync
            + 'static,
    {
        Self {
            name: name.into(),
            f: Box::new(f),
        }
    }
}

#[async_trait]
impl Node for AsyncFnNode {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, ctx: &NodeContext, state: &mut State) -> Result<NodeOutcome> {
        (self.f)(ctx, state).await
    }
}

impl std::fmt::Debug for FnNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnNode").field("name", &self.name).finish()
    }
}

impl std::fmt::Debug for AsyncFnNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncFnNode").field("name", &self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::Message;

    #[tokio::test]
    async fn test_fn_node_mutates_state() {
        let node = FnNode::new("greet", |_ctx, state| {
            state.append_message(Message::assistant("hello"));
            Ok(NodeOutcome::Continue)
        });

        let mut state = State::for_thread("t");
        let outcome = node
            .run(&NodeContext::detached("greet"), &mut state)
            .await
            .unwrap();
        assert_eq!(outcome, NodeOutcome::Continue);
        assert_eq!(state.last_response(), "hello");
        assert_eq!(node.name(), "greet");
    }

    #[tokio::test]
    async fn test_async_fn_node() {
        let node = AsyncFnNode::new("wait", |ctx, state| {
            Box::pin(async move {
                tokio::task::yield_now().await;
                state.set_metadata("step", ctx.step());
                Ok(NodeOutcome::interrupt("paused"))
            })
        });

        let mut state = State::for_thread("t");
        let outcome = node
            .run(&NodeContext::detached("wait"), &mut state)
            .await
            .unwrap();
        assert_eq!(outcome, NodeOutcome::Interrupt(Value::from("paused")));
        assert_eq!(state.get_metadata("step"), Value::from(1));
    }
}
