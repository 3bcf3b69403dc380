//! The state container threaded through every node of a run
//!
//! [`State`] holds the conversation history and a string-keyed metadata map. The
//! execution loop owns it for the duration of a run and lends it mutably to one node at
//! a time, so nodes see each other's writes immediately and must not assume isolation.
//!
//! A few metadata keys are reserved for the engine:
//!
//! | key | meaning |
//! |-----|---------|
//! | [`INTERRUPT_PAYLOAD_KEY`] | payload of the interrupt that suspended the run |
//! | [`RESUME_VALUE_KEY`] | value supplied by the caller on resume |
//!
//! None of the accessors fail. Absent keys read as [`Value::Null`].

use crate::messages::{Message, MessageRole};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

/// Metadata key holding the pending interrupt payload
pub const INTERRUPT_PAYLOAD_KEY: &str = "__interrupt_payload__";

/// Metadata key holding the caller's resume value
pub const RESUME_VALUE_KEY: &str = "__resume_value__";

/// Conversation history plus metadata for one thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct State {
    #[serde(default)]
    thread_id: String,

    /// Ordered conversation history
    #[serde(default)]
    pub history: Vec<Message>,

    /// Arbitrary key/value data shared between nodes
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

impl State {
    /// Empty state on a fresh random thread id
    pub fn new() -> Self {
        Self::for_thread(Uuid::new_v4().to_string())
    }

    /// Empty state bound to `thread_id`
    pub fn for_thread(thread_id: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            history: Vec::new(),
            metadata: HashMap::new(),
        }
    }

    /// Replace the initial history
    pub fn with_messages(mut self, messages: Vec<Message>) -> Self {
        self.history = messages;
        self
    }

    /// Set one metadata entry while building
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Thread this state belongs to
    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    pub fn append_message(&mut self, message: Message) {
        self.history.push(message);
    }

    /// Most recent message, if any
    pub fn last_message(&self) -> Option<&Message> {
        self.history.last()
    }

    /// Text of the last assistant message, or an empty string
    pub fn last_response(&self) -> String {
        self.history
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::Assistant)
            .map(|m| m.text())
            .unwrap_or_default()
    }

    pub fn set_metadata(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.metadata.insert(key.into(), value.into());
    }

    /// Metadata value, or `Null` when absent
    pub fn get_metadata(&self, key: &str) -> Value {
        self.metadata.get(key).cloned().unwrap_or(Value::Null)
    }

    /// Metadata value decoded into `T`, or `None` when absent or of another shape
    pub fn get_metadata_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.metadata
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn remove_metadata(&mut self, key: &str) -> Option<Value> {
        self.metadata.remove(key)
    }

    pub fn set_interrupt_payload(&mut self, payload: Value) {
        self.metadata.insert(INTERRUPT_PAYLOAD_KEY.to_string(), payload);
    }

    /// Payload of the pending interrupt, or `Null`
    pub fn interrupt_payload(&self) -> Value {
        self.get_metadata(INTERRUPT_PAYLOAD_KEY)
    }

    /// Value supplied on resume, or `Null`
    pub fn get_resume_value(&self) -> Value {
        self.get_metadata(RESUME_VALUE_KEY)
    }

    /// Value supplied on resume, if the node is being re-entered after an interrupt
    pub fn resume_value(&self) -> Option<&Value> {
        self.metadata.get(RESUME_VALUE_KEY)
    }

    pub(crate) fn set_resume_value(&mut self, value: Value) {
        self.metadata.insert(RESUME_VALUE_KEY.to_string(), value);
    }

    /// Drop the interrupt bookkeeping once the interrupted node has moved on
    pub(crate) fn clear_interrupt(&mut self) {
        self.metadata.remove(INTERRUPT_PAYLOAD_KEY);
        self.metadata.remove(RESUME_VALUE_KEY);
    }

    pub(crate) fn ensure_thread_id(&mut self) {
        if self.thread_id.is_empty() {
            self.thread_id = Uuid::new_v4().to_string();
        }
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}
