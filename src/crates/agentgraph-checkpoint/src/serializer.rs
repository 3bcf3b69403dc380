//! Serialization protocol for file-backed checkpoints

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Protocol for turning checkpoint records into bytes and back
///
/// Checkpoints carry arbitrary JSON state, so implementations must be self-describing
/// formats that can round-trip a [`serde_json::Value`].
pub trait SerializerProtocol: Send + Sync {
    /// Serialize a value to bytes
    fn dumps<T: Serialize>(&self, value: &T) -> Result<Vec<u8>>;

    /// Deserialize a value from bytes
    fn loads<T: for<'de> Deserialize<'de>>(&self, data: &[u8]) -> Result<T>;

    /// File extension used by file-based backends
    fn extension(&self) -> &'static str {
        "json"
    }
}

/// Compact JSON serializer
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl JsonSerializer {
    pub fn new() -> Self {
        Self
    }
}

impl SerializerProtocol for JsonSerializer {
    fn dumps<T: Serialize>(&self, value: &T) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(value)?)
    }

    fn loads<T: for<'de> Deserialize<'de>>(&self, data: &[u8]) -> Result<T> {
        Ok(serde_json::from_slice(data)?)
    }
}

/// Indented JSON serializer, for checkpoint files meant to be read by people
#[derive(Debug, Clone, Copy, Default)]
pub struct PrettyJsonSerializer;

impl PrettyJsonSerializer {
    pub fn new() -> Self {
        Self
    }
}

impl SerializerProtocol for PrettyJsonSerializer {
    fn dumps<T: Serialize>(&self, value: &T) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(value)?)
    }

    fn loads<T: for<'de> Deserialize<'de>>(&self, data: &[u8]) -> Result<T> {
        Ok(serde_json::from_slice(data)?)
    }
}
