//! Run configuration
//!
//! [`RunConfig`] carries the knobs of the execution loop. It deserializes from YAML or
//! JSON so it can live next to flow definitions:
//!
//! ```yaml
//! max_steps: 50
//! emit_updates: false
//! ```

use crate::error::{GraphError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default maximum number of node executions per thread
pub const DEFAULT_MAX_STEPS: usize = 25;

/// Execution loop configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Maximum node executions per thread before the run fails with
    /// [`GraphError::StepLimit`]. Counted across resumes.
    pub max_steps: usize,

    /// Send a [`StreamChunk::Update`](crate::StreamChunk::Update) to the sink after
    /// each completed node
    pub emit_updates: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            emit_updates: true,
        }
    }
}

impl RunConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_emit_updates(mut self, emit_updates: bool) -> Self {
        self.emit_updates = emit_updates;
        self
    }

    /// Reject configurations the loop cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.max_steps == 0 {
            return Err(GraphError::Configuration(
                "max_steps must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }
}
