//! Agent configuration
//!
//! ```yaml
//! max_tool_calls: 8
//! keep_last_messages: 20
//! system_prompt: "You are a careful research assistant."
//! temperature: 0.2
//! max_validation_retries: 2
//! run:
//!   max_steps: 40
//! ```

use crate::error::{PrebuiltError, Result};
use agentgraph_core::{ChatOptions, RunConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings of a prebuilt ReAct agent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Cumulative tool calls allowed per thread; unlimited when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tool_calls: Option<usize>,

    /// Compact history to the first message plus this many recent ones
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep_last_messages: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,

    /// Model override passed to the provider
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<usize>,

    /// Retries after a failed validation before the response is accepted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_validation_retries: Option<usize>,

    /// Execution loop settings
    pub run: RunConfig,
}

impl AgentConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_tool_calls(mut self, max: usize) -> Self {
        self.max_tool_calls = Some(max);
        self
    }

    pub fn with_keep_last_messages(mut self, keep_last: usize) -> Self {
        self.keep_last_messages = Some(keep_last);
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_max_validation_retries(mut self, retries: usize) -> Self {
        self.max_validation_retries = Some(retries);
        self
    }

    pub fn with_run(mut self, run: RunConfig) -> Self {
        self.run = run;
        self
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.keep_last_messages == Some(0) {
            return Err(PrebuiltError::Configuration(
                "keep_last_messages must be at least 1".to_string(),
            ));
        }
        if let Some(temperature) = self.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(PrebuiltError::Configuration(format!(
                    "temperature {} outside 0.0..=2.0",
                    temperature
                )));
            }
        }
        self.run.validate()?;
        Ok(())
    }

    /// Provider options derived from this config, without tools
    pub fn chat_options(&self) -> ChatOptions {
        ChatOptions {
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            tools: Vec::new(),
            model: self.model.clone(),
        }
    }
}
