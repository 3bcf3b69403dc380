//! Error Types - Prebuilt Component Errors
//!
//! Two error types live here, and they never mix:
//!
//! - [`ToolError`] - a single tool invocation failed. Tool errors are **never**
//!   propagated as run failures; the dispatch node turns them into error-content tool
//!   results the model can react to.
//! - [`PrebuiltError`] - assembling an agent failed (bad configuration, reserved tool
//!   name, graph validation).
//!
//! # Example
//!
//! ```rust
//! use agentgraph_prebuilt::ToolError;
//!
//! fn parse_city(input: &serde_json::Value) -> Result<&str, ToolError> {
//!     input["city"]
//!         .as_str()
//!         .ok_or_else(|| ToolError::InvalidInput("city required".into()))
//! }
//!
//! assert!(parse_city(&serde_json::json!({})).is_err());
//! ```

use agentgraph_core::GraphError;
use thiserror::Error;

/// Result type for prebuilt operations
pub type Result<T> = std::result::Result<T, PrebuiltError>;

/// Errors raised while building prebuilt components
#[derive(Error, Debug)]
pub enum PrebuiltError {
    /// Invalid agent or registry configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A tool name is registered twice
    #[error("Duplicate tool: {0}")]
    DuplicateTool(String),

    /// A tool uses a name reserved for delegation
    #[error("Tool name '{0}' is reserved")]
    ReservedToolName(String),

    /// Graph error
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    /// YAML parsing error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure of a single tool invocation
#[derive(Error, Debug)]
pub enum ToolError {
    /// The arguments do not satisfy the tool's contract
    #[error("Invalid tool input: {0}")]
    InvalidInput(String),

    /// The tool ran and failed
    #[error("Tool execution failed: {0}")]
    Execution(String),

    /// The tool's output could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The run was cancelled while the tool was working
    #[error("Tool call cancelled")]
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graph_error_converts() {
        let err: PrebuiltError = GraphError::Validation("no START edge".into()).into();
        assert!(matches!(err, PrebuiltError::Graph(_)));
        assert!(err.to_string().contains("no START edge"));
    }

    #[test]
    fn test_tool_error_display() {
        assert_eq!(
            ToolError::Execution("timeout".into()).to_string(),
            "Tool execution failed: timeout"
        );
    }
}
