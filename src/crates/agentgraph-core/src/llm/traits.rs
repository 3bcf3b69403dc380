//! The [`ChatModel`] trait and its error type

use crate::llm::config::ChatRequest;
use crate::llm::response::ChatResponse;
use async_trait::async_trait;
use thiserror::Error;

/// Failure reported by a completion provider
///
/// Surfaces from a run as [`GraphError::Provider`](crate::GraphError::Provider). The
/// engine never retries; retry policy belongs to the provider implementation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// The request could not be completed (network, authentication, server error)
    #[error("Request failed: {0}")]
    Request(String),

    /// The provider refused the request for rate limiting
    #[error("Rate limited")]
    RateLimited,

    /// The provider answered with something that could not be interpreted
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Anything else
    #[error("{0}")]
    Other(String),
}

/// Core trait for chat-based language models.
///
/// # Tool Calling
///
/// Models that support tool calling should:
/// 1. Read tool schemas from [`ChatOptions::tools`](crate::llm::ChatOptions::tools)
/// 2. Return calls as [`ContentPart::ToolCall`](crate::ContentPart::ToolCall) parts of
///    the response message
/// 3. Accept tool results as `Tool` messages in subsequent requests
///
/// # Threading and Safety
///
/// Implementations must be `Send + Sync`. Share them as `Arc<dyn ChatModel>`.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Generate a complete reply for the request.
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, ProviderError>;

    /// Check if the provider is reachable. Defaults to `true`.
    async fn is_available(&self) -> Result<bool, ProviderError> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ChatOptions;
    use crate::messages::{Message, ToolCall};
    use serde_json::json;
    use std::sync::Arc;

    struct ToolHappyModel;

    #[async_trait]
    impl ChatModel for ToolHappyModel {
        async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, ProviderError> {
            let Some(tool) = request.options.tools.first() else {
                return Err(ProviderError::InvalidResponse("no tools bound".into()));
            };
            let call = ToolCall::new("call-1", tool.name.clone(), json!({}));
            Ok(ChatResponse::new(Message::assistant("").with_tool_calls(vec![call])))
        }
    }

    #[tokio::test]
    async fn test_trait_object() {
        let model: Arc<dyn ChatModel> = Arc::new(ToolHappyModel);
        let options = ChatOptions::new().with_tools(vec![crate::llm::ToolDefinition::new(
            "search",
            "Search the web",
        )]);

        let response = model
            .chat(ChatRequest::new(vec![Message::human("hi")]).with_options(options))
            .await
            .unwrap();
        assert_eq!(response.tool_calls().len(), 1);
        assert!(model.is_available().await.unwrap());
    }

    #[tokio::test]
    async fn test_provider_error_surfaces() {
        let err = ToolHappyModel
            .chat(ChatRequest::new(vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse(_)));
    }
}
