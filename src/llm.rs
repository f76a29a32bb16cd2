//! Inference backend abstraction
//!
//! The chat flow only ever talks to an `LlmService`; the concrete backend is an
//! `OpenAI`-compatible chat-completions endpoint (Groq by default).

mod error;
mod openai;
mod types;

#[cfg(test)]
pub mod testing;

pub use error::{LlmError, LlmErrorKind};
pub use openai::OpenAiCompatService;
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;

/// Common interface for inference backends
#[async_trait]
pub trait LlmService: Send + Sync {
    /// Make a completion request
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError>;

    /// Get the model ID
    fn model_id(&self) -> &str;
}

/// Logging wrapper for LLM services
pub struct LoggingService {
    inner: Arc<dyn LlmService>,
    model_id: String,
}

impl LoggingService {
    pub fn new(inner: Arc<dyn LlmService>) -> Self {
        let model_id = inner.model_id().to_string();
        Self { inner, model_id }
    }
}

#[async_trait]
impl LlmService for LoggingService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let start = std::time::Instant::now();
        let result = self.inner.complete(request).await;
        let duration = start.elapsed();

        match &result {
            Ok(response) => {
                tracing::info!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    messages = request.messages.len(),
                    with_image = request.has_image(),
                    input_tokens = response.usage.input_tokens,
                    output_tokens = response.usage.output_tokens,
                    "LLM request completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    kind = ?e.kind,
                    "LLM request failed"
                );
            }
        }

        result
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

#[cfg(test)]
mod tests {
    use super::testing::MockLlmService;
    use super::*;

    fn request() -> LlmRequest {
        LlmRequest {
            system: "be brief".to_string(),
            messages: vec![LlmMessage::user_text("hi")],
            temperature: None,
            max_tokens: None,
        }
    }

    #[tokio::test]
    async fn test_logging_service_passes_through() {
        let mock = Arc::new(MockLlmService::new("mock-model"));
        mock.queue_text("hello");
        let service = LoggingService::new(mock.clone());

        assert_eq!(service.model_id(), "mock-model");
        let response = service.complete(&request()).await.unwrap();
        assert_eq!(response.text(), "hello");
        assert_eq!(mock.recorded_requests().len(), 1);
    }

    #[tokio::test]
    async fn test_logging_service_passes_errors_through() {
        let mock = Arc::new(MockLlmService::new("mock-model"));
        mock.queue_error(LlmError::rate_limit("slow down"));
        let service = LoggingService::new(mock);

        let err = service.complete(&request()).await.unwrap_err();
        assert_eq!(err.kind, LlmErrorKind::RateLimit);
        assert_eq!(err.message, "slow down");
    }
}
