//! LLM provider abstraction
//!
//! A narrow completion interface over hosted language models, plus a
//! logging wrapper. Gemini is the only provider wired up.

mod error;
mod gemini;
mod types;

pub use error::{LlmError, LlmErrorKind};
pub use gemini::GeminiService;
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;

/// Common interface for LLM providers
#[async_trait]
pub trait LlmService: Send + Sync {
    /// Make a completion request
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError>;

    /// Get the model ID
    fn model_id(&self) -> &str;
}

/// Logs timing, prompt size and token usage of every call
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
        let prompt_chars: usize = request.system.as_deref().map_or(0, str::len)
            + request.messages.iter().map(|m| m.text.len()).sum::<usize>();
        let start = std::time::Instant::now();
        let result = self.inner.complete(request).await;
        let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        match &result {
            Ok(response) => tracing::info!(
                model = %self.model_id,
                elapsed_ms,
                prompt_chars,
                json = request.json_output,
                input_tokens = response.usage.input_tokens,
                output_tokens = response.usage.output_tokens,
                "Model call finished"
            ),
            Err(e) => tracing::error!(
                model = %self.model_id,
                elapsed_ms,
                prompt_chars,
                kind = ?e.kind,
                transient = e.kind.is_transient(),
                error = %e.message,
                "Model call failed"
            ),
        }

        result
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
