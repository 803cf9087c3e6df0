//! Intent classification through a hosted language model
//!
//! Turns one user message plus the current ledger into a [`Verdict`].
//! Malformed model output is folded into `Verdict::Unparseable`; only
//! transport-level failures surface as errors.

mod prompt;
mod verdict;

pub use verdict::{parse_verdict, DraftCategory, ExpenseDraft, Verdict};

use crate::ledger::{self, ExpenseRecord};
use crate::llm::{LlmError, LlmRequest, LlmService};
use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

const CLASSIFY_TIMEOUT: Duration = Duration::from_secs(60);
const MAX_OUTPUT_TOKENS: u32 = 1024;

/// Classifier backed by an [`LlmService`]
pub struct LlmClassifier {
    llm: Option<Arc<dyn LlmService>>,
    timeout: Duration,
}

impl LlmClassifier {
    pub fn new(llm: Arc<dyn LlmService>) -> Self {
        Self {
            llm: Some(llm),
            timeout: CLASSIFY_TIMEOUT,
        }
    }

    /// A classifier with no model behind it; every call fails with an auth error
    pub fn unconfigured() -> Self {
        Self {
            llm: None,
            timeout: CLASSIFY_TIMEOUT,
        }
    }

    #[allow(dead_code)] // Used in tests
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn model_id(&self) -> Option<&str> {
        self.llm.as_deref().map(|llm| llm.model_id())
    }

    /// Classify `text` against `snapshot`, resolving relative dates from `today`
    pub async fn classify(
        &self,
        text: &str,
        snapshot: &[ExpenseRecord],
        today: NaiveDate,
    ) -> Result<Verdict, LlmError> {
        let llm = self
            .llm
            .as_ref()
            .ok_or_else(|| LlmError::auth("No language model configured. Set GOOGLE_API_KEY."))?;

        let snapshot_csv = ledger::to_csv(snapshot).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to serialize ledger snapshot, sending none");
            String::new()
        });

        let mut request = LlmRequest::prompt(text);
        request.system = Some(prompt::system_prompt(today, &snapshot_csv));
        request.max_tokens = Some(MAX_OUTPUT_TOKENS);
        request.temperature = Some(0.0);
        request.json_output = true;

        let response = timeout(self.timeout, llm.complete(&request))
            .await
            .map_err(|_| {
                LlmError::network(format!(
                    "Classification timed out after {}s",
                    self.timeout.as_secs()
                ))
            })??;

        let verdict = parse_verdict(&response.text);
        if let Verdict::Unparseable { reason } = &verdict {
            tracing::warn!(reason = %reason, raw = %response.text, "Classifier output rejected");
        }
        Ok(verdict)
    }
}
