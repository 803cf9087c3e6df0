//! Chat session executor

use super::traits::{Classifier, LedgerStore};
use super::Transcript;
use crate::llm::LlmError;
use crate::state_machine::reply;
use crate::state_machine::{
    transition, ChatState, Effect, Event, SessionContext, Speaker, TransitionError,
};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

/// What one turn produced
#[derive(Debug, Clone, Serialize)]
pub struct TurnReply {
    /// Assistant text added to the transcript this turn
    pub reply: String,
    /// State after the turn
    pub state: ChatState,
}

/// A turn that could not produce its own reply
#[derive(Debug, Error)]
pub enum TurnError {
    #[error("Classifier unavailable: {0}")]
    Classifier(#[from] LlmError),

    #[error(transparent)]
    Transition(#[from] TransitionError),
}

/// One conversation: state machine, transcript and the I/O it drives
pub struct ChatSession<L, C>
where
    L: LedgerStore + 'static,
    C: Classifier + 'static,
{
    context: SessionContext,
    state: ChatState,
    transcript: Transcript,
    ledger: Arc<L>,
    classifier: Arc<C>,
}

impl<L, C> ChatSession<L, C>
where
    L: LedgerStore + 'static,
    C: Classifier + 'static,
{
    pub fn new(context: SessionContext, ledger: Arc<L>, classifier: Arc<C>) -> Self {
        Self {
            context,
            state: ChatState::Idle,
            transcript: Transcript::new(),
            ledger,
            classifier,
        }
    }

    #[allow(dead_code)] // Used in tests
    pub fn session_id(&self) -> &str {
        &self.context.session_id
    }

    pub fn state(&self) -> &ChatState {
        &self.state
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Run one user message to completion.
    ///
    /// Effects run in order and every event they produce is fed back
    /// through `transition` before this returns.
    pub async fn handle_message(&mut self, text: &str) -> Result<TurnReply, TurnError> {
        tracing::info!(
            session_id = %self.context.session_id,
            state = self.state.label(),
            "Handling message"
        );

        let mut replies = Vec::new();
        let mut events_to_process = vec![Event::UserMessage {
            text: text.to_string(),
        }];

        while let Some(current_event) = events_to_process.pop() {
            let event_name = current_event.name();

            // Pure state transition
            let result = transition(&self.state, &self.context, current_event).map_err(|e| {
                tracing::warn!(
                    session_id = %self.context.session_id,
                    event = event_name,
                    error = %e,
                    "Transition rejected"
                );
                e
            })?;

            let old_state = std::mem::replace(&mut self.state, result.new_state);
            if old_state.label() != self.state.label() {
                tracing::debug!(
                    session_id = %self.context.session_id,
                    from = old_state.label(),
                    to = self.state.label(),
                    "State changed"
                );
            }

            for effect in result.effects {
                if let Some(generated_event) = self.execute_effect(effect, &mut replies).await? {
                    events_to_process.push(generated_event);
                }
            }
        }

        Ok(TurnReply {
            reply: replies.join("\n"),
            state: self.state.clone(),
        })
    }

    /// Show a failed turn to the user as an assistant message; returns the text shown
    pub fn record_failure(&mut self, error: &TurnError) -> String {
        let text = match error {
            TurnError::Classifier(e) => reply::unavailable(&e.message, e.kind.is_transient()),
            TurnError::Transition(e) => e.to_string(),
        };
        self.transcript.push(Speaker::Assistant, text.clone());
        text
    }

    async fn execute_effect(
        &mut self,
        effect: Effect,
        replies: &mut Vec<String>,
    ) -> Result<Option<Event>, TurnError> {
        match effect {
            Effect::RecordMessage { speaker, text } => {
                if speaker == Speaker::Assistant {
                    replies.push(text.clone());
                }
                self.transcript.push(speaker, text);
                Ok(None)
            }

            Effect::Classify { text } => {
                let snapshot = match self.ledger.read_all().await {
                    Ok(records) => records,
                    Err(e) => {
                        tracing::warn!(
                            session_id = %self.context.session_id,
                            error = %e,
                            "Ledger unreadable, classifying against an empty snapshot"
                        );
                        Vec::new()
                    }
                };

                let verdict = self.classifier.infer(&text, &snapshot).await?;
                tracing::debug!(
                    session_id = %self.context.session_id,
                    snapshot_rows = snapshot.len(),
                    verdict = ?verdict,
                    "Classified message"
                );
                Ok(Some(Event::Classified { verdict }))
            }

            Effect::AppendExpense { record, origin } => {
                let outcome = self.ledger.append(&record).await.map_err(|e| e.to_string());
                match &outcome {
                    Ok(()) => tracing::info!(
                        session_id = %self.context.session_id,
                        item = %record.item,
                        amount = record.amount,
                        category = %record.category,
                        "Expense saved"
                    ),
                    Err(e) => tracing::error!(
                        session_id = %self.context.session_id,
                        item = %record.item,
                        error = %e,
                        "Expense append failed"
                    ),
                }
                Ok(Some(Event::AppendFinished {
                    record,
                    origin,
                    outcome,
                }))
            }
        }
    }
}
