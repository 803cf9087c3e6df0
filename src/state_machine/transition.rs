//! Pure state transition function
//!
//! Given the same state, context and event, `transition` always returns the
//! same new state and effects. It performs no I/O.

use super::effect::WriteOrigin;
use super::reply;
use super::state::PendingClarification;
use super::{ChatState, Effect, Event, SessionContext};
use crate::classifier::{DraftCategory, Verdict};
use crate::ledger::ExpenseRecord;
use thiserror::Error;

/// Result of a state transition
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionResult {
    pub new_state: ChatState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: ChatState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error)]
pub enum TransitionError {
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

pub fn transition(
    state: &ChatState,
    context: &SessionContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // A pending clarification swallows the next message whole
        (ChatState::AwaitingCategory { pending }, Event::UserMessage { text }) => {
            let record = pending.clone().resolve(&text);
            Ok(TransitionResult::new(ChatState::Idle)
                .with_effect(Effect::record_user(text))
                .with_effect(Effect::AppendExpense {
                    record,
                    origin: WriteOrigin::Clarified,
                }))
        }

        (ChatState::Idle, Event::UserMessage { text }) => Ok(TransitionResult::new(ChatState::Idle)
            .with_effect(Effect::record_user(text.clone()))
            .with_effect(Effect::Classify { text })),

        (ChatState::Idle, Event::Classified { verdict }) => Ok(route_verdict(context, verdict)),

        (
            ChatState::Idle,
            Event::AppendFinished {
                record,
                origin,
                outcome,
            },
        ) => {
            let text = match (origin, outcome) {
                (WriteOrigin::Direct, Ok(())) => reply::saved(&context.currency, &record),
                (WriteOrigin::Direct, Err(e)) => reply::save_failed(&record, &e),
                (WriteOrigin::Clarified, Ok(())) => reply::clarified(&record),
                (WriteOrigin::Clarified, Err(e)) => reply::clarified_failed(&e),
            };
            Ok(TransitionResult::new(ChatState::Idle).with_effect(Effect::reply(text)))
        }

        (ChatState::AwaitingCategory { .. }, event) => Err(TransitionError::InvalidTransition(
            format!("{} while awaiting a category", event.name()),
        )),
    }
}

fn route_verdict(context: &SessionContext, verdict: Verdict) -> TransitionResult {
    match verdict {
        Verdict::Query { answer } => {
            TransitionResult::new(ChatState::Idle).with_effect(Effect::reply(answer))
        }

        Verdict::Expense(draft) => match draft.category.clone() {
            DraftCategory::Resolved(category) => {
                let record = ExpenseRecord {
                    date: draft.date,
                    item: draft.item,
                    amount: draft.amount,
                    category,
                    notes: draft.notes,
                };
                TransitionResult::new(ChatState::Idle).with_effect(Effect::AppendExpense {
                    record,
                    origin: WriteOrigin::Direct,
                })
            }
            DraftCategory::Unresolved => {
                let pending = PendingClarification::from_draft(draft);
                let question = reply::ask_category(&context.currency, &pending);
                TransitionResult::new(ChatState::AwaitingCategory { pending })
                    .with_effect(Effect::reply(question))
            }
        },

        Verdict::Unparseable { .. } => {
            TransitionResult::new(ChatState::Idle).with_effect(Effect::reply(reply::NOT_UNDERSTOOD))
        }
    }
}
