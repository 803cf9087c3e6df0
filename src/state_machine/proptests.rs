//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::effect::WriteOrigin;
use super::reply;
use super::state::*;
use super::transition::*;
use super::*;
use crate::classifier::{DraftCategory, ExpenseDraft, Verdict};
use crate::ledger::{format_amount, title_case, Category, ExpenseRecord};
use chrono::NaiveDate;
use proptest::prelude::*;

// ============================================================================
// Test Helpers
// ============================================================================

fn test_context() -> SessionContext {
    SessionContext::new("test-session", "₹")
}

fn append_count(result: &TransitionResult) -> usize {
    result
        .effects
        .iter()
        .filter(|e| matches!(e, Effect::AppendExpense { .. }))
        .count()
}

fn assistant_replies(result: &TransitionResult) -> Vec<&str> {
    result
        .effects
        .iter()
        .filter_map(|e| match e {
            Effect::RecordMessage {
                speaker: Speaker::Assistant,
                text,
            } => Some(text.as_str()),
            _ => None,
        })
        .collect()
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_date() -> impl Strategy<Value = NaiveDate> {
    (2020i32..2030, 1u32..=12, 1u32..=28)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

fn arb_amount() -> impl Strategy<Value = f64> {
    prop_oneof![
        (0u32..100_000).prop_map(f64::from),
        (0u32..10_000_000).prop_map(|cents| f64::from(cents) / 100.0),
    ]
}

fn arb_closed_category() -> impl Strategy<Value = Category> {
    proptest::sample::select(Category::CLOSED.to_vec())
}

fn arb_category() -> impl Strategy<Value = Category> {
    prop_oneof![
        arb_closed_category(),
        Just(Category::Uncategorized),
        "[A-Z][a-z]{2,10}".prop_map(Category::Custom),
    ]
}

fn arb_draft_category() -> impl Strategy<Value = DraftCategory> {
    prop_oneof![
        3 => arb_closed_category().prop_map(DraftCategory::Resolved),
        1 => Just(DraftCategory::Unresolved),
    ]
}

fn arb_draft_with(
    category: impl Strategy<Value = DraftCategory>,
) -> impl Strategy<Value = ExpenseDraft> {
    (
        arb_date(),
        "[a-zA-Z ]{1,20}",
        arb_amount(),
        category,
        "[a-z ]{0,20}",
    )
        .prop_map(|(date, item, amount, category, notes)| ExpenseDraft {
            date,
            item,
            amount,
            category,
            notes,
        })
}

fn arb_pending() -> impl Strategy<Value = PendingClarification> {
    arb_draft_with(Just(DraftCategory::Unresolved)).prop_map(PendingClarification::from_draft)
}

fn arb_record() -> impl Strategy<Value = ExpenseRecord> {
    (arb_date(), "[a-zA-Z ]{1,20}", arb_amount(), arb_category(), "[a-z ]{0,20}").prop_map(
        |(date, item, amount, category, notes)| ExpenseRecord {
            date,
            item,
            amount,
            category,
            notes,
        },
    )
}

fn arb_verdict() -> impl Strategy<Value = Verdict> {
    prop_oneof![
        arb_draft_with(arb_draft_category()).prop_map(Verdict::Expense),
        ".{1,40}".prop_map(|answer| Verdict::Query { answer }),
        ".{0,40}".prop_map(|reason| Verdict::Unparseable { reason }),
    ]
}

fn arb_origin() -> impl Strategy<Value = WriteOrigin> {
    prop_oneof![Just(WriteOrigin::Direct), Just(WriteOrigin::Clarified)]
}

fn arb_outcome() -> impl Strategy<Value = Result<(), String>> {
    prop_oneof![Just(Ok(())), "[a-z ]{1,20}".prop_map(Err)]
}

fn arb_state() -> impl Strategy<Value = ChatState> {
    prop_oneof![
        Just(ChatState::Idle),
        arb_pending().prop_map(|pending| ChatState::AwaitingCategory { pending }),
    ]
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        ".{0,30}".prop_map(|text| Event::UserMessage { text }),
        arb_verdict().prop_map(|verdict| Event::Classified { verdict }),
        (arb_record(), arb_origin(), arb_outcome()).prop_map(|(record, origin, outcome)| {
            Event::AppendFinished {
                record,
                origin,
                outcome,
            }
        }),
    ]
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// Any message while awaiting a category returns the machine to idle
    /// with exactly one append of the held expense.
    #[test]
    fn prop_awaiting_category_always_returns_to_idle(
        pending in arb_pending(),
        text in ".{0,30}",
    ) {
        let state = ChatState::AwaitingCategory { pending: pending.clone() };
        let result = transition(&state, &test_context(), Event::UserMessage { text }).unwrap();

        prop_assert_eq!(&result.new_state, &ChatState::Idle);
        prop_assert_eq!(append_count(&result), 1);
        prop_assert!(!result.effects.iter().any(|e| matches!(e, Effect::Classify { .. })), "unexpected Classify effect");

        let Some(Effect::AppendExpense { record, origin }) = result
            .effects
            .iter()
            .find(|e| matches!(e, Effect::AppendExpense { .. }))
        else {
            unreachable!()
        };
        prop_assert_eq!(*origin, WriteOrigin::Clarified);
        prop_assert_eq!(record.date, pending.date);
        prop_assert_eq!(&record.item, &pending.item);
        prop_assert!((record.amount - pending.amount).abs() < 1e-9);
        prop_assert_eq!(&record.notes, &pending.notes);
    }

    /// The category taken from a clarification answer is its title-cased form
    #[test]
    fn prop_clarified_category_is_title_cased(
        pending in arb_pending(),
        answer in "[a-z]{1,8}( [a-z]{1,8}){0,2}",
    ) {
        let record = pending.resolve(&format!("  {answer} "));
        prop_assert_eq!(record.category.label(), title_case(&answer));
    }

    /// Queries never write and never touch the pending slot
    #[test]
    fn prop_query_never_mutates(answer in ".{1,40}") {
        let result = transition(
            &ChatState::Idle,
            &test_context(),
            Event::Classified { verdict: Verdict::Query { answer: answer.clone() } },
        ).unwrap();

        prop_assert_eq!(&result.new_state, &ChatState::Idle);
        prop_assert_eq!(append_count(&result), 0);
        prop_assert_eq!(assistant_replies(&result), vec![answer.as_str()]);
    }

    /// A resolvable expense produces exactly one append and stays idle
    #[test]
    fn prop_resolved_expense_appends_exactly_once(
        draft in arb_draft_with(arb_closed_category().prop_map(DraftCategory::Resolved)),
    ) {
        let result = transition(
            &ChatState::Idle,
            &test_context(),
            Event::Classified { verdict: Verdict::Expense(draft.clone()) },
        ).unwrap();

        prop_assert_eq!(&result.new_state, &ChatState::Idle);
        prop_assert_eq!(append_count(&result), 1);
        let DraftCategory::Resolved(expected) = draft.category else { unreachable!() };
        prop_assert!(result.effects.iter().any(|e| matches!(
            e,
            Effect::AppendExpense { record, origin: WriteOrigin::Direct }
                if record.category == expected && record.item == draft.item
        )), "missing direct AppendExpense effect");
    }

    /// An unresolvable expense holds exactly the extracted fields and writes nothing
    #[test]
    fn prop_unresolved_expense_waits_without_writing(
        draft in arb_draft_with(Just(DraftCategory::Unresolved)),
    ) {
        let result = transition(
            &ChatState::Idle,
            &test_context(),
            Event::Classified { verdict: Verdict::Expense(draft.clone()) },
        ).unwrap();

        prop_assert_eq!(append_count(&result), 0);
        let expected = PendingClarification::from_draft(draft.clone());
        prop_assert_eq!(
            &result.new_state,
            &ChatState::AwaitingCategory { pending: expected }
        );

        let replies = assistant_replies(&result);
        prop_assert_eq!(replies.len(), 1);
        prop_assert!(replies[0].contains(&format_amount(draft.amount)));
        prop_assert!(replies[0].contains(&draft.item));
    }

    /// Unparseable output never writes and always answers
    #[test]
    fn prop_unparseable_is_harmless(reason in ".{0,40}") {
        let result = transition(
            &ChatState::Idle,
            &test_context(),
            Event::Classified { verdict: Verdict::Unparseable { reason } },
        ).unwrap();

        prop_assert_eq!(&result.new_state, &ChatState::Idle);
        prop_assert_eq!(append_count(&result), 0);
        prop_assert_eq!(assistant_replies(&result), vec![reply::NOT_UNDERSTOOD]);
    }

    /// Idle user messages are always sent to the classifier and never written
    #[test]
    fn prop_idle_message_is_classified(text in ".{0,30}") {
        let result = transition(
            &ChatState::Idle,
            &test_context(),
            Event::UserMessage { text: text.clone() },
        ).unwrap();

        prop_assert_eq!(&result.new_state, &ChatState::Idle);
        prop_assert_eq!(append_count(&result), 0);
        prop_assert!(result.effects.contains(&Effect::Classify { text }), "missing Classify effect");
    }

    /// Every finished append yields exactly one reply and leaves the machine idle
    #[test]
    fn prop_append_finished_replies_once(
        record in arb_record(),
        origin in arb_origin(),
        outcome in arb_outcome(),
    ) {
        let result = transition(
            &ChatState::Idle,
            &test_context(),
            Event::AppendFinished { record, origin, outcome },
        ).unwrap();

        prop_assert_eq!(&result.new_state, &ChatState::Idle);
        prop_assert_eq!(assistant_replies(&result).len(), 1);
        prop_assert_eq!(append_count(&result), 0);
    }

    /// At most one pending clarification exists, and only in AwaitingCategory
    #[test]
    fn prop_at_most_one_pending(state in arb_state(), event in arb_event()) {
        if let Ok(result) = transition(&state, &test_context(), event) {
            let pending_count = usize::from(result.new_state.pending().is_some());
            prop_assert!(pending_count <= 1);
            prop_assert!(append_count(&result) <= 1);
            if let ChatState::AwaitingCategory { .. } = state {
                prop_assert_eq!(&result.new_state, &ChatState::Idle);
            }
        }
    }

    /// The transition function is deterministic
    #[test]
    fn prop_transition_is_pure(state in arb_state(), event in arb_event()) {
        let first = transition(&state, &test_context(), event.clone());
        let second = transition(&state, &test_context(), event);
        match (first, second) {
            (Ok(a), Ok(b)) => prop_assert_eq!(a, b),
            (Err(a), Err(b)) => prop_assert_eq!(a.to_string(), b.to_string()),
            _ => prop_assert!(false, "transition gave different outcomes for the same input"),
        }
    }
}
