//! Core conversation state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions:
//! `transition` decides, the runtime performs the resulting effects and
//! feeds their outcomes back as events.

mod effect;
pub mod event;
pub mod reply;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::{Effect, WriteOrigin};
pub use event::Event;
pub use state::{ChatState, PendingClarification, SessionContext, Speaker};
pub use transition::{transition, TransitionError};
