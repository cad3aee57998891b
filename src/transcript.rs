//! Chat transcript state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions:
//! `transition` decides, the controller executes the resulting effects.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::Effect;
pub use event::Event;
pub use state::{HistoryEntry, Phase, Subject, Transcript, Turn, TurnKind};
pub use transition::{transition, TransitionError, TransitionResult};
