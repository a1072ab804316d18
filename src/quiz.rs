//! Quiz state machine
//!
//! Pure transitions over `SessionState` plus the engine that applies them.

mod engine;
mod error;
pub mod question;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use engine::{DeleteOutcome, QuizEngine};
pub use error::QuizError;
pub use state::{Question, SessionState};
pub use transition::{AddWordStep, AnswerOutcome};
