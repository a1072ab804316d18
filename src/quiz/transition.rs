//! Pure session state transitions
//!
//! Every function takes the current state and returns the next state plus
//! the storage effects the caller must apply. No I/O happens here.

use super::question::answers_match;
use super::{QuizError, Question, SessionState};
use crate::db::WordPair;

/// Storage side effects requested by a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    AddUserWord(WordPair),
    DeleteUserWord(WordPair),
}

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult<T> {
    pub new_state: SessionState,
    pub outcome: T,
    pub effects: Vec<Effect>,
}

impl<T> TransitionResult<T> {
    pub fn new(state: SessionState, outcome: T) -> Self {
        Self {
            new_state: state,
            outcome,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Outcome of answering a question
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// Carries the confirmed pair for display
    Correct(WordPair),
    Incorrect,
}

/// Outcome of one add-word dialog step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddWordStep {
    AwaitingTarget { source_text: String },
    Completed(WordPair),
}

/// Any state + new question -> `AwaitingAnswer`
pub fn pose_question(_state: &SessionState, question: &Question) -> TransitionResult<()> {
    TransitionResult::new(question.to_state(), ())
}

/// `AwaitingAnswer` + answer -> unchanged state, correct or not
pub fn submit_answer(
    state: &SessionState,
    chosen: &str,
) -> Result<TransitionResult<AnswerOutcome>, QuizError> {
    let SessionState::AwaitingAnswer {
        source_text,
        target_text,
        ..
    } = state
    else {
        return Err(QuizError::NoActiveQuestion);
    };

    let outcome = if answers_match(chosen, target_text) {
        AnswerOutcome::Correct(WordPair::new(source_text.as_str(), target_text.as_str()))
    } else {
        AnswerOutcome::Incorrect
    };
    Ok(TransitionResult::new(state.clone(), outcome))
}

/// Any state -> `AddingWordSource`, discarding whatever was in progress
pub fn begin_add_word(_state: &SessionState) -> TransitionResult<()> {
    TransitionResult::new(SessionState::AddingWordSource, ())
}

/// `AddingWordSource` + text -> `AddingWordTarget`;
/// `AddingWordTarget` + text -> `Idle` with an add effect
pub fn submit_add_word_step(
    state: &SessionState,
    text: &str,
) -> Result<TransitionResult<AddWordStep>, QuizError> {
    let text = text.trim();
    match state {
        SessionState::AddingWordSource | SessionState::AddingWordTarget { .. }
            if text.is_empty() =>
        {
            Err(QuizError::EmptyText)
        }
        SessionState::AddingWordSource => Ok(TransitionResult::new(
            SessionState::AddingWordTarget {
                source_text: text.to_string(),
            },
            AddWordStep::AwaitingTarget {
                source_text: text.to_string(),
            },
        )),
        SessionState::AddingWordTarget { source_text } => {
            let pair = WordPair::new(source_text.as_str(), text);
            Ok(
                TransitionResult::new(SessionState::Idle, AddWordStep::Completed(pair.clone()))
                    .with_effect(Effect::AddUserWord(pair)),
            )
        }
        SessionState::Idle | SessionState::AwaitingAnswer { .. } => Err(QuizError::NotInAddFlow),
    }
}

/// `AwaitingAnswer` -> unchanged state with a delete effect for the current pair
pub fn delete_current_word(
    state: &SessionState,
) -> Result<TransitionResult<WordPair>, QuizError> {
    let pair = state.current_pair().ok_or(QuizError::NoActiveQuestion)?;
    Ok(TransitionResult::new(state.clone(), pair.clone()).with_effect(Effect::DeleteUserWord(pair)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn awaiting_hello() -> SessionState {
        SessionState::AwaitingAnswer {
            source_text: "Здравствуйте".to_string(),
            target_text: "Hello".to_string(),
            choice_set: vec!["Red".into(), "Hello".into(), "Blue".into(), "Green".into()],
        }
    }

    #[test]
    fn test_pose_question_replaces_add_flow() {
        let question = Question {
            source_text: "Кот".to_string(),
            target_text: "Cat".to_string(),
            options: vec!["Cat".into(), "Dog".into(), "Sun".into(), "Key".into()],
        };
        let result = pose_question(&SessionState::AddingWordSource, &question);
        assert_eq!(result.new_state, question.to_state());
        assert!(result.effects.is_empty());
    }

    #[test]
    fn test_correct_answer_keeps_state() {
        let state = awaiting_hello();
        let result = submit_answer(&state, " hello").unwrap();
        assert_eq!(
            result.outcome,
            AnswerOutcome::Correct(WordPair::new("Здравствуйте", "Hello"))
        );
        assert_eq!(result.new_state, state);
    }

    #[test]
    fn test_incorrect_answer_keeps_state() {
        let state = awaiting_hello();
        let result = submit_answer(&state, "Red").unwrap();
        assert_eq!(result.outcome, AnswerOutcome::Incorrect);
        assert_eq!(result.new_state, state);
    }

    #[test]
    fn test_answer_without_question() {
        assert!(matches!(
            submit_answer(&SessionState::Idle, "Hello"),
            Err(QuizError::NoActiveQuestion)
        ));
        assert!(matches!(
            submit_answer(&SessionState::AddingWordSource, "Hello"),
            Err(QuizError::NoActiveQuestion)
        ));
    }

    #[test]
    fn test_begin_add_word_discards_question() {
        let result = begin_add_word(&awaiting_hello());
        assert_eq!(result.new_state, SessionState::AddingWordSource);
    }

    #[test]
    fn test_add_word_dialog() {
        let first = submit_add_word_step(&SessionState::AddingWordSource, "Кот").unwrap();
        assert_eq!(
            first.new_state,
            SessionState::AddingWordTarget {
                source_text: "Кот".to_string()
            }
        );
        assert!(first.effects.is_empty());

        let second = submit_add_word_step(&first.new_state, " Cat ").unwrap();
        assert_eq!(second.new_state, SessionState::Idle);
        assert_eq!(
            second.outcome,
            AddWordStep::Completed(WordPair::new("Кот", "Cat"))
        );
        assert_eq!(
            second.effects,
            vec![Effect::AddUserWord(WordPair::new("Кот", "Cat"))]
        );
    }

    #[test]
    fn test_add_word_rejects_blank_text() {
        assert!(matches!(
            submit_add_word_step(&SessionState::AddingWordSource, "   "),
            Err(QuizError::EmptyText)
        ));
    }

    #[test]
    fn test_add_word_step_outside_dialog() {
        assert!(matches!(
            submit_add_word_step(&SessionState::Idle, "Кот"),
            Err(QuizError::NotInAddFlow)
        ));
        assert!(matches!(
            submit_add_word_step(&awaiting_hello(), "Кот"),
            Err(QuizError::NotInAddFlow)
        ));
    }

    #[test]
    fn test_delete_current_word() {
        let state = awaiting_hello();
        let result = delete_current_word(&state).unwrap();
        assert_eq!(result.new_state, state);
        assert_eq!(
            result.effects,
            vec![Effect::DeleteUserWord(WordPair::new("Здравствуйте", "Hello"))]
        );
    }

    #[test]
    fn test_delete_without_question_has_no_effect() {
        assert!(matches!(
            delete_current_word(&SessionState::Idle),
            Err(QuizError::NoActiveQuestion)
        ));
    }
}
