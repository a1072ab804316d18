//! Session state types

use crate::db::WordPair;
use serde::{Deserialize, Serialize};

/// Per-user dialog state. Exactly one exists per user, held in memory only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionState {
    /// No active interaction
    #[default]
    Idle,

    /// A question is posed and waits for one of the displayed options
    AwaitingAnswer {
        source_text: String,
        target_text: String,
        /// The displayed options in presentation order, one of them correct
        choice_set: Vec<String>,
    },

    /// Add-word dialog: waiting for the native word
    AddingWordSource,

    /// Add-word dialog: waiting for the translation of `source_text`
    AddingWordTarget { source_text: String },
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::AwaitingAnswer { .. } => "awaiting_answer",
            SessionState::AddingWordSource => "adding_word_source",
            SessionState::AddingWordTarget { .. } => "adding_word_target",
        }
    }

    pub fn is_in_add_flow(&self) -> bool {
        matches!(
            self,
            SessionState::AddingWordSource | SessionState::AddingWordTarget { .. }
        )
    }

    /// The pair currently being quizzed, if any
    pub fn current_pair(&self) -> Option<WordPair> {
        match self {
            SessionState::AwaitingAnswer {
                source_text,
                target_text,
                ..
            } => Some(WordPair::new(source_text.as_str(), target_text.as_str())),
            _ => None,
        }
    }
}

/// A multiple-choice question ready to be shown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub source_text: String,
    pub target_text: String,
    /// Shuffled options, exactly one equal to `target_text`
    pub options: Vec<String>,
}

impl Question {
    pub fn pair(&self) -> WordPair {
        WordPair::new(self.source_text.as_str(), self.target_text.as_str())
    }

    pub fn to_state(&self) -> SessionState {
        SessionState::AwaitingAnswer {
            source_text: self.source_text.clone(),
            target_text: self.target_text.clone(),
            choice_set: self.options.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_idle() {
        assert_eq!(SessionState::default(), SessionState::Idle);
    }

    #[test]
    fn test_current_pair_only_while_awaiting_answer() {
        let question = Question {
            source_text: "Кот".to_string(),
            target_text: "Cat".to_string(),
            options: vec!["Dog".into(), "Cat".into(), "Sun".into(), "Key".into()],
        };
        assert_eq!(
            question.to_state().current_pair(),
            Some(WordPair::new("Кот", "Cat"))
        );
        assert_eq!(SessionState::AddingWordSource.current_pair(), None);
        assert_eq!(SessionState::Idle.current_pair(), None);
    }

    #[test]
    fn test_state_serializes_with_type_tag() {
        let state = SessionState::AddingWordTarget {
            source_text: "Кот".to_string(),
        };
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["type"], "adding_word_target");
        assert_eq!(json["source_text"], "Кот");
    }
}
