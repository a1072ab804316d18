//! Property-based tests for the quiz state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::question::{draw_question, CHOICE_COUNT};
use super::transition::*;
use super::*;
use crate::db::WordPair;
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;

// ============================================================================
// Arbitrary Generators
// ============================================================================

/// Vocabularies with unique translations
fn arb_vocabulary(size: std::ops::Range<usize>) -> impl Strategy<Value = Vec<WordPair>> {
    proptest::collection::hash_set("[a-z]{1,10}", size).prop_map(|targets| {
        targets
            .into_iter()
            .enumerate()
            .map(|(i, target)| WordPair::new(format!("слово-{i}"), target))
            .collect()
    })
}

fn arb_awaiting_state() -> impl Strategy<Value = SessionState> {
    ("[a-zA-Zа-я]{1,12}", "[a-zA-Z ]{1,12}").prop_map(|(source_text, target_text)| {
        SessionState::AwaitingAnswer {
            choice_set: vec![target_text.clone()],
            source_text,
            target_text,
        }
    })
}

fn arb_state() -> impl Strategy<Value = SessionState> {
    prop_oneof![
        Just(SessionState::Idle),
        arb_awaiting_state(),
        Just(SessionState::AddingWordSource),
        "[a-zа-я]{1,12}".prop_map(|source_text| SessionState::AddingWordTarget { source_text }),
    ]
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn question_has_four_distinct_options_one_correct(
        vocabulary in arb_vocabulary(CHOICE_COUNT..20),
        seed in any::<u64>(),
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let question = draw_question(&vocabulary, &mut rng).unwrap();

        prop_assert_eq!(question.options.len(), CHOICE_COUNT);
        let distinct: HashSet<_> = question.options.iter().collect();
        prop_assert_eq!(distinct.len(), CHOICE_COUNT);
        prop_assert_eq!(
            question.options.iter().filter(|o| **o == question.target_text).count(),
            1
        );
        // The correct option is the true translation of the posed word
        prop_assert!(vocabulary.contains(&question.pair()));
    }

    #[test]
    fn small_vocabulary_is_rejected(
        vocabulary in arb_vocabulary(0..CHOICE_COUNT),
        seed in any::<u64>(),
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let is_insufficient = matches!(
            draw_question(&vocabulary, &mut rng),
            Err(QuizError::InsufficientVocabulary { .. })
        );
        prop_assert!(is_insufficient);
    }

    #[test]
    fn correct_answer_accepted_with_any_casing_and_padding(
        state in arb_awaiting_state(),
        upper in any::<bool>(),
        left in " {0,3}",
        right in " {0,3}",
    ) {
        let SessionState::AwaitingAnswer { target_text, .. } = &state else { unreachable!() };
        let cased = if upper { target_text.to_uppercase() } else { target_text.to_lowercase() };
        let answer = format!("{left}{cased}{right}");

        let result = submit_answer(&state, &answer).unwrap();
        let is_correct = matches!(result.outcome, AnswerOutcome::Correct(_));
        prop_assert!(is_correct);
        prop_assert_eq!(result.new_state, state);
    }

    #[test]
    fn any_answer_never_resets_to_idle(state in arb_awaiting_state(), answer in ".{0,20}") {
        let result = submit_answer(&state, &answer).unwrap();
        prop_assert_eq!(&result.new_state, &state);
        prop_assert!(result.effects.is_empty());
    }

    #[test]
    fn begin_add_word_always_replaces_state(state in arb_state()) {
        prop_assert_eq!(begin_add_word(&state).new_state, SessionState::AddingWordSource);
    }

    #[test]
    fn only_add_flow_accepts_add_steps(state in arb_state(), text in "[a-zа-я]{1,10}") {
        let result = submit_add_word_step(&state, &text);
        if state.is_in_add_flow() {
            prop_assert!(result.is_ok());
        } else {
            prop_assert!(matches!(result, Err(QuizError::NotInAddFlow)));
        }
    }

    #[test]
    fn delete_requires_active_question(state in arb_state()) {
        let result = delete_current_word(&state);
        match &state {
            SessionState::AwaitingAnswer { .. } => {
                let result = result.unwrap();
                prop_assert_eq!(result.effects.len(), 1);
                prop_assert_eq!(&result.new_state, &state);
            }
            _ => prop_assert!(matches!(result, Err(QuizError::NoActiveQuestion))),
        }
    }
}
