//! Drawing multiple-choice questions from a vocabulary

use super::{QuizError, Question};
use crate::db::WordPair;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;

/// Number of options shown per question
pub const CHOICE_COUNT: usize = 4;

/// Keep the first pair for every translation (compared case-insensitively),
/// so that every drawn option is distinct.
pub fn distinct_by_translation(vocabulary: &[WordPair]) -> Vec<&WordPair> {
    let mut seen = HashSet::new();
    vocabulary
        .iter()
        .filter(|pair| seen.insert(normalize(&pair.target_text)))
        .collect()
}

/// Draw `CHOICE_COUNT` distinct pairs uniformly without replacement. The
/// first drawn pair is the one asked; the others contribute decoys.
pub fn draw_question<R: Rng + ?Sized>(
    vocabulary: &[WordPair],
    rng: &mut R,
) -> Result<Question, QuizError> {
    let candidates = distinct_by_translation(vocabulary);
    if candidates.len() < CHOICE_COUNT {
        return Err(QuizError::InsufficientVocabulary {
            available: candidates.len(),
            required: CHOICE_COUNT,
        });
    }

    let drawn: Vec<&WordPair> = candidates
        .choose_multiple(rng, CHOICE_COUNT)
        .copied()
        .collect();
    let asked = drawn[0];

    let mut options: Vec<String> = drawn.iter().map(|pair| pair.target_text.clone()).collect();
    options.shuffle(rng);

    Ok(Question {
        source_text: asked.source_text.clone(),
        target_text: asked.target_text.clone(),
        options,
    })
}

/// Case-insensitive, whitespace-trimmed comparison of an answer with the
/// expected translation
pub fn answers_match(chosen: &str, expected: &str) -> bool {
    normalize(chosen) == normalize(expected)
}

fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}
