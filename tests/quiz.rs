//! Review quiz integration tests

use std::collections::{BTreeSet, HashSet};

use lingo_cards::quiz::{DEFAULT_DISTRACTORS, DEFAULT_QUIZ_SIZE, PLACEHOLDER_OPTION};
use lingo_cards::{QuizSession, QuizState, build_quiz};
use rand::SeedableRng;
use rand::rngs::StdRng;

mod common;
use common::learned;

fn english_pool() -> Vec<lingo_cards::LearnedWord> {
    vec![
        learned("e1", "Quedarse sin", "en", 1),
        learned("e2", "Resultar en", "en", 2),
        learned("e3", "Mejorar / Potenciar", "en", 3),
        learned("e4", "Liderar / Encabezar", "en", 4),
        learned("e5", "Omnipresente", "en", 5),
    ]
}

#[test]
fn test_five_word_pool_yields_five_questions() {
    let pool = english_pool();
    let quiz = build_quiz(
        &pool,
        DEFAULT_QUIZ_SIZE,
        DEFAULT_DISTRACTORS,
        &mut StdRng::seed_from_u64(2024),
    );

    assert_eq!(quiz.len(), 5);

    let ids: HashSet<&str> = quiz.iter().map(|q| q.word.id()).collect();
    assert_eq!(ids.len(), 5);

    for question in &quiz {
        assert_eq!(question.options.len(), 4);
        let correct = question
            .options
            .iter()
            .filter(|o| o.as_str() == question.answer())
            .count();
        assert_eq!(correct, 1);
        assert!(!question.options.iter().any(|o| o == PLACEHOLDER_OPTION));
    }
}

#[test]
fn test_size_is_capped_by_pool() {
    let mut rng = StdRng::seed_from_u64(9);
    for n in 1..=5 {
        let pool: Vec<_> = english_pool().into_iter().take(n).collect();
        let quiz = build_quiz(&pool, DEFAULT_QUIZ_SIZE, DEFAULT_DISTRACTORS, &mut rng);
        assert_eq!(quiz.len(), n);

        let expected_placeholders = 3usize.saturating_sub(n - 1);
        for question in &quiz {
            assert_eq!(question.options.len(), 4);
            let placeholders = question
                .options
                .iter()
                .filter(|o| o.as_str() == PLACEHOLDER_OPTION)
                .count();
            assert_eq!(placeholders, expected_placeholders);
        }
    }
}

#[test]
fn test_options_come_from_pool() {
    let pool = english_pool();
    let translations: HashSet<&str> = pool.iter().map(|w| w.translation()).collect();
    let quiz = build_quiz(&pool, 5, 3, &mut StdRng::seed_from_u64(77));

    for question in &quiz {
        assert!(question
            .options
            .iter()
            .all(|o| translations.contains(o.as_str())));
    }
}

#[test]
fn test_full_session_scores_answers() {
    let pool = english_pool();
    let mut session = QuizSession::generate(&pool, 5, 3, &mut StdRng::seed_from_u64(1));
    session.start();

    let mut answered = 0;
    while let Some(question) = session.current().cloned() {
        // answer every other question correctly
        let choice = if answered % 2 == 0 {
            question.answer().to_string()
        } else {
            question
                .options
                .iter()
                .find(|o| o.as_str() != question.answer())
                .cloned()
                .unwrap()
        };
        session.answer(&choice);
        assert!(session.advance());
        answered += 1;
    }

    assert_eq!(session.state(), QuizState::Finished);
    assert_eq!(answered, 5);
    assert_eq!(session.score(), 3);
}

#[test]
fn test_correct_option_position_varies() {
    let pool = english_pool();
    let mut positions = HashSet::new();
    for seed in 0..50 {
        let quiz = build_quiz(&pool, 5, 3, &mut StdRng::seed_from_u64(seed));
        for question in &quiz {
            let position = question
                .options
                .iter()
                .position(|o| o.as_str() == question.answer())
                .unwrap();
            positions.insert(position);
        }
    }

    assert!(positions.len() > 1);
    assert_ne!(positions, HashSet::from([3]));
}

#[test]
fn test_selection_varies_with_seed() {
    let pool: Vec<_> = (1..=9)
        .map(|n| learned(&format!("w{n}"), &format!("translation {n}"), "en", n))
        .collect();

    let selections: HashSet<BTreeSet<String>> = (0..8)
        .map(|seed| {
            build_quiz(&pool, 5, 3, &mut StdRng::seed_from_u64(seed))
                .iter()
                .map(|q| q.word.id().to_string())
                .collect()
        })
        .collect();

    assert!(selections.len() >= 2);
}
