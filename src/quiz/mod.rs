//! Review quiz over learned words
//!
//! [`build_quiz`] picks the questions and their multiple-choice options;
//! [`QuizSession`] walks through them and keeps score.

use rand::Rng;
use rand::seq::SliceRandom;

use crate::progress::LearnedWord;

/// Filler option used when too few other words exist
pub const PLACEHOLDER_OPTION: &str = "---";

/// Questions per session
pub const DEFAULT_QUIZ_SIZE: usize = 5;

/// Wrong options per question
pub const DEFAULT_DISTRACTORS: usize = 3;

/// One multiple-choice question
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizQuestion {
    /// The word being reviewed
    pub word: LearnedWord,
    /// Shuffled options; exactly one equals the translation
    pub options: Vec<String>,
}

impl QuizQuestion {
    /// The correct option
    #[must_use]
    pub fn answer(&self) -> &str {
        self.word.translation()
    }

    /// Whether `choice` is the correct option
    #[must_use]
    pub fn is_correct(&self, choice: &str) -> bool {
        choice == self.answer()
    }
}

/// Build a quiz from a non-empty pool of learned words
///
/// Takes `min(size, pool.len())` distinct words in random order. Each question
/// gets up to `distractor_count` distinct translations of other words, padded
/// with [`PLACEHOLDER_OPTION`], plus the correct translation, all shuffled.
pub fn build_quiz<R: Rng + ?Sized>(
    pool: &[LearnedWord],
    size: usize,
    distractor_count: usize,
    rng: &mut R,
) -> Vec<QuizQuestion> {
    let mut selection: Vec<&LearnedWord> = pool.iter().collect();
    selection.shuffle(rng);
    selection.truncate(size);

    selection
        .into_iter()
        .map(|word| QuizQuestion {
            word: word.clone(),
            options: options_for(word, pool, distractor_count, rng),
        })
        .collect()
}

fn options_for<R: Rng + ?Sized>(
    word: &LearnedWord,
    pool: &[LearnedWord],
    distractor_count: usize,
    rng: &mut R,
) -> Vec<String> {
    let mut others: Vec<&LearnedWord> = pool.iter().filter(|w| w.id() != word.id()).collect();
    others.shuffle(rng);

    let mut options: Vec<String> = Vec::with_capacity(distractor_count + 1);
    for other in others {
        if options.len() == distractor_count {
            break;
        }
        let translation = other.translation();
        if translation != word.translation() && !options.iter().any(|o| o == translation) {
            options.push(translation.to_string());
        }
    }
    options.resize(distractor_count, PLACEHOLDER_OPTION.to_string());

    options.push(word.translation().to_string());
    options.shuffle(rng);
    options
}

/// Where a session is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizState {
    /// `start` has not been called
    NotStarted,
    /// Showing question `index`
    InProgress {
        /// Zero-based question index
        index: usize,
        /// Whether the current question has been answered
        answered: bool,
    },
    /// Past the last question
    Finished,
}

/// Answer state of the current question
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerState {
    /// No answer yet
    Unanswered,
    /// Answered correctly
    Correct,
    /// Answered incorrectly
    Incorrect,
}

/// One pass through a quiz
#[derive(Debug, Clone)]
pub struct QuizSession {
    questions: Vec<QuizQuestion>,
    state: QuizState,
    answer: AnswerState,
    score: usize,
}

impl QuizSession {
    /// Create a session over prepared questions
    #[must_use]
    pub const fn new(questions: Vec<QuizQuestion>) -> Self {
        Self {
            questions,
            state: QuizState::NotStarted,
            answer: AnswerState::Unanswered,
            score: 0,
        }
    }

    /// Build questions from a pool and create a session
    pub fn generate<R: Rng + ?Sized>(
        pool: &[LearnedWord],
        size: usize,
        distractor_count: usize,
        rng: &mut R,
    ) -> Self {
        Self::new(build_quiz(pool, size, distractor_count, rng))
    }

    /// Move to the first question
    ///
    /// Has no effect once started.
    pub fn start(&mut self) -> QuizState {
        if self.state == QuizState::NotStarted {
            self.state = if self.questions.is_empty() {
                QuizState::Finished
            } else {
                QuizState::InProgress {
                    index: 0,
                    answered: false,
                }
            };
        }
        self.state
    }

    /// The question being shown
    #[must_use]
    pub fn current(&self) -> Option<&QuizQuestion> {
        match self.state {
            QuizState::InProgress { index, .. } => self.questions.get(index),
            _ => None,
        }
    }

    /// Answer the current question
    ///
    /// Returns whether the answer was correct, or `None` if there is no
    /// question waiting for an answer.
    pub fn answer(&mut self, choice: &str) -> Option<bool> {
        let QuizState::InProgress {
            index,
            answered: false,
        } = self.state
        else {
            return None;
        };

        let correct = self.questions[index].is_correct(choice);
        if correct {
            self.score += 1;
        }
        self.answer = if correct {
            AnswerState::Correct
        } else {
            AnswerState::Incorrect
        };
        self.state = QuizState::InProgress {
            index,
            answered: true,
        };
        Some(correct)
    }

    /// Go to the next question, or finish after the last one
    ///
    /// Returns `false` without moving if the current question is unanswered.
    pub fn advance(&mut self) -> bool {
        let QuizState::InProgress {
            index,
            answered: true,
        } = self.state
        else {
            return false;
        };

        self.answer = AnswerState::Unanswered;
        self.state = if index + 1 >= self.questions.len() {
            QuizState::Finished
        } else {
            QuizState::InProgress {
                index: index + 1,
                answered: false,
            }
        };
        true
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> QuizState {
        self.state
    }

    /// Answer state of the current question
    #[must_use]
    pub const fn answer_state(&self) -> AnswerState {
        self.answer
    }

    /// Correct answers so far
    #[must_use]
    pub const fn score(&self) -> usize {
        self.score
    }

    /// Number of questions presented
    #[must_use]
    pub fn total(&self) -> usize {
        self.questions.len()
    }

    /// Whether the session is over
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.state == QuizState::Finished
    }

    /// All questions in order
    #[must_use]
    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }
}
