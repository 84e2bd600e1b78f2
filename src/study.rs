//! Interactive study flows (`lingo lesson`, `lingo review`, ...)
//!
//! A lesson is a deck of cards walked front to back. Revealing a card records
//! its item as learned. Reviews run a [`QuizSession`] over learned words.

use dialoguer::{Confirm, Select};
use rand::Rng;

use crate::catalog::{Catalog, Lesson, VocabularyItem};
use crate::config::QuizConfig;
use crate::progress::LearnedWordStore;
use crate::quiz::{AnswerState, QuizQuestion, QuizSession, QuizState};
use crate::voice::{SpeakOutcome, Speaker};

/// Position within a lesson
#[derive(Debug)]
pub struct CardDeck<'a> {
    lesson: &'a Lesson,
    index: usize,
    flipped: bool,
}

impl<'a> CardDeck<'a> {
    /// Start at the first card, face down
    #[must_use]
    pub const fn new(lesson: &'a Lesson) -> Self {
        Self {
            lesson,
            index: 0,
            flipped: false,
        }
    }

    /// The card being shown
    #[must_use]
    pub fn current(&self) -> Option<&'a VocabularyItem> {
        self.lesson.items.get(self.index)
    }

    /// Turn the card over
    ///
    /// Returns `true` if the translation side is now showing.
    pub const fn flip(&mut self) -> bool {
        self.flipped = !self.flipped;
        self.flipped
    }

    /// Whether the translation side is showing
    #[must_use]
    pub const fn is_flipped(&self) -> bool {
        self.flipped
    }

    /// Move forward, face down
    ///
    /// Returns `false` on the last card; the lesson is then complete.
    pub fn advance(&mut self) -> bool {
        if self.is_last() {
            return false;
        }
        self.index += 1;
        self.flipped = false;
        true
    }

    /// Move back, face down
    ///
    /// Returns `false` on the first card.
    pub const fn back(&mut self) -> bool {
        if self.index == 0 {
            return false;
        }
        self.index -= 1;
        self.flipped = false;
        true
    }

    /// Go back to the first card
    pub const fn restart(&mut self) {
        self.index = 0;
        self.flipped = false;
    }

    /// Whether the last card is showing
    #[must_use]
    pub fn is_last(&self) -> bool {
        self.index + 1 >= self.lesson.items.len()
    }

    /// One-based position and card count
    #[must_use]
    pub fn position(&self) -> (usize, usize) {
        (self.index + 1, self.lesson.items.len())
    }
}

/// Choices offered on a card
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardAction {
    /// Show the other side
    Flip,
    /// Speak the word
    ListenWord,
    /// Speak the example phrase
    ListenPhrase,
    /// Previous card
    Back,
    /// Next card
    Next,
    /// Finish the lesson from the last card
    Complete,
    /// Leave the lesson
    Quit,
}

impl CardAction {
    const fn label(self) -> &'static str {
        match self {
            Self::Flip => "Flip card",
            Self::ListenWord => "Listen to word",
            Self::ListenPhrase => "Listen to phrase",
            Self::Back => "Back",
            Self::Next => "Next",
            Self::Complete => "Complete",
            Self::Quit => "Quit",
        }
    }
}

/// Actions available for the deck's current state
#[must_use]
pub fn card_actions(deck: &CardDeck<'_>, audio: bool) -> Vec<CardAction> {
    let mut actions = vec![CardAction::Flip];
    if audio {
        actions.push(if deck.is_flipped() {
            CardAction::ListenPhrase
        } else {
            CardAction::ListenWord
        });
    }
    if deck.position().0 > 1 {
        actions.push(CardAction::Back);
    }
    actions.push(if deck.is_last() {
        CardAction::Complete
    } else {
        CardAction::Next
    });
    actions.push(CardAction::Quit);
    actions
}

/// Choices offered on a review question
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewChoice {
    /// Pick the option at this index
    Answer(usize),
    /// Speak the word under review
    Listen,
}

/// Answer options for a question, followed by "Listen" when audio is on
#[must_use]
pub fn review_choices(question: &QuizQuestion, audio: bool) -> Vec<ReviewChoice> {
    let mut choices: Vec<ReviewChoice> = (0..question.options.len())
        .map(ReviewChoice::Answer)
        .collect();
    if audio {
        choices.push(ReviewChoice::Listen);
    }
    choices
}

/// Print levels with lesson and learned-word counts
pub fn print_levels(catalog: &Catalog, store: &LearnedWordStore, language: &str) {
    println!("Levels for {language}\n");
    for (code, level) in catalog.levels(language) {
        let items: Vec<&VocabularyItem> = level.lessons.iter().flat_map(|l| &l.items).collect();
        let learned = items.iter().filter(|item| store.contains(&item.id)).count();
        println!(
            "  {code:<4} {:<24} {} lesson(s), {learned}/{} learned",
            level.name,
            level.lessons.len(),
            items.len()
        );
        for lesson in &level.lessons {
            println!("         - {} ({})", lesson.title, lesson.id);
        }
    }
}

/// Print learned words for a language, newest first
pub fn print_vocabulary(store: &LearnedWordStore, language: &str) {
    let words = store.recent(language);
    if words.is_empty() {
        println!("No words learned yet for {language}. Start with `lingo lesson`.");
        return;
    }

    println!("{} word(s) learned in {language}\n", words.len());
    for word in words {
        println!(
            "  {:<28} {:<28} {}",
            word.item.word,
            word.translation(),
            word.level.as_deref().unwrap_or("-")
        );
    }
}

/// Pick learned words to hear until the user is done
///
/// # Errors
///
/// Returns error if terminal input fails
#[allow(clippy::future_not_send)]
pub async fn listen_vocabulary(
    store: &LearnedWordStore,
    speaker: Option<&Speaker>,
    language: &str,
) -> anyhow::Result<()> {
    let words = store.recent(language);
    if words.is_empty() || speaker.is_none() {
        return Ok(());
    }

    let mut labels: Vec<String> = words
        .iter()
        .map(|w| format!("{} ({})", w.item.word, w.translation()))
        .collect();
    labels.push("Done".to_string());

    loop {
        let idx = Select::new()
            .with_prompt("Listen to")
            .items(&labels)
            .default(0)
            .interact()?;
        let Some(word) = words.get(idx) else {
            return Ok(());
        };
        say(speaker, &word.item.word, language).await;
    }
}

/// Run a lesson interactively
///
/// Without `lesson_id` the user picks one of the level's lessons.
///
/// # Errors
///
/// Returns error if the level or lesson is unknown, or terminal input fails
#[allow(clippy::future_not_send)]
pub async fn run_lesson(
    catalog: &Catalog,
    store: &mut LearnedWordStore,
    speaker: Option<&Speaker>,
    language: &str,
    level: &str,
    lesson_id: Option<&str>,
) -> anyhow::Result<()> {
    let lessons = catalog.lessons(language, level);
    if lessons.is_empty() {
        anyhow::bail!("no lessons for {language} at level {level}");
    }

    let lesson = match lesson_id {
        Some(id) => lessons
            .iter()
            .find(|l| l.id == id)
            .ok_or_else(|| anyhow::anyhow!("unknown lesson: {id}"))?,
        None if lessons.len() == 1 => &lessons[0],
        None => {
            let titles: Vec<&str> = lessons.iter().map(|l| l.title.as_str()).collect();
            let idx = Select::new()
                .with_prompt("Select a lesson")
                .items(&titles)
                .default(0)
                .interact()?;
            &lessons[idx]
        }
    };

    if lesson.items.is_empty() {
        println!("Lesson \"{}\" has no cards.", lesson.title);
        return Ok(());
    }

    tracing::info!(language, level, lesson = %lesson.id, "starting lesson");
    let mut deck = CardDeck::new(lesson);

    loop {
        let Some(card) = deck.current() else {
            break;
        };
        print_card(&deck, card);

        let actions = card_actions(&deck, speaker.is_some());
        let labels: Vec<&str> = actions.iter().map(|a| a.label()).collect();
        let idx = Select::new().items(&labels).default(0).interact()?;

        match actions[idx] {
            CardAction::Flip => {
                let revealed = deck.flip();
                if revealed && let Err(e) = store.mark_learned(card, language, level) {
                    tracing::warn!(error = %e, id = %card.id, "failed to save progress");
                }
            }
            CardAction::ListenWord => say(speaker, &card.word, language).await,
            CardAction::ListenPhrase => say(speaker, &card.phrase, language).await,
            CardAction::Back => {
                deck.back();
            }
            CardAction::Next => {
                deck.advance();
            }
            CardAction::Complete => {
                println!("\nLesson complete! You finished level {level}.");
                let repeat = Confirm::new()
                    .with_prompt("Repeat this lesson?")
                    .default(false)
                    .interact()?;
                if !repeat {
                    break;
                }
                deck.restart();
            }
            CardAction::Quit => break,
        }
    }

    Ok(())
}

fn print_card(deck: &CardDeck<'_>, card: &VocabularyItem) {
    let (position, total) = deck.position();
    println!("\n[{position}/{total}]");
    if deck.is_flipped() {
        println!("  {}", card.translation);
        println!("  \"{}\"", card.phrase);
        if let Some(pronunciation) = &card.pronunciation {
            println!("  {pronunciation}");
        }
        println!("  ({})", card.phrase_translation);
    } else {
        println!("  {}", card.word);
    }
}

async fn say(speaker: Option<&Speaker>, text: &str, language: &str) {
    let Some(speaker) = speaker else {
        return;
    };

    match speaker.speak(text, language).await {
        SpeakOutcome::Playing(_) => {}
        SpeakOutcome::Busy => println!("(still speaking)"),
        SpeakOutcome::NoAudio => println!("(no audio available)"),
        SpeakOutcome::Failed(e) => println!("(audio failed: {e})"),
    }
}

/// Run review quizzes over learned words until the user stops
///
/// Returns the last `(score, total)`, or `None` if nothing has been learned
/// yet.
///
/// # Errors
///
/// Returns error if terminal input fails
#[allow(clippy::future_not_send)]
pub async fn run_review<R: Rng + ?Sized>(
    store: &LearnedWordStore,
    speaker: Option<&Speaker>,
    language: &str,
    quiz: QuizConfig,
    rng: &mut R,
) -> anyhow::Result<Option<(usize, usize)>> {
    let pool = store.for_language(language);
    if pool.is_empty() {
        println!("Learn some {language} words first. Revealed cards are added to your review pool.");
        return Ok(None);
    }

    loop {
        let mut session = QuizSession::generate(&pool, quiz.size, quiz.distractors, rng);
        session.start();
        tracing::info!(language, questions = session.total(), "starting review");

        while let Some(question) = session.current().cloned() {
            ask(&mut session, &question, speaker, language).await?;
            session.advance();
        }

        let result = (session.score(), session.total());
        println!("\nReview complete: {}/{} correct", result.0, result.1);

        let again = Confirm::new()
            .with_prompt("Review again?")
            .default(false)
            .interact()?;
        if !again {
            return Ok(Some(result));
        }
    }
}

#[allow(clippy::future_not_send)]
async fn ask(
    session: &mut QuizSession,
    question: &QuizQuestion,
    speaker: Option<&Speaker>,
    language: &str,
) -> anyhow::Result<()> {
    let (position, total) = match session.state() {
        QuizState::InProgress { index, .. } => (index + 1, session.total()),
        _ => (0, session.total()),
    };
    println!("\n[{position}/{total}] What does \"{}\" mean?", question.word.item.word);

    let choices = review_choices(question, speaker.is_some());
    let labels: Vec<&str> = choices
        .iter()
        .map(|c| match c {
            ReviewChoice::Answer(i) => question.options[*i].as_str(),
            ReviewChoice::Listen => "Listen",
        })
        .collect();

    loop {
        let idx = Select::new().items(&labels).default(0).interact()?;
        match choices[idx] {
            ReviewChoice::Answer(i) => {
                session.answer(&question.options[i]);
                break;
            }
            ReviewChoice::Listen => say(speaker, &question.word.item.word, language).await,
        }
    }

    match session.answer_state() {
        AnswerState::Correct => println!("Correct!"),
        AnswerState::Incorrect => println!("Incorrect. The answer was: {}", question.answer()),
        AnswerState::Unanswered => {}
    }
    println!("  \"{}\" ({})", question.word.item.phrase, question.word.item.phrase_translation);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lesson(n: usize) -> Lesson {
        Lesson {
            id: "l1".to_string(),
            title: "Test".to_string(),
            items: (0..n)
                .map(|i| VocabularyItem {
                    id: format!("i{i}"),
                    word: format!("word{i}"),
                    translation: format!("t{i}"),
                    phrase: String::new(),
                    phrase_translation: String::new(),
                    pronunciation: None,
                })
                .collect(),
        }
    }

    #[test]
    fn deck_walks_forward_and_back() {
        let lesson = lesson(3);
        let mut deck = CardDeck::new(&lesson);
        assert_eq!(deck.position(), (1, 3));
        assert!(!deck.back());

        assert!(deck.flip());
        assert!(deck.advance());
        assert!(!deck.is_flipped());
        assert_eq!(deck.current().unwrap().id, "i1");

        assert!(deck.advance());
        assert!(deck.is_last());
        assert!(!deck.advance());

        assert!(deck.back());
        assert_eq!(deck.position(), (2, 3));

        deck.restart();
        assert_eq!(deck.current().unwrap().id, "i0");
    }

    #[test]
    fn flip_toggles() {
        let lesson = lesson(1);
        let mut deck = CardDeck::new(&lesson);
        assert!(deck.flip());
        assert!(!deck.flip());
    }

    #[test]
    fn actions_follow_deck_state() {
        let lesson = lesson(2);
        let mut deck = CardDeck::new(&lesson);
        assert_eq!(
            card_actions(&deck, true),
            vec![
                CardAction::Flip,
                CardAction::ListenWord,
                CardAction::Next,
                CardAction::Quit
            ]
        );

        deck.advance();
        deck.flip();
        assert_eq!(
            card_actions(&deck, true),
            vec![
                CardAction::Flip,
                CardAction::ListenPhrase,
                CardAction::Back,
                CardAction::Complete,
                CardAction::Quit
            ]
        );

        assert!(!card_actions(&deck, false).contains(&CardAction::ListenPhrase));
    }

    #[test]
    fn review_offers_listen_only_with_audio() {
        let item = lesson(1).items.remove(0);
        let question = QuizQuestion {
            word: crate::progress::LearnedWord {
                item,
                lang: "en".to_string(),
                level: None,
                learned_at: chrono::Utc::now(),
            },
            options: vec!["t0".to_string(), "---".to_string()],
        };

        assert_eq!(
            review_choices(&question, true),
            vec![
                ReviewChoice::Answer(0),
                ReviewChoice::Answer(1),
                ReviewChoice::Listen
            ]
        );
        assert!(!review_choices(&question, false).contains(&ReviewChoice::Listen));
    }
}
