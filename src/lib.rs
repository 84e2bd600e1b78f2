//! Lingo Cards - Flashcard vocabulary trainer with spoken pronunciation
//!
//! This library provides the core functionality for the `lingo` binary:
//! - Voice pipeline (remote TTS, payload decoding, playback)
//! - Lesson catalog and learned-word progress
//! - Review quizzes over learned words
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                   Study flows                        │
//! │    Lessons  │  Vocabulary  │  Review quiz            │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │   Catalog  │  Progress (SQLite)  │  Quiz  │  Speaker │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │     Gemini TTS  →  base64  →  PCM  →  Playback       │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod progress;
pub mod quiz;
pub mod study;
pub mod voice;

pub use catalog::{Catalog, Lesson, Level, VocabularyItem};
pub use config::Config;
pub use db::{BlobStore, DbConn, DbPool, MemoryBlobStore, SqliteBlobStore};
pub use error::{Error, Result};
pub use progress::{LearnedWord, LearnedWordStore};
pub use quiz::{QuizQuestion, QuizSession, QuizState, build_quiz};
pub use voice::{RenderOutcome, SpeakOutcome, Speaker};
