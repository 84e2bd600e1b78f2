//! Learned-word progress
//!
//! The collection is read once from a single named blob and rewritten in
//! full after every addition.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::VocabularyItem;
use crate::db::BlobStore;
use crate::Result;

/// Name of the blob holding the serialized collection
pub const PROGRESS_BLOB: &str = "tiny_lessons_progress";

/// A vocabulary item the user has revealed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearnedWord {
    /// The catalog item
    #[serde(flatten)]
    pub item: VocabularyItem,
    /// Language code the item was learned in
    pub lang: String,
    /// Level code the item was learned at
    #[serde(default)]
    pub level: Option<String>,
    /// When the card was first revealed
    #[serde(rename = "learnedAt", with = "chrono::serde::ts_milliseconds")]
    pub learned_at: DateTime<Utc>,
}

impl LearnedWord {
    /// Item identifier
    #[must_use]
    pub fn id(&self) -> &str {
        &self.item.id
    }

    /// Correct answer when quizzing this word
    #[must_use]
    pub fn translation(&self) -> &str {
        &self.item.translation
    }
}

/// In-memory learned-word collection mirrored to a blob store
pub struct LearnedWordStore {
    blobs: Arc<dyn BlobStore>,
    words: Vec<LearnedWord>,
}

impl LearnedWordStore {
    /// Load the collection
    ///
    /// Missing or malformed data yields an empty collection.
    pub fn load(blobs: Arc<dyn BlobStore>) -> Self {
        let words = match blobs.get(PROGRESS_BLOB) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<LearnedWord>>(&raw) {
                Ok(words) => dedupe(words),
                Err(e) => {
                    tracing::warn!(error = %e, "stored progress is malformed, starting empty");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read stored progress, starting empty");
                Vec::new()
            }
        };

        tracing::debug!(count = words.len(), "learned words loaded");
        Self { blobs, words }
    }

    /// Record an item as learned at `learned_at`
    ///
    /// Returns `false` if the item was already learned. The in-memory
    /// collection keeps the new word even if persisting fails.
    ///
    /// # Errors
    ///
    /// Returns error if the collection cannot be written back
    pub fn record(
        &mut self,
        item: &VocabularyItem,
        lang: &str,
        level: Option<&str>,
        learned_at: DateTime<Utc>,
    ) -> Result<bool> {
        if self.contains(&item.id) {
            return Ok(false);
        }

        self.words.push(LearnedWord {
            item: item.clone(),
            lang: lang.to_string(),
            level: level.map(ToString::to_string),
            learned_at,
        });
        tracing::debug!(id = %item.id, lang, "word learned");

        self.persist()?;
        Ok(true)
    }

    /// Record an item as learned now
    ///
    /// # Errors
    ///
    /// Returns error if the collection cannot be written back
    pub fn mark_learned(&mut self, item: &VocabularyItem, lang: &str, level: &str) -> Result<bool> {
        self.record(item, lang, Some(level), Utc::now())
    }

    /// Whether an item id has been learned
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.words.iter().any(|w| w.item.id == id)
    }

    /// All learned words in learning order
    #[must_use]
    pub fn all(&self) -> &[LearnedWord] {
        &self.words
    }

    /// Number of learned words
    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Whether nothing has been learned
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Learned words of one language, in learning order
    #[must_use]
    pub fn for_language(&self, lang: &str) -> Vec<LearnedWord> {
        self.words.iter().filter(|w| w.lang == lang).cloned().collect()
    }

    /// Learned words of one language, newest first
    #[must_use]
    pub fn recent(&self, lang: &str) -> Vec<LearnedWord> {
        let mut words = self.for_language(lang);
        words.sort_by(|a, b| b.learned_at.cmp(&a.learned_at));
        words
    }

    /// Number of learned words for a language
    #[must_use]
    pub fn count(&self, lang: &str) -> usize {
        self.words.iter().filter(|w| w.lang == lang).count()
    }

    fn persist(&self) -> Result<()> {
        let raw = serde_json::to_string(&self.words)?;
        self.blobs.put(PROGRESS_BLOB, &raw)
    }
}

/// Keep the first occurrence of each id
fn dedupe(words: Vec<LearnedWord>) -> Vec<LearnedWord> {
    let mut seen = std::collections::HashSet::new();
    words
        .into_iter()
        .filter(|w| seen.insert(w.item.id.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::db::MemoryBlobStore;

    fn item(id: &str, translation: &str) -> VocabularyItem {
        VocabularyItem {
            id: id.to_string(),
            word: format!("word-{id}"),
            translation: translation.to_string(),
            phrase: "phrase".to_string(),
            phrase_translation: "frase".to_string(),
            pronunciation: None,
        }
    }

    fn at(millis: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(millis).unwrap()
    }

    #[test]
    fn record_is_identity_keyed() {
        let blobs = Arc::new(MemoryBlobStore::new());
        let mut store = LearnedWordStore::load(blobs);

        assert!(store.record(&item("e1", "Quedarse sin"), "en", Some("B1"), at(1)).unwrap());
        assert!(!store.record(&item("e1", "Quedarse sin"), "en", Some("B1"), at(2)).unwrap());
        assert_eq!(store.len(), 1);
        assert_eq!(store.all()[0].learned_at, at(1));
    }

    #[test]
    fn every_addition_is_persisted() {
        let blobs = Arc::new(MemoryBlobStore::new());
        let mut store = LearnedWordStore::load(blobs.clone());
        store.record(&item("e1", "a"), "en", Some("B1"), at(10)).unwrap();
        store.record(&item("d1", "b"), "de", Some("B1"), at(20)).unwrap();

        let reloaded = LearnedWordStore::load(blobs);
        assert_eq!(reloaded.all(), store.all());
    }

    #[test]
    fn wire_format_field_names() {
        let blobs = Arc::new(MemoryBlobStore::new());
        let mut store = LearnedWordStore::load(blobs.clone());
        store.record(&item("e1", "a"), "en", Some("B1"), at(1_700_000_000_000)).unwrap();

        let raw = blobs.get(PROGRESS_BLOB).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let entry = &value[0];
        for key in ["id", "word", "translation", "phrase", "phraseEs", "lang", "level"] {
            assert!(entry.get(key).is_some(), "missing {key}");
        }
        assert_eq!(entry["learnedAt"], 1_700_000_000_000_i64);
    }

    #[test]
    fn reads_existing_blob() {
        let raw = r#"[{"id":"e4","word":"To spearhead","translation":"Liderar / Encabezar",
            "phrase":"She spearheaded the project.","pronunciation":"/x/",
            "phraseEs":"Ella encabezó el proyecto.","lang":"en","level":"C1","learnedAt":1700000000000}]"#;
        let store = LearnedWordStore::load(Arc::new(MemoryBlobStore::with_blob(PROGRESS_BLOB, raw)));

        assert_eq!(store.len(), 1);
        let word = &store.all()[0];
        assert_eq!(word.id(), "e4");
        assert_eq!(word.level.as_deref(), Some("C1"));
        assert_eq!(word.item.pronunciation.as_deref(), Some("/x/"));
    }

    #[test]
    fn malformed_blob_is_empty() {
        for raw in ["not json", "{}", r#"[{"id": 3}]"#] {
            let store =
                LearnedWordStore::load(Arc::new(MemoryBlobStore::with_blob(PROGRESS_BLOB, raw)));
            assert!(store.is_empty(), "{raw}");
        }
    }

    #[test]
    fn recent_is_newest_first_per_language() {
        let mut store = LearnedWordStore::load(Arc::new(MemoryBlobStore::new()));
        store.record(&item("e1", "a"), "en", Some("B1"), at(100)).unwrap();
        store.record(&item("d1", "b"), "de", Some("B1"), at(200)).unwrap();
        store.record(&item("e2", "c"), "en", Some("B1"), at(300)).unwrap();

        let ids: Vec<String> = store.recent("en").iter().map(|w| w.item.id.clone()).collect();
        assert_eq!(ids, vec!["e2", "e1"]);
        assert_eq!(store.count("de"), 1);
        assert_eq!(store.count("fr"), 0);
    }
}
