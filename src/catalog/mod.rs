//! Static lesson catalog
//!
//! Words are grouped by language code, then proficiency level, then lesson.
//! The catalog is read-only; learned progress lives in [`crate::progress`].

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Catalog shipped with the binary
const EMBEDDED_CATALOG: &str = include_str!("../../catalog/lessons.toml");

/// A word or phrase with its translation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyItem {
    /// Unique item identifier
    pub id: String,
    /// Word in the target language
    pub word: String,
    /// Translation in the native language
    pub translation: String,
    /// Example phrase in the target language
    pub phrase: String,
    /// Example phrase translation
    #[serde(rename = "phraseEs")]
    pub phrase_translation: String,
    /// IPA transcription
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pronunciation: Option<String>,
}

/// A themed group of items
#[derive(Debug, Clone, Deserialize)]
pub struct Lesson {
    /// Lesson identifier
    pub id: String,
    /// Display title
    pub title: String,
    /// Cards in presentation order
    #[serde(default)]
    pub items: Vec<VocabularyItem>,
}

/// A proficiency level (e.g. "B1")
#[derive(Debug, Clone, Deserialize)]
pub struct Level {
    /// Display name
    pub name: String,
    /// Lessons in this level
    #[serde(default)]
    pub lessons: Vec<Lesson>,
}

/// Language → level → lessons lookup
#[derive(Debug, Clone)]
pub struct Catalog {
    languages: BTreeMap<String, BTreeMap<String, Level>>,
}

impl Catalog {
    /// Load the catalog embedded in the binary
    ///
    /// # Errors
    ///
    /// Returns error if the embedded catalog is invalid
    pub fn embedded() -> Result<Self> {
        Self::from_toml(EMBEDDED_CATALOG)
    }

    /// Parse a catalog from TOML
    ///
    /// # Errors
    ///
    /// Returns error if the TOML is malformed or an item id appears twice
    pub fn from_toml(content: &str) -> Result<Self> {
        let languages: BTreeMap<String, BTreeMap<String, Level>> = toml::from_str(content)?;

        let mut seen = HashSet::new();
        for item in languages
            .values()
            .flat_map(BTreeMap::values)
            .flat_map(|level| &level.lessons)
            .flat_map(|lesson| &lesson.items)
        {
            if !seen.insert(item.id.as_str()) {
                return Err(Error::Catalog(format!("duplicate item id: {}", item.id)));
            }
        }

        Ok(Self { languages })
    }

    /// Language codes in the catalog
    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.languages.keys().map(String::as_str)
    }

    /// Whether the catalog has content for a language
    #[must_use]
    pub fn has_language(&self, language: &str) -> bool {
        self.languages.contains_key(language)
    }

    /// Levels for a language, ordered by code
    pub fn levels(&self, language: &str) -> impl Iterator<Item = (&str, &Level)> {
        self.languages
            .get(language)
            .into_iter()
            .flat_map(|levels| levels.iter().map(|(code, level)| (code.as_str(), level)))
    }

    /// A single level
    #[must_use]
    pub fn level(&self, language: &str, level: &str) -> Option<&Level> {
        self.languages.get(language)?.get(level)
    }

    /// Lessons of a level; empty if the language or level is unknown
    #[must_use]
    pub fn lessons(&self, language: &str, level: &str) -> &[Lesson] {
        self.level(language, level)
            .map(|level| level.lessons.as_slice())
            .unwrap_or_default()
    }

    /// Find an item by id within a language, with its level code
    #[must_use]
    pub fn find_item(&self, language: &str, id: &str) -> Option<(&str, &VocabularyItem)> {
        self.levels(language).find_map(|(code, level)| {
            level
                .lessons
                .iter()
                .flat_map(|lesson| &lesson.items)
                .find(|item| item.id == id)
                .map(|item| (code, item))
        })
    }

    /// Total number of items for a language
    #[must_use]
    pub fn item_count(&self, language: &str) -> usize {
        self.levels(language)
            .flat_map(|(_, level)| &level.lessons)
            .map(|lesson| lesson.items.len())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_catalog_loads() {
        let catalog = Catalog::embedded().unwrap();
        let languages: Vec<&str> = catalog.languages().collect();
        assert_eq!(languages, vec!["de", "en", "fr"]);

        let levels: Vec<&str> = catalog.levels("en").map(|(code, _)| code).collect();
        assert_eq!(levels, vec!["B1", "B2", "C1"]);
        assert_eq!(catalog.item_count("en"), 5);
        assert_eq!(catalog.item_count("de"), 6);
    }

    #[test]
    fn lookup_by_level() {
        let catalog = Catalog::embedded().unwrap();
        let lessons = catalog.lessons("fr", "B2");
        assert_eq!(lessons.len(), 1);
        assert_eq!(lessons[0].title, "Monde du Travail");
        assert_eq!(lessons[0].items[1].word, "Atout");

        assert!(catalog.lessons("fr", "A1").is_empty());
        assert!(catalog.lessons("xx", "B1").is_empty());
        assert_eq!(catalog.level("de", "C1").unwrap().name, "Oberstufe");
    }

    #[test]
    fn find_item_reports_level() {
        let catalog = Catalog::embedded().unwrap();
        let (level, item) = catalog.find_item("en", "e5").unwrap();
        assert_eq!(level, "C1");
        assert_eq!(item.translation, "Omnipresente");
        assert!(item.pronunciation.is_some());

        assert!(catalog.find_item("de", "e5").is_none());
    }

    #[test]
    fn rejects_duplicate_ids() {
        let toml = r#"
            [en.B1]
            name = "Intermediate"
            [[en.B1.lessons]]
            id = "l1"
            title = "One"
            [[en.B1.lessons.items]]
            id = "x"
            word = "a"
            translation = "b"
            phrase = "c"
            phraseEs = "d"
            [[en.B1.lessons.items]]
            id = "x"
            word = "e"
            translation = "f"
            phrase = "g"
            phraseEs = "h"
        "#;
        assert!(matches!(Catalog::from_toml(toml), Err(Error::Catalog(_))));
    }
}
