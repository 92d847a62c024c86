//! Disallowed-word moderation.
//!
//! Text is blocked when any of its whitespace-separated, lowercased tokens is
//! an exact member of the disallowed-word set. Substrings never match:
//! `"badly"` is not blocked by `"bad"`.

use std::collections::HashSet;

use serde::Deserialize;

use crate::error::CoreError;

const BUNDLED_WORDS: &str = include_str!("../../../resources/words.json");

#[derive(Debug, Deserialize)]
struct WordList {
    words: Vec<String>,
}

/// Immutable disallowed-word set, built once at startup.
#[derive(Debug, Clone, Default)]
pub struct WordFilter {
    words: HashSet<String>,
}

impl WordFilter {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words = words
            .into_iter()
            .map(|word| word.as_ref().trim().to_lowercase())
            .filter(|word| !word.is_empty())
            .collect();
        Self { words }
    }

    /// The list shipped in `resources/words.json`.
    pub fn builtin() -> Result<Self, CoreError> {
        Self::from_json(BUNDLED_WORDS)
    }

    /// Parses `{"words": ["..."]}`.
    pub fn from_json(raw: &str) -> Result<Self, CoreError> {
        let list: WordList =
            serde_json::from_str(raw).map_err(|err| CoreError::InvalidWordList(err.to_string()))?;
        Ok(Self::new(list.words))
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn is_blocked(&self, text: &str) -> bool {
        classify(text, &self.words)
    }
}

pub fn classify(text: &str, words: &HashSet<String>) -> bool {
    if words.is_empty() {
        return false;
    }
    text.to_lowercase()
        .split_whitespace()
        .any(|token| words.contains(token))
}
