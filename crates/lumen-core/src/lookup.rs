// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Payloads returned by the dictionary and translation services, and the
//! text analysis that decides what to look up.

use std::collections::HashSet;

use serde::Deserialize;
use serde::Serialize;

/// Shown when a translation can't be obtained.
pub const FALLBACK_TRANSLATION: &str = "Translation unavailable";

/// Shown for a rare word whose definition couldn't be fetched.
pub const MISSING_MEANING: &str = "No definition available yet";

/// At most this many rare words are looked up per sentence.
pub const MAX_RARE_WORDS: usize = 5;

/// At most this many synonyms are kept per rare word.
pub const MAX_SYNONYMS: usize = 4;

const COMMON_WORDS: &[&str] = &[
    "a", "an", "the", "i", "you", "he", "she", "it", "we", "they", "of", "to", "and", "in", "for",
    "on", "with", "is", "are", "was", "were", "be", "been", "have", "has", "had", "do", "does",
    "did", "not", "this", "that", "these", "those", "from", "by", "as", "at", "or", "but", "if",
    "then", "so", "because", "about", "into", "over", "after", "before", "up", "down", "out",
    "more", "most", "some", "any", "no", "yes", "can", "could", "should", "would", "will",
    "shall", "may", "might", "just", "only", "also", "very", "how", "what", "when", "where",
    "who", "why", "which", "while", "during", "each", "other", "than", "such", "their", "my",
    "your", "his", "her", "its", "our", "me", "him", "them", "us", "one", "two", "three",
    "first", "second", "time", "new", "good", "day", "year", "life", "work", "use", "make", "go",
    "know", "see", "need", "feel", "think", "take", "give", "find", "want", "tell", "seem", "put",
    "like", "help", "run", "call", "look", "back", "right", "left", "large", "small", "long",
    "short",
];

/// One sense of a word.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sense {
    pub definition: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
    pub synonyms: Vec<String>,
}

/// Senses grouped under a part of speech.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Meaning {
    pub part_of_speech: String,
    pub definitions: Vec<Sense>,
    pub synonyms: Vec<String>,
}

/// One headword as the dictionary returns it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DictionaryEntry {
    pub word: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phonetic: Option<String>,
    pub meanings: Vec<Meaning>,
}

/// A definition lookup result, as cached.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DefinitionPayload {
    pub definitions: Vec<DictionaryEntry>,
    /// The first sense of the first meaning of the first entry, or empty.
    pub primary_definition: String,
}

impl DefinitionPayload {
    pub fn new(definitions: Vec<DictionaryEntry>) -> Self {
        let primary_definition = first_sense(&definitions)
            .map(|(_, sense)| sense.definition.clone())
            .unwrap_or_default();
        Self {
            definitions,
            primary_definition,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Phonetic of the first entry, if any.
    pub fn phonetic(&self) -> Option<String> {
        self.definitions
            .first()
            .and_then(|e| e.phonetic.clone())
            .filter(|p| !p.trim().is_empty())
    }
}

fn first_sense(definitions: &[DictionaryEntry]) -> Option<(&Meaning, &Sense)> {
    let meaning = definitions.first()?.meanings.first()?;
    let sense = meaning.definitions.first()?;
    Some((meaning, sense))
}

/// Summary of an uncommon word found in a looked-up sentence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RareWord {
    pub word: String,
    pub part_of_speech: Option<String>,
    pub meaning: String,
    pub example: Option<String>,
    pub synonyms: Vec<String>,
}

impl RareWord {
    /// Summarize a definition lookup for `word`.
    pub fn from_payload(word: &str, payload: &DefinitionPayload) -> Self {
        let meaning = payload.definitions.first().and_then(|e| e.meanings.first());
        let sense = meaning.and_then(|m| m.definitions.first());
        Self {
            word: word.to_string(),
            part_of_speech: meaning
                .map(|m| m.part_of_speech.clone())
                .filter(|p| !p.is_empty()),
            meaning: sense
                .map(|s| s.definition.clone())
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| MISSING_MEANING.to_string()),
            example: sense.and_then(|s| s.example.clone()),
            synonyms: meaning
                .map(|m| m.synonyms.iter().take(MAX_SYNONYMS).cloned().collect())
                .unwrap_or_default(),
        }
    }

    /// Placeholder for a word whose lookup failed.
    pub fn missing(word: &str) -> Self {
        Self {
            word: word.to_string(),
            part_of_speech: None,
            meaning: MISSING_MEANING.to_string(),
            example: None,
            synonyms: Vec::new(),
        }
    }
}

/// A query is a sentence when its trimmed text contains whitespace.
pub fn is_sentence(text: &str) -> bool {
    text.trim().chars().any(char::is_whitespace)
}

/// Lowercased runs of ASCII letters and apostrophes.
fn tokens(sentence: &str) -> Vec<String> {
    let lowered = sentence.to_lowercase();
    lowered
        .split(|c: char| !(c.is_ascii_lowercase() || c == '\''))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// The uncommon words of a sentence worth looking up: unique, not a
/// stopword, longer than two characters, in order of first appearance, at
/// most [`MAX_RARE_WORDS`].
pub fn rare_words(sentence: &str) -> Vec<String> {
    let common: HashSet<&str> = COMMON_WORDS.iter().copied().collect();
    let mut seen: HashSet<String> = HashSet::new();
    tokens(sentence)
        .into_iter()
        .filter(|t| seen.insert(t.clone()))
        .filter(|t| !common.contains(t.as_str()) && t.chars().count() > 2)
        .take(MAX_RARE_WORDS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Fallible;

    const SAMPLE: &str = r#"[
        {
            "word": "serendipity",
            "phonetic": "/ˌsɛɹənˈdɪpɪti/",
            "meanings": [
                {
                    "partOfSpeech": "noun",
                    "definitions": [
                        {"definition": "A fortunate discovery by accident.", "example": "Pure serendipity.", "synonyms": []}
                    ],
                    "synonyms": ["chance", "fluke", "luck", "fortune", "providence"]
                }
            ]
        }
    ]"#;

    #[test]
    fn test_parse_dictionary_response() -> Fallible<()> {
        let entries: Vec<DictionaryEntry> = serde_json::from_str(SAMPLE)?;
        let payload = DefinitionPayload::new(entries);
        assert_eq!(payload.primary_definition, "A fortunate discovery by accident.");
        assert_eq!(payload.phonetic().as_deref(), Some("/ˌsɛɹənˈdɪpɪti/"));
        Ok(())
    }

    #[test]
    fn test_parse_tolerates_missing_fields() -> Fallible<()> {
        let entries: Vec<DictionaryEntry> = serde_json::from_str(r#"[{"word": "x"}]"#)?;
        let payload = DefinitionPayload::new(entries);
        assert_eq!(payload.primary_definition, "");
        assert!(payload.phonetic().is_none());
        assert!(!payload.is_empty());
        Ok(())
    }

    #[test]
    fn test_rare_word_summary() -> Fallible<()> {
        let entries: Vec<DictionaryEntry> = serde_json::from_str(SAMPLE)?;
        let rare = RareWord::from_payload("serendipity", &DefinitionPayload::new(entries));
        assert_eq!(rare.part_of_speech.as_deref(), Some("noun"));
        assert_eq!(rare.example.as_deref(), Some("Pure serendipity."));
        assert_eq!(rare.synonyms, vec!["chance", "fluke", "luck", "fortune"]);
        let empty = RareWord::from_payload("zzz", &DefinitionPayload::default());
        assert_eq!(empty.meaning, MISSING_MEANING);
        Ok(())
    }

    #[test]
    fn test_is_sentence() {
        assert!(is_sentence("the quick fox"));
        assert!(!is_sentence("  fox  "));
        assert!(!is_sentence(""));
    }

    #[test]
    fn test_rare_words() {
        let words = rare_words("The ubiquitous cat, the UBIQUITOUS dog: it's an ephemeral ox!");
        assert_eq!(words, vec!["ubiquitous", "cat", "dog", "it's", "ephemeral"]);
    }

    #[test]
    fn test_rare_words_are_capped() {
        let words = rare_words("alpha bravo charlie delta echo foxtrot golf");
        assert_eq!(words.len(), MAX_RARE_WORDS);
        assert_eq!(words[0], "alpha");
    }

    #[test]
    fn test_rare_words_skip_common_and_short() {
        assert!(rare_words("it is in the day of my life").is_empty());
    }
}
