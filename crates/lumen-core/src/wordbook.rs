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

use std::collections::BTreeMap;

use crate::error::Fallible;
use crate::error::fail;
use crate::scheduler::Outcome;
use crate::scheduler::record_answer;
use crate::types::entry::Entry;
use crate::types::entry::Source;
use crate::types::entry::Stats;
use crate::types::entry::clean_definition;
use crate::types::entry::normalize;
use crate::types::timestamp::Timestamp;

/// How many entries the review list shows.
pub const REVIEW_LIST_SIZE: usize = 6;

/// Fields supplied when saving a word. `None` or blank values fall back to
/// whatever the entry already has.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EntryPatch {
    pub definition: Option<String>,
    pub phonetic: Option<String>,
    pub source: Option<Source>,
    pub note: Option<String>,
}

/// Split free-form batch input into unique normalized words, in order of
/// first appearance. Separators are newlines, commas and semicolons (ASCII or
/// full-width); anything but letters, apostrophes and hyphens becomes a
/// space.
pub fn parse_batch_words(input: &str) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for chunk in input.split(['\n', '\r', ',', ';', '，', '；']) {
        let cleaned: String = chunk
            .chars()
            .map(|c| {
                if c.is_ascii_alphabetic() || c == '\'' || c == '-' {
                    c
                } else {
                    ' '
                }
            })
            .collect();
        let word = normalize(&cleaned);
        if !word.is_empty() && !seen.contains(&word) {
            seen.push(word);
        }
    }
    seen
}

/// Criteria for [`Wordbook::filter`]. Every set field must match.
#[derive(Clone, Debug, Default)]
pub struct EntryFilter {
    /// Case-insensitive substring of the word or the definition.
    pub text: Option<String>,
    pub tag: Option<String>,
    pub source: Option<Source>,
}

impl EntryFilter {
    fn matches(&self, entry: &Entry) -> bool {
        if let Some(text) = &self.text {
            let needle = normalize(text);
            if !needle.is_empty()
                && !entry.word.contains(&needle)
                && !entry.definition.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        if let Some(tag) = &self.tag {
            if !entry.has_tag(tag) {
                return false;
            }
        }
        if let Some(source) = self.source {
            if entry.source != source {
                return false;
            }
        }
        true
    }
}

/// Aggregate numbers for the whole wordbook.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WordbookStats {
    pub entries: usize,
    pub tested: usize,
    pub tests: u32,
    pub correct: u32,
}

impl WordbookStats {
    pub fn accuracy(&self) -> f64 {
        if self.tests == 0 {
            0.0
        } else {
            self.correct as f64 / self.tests as f64
        }
    }
}

/// The authoritative collection of entries, one per normalized word.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Wordbook {
    entries: BTreeMap<String, Entry>,
}

impl Wordbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, word: &str) -> Option<&Entry> {
        self.entries.get(&normalize(word))
    }

    pub fn contains(&self, word: &str) -> bool {
        self.entries.contains_key(&normalize(word))
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.values()
    }

    /// Save a word, merging with any existing entry. Returns `None` when the
    /// word normalizes to nothing.
    pub fn upsert(&mut self, word: &str, patch: EntryPatch, now: Timestamp) -> Option<&Entry> {
        let key = normalize(word);
        if key.is_empty() {
            return None;
        }
        let existing = self.entries.remove(&key);
        let base = existing.unwrap_or_else(|| Entry::new(&key, Source::Manual, now));
        let pick = |new: Option<String>, old: String| -> String {
            match new {
                Some(value) if !value.trim().is_empty() => value,
                _ => old,
            }
        };
        let phonetic = match patch.phonetic {
            Some(p) if !p.trim().is_empty() => Some(p),
            _ => base.phonetic,
        };
        let entry = Entry {
            word: key.clone(),
            definition: clean_definition(&pick(patch.definition, base.definition)),
            phonetic,
            added_at: base.added_at,
            source: patch.source.unwrap_or(base.source),
            note: pick(patch.note, base.note),
            tags: base.tags,
            stats: base.stats,
        };
        self.entries.insert(key.clone(), entry);
        self.entries.get(&key)
    }

    /// Insert an already-normalized entry, replacing any entry with the same
    /// key.
    pub fn insert(&mut self, entry: Entry) {
        self.entries.insert(entry.word.clone(), entry);
    }

    pub(crate) fn get_mut(&mut self, word: &str) -> Option<&mut Entry> {
        self.entries.get_mut(&normalize(word))
    }

    /// Add the tag if missing, remove it if present. Returns whether the tag
    /// is now set.
    pub fn toggle_tag(&mut self, word: &str, tag: &str) -> Fallible<bool> {
        let tag = normalize(tag);
        if tag.is_empty() {
            return fail("tag is empty.");
        }
        let Some(entry) = self.get_mut(word) else {
            return fail(format!("'{}' is not in the wordbook.", normalize(word)));
        };
        if entry.tags.remove(&tag) {
            Ok(false)
        } else {
            entry.tags.insert(tag);
            Ok(true)
        }
    }

    /// Feed a quiz answer through the scheduler.
    pub fn record_answer(&mut self, word: &str, outcome: Outcome, now: Timestamp) -> Fallible<Stats> {
        let Some(entry) = self.get_mut(word) else {
            return fail(format!("'{}' is not in the wordbook.", normalize(word)));
        };
        entry.stats = record_answer(entry.stats, outcome, now);
        Ok(entry.stats)
    }

    /// Matching entries, newest first.
    pub fn filter(&self, filter: &EntryFilter) -> Vec<&Entry> {
        let mut result: Vec<&Entry> = self.iter().filter(|e| filter.matches(e)).collect();
        result.sort_by(|a, b| b.added_at.cmp(&a.added_at).then_with(|| a.word.cmp(&b.word)));
        result
    }

    /// The entries tested longest ago, never-tested ones first.
    pub fn review_list(&self) -> Vec<&Entry> {
        let mut result: Vec<&Entry> = self.iter().collect();
        result.sort_by_key(|e| e.stats.last_tested);
        result.truncate(REVIEW_LIST_SIZE);
        result
    }

    /// Entries never scheduled or scheduled at or before `now`, most overdue
    /// first.
    pub fn due(&self, now: Timestamp) -> Vec<&Entry> {
        let mut result: Vec<&Entry> = self
            .iter()
            .filter(|e| e.stats.next_review.is_none_or(|at| at <= now))
            .collect();
        result.sort_by_key(|e| e.stats.next_review);
        result
    }

    pub fn stats(&self) -> WordbookStats {
        self.iter().fold(
            WordbookStats {
                entries: 0,
                tested: 0,
                tests: 0,
                correct: 0,
            },
            |acc, e| WordbookStats {
                entries: acc.entries + 1,
                tested: acc.tested + usize::from(e.stats.tests > 0),
                tests: acc.tests + e.stats.tests,
                correct: acc.correct + e.stats.correct,
            },
        )
    }
}
