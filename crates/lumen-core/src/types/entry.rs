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

use std::collections::BTreeSet;
use std::fmt::Display;
use std::fmt::Formatter;

use serde::Deserialize;
use serde::Serialize;

use crate::error::ErrorReport;
use crate::types::timestamp::Timestamp;
use crate::types::timestamp::zero_unset;

/// Trim and lowercase. Every key in the wordbook, the search counts and the
/// lookup cache goes through this.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Collapse runs of whitespace into single spaces and trim the ends.
pub fn clean_definition(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// How an entry first got into the wordbook.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    #[default]
    AutoLookup,
    SentenceCapture,
    BatchImport,
    Manual,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::AutoLookup => "auto_lookup",
            Source::SentenceCapture => "sentence_capture",
            Source::BatchImport => "batch_import",
            Source::Manual => "manual",
        }
    }

    /// Parse a source tag, accepting the display labels older snapshots
    /// stored instead of the identifiers.
    pub fn parse_lenient(value: &str) -> Option<Self> {
        match value.trim() {
            "auto_lookup" | "自动收藏" => Some(Source::AutoLookup),
            "sentence_capture" | "句子收藏" => Some(Source::SentenceCapture),
            "batch_import" | "批量导入" => Some(Source::BatchImport),
            "manual" | "单词收藏" | "手动添加" => Some(Source::Manual),
            _ => None,
        }
    }
}

impl Display for Source {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<String> for Source {
    type Error = ErrorReport;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Source::parse_lenient(&value)
            .ok_or_else(|| ErrorReport::new(format!("invalid source: {value}")))
    }
}

/// Review statistics for an entry.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Stats {
    /// Number of quiz answers recorded.
    pub tests: u32,
    /// Number of those answers that were correct.
    pub correct: u32,
    /// Consecutive correct answers; zeroed by any miss.
    pub streak: u32,
    #[serde(with = "zero_unset")]
    pub last_tested: Option<Timestamp>,
    /// Only the scheduler writes this.
    #[serde(with = "zero_unset")]
    pub next_review: Option<Timestamp>,
}

impl Stats {
    /// Fraction of correct answers, `0.0` when never tested.
    pub fn accuracy(&self) -> f64 {
        if self.tests == 0 {
            0.0
        } else {
            self.correct as f64 / self.tests as f64
        }
    }

    /// Clamp counters that came from outside so `correct <= tests` and
    /// `streak <= tests` hold.
    pub fn clamped(self) -> Self {
        Self {
            correct: self.correct.min(self.tests),
            streak: self.streak.min(self.tests),
            ..self
        }
    }
}

/// One learned word or captured sentence.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    /// Normalized key. Never empty.
    pub word: String,
    pub definition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phonetic: Option<String>,
    pub added_at: Timestamp,
    #[serde(default)]
    pub source: Source,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub stats: Stats,
}

impl Entry {
    pub fn new(word: &str, source: Source, added_at: Timestamp) -> Self {
        Self {
            word: normalize(word),
            definition: String::new(),
            phonetic: None,
            added_at,
            source,
            note: String::new(),
            tags: BTreeSet::new(),
            stats: Stats::default(),
        }
    }

    /// The definition as used by the quiz: whitespace collapsed.
    pub fn cleaned_definition(&self) -> String {
        clean_definition(&self.definition)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(&normalize(tag))
    }
}
