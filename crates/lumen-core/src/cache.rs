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

//! Session-lifetime memo of lookup results.
//!
//! Keys are normalized query text. Definitions and translations live in
//! separate namespaces. Nothing is ever evicted.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::PoisonError;

use crate::lookup::DefinitionPayload;
use crate::types::entry::normalize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LookupKind {
    Definition,
    Translation,
}

/// A cached value of either kind.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    Definition(DefinitionPayload),
    Translation(String),
}

impl Payload {
    pub fn kind(&self) -> LookupKind {
        match self {
            Payload::Definition(_) => LookupKind::Definition,
            Payload::Translation(_) => LookupKind::Translation,
        }
    }
}

#[derive(Default)]
struct Inner {
    entries: HashMap<(LookupKind, String), Payload>,
    hits: usize,
    misses: usize,
}

/// Shared by the primary query and every sub-lookup it fans out to. The lock
/// is only held for the map operation itself, never across an await.
#[derive(Default)]
pub struct LookupCache {
    inner: Mutex<Inner>,
}

impl LookupCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns an owned copy: callers may mutate it freely without affecting
    /// what later callers see.
    pub fn get(&self, kind: LookupKind, key: &str) -> Option<Payload> {
        let mut inner = self.lock();
        let found = inner.entries.get(&(kind, normalize(key))).cloned();
        if found.is_some() {
            inner.hits += 1;
        } else {
            inner.misses += 1;
        }
        found
    }

    pub fn put(&self, key: &str, payload: Payload) {
        let mut inner = self.lock();
        inner.entries.insert((payload.kind(), normalize(key)), payload);
    }

    pub fn definition(&self, key: &str) -> Option<DefinitionPayload> {
        match self.get(LookupKind::Definition, key) {
            Some(Payload::Definition(payload)) => Some(payload),
            _ => None,
        }
    }

    pub fn put_definition(&self, key: &str, payload: DefinitionPayload) {
        self.put(key, Payload::Definition(payload));
    }

    pub fn translation(&self, key: &str) -> Option<String> {
        match self.get(LookupKind::Translation, key) {
            Some(Payload::Translation(text)) => Some(text),
            _ => None,
        }
    }

    pub fn put_translation(&self, key: &str, text: String) {
        self.put(key, Payload::Translation(text));
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(hits, misses)` since creation.
    pub fn stats(&self) -> (usize, usize) {
        let inner = self.lock();
        (inner.hits, inner.misses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::DictionaryEntry;
    use crate::lookup::Meaning;
    use crate::lookup::Sense;

    fn payload() -> DefinitionPayload {
        DefinitionPayload::new(vec![DictionaryEntry {
            word: "cat".to_string(),
            phonetic: Some("/kæt/".to_string()),
            meanings: vec![Meaning {
                part_of_speech: "noun".to_string(),
                definitions: vec![Sense {
                    definition: "A small feline.".to_string(),
                    example: None,
                    synonyms: vec!["kitty".to_string()],
                }],
                synonyms: Vec::new(),
            }],
        }])
    }

    #[test]
    fn test_round_trip() {
        let cache = LookupCache::new();
        assert!(cache.definition("cat").is_none());
        cache.put_definition("cat", payload());
        assert_eq!(cache.definition("cat"), Some(payload()));
        assert_eq!(cache.stats(), (1, 1));
    }

    #[test]
    fn test_mutating_a_copy_does_not_corrupt_the_cache() {
        let cache = LookupCache::new();
        cache.put_definition("cat", payload());
        let mut copy = cache.definition("cat").unwrap();
        copy.definitions[0].meanings[0].definitions.clear();
        copy.definitions[0].meanings.push(Meaning::default());
        copy.primary_definition.push_str("!!!");
        assert_eq!(cache.definition("cat"), Some(payload()));
    }

    #[test]
    fn test_keys_are_normalized() {
        let cache = LookupCache::new();
        cache.put_translation("  Good Morning ", "早上好".to_string());
        assert_eq!(cache.translation("good morning").as_deref(), Some("早上好"));
    }

    #[test]
    fn test_namespaces_are_disjoint() {
        let cache = LookupCache::new();
        cache.put_translation("cat", "猫".to_string());
        assert!(cache.definition("cat").is_none());
        assert!(cache.get(LookupKind::Definition, "cat").is_none());
        cache.put_definition("cat", payload());
        assert_eq!(cache.translation("cat").as_deref(), Some("猫"));
        assert_eq!(cache.len(), 2);
    }
}
