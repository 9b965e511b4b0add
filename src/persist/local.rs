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

use std::path::Path;

use lumen_core::PartialSnapshot;
use lumen_core::Timestamp;
use lumen_core::snapshot::KEY_DAILY_GOAL;
use lumen_core::snapshot::KEY_MISSED_WORDS;
use lumen_core::snapshot::KEY_SEARCH_COUNTS;
use lumen_core::snapshot::KEY_WORDBOOK;
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::params;
use serde_json::Map;
use serde_json::Value;

use crate::error::Fallible;
use crate::error::ReportExt;

/// File name of the local fallback store inside the data directory.
pub const LOCAL_FILE: &str = "lumen-local.db";

/// Storage key for each snapshot field.
const KEYS: [(&str, &str); 4] = [
    ("wordbook_entries_v2", KEY_WORDBOOK),
    ("word_search_counts", KEY_SEARCH_COUNTS),
    ("daily_goal", KEY_DAILY_GOAL),
    ("missed_words", KEY_MISSED_WORDS),
];

/// Local key-value fallback, one row per snapshot field.
pub struct LocalStore {
    conn: Connection,
}

impl LocalStore {
    pub fn open(path: &Path) -> Fallible<Self> {
        let conn = Connection::open(path).report("failed to open local store")?;
        Self::init(conn)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Fallible<Self> {
        let conn = Connection::open_in_memory().report("failed to open local store")?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Fallible<Self> {
        conn.execute_batch(
            "create table if not exists kv (
                key text primary key,
                value text not null
            );",
        )
        .report("failed to create local store")?;
        Ok(Self { conn })
    }

    pub fn get(&self, key: &str) -> Fallible<Option<String>> {
        self.conn
            .query_row("select value from kv where key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()
            .report("failed to read local store")
    }

    pub fn set(&self, key: &str, value: &str) -> Fallible<()> {
        self.conn
            .execute(
                "insert into kv (key, value) values (?1, ?2)
                 on conflict (key) do update set value = excluded.value",
                params![key, value],
            )
            .report("failed to write local store")?;
        Ok(())
    }

    /// Whatever fields the store holds. Unreadable values are skipped.
    pub fn load(&self, now: Timestamp) -> Fallible<PartialSnapshot> {
        let mut map = Map::new();
        for (storage_key, field) in KEYS {
            let Some(text) = self.get(storage_key)? else {
                continue;
            };
            match serde_json::from_str::<Value>(&text) {
                Ok(value) => {
                    map.insert(field.to_string(), value);
                }
                Err(e) => log::warn!("Ignoring unreadable local value {storage_key}: {e}"),
            }
        }
        Ok(PartialSnapshot::from_map(&map, now))
    }

    /// Write each field present in `map` under its own key. Every field is
    /// attempted; the first failure is returned.
    pub fn save(&self, map: &Map<String, Value>) -> Fallible<()> {
        let mut first_error = None;
        for (storage_key, field) in KEYS {
            let Some(value) = map.get(field) else {
                continue;
            };
            if let Err(e) = self.set(storage_key, &value.to_string()) {
                log::warn!("Local write of {storage_key} failed: {e}");
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::tempdir;

    use super::*;

    fn now() -> Timestamp {
        Timestamp::from_millis(1_700_000_000_000)
    }

    #[test]
    fn test_empty_store_loads_nothing() -> Fallible<()> {
        let store = LocalStore::open_in_memory()?;
        assert!(store.load(now())?.is_empty());
        Ok(())
    }

    #[test]
    fn test_round_trip_under_storage_keys() -> Fallible<()> {
        let dir = tempdir()?;
        let store = LocalStore::open(&dir.path().join(LOCAL_FILE))?;
        let map = json!({
            "searchCounts": {"cat": 3},
            "missedWords": ["cat"],
        });
        store.save(map.as_object().unwrap())?;
        assert_eq!(store.get("word_search_counts")?.as_deref(), Some("{\"cat\":3}"));
        assert_eq!(store.get("wordbook_entries_v2")?, None);

        let partial = store.load(now())?;
        assert_eq!(partial.search_counts.unwrap().get("cat"), Some(&3));
        assert!(partial.missed_words.unwrap().contains("cat"));
        assert_eq!(partial.wordbook, None);
        Ok(())
    }

    #[test]
    fn test_unreadable_value_is_skipped() -> Fallible<()> {
        let store = LocalStore::open_in_memory()?;
        store.set("missed_words", "not json")?;
        store.set("word_search_counts", "{\"owl\":1}")?;
        let partial = store.load(now())?;
        assert_eq!(partial.missed_words, None);
        assert!(partial.search_counts.is_some());
        Ok(())
    }
}
