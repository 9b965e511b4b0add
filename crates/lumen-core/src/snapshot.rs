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

//! The persisted shape of the engine, and the normalization that turns
//! loosely-typed records (older snapshots, hand-edited exports) into
//! canonical entries.
//!
//! Defaults applied to a legacy entry record:
//!
//! | field        | source                          | default              |
//! |--------------|---------------------------------|----------------------|
//! | `word`       | `word`, else `term`             | record dropped       |
//! | `definition` | `definition`, else `translated` | [`SAVED_PLACEHOLDER`] |
//! | `phonetic`   | `phonetic`                      | none                 |
//! | `addedAt`    | `addedAt`                       | load time            |
//! | `source`     | `source` (id or legacy label)   | auto-lookup          |
//! | `note`       | `note`                          | empty                |
//! | `tags`       | `tags`                          | empty                |
//! | `stats.*`    | `stats.*`                       | zero / unset         |

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::error::Fallible;
use crate::error::fail;
use crate::goal::DailyGoal;
use crate::types::entry::Entry;
use crate::types::entry::Source;
use crate::types::entry::Stats;
use crate::types::entry::clean_definition;
use crate::types::entry::normalize;
use crate::types::timestamp::Timestamp;
use crate::wordbook::Wordbook;

pub const KEY_WORDBOOK: &str = "wordbook";
pub const KEY_SEARCH_COUNTS: &str = "searchCounts";
pub const KEY_DAILY_GOAL: &str = "dailyGoal";
pub const KEY_MISSED_WORDS: &str = "missedWords";

/// Definition given to legacy records that carry none.
pub const SAVED_PLACEHOLDER: &str = "Saved to wordbook";

/// A full snapshot of the persisted state.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub wordbook: Vec<Entry>,
    pub search_counts: BTreeMap<String, u32>,
    pub daily_goal: Option<DailyGoal>,
    pub missed_words: BTreeSet<String>,
}

impl Snapshot {
    /// As a JSON object keyed by the snapshot keys.
    pub fn to_map(&self) -> Fallible<Map<String, Value>> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            _ => fail("snapshot did not serialize to an object."),
        }
    }
}

/// Whatever fields a storage channel actually had. `None` means the field was
/// absent or unreadable.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PartialSnapshot {
    pub wordbook: Option<Vec<Entry>>,
    pub search_counts: Option<BTreeMap<String, u32>>,
    pub daily_goal: Option<DailyGoal>,
    pub missed_words: Option<BTreeSet<String>>,
}

impl PartialSnapshot {
    /// Read a snapshot object leniently, one field at a time.
    pub fn from_map(map: &Map<String, Value>, now: Timestamp) -> Self {
        Self {
            wordbook: map
                .get(KEY_WORDBOOK)
                .and_then(Value::as_array)
                .map(|items| normalize_entries(items, now)),
            search_counts: map.get(KEY_SEARCH_COUNTS).and_then(normalize_counts),
            daily_goal: map
                .get(KEY_DAILY_GOAL)
                .filter(|v| !v.is_null())
                .and_then(|v| match serde_json::from_value::<DailyGoal>(v.clone()) {
                    Ok(goal) => Some(goal.normalized()),
                    Err(e) => {
                        log::warn!("Ignoring unreadable daily goal: {e}");
                        None
                    }
                }),
            missed_words: map.get(KEY_MISSED_WORDS).and_then(normalize_words),
        }
    }

    /// Field by field, take ours if present, else the fallback's.
    pub fn or(self, fallback: PartialSnapshot) -> PartialSnapshot {
        PartialSnapshot {
            wordbook: self.wordbook.or(fallback.wordbook),
            search_counts: self.search_counts.or(fallback.search_counts),
            daily_goal: self.daily_goal.or(fallback.daily_goal),
            missed_words: self.missed_words.or(fallback.missed_words),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.wordbook.is_none()
            && self.search_counts.is_none()
            && self.daily_goal.is_none()
            && self.missed_words.is_none()
    }
}

fn as_u32(value: Option<&Value>) -> u32 {
    match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .map(|n| n.min(u32::MAX as u64) as u32)
            .unwrap_or(0),
        _ => 0,
    }
}

fn as_timestamp(value: Option<&Value>) -> Option<Timestamp> {
    let millis = match value? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?,
        _ => return None,
    };
    (millis > 0).then(|| Timestamp::from_millis(millis))
}

fn as_text(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::to_string)
        .filter(|s| !s.trim().is_empty())
}

/// Default missing counters to zero and clamp them into a consistent state.
pub fn normalize_stats(value: Option<&Value>) -> Stats {
    let Some(Value::Object(obj)) = value else {
        return Stats::default();
    };
    Stats {
        tests: as_u32(obj.get("tests")),
        correct: as_u32(obj.get("correct")),
        streak: as_u32(obj.get("streak")),
        last_tested: as_timestamp(obj.get("lastTested")),
        next_review: as_timestamp(obj.get("nextReview")),
    }
    .clamped()
}

fn normalize_tags(value: Option<&Value>) -> BTreeSet<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(normalize)
                .filter(|t| !t.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn record_word(obj: &Map<String, Value>) -> Option<String> {
    let word = as_text(obj.get("word")).or_else(|| as_text(obj.get("term")))?;
    Some(normalize(&word)).filter(|w| !w.is_empty())
}

/// Turn a loosely-typed record into a canonical entry. Records without a word
/// are dropped.
pub fn normalize_entry(value: &Value, now: Timestamp) -> Option<Entry> {
    let obj = value.as_object()?;
    let word = record_word(obj)?;
    let definition = as_text(obj.get("definition"))
        .or_else(|| as_text(obj.get("translated")))
        .unwrap_or_else(|| SAVED_PLACEHOLDER.to_string());
    Some(Entry {
        word,
        definition: clean_definition(&definition),
        phonetic: as_text(obj.get("phonetic")),
        added_at: as_timestamp(obj.get("addedAt")).unwrap_or(now),
        source: obj
            .get("source")
            .and_then(Value::as_str)
            .and_then(Source::parse_lenient)
            .unwrap_or(Source::AutoLookup),
        note: obj
            .get("note")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        tags: normalize_tags(obj.get("tags")),
        stats: normalize_stats(obj.get("stats")),
    })
}

/// Normalize a list of records. Later duplicates of a key are dropped.
pub fn normalize_entries(items: &[Value], now: Timestamp) -> Vec<Entry> {
    let mut seen: BTreeSet<String> = BTreeSet::new();
    let mut entries = Vec::with_capacity(items.len());
    for item in items {
        match normalize_entry(item, now) {
            Some(entry) => {
                if seen.insert(entry.word.clone()) {
                    entries.push(entry);
                } else {
                    log::debug!("Dropping duplicate record for '{}'", entry.word);
                }
            }
            None => log::debug!("Dropping record without a word"),
        }
    }
    entries
}

fn normalize_counts(value: &Value) -> Option<BTreeMap<String, u32>> {
    let obj = value.as_object()?;
    let mut counts: BTreeMap<String, u32> = BTreeMap::new();
    for (query, count) in obj {
        let key = normalize(query);
        if key.is_empty() {
            continue;
        }
        let count = as_u32(Some(count));
        let slot = counts.entry(key).or_insert(0);
        *slot = (*slot).max(count);
    }
    Some(counts)
}

fn normalize_words(value: &Value) -> Option<BTreeSet<String>> {
    let items = value.as_array()?;
    Some(
        items
            .iter()
            .filter_map(Value::as_str)
            .map(normalize)
            .filter(|w| !w.is_empty())
            .collect(),
    )
}

/// Parse an import file. Anything but a JSON array is rejected.
pub fn parse_import(json: &str) -> Fallible<Vec<Value>> {
    match serde_json::from_str::<Value>(json)? {
        Value::Array(items) => Ok(items),
        _ => fail("import file must contain a JSON array of entries."),
    }
}

/// Counts from merging an import into the wordbook.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub inserted: usize,
    pub updated: usize,
    pub skipped: usize,
}

/// Overwrite the fields the record actually carries onto an existing entry.
/// The key and `addedAt` are never overwritten.
fn overwrite_present_fields(entry: &mut Entry, obj: &Map<String, Value>) {
    if let Some(definition) = obj
        .get("definition")
        .or_else(|| obj.get("translated"))
        .and_then(Value::as_str)
    {
        entry.definition = clean_definition(definition);
    }
    if let Some(phonetic) = obj.get("phonetic").and_then(Value::as_str) {
        entry.phonetic = Some(phonetic.to_string()).filter(|p| !p.trim().is_empty());
    }
    if let Some(source) = obj
        .get("source")
        .and_then(Value::as_str)
        .and_then(Source::parse_lenient)
    {
        entry.source = source;
    }
    if let Some(note) = obj.get("note").and_then(Value::as_str) {
        entry.note = note.to_string();
    }
    if obj.contains_key("tags") {
        entry.tags = normalize_tags(obj.get("tags"));
    }
    if obj.contains_key("stats") {
        entry.stats = normalize_stats(obj.get("stats"));
    }
}

/// Merge imported records into the wordbook by key. Existing entries get a
/// shallow overwrite of the fields the record carries; new keys are
/// normalized and inserted.
pub fn merge_import(book: &mut Wordbook, items: &[Value], now: Timestamp) -> ImportReport {
    let mut report = ImportReport::default();
    for item in items {
        let Some(obj) = item.as_object() else {
            report.skipped += 1;
            continue;
        };
        let Some(word) = record_word(obj) else {
            report.skipped += 1;
            continue;
        };
        match book.get_mut(&word) {
            Some(existing) => {
                overwrite_present_fields(existing, obj);
                report.updated += 1;
            }
            None => match normalize_entry(item, now) {
                Some(entry) => {
                    book.insert(entry);
                    report.inserted += 1;
                }
                None => report.skipped += 1,
            },
        }
    }
    report
}

/// Serialize the wordbook as a JSON array, oldest entry first.
pub fn export_json(book: &Wordbook) -> Fallible<String> {
    let mut entries: Vec<&Entry> = book.iter().collect();
    entries.sort_by(|a, b| a.added_at.cmp(&b.added_at).then_with(|| a.word.cmp(&b.word)));
    Ok(serde_json::to_string_pretty(&entries)?)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use serde_json::json;

    use super::*;
    use crate::goal::MIN_TARGET;
    use crate::types::date::Date;

    fn now() -> Timestamp {
        Timestamp::from_millis(1_700_000_000_000)
    }

    #[test]
    fn test_legacy_record_defaults() {
        let entry = normalize_entry(&json!({"term": "  Cat "}), now()).unwrap();
        assert_eq!(entry.word, "cat");
        assert_eq!(entry.definition, SAVED_PLACEHOLDER);
        assert_eq!(entry.source, Source::AutoLookup);
        assert_eq!(entry.added_at, now());
        assert!(entry.tags.is_empty());
        assert_eq!(entry.stats, Stats::default());
        assert!(entry.phonetic.is_none());
    }

    #[test]
    fn test_legacy_record_fields() {
        let record = json!({
            "word": "dog",
            "translated": "狗",
            "phonetic": "/dɒɡ/",
            "addedAt": 5,
            "source": "批量导入",
            "note": "woof",
            "tags": ["Pets", "pets", ""],
            "stats": {"tests": 2, "correct": 7, "streak": 1, "lastTested": 9.0}
        });
        let entry = normalize_entry(&record, now()).unwrap();
        assert_eq!(entry.definition, "狗");
        assert_eq!(entry.added_at, Timestamp::from_millis(5));
        assert_eq!(entry.source, Source::BatchImport);
        assert_eq!(entry.tags.len(), 1);
        assert_eq!(entry.stats.correct, 2);
        assert_eq!(entry.stats.last_tested, Some(Timestamp::from_millis(9)));
        assert_eq!(entry.stats.next_review, None);
    }

    #[test]
    fn test_records_without_word_are_dropped() {
        assert!(normalize_entry(&json!({"definition": "orphan"}), now()).is_none());
        assert!(normalize_entry(&json!("cat"), now()).is_none());
        let entries = normalize_entries(
            &[json!({"word": "a1"}), json!({"word": "A1 "}), json!(42)],
            now(),
        );
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_parse_import_requires_array() {
        assert!(parse_import(r#"{"word": "cat"}"#).is_err());
        assert!(parse_import("not json").is_err());
        assert_eq!(parse_import("[]").unwrap().len(), 0);
    }

    #[test]
    fn test_import_merge_overwrites_present_fields_only() {
        let mut book = Wordbook::new();
        let mut cat = Entry::new("cat", Source::Manual, Timestamp::from_millis(1));
        cat.definition = "OLD".to_string();
        cat.note = "keep me".to_string();
        cat.stats.tests = 5;
        cat.stats.correct = 4;
        book.insert(cat);

        let items = parse_import(r#"[{"word": "cat", "definition": "NEW", "addedAt": 999}]"#).unwrap();
        let report = merge_import(&mut book, &items, now());
        assert_eq!(report.updated, 1);
        let cat = book.get("cat").unwrap();
        assert_eq!(cat.definition, "NEW");
        assert_eq!(cat.note, "keep me");
        assert_eq!(cat.stats.tests, 5);
        assert_eq!(cat.added_at, Timestamp::from_millis(1));
    }

    #[test]
    fn test_import_merge_replaces_stats_when_supplied() {
        let mut book = Wordbook::new();
        let mut cat = Entry::new("cat", Source::Manual, Timestamp::from_millis(1));
        cat.stats.tests = 5;
        cat.stats.streak = 3;
        book.insert(cat);
        let items = vec![json!({"word": "CAT", "stats": {"tests": 1}})];
        merge_import(&mut book, &items, now());
        let stats = book.get("cat").unwrap().stats;
        assert_eq!(stats.tests, 1);
        assert_eq!(stats.streak, 0);
    }

    #[test]
    fn test_import_merge_inserts_and_skips() {
        let mut book = Wordbook::new();
        let items = vec![json!({"word": "owl"}), json!({"note": "no word"}), json!(null)];
        let report = merge_import(&mut book, &items, now());
        assert_eq!(
            report,
            ImportReport {
                inserted: 1,
                updated: 0,
                skipped: 2
            }
        );
        assert_eq!(book.get("owl").unwrap().source, Source::AutoLookup);
    }

    #[test]
    fn test_export_then_import_preserves_entries() -> Fallible<()> {
        let mut book = Wordbook::new();
        let mut owl = Entry::new("owl", Source::BatchImport, Timestamp::from_millis(3));
        owl.definition = "a nocturnal bird".to_string();
        owl.tags.insert("birds".to_string());
        owl.stats.tests = 2;
        owl.stats.correct = 1;
        owl.stats.next_review = Some(Timestamp::from_millis(77));
        book.insert(owl);
        let json = export_json(&book)?;
        let mut restored = Wordbook::new();
        merge_import(&mut restored, &parse_import(&json)?, now());
        assert_eq!(restored, book);
        Ok(())
    }

    #[test]
    fn test_partial_snapshot_precedence() -> Fallible<()> {
        let goal = DailyGoal::new(20, Date::new(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()));
        let durable = json!({
            "wordbook": [{"word": "new"}],
            "dailyGoal": goal,
        });
        let local = json!({
            "wordbook": [{"word": "stale"}],
            "searchCounts": {" Cat": 2, "cat": 4},
            "missedWords": ["Cat"],
            "dailyGoal": "garbage",
        });
        let durable = PartialSnapshot::from_map(durable.as_object().unwrap(), now());
        let local = PartialSnapshot::from_map(local.as_object().unwrap(), now());
        assert!(local.daily_goal.is_none());
        let merged = durable.or(local);
        assert_eq!(merged.wordbook.unwrap()[0].word, "new");
        assert_eq!(merged.search_counts.unwrap().get("cat"), Some(&4));
        assert_eq!(merged.daily_goal, Some(goal));
        assert!(merged.missed_words.unwrap().contains("cat"));
        Ok(())
    }

    #[test]
    fn test_stored_goal_is_brought_into_range() {
        let today = Date::new(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        let map = json!({"dailyGoal": {"target": 0, "completed": 7, "date": "2024-06-01"}});
        let mut goal = PartialSnapshot::from_map(map.as_object().unwrap(), now())
            .daily_goal
            .unwrap();
        assert_eq!(goal.target, MIN_TARGET);
        assert_eq!(goal.completed, MIN_TARGET);

        let map = json!({"dailyGoal": {"target": 20, "completed": 90, "date": "2024-05-31"}});
        let stored = PartialSnapshot::from_map(map.as_object().unwrap(), now());
        assert_eq!(stored.daily_goal.map(|g| (g.target, g.completed)), Some((20, 20)));

        assert!(goal.is_met());
        goal.reset(today);
        assert!(!goal.is_met());
        goal.increment(1, today);
        assert_eq!(goal.completed, 1);
    }

    #[test]
    fn test_snapshot_map_keys() -> Fallible<()> {
        let map = Snapshot::default().to_map()?;
        for key in [KEY_WORDBOOK, KEY_SEARCH_COUNTS, KEY_DAILY_GOAL, KEY_MISSED_WORDS] {
            assert!(map.contains_key(key), "missing {key}");
        }
        let round = PartialSnapshot::from_map(&map, now());
        assert_eq!(round.wordbook, Some(Vec::new()));
        assert_eq!(round.daily_goal, None);
        Ok(())
    }
}
