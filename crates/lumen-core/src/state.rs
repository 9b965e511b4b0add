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

//! The engine's tracked state and every mutation on it. Nothing here touches
//! the clock, the network or the disk: time and randomness are passed in, so
//! each transition is deterministic.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde_json::Value;

use crate::error::Fallible;
use crate::error::fail;
use crate::flashcards::FlashcardQueue;
use crate::goal::DailyGoal;
use crate::quiz::AnswerResult;
use crate::quiz::QuizSession;
use crate::rng::TinyRng;
use crate::scheduler::Outcome;
use crate::snapshot::ImportReport;
use crate::snapshot::PartialSnapshot;
use crate::snapshot::Snapshot;
use crate::snapshot::merge_import;
use crate::types::date::Date;
use crate::types::entry::Entry;
use crate::types::entry::Stats;
use crate::types::entry::normalize;
use crate::types::timestamp::Timestamp;
use crate::wordbook::EntryPatch;
use crate::wordbook::Wordbook;

/// A query searched this many times is saved automatically.
pub const HOT_SEARCH_THRESHOLD: u32 = 3;

#[derive(Clone, Debug, PartialEq)]
pub struct EngineState {
    pub wordbook: Wordbook,
    /// Normalized query to number of times searched. Counts only grow.
    pub search_counts: BTreeMap<String, u32>,
    pub daily_goal: DailyGoal,
    /// Words whose most recent quiz answer was wrong.
    pub missed_words: BTreeSet<String>,
}

impl EngineState {
    pub fn new(daily_target: u32, today: Date) -> Self {
        Self {
            wordbook: Wordbook::new(),
            search_counts: BTreeMap::new(),
            daily_goal: DailyGoal::new(daily_target, today),
            missed_words: BTreeSet::new(),
        }
    }

    /// Build state from whatever storage produced, defaulting absent fields.
    pub fn from_partial(partial: PartialSnapshot, daily_target: u32, today: Date) -> Self {
        let mut state = Self::new(daily_target, today);
        for entry in partial.wordbook.unwrap_or_default() {
            state.wordbook.insert(entry);
        }
        state.search_counts = partial.search_counts.unwrap_or_default();
        if let Some(goal) = partial.daily_goal {
            state.daily_goal = goal;
        }
        state.missed_words = partial.missed_words.unwrap_or_default();
        state
    }

    pub fn snapshot(&self) -> Snapshot {
        let mut wordbook: Vec<Entry> = self.wordbook.iter().cloned().collect();
        wordbook.sort_by(|a, b| a.added_at.cmp(&b.added_at).then_with(|| a.word.cmp(&b.word)));
        Snapshot {
            wordbook,
            search_counts: self.search_counts.clone(),
            daily_goal: Some(self.daily_goal),
            missed_words: self.missed_words.clone(),
        }
    }

    /// Count one more search for `query`. Returns the new count.
    pub fn record_search(&mut self, query: &str) -> u32 {
        let key = normalize(query);
        if key.is_empty() {
            return 0;
        }
        let count = self.search_counts.entry(key).or_insert(0);
        *count = count.saturating_add(1);
        *count
    }

    pub fn search_count(&self, query: &str) -> u32 {
        self.search_counts.get(&normalize(query)).copied().unwrap_or(0)
    }

    /// Whether the query has been searched often enough to auto-save.
    pub fn is_hot(&self, query: &str) -> bool {
        self.search_count(query) >= HOT_SEARCH_THRESHOLD
    }

    pub fn save_entry(&mut self, word: &str, patch: EntryPatch, now: Timestamp) -> Option<&Entry> {
        self.wordbook.upsert(word, patch, now)
    }

    pub fn toggle_tag(&mut self, word: &str, tag: &str) -> Fallible<bool> {
        self.wordbook.toggle_tag(word, tag)
    }

    pub fn start_quiz(&self, rng: &mut TinyRng) -> Fallible<QuizSession> {
        QuizSession::start(&self.wordbook, rng)
    }

    pub fn start_missed_quiz(&self, rng: &mut TinyRng) -> Fallible<QuizSession> {
        QuizSession::start_missed(&self.wordbook, &self.missed_words, rng)
    }

    pub fn build_flashcards(&self, rng: &mut TinyRng) -> FlashcardQueue {
        FlashcardQueue::build(&self.wordbook, rng)
    }

    /// Answer the session's current question and apply the consequences:
    /// scheduler update, missed-word membership, daily goal. Returns `None`
    /// when the session is already finished.
    pub fn answer_quiz(
        &mut self,
        session: &mut QuizSession,
        option: &str,
        now: Timestamp,
        today: Date,
    ) -> Fallible<Option<(AnswerResult, Stats)>> {
        if let Some(question) = session.current_question() {
            if !self.wordbook.contains(&question.word) {
                return fail(format!("'{}' is not in the wordbook.", normalize(&question.word)));
            }
        }
        let Some(result) = session.answer(option) else {
            return Ok(None);
        };
        let stats = self.wordbook.record_answer(&result.word, result.outcome, now)?;
        match result.outcome {
            Outcome::Correct => {
                self.missed_words.remove(&result.word);
            }
            Outcome::Incorrect => {
                self.missed_words.insert(result.word.clone());
            }
        }
        self.daily_goal.increment(1, today);
        Ok(Some((result, stats)))
    }

    /// A flashcard was looked at and put away.
    pub fn record_flashcard_review(&mut self, today: Date) {
        self.daily_goal.increment(1, today);
    }

    pub fn reset_goal(&mut self, today: Date) {
        self.daily_goal.reset(today);
    }

    pub fn raise_goal_target(&mut self) {
        self.daily_goal.raise_target();
    }

    pub fn lower_goal_target(&mut self) {
        self.daily_goal.lower_target();
    }

    pub fn import(&mut self, items: &[Value], now: Timestamp) -> ImportReport {
        merge_import(&mut self.wordbook, items, now)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::goal::DEFAULT_TARGET;
    use crate::snapshot::parse_import;

    fn today() -> Date {
        Date::new(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
    }

    fn now() -> Timestamp {
        Timestamp::from_millis(1_717_200_000_000)
    }

    fn state_with_five() -> EngineState {
        let mut state = EngineState::new(DEFAULT_TARGET, today());
        for (word, definition) in [
            ("cat", "a small feline"),
            ("dog", "a loyal canine"),
            ("owl", "a nocturnal bird"),
            ("eel", "a long fish"),
            ("ant", "a tiny insect"),
        ] {
            state.save_entry(
                word,
                EntryPatch {
                    definition: Some(definition.to_string()),
                    ..EntryPatch::default()
                },
                now(),
            );
        }
        state
    }

    #[test]
    fn test_search_counts_grow() {
        let mut state = EngineState::new(DEFAULT_TARGET, today());
        assert_eq!(state.record_search(" Cat"), 1);
        assert!(!state.is_hot("cat"));
        state.record_search("CAT");
        assert_eq!(state.record_search("cat "), 3);
        assert!(state.is_hot("Cat"));
        assert_eq!(state.record_search("   "), 0);
        assert_eq!(state.search_counts.len(), 1);
    }

    #[test]
    fn test_empty_store_quiz_leaves_state_unchanged() {
        let state = EngineState::new(DEFAULT_TARGET, today());
        let before = state.clone();
        assert!(state.start_quiz(&mut TinyRng::from_seed(1)).is_err());
        assert_eq!(state, before);
    }

    #[test]
    fn test_quiz_answers_update_stats_missed_and_goal() -> Fallible<()> {
        let mut state = state_with_five();
        let mut rng = TinyRng::from_seed(17);
        let mut session = state.start_quiz(&mut rng)?;
        let first = session.current_question().unwrap().clone();
        let wrong = first.options.iter().find(|o| **o != first.correct).unwrap().clone();

        let (result, stats) = state.answer_quiz(&mut session, &wrong, now(), today())?.unwrap();
        assert_eq!(result.outcome, Outcome::Incorrect);
        assert_eq!((stats.tests, stats.correct, stats.streak), (1, 0, 0));
        assert!(state.missed_words.contains(&first.word));
        assert_eq!(state.daily_goal.completed, 1);

        let second = session.current_question().unwrap().clone();
        state.answer_quiz(&mut session, &second.correct, now(), today())?;
        assert!(!state.missed_words.contains(&second.word));
        assert_eq!(state.daily_goal.completed, 2);
        assert_eq!(session.score, 1);
        Ok(())
    }

    #[test]
    fn test_missed_then_retake_clears_membership() -> Fallible<()> {
        let mut state = state_with_five();
        state.missed_words.insert("owl".to_string());
        let mut session = state.start_missed_quiz(&mut TinyRng::from_seed(3))?;
        let question = session.current_question().unwrap().clone();
        assert_eq!(question.word, "owl");
        state.answer_quiz(&mut session, &question.correct, now(), today())?;
        assert!(state.missed_words.is_empty());
        assert!(session.finished);
        assert!(state.answer_quiz(&mut session, &question.correct, now(), today())?.is_none());
        assert_eq!(state.wordbook.get("owl").unwrap().stats.tests, 1);
        Ok(())
    }

    #[test]
    fn test_answer_for_removed_word_leaves_session_alone() -> Fallible<()> {
        let mut state = state_with_five();
        state.missed_words.insert("owl".to_string());
        let mut session = state.start_missed_quiz(&mut TinyRng::from_seed(3))?;
        let question = session.current_question().unwrap().clone();
        state.wordbook = Wordbook::new();
        assert!(state.answer_quiz(&mut session, &question.correct, now(), today()).is_err());
        assert_eq!(session.progress(), (0, 1));
        assert_eq!(session.score, 0);
        assert!(!session.finished);
        assert_eq!(state.daily_goal.completed, 0);
        assert!(state.missed_words.contains("owl"));
        Ok(())
    }

    #[test]
    fn test_oversized_imported_counters_saturate() -> Fallible<()> {
        let mut state = state_with_five();
        let items = parse_import(
            r#"[{"word": "cat", "stats": {"tests": 1e12, "correct": 1e12, "streak": 1e12}}]"#,
        )?;
        state.import(&items, now());
        assert_eq!(state.wordbook.get("cat").unwrap().stats.tests, u32::MAX);
        let stats = state.wordbook.record_answer("cat", Outcome::Correct, now())?;
        assert_eq!((stats.tests, stats.correct, stats.streak), (u32::MAX, u32::MAX, u32::MAX));
        let stats = state.wordbook.record_answer("cat", Outcome::Incorrect, now())?;
        assert_eq!((stats.tests, stats.streak), (u32::MAX, 0));
        Ok(())
    }

    #[test]
    fn test_from_partial_defaults() {
        let state = EngineState::from_partial(PartialSnapshot::default(), 25, today());
        assert!(state.wordbook.is_empty());
        assert_eq!(state.daily_goal.target, 25);
        assert_eq!(state.daily_goal.date, today());
    }

    #[test]
    fn test_snapshot_round_trip() -> Fallible<()> {
        let mut state = state_with_five();
        state.record_search("cat");
        state.missed_words.insert("dog".to_string());
        state.toggle_tag("cat", "pets")?;
        let map = state.snapshot().to_map()?;
        let restored =
            EngineState::from_partial(PartialSnapshot::from_map(&map, now()), 5, today());
        assert_eq!(restored, state);
        Ok(())
    }

    #[test]
    fn test_import_into_state() -> Fallible<()> {
        let mut state = state_with_five();
        let items = parse_import(r#"[{"word": "cat", "definition": "NEW"}, {"word": "yak"}]"#)?;
        let report = state.import(&items, now());
        assert_eq!((report.inserted, report.updated), (1, 1));
        assert_eq!(state.wordbook.get("cat").unwrap().definition, "NEW");
        assert_eq!(state.wordbook.len(), 6);
        Ok(())
    }
}
