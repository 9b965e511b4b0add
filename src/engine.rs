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

//! The controller that owns the engine state and sequences lookups,
//! mutations and persistence.

use std::sync::Arc;
use std::time::Duration;

use lumen_core::DailyGoal;
use lumen_core::Date;
use lumen_core::DefinitionPayload;
use lumen_core::Entry;
use lumen_core::EngineState;
use lumen_core::EntryPatch;
use lumen_core::FlashcardQueue;
use lumen_core::LookupCache;
use lumen_core::QuizSession;
use lumen_core::RareWord;
use lumen_core::Source;
use lumen_core::Stats;
use lumen_core::Timestamp;
use lumen_core::TinyRng;
use lumen_core::lookup::is_sentence;
use lumen_core::normalize;
use lumen_core::quiz::AnswerResult;
use lumen_core::snapshot::ImportReport;
use lumen_core::snapshot::export_json;
use lumen_core::snapshot::parse_import;
use lumen_core::state::HOT_SEARCH_THRESHOLD;
use lumen_core::wordbook::parse_batch_words;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::Fallible;
use crate::error::fail;
use crate::lookup::LookupProvider;
use crate::lookup::query::Lookup;
use crate::lookup::request::CancelReason;
use crate::lookup::request::RequestError;
use crate::persist::Persistence;

/// Definition stored for a batch-imported word the dictionary didn't know.
pub const PENDING_DEFINITION: &str = "definition pending";

/// Shown when a word lookup comes back empty.
pub const NO_DEFINITIONS: &str = "No definitions found.";

/// What a primary query produced.
#[derive(Clone, Debug, PartialEq)]
pub enum QueryResult {
    Word {
        word: String,
        payload: DefinitionPayload,
    },
    Sentence {
        sentence: String,
        translation: String,
        rare_words: Vec<RareWord>,
    },
}

/// A primary query that has been issued but not yet run. It owns everything
/// the lookup needs, so the engine stays free while it is in flight.
pub struct PendingQuery<P> {
    generation: u64,
    query: String,
    auto_save: bool,
    signal: CancellationToken,
    provider: Arc<P>,
    cache: Arc<LookupCache>,
    timeout: Duration,
}

/// A finished primary query, waiting to be committed.
#[derive(Debug)]
pub struct QueryOutcome {
    generation: u64,
    query: String,
    auto_save: bool,
    result: Result<QueryResult, RequestError>,
}

/// What committing an outcome did.
#[derive(Clone, Debug, PartialEq)]
pub enum Committed {
    /// The result is now the displayed one.
    Shown {
        saved: bool,
        notice: Option<&'static str>,
    },
    /// Cancelled or superseded. Nothing changed.
    Discarded,
    /// The lookup failed. Nothing changed.
    Failed(String),
}

/// Counts from a batch import.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub total: usize,
    pub processed: usize,
    pub imported: usize,
    pub failed: usize,
}

impl<P: LookupProvider> PendingQuery<P> {
    pub fn query(&self) -> &str {
        &self.query
    }

    /// The token that cancels this query.
    pub fn signal(&self) -> CancellationToken {
        self.signal.clone()
    }

    pub async fn run(self) -> QueryOutcome {
        let lookup = Lookup {
            provider: self.provider.as_ref(),
            cache: self.cache.as_ref(),
            signal: &self.signal,
            timeout: self.timeout,
        };
        let result = if is_sentence(&self.query) {
            sentence_flow(&lookup, &self.query).await
        } else {
            word_flow(&lookup, &self.query).await
        };
        QueryOutcome {
            generation: self.generation,
            query: self.query,
            auto_save: self.auto_save,
            result,
        }
    }
}

async fn word_flow<P: LookupProvider>(
    lookup: &Lookup<'_, P>,
    query: &str,
) -> Result<QueryResult, RequestError> {
    let word = normalize(query);
    let payload = lookup.definition(&word).await?;
    Ok(QueryResult::Word { word, payload })
}

async fn sentence_flow<P: LookupProvider>(
    lookup: &Lookup<'_, P>,
    query: &str,
) -> Result<QueryResult, RequestError> {
    let translation = lookup.translation(query).await?;
    let rare_words = lookup.rare_words(query).await?;
    Ok(QueryResult::Sentence {
        sentence: query.to_string(),
        translation,
        rare_words,
    })
}

pub struct Engine<P> {
    state: EngineState,
    provider: Arc<P>,
    cache: Arc<LookupCache>,
    persistence: Persistence,
    timeout: Duration,
    /// Bumped for every primary query. Only an outcome carrying the current
    /// value may be committed.
    generation: u64,
    current: Option<CancellationToken>,
    displayed: Option<QueryResult>,
    dirty: bool,
}

impl<P: LookupProvider> Engine<P> {
    pub fn new(
        state: EngineState,
        provider: P,
        persistence: Persistence,
        timeout: Duration,
    ) -> Self {
        Self {
            state,
            provider: Arc::new(provider),
            cache: Arc::new(LookupCache::new()),
            persistence,
            timeout,
            generation: 0,
            current: None,
            displayed: None,
            dirty: false,
        }
    }

    /// Rehydrate state from storage.
    pub async fn load(provider: P, persistence: Persistence, config: &Config) -> Self {
        let partial = persistence.hydrate(Timestamp::now()).await;
        if partial.is_empty() {
            log::info!("No saved state found, starting fresh.");
        }
        let state = EngineState::from_partial(partial, config.daily_target, Date::today());
        Self::new(state, provider, persistence, config.request_timeout())
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn cache(&self) -> &LookupCache {
        &self.cache
    }

    /// The result of the last committed primary query.
    pub fn displayed(&self) -> Option<&QueryResult> {
        self.displayed.as_ref()
    }

    /// Count the search, cancel any primary query still in flight, and
    /// prepare the new one.
    pub fn begin_query(&mut self, text: &str) -> Fallible<PendingQuery<P>> {
        let query = text.trim().to_string();
        if query.is_empty() {
            return fail("enter a word or sentence.");
        }
        let count = self.state.record_search(&query);
        self.dirty = true;
        if let Some(previous) = self.current.take() {
            log::debug!("Query {} superseded.", self.generation);
            previous.cancel();
        }
        self.generation += 1;
        let signal = CancellationToken::new();
        self.current = Some(signal.clone());
        Ok(PendingQuery {
            generation: self.generation,
            query,
            auto_save: count >= HOT_SEARCH_THRESHOLD,
            signal,
            provider: Arc::clone(&self.provider),
            cache: Arc::clone(&self.cache),
            timeout: self.timeout,
        })
    }

    /// Apply a finished query, unless a newer one has started since or it
    /// was cancelled.
    pub fn commit(&mut self, outcome: QueryOutcome, now: Timestamp) -> Committed {
        if outcome.generation != self.generation {
            log::debug!("Discarding stale result for {:?}.", outcome.query);
            return Committed::Discarded;
        }
        self.current = None;
        let result = match outcome.result {
            Ok(result) => result,
            Err(RequestError::Cancelled(reason)) => {
                log::debug!("Query {:?} cancelled ({reason:?}).", outcome.query);
                return Committed::Discarded;
            }
            Err(RequestError::Failed(message)) => {
                log::warn!("Query {:?} failed: {message}", outcome.query);
                return Committed::Failed(message);
            }
        };
        let mut saved = false;
        let mut notice = None;
        match &result {
            QueryResult::Word { word, payload } => {
                if payload.is_empty() {
                    notice = Some(NO_DEFINITIONS);
                } else if outcome.auto_save && !payload.primary_definition.is_empty() {
                    let patch = EntryPatch {
                        definition: Some(payload.primary_definition.clone()),
                        phonetic: payload.phonetic(),
                        source: Some(Source::AutoLookup),
                        note: None,
                    };
                    saved = self.state.save_entry(word, patch, now).is_some();
                }
            }
            QueryResult::Sentence {
                sentence,
                translation,
                ..
            } => {
                if outcome.auto_save {
                    let patch = EntryPatch {
                        definition: Some(translation.clone()),
                        source: Some(Source::SentenceCapture),
                        ..EntryPatch::default()
                    };
                    saved = self.state.save_entry(sentence, patch, now).is_some();
                }
            }
        }
        if saved {
            log::info!("Saved {:?} after repeated searches.", outcome.query);
            self.dirty = true;
        }
        self.displayed = Some(result);
        Committed::Shown { saved, notice }
    }

    /// Look up and save every word of a free-form list, one at a time.
    /// Failures are counted and skipped; firing `signal` stops the batch.
    pub async fn batch_import(
        &mut self,
        input: &str,
        signal: &CancellationToken,
        now: Timestamp,
        mut on_item: impl FnMut(&str, &BatchReport),
    ) -> Fallible<BatchReport> {
        let words = parse_batch_words(input);
        if words.is_empty() {
            return fail("enter words to import.");
        }
        let provider = Arc::clone(&self.provider);
        let cache = Arc::clone(&self.cache);
        let lookup = Lookup {
            provider: provider.as_ref(),
            cache: cache.as_ref(),
            signal,
            timeout: self.timeout,
        };
        let mut report = BatchReport {
            total: words.len(),
            ..BatchReport::default()
        };
        for word in &words {
            match lookup.definition(word).await {
                Ok(payload) => {
                    let definition = if payload.primary_definition.is_empty() {
                        PENDING_DEFINITION.to_string()
                    } else {
                        payload.primary_definition.clone()
                    };
                    let patch = EntryPatch {
                        definition: Some(definition),
                        phonetic: payload.phonetic(),
                        source: Some(Source::BatchImport),
                        note: None,
                    };
                    self.state.save_entry(word, patch, now);
                    self.dirty = true;
                    report.imported += 1;
                }
                Err(RequestError::Cancelled(CancelReason::Signal)) => {
                    log::info!("Batch import interrupted after {} words.", report.processed);
                    break;
                }
                Err(e) => {
                    log::warn!("Skipping {word:?}: {e}");
                    report.failed += 1;
                }
            }
            report.processed += 1;
            on_item(word, &report);
            self.flush().await;
        }
        Ok(report)
    }

    /// Save a word by hand.
    pub fn add(&mut self, word: &str, patch: EntryPatch, now: Timestamp) -> Fallible<Entry> {
        let patch = EntryPatch {
            source: patch.source.or(Some(Source::Manual)),
            ..patch
        };
        match self.state.save_entry(word, patch, now) {
            Some(entry) => {
                self.dirty = true;
                Ok(entry.clone())
            }
            None => fail("enter a word."),
        }
    }

    pub fn toggle_tag(&mut self, word: &str, tag: &str) -> Fallible<bool> {
        let set = self.state.toggle_tag(word, tag)?;
        self.dirty = true;
        Ok(set)
    }

    /// Merge a JSON export into the wordbook. Rejected input changes nothing.
    pub fn import_json(&mut self, json: &str, now: Timestamp) -> Fallible<ImportReport> {
        let items = parse_import(json)?;
        let report = self.state.import(&items, now);
        if report.inserted + report.updated > 0 {
            self.dirty = true;
        }
        Ok(report)
    }

    pub fn export_json(&self) -> Fallible<String> {
        export_json(&self.state.wordbook)
    }

    pub fn start_quiz(&self, missed: bool, rng: &mut TinyRng) -> Fallible<QuizSession> {
        if missed {
            self.state.start_missed_quiz(rng)
        } else {
            self.state.start_quiz(rng)
        }
    }

    pub fn answer_quiz(
        &mut self,
        session: &mut QuizSession,
        option: &str,
        now: Timestamp,
        today: Date,
    ) -> Fallible<Option<(AnswerResult, Stats)>> {
        let answered = self.state.answer_quiz(session, option, now, today)?;
        if answered.is_some() {
            self.dirty = true;
        }
        Ok(answered)
    }

    pub fn build_flashcards(&self, rng: &mut TinyRng) -> FlashcardQueue {
        self.state.build_flashcards(rng)
    }

    /// A flashcard was reviewed: it counts toward the daily goal.
    pub fn review_flashcard(&mut self, today: Date) {
        self.state.record_flashcard_review(today);
        self.dirty = true;
    }

    /// The goal as it stands today, with any rollover applied.
    pub fn goal(&self, today: Date) -> DailyGoal {
        self.state.daily_goal.for_day(today)
    }

    pub fn reset_goal(&mut self, today: Date) {
        self.state.reset_goal(today);
        self.dirty = true;
    }

    pub fn raise_goal_target(&mut self) {
        self.state.raise_goal_target();
        self.dirty = true;
    }

    pub fn lower_goal_target(&mut self) {
        self.state.lower_goal_target();
        self.dirty = true;
    }

    /// Write the snapshot out if anything changed since the last flush.
    pub async fn flush(&mut self) {
        if !self.dirty {
            return;
        }
        self.persistence.flush(&self.state.snapshot()).await;
        self.dirty = false;
    }
}
