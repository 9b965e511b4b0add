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

//! lumen-core: the vocabulary review engine.
//!
//! Everything here is free of I/O:
//! - the wordbook of learned entries and its merge rules
//! - streak-based spaced repetition
//! - quiz and flashcard builders
//! - the daily goal counter
//! - the lookup cache and dictionary payload types
//! - snapshot normalization, import and export

pub mod cache;
pub mod error;
pub mod flashcards;
pub mod goal;
pub mod lookup;
pub mod quiz;
pub mod rng;
pub mod scheduler;
pub mod snapshot;
pub mod state;
pub mod types;
pub mod wordbook;

// Re-exports for convenience
pub use cache::LookupCache;
pub use error::{ErrorReport, Fallible, fail};
pub use flashcards::FlashcardQueue;
pub use goal::DailyGoal;
pub use lookup::{DefinitionPayload, DictionaryEntry, RareWord};
pub use quiz::{Question, QuizSession};
pub use rng::TinyRng;
pub use scheduler::Outcome;
pub use snapshot::{PartialSnapshot, Snapshot};
pub use state::EngineState;
pub use types::date::Date;
pub use types::entry::{Entry, Source, Stats, normalize};
pub use types::timestamp::Timestamp;
pub use wordbook::{EntryFilter, EntryPatch, Wordbook};
