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

//! Flashcard review queue.
//!
//! Entries are ranked by streak and then by next review time, but the ranked
//! list is shuffled before it is cut down to the queue size. The ranking only
//! biases *which* entries make it into the queue; their order within the
//! queue is random.

use crate::rng::TinyRng;
use crate::rng::shuffle;
use crate::types::entry::Entry;
use crate::wordbook::Wordbook;

/// Maximum number of cards in a queue.
pub const QUEUE_SIZE: usize = 14;

/// A cyclic deck of flashcards with a reveal toggle. Revealing and advancing
/// never touch review statistics.
#[derive(Clone, Debug, PartialEq)]
pub struct FlashcardQueue {
    cards: Vec<Entry>,
    index: usize,
    revealed: bool,
}

/// Rank entries for review: lowest streak first, then earliest next review,
/// never-scheduled entries ahead of scheduled ones.
pub fn rank_for_review(book: &Wordbook) -> Vec<&Entry> {
    let mut ranked: Vec<&Entry> = book.iter().collect();
    ranked.sort_by_key(|e| {
        (
            e.stats.streak,
            e.stats.next_review.map(|t| t.millis()).unwrap_or(0),
        )
    });
    ranked
}

impl FlashcardQueue {
    pub fn build(book: &Wordbook, rng: &mut TinyRng) -> Self {
        let ranked = rank_for_review(book);
        let cards: Vec<Entry> = shuffle(ranked, rng)
            .into_iter()
            .take(QUEUE_SIZE)
            .cloned()
            .collect();
        Self {
            cards,
            index: 0,
            revealed: false,
        }
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    pub fn current(&self) -> Option<&Entry> {
        self.cards.get(self.index)
    }

    pub fn cards(&self) -> &[Entry] {
        &self.cards
    }

    /// Flip the current card.
    pub fn toggle_reveal(&mut self) {
        self.revealed = !self.revealed;
    }

    /// Move to the next card, wrapping around at the end. The new card
    /// starts hidden.
    pub fn advance(&mut self) {
        if self.cards.is_empty() {
            return;
        }
        self.index = (self.index + 1) % self.cards.len();
        self.revealed = false;
    }
}
