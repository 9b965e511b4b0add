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

//! Multiple-choice quizzes over the wordbook.

use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;

use crate::error::Fallible;
use crate::error::fail;
use crate::rng::TinyRng;
use crate::rng::shuffle;
use crate::scheduler::Outcome;
use crate::types::entry::Entry;
use crate::types::entry::normalize;
use crate::wordbook::Wordbook;

/// Maximum number of questions in a session.
pub const QUIZ_SIZE: usize = 7;

/// Fewer eligible entries than this and no quiz can be built.
pub const MIN_QUIZ_ENTRIES: usize = 3;

/// Minimum length, in characters, of a cleaned definition for the entry to
/// be quizzable.
pub const MIN_DEFINITION_LEN: usize = 3;

/// Options per question.
pub const OPTION_COUNT: usize = 4;

/// Pads the options when the wordbook has too few distinct definitions.
pub const FILLER_OPTION: &str = "Remember the pronunciation or an example sentence: this one is on you!";

/// Wrong answers used by the missed-word retake.
pub const REMEDIATION_OPTIONS: [&str; 3] = [
    "I don't remember this one yet",
    "A different word with a similar spelling",
    "None of the above",
];

/// Shown to the user when a quiz cannot be built from the wordbook.
pub const NOT_ENOUGH_ENTRIES: &str = "The wordbook needs at least 3 entries with definitions to build a quiz.";

/// Shown to the user when there is nothing to retake.
pub const NOTHING_MISSED: &str = "There are no missed words to retake.";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub word: String,
    pub phonetic: Option<String>,
    /// The entry's cleaned definition.
    pub correct: String,
    /// Exactly [`OPTION_COUNT`] texts, `correct` among them, in random order.
    pub options: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuizMode {
    /// Questions drawn from the whole wordbook.
    Standard,
    /// Questions restricted to words last answered wrong.
    MissedRetake,
}

/// What happened when a question was answered.
#[derive(Clone, Debug, PartialEq)]
pub struct AnswerResult {
    pub word: String,
    pub outcome: Outcome,
    pub correct_answer: String,
}

/// An in-progress quiz. Never persisted.
#[derive(Clone, Debug, PartialEq)]
pub struct QuizSession {
    pub mode: QuizMode,
    pub questions: Vec<Question>,
    pub current: usize,
    pub score: usize,
    pub finished: bool,
}

fn eligible(book: &Wordbook) -> Vec<&Entry> {
    book.iter()
        .filter(|e| e.cleaned_definition().chars().count() >= MIN_DEFINITION_LEN)
        .collect()
}

/// Build the question set for a standard quiz. Empty when fewer than
/// [`MIN_QUIZ_ENTRIES`] entries are eligible.
pub fn build_questions(book: &Wordbook, rng: &mut TinyRng) -> Vec<Question> {
    let candidates = eligible(book);
    if candidates.len() < MIN_QUIZ_ENTRIES {
        return Vec::new();
    }
    let definition_pool: Vec<String> = candidates.iter().map(|e| e.cleaned_definition()).collect();
    let size = QUIZ_SIZE.min(candidates.len());
    let picked: Vec<&Entry> = shuffle(candidates, rng).into_iter().take(size).collect();
    picked
        .into_iter()
        .map(|entry| {
            let correct = entry.cleaned_definition();
            let mut distractors: Vec<String> = Vec::with_capacity(OPTION_COUNT - 1);
            for candidate in shuffle(definition_pool.clone(), rng) {
                if distractors.len() == OPTION_COUNT - 1 {
                    break;
                }
                if candidate != correct && !distractors.contains(&candidate) {
                    distractors.push(candidate);
                }
            }
            while distractors.len() < OPTION_COUNT - 1 {
                distractors.push(FILLER_OPTION.to_string());
            }
            question(entry, correct, distractors, rng)
        })
        .collect()
}

/// Build the question set for a retake of missed words. Options are the
/// correct definition plus the fixed remediation texts.
pub fn build_missed_questions(
    book: &Wordbook,
    missed: &BTreeSet<String>,
    rng: &mut TinyRng,
) -> Vec<Question> {
    let entries: Vec<&Entry> = missed.iter().filter_map(|w| book.get(w)).collect();
    shuffle(entries, rng)
        .into_iter()
        .map(|entry| {
            let correct = entry.cleaned_definition();
            let distractors = REMEDIATION_OPTIONS.iter().map(|s| s.to_string()).collect();
            question(entry, correct, distractors, rng)
        })
        .collect()
}

fn question(entry: &Entry, correct: String, distractors: Vec<String>, rng: &mut TinyRng) -> Question {
    let mut options = Vec::with_capacity(OPTION_COUNT);
    options.push(correct.clone());
    options.extend(distractors);
    Question {
        word: entry.word.clone(),
        phonetic: entry.phonetic.clone(),
        correct,
        options: shuffle(options, rng),
    }
}

impl QuizSession {
    /// Start a standard quiz, or report why one can't be built.
    pub fn start(book: &Wordbook, rng: &mut TinyRng) -> Fallible<Self> {
        let questions = build_questions(book, rng);
        if questions.is_empty() {
            return fail(NOT_ENOUGH_ENTRIES);
        }
        Ok(Self::with_questions(QuizMode::Standard, questions))
    }

    /// Start a retake over the missed words, or report why one can't be
    /// built.
    pub fn start_missed(
        book: &Wordbook,
        missed: &BTreeSet<String>,
        rng: &mut TinyRng,
    ) -> Fallible<Self> {
        let questions = build_missed_questions(book, missed, rng);
        if questions.is_empty() {
            return fail(NOTHING_MISSED);
        }
        Ok(Self::with_questions(QuizMode::MissedRetake, questions))
    }

    fn with_questions(mode: QuizMode, questions: Vec<Question>) -> Self {
        Self {
            mode,
            questions,
            current: 0,
            score: 0,
            finished: false,
        }
    }

    /// The question awaiting an answer.
    pub fn current_question(&self) -> Option<&Question> {
        if self.finished {
            None
        } else {
            self.questions.get(self.current)
        }
    }

    /// Answer the current question with one of its options. Returns `None`
    /// once the session is finished. The caller is responsible for feeding
    /// the outcome to the scheduler.
    pub fn answer(&mut self, option: &str) -> Option<AnswerResult> {
        let question = self.current_question()?;
        let outcome = Outcome::from_correct(option == question.correct);
        let result = AnswerResult {
            word: normalize(&question.word),
            outcome,
            correct_answer: question.correct.clone(),
        };
        if outcome.is_correct() {
            self.score += 1;
        }
        if self.current + 1 >= self.questions.len() {
            self.finished = true;
        } else {
            self.current += 1;
        }
        Some(result)
    }

    /// `(answered, total)`.
    pub fn progress(&self) -> (usize, usize) {
        let answered = if self.finished {
            self.questions.len()
        } else {
            self.current
        };
        (answered, self.questions.len())
    }
}
