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

//! Streak-based spaced repetition.
//!
//! Every quiz answer bumps `tests`. A correct answer extends the streak and
//! pushes the next review further out along a fixed escalation table; a miss
//! zeroes the streak, which collapses the interval back to one day.

use serde::Deserialize;
use serde::Serialize;

use crate::types::entry::Stats;
use crate::types::timestamp::Timestamp;

/// Review intervals in days, indexed by the streak after the answer.
pub const STEP_DAYS: [i64; 4] = [1, 3, 7, 14];

/// The maximum review interval in days.
pub const MAX_INTERVAL_DAYS: i64 = 21;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum Outcome {
    Correct,
    Incorrect,
}

impl Outcome {
    pub fn from_correct(correct: bool) -> Self {
        if correct {
            Outcome::Correct
        } else {
            Outcome::Incorrect
        }
    }

    pub fn is_correct(self) -> bool {
        self == Outcome::Correct
    }
}

/// Interval in days for a streak. A streak of one is the first step, a streak
/// of zero (just missed) shares it, and anything past the table stays on the
/// last step.
pub fn step_days(streak: u32) -> i64 {
    let index = (streak.saturating_sub(1) as usize).min(STEP_DAYS.len() - 1);
    STEP_DAYS[index].min(MAX_INTERVAL_DAYS)
}

/// Apply one quiz answer.
pub fn record_answer(stats: Stats, outcome: Outcome, now: Timestamp) -> Stats {
    let streak = match outcome {
        Outcome::Correct => stats.streak.saturating_add(1),
        Outcome::Incorrect => 0,
    };
    let correct = stats.correct.saturating_add(u32::from(outcome.is_correct()));
    Stats {
        tests: stats.tests.saturating_add(1),
        correct,
        streak,
        last_tested: Some(now),
        next_review: Some(now.plus_days(step_days(streak))),
    }
}
