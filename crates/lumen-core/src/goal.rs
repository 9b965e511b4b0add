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

use serde::Deserialize;
use serde::Serialize;

use crate::types::date::Date;

/// Default number of reviews per day.
pub const DEFAULT_TARGET: u32 = 15;

/// Target adjustments move in steps of this size.
pub const TARGET_STEP: u32 = 5;

/// The target never goes below this.
pub const MIN_TARGET: u32 = 5;

/// A per-day completion counter. `completed` stays within `0..=target` and
/// resets when the calendar day changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyGoal {
    pub target: u32,
    pub completed: u32,
    pub date: Date,
}

impl DailyGoal {
    pub fn new(target: u32, today: Date) -> Self {
        Self {
            target: target.max(MIN_TARGET),
            completed: 0,
            date: today,
        }
    }

    /// Pull a stored goal back into range: a positive target of at least
    /// [`MIN_TARGET`] and a completion count no larger than it.
    pub fn normalized(self) -> Self {
        let target = self.target.max(MIN_TARGET);
        Self {
            target,
            completed: self.completed.min(target),
            date: self.date,
        }
    }

    /// Count `n` more reviews done today.
    pub fn increment(&mut self, n: u32, today: Date) {
        let base = if self.date == today { self.completed } else { 0 };
        self.date = today;
        self.completed = base.saturating_add(n).min(self.target);
    }

    /// Start today over from zero. The target is kept.
    pub fn reset(&mut self, today: Date) {
        self.date = today;
        self.completed = 0;
    }

    /// The goal as it stands today, without mutating.
    pub fn for_day(&self, today: Date) -> Self {
        let mut goal = *self;
        if goal.date != today {
            goal.reset(today);
        }
        goal
    }

    pub fn raise_target(&mut self) {
        self.target = self.target.saturating_add(TARGET_STEP);
    }

    pub fn lower_target(&mut self) {
        self.target = self.target.saturating_sub(TARGET_STEP).max(MIN_TARGET);
        self.completed = self.completed.min(self.target);
    }

    pub fn is_met(&self) -> bool {
        self.completed >= self.target
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn day(d: u32) -> Date {
        Date::new(NaiveDate::from_ymd_opt(2024, 5, d).unwrap())
    }

    #[test]
    fn test_rollover() {
        let today = day(10);
        let mut goal = DailyGoal {
            target: 15,
            completed: 10,
            date: today.pred(),
        };
        goal.increment(1, today);
        assert_eq!(
            goal,
            DailyGoal {
                target: 15,
                completed: 1,
                date: today
            }
        );
    }

    #[test]
    fn test_increment_same_day_is_capped() {
        let mut goal = DailyGoal::new(5, day(1));
        goal.increment(3, day(1));
        assert_eq!(goal.completed, 3);
        goal.increment(3, day(1));
        assert_eq!(goal.completed, 5);
        assert!(goal.is_met());
    }

    #[test]
    fn test_rollover_increment_is_capped() {
        let mut goal = DailyGoal::new(5, day(1));
        goal.increment(9, day(2));
        assert_eq!(goal.completed, 5);
        assert_eq!(goal.date, day(2));
    }

    #[test]
    fn test_reset_keeps_target() {
        let mut goal = DailyGoal::new(20, day(1));
        goal.increment(7, day(1));
        goal.reset(day(3));
        assert_eq!((goal.target, goal.completed, goal.date), (20, 0, day(3)));
    }

    #[test]
    fn test_for_day() {
        let mut goal = DailyGoal::new(10, day(1));
        goal.increment(4, day(1));
        assert_eq!(goal.for_day(day(1)).completed, 4);
        assert_eq!(goal.for_day(day(2)).completed, 0);
        assert_eq!(goal.completed, 4);
    }

    #[test]
    fn test_target_adjustment() {
        let mut goal = DailyGoal::new(1, day(1));
        assert_eq!(goal.target, MIN_TARGET);
        goal.raise_target();
        assert_eq!(goal.target, 10);
        goal.increment(8, day(1));
        goal.lower_target();
        assert_eq!(goal.target, 5);
        assert_eq!(goal.completed, 5);
        goal.lower_target();
        assert_eq!(goal.target, MIN_TARGET);
    }
}
