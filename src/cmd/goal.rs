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

use lumen_core::DailyGoal;
use lumen_core::Date;

use crate::cmd::open_engine;
use crate::error::Fallible;

pub enum GoalAction {
    Show,
    Raise,
    Lower,
    Reset,
}

pub async fn update_goal(directory: Option<String>, action: GoalAction) -> Fallible<()> {
    let mut engine = open_engine(directory).await?;
    let today = Date::today();
    match action {
        GoalAction::Show => {}
        GoalAction::Raise => engine.raise_goal_target(),
        GoalAction::Lower => engine.lower_goal_target(),
        GoalAction::Reset => engine.reset_goal(today),
    }
    engine.flush().await;
    println!("{}", render_goal(&engine.goal(today)));
    Ok(())
}

fn render_goal(goal: &DailyGoal) -> String {
    let status = if goal.is_met() { " Done!" } else { "" };
    format!(
        "{}: {}/{} reviews.{status}",
        goal.date, goal.completed, goal.target
    )
}
