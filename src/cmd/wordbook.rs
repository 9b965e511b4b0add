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

use lumen_core::Date;
use lumen_core::Entry;
use lumen_core::EntryFilter;
use lumen_core::EntryPatch;
use lumen_core::EngineState;
use lumen_core::Source;
use lumen_core::Timestamp;

use crate::cmd::open_engine;
use crate::error::Fallible;
use crate::error::fail;

pub struct ListOptions {
    pub search: Option<String>,
    pub tag: Option<String>,
    pub source: Option<String>,
    pub due: bool,
}

pub async fn add_word(
    directory: Option<String>,
    word: String,
    definition: Option<String>,
    phonetic: Option<String>,
    note: Option<String>,
) -> Fallible<()> {
    let mut engine = open_engine(directory).await?;
    let patch = EntryPatch {
        definition,
        phonetic,
        source: None,
        note,
    };
    let entry = engine.add(&word, patch, Timestamp::now())?;
    engine.flush().await;
    println!("{}", render_entry(&entry));
    Ok(())
}

pub async fn tag_word(directory: Option<String>, word: String, tag: String) -> Fallible<()> {
    let mut engine = open_engine(directory).await?;
    let set = engine.toggle_tag(&word, &tag)?;
    engine.flush().await;
    if set {
        println!("Tagged {word} with {tag}.");
    } else {
        println!("Removed tag {tag} from {word}.");
    }
    Ok(())
}

pub async fn list_entries(directory: Option<String>, options: ListOptions) -> Fallible<()> {
    let source = match options.source.as_deref() {
        Some(text) => match Source::parse_lenient(text) {
            Some(source) => Some(source),
            None => return fail(format!("unknown source: {text}")),
        },
        None => None,
    };
    let engine = open_engine(directory).await?;
    let filter = EntryFilter {
        text: options.search,
        tag: options.tag,
        source,
    };
    let lines = select_entries(engine.state(), &filter, options.due.then(Timestamp::now));
    if lines.is_empty() {
        println!("No matching words.");
    }
    for line in lines {
        println!("{line}");
    }
    Ok(())
}

/// Rendered entries matching the filter, and due at `due_at` when given.
fn select_entries(
    state: &EngineState,
    filter: &EntryFilter,
    due_at: Option<Timestamp>,
) -> Vec<String> {
    let due: Option<Vec<&Entry>> = due_at.map(|now| state.wordbook.due(now));
    state
        .wordbook
        .filter(filter)
        .into_iter()
        .filter(|e| due.as_ref().is_none_or(|due| due.iter().any(|d| d.word == e.word)))
        .map(render_entry)
        .collect()
}

pub async fn print_review_list(directory: Option<String>) -> Fallible<()> {
    let engine = open_engine(directory).await?;
    let list = engine.state().wordbook.review_list();
    if list.is_empty() {
        println!("The wordbook is empty.");
    }
    for entry in list {
        let last = match entry.stats.last_tested {
            Some(at) => at.to_string(),
            None => "never".to_string(),
        };
        println!("{}  (last tested: {last})", render_entry(entry));
    }
    Ok(())
}

pub async fn print_stats(directory: Option<String>) -> Fallible<()> {
    let engine = open_engine(directory).await?;
    print!("{}", render_stats(engine.state(), Date::today()));
    Ok(())
}

pub fn render_entry(entry: &Entry) -> String {
    let mut line = entry.word.clone();
    if let Some(phonetic) = &entry.phonetic {
        line.push_str(&format!(" {phonetic}"));
    }
    if !entry.definition.is_empty() {
        line.push_str(&format!(": {}", entry.definition));
    }
    if !entry.tags.is_empty() {
        let tags: Vec<String> = entry.tags.iter().map(|t| format!("#{t}")).collect();
        line.push_str(&format!(" {}", tags.join(" ")));
    }
    if entry.stats.tests > 0 {
        line.push_str(&format!(
            " [streak {}, {:.0}% of {}]",
            entry.stats.streak,
            entry.stats.accuracy() * 100.0,
            entry.stats.tests
        ));
    }
    line
}

fn render_stats(state: &EngineState, today: Date) -> String {
    let stats = state.wordbook.stats();
    let goal = state.daily_goal.for_day(today);
    let searches: u32 = state.search_counts.values().sum();
    format!(
        "Words: {}\nTested: {}\nAccuracy: {:.1}%\nMissed: {}\nSearches: {}\nToday: {}/{}\n",
        stats.entries,
        stats.tested,
        stats.accuracy() * 100.0,
        state.missed_words.len(),
        searches,
        goal.completed,
        goal.target
    )
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use lumen_core::Outcome;

    use super::*;

    fn today() -> Date {
        Date::new(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
    }

    fn at(millis: i64) -> Timestamp {
        Timestamp::from_millis(millis)
    }

    fn sample() -> Fallible<EngineState> {
        let mut state = EngineState::new(15, today());
        for (word, definition, when) in [
            ("cat", "a small feline", 1_000),
            ("dog", "a loyal canine", 2_000),
            ("owl", "a nocturnal bird", 3_000),
        ] {
            let patch = EntryPatch {
                definition: Some(definition.to_string()),
                ..EntryPatch::default()
            };
            state.save_entry(word, patch, at(when));
        }
        state.toggle_tag("owl", "birds")?;
        state.wordbook.record_answer("dog", Outcome::Correct, at(5_000))?;
        state.missed_words.insert("cat".to_string());
        state.record_search("cat");
        state.record_search("cat");
        Ok(state)
    }

    #[test]
    fn test_render_entry() -> Fallible<()> {
        let state = sample()?;
        assert_eq!(
            render_entry(state.wordbook.get("owl").unwrap()),
            "owl: a nocturnal bird #birds"
        );
        assert_eq!(
            render_entry(state.wordbook.get("dog").unwrap()),
            "dog: a loyal canine [streak 1, 100% of 1]"
        );
        Ok(())
    }

    #[test]
    fn test_select_entries() -> Fallible<()> {
        let state = sample()?;
        let all = select_entries(&state, &EntryFilter::default(), None);
        assert_eq!(all.len(), 3);
        assert!(all[0].starts_with("owl"));

        let tagged = EntryFilter {
            tag: Some("Birds".to_string()),
            ..EntryFilter::default()
        };
        assert_eq!(select_entries(&state, &tagged, None).len(), 1);

        // Dog was just scheduled a day out; the others were never scheduled.
        let due = select_entries(&state, &EntryFilter::default(), Some(at(6_000)));
        assert_eq!(due.len(), 2);
        assert!(due.iter().all(|line| !line.starts_with("dog")));
        Ok(())
    }

    #[test]
    fn test_render_stats() -> Fallible<()> {
        let state = sample()?;
        assert_eq!(
            render_stats(&state, today()),
            "Words: 3\nTested: 1\nAccuracy: 100.0%\nMissed: 1\nSearches: 2\nToday: 0/15\n"
        );
        Ok(())
    }
}
