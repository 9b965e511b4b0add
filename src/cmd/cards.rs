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
use lumen_core::TinyRng;

use crate::cmd::open_engine;
use crate::error::Fallible;
use crate::utils::Prompt;

/// One keystroke's worth of flashcard input.
#[derive(Debug, PartialEq)]
enum CardAction {
    Flip,
    /// Count the card as reviewed and move on.
    Done,
    Skip,
    Quit,
}

impl CardAction {
    fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "" | "f" => Some(CardAction::Flip),
            "d" => Some(CardAction::Done),
            "s" => Some(CardAction::Skip),
            "q" => Some(CardAction::Quit),
            _ => None,
        }
    }
}

pub async fn drill_cards(directory: Option<String>) -> Fallible<()> {
    let mut engine = open_engine(directory).await?;
    let mut queue = engine.build_flashcards(&mut TinyRng::from_clock());
    if queue.is_empty() {
        println!("The wordbook is empty.");
        return Ok(());
    }
    println!("Enter flips, d marks reviewed, s skips, q quits.");
    let mut prompt = Prompt::stdin();
    let mut reviewed = 0;
    loop {
        let Some(card) = queue.current() else {
            break;
        };
        println!(
            "\n[{}/{}] {}",
            queue.index() + 1,
            queue.len(),
            render_card(card, queue.is_revealed())
        );
        let Some(line) = prompt.line().await? else {
            break;
        };
        match CardAction::parse(&line) {
            Some(CardAction::Flip) => queue.toggle_reveal(),
            Some(CardAction::Done) => {
                engine.review_flashcard(Date::today());
                engine.flush().await;
                reviewed += 1;
                queue.advance();
            }
            Some(CardAction::Skip) => queue.advance(),
            Some(CardAction::Quit) => break,
            None => println!("Unknown command."),
        }
    }
    let goal = engine.goal(Date::today());
    println!(
        "Reviewed {reviewed} cards. Today: {}/{}.",
        goal.completed, goal.target
    );
    Ok(())
}

fn render_card(card: &Entry, revealed: bool) -> String {
    let front = match &card.phonetic {
        Some(phonetic) => format!("{} {phonetic}", card.word),
        None => card.word.clone(),
    };
    if !revealed {
        return front;
    }
    let mut back = format!("{front}\n  {}", card.definition);
    if !card.note.is_empty() {
        back.push_str(&format!("\n  note: {}", card.note));
    }
    back
}

#[cfg(test)]
mod tests {
    use lumen_core::Source;
    use lumen_core::Timestamp;

    use super::*;

    #[test]
    fn test_parse_actions() {
        assert_eq!(CardAction::parse(""), Some(CardAction::Flip));
        assert_eq!(CardAction::parse(" d "), Some(CardAction::Done));
        assert_eq!(CardAction::parse("s"), Some(CardAction::Skip));
        assert_eq!(CardAction::parse("q"), Some(CardAction::Quit));
        assert_eq!(CardAction::parse("x"), None);
    }

    #[test]
    fn test_render_card() {
        let mut card = Entry::new("owl", Source::Manual, Timestamp::from_millis(0));
        card.definition = "a nocturnal bird".to_string();
        card.note = "hoots".to_string();
        assert_eq!(render_card(&card, false), "owl");
        assert_eq!(render_card(&card, true), "owl\n  a nocturnal bird\n  note: hoots");
    }
}
