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
use lumen_core::Outcome;
use lumen_core::Question;
use lumen_core::Timestamp;
use lumen_core::TinyRng;

use crate::cmd::open_engine;
use crate::error::Fallible;
use crate::utils::Prompt;

pub async fn run_quiz(directory: Option<String>, missed: bool) -> Fallible<()> {
    let mut engine = open_engine(directory).await?;
    let mut rng = TinyRng::from_clock();
    let mut session = engine.start_quiz(missed, &mut rng)?;
    let mut prompt = Prompt::stdin();
    while let Some(question) = session.current_question().cloned() {
        let (answered, total) = session.progress();
        println!("\n[{}/{total}] {}", answered + 1, render_heading(&question));
        for (i, option) in question.options.iter().enumerate() {
            println!("  {}. {option}", i + 1);
        }
        let choice = loop {
            let Some(line) = prompt.line().await? else {
                println!("Quiz abandoned.");
                return Ok(());
            };
            if line == "q" {
                println!("Quiz abandoned.");
                return Ok(());
            }
            match parse_choice(&line, &question) {
                Some(choice) => break choice,
                None => println!("Answer with 1-{}, or q to quit.", question.options.len()),
            }
        };
        let answered =
            engine.answer_quiz(&mut session, &choice, Timestamp::now(), Date::today())?;
        engine.flush().await;
        if let Some((result, stats)) = answered {
            match result.outcome {
                Outcome::Correct => println!("Correct."),
                Outcome::Incorrect => println!("Wrong. Answer: {}", result.correct_answer),
            }
            if let Some(next) = stats.next_review {
                log::debug!("{} is next due {next}", result.word);
            }
        }
    }
    let goal = engine.goal(Date::today());
    println!(
        "\nScore: {}/{}. Today: {}/{}.",
        session.score,
        session.questions.len(),
        goal.completed,
        goal.target
    );
    Ok(())
}

fn render_heading(question: &Question) -> String {
    match &question.phonetic {
        Some(phonetic) => format!("{} {phonetic}", question.word),
        None => question.word.clone(),
    }
}

/// The option chosen by a line of input: its 1-based number, or its exact
/// text.
fn parse_choice(input: &str, question: &Question) -> Option<String> {
    let input = input.trim();
    if let Ok(n) = input.parse::<usize>() {
        return n
            .checked_sub(1)
            .and_then(|i| question.options.get(i))
            .cloned();
    }
    question.options.iter().find(|o| o.as_str() == input).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question() -> Question {
        Question {
            word: "owl".to_string(),
            phonetic: Some("/aʊl/".to_string()),
            correct: "a nocturnal bird".to_string(),
            options: vec![
                "a small feline".to_string(),
                "a nocturnal bird".to_string(),
                "a loyal canine".to_string(),
                "a long fish".to_string(),
            ],
        }
    }

    #[test]
    fn test_parse_choice() {
        let q = question();
        assert_eq!(parse_choice("2", &q).as_deref(), Some("a nocturnal bird"));
        assert_eq!(parse_choice(" a long fish ", &q).as_deref(), Some("a long fish"));
        assert_eq!(parse_choice("0", &q), None);
        assert_eq!(parse_choice("5", &q), None);
        assert_eq!(parse_choice("bird", &q), None);
    }

    #[test]
    fn test_render_heading() {
        assert_eq!(render_heading(&question()), "owl /aʊl/");
    }
}
