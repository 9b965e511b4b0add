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

use std::fmt::Write;

use lumen_core::Timestamp;
use tokio::signal::ctrl_c;
use tokio::spawn;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::cmd::open_engine;
use crate::engine::BatchReport;
use crate::engine::Committed;
use crate::engine::QueryResult;
use crate::error::Fallible;
use crate::error::fail;

/// Cancel `signal` when the user hits Ctrl-C.
fn cancel_on_interrupt(signal: CancellationToken) -> JoinHandle<()> {
    spawn(async move {
        if ctrl_c().await.is_ok() {
            log::debug!("Interrupted.");
            signal.cancel();
        }
    })
}

pub async fn lookup(directory: Option<String>, text: String) -> Fallible<()> {
    let mut engine = open_engine(directory).await?;
    let pending = engine.begin_query(&text)?;
    log::debug!("Looking up {:?}", pending.query());
    let watcher = cancel_on_interrupt(pending.signal());
    let outcome = pending.run().await;
    watcher.abort();
    let committed = engine.commit(outcome, Timestamp::now());
    engine.flush().await;
    let (hits, misses) = engine.cache().stats();
    log::debug!("Cache: {hits} hits, {misses} misses.");
    match committed {
        Committed::Shown { saved, notice } => {
            if let Some(result) = engine.displayed() {
                print!("{}", render_result(result));
            }
            if let Some(notice) = notice {
                println!("{notice}");
            }
            if saved {
                println!("Searched often enough: saved to the wordbook.");
            }
            Ok(())
        }
        Committed::Discarded => Ok(()),
        Committed::Failed(message) => fail(format!("lookup failed: {message}")),
    }
}

pub async fn batch_import(
    directory: Option<String>,
    words: Option<String>,
    file: Option<String>,
) -> Fallible<()> {
    let input = match (words, file) {
        (_, Some(path)) => tokio::fs::read_to_string(path).await?,
        (Some(words), None) => words,
        (None, None) => String::new(),
    };
    let mut engine = open_engine(directory).await?;
    let signal = CancellationToken::new();
    let watcher = cancel_on_interrupt(signal.clone());
    let report = engine
        .batch_import(&input, &signal, Timestamp::now(), |word, report| {
            println!("[{}/{}] {word}", report.processed, report.total);
        })
        .await;
    watcher.abort();
    println!("{}", render_batch_report(&report?));
    Ok(())
}

pub fn render_batch_report(report: &BatchReport) -> String {
    format!(
        "Processed {} of {} words: {} saved, {} failed.",
        report.processed, report.total, report.imported, report.failed
    )
}

pub fn render_result(result: &QueryResult) -> String {
    let mut out = String::new();
    match result {
        QueryResult::Word { word, payload } => {
            let heading = match payload.phonetic() {
                Some(phonetic) => format!("{word}  {phonetic}"),
                None => word.clone(),
            };
            writeln!(out, "{heading}").ok();
            for entry in &payload.definitions {
                for meaning in &entry.meanings {
                    writeln!(out, "  {}", meaning.part_of_speech).ok();
                    for (i, sense) in meaning.definitions.iter().enumerate() {
                        writeln!(out, "    {}. {}", i + 1, sense.definition).ok();
                        if let Some(example) = &sense.example {
                            writeln!(out, "       \"{example}\"").ok();
                        }
                    }
                    if !meaning.synonyms.is_empty() {
                        writeln!(out, "    synonyms: {}", meaning.synonyms.join(", ")).ok();
                    }
                }
            }
        }
        QueryResult::Sentence {
            sentence,
            translation,
            rare_words,
        } => {
            writeln!(out, "{sentence}").ok();
            writeln!(out, "  {translation}").ok();
            for rare in rare_words {
                let label = match &rare.part_of_speech {
                    Some(pos) => format!("{} ({pos})", rare.word),
                    None => rare.word.clone(),
                };
                writeln!(out, "  - {label}: {}", rare.meaning).ok();
                if let Some(example) = &rare.example {
                    writeln!(out, "      \"{example}\"").ok();
                }
                if !rare.synonyms.is_empty() {
                    writeln!(out, "      synonyms: {}", rare.synonyms.join(", ")).ok();
                }
            }
        }
    }
    out
}
