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

use clap::Parser;
use clap::Subcommand;

use crate::cmd::cards::drill_cards;
use crate::cmd::goal::GoalAction;
use crate::cmd::goal::update_goal;
use crate::cmd::lookup::batch_import;
use crate::cmd::lookup::lookup;
use crate::cmd::quiz::run_quiz;
use crate::cmd::transfer::export_wordbook;
use crate::cmd::transfer::import_wordbook;
use crate::cmd::wordbook::ListOptions;
use crate::cmd::wordbook::add_word;
use crate::cmd::wordbook::list_entries;
use crate::cmd::wordbook::print_review_list;
use crate::cmd::wordbook::print_stats;
use crate::cmd::wordbook::tag_word;
use crate::error::Fallible;

#[derive(Parser)]
#[command(version, about, long_about = None)]
enum Command {
    /// Look up a word, or translate a sentence.
    Lookup {
        /// The word or sentence.
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
        /// Path to the data directory. By default, $LUMEN_DIR or the current working directory is used.
        #[arg(long)]
        directory: Option<String>,
    },
    /// Save a word to the wordbook by hand.
    Add {
        word: String,
        #[arg(long)]
        definition: Option<String>,
        #[arg(long)]
        phonetic: Option<String>,
        #[arg(long)]
        note: Option<String>,
        /// Path to the data directory. By default, $LUMEN_DIR or the current working directory is used.
        #[arg(long)]
        directory: Option<String>,
    },
    /// Look up and save a list of words.
    Batch {
        /// Words separated by newlines, commas or semicolons.
        words: Option<String>,
        /// Read the words from this file instead.
        #[arg(long, conflicts_with = "words")]
        file: Option<String>,
        /// Path to the data directory. By default, $LUMEN_DIR or the current working directory is used.
        #[arg(long)]
        directory: Option<String>,
    },
    /// Toggle a tag on a saved word.
    Tag {
        word: String,
        tag: String,
        /// Path to the data directory. By default, $LUMEN_DIR or the current working directory is used.
        #[arg(long)]
        directory: Option<String>,
    },
    /// List saved words, newest first.
    List {
        /// Only words or definitions containing this text.
        #[arg(long)]
        search: Option<String>,
        /// Only words with this tag.
        #[arg(long)]
        tag: Option<String>,
        /// Only words from this source: auto_lookup, sentence_capture, batch_import or manual.
        #[arg(long)]
        source: Option<String>,
        /// Only words due for review.
        #[arg(long)]
        due: bool,
        /// Path to the data directory. By default, $LUMEN_DIR or the current working directory is used.
        #[arg(long)]
        directory: Option<String>,
    },
    /// Show the words that have gone longest without a test.
    Review {
        /// Path to the data directory. By default, $LUMEN_DIR or the current working directory is used.
        #[arg(long)]
        directory: Option<String>,
    },
    /// Take a multiple-choice quiz.
    Quiz {
        /// Retake only the words last answered wrong.
        #[arg(long)]
        missed: bool,
        /// Path to the data directory. By default, $LUMEN_DIR or the current working directory is used.
        #[arg(long)]
        directory: Option<String>,
    },
    /// Flip through flashcards.
    Cards {
        /// Path to the data directory. By default, $LUMEN_DIR or the current working directory is used.
        #[arg(long)]
        directory: Option<String>,
    },
    /// Show or adjust the daily goal.
    Goal {
        #[command(subcommand)]
        action: Option<GoalCommand>,
        /// Path to the data directory. By default, $LUMEN_DIR or the current working directory is used.
        #[arg(long)]
        directory: Option<String>,
    },
    /// Merge a JSON export into the wordbook.
    Import {
        file: String,
        /// Path to the data directory. By default, $LUMEN_DIR or the current working directory is used.
        #[arg(long)]
        directory: Option<String>,
    },
    /// Export the wordbook as JSON.
    Export {
        /// Optional path to the output file. By default, the output is printed to stdout.
        #[arg(long)]
        output: Option<String>,
        /// Path to the data directory. By default, $LUMEN_DIR or the current working directory is used.
        #[arg(long)]
        directory: Option<String>,
    },
    /// Print wordbook statistics.
    Stats {
        /// Path to the data directory. By default, $LUMEN_DIR or the current working directory is used.
        #[arg(long)]
        directory: Option<String>,
    },
}

#[derive(Subcommand)]
enum GoalCommand {
    /// Print today's progress.
    Show,
    /// Raise the target by five.
    Raise,
    /// Lower the target by five.
    Lower,
    /// Start today's count over.
    Reset,
}

pub async fn entrypoint() -> Fallible<()> {
    let cli: Command = Command::parse();
    match cli {
        Command::Lookup { text, directory } => lookup(directory, text.join(" ")).await,
        Command::Add {
            word,
            definition,
            phonetic,
            note,
            directory,
        } => add_word(directory, word, definition, phonetic, note).await,
        Command::Batch {
            words,
            file,
            directory,
        } => batch_import(directory, words, file).await,
        Command::Tag {
            word,
            tag,
            directory,
        } => tag_word(directory, word, tag).await,
        Command::List {
            search,
            tag,
            source,
            due,
            directory,
        } => {
            let options = ListOptions {
                search,
                tag,
                source,
                due,
            };
            list_entries(directory, options).await
        }
        Command::Review { directory } => print_review_list(directory).await,
        Command::Quiz { missed, directory } => run_quiz(directory, missed).await,
        Command::Cards { directory } => drill_cards(directory).await,
        Command::Goal { action, directory } => {
            let action = match action.unwrap_or(GoalCommand::Show) {
                GoalCommand::Show => GoalAction::Show,
                GoalCommand::Raise => GoalAction::Raise,
                GoalCommand::Lower => GoalAction::Lower,
                GoalCommand::Reset => GoalAction::Reset,
            };
            update_goal(directory, action).await
        }
        Command::Import { file, directory } => import_wordbook(directory, file).await,
        Command::Export { output, directory } => export_wordbook(directory, output).await,
        Command::Stats { directory } => print_stats(directory).await,
    }
}
