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

use lumen_core::Timestamp;
use tokio::fs;

use crate::cmd::open_engine;
use crate::error::Fallible;

pub async fn import_wordbook(directory: Option<String>, file: String) -> Fallible<()> {
    let json = fs::read_to_string(&file).await?;
    let mut engine = open_engine(directory).await?;
    let report = engine.import_json(&json, Timestamp::now())?;
    engine.flush().await;
    println!(
        "Imported {file}: {} new, {} updated, {} skipped.",
        report.inserted, report.updated, report.skipped
    );
    Ok(())
}

pub async fn export_wordbook(directory: Option<String>, output: Option<String>) -> Fallible<()> {
    let engine = open_engine(directory).await?;
    let json = engine.export_json()?;
    match output {
        Some(path) => {
            fs::write(&path, json).await?;
            log::info!("Exported {} words to {path}", engine.state().wordbook.len());
        }
        None => println!("{json}"),
    }
    Ok(())
}
