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

use std::path::PathBuf;

use serde_json::Map;
use serde_json::Value;
use tokio::fs;

use crate::error::Fallible;
use crate::error::fail;

/// File name of the durable channel inside the data directory.
pub const DURABLE_FILE: &str = "lumen-words.json";

/// The durable store: one JSON object on disk. Saves are partial, merged over
/// whatever the file already holds.
pub struct JsonFileChannel {
    path: PathBuf,
}

impl JsonFileChannel {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// The stored object. A missing or empty file is an empty object.
    pub async fn load(&self) -> Fallible<Map<String, Value>> {
        if !fs::try_exists(&self.path).await? {
            return Ok(Map::new());
        }
        let text = fs::read_to_string(&self.path).await?;
        if text.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&text)? {
            Value::Object(map) => Ok(map),
            _ => fail(format!("{} does not hold a JSON object.", self.path.display())),
        }
    }

    /// Merge `partial` over the stored object and write it back. Returns the
    /// merged object.
    pub async fn save(&self, partial: Map<String, Value>) -> Fallible<Map<String, Value>> {
        let mut merged = match self.load().await {
            Ok(map) => map,
            Err(e) => {
                log::warn!("Overwriting unreadable {}: {e}", self.path.display());
                Map::new()
            }
        };
        merged.extend(partial);
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let text = serde_json::to_string_pretty(&merged)?;
        fs::write(&self.path, text).await?;
        Ok(merged)
    }
}
