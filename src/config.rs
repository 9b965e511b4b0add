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

use std::env;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use lumen_core::goal::DEFAULT_TARGET;
use serde::Deserialize;

use crate::error::Fallible;
use crate::error::ReportExt;
use crate::error::fail;

/// Name of the optional configuration file inside the data directory.
pub const CONFIG_FILE: &str = "lumen.toml";

/// Environment variable naming the data directory.
pub const DIRECTORY_VAR: &str = "LUMEN_DIR";

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Base URL of the dictionary service. The word is appended as a path
    /// segment.
    pub dictionary_url: String,
    /// URL of the translation service.
    pub translation_url: String,
    /// Source and target language, as `en|zh-CN`.
    pub language_pair: String,
    pub request_timeout_secs: u64,
    /// Daily goal target for a fresh data directory.
    pub daily_target: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dictionary_url: "https://api.dictionaryapi.dev/api/v2/entries/en".to_string(),
            translation_url: "https://api.mymemory.translated.net/get".to_string(),
            language_pair: "en|zh-CN".to_string(),
            request_timeout_secs: 9,
            daily_target: DEFAULT_TARGET,
        }
    }
}

impl Config {
    /// Read `lumen.toml` from the directory. A missing file means defaults.
    pub fn load(directory: &Path) -> Fallible<Self> {
        let path = directory.join(CONFIG_FILE);
        if !path.exists() {
            log::debug!("No {CONFIG_FILE} in {}, using defaults.", directory.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(&path)?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Fallible<Self> {
        let config: Config = toml::from_str(text).report("invalid configuration")?;
        if config.request_timeout_secs == 0 {
            return fail("request_timeout_secs must be positive.");
        }
        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// The data directory: the explicit argument, else `$LUMEN_DIR`, else the
/// current working directory. It must already exist.
pub fn resolve_directory(directory: Option<String>) -> Fallible<PathBuf> {
    let directory: PathBuf = match directory {
        Some(dir) => PathBuf::from(dir),
        None => match env::var(DIRECTORY_VAR) {
            Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => env::current_dir()?,
        },
    };
    if !directory.is_dir() {
        return fail("directory does not exist.");
    }
    Ok(directory.canonicalize()?)
}
