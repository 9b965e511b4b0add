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

pub mod cards;
pub mod goal;
pub mod lookup;
pub mod quiz;
pub mod transfer;
pub mod wordbook;

use crate::config::Config;
use crate::config::resolve_directory;
use crate::engine::Engine;
use crate::error::Fallible;
use crate::lookup::http::HttpLookup;
use crate::persist::Persistence;

/// Open the engine over the data directory, with the HTTP services.
pub async fn open_engine(directory: Option<String>) -> Fallible<Engine<HttpLookup>> {
    let directory = resolve_directory(directory)?;
    log::debug!("Data directory: {}", directory.display());
    let config = Config::load(&directory)?;
    let provider = HttpLookup::new(&config)?;
    Ok(Engine::load(provider, Persistence::open(&directory), &config).await)
}
