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

//! Two storage sinks: the durable JSON file and a local SQLite fallback.
//! Reads prefer the durable copy field by field. Writes go to both, and a
//! failing sink is logged and skipped.

pub mod durable;
pub mod local;

use std::path::Path;

use lumen_core::PartialSnapshot;
use lumen_core::Snapshot;
use lumen_core::Timestamp;

use crate::persist::durable::DURABLE_FILE;
use crate::persist::durable::JsonFileChannel;
use crate::persist::local::LOCAL_FILE;
use crate::persist::local::LocalStore;

pub struct Persistence {
    durable: Option<JsonFileChannel>,
    local: Option<LocalStore>,
}

impl Persistence {
    /// Both sinks inside `directory`. A local store that can't be opened is
    /// logged and left out.
    pub fn open(directory: &Path) -> Self {
        let local = match LocalStore::open(&directory.join(LOCAL_FILE)) {
            Ok(store) => Some(store),
            Err(e) => {
                log::warn!("Local store unavailable: {e}");
                None
            }
        };
        Self {
            durable: Some(JsonFileChannel::new(directory.join(DURABLE_FILE))),
            local,
        }
    }

    pub fn new(durable: Option<JsonFileChannel>, local: Option<LocalStore>) -> Self {
        Self { durable, local }
    }

    /// Nothing is read or written.
    pub fn none() -> Self {
        Self::new(None, None)
    }

    pub async fn hydrate(&self, now: Timestamp) -> PartialSnapshot {
        let durable = match &self.durable {
            Some(channel) => match channel.load().await {
                Ok(map) => PartialSnapshot::from_map(&map, now),
                Err(e) => {
                    log::warn!("Durable store unreadable: {e}");
                    PartialSnapshot::default()
                }
            },
            None => PartialSnapshot::default(),
        };
        let local = match &self.local {
            Some(store) => match store.load(now) {
                Ok(partial) => partial,
                Err(e) => {
                    log::warn!("Local store unreadable: {e}");
                    PartialSnapshot::default()
                }
            },
            None => PartialSnapshot::default(),
        };
        durable.or(local)
    }

    /// Write the snapshot to every sink. Never fails.
    pub async fn flush(&self, snapshot: &Snapshot) {
        let map = match snapshot.to_map() {
            Ok(map) => map,
            Err(e) => {
                log::error!("Could not serialize state: {e}");
                return;
            }
        };
        if let Some(channel) = &self.durable {
            if let Err(e) = channel.save(map.clone()).await {
                log::warn!("Durable save failed: {e}");
            }
        }
        if let Some(store) = &self.local {
            if let Err(e) = store.save(&map) {
                log::warn!("Local save failed: {e}");
            }
        }
    }
}
