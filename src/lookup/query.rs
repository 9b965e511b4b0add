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

use std::time::Duration;

use futures::future::try_join_all;
use lumen_core::DefinitionPayload;
use lumen_core::LookupCache;
use lumen_core::RareWord;
use lumen_core::lookup::FALLBACK_TRANSLATION;
use lumen_core::lookup::rare_words;
use lumen_core::normalize;
use tokio_util::sync::CancellationToken;

use crate::lookup::LookupProvider;
use crate::lookup::request::RequestError;
use crate::lookup::request::cancellable;

/// Cache-first lookups, all bound to one cancellation token.
pub struct Lookup<'a, P> {
    pub provider: &'a P,
    pub cache: &'a LookupCache,
    pub signal: &'a CancellationToken,
    pub timeout: Duration,
}

impl<P: LookupProvider> Lookup<'_, P> {
    /// Definitions for a word. A refused request yields an empty payload
    /// that is not cached, so the next attempt asks again.
    pub async fn definition(&self, word: &str) -> Result<DefinitionPayload, RequestError> {
        let key = normalize(word);
        if let Some(hit) = self.cache.definition(&key) {
            log::debug!("Definition cache hit for {key:?}");
            return Ok(hit);
        }
        let response = cancellable(self.signal, self.timeout, self.provider.define(&key)).await?;
        match response {
            Some(entries) => {
                let payload = DefinitionPayload::new(entries);
                self.cache.put_definition(&key, payload.clone());
                Ok(payload)
            }
            None => Ok(DefinitionPayload::default()),
        }
    }

    /// Translation of a text. A refused request yields the fallback text,
    /// uncached. A response without a translation caches the fallback.
    pub async fn translation(&self, text: &str) -> Result<String, RequestError> {
        let key = normalize(text);
        if let Some(hit) = self.cache.translation(&key) {
            log::debug!("Translation cache hit for {key:?}");
            return Ok(hit);
        }
        let response =
            cancellable(self.signal, self.timeout, self.provider.translate(text.trim())).await?;
        match response {
            Some(translated) => {
                let translated = if translated.is_empty() {
                    FALLBACK_TRANSLATION.to_string()
                } else {
                    translated
                };
                self.cache.put_translation(&key, translated.clone());
                Ok(translated)
            }
            None => Ok(FALLBACK_TRANSLATION.to_string()),
        }
    }

    /// Look up every rare word of the sentence concurrently. A word whose
    /// lookup fails gets a placeholder; a cancellation aborts the batch.
    pub async fn rare_words(&self, sentence: &str) -> Result<Vec<RareWord>, RequestError> {
        let lookups = rare_words(sentence).into_iter().map(|word| async move {
            match self.definition(&word).await {
                Ok(payload) => Ok(RareWord::from_payload(&word, &payload)),
                Err(e) if e.is_cancelled() => Err(e),
                Err(e) => {
                    log::warn!("Lookup of {word:?} failed: {e}");
                    Ok(RareWord::missing(&word))
                }
            }
        });
        try_join_all(lookups).await
    }
}
