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

//! Talking to the dictionary and translation services.

pub mod http;
pub mod query;
pub mod request;

use std::future::Future;

use lumen_core::DictionaryEntry;

use crate::error::Fallible;

/// A source of definitions and translations.
///
/// Both methods distinguish an answer the service refused (`Ok(None)`, e.g.
/// an unknown word) from a request that could not be completed (`Err`).
pub trait LookupProvider {
    /// Dictionary entries for a normalized word.
    fn define(&self, word: &str) -> impl Future<Output = Fallible<Option<Vec<DictionaryEntry>>>>;

    /// Translate text. `Ok(Some(""))` means the service answered without a
    /// translation.
    fn translate(&self, text: &str) -> impl Future<Output = Fallible<Option<String>>>;
}
