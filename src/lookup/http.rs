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

use percent_encoding::NON_ALPHANUMERIC;
use percent_encoding::utf8_percent_encode;
use reqwest::Client;
use serde_json::Value;

use lumen_core::DictionaryEntry;

use crate::config::Config;
use crate::error::Fallible;
use crate::error::ReportExt;
use crate::lookup::LookupProvider;

/// The public dictionary and translation services, over HTTP.
pub struct HttpLookup {
    client: Client,
    dictionary_url: String,
    translation_url: String,
    language_pair: String,
}

impl HttpLookup {
    pub fn new(config: &Config) -> Fallible<Self> {
        let client = Client::builder()
            .user_agent(concat!("lumen/", env!("CARGO_PKG_VERSION")))
            .build()
            .report("failed to build HTTP client")?;
        Ok(Self {
            client,
            dictionary_url: config.dictionary_url.trim_end_matches('/').to_string(),
            translation_url: config.translation_url.clone(),
            language_pair: config.language_pair.clone(),
        })
    }

    fn definition_url(&self, word: &str) -> String {
        format!(
            "{}/{}",
            self.dictionary_url,
            utf8_percent_encode(word, NON_ALPHANUMERIC)
        )
    }

    fn translation_url(&self, text: &str) -> String {
        format!(
            "{}?q={}&langpair={}",
            self.translation_url,
            utf8_percent_encode(text, NON_ALPHANUMERIC),
            utf8_percent_encode(&self.language_pair, NON_ALPHANUMERIC)
        )
    }

    /// GET a JSON document. `None` on a non-success status.
    async fn get_json(&self, url: &str) -> Fallible<Option<Value>> {
        log::debug!("GET {url}");
        let response = self.client.get(url).send().await.report("request failed")?;
        let status = response.status();
        if !status.is_success() {
            log::debug!("GET {url} returned {status}");
            return Ok(None);
        }
        let body = response.text().await.report("failed to read response")?;
        Ok(Some(serde_json::from_str(&body)?))
    }
}

impl LookupProvider for HttpLookup {
    async fn define(&self, word: &str) -> Fallible<Option<Vec<DictionaryEntry>>> {
        let Some(body) = self.get_json(&self.definition_url(word)).await? else {
            return Ok(None);
        };
        let Value::Array(items) = body else {
            log::warn!("Dictionary response for {word:?} is not a list.");
            return Ok(Some(Vec::new()));
        };
        let entries = items
            .into_iter()
            .filter_map(|item| match serde_json::from_value::<DictionaryEntry>(item) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    log::warn!("Skipping unreadable dictionary entry for {word:?}: {e}");
                    None
                }
            })
            .collect();
        Ok(Some(entries))
    }

    async fn translate(&self, text: &str) -> Fallible<Option<String>> {
        let Some(body) = self.get_json(&self.translation_url(text)).await? else {
            return Ok(None);
        };
        let translated = body
            .pointer("/responseData/translatedText")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim()
            .to_string();
        Ok(Some(translated))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use axum::Router;
    use axum::extract::Path;
    use axum::extract::Query;
    use axum::http::StatusCode;
    use axum::routing::get;
    use portpicker::pick_unused_port;
    use tokio::net::TcpListener;
    use tokio::spawn;

    use super::*;
    use crate::utils::wait_for_server;

    const TEST_HOST: &str = "127.0.0.1";

    const SERENDIPITY: &str = r#"[{
        "word": "serendipity",
        "phonetic": "/ˌsɛɹənˈdɪpɪti/",
        "meanings": [{
            "partOfSpeech": "noun",
            "definitions": [{"definition": "A fortunate discovery by accident.", "synonyms": []}],
            "synonyms": ["chance", "fluke"]
        }]
    }]"#;

    async fn define_handler(Path(word): Path<String>) -> (StatusCode, String) {
        match word.as_str() {
            "serendipity" => (StatusCode::OK, SERENDIPITY.to_string()),
            "garbled" => (StatusCode::OK, "<html>".to_string()),
            "well-being" => (StatusCode::OK, "[]".to_string()),
            _ => (StatusCode::NOT_FOUND, "{\"title\":\"No Definitions Found\"}".to_string()),
        }
    }

    async fn translate_handler(Query(params): Query<HashMap<String, String>>) -> (StatusCode, String) {
        let q = params.get("q").cloned().unwrap_or_default();
        let pair = params.get("langpair").cloned().unwrap_or_default();
        match q.as_str() {
            "down" => (StatusCode::SERVICE_UNAVAILABLE, String::new()),
            "blank" => (StatusCode::OK, "{\"responseData\":{}}".to_string()),
            _ => (
                StatusCode::OK,
                format!("{{\"responseData\":{{\"translatedText\":\"[{pair}] {q}\"}}}}"),
            ),
        }
    }

    async fn start() -> Fallible<HttpLookup> {
        let port = pick_unused_port().unwrap();
        let app = Router::new()
            .route("/entries/en/{word}", get(define_handler))
            .route("/get", get(translate_handler));
        let listener = TcpListener::bind(format!("{TEST_HOST}:{port}")).await?;
        spawn(async move { axum::serve(listener, app).await });
        wait_for_server(TEST_HOST, port).await?;
        let config = Config {
            dictionary_url: format!("http://{TEST_HOST}:{port}/entries/en/"),
            translation_url: format!("http://{TEST_HOST}:{port}/get"),
            ..Config::default()
        };
        HttpLookup::new(&config)
    }

    #[tokio::test]
    async fn test_define() -> Fallible<()> {
        let lookup = start().await?;
        let entries = lookup.define("serendipity").await?.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].phonetic.as_deref(), Some("/ˌsɛɹənˈdɪpɪti/"));
        assert_eq!(entries[0].meanings[0].part_of_speech, "noun");
        assert_eq!(entries[0].meanings[0].synonyms, vec!["chance", "fluke"]);
        assert_eq!(lookup.define("well-being").await?, Some(Vec::new()));
        Ok(())
    }

    #[tokio::test]
    async fn test_define_unknown_word_is_none() -> Fallible<()> {
        let lookup = start().await?;
        assert_eq!(lookup.define("qwertyuiop").await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_define_malformed_body_fails() -> Fallible<()> {
        let lookup = start().await?;
        assert!(lookup.define("garbled").await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_translate_encodes_query() -> Fallible<()> {
        let lookup = start().await?;
        let translated = lookup.translate("rain & snow?").await?;
        assert_eq!(translated.as_deref(), Some("[en|zh-CN] rain & snow?"));
        Ok(())
    }

    #[tokio::test]
    async fn test_translate_missing_field_and_bad_status() -> Fallible<()> {
        let lookup = start().await?;
        assert_eq!(lookup.translate("blank").await?.as_deref(), Some(""));
        assert_eq!(lookup.translate("down").await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_unreachable_service_fails() -> Fallible<()> {
        let port = pick_unused_port().unwrap();
        let config = Config {
            dictionary_url: format!("http://{TEST_HOST}:{port}"),
            ..Config::default()
        };
        let lookup = HttpLookup::new(&config)?;
        let err = lookup.define("serendipity").await.unwrap_err();
        assert!(err.message().starts_with("request failed"));
        Ok(())
    }
}
