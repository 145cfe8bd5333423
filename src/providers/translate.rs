//! Machine-translation adapter.
//!
//! Talks to the unofficial Google Translate endpoint (`client=gtx`): no API
//! key, sentence segments come back as a nested JSON array. The base URL is
//! configurable so tests can point the adapter at a local mock.

use async_trait::async_trait;
use std::time::Duration;

use super::Translator;
use crate::catalog::{Language, SourceSelection};
use crate::error::WorkflowError;

pub struct GtxTranslator {
    http: reqwest::Client,
    base_url: String,
}

impl GtxTranslator {
    pub fn new(base_url: &str) -> Self {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0")
            .build()
            .expect("reqwest client construction cannot fail with static options");
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Translator for GtxTranslator {
    async fn translate(
        &self,
        text: &str,
        source: SourceSelection,
        target: Language,
    ) -> Result<String, WorkflowError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(WorkflowError::Translation("empty input".into()));
        }

        let url = format!("{}/translate_a/single", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("client", "gtx"),
                ("sl", source.code()),
                ("tl", target.code()),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await
            .map_err(|e| WorkflowError::Translation(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(WorkflowError::Translation(format!(
                "provider returned status {status}"
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| WorkflowError::Translation(format!("unparseable response: {e}")))?;

        let translated = concat_segments(&body);
        if translated.is_empty() {
            return Err(WorkflowError::Translation("empty response".into()));
        }

        tracing::debug!(
            source = source.code(),
            target = target.code(),
            chars_in = text.len(),
            chars_out = translated.len(),
            "translation completed"
        );
        Ok(translated)
    }
}

/// The GTX response is `[[["<seg>", "<src seg>", ...], ...], ...]`; the
/// translation is the concatenation of the first element of each node.
fn concat_segments(body: &serde_json::Value) -> String {
    body.get(0)
        .and_then(|v| v.as_array())
        .map(|sentences| {
            sentences
                .iter()
                .filter_map(|node| node.get(0).and_then(|s| s.as_str()))
                .collect::<String>()
        })
        .unwrap_or_default()
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn segments_concatenate_in_order() {
        let body = json!([
            [
                ["Bonjour ", "Hello ", null],
                ["le monde", "world", null]
            ],
            null,
            "en"
        ]);
        assert_eq!(concat_segments(&body), "Bonjour le monde");
    }

    #[test]
    fn malformed_body_yields_empty() {
        assert_eq!(concat_segments(&json!({"error": 1})), "");
        assert_eq!(concat_segments(&json!([])), "");
        assert_eq!(concat_segments(&json!([null])), "");
    }

    #[tokio::test]
    async fn translates_against_mock_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/translate_a/single"))
            .and(query_param("client", "gtx"))
            .and(query_param("sl", "auto"))
            .and(query_param("tl", "fr"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                [["Bonjour", "Hello", null]],
                null,
                "en"
            ])))
            .mount(&server)
            .await;

        let translator = GtxTranslator::new(&server.uri());
        let out = translator
            .translate("Hello", SourceSelection::Auto, Language::French)
            .await
            .unwrap();
        assert_eq!(out, "Bonjour");
    }

    #[tokio::test]
    async fn provider_error_status_maps_to_translation_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/translate_a/single"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let translator = GtxTranslator::new(&server.uri());
        let err = translator
            .translate("Hello", SourceSelection::Auto, Language::French)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Translation(_)));
        assert!(err.to_string().contains("429"));
    }

    #[tokio::test]
    async fn empty_input_is_rejected_before_any_request() {
        let translator = GtxTranslator::new("http://127.0.0.1:9");
        let err = translator
            .translate("   ", SourceSelection::Auto, Language::German)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Translation(_)));
    }
}
