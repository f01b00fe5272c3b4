use std::sync::Arc;
use std::time::Instant;

use crate::config::{AnalysisConfig, Config};
use crate::error::Result;
use crate::llm::prompts::analysis_prompt;
use crate::llm::LlmProvider;
use crate::models::AnalysisResult;

use super::{parse_reply, ContentExtractor};

/// URL in, [`AnalysisResult`] out: download, extract, prompt, parse.
///
/// Holds no job state; the job processor and the synchronous analyze
/// endpoint both drive it.
#[derive(Clone)]
pub struct AnalysisPipeline {
    extractor: Arc<ContentExtractor>,
    llm: LlmProvider,
    config: AnalysisConfig,
}

impl AnalysisPipeline {
    pub fn new(extractor: ContentExtractor, llm: LlmProvider, config: AnalysisConfig) -> Self {
        Self {
            extractor: Arc::new(extractor),
            llm,
            config,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            ContentExtractor::new(&config.fetch)?,
            LlmProvider::new(config.llm.as_ref()),
            config.analysis.clone(),
        ))
    }

    pub fn llm(&self) -> &LlmProvider {
        &self.llm
    }

    pub async fn analyze(&self, url: &str) -> Result<AnalysisResult> {
        let started = Instant::now();

        let extracted = self.extractor.extract(url).await?;
        tracing::debug!(
            url,
            kind = ?extracted.kind,
            chars = extracted.text.chars().count(),
            "Extracted document text"
        );

        let result = self.analyze_text(&extracted.text).await?;

        tracing::info!(
            url,
            takeaways = result.takeaways.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Document analyzed"
        );
        Ok(result)
    }

    /// Summarize text that is already extracted.
    pub async fn analyze_text(&self, text: &str) -> Result<AnalysisResult> {
        let prompt = analysis_prompt(text, &self.config);
        let reply = self.llm.complete(&prompt, None).await?;

        parse_reply(&reply, self.config.reply_format).map_err(|e| {
            tracing::warn!(
                error = %e,
                reply_preview = %reply.chars().take(200).collect::<String>(),
                "Provider reply could not be parsed"
            );
            e
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FetchConfig, LlmConfig};
    use crate::error::PapersumError;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn llm_response(content: &str) -> serde_json::Value {
        json!({
            "id": "chatcmpl-test",
            "object": "chat.completion",
            "created": 1,
            "model": "gpt-4o-mini",
            "choices": [
                {
                    "index": 0,
                    "message": {
                        "role": "assistant",
                        "content": content
                    },
                    "finish_reason": "stop"
                }
            ],
            "usage": {
                "prompt_tokens": 10,
                "completion_tokens": 20,
                "total_tokens": 30
            }
        })
    }

    fn pipeline(server: &MockServer) -> AnalysisPipeline {
        let llm_config = LlmConfig {
            model: "openai/gpt-4o-mini".to_string(),
            api_key: Some("test-key".to_string()),
            base_url: Some(server.uri()),
            timeout_secs: 5,
            temperature: None,
        };

        AnalysisPipeline::new(
            ContentExtractor::new(&FetchConfig::default()).unwrap(),
            LlmProvider::new(Some(&llm_config)),
            AnalysisConfig::default(),
        )
    }

    async fn mount_document(server: &MockServer, body: &str) {
        Mock::given(method("GET"))
            .and(path("/paper.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn analyze_embeds_document_and_parses_reply() {
        let server = MockServer::start().await;
        mount_document(&server, "Mice that slept longer remembered mazes better.").await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_string_contains("remembered mazes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(llm_response(
                "<title>Sleep and Mazes</title><summary>Mice slept.</summary>\
                 <methodology>Lab mice.</methodology>\
                 <takeaways><item>Sleep helps</item><item>Mazes</item></takeaways>",
            )))
            .expect(1)
            .mount(&server)
            .await;

        let result = pipeline(&server)
            .analyze(&format!("{}/paper.txt", server.uri()))
            .await
            .unwrap();

        assert_eq!(result.title, "Sleep and Mazes");
        assert_eq!(result.takeaways, vec!["Sleep helps", "Mazes"]);
    }

    #[tokio::test]
    async fn malformed_reply_is_a_summarization_failure() {
        let server = MockServer::start().await;
        mount_document(&server, "Some text.").await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(llm_response("Sorry, I can't do that.")),
            )
            .mount(&server)
            .await;

        let err = pipeline(&server)
            .analyze(&format!("{}/paper.txt", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, PapersumError::MalformedReply(_)));
    }

    #[tokio::test]
    async fn provider_error_is_not_retried() {
        let server = MockServer::start().await;
        mount_document(&server, "Some text.").await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "error": {
                    "message": "The server had an error",
                    "type": "server_error",
                    "param": null,
                    "code": null
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let err = pipeline(&server)
            .analyze(&format!("{}/paper.txt", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, PapersumError::Llm(_)));
    }

    #[tokio::test]
    async fn unavailable_provider_fails_after_extraction() {
        let server = MockServer::start().await;
        mount_document(&server, "Some text.").await;

        let pipeline = AnalysisPipeline::new(
            ContentExtractor::new(&FetchConfig::default()).unwrap(),
            LlmProvider::new(None),
            AnalysisConfig::default(),
        );

        let err = pipeline
            .analyze(&format!("{}/paper.txt", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, PapersumError::LlmUnavailable(_)));
    }
}
