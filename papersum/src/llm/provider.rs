use std::sync::Arc;

use crate::config::{parse_llm_provider_model, LlmConfig};
use crate::error::{PapersumError, Result};
use crate::llm::api::LlmApiClient;

const SYSTEM_PROMPT: &str = "You explain research to a general audience. \
Follow the requested output format exactly and add nothing outside it.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmBackend {
    OpenAI,
    OpenRouter,
    Ollama,
    LmStudio,
    Gemini,
    OpenAICompatible { base_url: String },
    Unavailable { reason: String },
}

impl LlmBackend {
    fn from_prefix(prefix: &str, config: &LlmConfig) -> Self {
        match prefix.to_lowercase().as_str() {
            "openai" => Self::OpenAI,
            "openrouter" => Self::OpenRouter,
            "ollama" => Self::Ollama,
            "lmstudio" => Self::LmStudio,
            "gemini" => Self::Gemini,
            _ => match &config.base_url {
                Some(base_url) => Self::OpenAICompatible {
                    base_url: base_url.clone(),
                },
                None => Self::Unavailable {
                    reason: format!("Unknown provider in model: {}", config.model),
                },
            },
        }
    }

    /// Short provider label, `None` when unavailable.
    pub fn name(&self) -> Option<&'static str> {
        match self {
            Self::OpenAI => Some("openai"),
            Self::OpenRouter => Some("openrouter"),
            Self::Ollama => Some("ollama"),
            Self::LmStudio => Some("lmstudio"),
            Self::Gemini => Some("gemini"),
            Self::OpenAICompatible { .. } => Some("openai-compatible"),
            Self::Unavailable { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CompletionOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

/// The summarization provider: a prompt in, a free-text reply out.
///
/// Configuration is resolved once at construction. A provider that cannot be
/// used (no model, unknown prefix, missing key) stays constructible and fails
/// every call with [`PapersumError::LlmUnavailable`].
#[derive(Clone)]
pub struct LlmProvider {
    backend: LlmBackend,
    config: Option<Arc<LlmConfig>>,
    client: Option<LlmApiClient>,
}

impl std::fmt::Debug for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmProvider")
            .field("backend", &self.backend)
            .field("model", &self.model())
            .finish()
    }
}

impl LlmProvider {
    pub fn new(config: Option<&LlmConfig>) -> Self {
        let Some(config) = config else {
            return Self::unavailable("LLM_MODEL is not set");
        };

        let (prefix, _) = parse_llm_provider_model(&config.model);
        let backend = LlmBackend::from_prefix(&prefix, config);
        if !matches!(backend, LlmBackend::Unavailable { .. }) {
            match LlmApiClient::new(config) {
                Ok(client) => {
                    return Self {
                        backend,
                        config: Some(Arc::new(config.clone())),
                        client: Some(client),
                    };
                }
                Err(PapersumError::LlmUnavailable(reason)) => {
                    return Self::unavailable_with_config(reason, config);
                }
                Err(e) => {
                    tracing::warn!(error = %e, model = %config.model, "LLM client setup failed");
                    return Self::unavailable_with_config(e.to_string(), config);
                }
            }
        }

        Self {
            backend,
            config: Some(Arc::new(config.clone())),
            client: None,
        }
    }

    pub fn unavailable(reason: &str) -> Self {
        Self {
            backend: LlmBackend::Unavailable {
                reason: reason.to_string(),
            },
            config: None,
            client: None,
        }
    }

    fn unavailable_with_config(reason: String, config: &LlmConfig) -> Self {
        Self {
            backend: LlmBackend::Unavailable { reason },
            config: Some(Arc::new(config.clone())),
            client: None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.client.is_some()
    }

    pub fn backend(&self) -> &LlmBackend {
        &self.backend
    }

    pub fn config(&self) -> Option<&LlmConfig> {
        self.config.as_deref()
    }

    pub fn model(&self) -> Option<&str> {
        self.config.as_deref().map(|c| c.model.as_str())
    }

    /// Send one prompt. Uses the configured temperature unless `options` overrides it.
    pub async fn complete(
        &self,
        prompt: &str,
        options: Option<&CompletionOptions>,
    ) -> Result<String> {
        let client = match (&self.client, &self.backend) {
            (Some(client), _) => client,
            (None, LlmBackend::Unavailable { reason }) => {
                return Err(PapersumError::LlmUnavailable(reason.clone()));
            }
            (None, _) => {
                return Err(PapersumError::LlmUnavailable(
                    "No client available".to_string(),
                ));
            }
        };

        let defaults = CompletionOptions {
            temperature: self.config().and_then(|c| c.temperature),
            max_tokens: None,
        };
        let options = options.unwrap_or(&defaults);

        tracing::debug!(
            model = client.model(),
            prompt_len = prompt.len(),
            "Sending summarization prompt"
        );
        client.complete(prompt, Some(SYSTEM_PROMPT), Some(options)).await
    }
}
