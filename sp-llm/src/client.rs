use crate::anthropic::AnthropicClient;
use crate::error::{LlmError, Result};
use crate::openai::OpenAiClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenAI,
    Anthropic,
}

#[derive(Clone)]
pub struct LlmClient {
    provider: Provider,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl LlmClient {
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn new(api_key: &str, model: &str) -> Self {
        let provider = detect_provider(model);
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(%e, "reqwest client build failed; falling back to default client");
                reqwest::Client::new()
            });
        Self {
            provider,
            api_key: api_key.to_string(),
            model: model.to_string(),
            client,
        }
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    #[tracing::instrument(level = "info", skip_all, fields(model = %self.model))]
    pub async fn complete(&self, prompt: &str) -> Result<String> {
        if prompt.trim().is_empty() {
            return Err(LlmError::InvalidInput("prompt must not be empty".to_string()));
        }
        match self.provider {
            Provider::OpenAI => {
                let c = OpenAiClient::new(self.client.clone(), &self.api_key, &self.model);
                c.complete(prompt).await
            }
            Provider::Anthropic => {
                let c = AnthropicClient::new(self.client.clone(), &self.api_key, &self.model);
                c.complete(prompt).await
            }
        }
    }
}

/// Ordered list of model candidates, tried in sequence until one responds.
///
/// Stops at the first success; if every candidate fails, the last error is
/// surfaced.
#[derive(Clone)]
pub struct FallbackClient {
    candidates: Vec<LlmClient>,
}

impl FallbackClient {
    pub fn new(candidates: Vec<LlmClient>) -> Result<Self> {
        if candidates.is_empty() {
            return Err(LlmError::InvalidInput(
                "at least one model candidate is required".to_string(),
            ));
        }
        Ok(Self { candidates })
    }

    pub fn models(&self) -> Vec<&str> {
        self.candidates.iter().map(|c| c.model()).collect()
    }

    #[tracing::instrument(level = "info", skip_all)]
    pub async fn complete(&self, prompt: &str) -> Result<String> {
        let mut last_err = None;
        for candidate in &self.candidates {
            match candidate.complete(prompt).await {
                Ok(text) => return Ok(text),
                Err(e) => {
                    tracing::warn!(model = %candidate.model(), error = %e, "model candidate failed");
                    last_err = Some(e);
                }
            }
        }
        Err(match last_err {
            Some(e) => LlmError::Unavailable(e.to_string()),
            None => LlmError::Unavailable("no model candidates configured".to_string()),
        })
    }
}

pub fn detect_provider(model: &str) -> Provider {
    let m = model.to_ascii_lowercase();
    if m.starts_with("claude-") {
        return Provider::Anthropic;
    }
    Provider::OpenAI
}
