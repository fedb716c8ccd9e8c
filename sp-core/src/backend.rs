use async_trait::async_trait;

/// Boundary to the text-generation service: one prompt in, raw text out.
#[async_trait]
pub trait TextBackend: Send + Sync {
    async fn complete(&self, prompt: &str) -> sp_llm::Result<String>;
}

#[async_trait]
impl TextBackend for sp_llm::FallbackClient {
    async fn complete(&self, prompt: &str) -> sp_llm::Result<String> {
        sp_llm::FallbackClient::complete(self, prompt).await
    }
}

#[async_trait]
impl TextBackend for sp_llm::LlmClient {
    async fn complete(&self, prompt: &str) -> sp_llm::Result<String> {
        sp_llm::LlmClient::complete(self, prompt).await
    }
}

/// Usage-counter collaborator; bumped exactly once per successful backend
/// call, never for attempts the rate limiter refused.
pub trait UsageSink {
    fn record_call(&mut self);
}
