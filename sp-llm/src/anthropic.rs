use crate::error::{LlmError, Result};
use serde::{Deserialize, Serialize};

const ANTHROPIC_MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 1024;

#[derive(Clone)]
pub struct AnthropicClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl AnthropicClient {
    pub fn new(http: reqwest::Client, api_key: &str, model: &str) -> Self {
        Self {
            http,
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }

    #[tracing::instrument(level = "info", skip_all)]
    pub async fn complete(&self, prompt: &str) -> Result<String> {
        let req = AnthropicRequest::new(&self.model, prompt);

        let response = self
            .http
            .post(ANTHROPIC_MESSAGES_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&req)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(LlmError::Http(format!(
                "anthropic messages status={status} body={body}"
            )));
        }

        let parsed: AnthropicResponse = serde_json::from_str(&body)?;
        parsed.into_text()
    }
}

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<AnthropicMessage>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

impl AnthropicRequest {
    fn new(model: &str, prompt: &str) -> Self {
        Self {
            model: model.to_string(),
            max_tokens: MAX_TOKENS,
            messages: vec![AnthropicMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        }
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum AnthropicContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

impl AnthropicResponse {
    fn into_text(self) -> Result<String> {
        let mut out = String::new();
        for block in self.content {
            if let AnthropicContentBlock::Text { text } = block {
                out.push_str(&text);
            }
        }
        if out.is_empty() {
            return Err(LlmError::ResponseFormat(
                "anthropic response had no text blocks".to_string(),
            ));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_blocks_are_concatenated() {
        let body = r#"{"content":[{"type":"text","text":"ls "},{"type":"text","text":"-la"}]}"#;
        let parsed: AnthropicResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.into_text().unwrap(), "ls -la");
    }

    #[test]
    fn non_text_blocks_are_ignored() {
        let body = r#"{"content":[{"type":"thinking","thinking":"hm"},{"type":"text","text":"pwd"}]}"#;
        let parsed: AnthropicResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.into_text().unwrap(), "pwd");
    }
}
