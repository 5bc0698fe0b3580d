//! Text-refinement client
//!
//! Sends reviewer text to an OpenAI-compatible chat-completions endpoint and
//! returns the first choice. The result is only shown to the reviewer; it is
//! never written into an annotation field. No retries.

use async_trait::async_trait;
use lsr_common::config::RefinerConfig;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

/// System prompt for the sentence refiner
pub const REFINE_PROMPT: &str = "Refine the sentences. Please only output the refined content.";

/// System prompt for free-form requests
pub const ASSISTANT_PROMPT: &str = "You are a helpful assistant.";

const USER_AGENT: &str = concat!("lsr-review/", env!("CARGO_PKG_VERSION"));
const TEMPERATURE: f64 = 0.7;

/// Refinement errors
#[derive(Debug, Error)]
pub enum RefineError {
    #[error("Refinement API key not configured")]
    NotConfigured,

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Empty response from model")]
    EmptyResponse,
}

/// Plain text in, plain text out
#[async_trait]
pub trait TextRefiner: Send + Sync {
    async fn refine(&self, text: &str, system_prompt: &str) -> Result<String, RefineError>;
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// Chat-completions client
pub struct OpenAiRefiner {
    http_client: reqwest::Client,
    config: RefinerConfig,
}

impl OpenAiRefiner {
    pub fn new(config: RefinerConfig) -> Result<Self, RefineError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RefineError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            config,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.api_base.trim_end_matches('/'))
    }
}

#[async_trait]
impl TextRefiner for OpenAiRefiner {
    async fn refine(&self, text: &str, system_prompt: &str) -> Result<String, RefineError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| lsr_common::config::is_valid_secret(k))
            .ok_or(RefineError::NotConfigured)?;

        let body = json!({
            "model": self.config.model,
            "temperature": TEMPERATURE,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": text},
            ],
        });

        tracing::debug!(model = %self.config.model, chars = text.len(), "Requesting refinement");

        let response = self
            .http_client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| RefineError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(RefineError::Api(status.as_u16(), error_text));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| RefineError::Parse(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(RefineError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let refiner = OpenAiRefiner::new(RefinerConfig {
            api_base: "http://localhost:8080/v1/".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(refiner.endpoint(), "http://localhost:8080/v1/chat/completions");
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_network() {
        let refiner = OpenAiRefiner::new(RefinerConfig::default()).unwrap();
        let err = refiner.refine("text", REFINE_PROMPT).await.unwrap_err();
        assert!(matches!(err, RefineError::NotConfigured));
    }

    #[test]
    fn test_completion_parsing() {
        let parsed: ChatCompletionResponse = serde_json::from_str(
            r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"Better."}}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("Better."));
    }
}
