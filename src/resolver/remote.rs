use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use super::prompt::build_name_prompt;
use super::response::{parse_strict, ParsedName};
use super::LlmClient;
use crate::config::LlmConfig;
use crate::error::{CleanerError, Result};
use crate::types::{NameInput, ResolutionMethod};

/// OpenAI-compatible chat-completions client for the remote tier
pub struct OpenAiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f64,
}

impl OpenAiClient {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key = config
            .openai_api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| CleanerError::Config("Missing API key for the remote LLM".to_string()))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.remote_timeout_seconds))
            .build()?;
        Ok(Self {
            client,
            api_key,
            base_url: config.openai_base_url.clone(),
            model: config.openai_model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    fn endpoint(&self) -> String {
        if self.base_url.ends_with('/') {
            format!("{}chat/completions", self.base_url)
        } else {
            format!("{}/chat/completions", self.base_url)
        }
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    fn tier(&self) -> ResolutionMethod {
        ResolutionMethod::RemoteLlm
    }

    async fn parse_name(&self, input: &NameInput) -> Result<ParsedName> {
        let body = json!({
            "model": self.model,
            "messages": [
                {
                    "role": "user",
                    "content": build_name_prompt(input)
                }
            ],
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
        });

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| CleanerError::RemoteLlm(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(CleanerError::RemoteLlm(format!("API error ({}): {}", status, text)));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| CleanerError::RemoteLlm(format!("Failed to parse JSON: {}", e)))?;

        let content = json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| CleanerError::RemoteLlm("Invalid response format".to_string()))?;
        debug!(content, "Remote LLM response");

        let mut parsed = parse_strict(content).map_err(CleanerError::RemoteLlm)?;
        parsed.tokens_used = json["usage"]["total_tokens"].as_u64();
        Ok(parsed)
    }
}
