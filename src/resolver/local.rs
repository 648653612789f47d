use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use super::prompt::build_name_prompt;
use super::response::{parse_embedded, ParsedName};
use super::LlmClient;
use crate::config::LlmConfig;
use crate::error::{CleanerError, Result};
use crate::types::{NameInput, ResolutionMethod};

const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Serialize)]
struct OllamaGenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
    /// Empty so no conversation state leaks between rows
    context: Vec<i64>,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f64,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct OllamaGenerateResponse {
    #[serde(default)]
    response: String,
}

/// Client for a locally hosted Ollama model
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f64,
}

impl OllamaClient {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.local_timeout_seconds))
            .build()?;
        Ok(Self {
            client,
            base_url: config.ollama_base_url.trim_end_matches('/').to_string(),
            model: config.ollama_model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    fn tier(&self) -> ResolutionMethod {
        ResolutionMethod::LocalLlm
    }

    async fn parse_name(&self, input: &NameInput) -> Result<ParsedName> {
        let request = OllamaGenerateRequest {
            model: self.model.clone(),
            prompt: build_name_prompt(input),
            stream: false,
            context: Vec::new(),
            options: OllamaOptions {
                temperature: self.temperature,
                num_predict: self.max_tokens,
            },
        };

        let url = self.url("api/generate");
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| CleanerError::LocalLlm(format!("Failed to call {}: {}", url, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(CleanerError::LocalLlm(format!(
                "Local LLM returned error {}: {}",
                status, error_text
            )));
        }

        let generated: OllamaGenerateResponse = response
            .json()
            .await
            .map_err(|e| CleanerError::LocalLlm(format!("Failed to parse response: {}", e)))?;
        debug!(response = %generated.response, "Local LLM response");

        parse_embedded(&generated.response).map_err(CleanerError::LocalLlm)
    }

    async fn health_check(&self) -> bool {
        let result = self
            .client
            .get(self.url("api/tags"))
            .timeout(HEALTH_CHECK_TIMEOUT)
            .send()
            .await;
        match result {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                warn!("Local LLM health check returned {}", response.status());
                false
            }
            Err(e) => {
                warn!("Local LLM not reachable at {}: {}", self.base_url, e);
                false
            }
        }
    }
}
