use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{CleanerError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub llm: LlmConfig,
    pub budget: BudgetConfig,
    pub processing: ProcessingConfig,
    pub uncertainty: UncertaintyConfig,
    pub output: OutputConfig,
    pub input: InputConfig,
    pub survey: SurveyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub enable_remote: bool,
    pub enable_local: bool,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: String,
    pub ollama_base_url: String,
    pub ollama_model: String,
    pub max_tokens: u32,
    pub temperature: f64,
    pub remote_timeout_seconds: u64,
    pub local_timeout_seconds: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enable_remote: true,
            enable_local: true,
            openai_api_key: None,
            openai_model: "gpt-4o-mini".to_string(),
            openai_base_url: "https://api.openai.com/v1".to_string(),
            ollama_base_url: "http://localhost:11434".to_string(),
            ollama_model: "qwen2.5:7b-instruct-q4_K_M".to_string(),
            max_tokens: 150,
            temperature: 0.1,
            remote_timeout_seconds: 30,
            local_timeout_seconds: 60,
            max_retries: 3,
            retry_delay_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetConfig {
    pub monthly_budget: f64,
    pub alert_threshold: f64,
    pub cost_per_1k_tokens: f64,
    /// Prompt plus completion tokens assumed per remote call when estimating spend
    pub est_tokens_per_call: u32,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            monthly_budget: 10.0,
            alert_threshold: 0.8,
            cost_per_1k_tokens: 0.00015,
            est_tokens_per_call: 600,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    pub batch_size: usize,
    pub show_progress: bool,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            batch_size: 50,
            show_progress: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UncertaintyConfig {
    pub enabled: bool,
    pub low_confidence_threshold: f64,
    pub very_low_confidence_threshold: f64,
}

impl Default for UncertaintyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            low_confidence_threshold: 0.6,
            very_low_confidence_threshold: 0.4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub output_directory: String,
    pub write_summary: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_directory: "output".to_string(),
            write_summary: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Sheet to read; the first sheet when unset
    pub sheet_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SurveyConfig {
    /// Salespeople whose rows are always routed to the Dublin store
    pub dublin_salespeople: Vec<String>,
}

impl Default for SurveyConfig {
    fn default() -> Self {
        Self {
            dublin_salespeople: vec!["Mark Pringle".to_string(), "Cindy Foster".to_string()],
        }
    }
}

impl Config {
    /// Load configuration: file (JSON, or TOML by extension) if given, then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            CleanerError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;

        let is_toml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("toml"))
            .unwrap_or(false);

        let config: Config = if is_toml {
            toml::from_str(&content)?
        } else {
            serde_json::from_str(&content)?
        };
        info!(path = %path.display(), "Loaded configuration file");
        Ok(config)
    }

    /// Apply environment-style overrides from `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("OPENAI_API_KEY") {
            self.llm.openai_api_key = Some(v);
        }
        if let Some(v) = get("OPENAI_MODEL") {
            self.llm.openai_model = v;
        }
        if let Some(v) = get("OPENAI_BASE_URL") {
            self.llm.openai_base_url = v;
        }
        if let Some(v) = get("OLLAMA_BASE_URL") {
            self.llm.ollama_base_url = v;
        }
        if let Some(v) = get("OLLAMA_MODEL") {
            self.llm.ollama_model = v;
        }
        if let Some(v) = get("MONTHLY_BUDGET").and_then(|v| v.trim().parse().ok()) {
            self.budget.monthly_budget = v;
        }
        if let Some(v) = get("BATCH_SIZE").and_then(|v| v.trim().parse().ok()) {
            self.processing.batch_size = v;
        }
        if let Some(v) = get("LOW_CONFIDENCE_THRESHOLD").and_then(|v| v.trim().parse().ok()) {
            self.uncertainty.low_confidence_threshold = v;
        }
        if let Some(v) = get("VERY_LOW_CONFIDENCE_THRESHOLD").and_then(|v| v.trim().parse().ok()) {
            self.uncertainty.very_low_confidence_threshold = v;
        }
        if let Some(v) = get("OUTPUT_DIRECTORY") {
            self.output.output_directory = v;
        }
        debug!("Applied environment overrides");
    }

    /// Collect every validation problem instead of stopping at the first.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            errors.push(format!("llm.temperature must be between 0 and 2, got {}", self.llm.temperature));
        }
        if self.llm.max_tokens == 0 {
            errors.push("llm.max_tokens must be positive".to_string());
        }
        if self.llm.remote_timeout_seconds == 0 || self.llm.local_timeout_seconds == 0 {
            errors.push("llm timeouts must be positive".to_string());
        }
        if self.budget.monthly_budget < 0.0 {
            errors.push("budget.monthly_budget must not be negative".to_string());
        }
        if !(0.0..=1.0).contains(&self.budget.alert_threshold) {
            errors.push("budget.alert_threshold must be between 0 and 1".to_string());
        }
        if self.budget.cost_per_1k_tokens < 0.0 {
            errors.push("budget.cost_per_1k_tokens must not be negative".to_string());
        }
        if self.processing.batch_size == 0 {
            errors.push("processing.batch_size must be positive".to_string());
        }
        let low = self.uncertainty.low_confidence_threshold;
        let very_low = self.uncertainty.very_low_confidence_threshold;
        if !(0.0..=1.0).contains(&low) || !(0.0..=1.0).contains(&very_low) {
            errors.push("uncertainty thresholds must be between 0 and 1".to_string());
        } else if very_low > low {
            errors.push(format!(
                "uncertainty.very_low_confidence_threshold ({}) must not exceed low_confidence_threshold ({})",
                very_low, low
            ));
        }
        if self.output.output_directory.trim().is_empty() {
            errors.push("output.output_directory must not be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(CleanerError::ConfigValidation(errors))
        }
    }

    /// True when a remote API key is configured and the remote tier is enabled.
    pub fn remote_llm_available(&self) -> bool {
        self.llm.enable_remote
            && self
                .llm
                .openai_api_key
                .as_deref()
                .map(|k| !k.trim().is_empty())
                .unwrap_or(false)
    }
}
