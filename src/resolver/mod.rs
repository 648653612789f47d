//! Three-tier name resolution: remote LLM, then local LLM, then rules.

pub mod budget;
pub mod local;
pub mod prompt;
pub mod remote;
pub mod response;
pub mod rules;

use async_trait::async_trait;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::metrics::ContactMetrics;
use crate::normalize::business::{is_company_name, is_valid_last_name};
use crate::types::{NameInput, NameResult, ProcessingStats, ResolutionMethod};

pub use budget::BudgetMonitor;
pub use local::OllamaClient;
pub use remote::OpenAiClient;
pub use response::ParsedName;
pub use rules::resolve_with_rules;

/// Confidence multiplier applied when a tier's last name is thrown out
const INVALID_LAST_NAME_PENALTY: f64 = 0.8;

/// Rows in a row a tier may fail before it is switched off for the run
const MAX_CONSECUTIVE_TIER_FAILURES: u32 = 3;

/// Model-backed name extraction for one tier of the cascade
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Tier this client serves
    fn tier(&self) -> ResolutionMethod;

    /// Ask the model for a name. Any transport, status or decoding problem is an error.
    async fn parse_name(&self, input: &NameInput) -> Result<ParsedName>;

    /// Cheap reachability probe run once before processing
    async fn health_check(&self) -> bool {
        true
    }
}

/// Mutable per-run state of the engine, threaded through every call
#[derive(Debug)]
pub struct EngineState {
    pub budget: BudgetMonitor,
    pub stats: ProcessingStats,
    /// Remote tier switched off for the rest of the run (budget or repeated failure)
    pub remote_disabled: bool,
    /// Local tier switched off for the rest of the run (health check or repeated failure)
    pub local_disabled: bool,
    remote_failures: u32,
    local_failures: u32,
}

impl EngineState {
    pub fn new(budget: BudgetMonitor) -> Self {
        let mut stats = ProcessingStats::default();
        stats.start();
        Self {
            budget,
            stats,
            remote_disabled: false,
            local_disabled: false,
            remote_failures: 0,
            local_failures: 0,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(BudgetMonitor::new(&config.budget))
    }

    fn is_disabled(&self, tier: ResolutionMethod) -> bool {
        match tier {
            ResolutionMethod::RemoteLlm => self.remote_disabled,
            ResolutionMethod::LocalLlm => self.local_disabled,
            _ => false,
        }
    }

    fn record_tier_success(&mut self, tier: ResolutionMethod) {
        match tier {
            ResolutionMethod::RemoteLlm => self.remote_failures = 0,
            ResolutionMethod::LocalLlm => self.local_failures = 0,
            _ => {}
        }
    }

    fn record_tier_failure(&mut self, tier: ResolutionMethod) {
        let (failures, disabled) = match tier {
            ResolutionMethod::RemoteLlm => (&mut self.remote_failures, &mut self.remote_disabled),
            ResolutionMethod::LocalLlm => (&mut self.local_failures, &mut self.local_disabled),
            _ => return,
        };
        *failures += 1;
        if *failures >= MAX_CONSECUTIVE_TIER_FAILURES && !*disabled {
            warn!(tier = %tier, "Tier failed {} rows in a row, disabling it for this run", failures);
            *disabled = true;
        }
    }
}

/// Retry policy for a single tier call
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_millis(1000),
        }
    }
}

/// Resolves person names through the tier cascade
pub struct NameResolver {
    remote: Option<Box<dyn LlmClient>>,
    local: Option<Box<dyn LlmClient>>,
    retry: RetryPolicy,
}

impl NameResolver {
    pub fn new(
        remote: Option<Box<dyn LlmClient>>,
        local: Option<Box<dyn LlmClient>>,
        retry: RetryPolicy,
    ) -> Self {
        Self { remote, local, retry }
    }

    /// Rules only; used when no LLM is configured
    pub fn rules_only() -> Self {
        Self::new(None, None, RetryPolicy::default())
    }

    /// Build the tiers the configuration enables.
    pub fn from_config(config: &Config) -> Result<Self> {
        let remote: Option<Box<dyn LlmClient>> = if config.remote_llm_available() {
            Some(Box::new(OpenAiClient::new(&config.llm)?))
        } else {
            info!("Remote LLM tier disabled (no API key or switched off)");
            None
        };
        let local: Option<Box<dyn LlmClient>> = if config.llm.enable_local {
            Some(Box::new(OllamaClient::new(&config.llm)?))
        } else {
            None
        };
        let retry = RetryPolicy {
            max_attempts: config.llm.max_retries.max(1),
            delay: Duration::from_millis(config.llm.retry_delay_ms),
        };
        Ok(Self::new(remote, local, retry))
    }

    /// Probe the configured tiers and switch off the unreachable ones.
    pub async fn health_check(&self, state: &mut EngineState) {
        if let Some(local) = &self.local {
            if local.health_check().await {
                info!("Local LLM tier available");
            } else {
                warn!("Local LLM tier unavailable, falling back to rules when remote fails");
                state.local_disabled = true;
            }
        }
        if let Some(remote) = &self.remote {
            if !remote.health_check().await {
                state.remote_disabled = true;
            }
        }
    }

    /// Names of the tiers that will be attempted, for startup output
    pub fn active_tiers(&self, state: &EngineState) -> Vec<ResolutionMethod> {
        let mut tiers = Vec::new();
        if self.remote.is_some() && !state.remote_disabled {
            tiers.push(ResolutionMethod::RemoteLlm);
        }
        if self.local.is_some() && !state.local_disabled {
            tiers.push(ResolutionMethod::LocalLlm);
        }
        tiers.push(ResolutionMethod::RuleBased);
        tiers
    }

    /// Resolve one record. Always returns a result; tier failures fall through.
    pub async fn resolve(&self, state: &mut EngineState, input: &NameInput) -> NameResult {
        let result = self.cascade(state, input).await;
        state.stats.record(result.method());
        ContactMetrics::record_resolution(result.method());
        debug!(
            method = %result.method(),
            first = ?result.first_name(),
            last = ?result.last_name(),
            confidence = result.confidence(),
            "Resolved name"
        );
        result
    }

    async fn cascade(&self, state: &mut EngineState, input: &NameInput) -> NameResult {
        if input.is_empty() {
            return resolve_with_rules(input);
        }

        if let Some(remote) = self.remote.as_deref() {
            if self.remote_allowed(state) {
                if let Some(result) = self.try_tier(state, remote, input).await {
                    return result;
                }
            }
        }

        if let Some(local) = self.local.as_deref() {
            if !state.is_disabled(ResolutionMethod::LocalLlm) {
                if let Some(result) = self.try_tier(state, local, input).await {
                    return result;
                }
            }
        }

        validate_result(resolve_with_rules(input))
    }

    fn remote_allowed(&self, state: &mut EngineState) -> bool {
        if state.remote_disabled {
            return false;
        }
        let estimate = state.budget.estimated_call_cost();
        if !state.budget.check(estimate) {
            warn!("Monthly LLM budget exhausted, remote tier disabled for the rest of the run");
            state.remote_disabled = true;
            return false;
        }
        true
    }

    async fn try_tier(
        &self,
        state: &mut EngineState,
        client: &dyn LlmClient,
        input: &NameInput,
    ) -> Option<NameResult> {
        let tier = client.tier();
        match self.call_with_retries(client, input).await {
            Ok(parsed) => {
                state.record_tier_success(tier);
                if tier == ResolutionMethod::RemoteLlm {
                    let cost = parsed
                        .tokens_used
                        .map(|tokens| state.budget.cost_for_tokens(tokens))
                        .unwrap_or_else(|| state.budget.estimated_call_cost());
                    state.budget.add_cost(cost);
                }
                Some(validate_result(NameResult::from_tier(parsed.first_name, parsed.last_name, tier)))
            }
            Err(e) => {
                if e.is_recoverable() {
                    warn!(tier = %tier, error = %e, "Tier failed, falling through");
                } else {
                    error!(tier = %tier, error = %e, "Tier failed with an unexpected error, falling through");
                }
                ContactMetrics::record_llm_failure(tier);
                state.record_tier_failure(tier);
                state.stats.record_tier_error();
                None
            }
        }
    }

    async fn call_with_retries(&self, client: &dyn LlmClient, input: &NameInput) -> Result<ParsedName> {
        let attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            let started = Instant::now();
            let outcome = client.parse_name(input).await;
            ContactMetrics::record_llm_latency(client.tier(), started.elapsed().as_secs_f64());
            match outcome {
                Ok(parsed) => return Ok(parsed),
                Err(e) if attempt < attempts => {
                    debug!(tier = %client.tier(), attempt, error = %e, "Retrying tier");
                    attempt += 1;
                    if !self.retry.delay.is_zero() {
                        tokio::time::sleep(self.retry.delay).await;
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Post-hoc check shared by every tier: a business first name voids the
/// result, a business-fragment last name is dropped with a confidence penalty.
pub fn validate_result(result: NameResult) -> NameResult {
    if result.first_name().map(is_company_name).unwrap_or(false) {
        return NameResult::new(None, None, result.confidence(), result.method());
    }
    match result.last_name() {
        Some(last) if !is_valid_last_name(last) => result.without_last_name(INVALID_LAST_NAME_PENALTY),
        _ => result,
    }
}
