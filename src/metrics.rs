//! Metrics for the cleaning run.
//!
//! Everything goes through the `metrics` facade. Without an installed recorder
//! the calls are no-ops, so library code can record unconditionally.

use std::net::SocketAddr;
use tracing::{info, warn};

use crate::types::{RemovalReason, ResolutionMethod};

pub const NAMES_RESOLVED: &str = "contact_cleaner_names_resolved_total";
pub const LLM_FAILURES: &str = "contact_cleaner_llm_failures_total";
pub const LLM_LATENCY: &str = "contact_cleaner_llm_request_duration_seconds";
pub const ROWS_REMOVED: &str = "contact_cleaner_rows_removed_total";
pub const ROWS_EXPORTED: &str = "contact_cleaner_rows_exported_total";
pub const UNCERTAIN_CASES: &str = "contact_cleaner_uncertain_cases_total";
pub const BUDGET_SPEND: &str = "contact_cleaner_budget_spend_dollars";

/// Install the Prometheus exporter when `CONTACT_CLEANER_METRICS_ADDR` is set.
pub fn init_metrics() {
    let addr_str = match std::env::var("CONTACT_CLEANER_METRICS_ADDR") {
        Ok(v) if !v.trim().is_empty() => v,
        _ => return,
    };
    let addr: SocketAddr = match addr_str.parse() {
        Ok(addr) => addr,
        Err(e) => {
            warn!("Invalid metrics addr '{}': {}", addr_str, e);
            return;
        }
    };
    let builder = metrics_exporter_prometheus::PrometheusBuilder::new().with_http_listener(addr);
    match builder.install() {
        Ok(()) => info!("Prometheus exporter listening on http://{}/metrics", addr),
        Err(e) => warn!("Prometheus exporter install failed: {}", e),
    }
}

/// Metrics emitted by the resolver and the row pipeline
pub struct ContactMetrics;

impl ContactMetrics {
    pub fn record_resolution(method: ResolutionMethod) {
        ::metrics::counter!(NAMES_RESOLVED, "method" => method.as_str()).increment(1);
    }

    pub fn record_llm_failure(tier: ResolutionMethod) {
        ::metrics::counter!(LLM_FAILURES, "tier" => tier.as_str()).increment(1);
    }

    pub fn record_llm_latency(tier: ResolutionMethod, duration_secs: f64) {
        ::metrics::histogram!(LLM_LATENCY, "tier" => tier.as_str()).record(duration_secs);
    }

    pub fn record_removal(reason: RemovalReason) {
        ::metrics::counter!(ROWS_REMOVED, "reason" => reason.as_str()).increment(1);
    }

    pub fn record_exported(rows: usize) {
        ::metrics::counter!(ROWS_EXPORTED).increment(rows as u64);
    }

    pub fn record_uncertain_case(case_type: &'static str) {
        ::metrics::counter!(UNCERTAIN_CASES, "type" => case_type).increment(1);
    }

    pub fn record_budget_spend(total_dollars: f64) {
        ::metrics::gauge!(BUDGET_SPEND).set(total_dollars);
    }
}
