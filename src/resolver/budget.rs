use chrono::{Datelike, Utc};
use tracing::{info, warn};

use crate::config::BudgetConfig;
use crate::metrics::ContactMetrics;

/// Tracks remote LLM spend for the current calendar month.
#[derive(Debug, Clone)]
pub struct BudgetMonitor {
    monthly_budget: f64,
    alert_threshold: f64,
    cost_per_1k_tokens: f64,
    est_tokens_per_call: u32,
    current_month_cost: f64,
    /// (year, month) the running total belongs to
    current_month: (i32, u32),
}

impl BudgetMonitor {
    pub fn new(config: &BudgetConfig) -> Self {
        Self {
            monthly_budget: config.monthly_budget,
            alert_threshold: config.alert_threshold,
            cost_per_1k_tokens: config.cost_per_1k_tokens,
            est_tokens_per_call: config.est_tokens_per_call,
            current_month_cost: 0.0,
            current_month: Self::this_month(),
        }
    }

    fn this_month() -> (i32, u32) {
        let now = Utc::now();
        (now.year(), now.month())
    }

    fn roll_month(&mut self, month: (i32, u32)) {
        if self.current_month != month {
            info!("New billing month, resetting LLM spend");
            self.current_month_cost = 0.0;
            self.current_month = month;
        }
    }

    /// Spend ceiling at which the remote tier stops being used
    pub fn limit(&self) -> f64 {
        self.monthly_budget * self.alert_threshold
    }

    pub fn current_cost(&self) -> f64 {
        self.current_month_cost
    }

    /// Cost of one call before its real token usage is known
    pub fn estimated_call_cost(&self) -> f64 {
        self.cost_for_tokens(self.est_tokens_per_call as u64)
    }

    pub fn cost_for_tokens(&self, tokens: u64) -> f64 {
        tokens as f64 / 1000.0 * self.cost_per_1k_tokens
    }

    /// Can a call costing `estimated_cost` proceed within budget?
    pub fn check(&mut self, estimated_cost: f64) -> bool {
        self.roll_month(Self::this_month());
        if self.current_month_cost + estimated_cost > self.limit() {
            warn!(
                "Budget threshold reached: ${:.4}/{:.2}",
                self.current_month_cost, self.monthly_budget
            );
            return false;
        }
        true
    }

    pub fn add_cost(&mut self, cost: f64) {
        self.current_month_cost += cost;
        ContactMetrics::record_budget_spend(self.current_month_cost);
        tracing::debug!(
            "Current month cost: ${:.4}/{:.2}",
            self.current_month_cost, self.monthly_budget
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor(budget: f64) -> BudgetMonitor {
        BudgetMonitor::new(&BudgetConfig {
            monthly_budget: budget,
            alert_threshold: 0.8,
            cost_per_1k_tokens: 0.5,
            est_tokens_per_call: 1000,
        })
    }

    #[test]
    fn test_budget_allows_until_threshold() {
        let mut budget = monitor(10.0);
        assert!((budget.limit() - 8.0).abs() < 1e-9);
        assert!((budget.estimated_call_cost() - 0.5).abs() < 1e-9);

        assert!(budget.check(0.5));
        budget.add_cost(7.5);
        assert!(budget.check(0.5));
        budget.add_cost(0.5);
        assert!(!budget.check(0.5));
    }

    #[test]
    fn test_zero_budget_refuses_everything() {
        let mut budget = monitor(0.0);
        assert!(!budget.check(0.0001));
    }

    #[test]
    fn test_month_rollover_resets_spend() {
        let mut budget = monitor(1.0);
        budget.add_cost(5.0);
        budget.current_month = (1999, 1);
        assert!(budget.check(0.1));
        assert_eq!(budget.current_cost(), 0.0);
    }
}
