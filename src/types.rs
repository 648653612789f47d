use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::normalize::name::{clean_input, clean_name_for_display};

/// A single spreadsheet cell as read from the source workbook
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    /// Excel serial date (days since 1899-12-30, time as the fraction)
    DateTime(f64),
    Bool(bool),
}

impl CellValue {
    /// Render the cell as trimmed text. Whole numbers lose their `.0` so that
    /// zip codes and phone numbers stored as floats read back as digits.
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.trim().to_string(),
            CellValue::Number(n) if n.is_finite() && n.fract() == 0.0 => format!("{}", *n as i64),
            CellValue::Number(n) => n.to_string(),
            CellValue::DateTime(serial) => excel_serial_to_date(*serial)
                .map(|date| date.format("%m/%d/%Y").to_string())
                .unwrap_or_else(|| serial.to_string()),
            CellValue::Bool(b) => if *b { "TRUE".to_string() } else { "FALSE".to_string() },
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            CellValue::Number(n) | CellValue::DateTime(n) => n.is_nan(),
            CellValue::Bool(_) => false,
        }
    }
}

fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_signed(Duration::days(serial.floor() as i64))
}

/// One source row, with the columns the cleaner cares about pulled out as text
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactRecord {
    /// 0-based position of the row within the source data (header excluded)
    pub row_index: usize,
    pub contact_name: String,
    pub customer_name: String,
    pub email: String,
    pub phone: Option<CellValue>,
    pub salesperson: String,
    pub business_type: String,
    pub address_1: String,
    pub address_2: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    /// Delivery and pick-up notes, used to route survey rows to a store
    pub del: String,
    pub pu: String,
}

/// The three noisy fields a person name is resolved from
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NameInput {
    pub contact_name: Option<String>,
    pub customer_name: Option<String>,
    pub email: Option<String>,
}

impl NameInput {
    /// Build an input, turning blanks and null sentinels (`nan`, `none`, `null`, `fff`) into `None`.
    pub fn new(contact_name: &str, customer_name: &str, email: &str) -> Self {
        Self {
            contact_name: clean_input(contact_name),
            customer_name: clean_input(customer_name),
            email: clean_input(email),
        }
    }

    pub fn from_record(record: &ContactRecord, cleaned_email: Option<&str>) -> Self {
        Self::new(
            &record.contact_name,
            &record.customer_name,
            cleaned_email.unwrap_or(&record.email),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.contact_name.is_none() && self.customer_name.is_none() && self.email.is_none()
    }
}

/// Which tier of the cascade produced a name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMethod {
    RemoteLlm,
    LocalLlm,
    RuleBased,
    Failed,
}

impl ResolutionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionMethod::RemoteLlm => "remote_llm",
            ResolutionMethod::LocalLlm => "local_llm",
            ResolutionMethod::RuleBased => "rule_based",
            ResolutionMethod::Failed => "failed",
        }
    }

    /// Default confidence assigned to a successful result from this tier
    pub fn base_confidence(&self) -> f64 {
        match self {
            ResolutionMethod::RemoteLlm => 0.9,
            ResolutionMethod::LocalLlm => 0.7,
            ResolutionMethod::RuleBased => 0.5,
            ResolutionMethod::Failed => 0.0,
        }
    }
}

impl fmt::Display for ResolutionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of name resolution for one record.
///
/// A last name never appears without a first name: the constructor promotes a
/// lone last name into the first-name slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NameResult {
    first_name: Option<String>,
    last_name: Option<String>,
    confidence: f64,
    method: ResolutionMethod,
}

impl NameResult {
    pub fn new(
        first_name: Option<String>,
        last_name: Option<String>,
        confidence: f64,
        method: ResolutionMethod,
    ) -> Self {
        let first = first_name.as_deref().and_then(clean_name_for_display);
        let last = last_name.as_deref().and_then(clean_name_for_display);
        let (first_name, last_name) = match (first, last) {
            (None, Some(last)) => (Some(last), None),
            pair => pair,
        };
        Self {
            first_name,
            last_name,
            confidence: confidence.clamp(0.0, 1.0),
            method,
        }
    }

    /// Result of a tier with the tier's default confidence
    pub fn from_tier(first_name: Option<String>, last_name: Option<String>, method: ResolutionMethod) -> Self {
        Self::new(first_name, last_name, method.base_confidence(), method)
    }

    pub fn failed() -> Self {
        Self::new(None, None, 0.0, ResolutionMethod::Failed)
    }

    pub fn first_name(&self) -> Option<&str> {
        self.first_name.as_deref()
    }

    pub fn last_name(&self) -> Option<&str> {
        self.last_name.as_deref()
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn method(&self) -> ResolutionMethod {
        self.method
    }

    pub fn has_any_name(&self) -> bool {
        self.first_name.is_some() || self.last_name.is_some()
    }

    pub fn is_complete(&self) -> bool {
        self.first_name.is_some() && self.last_name.is_some()
    }

    /// Copy with the last name removed and confidence scaled down.
    pub(crate) fn without_last_name(&self, penalty: f64) -> Self {
        Self {
            first_name: self.first_name.clone(),
            last_name: None,
            confidence: (self.confidence * penalty).clamp(0.0, 1.0),
            method: self.method,
        }
    }
}

/// Why a row was left out of the cleaned export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalReason {
    AccountsReceivableSalesperson,
    InvalidEmail,
    MissingValidPersonNames,
    DuplicateEmail,
}

impl RemovalReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemovalReason::AccountsReceivableSalesperson => "accounts_receivable_salesperson",
            RemovalReason::InvalidEmail => "invalid_email",
            RemovalReason::MissingValidPersonNames => "missing_valid_person_names",
            RemovalReason::DuplicateEmail => "duplicate_email",
        }
    }

    pub fn all() -> [RemovalReason; 4] {
        [
            RemovalReason::AccountsReceivableSalesperson,
            RemovalReason::InvalidEmail,
            RemovalReason::MissingValidPersonNames,
            RemovalReason::DuplicateEmail,
        ]
    }
}

impl fmt::Display for RemovalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-run counters for the name resolution engine
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProcessingStats {
    pub total: usize,
    pub remote_llm: usize,
    pub local_llm: usize,
    pub rule_based: usize,
    /// LLM tier calls that failed after retries, plus rows no tier resolved
    pub errors: usize,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl ProcessingStats {
    pub fn start(&mut self) {
        *self = Self {
            started_at: Some(Utc::now()),
            ..Self::default()
        };
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn record(&mut self, method: ResolutionMethod) {
        self.total += 1;
        match method {
            ResolutionMethod::RemoteLlm => self.remote_llm += 1,
            ResolutionMethod::LocalLlm => self.local_llm += 1,
            ResolutionMethod::RuleBased => self.rule_based += 1,
            ResolutionMethod::Failed => self.errors += 1,
        }
    }

    pub fn record_tier_error(&mut self) {
        self.errors += 1;
    }

    pub fn duration_secs(&self) -> f64 {
        match (self.started_at, self.finished_at) {
            (Some(start), Some(end)) => (end - start).num_milliseconds() as f64 / 1000.0,
            _ => 0.0,
        }
    }

    /// Share of records resolved by either LLM tier
    pub fn llm_share(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.remote_llm + self.local_llm) as f64 / self.total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_value_renders_whole_numbers_without_decimal() {
        assert_eq!(CellValue::Number(4085063875.0).as_text(), "4085063875");
        assert_eq!(CellValue::Number(95035.0).as_text(), "95035");
        assert_eq!(CellValue::Number(1.5).as_text(), "1.5");
        assert_eq!(CellValue::Text("  hi ".into()).as_text(), "hi");
        assert!(CellValue::Text("   ".into()).is_empty());
    }

    #[test]
    fn test_date_cells_render_as_dates() {
        assert_eq!(CellValue::DateTime(45842.0).as_text(), "07/04/2025");
        assert_eq!(CellValue::DateTime(45842.75).as_text(), "07/04/2025");
        assert!(!CellValue::DateTime(45842.0).is_empty());
    }

    #[test]
    fn test_name_result_promotes_lone_last_name() {
        let result = NameResult::new(None, Some("SMITH".into()), 0.9, ResolutionMethod::RemoteLlm);
        assert_eq!(result.first_name(), Some("Smith"));
        assert_eq!(result.last_name(), None);
    }

    #[test]
    fn test_name_result_null_sentinels_become_none() {
        let result = NameResult::new(Some("null".into()), Some("  ".into()), 0.7, ResolutionMethod::LocalLlm);
        assert!(!result.has_any_name());

        let result = NameResult::new(Some("None".into()), Some("nan".into()), 0.7, ResolutionMethod::LocalLlm);
        assert!(!result.has_any_name());
    }

    #[test]
    fn test_name_input_cleans_sentinels() {
        let input = NameInput::new("nan", " ", "FFF");
        assert!(input.is_empty());
    }

    #[test]
    fn test_processing_stats_counts_by_method() {
        let mut stats = ProcessingStats::default();
        stats.start();
        stats.record(ResolutionMethod::RemoteLlm);
        stats.record(ResolutionMethod::RuleBased);
        stats.record(ResolutionMethod::RuleBased);
        stats.finish();

        assert_eq!(stats.total, 3);
        assert_eq!(stats.remote_llm, 1);
        assert_eq!(stats.rule_based, 2);
        assert!((stats.llm_share() - 1.0 / 3.0).abs() < 1e-9);
    }
}
