//! Uncertainty detection for resolved names.
//!
//! The detector never corrects anything. It records cases a person should look
//! at and reports them at the end of a run.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

use crate::config::UncertaintyConfig;
use crate::metrics::ContactMetrics;
use crate::normalize::business::{has_business_keyword, is_company_name};
use crate::normalize::email::is_generic_mailbox;
use crate::types::{NameInput, NameResult, ResolutionMethod};

static MULTIPLE_NAMES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)&|\band\b|\+").expect("valid regex"));
static HYPHENATED: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+\s*-\s*\w+").expect("valid regex"));
static INITIALS_ONLY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]\.?\s*([A-Z]\.?)?\s*([A-Z]\.?)?$").expect("valid regex"));

/// Contacts this long and in all caps are usually pasted notes, not names
const VERY_LONG_NAME_CHARS: usize = 30;

/// Kind of uncertainty found for a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UncertaintyType {
    VeryLowConfidence,
    LowConfidence,
    NullNames,
    IncompleteName,
    ProcessingFailure,
    BusinessPersonConfusion,
    MultipleNames,
    HyphenatedName,
    InitialsOnly,
    BusinessLikePattern,
    BusinessEmail,
    VeryLongName,
}

impl UncertaintyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UncertaintyType::VeryLowConfidence => "very_low_confidence",
            UncertaintyType::LowConfidence => "low_confidence",
            UncertaintyType::NullNames => "null_names",
            UncertaintyType::IncompleteName => "incomplete_name",
            UncertaintyType::ProcessingFailure => "processing_failure",
            UncertaintyType::BusinessPersonConfusion => "business_person_confusion",
            UncertaintyType::MultipleNames => "multiple_names",
            UncertaintyType::HyphenatedName => "hyphenated_name",
            UncertaintyType::InitialsOnly => "initials_only",
            UncertaintyType::BusinessLikePattern => "business_like_pattern",
            UncertaintyType::BusinessEmail => "business_email",
            UncertaintyType::VeryLongName => "very_long_name",
        }
    }
}

/// A record flagged for human review
#[derive(Debug, Clone, Serialize)]
pub struct UncertaintyCase {
    /// Source row the case belongs to
    pub record_id: String,
    /// What made the result uncertain
    pub case_type: UncertaintyType,
    /// Confidence of the result at detection time
    pub confidence: f64,
    /// Hint for the reviewer
    pub suggested_resolution: String,
    /// Cleaned inputs the name was resolved from
    pub contact_name: Option<String>,
    pub customer_name: Option<String>,
    pub email: Option<String>,
    /// What the resolver produced
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub method: ResolutionMethod,
}

/// Aggregate view of the cases collected during a run
#[derive(Debug, Clone, Default, Serialize)]
pub struct UncertaintySummary {
    pub total_cases: usize,
    pub type_counts: BTreeMap<UncertaintyType, usize>,
    pub average_confidence: f64,
}

/// Detector seam, so workflows can run with a different rule set
pub trait UncertaintyGate {
    /// Inspect one result; a detected case is returned and also kept for the summary.
    fn detect(&mut self, record_id: &str, input: &NameInput, result: &NameResult) -> Option<UncertaintyCase>;
}

/// Default detector with configurable confidence thresholds
#[derive(Debug, Default)]
pub struct UncertaintyDetector {
    /// Thresholds and on/off switch
    pub config: UncertaintyConfig,
    cases: Vec<UncertaintyCase>,
}

impl UncertaintyDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: UncertaintyConfig) -> Self {
        Self {
            config,
            cases: Vec::new(),
        }
    }

    pub fn cases(&self) -> &[UncertaintyCase] {
        &self.cases
    }

    pub fn summary(&self) -> UncertaintySummary {
        if self.cases.is_empty() {
            return UncertaintySummary::default();
        }
        let mut type_counts = BTreeMap::new();
        for case in &self.cases {
            *type_counts.entry(case.case_type).or_insert(0) += 1;
        }
        let total: f64 = self.cases.iter().map(|c| c.confidence).sum();
        UncertaintySummary {
            total_cases: self.cases.len(),
            type_counts,
            average_confidence: total / self.cases.len() as f64,
        }
    }

    /// Cases worth interrupting a reviewer for, not just listing in the report.
    pub fn should_flag_for_review(&self, case: &UncertaintyCase) -> bool {
        if case.confidence <= self.config.very_low_confidence_threshold {
            return true;
        }
        match case.case_type {
            UncertaintyType::BusinessPersonConfusion
            | UncertaintyType::MultipleNames
            | UncertaintyType::NullNames => true,
            _ => case.confidence <= self.config.low_confidence_threshold,
        }
    }

    /// Cases that pass [`Self::should_flag_for_review`], in detection order.
    pub fn review_queue(&self) -> Vec<UncertaintyCase> {
        self.cases
            .iter()
            .filter(|case| self.should_flag_for_review(case))
            .cloned()
            .collect()
    }

    pub fn reset(&mut self) {
        self.cases.clear();
    }

    fn classify(&self, input: &NameInput, result: &NameResult) -> Option<UncertaintyType> {
        let confidence = result.confidence();
        if confidence <= self.config.very_low_confidence_threshold {
            return Some(UncertaintyType::VeryLowConfidence);
        }
        if confidence <= self.config.low_confidence_threshold {
            return Some(UncertaintyType::LowConfidence);
        }
        if !result.has_any_name() {
            return Some(UncertaintyType::NullNames);
        }
        if !result.is_complete() {
            return Some(UncertaintyType::IncompleteName);
        }
        if result.method() == ResolutionMethod::Failed {
            return Some(UncertaintyType::ProcessingFailure);
        }
        if is_business_person_confusion(input, result) {
            return Some(UncertaintyType::BusinessPersonConfusion);
        }

        let contact = input.contact_name.as_deref().map(str::trim).unwrap_or("");
        if !contact.is_empty() {
            if MULTIPLE_NAMES.is_match(contact) {
                return Some(UncertaintyType::MultipleNames);
            }
            if HYPHENATED.is_match(contact) {
                return Some(UncertaintyType::HyphenatedName);
            }
            if INITIALS_ONLY.is_match(contact) {
                return Some(UncertaintyType::InitialsOnly);
            }
            if is_company_name(contact) {
                return Some(UncertaintyType::BusinessLikePattern);
            }
        }
        if input.email.as_deref().map(is_generic_mailbox).unwrap_or(false) {
            return Some(UncertaintyType::BusinessEmail);
        }
        if contact.chars().count() >= VERY_LONG_NAME_CHARS && is_all_caps(contact) {
            return Some(UncertaintyType::VeryLongName);
        }
        None
    }
}

impl UncertaintyGate for UncertaintyDetector {
    fn detect(&mut self, record_id: &str, input: &NameInput, result: &NameResult) -> Option<UncertaintyCase> {
        if !self.config.enabled {
            return None;
        }
        let case_type = self.classify(input, result)?;
        let case = UncertaintyCase {
            record_id: record_id.to_string(),
            case_type,
            confidence: result.confidence(),
            suggested_resolution: suggested_resolution(case_type, input),
            contact_name: input.contact_name.clone(),
            customer_name: input.customer_name.clone(),
            email: input.email.clone(),
            first_name: result.first_name().map(String::from),
            last_name: result.last_name().map(String::from),
            method: result.method(),
        };
        info!(
            record_id,
            case_type = case_type.as_str(),
            confidence = case.confidence,
            suggestion = %case.suggested_resolution,
            "Uncertainty detected"
        );
        ContactMetrics::record_uncertain_case(case_type.as_str());
        self.cases.push(case.clone());
        Some(case)
    }
}

/// Names came out of a field that reads like a business, or only the email
/// vouches for a person on a business account.
fn is_business_person_confusion(input: &NameInput, result: &NameResult) -> bool {
    if !result.has_any_name() {
        return false;
    }
    match (input.contact_name.as_deref(), input.customer_name.as_deref()) {
        (Some(contact), _) => has_business_keyword(contact),
        (None, Some(customer)) => has_business_keyword(customer),
        (None, None) => false,
    }
}

fn is_all_caps(value: &str) -> bool {
    value.chars().any(|c| c.is_alphabetic())
        && value.chars().filter(|c| c.is_alphabetic()).all(|c| c.is_uppercase())
}

fn suggested_resolution(case_type: UncertaintyType, input: &NameInput) -> String {
    let contact = input.contact_name.as_deref().unwrap_or("");
    let customer = input.customer_name.as_deref().unwrap_or("");
    let email = input.email.as_deref().unwrap_or("");
    match case_type {
        UncertaintyType::VeryLowConfidence | UncertaintyType::LowConfidence => {
            "Names came from a low-confidence tier. Check them against the source row.".to_string()
        }
        UncertaintyType::NullNames => {
            "No names could be extracted. Review the row and supply the person's name manually.".to_string()
        }
        UncertaintyType::IncompleteName => {
            "Only part of the name was extracted. Fill in the missing part or accept it as is.".to_string()
        }
        UncertaintyType::ProcessingFailure => "Name resolution failed. Review the row manually.".to_string(),
        UncertaintyType::BusinessPersonConfusion => format!(
            "Possible mix-up between business '{}' and person '{}'. Confirm whether this row is a person.",
            customer, contact
        ),
        UncertaintyType::MultipleNames => {
            format!("Multiple people in '{}'. Pick the one this row should use.", contact)
        }
        UncertaintyType::HyphenatedName => format!(
            "Hyphenated name in '{}'. Confirm which parts are first and last name.",
            contact
        ),
        UncertaintyType::InitialsOnly => {
            format!("Only initials in '{}'. Provide the full name if it is known.", contact)
        }
        UncertaintyType::BusinessLikePattern => {
            format!("'{}' looks like a business. Confirm there is a person behind it.", contact)
        }
        UncertaintyType::BusinessEmail => format!(
            "'{}' is a shared mailbox. Confirm the row still belongs to a person.",
            email
        ),
        UncertaintyType::VeryLongName => {
            format!("Contact field '{}' is unusually long. Check it holds a name.", contact)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote(first: Option<&str>, last: Option<&str>) -> NameResult {
        NameResult::from_tier(first.map(String::from), last.map(String::from), ResolutionMethod::RemoteLlm)
    }

    fn detect(input: NameInput, result: NameResult) -> Option<UncertaintyType> {
        let mut detector = UncertaintyDetector::new();
        detector.detect("row-1", &input, &result).map(|c| c.case_type)
    }

    #[test]
    fn test_confident_clean_result_is_not_flagged() {
        let input = NameInput::new("STACY ROCK", "", "stacy.rock@example.com");
        assert_eq!(detect(input, remote(Some("Stacy"), Some("Rock"))), None);
    }

    #[test]
    fn test_confidence_thresholds_are_inclusive() {
        let input = NameInput::new("STACY ROCK", "", "");
        let low = NameResult::new(Some("Stacy".into()), Some("Rock".into()), 0.6, ResolutionMethod::LocalLlm);
        let very_low = NameResult::new(Some("Stacy".into()), Some("Rock".into()), 0.4, ResolutionMethod::LocalLlm);
        assert_eq!(detect(input.clone(), low), Some(UncertaintyType::LowConfidence));
        assert_eq!(detect(input, very_low), Some(UncertaintyType::VeryLowConfidence));
    }

    #[test]
    fn test_rule_based_results_are_low_confidence() {
        let input = NameInput::new("STACY ROCK", "", "");
        let result = NameResult::from_tier(Some("Stacy".into()), Some("Rock".into()), ResolutionMethod::RuleBased);
        assert_eq!(detect(input, result), Some(UncertaintyType::LowConfidence));
    }

    #[test]
    fn test_name_completeness() {
        let input = NameInput::new("", "SRI ANANDA BHAVAN RESTAURANT", "SABSV1111@GMAIL.COM");
        assert_eq!(detect(input, remote(None, None)), Some(UncertaintyType::NullNames));

        let input = NameInput::new("MIRIAM", "", "");
        assert_eq!(detect(input, remote(Some("Miriam"), None)), Some(UncertaintyType::IncompleteName));
    }

    #[test]
    fn test_business_person_confusion() {
        let input = NameInput::new("", "ABC CATERING LLC", "jane.doe@abc.com");
        assert_eq!(
            detect(input, remote(Some("Jane"), Some("Doe"))),
            Some(UncertaintyType::BusinessPersonConfusion)
        );
    }

    #[test]
    fn test_contact_patterns() {
        let input = NameInput::new("KOREY KOENIG-DAMIENS & TAMERA", "", "tgarlock@x.com");
        assert_eq!(detect(input, remote(Some("Tamera"), Some("Garlock"))), Some(UncertaintyType::MultipleNames));

        let input = NameInput::new("SUZANNE EWING - ERVIN", "", "");
        assert_eq!(
            detect(input, remote(Some("Suzanne"), Some("Ewing-Ervin"))),
            Some(UncertaintyType::HyphenatedName)
        );

        let input = NameInput::new("J K", "", "jkolander@x.com");
        assert_eq!(detect(input, remote(Some("J"), Some("Kolander"))), Some(UncertaintyType::InitialsOnly));
    }

    #[test]
    fn test_generic_mailbox_and_long_contact() {
        let input = NameInput::new("", "", "info@bakery.com");
        assert_eq!(detect(input, remote(Some("Ann"), Some("Lee"))), Some(UncertaintyType::BusinessEmail));

        let input = NameInput::new("MARGARET ELIZABETH ANNE VANDERBILT", "", "");
        assert!("MARGARET ELIZABETH ANNE VANDERBILT".len() >= VERY_LONG_NAME_CHARS);
        // four words trip the company heuristic first
        assert_eq!(
            detect(input, remote(Some("Margaret"), Some("Vanderbilt"))),
            Some(UncertaintyType::BusinessLikePattern)
        );

        let input = NameInput::new("MARGARETHELENA VANDERBILTWORTHINGTON", "", "");
        assert_eq!(
            detect(input, remote(Some("Margarethelena"), Some("Vanderbiltworthington"))),
            Some(UncertaintyType::VeryLongName)
        );
    }

    #[test]
    fn test_summary_and_review_flags() {
        let mut detector = UncertaintyDetector::new();
        let input = NameInput::new("MIRIAM", "", "");
        let case = detector
            .detect("1", &input, &remote(Some("Miriam"), None))
            .expect("incomplete name is flagged");
        assert!(!detector.should_flag_for_review(&case));

        let input = NameInput::new("", "SRI ANANDA BHAVAN RESTAURANT", "");
        let case = detector.detect("2", &input, &remote(None, None)).expect("null names flagged");
        assert!(detector.should_flag_for_review(&case));

        let queue = detector.review_queue();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].record_id, "2");

        let summary = detector.summary();
        assert_eq!(summary.total_cases, 2);
        assert_eq!(summary.type_counts.get(&UncertaintyType::NullNames), Some(&1));
        assert!((summary.average_confidence - 0.9).abs() < 1e-9);

        detector.reset();
        assert!(detector.cases().is_empty());
    }

    #[test]
    fn test_disabled_detector_records_nothing() {
        let mut detector = UncertaintyDetector::with_config(UncertaintyConfig {
            enabled: false,
            ..UncertaintyConfig::default()
        });
        let input = NameInput::new("", "", "");
        assert!(detector.detect("1", &input, &NameResult::failed()).is_none());
        assert!(detector.cases().is_empty());
    }
}
