//! Cleaning pipeline shared by the contact and survey workflows.

pub mod contact;
pub mod filter;
pub mod survey;

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

use crate::config::{Config, ProcessingConfig};
use crate::error::Result;
use crate::metrics::ContactMetrics;
use crate::normalize::phone::{clean_phone_cell, format_phone};
use crate::quality_gate::{UncertaintyCase, UncertaintyDetector, UncertaintyGate, UncertaintySummary};
use crate::resolver::{EngineState, NameResolver};
use crate::sheet::{read_source, SourceTable};
use crate::types::{ContactRecord, NameInput, NameResult, ProcessingStats, RemovalReason, ResolutionMethod};

use filter::{screen, RowFilter};

pub use contact::run_contact_workflow;
pub use survey::run_survey_workflow;

/// A row that made it through every check
#[derive(Debug, Clone)]
pub struct CleanedRow {
    pub record: ContactRecord,
    pub email: String,
    pub name: NameResult,
    /// Digits only
    pub phone: Option<String>,
}

/// A row left out, pointing back at its source position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Removal {
    pub row_index: usize,
    pub reason: RemovalReason,
}

/// Kept and removed rows, both in source order
#[derive(Debug, Default)]
pub struct CleaningOutcome {
    pub total_rows: usize,
    pub kept: Vec<CleanedRow>,
    pub removed: Vec<Removal>,
}

impl CleaningOutcome {
    pub fn removal_counts(&self) -> BTreeMap<RemovalReason, usize> {
        let mut counts = BTreeMap::new();
        for removal in &self.removed {
            *counts.entry(removal.reason).or_insert(0) += 1;
        }
        counts
    }
}

/// Screens, resolves and de-duplicates records batch by batch
pub struct ContactPipeline {
    resolver: NameResolver,
    detector: UncertaintyDetector,
    batch_size: usize,
    show_progress: bool,
}

impl ContactPipeline {
    pub fn new(resolver: NameResolver, detector: UncertaintyDetector, processing: &ProcessingConfig) -> Self {
        Self {
            resolver,
            detector,
            batch_size: processing.batch_size.max(1),
            show_progress: processing.show_progress,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            NameResolver::from_config(config)?,
            UncertaintyDetector::with_config(config.uncertainty.clone()),
            &config.processing,
        ))
    }

    pub fn resolver(&self) -> &NameResolver {
        &self.resolver
    }

    pub fn detector(&self) -> &UncertaintyDetector {
        &self.detector
    }

    /// Run every record through the filters and the resolver.
    pub async fn process(&mut self, state: &mut EngineState, records: &[ContactRecord]) -> CleaningOutcome {
        let mut outcome = CleaningOutcome {
            total_rows: records.len(),
            ..CleaningOutcome::default()
        };
        let mut row_filter = RowFilter::new();
        let mut done = 0;

        for batch in records.chunks(self.batch_size) {
            for record in batch {
                let removal = match screen(record) {
                    Ok(email) => self.resolve_row(state, &mut row_filter, record, email, &mut outcome).await,
                    Err(reason) => Some(reason),
                };
                if let Some(reason) = removal {
                    ContactMetrics::record_removal(reason);
                    outcome.removed.push(Removal {
                        row_index: record.row_index,
                        reason,
                    });
                }
            }

            done += batch.len();
            info!(
                processed = done,
                total = records.len(),
                spend = state.budget.current_cost(),
                "Batch complete"
            );
            if self.show_progress {
                println!(
                    "   Processed {}/{} rows (remote {}, local {}, rules {})",
                    done,
                    records.len(),
                    state.stats.remote_llm,
                    state.stats.local_llm,
                    state.stats.rule_based
                );
            }
        }

        state.stats.finish();
        outcome
    }

    async fn resolve_row(
        &mut self,
        state: &mut EngineState,
        row_filter: &mut RowFilter,
        record: &ContactRecord,
        email: String,
        outcome: &mut CleaningOutcome,
    ) -> Option<RemovalReason> {
        let input = NameInput::from_record(record, Some(&email));
        let name = self.resolver.resolve(state, &input).await;
        self.detector
            .detect(&format!("record {}", record.row_index + 1), &input, &name);

        if let Err(reason) = row_filter.admit(&email, &name) {
            return Some(reason);
        }
        let phone = record.phone.as_ref().and_then(clean_phone_cell);
        debug!(
            row = record.row_index + 1,
            email = %email,
            phone = %phone.as_deref().map(format_phone).unwrap_or_default(),
            "Row kept"
        );
        outcome.kept.push(CleanedRow {
            record: record.clone(),
            email,
            name,
            phone,
        });
        None
    }
}

/// Where to read from and write to
#[derive(Debug, Clone)]
pub struct WorkflowOptions {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub sheet: Option<String>,
    /// Survey only: restrict output to one store
    pub location: Option<String>,
}

/// Result of a complete workflow run
#[derive(Debug, Serialize)]
pub struct WorkflowResult {
    pub workflow: String,
    pub total_rows: usize,
    pub exported_rows: usize,
    pub removed_rows: usize,
    pub removal_counts: BTreeMap<RemovalReason, usize>,
    pub uncertainty: UncertaintySummary,
    /// Cases a person should look at, with the suggested fix
    pub review_cases: Vec<UncertaintyCase>,
    pub stats: ProcessingStats,
    pub remote_spend: f64,
    pub output_files: Vec<PathBuf>,
}

impl WorkflowResult {
    fn new(workflow: &str, run: &CleaningRun, output_files: Vec<PathBuf>) -> Self {
        Self {
            workflow: workflow.to_string(),
            total_rows: run.outcome.total_rows,
            exported_rows: run.outcome.kept.len(),
            removed_rows: run.outcome.removed.len(),
            removal_counts: run.outcome.removal_counts(),
            uncertainty: run.uncertainty.clone(),
            review_cases: run.review_cases.clone(),
            stats: run.state.stats.clone(),
            remote_spend: run.state.budget.current_cost(),
            output_files,
        }
    }

    /// Human-readable end-of-run report, also written next to the contact export.
    pub fn report(&self) -> String {
        let mut lines = vec![
            format!("Workflow: {}", self.workflow),
            format!("Rows read: {}", self.total_rows),
            format!("Rows exported: {}", self.exported_rows),
            format!("Rows removed: {}", self.removed_rows),
        ];
        for (reason, count) in &self.removal_counts {
            lines.push(format!("  {}: {}", reason, count));
        }
        lines.push(format!(
            "Names resolved: {} (remote {}, local {}, rules {})",
            self.stats.total, self.stats.remote_llm, self.stats.local_llm, self.stats.rule_based
        ));
        lines.push(format!("LLM share: {:.1}%", self.stats.llm_share() * 100.0));
        lines.push(format!("Tier errors: {}", self.stats.errors));
        lines.push(format!("Remote LLM spend: ${:.4}", self.remote_spend));
        lines.push(format!("Duration: {:.1}s", self.stats.duration_secs()));
        lines.push(format!(
            "Uncertain cases: {} (average confidence {:.2})",
            self.uncertainty.total_cases, self.uncertainty.average_confidence
        ));
        for (case_type, count) in &self.uncertainty.type_counts {
            lines.push(format!("  {}: {}", case_type.as_str(), count));
        }
        if !self.review_cases.is_empty() {
            lines.push(format!("Needs review: {}", self.review_cases.len()));
            for case in &self.review_cases {
                lines.push(format!(
                    "  {} [{}] {} -> {}: {}",
                    case.record_id,
                    case.case_type.as_str(),
                    case_source(case),
                    case_names(case),
                    case.suggested_resolution
                ));
            }
        }
        for file in &self.output_files {
            lines.push(format!("Output: {}", file.display()));
        }
        lines.join("\n")
    }
}

fn case_source(case: &UncertaintyCase) -> String {
    let fields: Vec<&str> = [&case.contact_name, &case.customer_name, &case.email]
        .into_iter()
        .filter_map(|field| field.as_deref())
        .collect();
    if fields.is_empty() {
        "(empty row)".to_string()
    } else {
        fields.join(" / ")
    }
}

fn case_names(case: &UncertaintyCase) -> String {
    match (&case.first_name, &case.last_name) {
        (Some(first), Some(last)) => format!("{} {}", first, last),
        (Some(first), None) => first.clone(),
        _ => "(no name)".to_string(),
    }
}

/// Everything a workflow needs after the shared cleaning pass
pub struct CleaningRun {
    pub table: SourceTable,
    pub outcome: CleaningOutcome,
    pub state: EngineState,
    pub uncertainty: UncertaintySummary,
    pub review_cases: Vec<UncertaintyCase>,
}

/// Read the input sheet and run it through a pipeline built from `config`.
#[instrument(skip(config, options), fields(input = %options.input.display()))]
pub async fn clean_source(config: &Config, options: &WorkflowOptions) -> Result<CleaningRun> {
    let pipeline = ContactPipeline::from_config(config)?;
    clean_source_with(config, options, pipeline).await
}

/// Same as [`clean_source`] with a caller-supplied pipeline.
pub async fn clean_source_with(
    config: &Config,
    options: &WorkflowOptions,
    mut pipeline: ContactPipeline,
) -> Result<CleaningRun> {
    println!("📁 Reading input file: {}", options.input.display());
    let sheet = options.sheet.as_deref().or(config.input.sheet_name.as_deref());
    let table = read_source(&options.input, sheet)?;
    println!(
        "📊 Sheet '{}': {} rows (header on row {})",
        table.sheet_name,
        table.rows.len(),
        table.header_row + 1
    );

    let mut state = EngineState::from_config(config);
    pipeline.resolver().health_check(&mut state).await;
    let tiers: Vec<&str> = pipeline
        .resolver()
        .active_tiers(&state)
        .iter()
        .map(ResolutionMethod::as_str)
        .collect();
    println!("🧠 Name resolution tiers: {}", tiers.join(" → "));

    println!("🔧 Cleaning rows...");
    let records = table.records();
    let outcome = pipeline.process(&mut state, &records).await;
    println!(
        "✅ Kept {} rows, removed {}",
        outcome.kept.len(),
        outcome.removed.len()
    );

    let uncertainty = pipeline.detector().summary();
    let review_cases = pipeline.detector().review_queue();
    if !review_cases.is_empty() {
        println!("🔍 {} rows need review (see the summary)", review_cases.len());
    }
    Ok(CleaningRun {
        table,
        outcome,
        state,
        uncertainty,
        review_cases,
    })
}

/// File stem of the input, used to name outputs.
pub(crate) fn input_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("contacts")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CellValue;

    fn record(row_index: usize, salesperson: &str, contact: &str, customer: &str, email: &str) -> ContactRecord {
        ContactRecord {
            row_index,
            salesperson: salesperson.to_string(),
            contact_name: contact.to_string(),
            customer_name: customer.to_string(),
            email: email.to_string(),
            phone: Some(CellValue::Number(4085063875.0)),
            ..ContactRecord::default()
        }
    }

    fn pipeline(batch_size: usize) -> ContactPipeline {
        ContactPipeline::new(
            NameResolver::rules_only(),
            UncertaintyDetector::new(),
            &ProcessingConfig {
                batch_size,
                show_progress: false,
            },
        )
    }

    #[tokio::test]
    async fn test_rows_are_screened_resolved_and_deduped() {
        let records = vec![
            record(0, "Mark Pringle", "STACY ROCK", "CATERED TOO INC", "AP@CATEREDTOO.COM"),
            record(1, "ACCOUNTS RECEIVABLE", "JOHN SMITH", "", "john@smith.com"),
            record(2, "Mark Pringle", "JOHN SMITH", "", "not an email"),
            record(3, "Mark Pringle", "", "SRI ANANDA BHAVAN RESTAURANT", "SABSV1111@GMAIL.COM"),
            record(4, "Cindy Foster", "JANE ROCK", "", "ap@cateredtoo.com"),
            record(5, "Cindy Foster", "VICTOR HAN", "", "victor.han@example.com"),
        ];
        let mut pipeline = pipeline(2);
        let mut state = EngineState::from_config(&Config::default());

        let outcome = pipeline.process(&mut state, &records).await;

        assert_eq!(outcome.total_rows, 6);
        let kept: Vec<usize> = outcome.kept.iter().map(|row| row.record.row_index).collect();
        assert_eq!(kept, vec![0, 5]);
        assert_eq!(outcome.kept[0].name.first_name(), Some("Stacy"));
        assert_eq!(outcome.kept[0].name.last_name(), Some("Rock"));
        assert_eq!(outcome.kept[0].phone.as_deref(), Some("4085063875"));

        assert_eq!(
            outcome.removed,
            vec![
                Removal { row_index: 1, reason: RemovalReason::AccountsReceivableSalesperson },
                Removal { row_index: 2, reason: RemovalReason::InvalidEmail },
                Removal { row_index: 3, reason: RemovalReason::MissingValidPersonNames },
                Removal { row_index: 4, reason: RemovalReason::DuplicateEmail },
            ]
        );
        // AR and invalid-email rows never reach the resolver
        assert_eq!(state.stats.total, 4);
        assert!(state.stats.finished_at.is_some());
        assert_eq!(outcome.removal_counts().get(&RemovalReason::DuplicateEmail), Some(&1));
    }

    #[tokio::test]
    async fn test_rule_based_rows_are_reported_as_uncertain() {
        let records = vec![record(0, "", "VICTOR HAN", "", "victor.han@example.com")];
        let mut pipeline = pipeline(50);
        let mut state = EngineState::from_config(&Config::default());

        pipeline.process(&mut state, &records).await;
        let summary = pipeline.detector().summary();
        assert_eq!(summary.total_cases, 1);
        assert_eq!(pipeline.detector().cases()[0].record_id, "record 1");
    }

    #[tokio::test]
    async fn test_report_lists_cases_for_review() {
        let records = vec![
            record(0, "", "VICTOR HAN", "", "victor.han@example.com"),
            record(1, "", "", "SRI ANANDA BHAVAN RESTAURANT", "SABSV1111@GMAIL.COM"),
        ];
        let mut pipeline = pipeline(50);
        let mut state = EngineState::from_config(&Config::default());
        let outcome = pipeline.process(&mut state, &records).await;

        let run = CleaningRun {
            table: SourceTable::from_grid(
                "s".into(),
                vec![vec![CellValue::Text("Email".into()), CellValue::Text("Contact Name".into())]],
            )
            .expect("valid table"),
            outcome,
            state,
            uncertainty: pipeline.detector().summary(),
            review_cases: pipeline.detector().review_queue(),
        };
        let report = WorkflowResult::new("contact", &run, Vec::new()).report();

        assert!(report.contains("Needs review: 2"));
        let review: Vec<&str> = report.lines().filter(|line| line.starts_with("  record ")).collect();
        assert_eq!(review.len(), 2);
        assert!(review[0].starts_with("  record 1 [low_confidence] VICTOR HAN / victor.han@example.com -> Victor Han: "));
        assert!(review[0].ends_with("Check them against the source row."));
        assert!(review[1].starts_with("  record 2 [low_confidence] SRI ANANDA BHAVAN RESTAURANT / "));
    }

    #[test]
    fn test_report_lists_removals_and_outputs() {
        let result = WorkflowResult {
            workflow: "contact".into(),
            total_rows: 3,
            exported_rows: 1,
            removed_rows: 2,
            removal_counts: BTreeMap::from([(RemovalReason::InvalidEmail, 2)]),
            uncertainty: UncertaintySummary::default(),
            review_cases: Vec::new(),
            stats: ProcessingStats::default(),
            remote_spend: 0.0,
            output_files: vec![PathBuf::from("out/a.xlsx")],
        };
        let report = result.report();
        assert!(!report.contains("Needs review"));
        assert!(report.contains("Rows exported: 1"));
        assert!(report.contains("Tier errors: 0"));
        assert!(report.contains("  invalid_email: 2"));
        assert!(report.contains("Output: out/a.xlsx"));
    }
}
