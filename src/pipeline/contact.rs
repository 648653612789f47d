//! Email Contact Export: one workbook with the cleaned contacts and a
//! "Removed" audit sheet.

use std::fs;
use tracing::info;

use super::{clean_source, input_stem, CleanedRow, CleaningRun, WorkflowOptions, WorkflowResult};
use crate::config::Config;
use crate::constants::contact_output_filename;
use crate::error::Result;
use crate::metrics::ContactMetrics;
use crate::sheet::{write_contact_workbook, ContactExportRow, RemovedRow};

impl From<&CleanedRow> for ContactExportRow {
    fn from(row: &CleanedRow) -> Self {
        let record = &row.record;
        Self {
            email: row.email.clone(),
            business_type: record.business_type.clone(),
            first_name: row.name.first_name().unwrap_or_default().to_string(),
            last_name: row.name.last_name().unwrap_or_default().to_string(),
            customer_name: record.customer_name.clone(),
            phone: row.phone.clone(),
            salesperson: record.salesperson.clone(),
            address_1: record.address_1.clone(),
            address_2: record.address_2.clone(),
            city: record.city.clone(),
            state: record.state.clone(),
            zip: record.zip.clone(),
        }
    }
}

/// Removed rows carry the untouched source cells.
fn removed_rows(run: &CleaningRun) -> Vec<RemovedRow> {
    run.outcome
        .removed
        .iter()
        .filter_map(|removal| {
            run.table.rows.get(removal.row_index).map(|original| RemovedRow {
                original: original.clone(),
                reason: removal.reason,
            })
        })
        .collect()
}

/// Run the contact export for one input workbook.
pub async fn run_contact_workflow(config: &Config, options: &WorkflowOptions) -> Result<WorkflowResult> {
    println!("🚀 Starting contact export");
    let run = clean_source(config, options).await?;
    write_contact_outputs(config, options, run)
}

/// Write the export workbook (and the summary file) for a finished cleaning pass.
pub fn write_contact_outputs(
    config: &Config,
    options: &WorkflowOptions,
    run: CleaningRun,
) -> Result<WorkflowResult> {
    let stem = input_stem(&options.input);
    let output_file = options.output_dir.join(contact_output_filename(&stem));

    let rows: Vec<ContactExportRow> = run.outcome.kept.iter().map(ContactExportRow::from).collect();
    let removed = removed_rows(&run);
    write_contact_workbook(&output_file, &rows, &run.table.headers, &removed)?;
    ContactMetrics::record_exported(rows.len());
    println!("💾 Saved {} contacts to {}", rows.len(), output_file.display());

    let mut output_files = vec![output_file];
    let result = WorkflowResult::new("contact", &run, output_files.clone());
    if config.output.write_summary {
        let summary_file = options.output_dir.join(format!("{} - Summary.txt", stem));
        fs::write(&summary_file, result.report())?;
        info!(path = %summary_file.display(), "Wrote run summary");
        output_files.push(summary_file);
    }

    Ok(WorkflowResult {
        output_files,
        ..result
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{CleaningOutcome, Removal};
    use crate::quality_gate::UncertaintySummary;
    use crate::resolver::EngineState;
    use crate::sheet::SourceTable;
    use crate::types::{CellValue, ContactRecord, NameResult, RemovalReason, ResolutionMethod};

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    #[test]
    fn test_removed_rows_keep_source_cells() {
        let table = SourceTable::from_grid(
            "slsp".into(),
            vec![
                vec![text("Contact Name"), text("Email"), text("Phone")],
                vec![text("STACY ROCK"), text("AP@CATEREDTOO.COM"), CellValue::Number(4085063875.0)],
                vec![text("JOHN"), text("nan"), CellValue::Empty],
            ],
        )
        .expect("valid table");
        let run = CleaningRun {
            table,
            outcome: CleaningOutcome {
                total_rows: 2,
                kept: Vec::new(),
                removed: vec![Removal {
                    row_index: 1,
                    reason: RemovalReason::InvalidEmail,
                }],
            },
            state: EngineState::from_config(&Config::default()),
            uncertainty: UncertaintySummary::default(),
            review_cases: Vec::new(),
        };

        let removed = removed_rows(&run);
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].original[0], text("JOHN"));
        assert_eq!(removed[0].reason, RemovalReason::InvalidEmail);
    }

    #[test]
    fn test_export_row_from_cleaned_row() {
        let row = CleanedRow {
            record: ContactRecord {
                customer_name: "CATERED TOO INC".into(),
                salesperson: "Mark Pringle".into(),
                zip: "95112".into(),
                ..ContactRecord::default()
            },
            email: "AP@CATEREDTOO.COM".into(),
            name: NameResult::from_tier(Some("Stacy".into()), None, ResolutionMethod::RuleBased),
            phone: Some("4085063875".into()),
        };
        let export = ContactExportRow::from(&row);
        assert_eq!(export.first_name, "Stacy");
        assert_eq!(export.last_name, "");
        assert_eq!(export.customer_name, "CATERED TOO INC");
        assert_eq!(export.zip, "95112");
    }
}
