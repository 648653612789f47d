//! Broadly Survey export: cleaned rows split by store, one workbook each.

use chrono::Local;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

use super::{clean_source, CleanedRow, CleaningRun, WorkflowOptions, WorkflowResult};
use crate::config::Config;
use crate::constants::{get_locations, survey_output_filename, LOCATION_DUBLIN, LOCATION_MILPITAS};
use crate::error::{CleanerError, Result};
use crate::metrics::ContactMetrics;
use crate::sheet::{write_survey_workbook, SurveyRow};
use crate::types::ContactRecord;

static DATE_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{1,2}\.\d{1,2}\.\d{2})(?:\s*-\s*|\s+)(\d{1,2}\.\d{1,2}\.\d{2})").expect("valid regex")
});

const MILPITAS_MARKERS: [&str; 3] = ["MILPITAS", "MILPITA", "MILP"];
const DUBLIN_MARKERS: [&str; 2] = ["DUBLIN", "DUB"];

/// Store a row belongs to.
///
/// A Milpitas marker in DEL/PU always wins; then the Dublin salespeople or a
/// Dublin marker; everything else is Milpitas.
pub fn determine_location(record: &ContactRecord, dublin_salespeople: &[String]) -> &'static str {
    let del_pu = format!("{} {}", record.del.trim(), record.pu.trim()).to_uppercase();
    if MILPITAS_MARKERS.iter().any(|m| del_pu.contains(m)) {
        return LOCATION_MILPITAS;
    }
    let salesperson = record.salesperson.trim();
    let dublin_rep = dublin_salespeople
        .iter()
        .any(|name| name.trim().eq_ignore_ascii_case(salesperson));
    if dublin_rep || DUBLIN_MARKERS.iter().any(|m| del_pu.contains(m)) {
        return LOCATION_DUBLIN;
    }
    LOCATION_MILPITAS
}

/// `M.D.YY-M.D.YY` from the file name, else today as `MM.DD.YYYY`.
pub fn extract_date_range_from_filename(path: &Path) -> String {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
    match DATE_RANGE.captures(stem) {
        Some(caps) => format!("{}-{}", &caps[1], &caps[2]),
        None => Local::now().format("%m.%d.%Y").to_string(),
    }
}

impl From<&CleanedRow> for SurveyRow {
    fn from(row: &CleanedRow) -> Self {
        Self {
            email: row.email.clone(),
            first_name: row.name.first_name().unwrap_or_default().to_string(),
            last_name: row.name.last_name().unwrap_or_default().to_string(),
            phone: row.phone.clone(),
            team_member: row.record.salesperson.trim().to_string(),
        }
    }
}

/// Resolve `--location` against the known stores.
fn location_filter(location: Option<&str>) -> Result<Option<&'static str>> {
    let Some(wanted) = location else {
        return Ok(None);
    };
    get_locations()
        .into_iter()
        .find(|known| known.eq_ignore_ascii_case(wanted.trim()))
        .map(Some)
        .ok_or_else(|| {
            CleanerError::Config(format!(
                "Unknown location '{}', expected one of: {}",
                wanted,
                get_locations().join(", ")
            ))
        })
}

/// Survey rows per store, each list sorted by team member.
pub fn split_by_location(
    run: &CleaningRun,
    dublin_salespeople: &[String],
    only: Option<&str>,
) -> BTreeMap<&'static str, Vec<SurveyRow>> {
    let mut by_location: BTreeMap<&'static str, Vec<SurveyRow>> = BTreeMap::new();
    for row in &run.outcome.kept {
        let location = determine_location(&row.record, dublin_salespeople);
        if only.map(|o| o != location).unwrap_or(false) {
            continue;
        }
        by_location.entry(location).or_default().push(SurveyRow::from(row));
    }
    for rows in by_location.values_mut() {
        rows.sort_by(|a, b| a.team_member.cmp(&b.team_member));
    }
    by_location
}

/// Run the survey export for one input workbook.
pub async fn run_survey_workflow(config: &Config, options: &WorkflowOptions) -> Result<WorkflowResult> {
    let only = location_filter(options.location.as_deref())?;
    println!("🚀 Starting survey export");
    let run = clean_source(config, options).await?;
    write_survey_outputs(config, options, &run, only)
}

fn write_survey_outputs(
    config: &Config,
    options: &WorkflowOptions,
    run: &CleaningRun,
    only: Option<&str>,
) -> Result<WorkflowResult> {
    let date_range = extract_date_range_from_filename(&options.input);
    info!(date_range = %date_range, "Survey date range");
    println!("📅 Date range: {}", date_range);

    let by_location = split_by_location(run, &config.survey.dublin_salespeople, only);
    let mut output_files = Vec::new();
    for location in get_locations() {
        let rows = by_location.get(location).map(Vec::as_slice).unwrap_or_default();
        println!("📍 {} records: {}", location, rows.len());
        if rows.is_empty() {
            continue;
        }
        let path = options.output_dir.join(survey_output_filename(location, &date_range));
        write_survey_workbook(&path, rows)?;
        ContactMetrics::record_exported(rows.len());
        println!("💾 {} data saved to: {}", location, path.display());
        output_files.push(path);
    }

    let mut result = WorkflowResult::new("survey", run, output_files);
    result.exported_rows = by_location.values().map(Vec::len).sum();
    Ok(result)
}
