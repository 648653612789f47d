use rust_xlsxwriter::{Format, FormatAlign, Workbook, Worksheet};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::constants::*;
use crate::error::{CleanerError, Result};
use crate::types::{CellValue, RemovalReason};

/// One cleaned contact, in output column order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactExportRow {
    pub email: String,
    pub business_type: String,
    pub first_name: String,
    pub last_name: String,
    pub customer_name: String,
    /// Digits only, 10 or 11 long
    pub phone: Option<String>,
    pub salesperson: String,
    pub address_1: String,
    pub address_2: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

impl ContactExportRow {
    fn text_columns(&self) -> [&str; 12] {
        [
            &self.email,
            &self.business_type,
            &self.first_name,
            &self.last_name,
            &self.customer_name,
            "",
            &self.salesperson,
            &self.address_1,
            &self.address_2,
            &self.city,
            &self.state,
            &self.zip,
        ]
    }
}

/// A source row left out of the export, kept verbatim with its reason
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedRow {
    pub original: Vec<CellValue>,
    pub reason: RemovalReason,
}

/// One survey recipient
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurveyRow {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub team_member: String,
}

const CONTACT_PHONE_COLUMN: u16 = 5;
const SURVEY_PHONE_COLUMN: u16 = 3;

fn header_format() -> Format {
    Format::new().set_bold().set_align(FormatAlign::Center)
}

fn write_headers<S: AsRef<str>>(worksheet: &mut Worksheet, headers: &[S]) -> Result<()> {
    let format = header_format();
    for (col, header) in headers.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, header.as_ref(), &format)?;
    }
    Ok(())
}

/// Phone digits go in as a number so the sheet's mask renders them.
fn write_phone(worksheet: &mut Worksheet, row: u32, col: u16, phone: Option<&str>) -> Result<()> {
    let Some(digits) = phone else {
        return Ok(());
    };
    match digits.parse::<f64>() {
        Ok(number) => {
            let mask = if digits.len() == 11 {
                PHONE_NUMBER_FORMAT_WITH_COUNTRY
            } else {
                PHONE_NUMBER_FORMAT
            };
            let format = Format::new().set_num_format(mask);
            worksheet.write_number_with_format(row, col, number, &format)?;
        }
        Err(_) => {
            worksheet.write_string(row, col, digits)?;
        }
    }
    Ok(())
}

fn write_cell(worksheet: &mut Worksheet, row: u32, col: u16, cell: &CellValue) -> Result<()> {
    match cell {
        CellValue::Empty => {}
        CellValue::Text(s) => {
            worksheet.write_string(row, col, s)?;
        }
        CellValue::Number(n) if n.is_finite() => {
            worksheet.write_number(row, col, *n)?;
        }
        CellValue::Number(_) => {}
        CellValue::DateTime(serial) if serial.is_finite() => {
            let format = Format::new().set_num_format(DATE_NUMBER_FORMAT);
            worksheet.write_number_with_format(row, col, *serial, &format)?;
        }
        CellValue::DateTime(_) => {}
        CellValue::Bool(b) => {
            worksheet.write_boolean(row, col, *b)?;
        }
    }
    Ok(())
}

fn save(mut workbook: Workbook, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    workbook
        .save(path)
        .map_err(|e| CleanerError::OutputWrite(format!("{}: {}", path.display(), e)))
}

/// Write the cleaned contacts and, on a second sheet, every removed row.
pub fn write_contact_workbook(
    path: &Path,
    rows: &[ContactExportRow],
    source_headers: &[String],
    removed: &[RemovedRow],
) -> Result<()> {
    let mut workbook = Workbook::new();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(CONTACT_SHEET_NAME)?;
    write_headers(worksheet, &CONTACT_OUTPUT_COLUMNS)?;
    for (index, row) in rows.iter().enumerate() {
        let r = index as u32 + 1;
        for (col, value) in row.text_columns().iter().enumerate() {
            if !value.is_empty() {
                worksheet.write_string(r, col as u16, *value)?;
            }
        }
        write_phone(worksheet, r, CONTACT_PHONE_COLUMN, row.phone.as_deref())?;
    }
    worksheet.autofit();

    let removed_sheet = workbook.add_worksheet();
    removed_sheet.set_name(REMOVED_SHEET_NAME)?;
    let mut headers: Vec<&str> = source_headers.iter().map(String::as_str).collect();
    headers.push(REMOVAL_REASON_HEADER);
    write_headers(removed_sheet, &headers)?;
    let reason_col = source_headers.len() as u16;
    for (index, row) in removed.iter().enumerate() {
        let r = index as u32 + 1;
        for (col, cell) in row.original.iter().take(source_headers.len()).enumerate() {
            write_cell(removed_sheet, r, col as u16, cell)?;
        }
        removed_sheet.write_string(r, reason_col, row.reason.as_str())?;
    }
    removed_sheet.autofit();

    save(workbook, path)?;
    info!(
        path = %path.display(),
        exported = rows.len(),
        removed = removed.len(),
        "Wrote contact workbook"
    );
    Ok(())
}

/// Write one location's survey list.
pub fn write_survey_workbook(path: &Path, rows: &[SurveyRow]) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SURVEY_SHEET_NAME)?;
    write_headers(worksheet, &SURVEY_OUTPUT_COLUMNS)?;

    for (index, row) in rows.iter().enumerate() {
        let r = index as u32 + 1;
        worksheet.write_string(r, 0, &row.email)?;
        worksheet.write_string(r, 1, &row.first_name)?;
        worksheet.write_string(r, 2, &row.last_name)?;
        write_phone(worksheet, r, SURVEY_PHONE_COLUMN, row.phone.as_deref())?;
        worksheet.write_string(r, 4, &row.team_member)?;
    }
    worksheet.autofit();

    save(workbook, path)?;
    info!(path = %path.display(), rows = rows.len(), "Wrote survey workbook");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{open_workbook_auto, Data, Reader};

    fn contact(email: &str, phone: Option<&str>) -> ContactExportRow {
        ContactExportRow {
            email: email.to_string(),
            first_name: "Stacy".to_string(),
            last_name: "Rock".to_string(),
            customer_name: "CATERED TOO INC".to_string(),
            phone: phone.map(String::from),
            city: "San Jose".to_string(),
            ..ContactExportRow::default()
        }
    }

    #[test]
    fn test_contact_workbook_layout() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("nested").join("out.xlsx");
        let headers = vec!["Contact Name".to_string(), "Email".to_string()];
        let removed = vec![RemovedRow {
            original: vec![CellValue::Text("SRI".into()), CellValue::Text("bad".into())],
            reason: RemovalReason::InvalidEmail,
        }];

        write_contact_workbook(&path, &[contact("ap@cateredtoo.com", Some("4085063875"))], &headers, &removed)
            .expect("workbook written");

        let mut workbook = open_workbook_auto(&path).expect("readable");
        assert_eq!(workbook.sheet_names().to_vec(), vec![CONTACT_SHEET_NAME, REMOVED_SHEET_NAME]);

        let range = workbook.worksheet_range(CONTACT_SHEET_NAME).expect("export sheet");
        assert_eq!(range.get((0, 0)), Some(&Data::String("Email".into())));
        assert_eq!(range.get((0, 11)), Some(&Data::String("Zip".into())));
        assert_eq!(range.get((1, 2)), Some(&Data::String("Stacy".into())));
        assert_eq!(range.get((1, 5)), Some(&Data::Float(4085063875.0)));

        let range = workbook.worksheet_range(REMOVED_SHEET_NAME).expect("removed sheet");
        assert_eq!(range.get((0, 2)), Some(&Data::String(REMOVAL_REASON_HEADER.into())));
        assert_eq!(range.get((1, 2)), Some(&Data::String("invalid_email".into())));
    }

    #[test]
    fn test_removed_sheet_keeps_source_dates() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("out.xlsx");
        let headers = vec!["Email".to_string(), "Event Date".to_string()];
        let removed = vec![RemovedRow {
            original: vec![CellValue::Text("nan".into()), CellValue::DateTime(45842.0)],
            reason: RemovalReason::InvalidEmail,
        }];

        write_contact_workbook(&path, &[], &headers, &removed).expect("workbook written");

        let mut workbook = open_workbook_auto(&path).expect("readable");
        let range = workbook.worksheet_range(REMOVED_SHEET_NAME).expect("removed sheet");
        match range.get((1, 1)) {
            Some(Data::DateTime(date)) => assert_eq!(date.as_f64(), 45842.0),
            other => panic!("expected a date cell, got {:?}", other),
        }
    }

    #[test]
    fn test_survey_workbook_layout() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("Dublin - 7.1.25-7.31.25 - Clean.xlsx");
        let rows = vec![SurveyRow {
            email: "jane@x.com".into(),
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            phone: None,
            team_member: "Cindy Foster".into(),
        }];

        write_survey_workbook(&path, &rows).expect("workbook written");

        let mut workbook = open_workbook_auto(&path).expect("readable");
        let range = workbook.worksheet_range(SURVEY_SHEET_NAME).expect("survey sheet");
        assert_eq!(range.get((0, 4)), Some(&Data::String("Assisting Team Member".into())));
        assert_eq!(range.get((1, 4)), Some(&Data::String("Cindy Foster".into())));
        assert_eq!(range.get((1, 3)), Some(&Data::Empty));
    }
}
