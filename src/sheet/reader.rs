use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;
use tracing::{debug, info};

use crate::constants::*;
use crate::error::{CleanerError, Result};
use crate::types::{CellValue, ContactRecord};

/// The data block of one worksheet, split at the detected header row
#[derive(Debug, Clone)]
pub struct SourceTable {
    pub sheet_name: String,
    /// 0-based row of the header within the sheet
    pub header_row: usize,
    pub headers: Vec<String>,
    /// Data rows below the header, blank rows dropped
    pub rows: Vec<Vec<CellValue>>,
}

/// Open a workbook and load one sheet.
///
/// The sheet is `sheet` when given, else the first sheet in the workbook.
pub fn read_source(path: &Path, sheet: Option<&str>) -> Result<SourceTable> {
    if !path.exists() {
        return Err(CleanerError::InputNotFound(path.to_path_buf()));
    }
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();
    if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(CleanerError::UnsupportedInput(format!(
            "{} (expected one of: {})",
            path.display(),
            SUPPORTED_EXTENSIONS.join(", ")
        )));
    }

    let mut workbook = open_workbook_auto(path)?;
    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    let sheet_name = match sheet {
        Some(wanted) => sheet_names
            .iter()
            .find(|name| name.eq_ignore_ascii_case(wanted.trim()))
            .cloned()
            .ok_or_else(|| {
                CleanerError::SheetRead(format!(
                    "Sheet '{}' not found, available: {}",
                    wanted,
                    sheet_names.join(", ")
                ))
            })?,
        None => sheet_names
            .first()
            .cloned()
            .ok_or_else(|| CleanerError::SheetRead("Workbook contains no sheets".to_string()))?,
    };

    let range = workbook.worksheet_range(&sheet_name)?;
    let grid: Vec<Vec<CellValue>> = range
        .rows()
        .map(|row| row.iter().map(cell_from_data).collect())
        .collect();
    debug!(sheet = %sheet_name, rows = grid.len(), "Loaded worksheet");

    let table = SourceTable::from_grid(sheet_name, grid)?;
    info!(
        sheet = %table.sheet_name,
        header_row = table.header_row + 1,
        rows = table.rows.len(),
        "Read source sheet"
    );
    Ok(table)
}

fn cell_from_data(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(n) => CellValue::Number(*n),
        Data::Int(n) => CellValue::Number(*n as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::Error(e) => CellValue::Text(format!("#{:?}", e)),
        Data::DateTime(dt) => CellValue::DateTime(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}

/// Index of the header row among the first few rows, 0 when none qualifies.
pub fn detect_header_row(grid: &[Vec<CellValue>]) -> usize {
    for (index, row) in grid.iter().take(HEADER_PROBE_ROWS).enumerate() {
        if looks_like_data(row) {
            continue;
        }
        let matches = row
            .iter()
            .map(|cell| cell.as_text().to_lowercase())
            .filter(|text| {
                HEADER_KEY_COLUMNS
                    .iter()
                    .any(|key| text.contains(&key.to_lowercase()))
            })
            .count();
        if matches >= HEADER_MIN_MATCHES {
            return index;
        }
    }
    0
}

/// A row holding an address or a long digit run is a record, not a header.
fn looks_like_data(row: &[CellValue]) -> bool {
    row.iter().any(|cell| match cell {
        CellValue::Number(_) | CellValue::DateTime(_) => true,
        CellValue::Text(s) => {
            s.contains('@') || s.chars().filter(|c| c.is_ascii_digit()).count() >= 5
        }
        _ => false,
    })
}

impl SourceTable {
    /// Split a raw grid at its header row and check the required columns.
    pub fn from_grid(sheet_name: String, grid: Vec<Vec<CellValue>>) -> Result<Self> {
        let header_row = detect_header_row(&grid);
        let mut rows = grid.into_iter().skip(header_row);
        let headers: Vec<String> = rows
            .next()
            .map(|row| row.iter().map(CellValue::as_text).collect())
            .unwrap_or_default();
        let rows: Vec<Vec<CellValue>> = rows
            .filter(|row| row.iter().any(|cell| !cell.is_empty()))
            .collect();

        let table = Self {
            sheet_name,
            header_row,
            headers,
            rows,
        };
        table.validate()?;
        Ok(table)
    }

    fn validate(&self) -> Result<()> {
        if self.column(COL_EMAIL).is_none() {
            return Err(CleanerError::SheetRead(format!(
                "Missing required column '{}' in sheet '{}' (found: {})",
                COL_EMAIL,
                self.sheet_name,
                self.headers.join(", ")
            )));
        }
        if self.column(COL_CONTACT_NAME).is_none() && self.column(COL_CUSTOMER_NAME).is_none() {
            return Err(CleanerError::SheetRead(format!(
                "Sheet '{}' needs '{}' or '{}'",
                self.sheet_name, COL_CONTACT_NAME, COL_CUSTOMER_NAME
            )));
        }
        Ok(())
    }

    /// Position of a column, matched case-insensitively on trimmed header text.
    /// Falls back to the known aliases for that column.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.exact_column(name).or_else(|| {
            COLUMN_ALIASES
                .iter()
                .filter(|(canonical, _)| canonical.eq_ignore_ascii_case(name))
                .flat_map(|(_, aliases)| aliases.iter())
                .find_map(|alias| self.exact_column(alias))
        })
    }

    fn exact_column(&self, name: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    }

    fn cell<'a>(&self, row: &'a [CellValue], column: Option<usize>) -> Option<&'a CellValue> {
        column.and_then(|index| row.get(index))
    }

    fn text(&self, row: &[CellValue], column: Option<usize>) -> String {
        self.cell(row, column).map(CellValue::as_text).unwrap_or_default()
    }

    /// Rows as records, with the columns the cleaner uses pulled out.
    pub fn records(&self) -> Vec<ContactRecord> {
        let contact = self.column(COL_CONTACT_NAME);
        let customer = self.column(COL_CUSTOMER_NAME);
        let email = self.column(COL_EMAIL);
        let phone = self.column(COL_PHONE);
        let salesperson = self.column(COL_SALESPERSON);
        let business_type = self.column(COL_BUSINESS_TYPE).or_else(|| self.column(COL_TYPE));
        let address_1 = self.column(COL_ADDRESS_1);
        let address_2 = self.column(COL_ADDRESS_2);
        let city = self.column(COL_CITY);
        let state = self.column(COL_STATE);
        let zip = self.column(COL_ZIP);
        let del = self.column(COL_DEL);
        let pu = self.column(COL_PU);

        self.rows
            .iter()
            .enumerate()
            .map(|(row_index, row)| ContactRecord {
                row_index,
                contact_name: self.text(row, contact),
                customer_name: self.text(row, customer),
                email: self.text(row, email),
                phone: self.cell(row, phone).cloned(),
                salesperson: self.text(row, salesperson),
                business_type: self.text(row, business_type),
                address_1: self.text(row, address_1),
                address_2: self.text(row, address_2),
                city: self.text(row, city),
                state: self.text(row, state),
                zip: self.text(row, zip),
                del: self.text(row, del),
                pu: self.text(row, pu),
            })
            .collect()
    }
}
