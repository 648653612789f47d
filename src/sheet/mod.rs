//! Workbook input and output.

pub mod reader;
pub mod writer;

pub use reader::{read_source, SourceTable};
pub use writer::{write_contact_workbook, write_survey_workbook, ContactExportRow, RemovedRow, SurveyRow};
