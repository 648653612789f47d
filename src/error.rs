use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CleanerError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("Workbook write error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("Input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("Unsupported input file type: {0}")]
    UnsupportedInput(String),

    #[error("Failed to read sheet: {0}")]
    SheetRead(String),

    #[error("Remote LLM request failed: {0}")]
    RemoteLlm(String),

    #[error("Local LLM request failed: {0}")]
    LocalLlm(String),

    #[error("Failed to write output: {0}")]
    OutputWrite(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration: {}", .0.join("; "))]
    ConfigValidation(Vec<String>),
}

impl CleanerError {
    /// Per-row tier failures are recovered by the cascade; everything else aborts the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CleanerError::RemoteLlm(_)
                | CleanerError::LocalLlm(_)
                | CleanerError::Http(_)
                | CleanerError::Json(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CleanerError>;
