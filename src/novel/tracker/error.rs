use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, TrackerError>;

/// Error type covering every way a recording run can fail. None of these are
/// retried: a run either completes or stops at the first error.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Wrapper for IO failures such as reading documents or the workbook file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when the JSON configuration file cannot be parsed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Errors bubbled up from the Excel writer implementation.
    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Errors bubbled up from the Excel reader implementation.
    #[error("Excel read error: {0}")]
    ExcelRead(#[from] calamine::XlsxError),

    /// Raised when a document lacks the `---` delimited header block.
    #[error("malformed document '{document}': {reason}")]
    MalformedDocument { document: String, reason: String },

    /// Raised when the aggregated character count cannot be recorded.
    #[error("invalid measurement: {0}")]
    InvalidMeasurement(String),

    /// Raised when the configured target sheet does not exist.
    #[error("sheet '{0}' not found in workbook")]
    MissingSheet(String),

    /// Raised when the configuration is internally inconsistent.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Raised when a workbook does not follow the expected conventions.
    #[error("invalid workbook structure: {0}")]
    InvalidWorkbook(String),

    /// Raised when the user provides a path that does not exist.
    #[error("input path not found: {0}")]
    MissingInput(PathBuf),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}
