use chrono::NaiveDate;
use thiserror::Error;

/// Problems with the shape of the input table, detected before any row is read.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaIssue {
    #[error("no column named {expected:?} (available: {})", available.join(", "))]
    MissingColumn {
        expected: String,
        available: Vec<String>,
    },

    #[error("column {expected:?} is ambiguous, matched by {}", matches.join(", "))]
    AmbiguousColumn {
        expected: String,
        matches: Vec<String>,
    },

    #[error("unsupported input format {0:?} (expected .xlsx, .xlsm, .xls, .ods or .csv)")]
    UnsupportedFormat(String),

    #[error("workbook has no worksheets")]
    NoWorksheet,
}

#[derive(Error, Debug)]
pub enum SalesReportError {
    #[error("Schema error: {0}")]
    SchemaError(#[from] SchemaIssue),

    #[error("Could not parse {column} value {value:?} in row {row}")]
    ParseError {
        row: usize,
        column: String,
        value: String,
    },

    #[error("Invalid date range: start {start} is after end {end}")]
    FilterError { start: NaiveDate, end: NaiveDate },

    #[error("Failed to build {artifact}: {reason}")]
    ReportBuildError { artifact: String, reason: String },

    #[error("Spreadsheet error: {0}")]
    SpreadsheetError(#[from] calamine::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Dataframe error: {0}")]
    PolarsError(#[from] polars::error::PolarsError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl SalesReportError {
    pub fn report_build(artifact: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::ReportBuildError {
            artifact: artifact.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SalesReportError>;
