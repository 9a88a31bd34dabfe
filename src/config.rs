use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::locale::Locale;
use crate::schema::ColumnNames;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub enum SimpleOutputFormat {
    #[serde(rename = "polars_print")]
    PolarsPrint,
    #[serde(rename = "csv_print")]
    CsvPrint,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum OutputFormat {
    Simple(SimpleOutputFormat),
    #[serde(rename_all = "camelCase")]
    CsvFile { csv_output: PathBuf },
    #[serde(rename_all = "camelCase")]
    PdfFile { pdf_output: PathBuf },
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Simple(SimpleOutputFormat::PolarsPrint)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub input: PathBuf,
    /// Allowed clients; every client in the data when absent.
    #[serde(default)]
    pub clients: Option<Vec<String>>,
    /// Allowed categories; every category in the data when absent.
    #[serde(default)]
    pub categories: Option<Vec<String>>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub locale: Locale,
    #[serde(default)]
    pub columns: ColumnNames,
    #[serde(default)]
    pub output_format: OutputFormat,
}

pub fn parse_config(contents: &str) -> Result<Config> {
    serde_json::from_str(contents).with_context(|| "parsing config JSON")
}

pub fn load_config(path: &Path) -> Result<Config> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("reading config from {path:?}"))?;
    parse_config(&contents)
}
