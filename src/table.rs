use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};
use chrono::NaiveDateTime;
use tracing::{debug, info};

use crate::error::{Result, SchemaIssue};

/// A single input cell, as much typed as the source format allows.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(text) => text.trim().is_empty(),
            _ => false,
        }
    }

    /// Text rendering used for identifier columns and error messages.
    pub fn display(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(text) => text.trim().to_string(),
            Cell::Number(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
                format!("{}", *value as i64)
            }
            Cell::Number(value) => value.to_string(),
            Cell::Bool(value) => value.to_string(),
            Cell::DateTime(value) => value.to_string(),
        }
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => Cell::Empty,
            Data::String(text) | Data::DateTimeIso(text) | Data::DurationIso(text) => {
                Cell::Text(text.clone())
            }
            Data::Float(value) => Cell::Number(*value),
            Data::Int(value) => Cell::Number(*value as f64),
            Data::Bool(value) => Cell::Bool(*value),
            Data::DateTime(value) => value
                .as_datetime()
                .map(Cell::DateTime)
                .unwrap_or_else(|| Cell::Text(data.to_string())),
            Data::Error(_) => Cell::Text(data.to_string()),
        }
    }
}

/// Header row plus data rows, straight from the source file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

pub fn normalize_header(header: &str) -> String {
    header.trim().to_lowercase()
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self { headers, rows }
    }

    /// Index of the single column whose trimmed, lowercased header equals `name`.
    pub fn column_index(&self, name: &str) -> Result<usize> {
        let expected = normalize_header(name);
        let matches: Vec<usize> = self
            .headers
            .iter()
            .enumerate()
            .filter(|(_, header)| normalize_header(header) == expected)
            .map(|(idx, _)| idx)
            .collect();

        match matches.as_slice() {
            [idx] => Ok(*idx),
            [] => Err(SchemaIssue::MissingColumn {
                expected,
                available: self.headers.clone(),
            }
            .into()),
            _ => Err(SchemaIssue::AmbiguousColumn {
                expected,
                matches: matches.iter().map(|&idx| self.headers[idx].clone()).collect(),
            }
            .into()),
        }
    }

    pub fn cell(&self, row: usize, column: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(column))
            .unwrap_or(&Cell::Empty)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn from_grid(mut grid: Vec<Vec<Cell>>) -> RawTable {
    if grid.is_empty() {
        return RawTable::default();
    }
    let headers = grid.remove(0).iter().map(Cell::display).collect();
    let rows = grid
        .into_iter()
        .filter(|row| !row.iter().all(Cell::is_empty))
        .collect();
    RawTable { headers, rows }
}

fn read_spreadsheet(path: &Path) -> Result<RawTable> {
    let mut workbook = open_workbook_auto(path)?;
    let first_sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(SchemaIssue::NoWorksheet)?;
    debug!(sheet = %first_sheet, "reading worksheet");

    let range = workbook.worksheet_range(&first_sheet)?;
    let grid = range
        .rows()
        .map(|row| row.iter().map(Cell::from).collect())
        .collect();
    Ok(from_grid(grid))
}

fn read_csv(path: &Path) -> Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut grid = Vec::new();
    for record in reader.records() {
        let record = record?;
        grid.push(
            record
                .iter()
                .map(|value| {
                    if value.trim().is_empty() {
                        Cell::Empty
                    } else {
                        Cell::Text(value.to_string())
                    }
                })
                .collect(),
        );
    }
    Ok(from_grid(grid))
}

/// Load the first worksheet (or the CSV file) at `path`.
pub fn read_table(path: &Path) -> Result<RawTable> {
    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    let table = match extension.as_str() {
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => read_spreadsheet(path)?,
        "csv" => read_csv(path)?,
        _ => return Err(SchemaIssue::UnsupportedFormat(extension).into()),
    };
    info!(
        path = %path.display(),
        columns = table.headers.len(),
        rows = table.len(),
        "loaded input table"
    );
    Ok(table)
}
