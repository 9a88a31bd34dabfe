use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{Result, SalesReportError};
use crate::locale::MonthNames;
use crate::table::{Cell, RawTable};

pub const DATE_HEADER: &str = "fecha";

pub const COL_DATE: &str = "fecha";
pub const COL_CLIENT: &str = "cliente";
pub const COL_CATEGORY: &str = "categoria";
pub const COL_AMOUNT: &str = "venta";
pub const COL_MONTH: &str = "mes";
pub const COL_MONTH_NAME: &str = "mes_nombre";
pub const COL_YEAR: &str = "anio";
pub const COL_PERIOD: &str = "periodo";

/// Headers of the semantic columns besides the date, matched case- and
/// whitespace-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub client: String,
    pub category: String,
    pub amount: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            client: "cliente".to_string(),
            category: "categoria".to_string(),
            amount: "venta".to_string(),
        }
    }
}

/// A (year, month) pair; orders chronologically and prints as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    pub year: i32,
    pub month: u32,
}

impl Period {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SalesRecord {
    pub date: NaiveDate,
    pub client: String,
    pub category: String,
    pub amount: f64,
    pub month: u32,
    pub month_name: String,
    pub year: i32,
    pub period: Period,
}

/// Normalized sales rows, one per input record, with derived calendar columns.
#[derive(Clone)]
pub struct SalesFrame(pub LazyFrame);

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];
const DAY_FORMATS: [&str; 5] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d/%m/%Y", "%d-%m-%Y"];

pub fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    DAY_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                .map(|dt| dt.date())
        })
}

fn sheet_row(data_row: usize) -> usize {
    data_row + 2
}

fn parse_error(row: usize, column: &str, cell: &Cell) -> SalesReportError {
    SalesReportError::ParseError {
        row: sheet_row(row),
        column: column.to_string(),
        value: cell.display(),
    }
}

fn parse_date_cell(cell: &Cell, row: usize, column: &str) -> Result<NaiveDate> {
    match cell {
        Cell::DateTime(dt) => Ok(dt.date()),
        Cell::Text(text) => parse_date_text(text).ok_or_else(|| parse_error(row, column, cell)),
        _ => Err(parse_error(row, column, cell)),
    }
}

fn parse_amount_cell(cell: &Cell, row: usize, column: &str) -> Result<f64> {
    if cell.is_empty() {
        warn!(row = sheet_row(row), column, "blank amount counted as zero");
        return Ok(0.0);
    }
    let value = match cell {
        Cell::Number(value) => Some(*value),
        Cell::Text(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    // NaN and infinities never become amounts.
    value
        .filter(|value| value.is_finite())
        .ok_or_else(|| parse_error(row, column, cell))
}

/// Parse every row of `table` into typed records. Any unparseable date or
/// amount rejects the whole table.
pub fn parse_records(
    table: &RawTable,
    columns: &ColumnNames,
    months: &dyn MonthNames,
) -> Result<Vec<SalesRecord>> {
    let date_idx = table.column_index(DATE_HEADER)?;
    let client_idx = table.column_index(&columns.client)?;
    let category_idx = table.column_index(&columns.category)?;
    let amount_idx = table.column_index(&columns.amount)?;
    let date_header = &table.headers[date_idx];
    let amount_header = &table.headers[amount_idx];

    (0..table.len())
        .map(|row| {
            let date = parse_date_cell(table.cell(row, date_idx), row, date_header)?;
            let amount = parse_amount_cell(table.cell(row, amount_idx), row, amount_header)?;
            Ok(SalesRecord {
                date,
                client: table.cell(row, client_idx).display(),
                category: table.cell(row, category_idx).display(),
                amount,
                month: date.month(),
                month_name: months.month_name(date.month()),
                year: date.year(),
                period: Period::of(date),
            })
        })
        .collect()
}

pub(crate) fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).expect("valid epoch")
}

pub(crate) fn date_to_polars_days(date: NaiveDate) -> i32 {
    (date - epoch()).num_days() as i32
}

pub fn records_to_polars(records: &[SalesRecord]) -> Result<SalesFrame> {
    let dates: Vec<i32> = records.iter().map(|r| date_to_polars_days(r.date)).collect();
    let clients: Vec<&str> = records.iter().map(|r| r.client.as_str()).collect();
    let categories: Vec<&str> = records.iter().map(|r| r.category.as_str()).collect();
    let amounts: Vec<f64> = records.iter().map(|r| r.amount).collect();
    let months: Vec<i32> = records.iter().map(|r| r.month as i32).collect();
    let month_names: Vec<&str> = records.iter().map(|r| r.month_name.as_str()).collect();
    let years: Vec<i32> = records.iter().map(|r| r.year).collect();
    let periods: Vec<String> = records.iter().map(|r| r.period.to_string()).collect();
    let periods: Vec<&str> = periods.iter().map(String::as_str).collect();

    let date_column = Column::new(COL_DATE.into(), &dates).cast(&DataType::Date)?;
    let df = DataFrame::new(vec![
        date_column,
        Column::new(COL_CLIENT.into(), &clients),
        Column::new(COL_CATEGORY.into(), &categories),
        Column::new(COL_AMOUNT.into(), &amounts),
        Column::new(COL_MONTH.into(), &months),
        Column::new(COL_MONTH_NAME.into(), &month_names),
        Column::new(COL_YEAR.into(), &years),
        Column::new(COL_PERIOD.into(), &periods),
    ])?;

    Ok(SalesFrame(df.lazy()))
}

/// Locate the date column, parse it, and derive month, month name, year and
/// period for every record. The input table is left untouched.
pub fn normalize(
    table: &RawTable,
    columns: &ColumnNames,
    months: &dyn MonthNames,
) -> Result<SalesFrame> {
    let records = parse_records(table, columns, months)?;
    debug!(records = records.len(), "normalized sales records");
    records_to_polars(&records)
}

impl SalesFrame {
    pub fn collect(&self) -> Result<DataFrame> {
        Ok(self.0.clone().collect()?)
    }

    /// Distinct values of a string column in order of first appearance.
    fn distinct(&self, column: &str) -> Result<Vec<String>> {
        let df = self.collect()?;
        let values = df.column(column)?.str()?;
        let mut seen = std::collections::HashSet::new();
        Ok(values
            .into_iter()
            .flatten()
            .filter(|value| seen.insert(*value))
            .map(str::to_string)
            .collect())
    }

    pub fn distinct_clients(&self) -> Result<Vec<String>> {
        self.distinct(COL_CLIENT)
    }

    pub fn distinct_categories(&self) -> Result<Vec<String>> {
        self.distinct(COL_CATEGORY)
    }

    /// Earliest and latest record date, `None` when there are no records.
    pub fn date_bounds(&self) -> Result<Option<(NaiveDate, NaiveDate)>> {
        let dates = self.dates()?;
        Ok(dates
            .iter()
            .min()
            .copied()
            .zip(dates.iter().max().copied()))
    }

    pub fn dates(&self) -> Result<Vec<NaiveDate>> {
        let df = self.collect()?;
        let days = df.column(COL_DATE)?.cast(&DataType::Int32)?;
        let epoch = epoch();
        Ok(days
            .i32()?
            .into_iter()
            .flatten()
            .map(|d| epoch + chrono::Duration::days(d as i64))
            .collect())
    }

    pub fn height(&self) -> Result<usize> {
        Ok(self.collect()?.height())
    }
}
