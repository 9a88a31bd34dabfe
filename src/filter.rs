use chrono::NaiveDate;
use polars::prelude::*;
use tracing::debug;

use crate::error::{Result, SalesReportError};
use crate::schema::{COL_CATEGORY, COL_CLIENT, COL_DATE, SalesFrame, date_to_polars_days, epoch};

/// The user's selection: allowed clients, allowed categories and an
/// inclusive date range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCriteria {
    pub clients: Vec<String>,
    pub categories: Vec<String>,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl FilterCriteria {
    pub fn new(
        clients: Vec<String>,
        categories: Vec<String>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Self> {
        let criteria = Self {
            clients,
            categories,
            start,
            end,
        };
        criteria.validate()?;
        Ok(criteria)
    }

    /// Every client, every category and the full date span of `frame`.
    /// An empty frame gets a single-day range at the epoch.
    pub fn everything(frame: &SalesFrame) -> Result<Self> {
        let (start, end) = frame.date_bounds()?.unwrap_or((epoch(), epoch()));
        Self::new(
            frame.distinct_clients()?,
            frame.distinct_categories()?,
            start,
            end,
        )
    }

    /// The user's partial selection, with every missing part taken from
    /// [`FilterCriteria::everything`]. A missing bound never contradicts a
    /// given one, so a start after the last record yields an empty selection
    /// rather than an error.
    pub fn with_defaults(
        frame: &SalesFrame,
        clients: Option<Vec<String>>,
        categories: Option<Vec<String>>,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Self> {
        let everything = Self::everything(frame)?;
        let (start, end) = match (start, end) {
            (Some(start), Some(end)) => (start, end),
            (Some(start), None) => (start, everything.end.max(start)),
            (None, Some(end)) => (everything.start.min(end), end),
            (None, None) => (everything.start, everything.end),
        };
        Self::new(
            clients.unwrap_or(everything.clients),
            categories.unwrap_or(everything.categories),
            start,
            end,
        )
    }

    pub fn validate(&self) -> Result<()> {
        if self.start > self.end {
            return Err(SalesReportError::FilterError {
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }

    pub fn matches(&self, client: &str, category: &str, date: NaiveDate) -> bool {
        self.clients.iter().any(|c| c == client)
            && self.categories.iter().any(|c| c == category)
            && self.start <= date
            && date <= self.end
    }
}

fn membership(column: &str, allowed: &[String]) -> Expr {
    if allowed.is_empty() {
        return lit(false);
    }
    let values: Vec<&str> = allowed.iter().map(String::as_str).collect();
    let series = Series::new(format!("_{column}_filter").into(), &values);
    col(column).is_in(lit(series))
}

/// Keep the records matching every predicate of `criteria`, preserving
/// their relative order.
pub fn apply_filter(frame: SalesFrame, criteria: &FilterCriteria) -> Result<SalesFrame> {
    criteria.validate()?;
    let start = date_to_polars_days(criteria.start);
    let end = date_to_polars_days(criteria.end);
    debug!(
        clients = criteria.clients.len(),
        categories = criteria.categories.len(),
        start = %criteria.start,
        end = %criteria.end,
        "filtering sales"
    );

    Ok(SalesFrame(
        frame.0.filter(
            membership(COL_CLIENT, &criteria.clients)
                .and(membership(COL_CATEGORY, &criteria.categories))
                .and(col(COL_DATE).cast(DataType::Int32).gt_eq(lit(start)))
                .and(col(COL_DATE).cast(DataType::Int32).lt_eq(lit(end))),
        ),
    ))
}
