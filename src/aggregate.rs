use indexmap::IndexMap;
use polars::prelude::*;
use tracing::{debug, info};

use crate::error::Result;
use crate::locale::{MonthNames, SPLIT_LABELS};
use crate::schema::{
    COL_AMOUNT, COL_CATEGORY, COL_CLIENT, COL_MONTH, COL_PERIOD, COL_YEAR, SalesFrame,
};

pub const TAX_RATE: f64 = 0.19;

pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Ordered group key to summed amount.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AggregateSeries {
    pub entries: Vec<(String, f64)>,
}

impl AggregateSeries {
    pub fn labels(&self) -> Vec<&str> {
        self.entries.iter().map(|(key, _)| key.as_str()).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.entries.iter().map(|(_, value)| *value).collect()
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, value)| *value)
    }

    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, value)| value).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_frame(&self, key_column: &str) -> Result<DataFrame> {
        let keys = self.labels();
        let values = self.values();
        Ok(DataFrame::new(vec![
            Column::new(key_column.into(), &keys),
            Column::new(COL_AMOUNT.into(), &values),
        ])?)
    }
}

/// Sales summed by calendar month (rows) and year (columns). Months are in
/// calendar order; absent (month, year) pairs hold zero.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MonthYearMatrix {
    pub months: Vec<(u32, String)>,
    pub years: Vec<i32>,
    pub values: Vec<Vec<f64>>,
}

impl MonthYearMatrix {
    pub fn value(&self, month: u32, year: i32) -> Option<f64> {
        let row = self.months.iter().position(|(m, _)| *m == month)?;
        let column = self.years.iter().position(|y| *y == year)?;
        Some(self.values[row][column])
    }

    pub fn month_names(&self) -> Vec<&str> {
        self.months.iter().map(|(_, name)| name.as_str()).collect()
    }

    pub fn max_value(&self) -> f64 {
        self.values
            .iter()
            .flatten()
            .copied()
            .fold(0.0_f64, f64::max)
    }

    pub fn min_value(&self) -> f64 {
        self.values
            .iter()
            .flatten()
            .copied()
            .fold(0.0_f64, f64::min)
    }

    pub fn to_frame(&self, month_column: &str) -> Result<DataFrame> {
        let mut columns = vec![Column::new(month_column.into(), &self.month_names())];
        for (idx, year) in self.years.iter().enumerate() {
            let values: Vec<f64> = self.values.iter().map(|row| row[idx]).collect();
            columns.push(Column::new(year.to_string().into(), &values));
        }
        Ok(DataFrame::new(columns)?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SupplierKind {
    New,
    Recurring,
}

/// `keyword` is expected in lowercase; the category is matched case-insensitively.
pub fn classify_category(category: &str, keyword: &str) -> SupplierKind {
    if category.to_lowercase().contains(keyword) {
        SupplierKind::New
    } else {
        SupplierKind::Recurring
    }
}

/// Record counts per supplier class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SupplierSplit {
    pub new: usize,
    pub recurring: usize,
}

impl SupplierSplit {
    pub fn add(&mut self, kind: SupplierKind) {
        match kind {
            SupplierKind::New => self.new += 1,
            SupplierKind::Recurring => self.recurring += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.new + self.recurring
    }

    /// Percentage of records in `kind`, zero when there are no records.
    pub fn percent(&self, kind: SupplierKind) -> f64 {
        let count = match kind {
            SupplierKind::New => self.new,
            SupplierKind::Recurring => self.recurring,
        };
        if self.total() == 0 {
            0.0
        } else {
            count as f64 * 100.0 / self.total() as f64
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SummaryMetrics {
    pub record_count: usize,
    pub total: f64,
    pub tax: f64,
    pub net: f64,
    /// Mean of the per-client totals; zero when no client is present.
    pub average_ticket: f64,
}

impl SummaryMetrics {
    pub fn compute(record_count: usize, total: f64, per_client_totals: &[f64]) -> Self {
        let tax = round_cents(total * TAX_RATE);
        let average_ticket = if per_client_totals.is_empty() {
            0.0
        } else {
            per_client_totals.iter().sum::<f64>() / per_client_totals.len() as f64
        };
        Self {
            record_count,
            total,
            tax,
            net: total - tax,
            average_ticket,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SalesAggregates {
    pub by_period: AggregateSeries,
    pub by_client: AggregateSeries,
    pub by_category: AggregateSeries,
    pub by_year: AggregateSeries,
    pub month_year: MonthYearMatrix,
    pub supplier_split: SupplierSplit,
    pub summary: SummaryMetrics,
}

enum KeyOrder {
    Ascending,
    LargestFirst,
}

fn sum_by(df: &DataFrame, key: &str, order: KeyOrder) -> Result<AggregateSeries> {
    let grouped = df
        .clone()
        .lazy()
        .group_by([col(key)])
        .agg([col(COL_AMOUNT).sum().alias(COL_AMOUNT)]);
    let sorted = match order {
        KeyOrder::Ascending => grouped.sort([key], SortMultipleOptions::default()),
        KeyOrder::LargestFirst => grouped.sort(
            [COL_AMOUNT, key],
            SortMultipleOptions::default().with_order_descending_multi([true, false]),
        ),
    };
    let out = sorted.collect()?;

    let keys = out.column(key)?.cast(&DataType::String)?;
    let sums = out.column(COL_AMOUNT)?.f64()?;
    let entries = keys
        .str()?
        .into_iter()
        .zip(sums.into_iter())
        .map(|(k, v)| (k.unwrap_or_default().to_string(), v.unwrap_or(0.0)))
        .collect();
    Ok(AggregateSeries { entries })
}

fn month_year_matrix(df: &DataFrame, months: &dyn MonthNames) -> Result<MonthYearMatrix> {
    let out = df
        .clone()
        .lazy()
        .group_by([col(COL_MONTH), col(COL_YEAR)])
        .agg([col(COL_AMOUNT).sum().alias(COL_AMOUNT)])
        .sort([COL_MONTH, COL_YEAR], SortMultipleOptions::default())
        .collect()?;

    let cells: Vec<(u32, i32, f64)> = out
        .column(COL_MONTH)?
        .i32()?
        .into_iter()
        .zip(out.column(COL_YEAR)?.i32()?.into_iter())
        .zip(out.column(COL_AMOUNT)?.f64()?.into_iter())
        .filter_map(|((m, y), v)| Some((m? as u32, y?, v.unwrap_or(0.0))))
        .collect();

    let mut month_numbers: Vec<u32> = cells.iter().map(|(m, _, _)| *m).collect();
    month_numbers.dedup();
    let mut years: Vec<i32> = cells.iter().map(|(_, y, _)| *y).collect();
    years.sort_unstable();
    years.dedup();

    let mut values = vec![vec![0.0; years.len()]; month_numbers.len()];
    for (month, year, value) in cells {
        let row = month_numbers.iter().position(|m| *m == month);
        let column = years.iter().position(|y| *y == year);
        if let (Some(row), Some(column)) = (row, column) {
            values[row][column] += value;
        }
    }

    Ok(MonthYearMatrix {
        months: month_numbers
            .into_iter()
            .map(|m| (m, months.month_name(m)))
            .collect(),
        years,
        values,
    })
}

fn supplier_split(df: &DataFrame, keyword: &str) -> Result<SupplierSplit> {
    let mut split = SupplierSplit::default();
    for category in df.column(COL_CATEGORY)?.str()?.into_iter() {
        split.add(classify_category(category.unwrap_or_default(), keyword));
    }
    Ok(split)
}

/// Every grouped series, the month by year matrix, the supplier split and
/// the summary scalars for an already filtered frame.
pub fn aggregate(frame: &SalesFrame, months: &dyn MonthNames) -> Result<SalesAggregates> {
    let df = frame.collect()?;
    debug!(records = df.height(), "aggregating sales");

    let by_period = sum_by(&df, COL_PERIOD, KeyOrder::Ascending)?;
    let by_client = sum_by(&df, COL_CLIENT, KeyOrder::LargestFirst)?;
    let by_category = sum_by(&df, COL_CATEGORY, KeyOrder::LargestFirst)?;
    let by_year = sum_by(&df, COL_YEAR, KeyOrder::Ascending)?;
    let month_year = month_year_matrix(&df, months)?;
    let supplier_split = supplier_split(&df, months.new_supplier_keyword())?;

    let total = df
        .column(COL_AMOUNT)?
        .as_materialized_series()
        .f64()?
        .sum()
        .unwrap_or(0.0);
    let summary = SummaryMetrics::compute(df.height(), total, &by_client.values());
    info!(
        records = summary.record_count,
        total = summary.total,
        clients = by_client.len(),
        "aggregated sales"
    );

    Ok(SalesAggregates {
        by_period,
        by_client,
        by_category,
        by_year,
        month_year,
        supplier_split,
        summary,
    })
}

impl SalesAggregates {
    /// Named tables for printing or CSV export, summary first.
    pub fn tables(&self) -> Result<IndexMap<&'static str, DataFrame>> {
        let summary = DataFrame::new(vec![
            Column::new("registros".into(), &[self.summary.record_count as u64]),
            Column::new("total".into(), &[self.summary.total]),
            Column::new("iva".into(), &[self.summary.tax]),
            Column::new("neto".into(), &[self.summary.net]),
            Column::new("ticket_promedio".into(), &[self.summary.average_ticket]),
        ])?;
        let split = DataFrame::new(vec![
            Column::new("tipo_proveedor".into(), &[SPLIT_LABELS.new, SPLIT_LABELS.recurring]),
            Column::new(
                "registros".into(),
                &[
                    self.supplier_split.new as u64,
                    self.supplier_split.recurring as u64,
                ],
            ),
        ])?;

        let mut tables = IndexMap::new();
        tables.insert("summary", summary);
        tables.insert("monthly_totals", self.by_period.to_frame(COL_PERIOD)?);
        tables.insert("sales_by_client", self.by_client.to_frame(COL_CLIENT)?);
        tables.insert("sales_by_category", self.by_category.to_frame(COL_CATEGORY)?);
        tables.insert("yearly_totals", self.by_year.to_frame(COL_YEAR)?);
        tables.insert("year_over_year", self.month_year.to_frame(COL_MONTH)?);
        tables.insert("supplier_split", split);
        Ok(tables)
    }
}
