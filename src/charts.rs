use std::f64::consts::TAU;

use indexmap::IndexMap;
use plotters::prelude::*;
use tracing::debug;

use crate::aggregate::{AggregateSeries, MonthYearMatrix, SalesAggregates, SupplierKind, SupplierSplit};
use crate::error::{Result, SalesReportError};
use crate::locale::{SPLIT_LABELS, STRINGS};

pub const BAR_CANVAS: (u32, u32) = (1000, 400);
pub const PIE_CANVAS: (u32, u32) = (600, 600);
const PLOT_MARGIN: u32 = 40;

pub const BAR_COLOR: RGBColor = RGBColor(0x87, 0xce, 0xeb);
pub const YEAR_COLORS: [RGBColor; 2] = [RGBColor(0x1f, 0x77, 0xb4), RGBColor(0xff, 0x7f, 0x0e)];
pub const PALETTE: [RGBColor; 10] = [
    RGBColor(0x1f, 0x77, 0xb4),
    RGBColor(0xff, 0x7f, 0x0e),
    RGBColor(0x2c, 0xa0, 0x2c),
    RGBColor(0xd6, 0x27, 0x28),
    RGBColor(0x94, 0x67, 0xbd),
    RGBColor(0x8c, 0x56, 0x4b),
    RGBColor(0xe3, 0x77, 0xc2),
    RGBColor(0x7f, 0x7f, 0x7f),
    RGBColor(0xbc, 0xbd, 0x22),
    RGBColor(0x17, 0xbe, 0xcf),
];
const AXIS_COLOR: RGBColor = RGBColor(0x33, 0x33, 0x33);
const GRID_COLOR: RGBColor = RGBColor(0xdd, 0xdd, 0xdd);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartKind {
    MonthlyTotals,
    SalesByClient,
    SalesByCategory,
    YearlyTotals,
    YearOverYear,
    SupplierSplit,
}

impl ChartKind {
    pub const ALL: [ChartKind; 6] = [
        ChartKind::MonthlyTotals,
        ChartKind::SalesByClient,
        ChartKind::SalesByCategory,
        ChartKind::YearlyTotals,
        ChartKind::YearOverYear,
        ChartKind::SupplierSplit,
    ];

    pub fn key(self) -> &'static str {
        match self {
            ChartKind::MonthlyTotals => "monthly_totals",
            ChartKind::SalesByClient => "sales_by_client",
            ChartKind::SalesByCategory => "sales_by_category",
            ChartKind::YearlyTotals => "yearly_totals",
            ChartKind::YearOverYear => "year_over_year",
            ChartKind::SupplierSplit => "supplier_split",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ChartKind::MonthlyTotals => STRINGS.monthly_totals,
            ChartKind::SalesByClient => STRINGS.sales_by_client,
            ChartKind::SalesByCategory => STRINGS.sales_by_category,
            ChartKind::YearlyTotals => STRINGS.yearly_totals,
            ChartKind::YearOverYear => STRINGS.year_over_year,
            ChartKind::SupplierSplit => STRINGS.supplier_split,
        }
    }

    pub fn is_square(self) -> bool {
        self == ChartKind::SupplierSplit
    }
}

/// A category label and where its slot is centred, as a fraction of the
/// canvas width.
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub label: String,
    pub x: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub label: String,
    pub color: [u8; 3],
}

/// A rendered chart: an RGB bitmap without glyphs plus the text that goes
/// around it.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartArtifact {
    pub kind: ChartKind,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub ticks: Vec<Tick>,
    pub legend: Vec<LegendEntry>,
    pub y_range: (f64, f64),
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl ChartArtifact {
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = ((y * self.width + x) * 3) as usize;
        self.pixels
            .get(offset..offset + 3)
            .map(|rgb| [rgb[0], rgb[1], rgb[2]])
    }
}

pub type ChartSet = IndexMap<ChartKind, ChartArtifact>;

fn rgb(color: &RGBColor) -> [u8; 3] {
    [color.0, color.1, color.2]
}

fn draw_error<E: std::fmt::Display>(kind: ChartKind) -> impl Fn(E) -> SalesReportError {
    move |err| SalesReportError::report_build(format!("chart {}", kind.key()), err)
}

/// Value axis covering zero and every value, never degenerate.
fn value_range(min: f64, max: f64) -> (f64, f64) {
    let low = min.min(0.0);
    let high = max.max(0.0);
    if high - low <= f64::EPSILON {
        (0.0, 1.0)
    } else {
        (low, high + (high - low) * 0.05)
    }
}

fn tick_positions(labels: &[&str], width: u32) -> Vec<Tick> {
    let plot_width = f64::from(width - 2 * PLOT_MARGIN);
    let slot = plot_width / labels.len().max(1) as f64;
    labels
        .iter()
        .enumerate()
        .map(|(idx, label)| Tick {
            label: label.to_string(),
            x: (f64::from(PLOT_MARGIN) + slot * (idx as f64 + 0.5)) / f64::from(width),
        })
        .collect()
}

struct Bar {
    slot: usize,
    offset: f64,
    width: f64,
    value: f64,
    color: RGBColor,
}

fn render_bar_canvas(
    kind: ChartKind,
    slots: usize,
    bars: &[Bar],
    y_range: (f64, f64),
) -> Result<Vec<u8>> {
    let (width, height) = BAR_CANVAS;
    let mut pixels = vec![0u8; (width * height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut pixels, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(draw_error(kind))?;

        let x_max = slots.max(1) as f64;
        let mut chart = ChartBuilder::on(&root)
            .margin(PLOT_MARGIN)
            .build_cartesian_2d(0.0..x_max, y_range.0..y_range.1)
            .map_err(draw_error(kind))?;

        let grid_step = (y_range.1 - y_range.0) / 5.0;
        chart
            .draw_series((1..=5).map(|step| {
                let y = y_range.0 + grid_step * step as f64;
                PathElement::new(vec![(0.0, y), (x_max, y)], GRID_COLOR.stroke_width(1))
            }))
            .map_err(draw_error(kind))?;

        chart
            .draw_series(bars.iter().map(|bar| {
                let x0 = bar.slot as f64 + bar.offset;
                Rectangle::new([(x0, 0.0), (x0 + bar.width, bar.value)], bar.color.filled())
            }))
            .map_err(draw_error(kind))?;

        chart
            .draw_series([
                PathElement::new(vec![(0.0, 0.0), (x_max, 0.0)], AXIS_COLOR.stroke_width(1)),
                PathElement::new(
                    vec![(0.0, y_range.0), (0.0, y_range.1)],
                    AXIS_COLOR.stroke_width(1),
                ),
            ])
            .map_err(draw_error(kind))?;

        root.present().map_err(draw_error(kind))?;
    }
    Ok(pixels)
}

/// One bar per entry, in series order. `colors` cycles over the bars and
/// must not be empty.
pub fn bar_chart(
    kind: ChartKind,
    series: &AggregateSeries,
    colors: &[RGBColor],
    x_label: &str,
) -> Result<ChartArtifact> {
    if colors.is_empty() {
        return Err(SalesReportError::report_build(
            format!("chart {}", kind.key()),
            "no bar colors given",
        ));
    }
    let values = series.values();
    let y_range = value_range(
        values.iter().copied().fold(0.0, f64::min),
        values.iter().copied().fold(0.0, f64::max),
    );
    let bars: Vec<Bar> = values
        .iter()
        .enumerate()
        .map(|(slot, value)| Bar {
            slot,
            offset: 0.25,
            width: 0.5,
            value: *value,
            color: colors[slot % colors.len()],
        })
        .collect();
    let pixels = render_bar_canvas(kind, values.len(), &bars, y_range)?;

    let (width, height) = BAR_CANVAS;
    Ok(ChartArtifact {
        kind,
        title: kind.title().to_string(),
        x_label: x_label.to_string(),
        y_label: STRINGS.amount_axis.to_string(),
        ticks: tick_positions(&series.labels(), width),
        legend: Vec::new(),
        y_range,
        width,
        height,
        pixels,
    })
}

/// Months on the x axis, one bar per year side by side within each month.
pub fn grouped_bar_chart(matrix: &MonthYearMatrix) -> Result<ChartArtifact> {
    let kind = ChartKind::YearOverYear;
    let y_range = value_range(matrix.min_value(), matrix.max_value());
    let group_width = 0.8;
    let bar_width = group_width / matrix.years.len().max(1) as f64;

    let bars: Vec<Bar> = matrix
        .values
        .iter()
        .enumerate()
        .flat_map(|(slot, row)| {
            row.iter().enumerate().map(move |(year_idx, value)| Bar {
                slot,
                offset: 0.1 + bar_width * year_idx as f64,
                width: bar_width,
                value: *value,
                color: PALETTE[year_idx % PALETTE.len()],
            })
        })
        .collect();
    let pixels = render_bar_canvas(kind, matrix.months.len(), &bars, y_range)?;

    let (width, height) = BAR_CANVAS;
    Ok(ChartArtifact {
        kind,
        title: kind.title().to_string(),
        x_label: STRINGS.month_axis.to_string(),
        y_label: STRINGS.amount_axis.to_string(),
        ticks: tick_positions(&matrix.month_names(), width),
        legend: matrix
            .years
            .iter()
            .enumerate()
            .map(|(idx, year)| LegendEntry {
                label: year.to_string(),
                color: rgb(&PALETTE[idx % PALETTE.len()]),
            })
            .collect(),
        y_range,
        width,
        height,
        pixels,
    })
}

fn slice_points(start: f64, sweep: f64) -> Vec<(f64, f64)> {
    let steps = ((sweep / TAU) * 180.0).ceil().max(2.0) as usize;
    let mut points = vec![(0.0, 0.0)];
    points.extend((0..=steps).map(|step| {
        let angle = start + sweep * step as f64 / steps as f64;
        (angle.cos(), angle.sin())
    }));
    points
}

/// Pie of New vs Recurring counts, counter-clockwise from three o'clock.
pub fn pie_chart(split: &SupplierSplit) -> Result<ChartArtifact> {
    let kind = ChartKind::SupplierSplit;
    let slices = [
        (SPLIT_LABELS.new, split.new, PALETTE[0]),
        (SPLIT_LABELS.recurring, split.recurring, PALETTE[1]),
    ];
    let (width, height) = PIE_CANVAS;
    let mut pixels = vec![0u8; (width * height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut pixels, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(draw_error(kind))?;
        let mut chart = ChartBuilder::on(&root)
            .margin(PLOT_MARGIN)
            .build_cartesian_2d(-1.05..1.05, -1.05..1.05)
            .map_err(draw_error(kind))?;

        let total = split.total();
        if total == 0 {
            chart
                .draw_series(std::iter::once(PathElement::new(
                    slice_points(0.0, TAU).split_off(1),
                    GRID_COLOR.stroke_width(2),
                )))
                .map_err(draw_error(kind))?;
        } else {
            let mut start = 0.0;
            for (_, count, color) in slices.iter().filter(|(_, count, _)| *count > 0) {
                let sweep = TAU * *count as f64 / total as f64;
                chart
                    .draw_series(std::iter::once(Polygon::new(
                        slice_points(start, sweep),
                        color.filled(),
                    )))
                    .map_err(draw_error(kind))?;
                start += sweep;
            }
        }
        root.present().map_err(draw_error(kind))?;
    }

    Ok(ChartArtifact {
        kind,
        title: kind.title().to_string(),
        x_label: String::new(),
        y_label: String::new(),
        ticks: Vec::new(),
        legend: slices
            .iter()
            .zip([SupplierKind::New, SupplierKind::Recurring])
            .map(|((label, _, color), supplier)| LegendEntry {
                label: format!("{label} {:.1}%", split.percent(supplier)),
                color: rgb(color),
            })
            .collect(),
        y_range: (0.0, 0.0),
        width,
        height,
        pixels,
    })
}

/// All six report charts in report order.
pub fn build_charts(aggregates: &SalesAggregates) -> Result<ChartSet> {
    let mut charts = ChartSet::new();
    let mut insert = |artifact: ChartArtifact| {
        debug!(chart = artifact.kind.key(), "rendered chart");
        charts.insert(artifact.kind, artifact);
    };

    insert(bar_chart(
        ChartKind::MonthlyTotals,
        &aggregates.by_period,
        &[BAR_COLOR],
        "",
    )?);
    insert(bar_chart(
        ChartKind::SalesByClient,
        &aggregates.by_client,
        &[BAR_COLOR],
        "",
    )?);
    insert(bar_chart(
        ChartKind::SalesByCategory,
        &aggregates.by_category,
        &[BAR_COLOR],
        "",
    )?);
    insert(bar_chart(
        ChartKind::YearlyTotals,
        &aggregates.by_year,
        &YEAR_COLORS,
        "",
    )?);
    insert(grouped_bar_chart(&aggregates.month_year)?);
    insert(pie_chart(&aggregates.supplier_split)?);
    Ok(charts)
}
