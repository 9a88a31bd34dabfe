use crate::aggregate::SummaryMetrics;
use crate::charts::{ChartArtifact, ChartSet};
use crate::locale::STRINGS;

pub const CURRENCY: &str = "$";
pub const CURRENCY_DECIMALS: usize = 2;
pub const BLOCK_SPACING: f32 = 12.0;

/// `$1,234.56` style; negative amounts as `-$25.00`. Values that round to
/// zero never carry a sign.
pub fn format_currency(value: f64) -> String {
    let scale = 10f64.powi(CURRENCY_DECIMALS as i32);
    let rounded = (value * scale).round() / scale;
    let sign = if rounded < 0.0 { "-" } else { "" };
    format!(
        "{sign}{CURRENCY}{}",
        group_thousands(rounded.abs(), CURRENCY_DECIMALS)
    )
}

/// Fixed-point rendering of a non-negative `value` with a comma between
/// each group of three integer digits.
fn group_thousands(value: f64, decimals: usize) -> String {
    let fixed = format!("{value:.decimals$}");
    let (digits, fraction) = match fixed.split_once('.') {
        Some((digits, fraction)) => (digits, Some(fraction)),
        None => (fixed.as_str(), None),
    };

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, digit) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    match fraction {
        Some(fraction) => format!("{grouped}.{fraction}"),
        None => grouped,
    }
}

/// A bold label followed by its value, one per line of the summary.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricLine {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReportBlock {
    Title(String),
    Paragraph(String),
    Metrics(Vec<MetricLine>),
    Chart(ChartArtifact),
    Spacer(f32),
}

/// Ordered content of the PDF report. Built once per export and not
/// modified afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportDocument {
    title: String,
    blocks: Vec<ReportBlock>,
}

impl ReportDocument {
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn blocks(&self) -> &[ReportBlock] {
        &self.blocks
    }

    pub fn charts(&self) -> impl Iterator<Item = &ChartArtifact> {
        self.blocks.iter().filter_map(|block| match block {
            ReportBlock::Chart(chart) => Some(chart),
            _ => None,
        })
    }
}

pub fn summary_lines(summary: &SummaryMetrics) -> Vec<MetricLine> {
    vec![
        MetricLine {
            label: STRINGS.records_found.to_string(),
            value: summary.record_count.to_string(),
        },
        MetricLine {
            label: STRINGS.total.to_string(),
            value: format_currency(summary.total),
        },
        MetricLine {
            label: STRINGS.tax.to_string(),
            value: format_currency(summary.tax),
        },
        MetricLine {
            label: STRINGS.net.to_string(),
            value: format_currency(summary.net),
        },
        MetricLine {
            label: STRINGS.average_ticket.to_string(),
            value: format_currency(summary.average_ticket),
        },
    ]
}

/// Intro text followed by the headline figures of the filtered sales.
pub fn narrative(summary: &SummaryMetrics) -> String {
    format!(
        "{} Se registraron {} ventas por un total de {}, con un IVA de {}, un neto de {} \
         y un ticket promedio por cliente de {}.",
        STRINGS.intro,
        summary.record_count,
        format_currency(summary.total),
        format_currency(summary.tax),
        format_currency(summary.net),
        format_currency(summary.average_ticket),
    )
}

/// Title, narrative summary, then every chart in `charts` order, each
/// followed by spacing.
pub fn build_report_document(summary: &SummaryMetrics, charts: ChartSet) -> ReportDocument {
    let mut blocks = vec![
        ReportBlock::Title(STRINGS.report_title.to_string()),
        ReportBlock::Spacer(BLOCK_SPACING),
        ReportBlock::Paragraph(narrative(summary)),
        ReportBlock::Metrics(summary_lines(summary)),
        ReportBlock::Spacer(BLOCK_SPACING),
    ];
    for chart in charts.into_values() {
        blocks.push(ReportBlock::Chart(chart));
        blocks.push(ReportBlock::Spacer(BLOCK_SPACING));
    }

    ReportDocument {
        title: STRINGS.report_title.to_string(),
        blocks,
    }
}

/// Greedy word wrap on an estimated character budget.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
