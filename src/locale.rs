use serde::Deserialize;

/// Month number (1-12) to display name, plus the vocabulary used to read
/// category labels in the data.
pub trait MonthNames {
    fn month_name(&self, month: u32) -> String;

    /// Lowercase substring marking a category as a new supplier.
    fn new_supplier_keyword(&self) -> &str {
        NEW_SUPPLIER_KEYWORD
    }
}

const MONTHS_ES: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

const MONTHS_EN: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

pub fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum Locale {
    #[default]
    #[serde(rename = "es")]
    Es,
    #[serde(rename = "en")]
    En,
}

impl MonthNames for Locale {
    fn month_name(&self, month: u32) -> String {
        let table = match self {
            Locale::Es => &MONTHS_ES,
            Locale::En => &MONTHS_EN,
        };
        month
            .checked_sub(1)
            .and_then(|idx| table.get(idx as usize))
            .map(|name| capitalize(name))
            .unwrap_or_else(|| month.to_string())
    }

    fn new_supplier_keyword(&self) -> &str {
        match self {
            Locale::Es => NEW_SUPPLIER_KEYWORD,
            Locale::En => "new",
        }
    }
}

/// Labels for the two supplier classes of the categorical split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitLabels {
    pub new: &'static str,
    pub recurring: &'static str,
}

/// Static text used in charts and in the PDF report. Only month names
/// follow the configured [`Locale`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportStrings {
    pub report_title: &'static str,
    pub intro: &'static str,
    pub records_found: &'static str,
    pub total: &'static str,
    pub tax: &'static str,
    pub net: &'static str,
    pub average_ticket: &'static str,
    pub monthly_totals: &'static str,
    pub sales_by_client: &'static str,
    pub sales_by_category: &'static str,
    pub yearly_totals: &'static str,
    pub year_over_year: &'static str,
    pub supplier_split: &'static str,
    pub month_axis: &'static str,
    pub amount_axis: &'static str,
}

pub const STRINGS: ReportStrings = ReportStrings {
    report_title: "Informe Contable Detallado",
    intro: "Este informe presenta un análisis detallado de las ventas, categorizadas por cliente, tipo de proveedor y periodo mensual/anual.",
    records_found: "Registros encontrados",
    total: "Total",
    tax: "IVA (19%)",
    net: "Neto",
    average_ticket: "Ticket Promedio por Cliente",
    monthly_totals: "Total de Compras por Mes",
    sales_by_client: "Ventas por Cliente",
    sales_by_category: "Ventas por Categoría",
    yearly_totals: "Total Ventas por Año",
    year_over_year: "Comparativa Mensual Año a Año",
    supplier_split: "Distribución Tipo Proveedor",
    month_axis: "Mes",
    amount_axis: "Ventas ($)",
};

/// Default new-supplier keyword, as used in Spanish sales sheets.
pub const NEW_SUPPLIER_KEYWORD: &str = "nuevo";

pub const SPLIT_LABELS: SplitLabels = SplitLabels {
    new: "Nuevo",
    recurring: "Frecuente",
};
