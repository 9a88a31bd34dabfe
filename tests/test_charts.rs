use sales_report::aggregate::{AggregateSeries, SalesAggregates, SupplierSplit, aggregate};
use sales_report::charts::{
    BAR_CANVAS, BAR_COLOR, ChartKind, PALETTE, PIE_CANVAS, bar_chart, build_charts, pie_chart,
};
use sales_report::error::SalesReportError;
use sales_report::locale::Locale;
use sales_report::schema::{self, ColumnNames};
use sales_report::table::{Cell, RawTable};

fn sample_aggregates() -> SalesAggregates {
    let rows = [
        ("2022-11-03", "Acme", "Nuevo Proveedor", 120.0),
        ("2023-01-10", "Globex", "Proveedor X", 200.0),
        ("2023-01-22", "Acme", "Servicios", 80.0),
        ("2023-11-15", "Initech", "Proveedor X", 45.5),
    ];
    let table = RawTable::new(
        vec!["fecha".into(), "cliente".into(), "categoria".into(), "venta".into()],
        rows.iter()
            .map(|(day, client, category, amount)| {
                vec![
                    Cell::Text(day.to_string()),
                    Cell::Text(client.to_string()),
                    Cell::Text(category.to_string()),
                    Cell::Number(*amount),
                ]
            })
            .collect(),
    );
    let frame = schema::normalize(&table, &ColumnNames::default(), &Locale::Es).unwrap();
    aggregate(&frame, &Locale::Es).unwrap()
}

#[test]
fn builds_six_charts_in_report_order() {
    let charts = build_charts(&sample_aggregates()).unwrap();
    let kinds: Vec<ChartKind> = charts.keys().copied().collect();
    assert_eq!(kinds, ChartKind::ALL.to_vec());

    let titles: Vec<&str> = charts.values().map(|c| c.title.as_str()).collect();
    insta::assert_snapshot!(titles.join("\n"), @r"
    Total de Compras por Mes
    Ventas por Cliente
    Ventas por Categoría
    Total Ventas por Año
    Comparativa Mensual Año a Año
    Distribución Tipo Proveedor
    ");
}

#[test]
fn canvas_sizes_by_chart_shape() {
    let charts = build_charts(&sample_aggregates()).unwrap();
    for chart in charts.values() {
        let expected = if chart.kind == ChartKind::SupplierSplit {
            PIE_CANVAS
        } else {
            BAR_CANVAS
        };
        assert_eq!((chart.width, chart.height), expected, "{:?}", chart.kind);
        assert_eq!(chart.pixels.len(), (chart.width * chart.height * 3) as usize);
    }
}

#[test]
fn rendering_is_deterministic() {
    let aggregates = sample_aggregates();
    let first = build_charts(&aggregates).unwrap();
    let second = build_charts(&aggregates).unwrap();
    assert_eq!(first, second);
}

#[test]
fn ticks_follow_series_order() {
    let charts = build_charts(&sample_aggregates()).unwrap();
    let labels = |kind| -> Vec<String> {
        charts[&kind].ticks.iter().map(|t| t.label.clone()).collect()
    };
    assert_eq!(labels(ChartKind::MonthlyTotals), vec!["2022-11", "2023-01", "2023-11"]);
    assert_eq!(labels(ChartKind::SalesByClient), vec!["Acme", "Globex", "Initech"]);
    assert_eq!(labels(ChartKind::YearlyTotals), vec!["2022", "2023"]);
    assert_eq!(labels(ChartKind::YearOverYear), vec!["Enero", "Noviembre"]);

    let legend: Vec<&str> = charts[&ChartKind::YearOverYear]
        .legend
        .iter()
        .map(|e| e.label.as_str())
        .collect();
    assert_eq!(legend, vec!["2022", "2023"]);

    let ticks = &charts[&ChartKind::SalesByClient].ticks;
    assert!(ticks.windows(2).all(|pair| pair[0].x < pair[1].x));
    assert!(ticks.iter().all(|t| t.x > 0.0 && t.x < 1.0));
}

#[test]
fn single_bar_is_painted_in_bar_color() {
    let series = AggregateSeries {
        entries: vec![("Acme".to_string(), 100.0)],
    };
    let chart = bar_chart(ChartKind::SalesByClient, &series, &[BAR_COLOR], "").unwrap();
    let centre_x = (chart.ticks[0].x * chart.width as f64) as u32;
    assert_eq!(
        chart.pixel(centre_x, chart.height / 2),
        Some([BAR_COLOR.0, BAR_COLOR.1, BAR_COLOR.2])
    );
    assert_eq!(chart.pixel(5, 5), Some([255, 255, 255]));
    assert_eq!(chart.pixel(chart.width, 0), None);
}

#[test]
fn empty_series_still_renders() {
    let chart = bar_chart(
        ChartKind::MonthlyTotals,
        &AggregateSeries::default(),
        &[BAR_COLOR],
        "",
    )
    .unwrap();
    assert!(chart.ticks.is_empty());
    assert_eq!(chart.y_range, (0.0, 1.0));

    let charts = build_charts(&SalesAggregates::default()).unwrap();
    assert_eq!(charts.len(), 6);
}

#[test]
fn bar_chart_without_colors_is_report_error() {
    let series = AggregateSeries {
        entries: vec![("Acme".to_string(), 100.0)],
    };
    let err = bar_chart(ChartKind::SalesByClient, &series, &[], "").unwrap_err();
    assert!(matches!(
        err,
        SalesReportError::ReportBuildError { ref artifact, .. } if artifact == "chart sales_by_client"
    ));
}

#[test]
fn pie_legend_carries_percentages() {
    let split = SupplierSplit {
        new: 1,
        recurring: 3,
    };
    let chart = pie_chart(&split).unwrap();
    let legend: Vec<&str> = chart.legend.iter().map(|e| e.label.as_str()).collect();
    assert_eq!(legend, vec!["Nuevo 25.0%", "Frecuente 75.0%"]);
}

#[test]
fn full_pie_is_one_color() {
    let split = SupplierSplit {
        new: 4,
        recurring: 0,
    };
    let chart = pie_chart(&split).unwrap();
    let (width, height) = PIE_CANVAS;
    let new_color = [PALETTE[0].0, PALETTE[0].1, PALETTE[0].2];
    assert_eq!(chart.pixel(width / 2, height / 2 - 100), Some(new_color));
    assert_eq!(chart.pixel(width / 2 - 100, height / 2), Some(new_color));
}
