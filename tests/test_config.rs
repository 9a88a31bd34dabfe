use std::path::PathBuf;

use chrono::NaiveDate;
use sales_report::config::{OutputFormat, SimpleOutputFormat, parse_config};
use sales_report::locale::Locale;
use sales_report::schema::ColumnNames;

#[test]
fn minimal_config_uses_defaults() {
    let config = parse_config(r#"{"input": "ventas.xlsx"}"#).unwrap();
    assert_eq!(config.input, PathBuf::from("ventas.xlsx"));
    assert_eq!(config.clients, None);
    assert_eq!(config.categories, None);
    assert_eq!(config.start_date, None);
    assert_eq!(config.locale, Locale::Es);
    assert_eq!(config.columns, ColumnNames::default());
    assert_eq!(
        config.output_format,
        OutputFormat::Simple(SimpleOutputFormat::PolarsPrint)
    );
}

#[test]
fn full_config() {
    let config = parse_config(
        r#"{
            "input": "ventas.csv",
            "clients": ["Acme", "Globex"],
            "categories": ["Nuevo Proveedor"],
            "startDate": "2023-01-01",
            "endDate": "2023-12-31",
            "locale": "en",
            "columns": {"client": "customer", "amount": "total"},
            "outputFormat": {"pdfOutput": "out/informe.pdf"}
        }"#,
    )
    .unwrap();

    assert_eq!(
        config.clients,
        Some(vec!["Acme".to_string(), "Globex".to_string()])
    );
    assert_eq!(config.start_date, NaiveDate::from_ymd_opt(2023, 1, 1));
    assert_eq!(config.end_date, NaiveDate::from_ymd_opt(2023, 12, 31));
    assert_eq!(config.locale, Locale::En);
    assert_eq!(config.columns.client, "customer");
    assert_eq!(config.columns.category, "categoria");
    assert_eq!(config.columns.amount, "total");
    assert_eq!(
        config.output_format,
        OutputFormat::PdfFile {
            pdf_output: PathBuf::from("out/informe.pdf")
        }
    );
}

#[test]
fn output_format_variants() {
    let csv_print = parse_config(r#"{"input": "a.csv", "outputFormat": "csv_print"}"#).unwrap();
    assert_eq!(
        csv_print.output_format,
        OutputFormat::Simple(SimpleOutputFormat::CsvPrint)
    );

    let csv_file =
        parse_config(r#"{"input": "a.csv", "outputFormat": {"csvOutput": "out/tablas.csv"}}"#)
            .unwrap();
    assert_eq!(
        csv_file.output_format,
        OutputFormat::CsvFile {
            csv_output: PathBuf::from("out/tablas.csv")
        }
    );
}

#[test]
fn rejects_unknown_locale() {
    assert!(parse_config(r#"{"input": "a.csv", "locale": "fr"}"#).is_err());
}
