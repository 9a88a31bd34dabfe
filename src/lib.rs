//! Sales export reporting.
//!
//! A spreadsheet of sales (date, client, category, amount) flows through
//! [`schema::normalize`], [`filter::apply_filter`], [`aggregate::aggregate`],
//! [`charts::build_charts`] and finally [`document::build_report_document`]
//! and [`pdf::write_pdf`].

pub mod aggregate;
pub mod charts;
pub mod config;
pub mod document;
pub mod error;
pub mod filter;
pub mod locale;
pub mod pdf;
pub mod schema;
pub mod table;

pub use error::{Result, SalesReportError, SchemaIssue};
