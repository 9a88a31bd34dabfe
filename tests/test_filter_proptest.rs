use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use sales_report::filter::{FilterCriteria, apply_filter};
use sales_report::locale::Locale;
use sales_report::schema::{self, ColumnNames, SalesFrame};
use sales_report::table::{Cell, RawTable};

const CLIENTS: [&str; 4] = ["Acme", "Globex", "Initech", "Umbrella"];
const CATEGORIES: [&str; 3] = ["Nuevo Proveedor", "Proveedor X", "Servicios"];

#[derive(Clone, Debug, PartialEq)]
struct Row {
    date: NaiveDate,
    client: String,
    category: String,
    amount: f64,
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn date_strategy(min: NaiveDate, max: NaiveDate) -> impl Strategy<Value = NaiveDate> {
    let span = (max - min).num_days();
    (0_i64..=span).prop_map(move |offset| min + Duration::days(offset))
}

fn rows_strategy() -> impl Strategy<Value = Vec<Row>> {
    prop::collection::vec(
        (
            date_strategy(date(2021, 1, 1), date(2024, 12, 31)),
            prop::sample::select(CLIENTS.to_vec()),
            prop::sample::select(CATEGORIES.to_vec()),
            -100_000_i64..=1_000_000_i64,
        ),
        0..=30,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .map(|(date, client, category, cents)| Row {
                date,
                client: client.to_string(),
                category: category.to_string(),
                amount: cents as f64 / 100.0,
            })
            .collect()
    })
}

fn criteria_strategy() -> impl Strategy<Value = FilterCriteria> {
    (
        prop::sample::subsequence(CLIENTS.to_vec(), 0..=CLIENTS.len()),
        prop::sample::subsequence(CATEGORIES.to_vec(), 0..=CATEGORIES.len()),
        date_strategy(date(2020, 6, 1), date(2025, 6, 1)),
        date_strategy(date(2020, 6, 1), date(2025, 6, 1)),
    )
        .prop_map(|(clients, categories, a, b)| FilterCriteria {
            clients: clients.into_iter().map(str::to_string).collect(),
            categories: categories.into_iter().map(str::to_string).collect(),
            start: a.min(b),
            end: a.max(b),
        })
}

fn to_frame(rows: &[Row]) -> SalesFrame {
    let table = RawTable::new(
        vec!["Fecha".into(), "cliente".into(), "categoria".into(), "venta".into()],
        rows.iter()
            .map(|row| {
                vec![
                    Cell::Text(row.date.format("%Y-%m-%d").to_string()),
                    Cell::Text(row.client.clone()),
                    Cell::Text(row.category.clone()),
                    Cell::Number(row.amount),
                ]
            })
            .collect(),
    );
    schema::normalize(&table, &ColumnNames::default(), &Locale::Es).expect("normalize")
}

fn from_frame(frame: &SalesFrame) -> Vec<Row> {
    let df = frame.collect().expect("collect");
    let dates = frame.dates().expect("dates");
    let clients = df.column("cliente").expect("cliente").str().expect("str");
    let categories = df.column("categoria").expect("categoria").str().expect("str");
    let amounts = df.column("venta").expect("venta").f64().expect("f64");

    (0..df.height())
        .map(|idx| Row {
            date: dates[idx],
            client: clients.get(idx).expect("client").to_string(),
            category: categories.get(idx).expect("category").to_string(),
            amount: amounts.get(idx).expect("amount"),
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(96))]

    #[test]
    fn prop_filter_keeps_exactly_matching_rows_in_order(
        rows in rows_strategy(),
        criteria in criteria_strategy(),
    ) {
        let filtered = from_frame(&apply_filter(to_frame(&rows), &criteria).expect("filter"));
        let expected: Vec<Row> = rows
            .iter()
            .filter(|row| criteria.matches(&row.client, &row.category, row.date))
            .cloned()
            .collect();

        prop_assert!(filtered.len() <= rows.len());
        prop_assert_eq!(filtered, expected);
    }

    #[test]
    fn prop_filter_is_idempotent(
        rows in rows_strategy(),
        criteria in criteria_strategy(),
    ) {
        let once = apply_filter(to_frame(&rows), &criteria).expect("filter");
        let twice = apply_filter(once.clone(), &criteria).expect("filter");
        prop_assert_eq!(from_frame(&once), from_frame(&twice));
    }

    #[test]
    fn prop_survivors_satisfy_every_predicate(
        rows in rows_strategy(),
        criteria in criteria_strategy(),
    ) {
        let filtered = from_frame(&apply_filter(to_frame(&rows), &criteria).expect("filter"));
        for row in filtered {
            prop_assert!(criteria.clients.contains(&row.client));
            prop_assert!(criteria.categories.contains(&row.category));
            prop_assert!(criteria.start <= row.date && row.date <= criteria.end);
        }
    }
}
