use proptest::prelude::*;
use proptest::string::string_regex;
use sales_report::document::{CURRENCY, format_currency, wrap_text};

fn words_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(string_regex("[a-zñ]{1,14}").expect("regex"), 0..=30)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(96))]

    #[test]
    fn prop_format_currency_shape(value in -1_000_000.0f64..1_000_000.0f64) {
        let rounded = (value * 100.0).round() / 100.0;
        let formatted = format_currency(value);

        prop_assert!(formatted.contains(CURRENCY));
        prop_assert_eq!(formatted.starts_with('-'), rounded < 0.0);

        let digits = formatted.trim_start_matches('-').trim_start_matches(CURRENCY);
        let (integer, decimals) = digits.split_once('.').expect("decimal point");
        prop_assert_eq!(decimals.len(), 2);
        for (idx, group) in integer.split(',').enumerate() {
            prop_assert!(!group.is_empty() && group.len() <= 3);
            if idx > 0 {
                prop_assert_eq!(group.len(), 3);
            }
        }

        let parsed: f64 = digits.replace(',', "").parse().expect("number");
        prop_assert!((parsed - rounded.abs()).abs() < 0.005);
    }

    #[test]
    fn prop_wrap_text_keeps_words_in_order(
        words in words_strategy(),
        max_chars in 15_usize..80,
    ) {
        let text = words.join(" ");
        let lines = wrap_text(&text, max_chars);

        let rejoined: Vec<String> = lines
            .iter()
            .flat_map(|line| line.split(' ').map(str::to_string))
            .collect();
        prop_assert_eq!(rejoined, words);
        for line in &lines {
            prop_assert!(line.chars().count() <= max_chars);
        }
    }
}
