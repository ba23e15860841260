//! Numeric coercion and summary helpers shared by the aggregators.
//!
//! Export cells are strings; [`to_number`] turns currency-like text into
//! `f64` the same way for every column, and [`ValueSample`] accumulates the
//! present values of one column for sum/mean/median/max.

use std::sync::LazyLock;

use regex::Regex;

/// Exclusive bounds for a plausible class year.
pub const CLASS_YEAR_MIN: f64 = 1940.0;
pub const CLASS_YEAR_MAX: f64 = 2035.0;

static LEADING_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?").expect("valid number pattern")
});

/// Coerces currency-like text to a number.
///
/// `$` and `,` are stripped, then the longest leading numeric prefix is
/// parsed, so `"$1,200.50 (est)"` yields `1200.5`. Empty or non-numeric text
/// is absent.
pub fn to_number(raw: &str) -> Option<f64> {
    let cleaned = raw.replace(['$', ','], "");
    let cleaned = cleaned.trim_start();
    let matched = LEADING_NUMBER.find(cleaned)?;
    matched
        .as_str()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// Middle element, or mean of the two middle elements, of the sorted values.
/// Empty input yields 0.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len().is_multiple_of(2) {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Rounds to one decimal place.
pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// `part / whole` as a percentage with one decimal; 0 when `whole` is 0.
pub fn percent_one_decimal(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    (part as f64 / whole as f64 * 1000.0).round() / 10.0
}

/// `part / whole` as a whole-number percentage; 0 when `whole` is 0.
pub fn percent_rounded(part: usize, whole: usize) -> i64 {
    if whole == 0 {
        return 0;
    }
    (part as f64 / whole as f64 * 100.0).round() as i64
}

pub fn is_class_year(year: f64) -> bool {
    year > CLASS_YEAR_MIN && year < CLASS_YEAR_MAX
}

/// Parses a class year cell, keeping only years inside the accepted window.
pub fn class_year(raw: &str) -> Option<f64> {
    to_number(raw).filter(|year| is_class_year(*year))
}

/// Table key for a class year: whole years print without a fraction.
pub fn year_key(year: f64) -> String {
    format_number(year)
}

pub fn decade_of(year: f64) -> String {
    format!("{}s", ((year / 10.0).floor() * 10.0) as i64)
}

pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

/// Present values of one numeric column.
#[derive(Debug, Clone, Default)]
pub struct ValueSample {
    values: Vec<f64>,
    sum: f64,
}

impl ValueSample {
    pub fn push(&mut self, value: f64) {
        self.sum += value;
        self.values.push(value);
    }

    pub fn count(&self) -> usize {
        self.values.len()
    }

    pub fn sum(&self) -> f64 {
        self.sum
    }

    pub fn mean(&self) -> f64 {
        if self.values.is_empty() {
            0.0
        } else {
            self.sum / self.values.len() as f64
        }
    }

    pub fn median(&self) -> f64 {
        median(&self.values)
    }

    /// Largest value, never below 0.
    pub fn max_or_zero(&self) -> f64 {
        self.values.iter().copied().fold(0.0, f64::max)
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

impl FromIterator<f64> for ValueSample {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut sample = ValueSample::default();
        for value in iter {
            sample.push(value);
        }
        sample
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn to_number_strips_currency_symbols() {
        assert_eq!(to_number("$1,234.50"), Some(1234.5));
        assert_eq!(to_number(" 42 "), Some(42.0));
        assert_eq!(to_number("-15"), Some(-15.0));
        assert_eq!(to_number("12abc"), Some(12.0));
        assert_eq!(to_number(""), None);
        assert_eq!(to_number("N/A"), None);
        assert_eq!(to_number("$"), None);
    }

    #[test]
    fn median_handles_small_inputs() {
        assert_eq!(median(&[]), 0.0);
        assert_eq!(median(&[7.0]), 7.0);
        assert_eq!(median(&[3.0, 1.0]), 2.0);
        assert_eq!(median(&[5.0, 1.0, 3.0]), 3.0);
    }

    #[test]
    fn class_year_window_is_exclusive() {
        assert_eq!(class_year("1940"), None);
        assert_eq!(class_year("1941"), Some(1941.0));
        assert_eq!(class_year("2035"), None);
        assert_eq!(class_year("N/A"), None);
        assert_eq!(decade_of(1990.0), "1990s");
        assert_eq!(decade_of(1999.0), "1990s");
        assert_eq!(year_key(1990.0), "1990");
    }

    #[test]
    fn percentages_round_like_the_dashboard() {
        assert_eq!(percent_one_decimal(1, 3), 33.3);
        assert_eq!(percent_one_decimal(2, 3), 66.7);
        assert_eq!(percent_one_decimal(1, 0), 0.0);
        assert_eq!(percent_rounded(1, 3), 33);
    }

    #[test]
    fn value_sample_summarises() {
        let sample = [10.0, 30.0, 20.0].into_iter().collect::<ValueSample>();
        assert_eq!(sample.sum(), 60.0);
        assert_eq!(sample.mean(), 20.0);
        assert_eq!(sample.median(), 20.0);
        assert_eq!(sample.max_or_zero(), 30.0);
        assert_eq!(ValueSample::default().max_or_zero(), 0.0);
    }

    proptest! {
        #[test]
        fn median_ignores_input_order(mut values in proptest::collection::vec(-1.0e6f64..1.0e6, 0..30)) {
            let before = median(&values);
            values.reverse();
            prop_assert_eq!(before, median(&values));
        }

        #[test]
        fn median_of_singleton_is_the_value(value in -1.0e9f64..1.0e9) {
            prop_assert_eq!(median(&[value]), value);
        }
    }
}
