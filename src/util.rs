// Parsing and formatting helpers shared by the loader and the reporters.
//
// Cells arrive as raw strings; anything that cannot be read as a value
// becomes `None` here so the aggregations can skip it the way a dataframe
// skips missing values.
use num_format::{Locale, ToFormattedString};

/// Parse a numeric cell. Empty, alphabetic (`NaN`, `inf`, `n/a`) and
/// otherwise malformed values yield `None`.
pub fn parse_f64_safe(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// `None` for an empty cell, otherwise the cell as an owned string.
pub fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// Arithmetic mean, `None` when there is nothing to average.
pub fn mean<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// `part` as a percentage of `whole`; 0 for an empty whole.
pub fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 / whole as f64 * 100.0
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals plus `1,234,567.89` style separators on the integer part.
    let neg = n.is_sign_negative() && n != 0.0;
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        res.push('.');
        res.push_str(frac);
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_scientific_numbers() {
        assert_eq!(parse_f64_safe(" 4.5 "), Some(4.5));
        assert_eq!(parse_f64_safe("1e3"), Some(1000.0));
        assert_eq!(parse_f64_safe("-12"), Some(-12.0));
    }

    #[test]
    fn rejects_missing_markers() {
        assert_eq!(parse_f64_safe(""), None);
        assert_eq!(parse_f64_safe("NaN"), None);
        assert_eq!(parse_f64_safe("inf"), None);
        assert_eq!(parse_f64_safe("four"), None);
        assert_eq!(parse_f64_safe("1,200"), None);
    }

    #[test]
    fn mean_of_empty_is_none() {
        assert_eq!(mean(Vec::<f64>::new()), None);
        assert_eq!(mean(vec![1.0, 2.0, 6.0]), Some(3.0));
    }

    #[test]
    fn percent_handles_empty_whole() {
        assert_eq!(percent(0, 0), 0.0);
        assert_eq!(percent(1, 4), 25.0);
    }

    #[test]
    fn formats_with_separators() {
        assert_eq!(format_number(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_number(-42.0, 1), "-42.0");
        assert_eq!(format_number(7.0, 0), "7");
        assert_eq!(format_int(9855), "9,855");
    }
}
