// Utility helpers for numeric coercion and console formatting.
//
// Input tables come from spreadsheets and hand-edited CSVs, so every numeric
// cell goes through `parse_f64_lenient` before it reaches the calculator.
use chrono::{SecondsFormat, Utc};
use num_format::{Locale, ToFormattedString};

/// Best-effort conversion of a CSV cell into a non-negative `f64`.
///
/// - Keeps only digits, sign, decimal point and exponent markers
///   (so `"1,200 km"` becomes `1200`).
/// - Anything that still fails to parse, or parses to a non-finite value,
///   becomes `0.0`.
/// - Negative values are clamped to `0.0`.
pub fn parse_f64_lenient(s: Option<&str>) -> f64 {
    let Some(s) = s else {
        return 0.0;
    };
    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
        .collect();
    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => v,
        _ => 0.0,
    }
}

pub fn round2(n: f64) -> f64 {
    (n * 100.0).round() / 100.0
}

pub fn now_utc_string() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals plus locale thousands separators, e.g. `6,006.20`.
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
    fn lenient_parse_strips_units_and_separators() {
        assert_eq!(parse_f64_lenient(Some("1,200 km")), 1200.0);
        assert_eq!(parse_f64_lenient(Some(" 42.5 ")), 42.5);
        assert_eq!(parse_f64_lenient(Some("1.5e3")), 1500.0);
    }

    #[test]
    fn lenient_parse_degrades_to_zero() {
        assert_eq!(parse_f64_lenient(None), 0.0);
        assert_eq!(parse_f64_lenient(Some("")), 0.0);
        assert_eq!(parse_f64_lenient(Some("abc")), 0.0);
        assert_eq!(parse_f64_lenient(Some("n/a")), 0.0);
        assert_eq!(parse_f64_lenient(Some("1.2.3")), 0.0);
        assert_eq!(parse_f64_lenient(Some("1e999")), 0.0);
    }

    #[test]
    fn lenient_parse_clamps_negatives() {
        assert_eq!(parse_f64_lenient(Some("-15")), 0.0);
    }

    #[test]
    fn round2_keeps_two_decimals() {
        assert_eq!(round2(6006.2049), 6006.2);
        assert_eq!(round2(1.005_1), 1.01);
        assert_eq!(round2(0.0), 0.0);
    }

    #[test]
    fn format_number_inserts_separators() {
        assert_eq!(format_number(6006.2, 2), "6,006.20");
        assert_eq!(format_number(0.0, 2), "0.00");
        assert_eq!(format_number(1234567.0, 0), "1,234,567");
        assert_eq!(format_int(9855usize), "9,855");
    }
}
