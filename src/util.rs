// Parsing and formatting helpers.
//
// Cell parsing lives here so the validator can treat every raw value the same
// way, and number formatting lives here so the views and the PDF print
// identical strings.
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use num_format::{Locale, ToFormattedString};

/// Trim a raw cell and map blank cells to `None`.
pub fn non_blank(s: Option<&str>) -> Option<&str> {
    let s = s?.trim();
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Parse a float cell, accepting thousands separators like `1,234.5`.
///
/// `Ok(None)` means the cell was blank; `Err` carries a short reason.
pub fn parse_f64_cell(s: Option<&str>) -> Result<Option<f64>, String> {
    let Some(s) = non_blank(s) else {
        return Ok(None);
    };
    let cleaned = s.replace(',', "");
    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Some(v)),
        Ok(_) => Err("not a finite number".to_string()),
        Err(_) => Err("not a number".to_string()),
    }
}

/// Parse a non-negative integer cell. Whole-valued floats like `120.0` are
/// accepted since spreadsheet exports often write counts that way.
pub fn parse_u64_cell(s: Option<&str>) -> Result<Option<u64>, String> {
    let Some(s) = non_blank(s) else {
        return Ok(None);
    };
    let cleaned = s.replace(',', "");
    if let Ok(v) = cleaned.parse::<u64>() {
        return Ok(Some(v));
    }
    match cleaned.parse::<f64>() {
        Ok(v) if v < 0.0 => Err("must not be negative".to_string()),
        Ok(v) if v.is_finite() && v.fract() == 0.0 && v <= u64::MAX as f64 => Ok(Some(v as u64)),
        Ok(_) => Err("not a whole number".to_string()),
        Err(_) => Err("not a number".to_string()),
    }
}

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Parse a date cell in any of the formats campaign exports commonly use.
pub fn parse_date_cell(s: Option<&str>) -> Result<Option<NaiveDate>, String> {
    let Some(s) = non_blank(s) else {
        return Ok(None);
    };
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(Some(d));
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(Some(dt.date()));
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(Some(dt.date_naive()));
    }
    Err("unrecognised date format".to_string())
}

/// Round half away from zero to two decimal places.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Arithmetic mean of the non-null values; `None` when there are none.
pub fn mean<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let (sum, count) = values
        .into_iter()
        .flatten()
        .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Format a floating-point value with:
    // - a fixed number of decimal places, and
    // - thousands separators (e.g., `1,234,567.89`).
    if !n.is_finite() {
        return "n/a".to_string();
    }
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: u64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        res.push('.');
        res.push_str(frac);
    }
    // `-0.00` is not a useful thing to show anyone.
    let is_zero = res.chars().all(|c| matches!(c, '0' | '.' | ','));
    if n.is_sign_negative() && !is_zero {
        format!("-{res}")
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

/// ROI multiple, e.g. `2.45x`.
pub fn format_roi(v: f64) -> String {
    format!("{:.2}x", v)
}

/// A value already expressed in percent, e.g. CTR `3.5` -> `3.50%`.
pub fn format_percent(v: f64) -> String {
    format!("{:.2}%", v)
}

/// A fraction shown as a percentage, e.g. conversion `0.0812` -> `8.12%`.
pub fn format_fraction_percent(v: f64) -> String {
    format_percent(v * 100.0)
}

/// Currency with thousands separators and `decimals` places.
pub fn format_currency(v: f64, decimals: usize) -> String {
    let s = format_number(v, decimals);
    match s.strip_prefix('-') {
        Some(rest) => format!("-${rest}"),
        None => format!("${s}"),
    }
}

/// Render an optional statistic, showing `n/a` for null aggregates.
pub fn or_na<F>(v: Option<f64>, f: F) -> String
where
    F: Fn(f64) -> String,
{
    v.map_or_else(|| "n/a".to_string(), f)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_numbers_with_separators() {
        assert_eq!(parse_f64_cell(Some(" 1,234.5 ")), Ok(Some(1234.5)));
        assert_eq!(parse_f64_cell(Some("")), Ok(None));
        assert_eq!(parse_f64_cell(None), Ok(None));
        assert!(parse_f64_cell(Some("abc")).is_err());
    }

    #[test]
    fn parses_counts() {
        assert_eq!(parse_u64_cell(Some("12,000")), Ok(Some(12_000)));
        assert_eq!(parse_u64_cell(Some("40.0")), Ok(Some(40)));
        assert!(parse_u64_cell(Some("-3")).is_err());
        assert!(parse_u64_cell(Some("2.5")).is_err());
    }

    #[test]
    fn parses_supported_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2021, 3, 14);
        assert_eq!(parse_date_cell(Some("2021-03-14")), Ok(expected));
        assert_eq!(parse_date_cell(Some("2021/03/14")), Ok(expected));
        assert_eq!(parse_date_cell(Some("03/14/2021")), Ok(expected));
        assert_eq!(parse_date_cell(Some("2021-03-14 08:30:00")), Ok(expected));
        assert_eq!(parse_date_cell(Some("2021-03-14T08:30:00+02:00")), Ok(expected));
        assert!(parse_date_cell(Some("14th of March")).is_err());
    }

    #[test]
    fn mean_skips_nulls() {
        assert_eq!(mean([Some(1.0), None, Some(3.0)]), Some(2.0));
        assert_eq!(mean([None, None]), None);
    }

    #[test]
    fn formats_numbers() {
        assert_eq!(format_number(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_number(-1500.0, 0), "-1,500");
        assert_eq!(format_number(-0.001, 2), "0.00");
        assert_eq!(format_int(9855u64), "9,855");
        assert_eq!(format_roi(3.0), "3.00x");
        assert_eq!(format_percent(2.456), "2.46%");
        assert_eq!(format_fraction_percent(0.0812), "8.12%");
        assert_eq!(format_currency(1234.5, 2), "$1,234.50");
        assert_eq!(format_currency(-20.0, 0), "-$20");
    }

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(round2(2.625), 2.63);
        assert_eq!(round2(1.234), 1.23);
        assert_eq!(round2(-2.625), -2.63);
    }
}
