//! Cell coercion: numbers in Brazilian or US notation, dates to ISO.

use chrono::{Duration, NaiveDate};

use crate::table::Cell;

/// Parse a number the way it appears in Brazilian spreadsheets and exports.
///
/// Accepts currency prefixes (`R$`, `$`), percent suffixes, spaces as
/// thousands separators, and accounting negatives `(1.234,56)`.
///
/// Separator rules:
/// - both `.` and `,` present: the last one is the decimal separator
/// - only `,`: one comma is decimal (`12,5`), several are thousands
/// - only `.`: several are thousands; a single dot followed by exactly three
///   digits with a non-zero integer part is thousands (`1.500` = 1500),
///   otherwise decimal (`2.5`, `0.125`)
pub fn parse_number(input: &str) -> Option<f64> {
    let mut s: String = input
        .trim()
        .trim_start_matches("R$")
        .trim_start_matches('$')
        .trim_end_matches('%')
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{a0}')
        .collect();

    if s.is_empty() {
        return None;
    }

    let mut negative = false;
    if s.starts_with('(') && s.ends_with(')') && s.len() > 2 {
        negative = true;
        s = s[1..s.len() - 1].to_string();
    }
    if let Some(rest) = s.strip_prefix('-') {
        negative = !negative;
        s = rest.to_string();
    }
    // Currency symbol after a sign: "-R$ 10,00"
    if let Some(rest) = s.strip_prefix("R$") {
        s = rest.to_string();
    }

    let last_dot = s.rfind('.');
    let last_comma = s.rfind(',');
    let normalized = match (last_dot, last_comma) {
        (Some(d), Some(c)) if c > d => s.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => s.replace(',', ""),
        (None, Some(_)) => {
            if s.matches(',').count() == 1 {
                s.replace(',', ".")
            } else {
                s.replace(',', "")
            }
        }
        (Some(d), None) => {
            let int_part = &s[..d];
            let frac_part = &s[d + 1..];
            let thousands = s.matches('.').count() > 1
                || (frac_part.len() == 3
                    && !int_part.is_empty()
                    && int_part.len() <= 3
                    && int_part != "0");
            if thousands {
                s.replace('.', "")
            } else {
                s
            }
        }
        (None, None) => s,
    };

    if !normalized.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }
    let value: f64 = normalized.parse().ok()?;
    Some(if negative { -value } else { value })
}

/// Numeric value of a cell; blank and unparseable cells are `None`.
pub fn cell_number(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Number(n) => Some(*n),
        Cell::Text(s) => parse_number(s),
        Cell::Empty | Cell::Date(_) => None,
    }
}

/// Excel 1900 date system serial to calendar date. Day 60 (the phantom
/// 1900-02-29) and earlier are off by one; such dates never appear in
/// measurement sheets.
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 || serial > 2_958_465.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.floor() as i64))
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y/%m/%d", "%d/%m/%y"];

/// Parse common spreadsheet date spellings; day comes before month.
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    let s = input.trim();
    if s.is_empty() {
        return None;
    }
    // Drop a time component: "2025-03-01T08:00:00", "01/03/2025 08:00"
    let date_part = s.split(['T', ' ']).next().unwrap_or(s);

    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(date_part, fmt) {
            return Some(d);
        }
    }

    // Serial number exported as text
    if date_part.chars().all(|c| c.is_ascii_digit() || c == '.') {
        if let Ok(serial) = date_part.parse::<f64>() {
            return excel_serial_to_date(serial);
        }
    }
    None
}

/// ISO `YYYY-MM-DD` for a date-ish cell, empty string when unusable.
pub fn cell_iso_date(cell: &Cell) -> String {
    let date = match cell {
        Cell::Date(d) => Some(*d),
        Cell::Number(n) => excel_serial_to_date(*n),
        Cell::Text(s) => parse_date(s),
        Cell::Empty => None,
    };
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}
