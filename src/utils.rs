use chrono::{Duration, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

static CELL_ADDRESS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\$?([A-Za-z]{1,3})\$?([1-9][0-9]*)$").expect("cell address pattern is valid")
});

pub fn column_number_to_name(column: u32) -> String {
    let mut column = column;
    let mut name = String::new();
    while column > 0 {
        let rem = ((column - 1) % 26) as u8;
        name.insert(0, (b'A' + rem) as char);
        column = (column - 1) / 26;
    }
    name
}

pub fn column_name_to_number(name: &str) -> Option<u32> {
    if name.is_empty() {
        return None;
    }
    name.chars().try_fold(0u32, |acc, ch| {
        if !ch.is_ascii_alphabetic() {
            return None;
        }
        let digit = (ch.to_ascii_uppercase() as u8 - b'A') as u32 + 1;
        acc.checked_mul(26)?.checked_add(digit)
    })
}

pub fn cell_address(column: u32, row: u32) -> String {
    format!("{}{}", column_number_to_name(column), row)
}

/// Parses `B7` or `$B$7` into `(column, row)`, both 1-based.
pub fn parse_cell_address(address: &str) -> Option<(u32, u32)> {
    let captures = CELL_ADDRESS_RE.captures(address.trim())?;
    let column = column_name_to_number(captures.get(1)?.as_str())?;
    let row = captures.get(2)?.as_str().parse().ok()?;
    Some((column, row))
}

/// Rectangular span of cells, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellSpan {
    pub start_col: u32,
    pub start_row: u32,
    pub end_col: u32,
    pub end_row: u32,
}

impl CellSpan {
    pub fn contains(&self, column: u32, row: u32) -> bool {
        (self.start_col..=self.end_col).contains(&column)
            && (self.start_row..=self.end_row).contains(&row)
    }

    pub fn is_anchor(&self, column: u32, row: u32) -> bool {
        column == self.start_col && row == self.start_row
    }
}

impl std::fmt::Display for CellSpan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let start = cell_address(self.start_col, self.start_row);
        let end = cell_address(self.end_col, self.end_row);
        if start == end {
            write!(f, "{start}")
        } else {
            write!(f, "{start}:{end}")
        }
    }
}

/// Parses `A1:C3` (corners in any order) or a single address.
pub fn parse_range(range: &str) -> Option<CellSpan> {
    let (first, second) = match range.split_once(':') {
        Some((a, b)) => (parse_cell_address(a)?, parse_cell_address(b)?),
        None => {
            let single = parse_cell_address(range)?;
            (single, single)
        }
    };
    Some(CellSpan {
        start_col: first.0.min(second.0),
        start_row: first.1.min(second.1),
        end_col: first.0.max(second.0),
        end_row: first.1.max(second.1),
    })
}

fn excel_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1899, 12, 30).expect("excel epoch is a valid date")
}

/// Converts a 1900-system serial number to a calendar date. Serials below 60
/// predate the fictitious 1900-02-29 and are shifted by one day.
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    let days = serial.floor() as i64;
    let offset = if days < 60 { days + 1 } else { days };
    excel_epoch().checked_add_signed(Duration::days(offset))
}

pub fn date_to_excel_serial(date: NaiveDate) -> f64 {
    date.signed_duration_since(excel_epoch()).num_days() as f64
}

/// True when a number format code renders a date: it has a day or year token
/// outside quoted literals, escapes and bracketed sections.
pub fn is_date_format(code: &str) -> bool {
    if code.eq_ignore_ascii_case("general") {
        return false;
    }
    let mut in_quotes = false;
    let mut in_brackets = false;
    let mut escaped = false;
    for ch in code.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if !in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            '[' if !in_quotes => in_brackets = true,
            ']' if !in_quotes => in_brackets = false,
            ';' if !in_quotes && !in_brackets => break,
            'd' | 'D' | 'y' | 'Y' if !in_quotes && !in_brackets => return true,
            _ => {}
        }
    }
    false
}

/// Renders a cell number the way a user typed it: `7` rather than `7.0`.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

pub fn truncate_chars(value: &str, limit: usize) -> String {
    value.chars().take(limit).collect()
}
