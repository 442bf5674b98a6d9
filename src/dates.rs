// src/dates.rs
use chrono::{Duration, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::sheet::utils::clean_str;

static YMD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})[-/.](\d{1,2})[-/.](\d{1,2})$").expect("valid regex"));
static DMY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})[-/.](\d{1,2})[-/.](\d{4}|\d{2})$").expect("valid regex"));
static SERIAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{5})(?:\.\d+)?$").expect("valid regex"));

/// Excel serial numbers accepted as dates (1954-10-03 ..= 2119-01-09).
/// Anything outside is far more likely a quantity than a date.
const SERIAL_MIN: f64 = 20_000.0;
const SERIAL_MAX: f64 = 80_000.0;
/// Years accepted from text dates; `05/01/0026` is a typo, not a stay.
const YEAR_MIN: i32 = 1900;
const YEAR_MAX: i32 = 2100;

fn ymd(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    if !(YEAR_MIN..=YEAR_MAX).contains(&year) {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Convert an Excel serial day number (1900 date system) to a date.
pub fn from_excel_serial(serial: f64) -> Option<NaiveDate> {
    if !(SERIAL_MIN..=SERIAL_MAX).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.floor() as i64))
}

pub fn format_iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parse the date formats found in the grid headers and reservation exports:
/// `YYYY-MM-DD`, `YYYY/MM/DD`, `DD/MM/YYYY`, `DD-MM-YY`, `DD.MM.YYYY`, any of
/// them followed by a time part, and Excel serial day numbers.
/// Returns `None` for anything else, including impossible calendar dates and
/// years outside 1900..=2100.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let cleaned = clean_str(raw);
    // drop a trailing time part: "2026-01-05 14:00:00", "2026-01-05T14:00"
    let date_part = cleaned
        .split(|c: char| c == ' ' || c == 'T')
        .next()
        .unwrap_or("");
    if date_part.is_empty() {
        return None;
    }

    if let Some(c) = YMD.captures(date_part) {
        let year: i32 = c[1].parse().ok()?;
        let month: u32 = c[2].parse().ok()?;
        let day: u32 = c[3].parse().ok()?;
        return ymd(year, month, day);
    }

    if let Some(c) = DMY.captures(date_part) {
        let day: u32 = c[1].parse().ok()?;
        let month: u32 = c[2].parse().ok()?;
        let mut year: i32 = c[3].parse().ok()?;
        if c[3].len() == 2 {
            year += 2000;
        }
        return ymd(year, month, day);
    }

    if SERIAL.is_match(date_part) {
        return from_excel_serial(date_part.parse().ok()?);
    }

    None
}
