//! Text encodings shared by the SQLite adapters. Decimals are stored as their
//! canonical string form so values round-trip exactly; dates as `%Y-%m-%d`
//! so they compare correctly as text.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rust_decimal::Decimal;
use std::str::FromStr;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

fn conversion_error(idx: usize, msg: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, msg.into())
}

pub fn decimal(row: &rusqlite::Row, idx: usize) -> Result<Decimal, rusqlite::Error> {
    let s: String = row.get(idx)?;
    Decimal::from_str(&s).map_err(|e| conversion_error(idx, format!("bad decimal '{s}': {e}")))
}

pub fn opt_decimal(row: &rusqlite::Row, idx: usize) -> Result<Option<Decimal>, rusqlite::Error> {
    let s: Option<String> = row.get(idx)?;
    s.map(|s| {
        Decimal::from_str(&s).map_err(|e| conversion_error(idx, format!("bad decimal '{s}': {e}")))
    })
    .transpose()
}

pub fn date(row: &rusqlite::Row, idx: usize) -> Result<NaiveDate, rusqlite::Error> {
    let s: String = row.get(idx)?;
    NaiveDate::parse_from_str(&s, DATE_FORMAT)
        .map_err(|e| conversion_error(idx, format!("bad date '{s}': {e}")))
}

pub fn opt_date(row: &rusqlite::Row, idx: usize) -> Result<Option<NaiveDate>, rusqlite::Error> {
    let s: Option<String> = row.get(idx)?;
    s.map(|s| {
        NaiveDate::parse_from_str(&s, DATE_FORMAT)
            .map_err(|e| conversion_error(idx, format!("bad date '{s}': {e}")))
    })
    .transpose()
}

pub fn timestamp(row: &rusqlite::Row, idx: usize) -> Result<DateTime<Utc>, rusqlite::Error> {
    let s: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, format!("bad timestamp '{s}': {e}")))
}

/// Parses a stored enum label, failing the row on unknown values.
pub fn parsed<T: FromStr<Err = String>>(row: &rusqlite::Row, idx: usize) -> Result<T, rusqlite::Error> {
    let s: String = row.get(idx)?;
    s.parse().map_err(|e: String| conversion_error(idx, e))
}

pub fn opt_parsed<T: FromStr<Err = String>>(
    row: &rusqlite::Row,
    idx: usize,
) -> Result<Option<T>, rusqlite::Error> {
    let s: Option<String> = row.get(idx)?;
    s.map(|s| s.parse().map_err(|e: String| conversion_error(idx, e)))
        .transpose()
}

pub fn date_text(d: NaiveDate) -> String {
    d.format(DATE_FORMAT).to_string()
}
