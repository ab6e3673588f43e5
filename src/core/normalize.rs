//! Field normalizer - best-effort coercion of legacy cells into target types.
//!
//! Nothing in here fails. A value that cannot be coerced is replaced by the
//! caller's default, and a missing value short-circuits to the default before
//! any coercion is attempted.

use crate::source::CellValue;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use std::borrow::Cow;
use std::convert::Infallible;
use std::str::FromStr;

/// Target type of a normalized field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Trimmed text
    String,
    /// Integer or floating-point number
    Number,
    /// Truthiness of the value
    Boolean,
    /// ISO-8601 timestamp text
    Date,
    /// Number rendered with exactly two fractional digits
    Decimal,
    /// No coercion; the value passes through unchanged
    Raw,
}

impl FromStr for FieldKind {
    type Err = Infallible;

    /// Unknown kind names map to [`FieldKind::Raw`].
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Ok(match name.trim().to_lowercase().as_str() {
            "string" => Self::String,
            "number" => Self::Number,
            "boolean" => Self::Boolean,
            "date" => Self::Date,
            "decimal" => Self::Decimal,
            _ => Self::Raw,
        })
    }
}

/// Coerces `value` into `kind`, falling back to `default`.
///
/// - a missing or [`CellValue::Empty`] value yields `default` untouched
/// - `String` trims the text rendering of the value
/// - `Number` parses strictly; failures yield `default`
/// - `Boolean` applies truthiness (`0`, `false`, `no` and blank are false)
/// - `Date` yields an ISO-8601 timestamp, or `default` if unparseable
/// - `Decimal` yields text with two fractional digits, or `default`
/// - `Raw` returns the value unchanged
#[must_use]
pub fn normalize(value: Option<&CellValue>, default: CellValue, kind: FieldKind) -> CellValue {
    let Some(value) = value.filter(|value| !matches!(value, CellValue::Empty)) else {
        return default;
    };

    match kind {
        FieldKind::String => CellValue::Text(value.to_string().trim().to_string()),
        FieldKind::Number => parse_number(value).map_or(default, number_cell),
        FieldKind::Boolean => CellValue::Bool(is_truthy(value)),
        FieldKind::Date => parse_datetime(value).map_or(default, |timestamp| {
            CellValue::Text(timestamp.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string())
        }),
        FieldKind::Decimal => {
            parse_decimal(value).map_or(default, |number| CellValue::Text(format!("{number:.2}")))
        }
        FieldKind::Raw => value.clone(),
    }
}

/// Formats a value as a store date (`YYYY-MM-DD`).
///
/// Returns `None` for missing or unparseable values.
#[must_use]
pub fn to_store_date(value: Option<&CellValue>) -> Option<String> {
    store_date(value).map(|date| date.format("%Y-%m-%d").to_string())
}

/// Parses a value to calendar-date precision.
#[must_use]
pub fn store_date(value: Option<&CellValue>) -> Option<NaiveDate> {
    value.and_then(parse_datetime).map(|timestamp| timestamp.date())
}

/// Trimmed text of the value, or `default` when missing or blank.
#[must_use]
pub fn text_or(value: Option<&CellValue>, default: &str) -> String {
    optional_text(value).unwrap_or_else(|| default.to_string())
}

/// Trimmed text of the value, `None` when missing or blank.
#[must_use]
pub fn optional_text(value: Option<&CellValue>) -> Option<String> {
    value
        .map(|value| value.to_string().trim().to_string())
        .filter(|text| !text.is_empty())
}

/// Numeric value, or `default` when missing or not a number.
#[must_use]
pub fn number_or(value: Option<&CellValue>, default: f64) -> f64 {
    value.and_then(parse_number).unwrap_or(default)
}

/// Whole-number value, or `default` when missing or not a number.
///
/// Fractions are truncated toward zero.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn integer_or(value: Option<&CellValue>, default: i64) -> i64 {
    value
        .and_then(parse_number)
        .filter(|number| number.abs() < 9.0e15)
        .map_or(default, |number| number.trunc() as i64)
}

/// Positive integer reference, `None` when missing, zero, negative, or invalid.
#[must_use]
pub fn optional_reference(value: Option<&CellValue>) -> Option<i64> {
    let id = integer_or(value, 0);
    (id > 0).then_some(id)
}

/// Positive integer reference, or `default`.
#[must_use]
pub fn reference_or(value: Option<&CellValue>, default: i64) -> i64 {
    optional_reference(value).unwrap_or(default)
}

/// Truthiness of the value, or `default` when missing.
#[must_use]
pub fn flag_or(value: Option<&CellValue>, default: bool) -> bool {
    value.map_or(default, is_truthy)
}

/// Amount rounded to two decimals, or `default` when missing or unparseable.
#[must_use]
pub fn decimal_or(value: Option<&CellValue>, default: f64) -> f64 {
    value.and_then(parse_decimal).map_or(default, round_cents)
}

/// Timestamp of the value, or `default` when missing or unparseable.
#[must_use]
pub fn timestamp_or(value: Option<&CellValue>, default: NaiveDateTime) -> NaiveDateTime {
    value.and_then(parse_datetime).unwrap_or(default)
}

/// Rounds an amount to cents.
#[must_use]
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn number_cell(number: f64) -> CellValue {
    if number.fract() == 0.0 && number.abs() < 9.0e15 {
        CellValue::Int(number as i64)
    } else {
        CellValue::Float(number)
    }
}

/// Accepts `,` as the decimal separator when the text has no `.`.
fn decimal_separator(text: &str) -> Cow<'_, str> {
    if text.contains(',') && !text.contains('.') {
        Cow::Owned(text.replacen(',', ".", 1))
    } else {
        Cow::Borrowed(text)
    }
}

#[allow(clippy::cast_precision_loss)]
fn parse_number(value: &CellValue) -> Option<f64> {
    let number = match value {
        CellValue::Empty | CellValue::DateTime(_) => return None,
        CellValue::Bool(flag) => f64::from(u8::from(*flag)),
        CellValue::Int(number) => *number as f64,
        CellValue::Float(number) => *number,
        CellValue::Text(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return None;
            }
            decimal_separator(trimmed).parse::<f64>().ok()?
        }
    };
    number.is_finite().then_some(number)
}

/// Parses the longest numeric prefix of the value (`"12.5 EUR"` is `12.5`).
#[allow(clippy::cast_precision_loss)]
fn parse_decimal(value: &CellValue) -> Option<f64> {
    match value {
        CellValue::Text(text) => {
            let normalized = decimal_separator(text.trim());
            let prefix = numeric_prefix(&normalized);
            prefix.parse::<f64>().ok().filter(|number| number.is_finite())
        }
        CellValue::Bool(_) | CellValue::DateTime(_) | CellValue::Empty => None,
        CellValue::Int(number) => Some(*number as f64),
        CellValue::Float(number) => number.is_finite().then_some(*number),
    }
}

fn numeric_prefix(text: &str) -> &str {
    let bytes = text.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let integer_start = end;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    let mut digits = end - integer_start;

    if bytes.get(end) == Some(&b'.') {
        let fraction_start = end + 1;
        let mut fraction_end = fraction_start;
        while bytes.get(fraction_end).is_some_and(u8::is_ascii_digit) {
            fraction_end += 1;
        }
        digits += fraction_end - fraction_start;
        if digits > 0 {
            end = fraction_end;
        }
    }

    if digits == 0 {
        return "";
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exponent_end = end + 1;
        if matches!(bytes.get(exponent_end), Some(b'+' | b'-')) {
            exponent_end += 1;
        }
        let exponent_digits_start = exponent_end;
        while bytes.get(exponent_end).is_some_and(u8::is_ascii_digit) {
            exponent_end += 1;
        }
        if exponent_end > exponent_digits_start {
            end = exponent_end;
        }
    }

    &text[..end]
}

fn is_truthy(value: &CellValue) -> bool {
    match value {
        CellValue::Empty => false,
        CellValue::Bool(flag) => *flag,
        CellValue::Int(number) => *number != 0,
        CellValue::Float(number) => *number != 0.0 && !number.is_nan(),
        CellValue::Text(text) => !matches!(
            text.trim().to_lowercase().as_str(),
            "" | "0" | "false" | "no" | "n" | "off"
        ),
        CellValue::DateTime(_) => true,
    }
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y"];

/// Largest spreadsheet serial date (9999-12-31)
const MAX_SERIAL_DATE: f64 = 2_958_465.0;

fn parse_datetime(value: &CellValue) -> Option<NaiveDateTime> {
    match value {
        CellValue::DateTime(timestamp) => Some(*timestamp),
        CellValue::Text(text) => parse_datetime_text(text.trim()),
        #[allow(clippy::cast_precision_loss)]
        CellValue::Int(serial) => from_serial_date(*serial as f64),
        CellValue::Float(serial) => from_serial_date(*serial),
        CellValue::Empty | CellValue::Bool(_) => None,
    }
}

fn parse_datetime_text(text: &str) -> Option<NaiveDateTime> {
    if text.is_empty() {
        return None;
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(text) {
        return Some(timestamp.naive_utc());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
                .map(|date| date.and_time(NaiveTime::MIN))
        })
}

/// Converts a spreadsheet serial date (days since 1899-12-30) to a timestamp.
#[allow(clippy::cast_possible_truncation)]
fn from_serial_date(serial: f64) -> Option<NaiveDateTime> {
    if !(1.0..=MAX_SERIAL_DATE).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_time(NaiveTime::MIN);
    let millis = (serial * 86_400_000.0).round() as i64;
    epoch.checked_add_signed(TimeDelta::try_milliseconds(millis)?)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;

    fn text(value: &str) -> CellValue {
        CellValue::from(value)
    }

    #[test]
    fn test_missing_value_returns_default_for_every_kind() {
        for kind in [
            FieldKind::String,
            FieldKind::Number,
            FieldKind::Boolean,
            FieldKind::Date,
            FieldKind::Decimal,
            FieldKind::Raw,
        ] {
            assert_eq!(normalize(None, text("default"), kind), text("default"));
            assert_eq!(
                normalize(Some(&CellValue::Empty), text("  default "), kind),
                text("  default ")
            );
        }
    }

    #[test]
    fn test_string_kind_trims() {
        assert_eq!(
            normalize(Some(&CellValue::Int(123)), text("default"), FieldKind::String),
            text("123")
        );
        assert_eq!(
            normalize(Some(&text("  Ana ")), text(""), FieldKind::String),
            text("Ana")
        );
    }

    #[test]
    fn test_number_kind() {
        assert_eq!(
            normalize(Some(&text("123")), CellValue::Int(0), FieldKind::Number),
            CellValue::Int(123)
        );
        assert_eq!(
            normalize(Some(&text("1.5")), CellValue::Int(0), FieldKind::Number),
            CellValue::Float(1.5)
        );
        assert_eq!(
            normalize(Some(&text("abc")), CellValue::Int(0), FieldKind::Number),
            CellValue::Int(0)
        );
        assert_eq!(
            normalize(Some(&text("NaN")), CellValue::Int(7), FieldKind::Number),
            CellValue::Int(7)
        );
    }

    #[test]
    fn test_boolean_kind() {
        assert_eq!(
            normalize(Some(&CellValue::Int(1)), CellValue::Bool(false), FieldKind::Boolean),
            CellValue::Bool(true)
        );
        assert_eq!(
            normalize(Some(&CellValue::Int(0)), CellValue::Bool(true), FieldKind::Boolean),
            CellValue::Bool(false)
        );
        assert_eq!(
            normalize(Some(&text("false")), CellValue::Bool(true), FieldKind::Boolean),
            CellValue::Bool(false)
        );
        assert_eq!(
            normalize(Some(&text("si")), CellValue::Bool(false), FieldKind::Boolean),
            CellValue::Bool(true)
        );
    }

    #[test]
    fn test_date_kind() {
        assert_eq!(
            normalize(Some(&text("2022-01-01")), CellValue::Empty, FieldKind::Date),
            text("2022-01-01T00:00:00.000Z")
        );
        assert_eq!(
            normalize(Some(&text("no-es-fecha")), text("default-date"), FieldKind::Date),
            text("default-date")
        );
    }

    #[test]
    fn test_decimal_kind() {
        assert_eq!(
            normalize(Some(&text("123.45")), CellValue::Int(0), FieldKind::Decimal),
            text("123.45")
        );
        assert_eq!(
            normalize(Some(&text("abc")), CellValue::Int(0), FieldKind::Decimal),
            CellValue::Int(0)
        );
        assert_eq!(
            normalize(Some(&CellValue::Int(10)), CellValue::Int(0), FieldKind::Decimal),
            text("10.00")
        );
        assert_eq!(
            normalize(Some(&text("12.5 EUR")), CellValue::Int(0), FieldKind::Decimal),
            text("12.50")
        );
    }

    #[test]
    fn test_raw_kind_passes_through() {
        let value = text("  untouched ");
        assert_eq!(normalize(Some(&value), CellValue::Empty, FieldKind::Raw), value);
        assert_eq!("unknown".parse::<FieldKind>(), Ok(FieldKind::Raw));
        assert_eq!("Decimal".parse::<FieldKind>(), Ok(FieldKind::Decimal));
    }

    #[test]
    fn test_to_store_date() {
        assert_eq!(
            to_store_date(Some(&text("2022-01-01"))),
            Some("2022-01-01".to_string())
        );
        assert_eq!(to_store_date(Some(&text("not-a-date"))), None);
        assert_eq!(to_store_date(None), None);
        assert_eq!(to_store_date(Some(&CellValue::Empty)), None);
        assert_eq!(
            to_store_date(Some(&text("2022-03-04T15:30:00Z"))),
            Some("2022-03-04".to_string())
        );
        assert_eq!(
            to_store_date(Some(&text("25/12/2021"))),
            Some("2021-12-25".to_string())
        );
    }

    #[test]
    fn test_serial_dates() {
        // 44562 is 2022-01-01 in spreadsheet serial numbering
        assert_eq!(
            to_store_date(Some(&CellValue::Int(44562))),
            Some("2022-01-01".to_string())
        );
        assert_eq!(to_store_date(Some(&CellValue::Int(-3))), None);
    }

    #[test]
    fn test_typed_helpers() {
        assert_eq!(text_or(None, "0"), "0");
        assert_eq!(text_or(Some(&text(" 28001 ")), "0"), "28001");
        assert_eq!(optional_text(Some(&text("   "))), None);
        assert_eq!(number_or(Some(&text("2,5")), 0.0), 2.5);
        assert_eq!(integer_or(Some(&text("45")), 30), 45);
        assert_eq!(integer_or(Some(&text("x")), 30), 30);
        assert_eq!(reference_or(Some(&CellValue::Int(0)), 63), 63);
        assert_eq!(reference_or(Some(&CellValue::Float(12.0)), 63), 12);
        assert_eq!(optional_reference(Some(&text("-4"))), None);
        assert!(!flag_or(None, false));
        assert!(flag_or(Some(&CellValue::Int(1)), false));
        assert_eq!(decimal_or(Some(&text("19.999")), 0.0), 20.0);
        assert_eq!(decimal_or(Some(&text("n/a")), 0.0), 0.0);
    }

    #[test]
    fn test_timestamp_or() {
        let fallback = NaiveDate::from_ymd_opt(2020, 1, 1)
            .unwrap()
            .and_time(NaiveTime::MIN);
        assert_eq!(timestamp_or(Some(&text("garbage")), fallback), fallback);
        assert_eq!(
            timestamp_or(Some(&text("2023-05-06 10:11:12")), fallback).to_string(),
            "2023-05-06 10:11:12"
        );
    }
}
