use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use transit_star_types::Value;

/// Per-column coercion applied after renaming
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    /// `DD/MM/YYYY`, `DD-MM-YYYY`, optionally followed by a time, or ISO
    DayFirstDate,
    /// `HH:MM` or `HH:MM:SS`, reduced to a time-only value
    TimeOfDay,
    /// `YYYYMMDDHHMMSS` with an optional fractional suffix
    CompactTimestamp,
    /// Decimal number, decimal comma accepted
    Decimal,
    /// Integer, a zero fraction or decimal comma accepted
    Integer,
}

const DATE_FORMATS: &[&str] = &["%d/%m/%Y", "%d-%m-%Y", "%Y-%m-%d"];
const DATETIME_FORMATS: &[&str] = &[
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
];
const TIME_FORMATS: &[&str] = &["%H:%M:%S", "%H:%M"];

impl Coercion {
    /// Coerce one cell. Unparseable input becomes null; values already of the
    /// target type pass through unchanged.
    pub fn apply(self, value: &Value) -> Value {
        match (self, value) {
            (_, Value::Null) => Value::Null,
            (Coercion::DayFirstDate, Value::Date(_)) => value.clone(),
            (Coercion::DayFirstDate, Value::Timestamp(ts)) => Value::Date(ts.date()),
            (Coercion::DayFirstDate, Value::Text(s)) => {
                parse_day_first_date(s).map(Value::Date).unwrap_or_default()
            }
            (Coercion::TimeOfDay, Value::Time(_)) => value.clone(),
            (Coercion::TimeOfDay, Value::Timestamp(ts)) => Value::Time(ts.time()),
            (Coercion::TimeOfDay, Value::Text(s)) => {
                parse_time_of_day(s).map(Value::Time).unwrap_or_default()
            }
            (Coercion::CompactTimestamp, Value::Timestamp(_)) => value.clone(),
            (Coercion::CompactTimestamp, Value::Text(s)) => parse_compact_timestamp(s)
                .map(Value::Timestamp)
                .unwrap_or_default(),
            (Coercion::Decimal, Value::Float(_)) => value.clone(),
            (Coercion::Decimal, Value::Int(v)) => Value::Float(*v as f64),
            (Coercion::Decimal, Value::Text(s)) => {
                parse_decimal(s).map(Value::Float).unwrap_or_default()
            }
            (Coercion::Integer, Value::Int(_)) => value.clone(),
            (Coercion::Integer, Value::Float(v)) => {
                float_to_int(*v).map(Value::Int).unwrap_or_default()
            }
            (Coercion::Integer, Value::Text(s)) => {
                parse_integer(s).map(Value::Int).unwrap_or_default()
            }
            _ => Value::Null,
        }
    }
}

/// Parse a day-first date, keeping only the date part of a date-time.
pub fn parse_day_first_date(input: &str) -> Option<NaiveDate> {
    let s = input.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
}

pub fn parse_time_of_day(input: &str) -> Option<NaiveTime> {
    let s = input.trim();
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.time())
        })
}

/// Parse `YYYYMMDDHHMMSS`, dropping any `.fraction` suffix first.
pub fn parse_compact_timestamp(input: &str) -> Option<NaiveDateTime> {
    let s = input.trim();
    let whole = s.split(|c: char| c == '.' || c == ',').next().unwrap_or(s);
    if whole.len() != 14 || !whole.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDateTime::parse_from_str(whole, "%Y%m%d%H%M%S").ok()
}

/// Parse a decimal number written with either a decimal point or a decimal comma.
///
/// When both separators appear the last one is the decimal mark and the other
/// is a thousands separator.
pub fn parse_decimal(input: &str) -> Option<f64> {
    let s = input.trim();
    if s.is_empty() {
        return None;
    }
    let normalized = match (s.rfind(','), s.rfind('.')) {
        (Some(comma), Some(dot)) if comma > dot => s.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => s.replace(',', ""),
        (Some(_), None) => s.replace(',', "."),
        _ => s.to_string(),
    };
    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn parse_integer(input: &str) -> Option<i64> {
    let s = input.trim();
    s.parse::<i64>()
        .ok()
        .or_else(|| parse_decimal(s).and_then(float_to_int))
}

fn float_to_int(v: f64) -> Option<i64> {
    (v.fract() == 0.0 && v.abs() < 9.0e15).then_some(v as i64)
}
