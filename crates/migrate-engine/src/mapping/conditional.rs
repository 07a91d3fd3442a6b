//! Conditional normalizer
//!
//! Produces a flat `{id, createdAt, totalAmount, status}` record:
//!
//! - records without a non-empty `id` are skipped
//! - `status` goes through a fixed code table, unknown codes become `Unknown`
//! - the first present date field is parsed against an ordered list of
//!   formats and re-emitted as RFC 3339 UTC with milliseconds, or `null`
//! - the first present amount field is parsed as a decimal (comma accepted as
//!   the decimal separator) and defaults to `0`

use super::{MapError, RecordMapper};
use crate::json::scalar_text;
use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::{Map, Number, Value};
use std::str::FromStr;

pub const ID_FIELD: &str = "id";
pub const STATUS_FIELD: &str = "status";

/// Date source fields, highest priority first
pub const DATE_FIELDS: &[&str] = &["date", "created_at", "createdAt", "timestamp"];

/// Amount source fields, highest priority first
pub const AMOUNT_FIELDS: &[&str] = &["total", "amount", "price"];

pub const UNKNOWN_STATUS: &str = "Unknown";

const STATUS_TABLE: &[(&str, &str)] = &[
    ("OK", "Confirmed"),
    ("PEND", "Pending"),
    ("CANC", "Cancelled"),
];

#[derive(Debug, Clone, Copy)]
enum DateFormat {
    /// Calendar date at midnight UTC
    Date(&'static str),
    /// Date and time without offset, taken as UTC
    DateTime(&'static str),
    /// RFC 3339 with offset, or the same layout without one (taken as UTC)
    RoundTrip,
}

/// Strict formats, tried in this order
const STRICT_FORMATS: &[DateFormat] = &[
    DateFormat::Date("%Y-%m-%d"),
    DateFormat::Date("%d/%m/%Y"),
    DateFormat::RoundTrip,
    DateFormat::DateTime("%Y-%m-%dT%H:%M:%SZ"),
    DateFormat::DateTime("%Y-%m-%dT%H:%M:%S"),
    DateFormat::Date("%m/%d/%Y"),
];

/// Lenient fallbacks once every strict format failed
const LENIENT_FORMATS: &[DateFormat] = &[
    DateFormat::DateTime("%Y-%m-%d %H:%M:%S%.f"),
    DateFormat::DateTime("%Y-%m-%d %H:%M"),
    DateFormat::DateTime("%d/%m/%Y %H:%M:%S"),
    DateFormat::DateTime("%d/%m/%Y %H:%M"),
    DateFormat::Date("%Y/%m/%d"),
    DateFormat::Date("%d-%m-%Y"),
    DateFormat::Date("%d.%m.%Y"),
];

impl DateFormat {
    fn parse(&self, raw: &str) -> Option<DateTime<Utc>> {
        match self {
            DateFormat::Date(fmt) => NaiveDate::parse_from_str(raw, fmt)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc()),
            DateFormat::DateTime(fmt) => NaiveDateTime::parse_from_str(raw, fmt)
                .ok()
                .map(|dt| dt.and_utc()),
            DateFormat::RoundTrip => DateTime::parse_from_rfc3339(raw)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
                .or_else(|| {
                    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                        .ok()
                        .map(|dt| dt.and_utc())
                }),
        }
    }
}

/// Parse a legacy date and render it as `YYYY-MM-DDTHH:MM:SS.mmmZ`
pub fn normalize_date(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    STRICT_FORMATS
        .iter()
        .find_map(|format| format.parse(raw))
        .or_else(|| lenient_date(raw))
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
}

fn lenient_date(raw: &str) -> Option<DateTime<Utc>> {
    LENIENT_FORMATS
        .iter()
        .find_map(|format| format.parse(raw))
        .or_else(|| {
            DateTime::parse_from_rfc2822(raw)
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
        })
}

/// Parse a legacy amount; anything unparseable is `None`
pub fn parse_amount(raw: &str) -> Option<BigDecimal> {
    let cleaned = raw.trim().replace(',', ".");
    BigDecimal::from_str(&cleaned).ok()
}

/// Map a status code through the fixed table
pub fn normalize_status(raw: Option<&str>) -> &'static str {
    let Some(code) = raw.map(str::trim) else {
        return UNKNOWN_STATUS;
    };

    STATUS_TABLE
        .iter()
        .find(|(legacy, _)| *legacy == code)
        .map_or(UNKNOWN_STATUS, |&(_, canonical)| canonical)
}

fn first_present<'a>(record: &'a Value, fields: &[&str]) -> Option<&'a Value> {
    fields
        .iter()
        .filter_map(|field| record.get(*field))
        .find(|value| !value.is_null())
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ConditionalMapper;

impl ConditionalMapper {
    pub fn new() -> Self {
        Self
    }

    fn identifier(record: &Value) -> Result<Option<String>, MapError> {
        match record.get(ID_FIELD) {
            None | Some(Value::Null) => Ok(None),
            Some(value @ (Value::Object(_) | Value::Array(_))) => Err(MapError::field(
                ID_FIELD,
                format!("expected a string or number, found {value}"),
            )),
            Some(value) => Ok(scalar_text(value)
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty())),
        }
    }

    fn amount(record: &Value) -> Result<Number, MapError> {
        let Some(amount) = first_present(record, AMOUNT_FIELDS)
            .and_then(scalar_text)
            .and_then(|raw| parse_amount(&raw))
        else {
            return Ok(Number::from(0));
        };

        Number::from_str(&amount.to_string())
            .map_err(|e| MapError::field("totalAmount", e.to_string()))
    }
}

impl RecordMapper for ConditionalMapper {
    fn name(&self) -> &str {
        "conditional"
    }

    fn map(&self, legacy: &Value) -> Result<Option<Value>, MapError> {
        let Some(id) = Self::identifier(legacy)? else {
            return Ok(None);
        };

        let created_at = first_present(legacy, DATE_FIELDS)
            .and_then(scalar_text)
            .and_then(|raw| normalize_date(&raw));
        let status = normalize_status(legacy.get(STATUS_FIELD).and_then(Value::as_str));

        let mut out = Map::new();
        out.insert("id".into(), Value::String(id));
        out.insert(
            "createdAt".into(),
            created_at.map_or(Value::Null, Value::String),
        );
        out.insert("totalAmount".into(), Value::Number(Self::amount(legacy)?));
        out.insert("status".into(), Value::String(status.to_string()));

        Ok(Some(Value::Object(out)))
    }
}
