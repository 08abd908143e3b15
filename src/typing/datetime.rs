//! Structured `datetime` type, parameterised by `datetime_flavour`.

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};

use super::{LogicalType, Resolution, TypeResolver};
use crate::schema::PropertyBag;
use crate::types::{NativeKind, Value};

pub(crate) const DATETIME_TYPE_NAME: &str = "datetime";

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// ISO-8601 datetimes.
///
/// Accepts RFC 3339 (offsets normalised to UTC), naive `date[T ]time` with optional seconds and
/// fraction, and bare dates (midnight).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IsoDatetimeType;

impl LogicalType for IsoDatetimeType {
    fn name(&self) -> &str {
        DATETIME_TYPE_NAME
    }

    fn parse(&self, raw: &str) -> Result<Value, String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(Value::Null);
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(Value::DateTime(dt.naive_utc()));
        }
        for fmt in NAIVE_FORMATS {
            if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
                return Ok(Value::DateTime(dt));
            }
        }
        NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(Value::DateTime)
            .ok_or_else(|| "expected ISO-8601 datetime".to_string())
    }

    fn is_target(&self, native: &NativeKind) -> bool {
        *native == NativeKind::Timestamp
    }

    fn represent(&self, value: &Value) -> String {
        match value {
            Value::DateTime(dt) => dt.format("%Y-%m-%dT%H:%M:%S").to_string(),
            other => other.to_string(),
        }
    }

    fn sample(&self, n: usize) -> String {
        let base = NaiveDate::from_ymd_opt(2000, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap_or_default();
        let dt = base
            .checked_add_signed(Duration::days(n as i64))
            .unwrap_or(base);
        self.represent(&Value::DateTime(dt))
    }
}

/// Resolves `datetime`, dispatching on `datetime_flavour` (default `iso`).
///
/// An unsupported flavour is `NotFound`, leaving the name to later resolvers.
#[derive(Debug, Default, Clone, Copy)]
pub struct DatetimeResolver;

impl TypeResolver for DatetimeResolver {
    fn resolve(&self, name: &str, properties: &PropertyBag) -> Resolution {
        if name != DATETIME_TYPE_NAME {
            return Resolution::NotFound;
        }
        match properties.get_str("datetime_flavour") {
            Ok(Some("iso")) | Ok(None) => Resolution::Found(Arc::new(IsoDatetimeType)),
            _ => Resolution::NotFound,
        }
    }
}
