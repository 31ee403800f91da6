// Location: mt5-relay/src/application/args.rs
// Purpose: Typed extraction of operation arguments from a decoded request map
// Why: Both transports deliver the same JSON-like map; validation happens once

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::{Map, Value};

use super::errors::DispatchError;

/// Naive timestamp layouts accepted besides RFC 3339; interpreted as UTC
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Read-only view over request arguments. `null` counts as absent.
#[derive(Debug, Clone, Copy)]
pub struct Args<'a> {
    map: &'a Map<String, Value>,
}

impl<'a> Args<'a> {
    pub fn new(map: &'a Map<String, Value>) -> Self {
        Self { map }
    }

    pub fn map(&self) -> &'a Map<String, Value> {
        self.map
    }

    pub fn get(&self, field: &str) -> Option<&'a Value> {
        self.map.get(field).filter(|v| !v.is_null())
    }

    fn require(&self, field: &'static str) -> Result<&'a Value, DispatchError> {
        self.get(field).ok_or(DispatchError::MissingField(field))
    }

    pub fn str(&self, field: &'static str) -> Result<String, DispatchError> {
        as_string(field, self.require(field)?)
    }

    pub fn opt_str(&self, field: &'static str) -> Result<Option<String>, DispatchError> {
        self.get(field).map(|v| as_string(field, v)).transpose()
    }

    pub fn i64(&self, field: &'static str) -> Result<i64, DispatchError> {
        as_i64(field, self.require(field)?)
    }

    pub fn opt_i64(&self, field: &'static str) -> Result<Option<i64>, DispatchError> {
        self.get(field).map(|v| as_i64(field, v)).transpose()
    }

    pub fn i32(&self, field: &'static str) -> Result<i32, DispatchError> {
        let value = self.i64(field)?;
        i32::try_from(value).map_err(|_| DispatchError::invalid(field, "out of range"))
    }

    pub fn u32(&self, field: &'static str) -> Result<u32, DispatchError> {
        let value = self.i64(field)?;
        u32::try_from(value)
            .map_err(|_| DispatchError::invalid(field, "expected a non-negative integer"))
    }

    pub fn opt_u64(&self, field: &'static str) -> Result<Option<u64>, DispatchError> {
        self.get(field).map(|v| as_u64(field, v)).transpose()
    }

    pub fn f64(&self, field: &'static str) -> Result<f64, DispatchError> {
        self.require(field)?
            .as_f64()
            .ok_or_else(|| DispatchError::invalid(field, "expected a number"))
    }

    pub fn opt_bool(&self, field: &'static str) -> Result<Option<bool>, DispatchError> {
        self.get(field)
            .map(|v| match v {
                Value::Bool(b) => Ok(*b),
                Value::Number(n) if n.as_i64() == Some(0) => Ok(false),
                Value::Number(n) if n.as_i64() == Some(1) => Ok(true),
                _ => Err(DispatchError::invalid(field, "expected a boolean")),
            })
            .transpose()
    }

    pub fn time(&self, field: &'static str) -> Result<DateTime<Utc>, DispatchError> {
        parse_timestamp(self.require(field)?).ok_or_else(|| {
            DispatchError::invalid(field, "expected an ISO-8601 timestamp or epoch seconds")
        })
    }
}

fn as_string(field: &'static str, value: &Value) -> Result<String, DispatchError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| DispatchError::invalid(field, "expected a string"))
}

fn as_i64(field: &'static str, value: &Value) -> Result<i64, DispatchError> {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => Ok(i),
            None if n.is_u64() => Err(DispatchError::invalid(field, "out of range")),
            None => integral_f64(field, n.as_f64()).and_then(|f| {
                // i64::MAX as f64 rounds up to 2^63, which is already out of range
                if f >= i64::MIN as f64 && f < i64::MAX as f64 {
                    Ok(f as i64)
                } else {
                    Err(DispatchError::invalid(field, "out of range"))
                }
            }),
        },
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| DispatchError::invalid(field, "expected an integer")),
        _ => Err(DispatchError::invalid(field, "expected an integer")),
    }
}

fn as_u64(field: &'static str, value: &Value) -> Result<u64, DispatchError> {
    let negative = || DispatchError::invalid(field, "expected a non-negative integer");
    match value {
        Value::Number(n) => match n.as_u64() {
            Some(u) => Ok(u),
            None if n.is_i64() => Err(negative()),
            None => integral_f64(field, n.as_f64()).and_then(|f| {
                if f < 0.0 {
                    Err(negative())
                } else if f < u64::MAX as f64 {
                    Ok(f as u64)
                } else {
                    Err(DispatchError::invalid(field, "out of range"))
                }
            }),
        },
        Value::String(s) => s.trim().parse().map_err(|_| negative()),
        _ => Err(negative()),
    }
}

fn integral_f64(field: &'static str, value: Option<f64>) -> Result<f64, DispatchError> {
    value
        .filter(|f| f.is_finite() && f.fract() == 0.0)
        .ok_or_else(|| DispatchError::invalid(field, "expected an integer"))
}

/// Normalize a timestamp argument to UTC.
///
/// Accepts RFC 3339 (`2024-03-01T12:00:00+02:00`), naive ISO-8601 taken as UTC
/// (`2024-03-01T12:00:00`), a bare date (`2024-03-01`) or epoch seconds as an
/// integer or fractional number.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => {
            if let Some(secs) = n.as_i64() {
                return Utc.timestamp_opt(secs, 0).single();
            }
            let secs = n.as_f64()?;
            if !secs.is_finite() {
                return None;
            }
            let whole = secs.floor();
            let nanos = ((secs - whole) * 1e9).round().min(999_999_999.0) as u32;
            Utc.timestamp_opt(whole as i64, nanos).single()
        }
        Value::String(s) => parse_timestamp_str(s.trim()),
        _ => None,
    }
}

fn parse_timestamp_str(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
