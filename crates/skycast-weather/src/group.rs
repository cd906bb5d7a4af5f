//! Reduction of a 3-hourly forecast to one sample per calendar day.
//!
//! The forecast API returns samples in chronological order. For each
//! calendar day the first sample seen is kept and later samples for the
//! same day are dropped. Input is never re-sorted: a caller handing in
//! unordered samples gets "first in input order", not "earliest".

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::types::ForecastSample;

const DATE_TIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Errors raised while grouping samples
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GroupError {
    #[error("sample {index} has no usable timestamp: {reason}")]
    MalformedSample { index: usize, reason: String },
    #[error("expected an array of forecast samples, got {0}")]
    InvalidInput(&'static str),
}

/// Anything carrying a forecast timestamp
pub trait Timestamped {
    /// Raw timestamp text, `None` when the field is absent
    fn timestamp(&self) -> Option<&str>;
}

impl Timestamped for ForecastSample {
    fn timestamp(&self) -> Option<&str> {
        self.dt_txt.as_deref()
    }
}

/// Decoded JSON entries are read through their `dt_txt` field.
impl Timestamped for Value {
    fn timestamp(&self) -> Option<&str> {
        self.get("dt_txt").and_then(Value::as_str)
    }
}

impl<T: Timestamped + ?Sized> Timestamped for &T {
    fn timestamp(&self) -> Option<&str> {
        (**self).timestamp()
    }
}

/// Extract the calendar date from a forecast timestamp.
///
/// Accepts `YYYY-MM-DD HH:MM:SS`, the same with a `T` separator, RFC 3339
/// (the date is taken in the timestamp's own offset) and a bare date.
pub fn calendar_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();

    DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|dt| dt.date())
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
        .or_else(|| NaiveDate::parse_from_str(raw, DATE_FORMAT).ok())
}

/// Keep the first sample of every calendar day, in first-seen day order.
///
/// Works on owned samples (`Vec<ForecastSample>`) as well as borrowed ones
/// (`samples.iter()`), returning the same kind it was given. Samples are
/// returned untouched.
///
/// Input order is a precondition, not something this function restores.
///
/// # Errors
///
/// [`GroupError::MalformedSample`] when any sample lacks a parseable
/// timestamp. Nothing is returned for the samples grouped before it.
pub fn group_by_date<I>(samples: I) -> Result<Vec<I::Item>, GroupError>
where
    I: IntoIterator,
    I::Item: Timestamped,
{
    let mut seen = HashSet::new();
    let mut days = Vec::new();

    for (index, sample) in samples.into_iter().enumerate() {
        let date = sample_date(index, &sample)?;
        if seen.insert(date) {
            days.push(sample);
        }
    }

    Ok(days)
}

/// [`group_by_date`] for untyped JSON, e.g. the raw `list` of a response.
///
/// # Errors
///
/// [`GroupError::InvalidInput`] if `value` is not an array, otherwise the
/// errors of [`group_by_date`].
pub fn group_json(value: &Value) -> Result<Vec<Value>, GroupError> {
    match value {
        Value::Array(items) => Ok(group_by_date(items)?.into_iter().cloned().collect()),
        other => Err(GroupError::InvalidInput(json_kind(other))),
    }
}

fn sample_date<T: Timestamped>(index: usize, sample: &T) -> Result<NaiveDate, GroupError> {
    let raw = sample.timestamp().ok_or_else(|| GroupError::MalformedSample {
        index,
        reason: "missing or non-string timestamp".to_string(),
    })?;

    calendar_date(raw).ok_or_else(|| GroupError::MalformedSample {
        index,
        reason: format!("unparseable timestamp {raw:?}"),
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
