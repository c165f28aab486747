//! Value formatters.
//!
//! Pure functions from a raw record value to display text. Each is reachable from a schema
//! through the [`Formatter`] key, so column definitions stay plain data.
//!
//! Timestamps keep the wall clock written in the record: an offset is parsed but never used to
//! shift the time into another zone.

use crate::error::FormatError;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;
use serde_json::Value;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";
const DATE_TIME_FORMAT: &str = "%Y-%m-%d - %-I:%M:%S %P";

/// Named formatter a column may apply to its extracted value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Formatter {
    Date,
    Time,
    DateTime,
    NumberWithCommas,
    Code,
    Period,
}

impl Formatter {
    /// Apply this formatter to a raw value.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError`] if the value has the wrong shape or cannot be parsed.
    pub fn apply(self, raw: &Value) -> Result<String, FormatError> {
        match self {
            Formatter::Date => date(text(raw)?),
            Formatter::Time => time(text(raw)?),
            Formatter::DateTime => date_time(text(raw)?),
            Formatter::NumberWithCommas => match raw {
                Value::Number(n) => number_with_commas(&n.to_string()),
                Value::String(s) => number_with_commas(s),
                other => Err(FormatError::NotANumber(other.to_string())),
            },
            Formatter::Code => code(raw),
            Formatter::Period => period(raw),
        }
    }
}

fn text(raw: &Value) -> Result<&str, FormatError> {
    raw.as_str()
        .ok_or_else(|| FormatError::NotText(raw.to_string()))
}

/// Format a date or timestamp as `YYYY-MM-DD`.
pub fn date(s: &str) -> Result<String, FormatError> {
    Ok(parse_timestamp(s)?.format(DATE_FORMAT).to_string())
}

/// Format a timestamp's time of day as `HH:mm:ss`.
pub fn time(s: &str) -> Result<String, FormatError> {
    Ok(parse_timestamp(s)?.format(TIME_FORMAT).to_string())
}

/// Format a timestamp as `YYYY-MM-DD - h:mm:ss am`.
pub fn date_time(s: &str) -> Result<String, FormatError> {
    Ok(parse_timestamp(s)?.format(DATE_TIME_FORMAT).to_string())
}

/// Insert thousands separators into the integer part of a decimal number.
pub fn number_with_commas(s: &str) -> Result<String, FormatError> {
    let trimmed = s.trim();
    let (sign, unsigned) = match trimmed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", trimmed),
    };
    let (integer, fraction) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };

    let digits_only = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    if integer.is_empty() || !digits_only(integer) || !fraction.map_or(true, digits_only) {
        return Err(FormatError::NotANumber(s.to_string()));
    }

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (i, ch) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    Ok(match fraction {
        Some(f) => format!("{sign}{grouped}.{f}"),
        None => format!("{sign}{grouped}"),
    })
}

/// Format a coding as `"{code}: {display}"`.
pub fn code(coding: &Value) -> Result<String, FormatError> {
    let code = coding
        .get("code")
        .and_then(Value::as_str)
        .ok_or_else(|| FormatError::MalformedCoding(coding.to_string()))?;
    let display = coding.get("display").and_then(Value::as_str).unwrap_or("");
    Ok(format!("{code}: {display}"))
}

/// Format a period as `"{start} -> {end}"`, each side as a date-time.
///
/// A missing side renders as empty text; a period with neither side is malformed.
pub fn period(p: &Value) -> Result<String, FormatError> {
    let side = |key: &str| -> Result<Option<String>, FormatError> {
        p.get(key)
            .and_then(Value::as_str)
            .map(date_time)
            .transpose()
    };

    if !p.is_object() {
        return Err(FormatError::MalformedPeriod(p.to_string()));
    }
    match (side("start")?, side("end")?) {
        (None, None) => Err(FormatError::MalformedPeriod(p.to_string())),
        (start, end) => Ok(format!(
            "{} -> {}",
            start.unwrap_or_default(),
            end.unwrap_or_default()
        )),
    }
}

/// Parse the timestamp shapes FHIR records carry.
///
/// Accepts RFC 3339 with an offset, naive `YYYY-MM-DDTHH:MM[:SS[.f]]`, and the partial dates
/// `YYYY-MM-DD`, `YYYY-MM` and `YYYY` (which start at the first day, midnight).
pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime, FormatError> {
    let s = s.trim();
    let invalid = || FormatError::InvalidTimestamp(s.to_string());

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.naive_local());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt);
        }
    }

    let date = match s.len() {
        10 => NaiveDate::parse_from_str(s, DATE_FORMAT).ok(),
        7 => NaiveDate::parse_from_str(&format!("{s}-01"), DATE_FORMAT).ok(),
        4 if s.bytes().all(|b| b.is_ascii_digit()) => s
            .parse::<i32>()
            .ok()
            .and_then(|year| NaiveDate::from_ymd_opt(year, 1, 1)),
        _ => None,
    };

    date.and_then(|d| d.and_hms_opt(0, 0, 0)).ok_or_else(invalid)
}

/// Describe a length of time the way a person would ("3 days", "an hour").
///
/// The sign is ignored. Each unit is rounded and the first unit under its threshold wins:
/// 45 seconds, 45 minutes, 22 hours, 26 days, 11 months.
pub fn humanize(duration: chrono::Duration) -> String {
    let ms = duration.num_milliseconds().unsigned_abs() as f64;
    let days_exact = ms / 86_400_000.0;
    let months_exact = days_exact * 4800.0 / 146_097.0;

    let seconds = (ms / 1000.0).round();
    let minutes = (ms / 60_000.0).round();
    let hours = (ms / 3_600_000.0).round();
    let days = days_exact.round();
    let months = months_exact.round();
    let years = (months_exact / 12.0).round();

    if seconds < 45.0 {
        "a few seconds".to_string()
    } else if minutes <= 1.0 {
        "a minute".to_string()
    } else if minutes < 45.0 {
        format!("{minutes} minutes")
    } else if hours <= 1.0 {
        "an hour".to_string()
    } else if hours < 22.0 {
        format!("{hours} hours")
    } else if days <= 1.0 {
        "a day".to_string()
    } else if days < 26.0 {
        format!("{days} days")
    } else if months <= 1.0 {
        "a month".to_string()
    } else if months < 11.0 {
        format!("{months} months")
    } else if years <= 1.0 {
        "a year".to_string()
    } else {
        format!("{years} years")
    }
}
