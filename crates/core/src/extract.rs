//! Field extractors.
//!
//! Every column names an [`Extractor`] key instead of carrying a closure. [`Extractor::extract`]
//! is the one place those keys are interpreted; the functions below hold the extraction rules
//! that are more than a path lookup.

use crate::error::ExtractionFailure;
use crate::format::{self, humanize, parse_timestamp};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use fhir::{lookup, lookup_str};
use serde::Serialize;
use serde_json::Value;

const BLOOD_PRESSURE_DISPLAY: &str = "Blood Pressure";
const BLOOD_PRESSURE_UNIT: &str = "mmHg";

/// Named value extractor a column may reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Extractor {
    /// The value at a dotted path, as stored.
    Field { path: &'static str },
    /// Always empty text (spacer columns).
    Blank,
    /// [`obs_value`] applied to the record.
    ObservationValue,
    /// [`duration`] of the period at a path.
    PeriodDuration { path: &'static str },
    /// [`attribute_x_time`] for a choice-type prefix such as `performed`.
    AttributeTime { prefix: &'static str },
    /// Base64 attachment data at a path, decoded to text.
    Base64Text { path: &'static str },
    /// `label` followed by the text at `path`; fails when the text is missing.
    Labelled {
        label: &'static str,
        path: &'static str,
    },
    /// `label` followed by the text at `path`, or just `label` when it is missing.
    LabelledOrBare {
        label: &'static str,
        path: &'static str,
    },
}

impl Extractor {
    /// Pull this extractor's raw value out of `record`.
    ///
    /// # Errors
    ///
    /// Returns an [`ExtractionFailure`] when the record does not have the expected shape.
    pub fn extract(&self, record: &Value) -> Result<Value, ExtractionFailure> {
        match *self {
            Extractor::Field { path } => Ok(lookup(record, path)?.clone()),
            Extractor::Blank => Ok(Value::String(String::new())),
            Extractor::ObservationValue => obs_value(record).map(Value::String),
            Extractor::PeriodDuration { path } => duration(lookup(record, path)?).map(Value::String),
            Extractor::AttributeTime { prefix } => {
                attribute_x_time(record, prefix).map(Value::String)
            }
            Extractor::Base64Text { path } => base64_text(record, path).map(Value::String),
            Extractor::Labelled { label, path } => {
                let text = required_str(record, path)?;
                Ok(Value::String(format!("{label}{text}")))
            }
            Extractor::LabelledOrBare { label, path } => {
                let text = lookup_str(record, path).unwrap_or("");
                Ok(Value::String(format!("{label}{text}")))
            }
        }
    }
}

/// Display value of an observation.
///
/// In priority order: a quantity (`"{value to 2 decimals} {unit}"`), a coded concept's display,
/// a string value, then the blood pressure panel. For a panel whose first component has no
/// quantity the result is empty text. Otherwise both component values are rounded to whole
/// numbers and the larger is reported first (`"120 / 80 mmHg"`), whichever component is
/// nominally systolic.
///
/// Observations with none of these yield empty text.
///
/// # Errors
///
/// Returns an [`ExtractionFailure`] when the value that was picked is itself malformed (for
/// example a quantity without a numeric value, or a panel with only one component).
pub fn obs_value(entry: &Value) -> Result<String, ExtractionFailure> {
    if let Ok(quantity) = lookup(entry, "valueQuantity") {
        let value = to_fixed(number_at(quantity, "value")?, 2);
        let unit = lookup_str(quantity, "unit")
            .or_else(|| lookup_str(quantity, "code"))
            .unwrap_or("");
        return Ok(if unit.is_empty() {
            value
        } else {
            format!("{value} {unit}")
        });
    }

    if let Ok(concept) = lookup(entry, "valueCodeableConcept") {
        return lookup_str(concept, "coding.0.display")
            .or_else(|| lookup_str(concept, "text"))
            .map(str::to_string)
            .ok_or_else(|| ExtractionFailure::Shape {
                path: "valueCodeableConcept".to_string(),
                expected: "a coded concept with display text",
            });
    }

    if let Some(text) = lookup_str(entry, "valueString").filter(|s| !s.is_empty()) {
        return Ok(text.to_string());
    }

    if lookup_str(entry, "code.coding.0.display") == Some(BLOOD_PRESSURE_DISPLAY) {
        let first = lookup(entry, "component.0")?;
        let Ok(first_quantity) = lookup(first, "valueQuantity") else {
            return Ok(String::new());
        };

        let v1 = number_at(first_quantity, "value")?;
        let v2 = number_at(lookup(entry, "component.1.valueQuantity")?, "value")?;
        let (high, low) = if v1 > v2 { (v1, v2) } else { (v2, v1) };

        return Ok(format!(
            "{} / {} {BLOOD_PRESSURE_UNIT}",
            to_fixed(high, 0),
            to_fixed(low, 0)
        ));
    }

    Ok(String::new())
}

/// Formatted `{prefix}DateTime`, else formatted `{prefix}Period`, else empty text.
///
/// # Errors
///
/// Returns an [`ExtractionFailure`] when the chosen value cannot be formatted.
pub fn attribute_x_time(record: &Value, prefix: &str) -> Result<String, ExtractionFailure> {
    if let Some(at) = lookup_str(record, &format!("{prefix}DateTime")) {
        return Ok(format::date_time(at)?);
    }
    if let Ok(period) = lookup(record, &format!("{prefix}Period")) {
        return Ok(format::period(period)?);
    }
    Ok(String::new())
}

/// Approximate length of a period ("3 days"), or empty text when the period has no end.
///
/// # Errors
///
/// Returns an [`ExtractionFailure`] when the period has an end but no parseable start.
pub fn duration(period: &Value) -> Result<String, ExtractionFailure> {
    let Some(end) = lookup_str(period, "end") else {
        return Ok(String::new());
    };
    let start = parse_timestamp(required_str(period, "start")?)?;
    let end = parse_timestamp(end)?;
    Ok(humanize(end - start))
}

fn base64_text(record: &Value, path: &str) -> Result<String, ExtractionFailure> {
    let encoded: String = required_str(record, path)?
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let decode_failure = || ExtractionFailure::Decode {
        path: path.to_string(),
    };
    let bytes = STANDARD.decode(encoded).map_err(|_| decode_failure())?;
    String::from_utf8(bytes).map_err(|_| decode_failure())
}

fn required_str<'a>(record: &'a Value, path: &str) -> Result<&'a str, ExtractionFailure> {
    lookup(record, path)?
        .as_str()
        .ok_or_else(|| ExtractionFailure::Shape {
            path: path.to_string(),
            expected: "text",
        })
}

/// A JSON number, or a string holding one.
fn number_at(value: &Value, path: &str) -> Result<f64, ExtractionFailure> {
    let raw = lookup(value, path)?;
    raw.as_f64()
        .or_else(|| raw.as_str().and_then(|s| s.trim().parse::<f64>().ok()))
        .filter(|n| n.is_finite())
        .ok_or_else(|| ExtractionFailure::Shape {
            path: path.to_string(),
            expected: "a number",
        })
}

/// Fixed-point rendering with halves rounded away from zero.
fn to_fixed(value: f64, digits: usize) -> String {
    let factor = 10f64.powi(digits as i32);
    let rounded = (value * factor).round() / factor;
    format!("{rounded:.digits$}")
}
