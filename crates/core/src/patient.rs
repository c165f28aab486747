//! Patient summary projection.
//!
//! The patient is shown as a labelled summary rather than a table. Every field is read
//! best-effort: a missing or oddly shaped element leaves that field empty and nothing else.

use crate::constants::{
    BODY_HEIGHT_DISPLAY, BODY_WEIGHT_DISPLAY, ETHNICITY_EXTENSION_URL, GEOLOCATION_EXTENSION_URL,
    RACE_EXTENSION_URL, UNKNOWN_BLOOD_TYPE, UNKNOWN_SHORT,
};
use crate::extract::obs_value;
use fhir::{lookup, lookup_array, lookup_str};
use serde::Serialize;
use serde_json::Value;
use std::borrow::Borrow;

/// Display-ready patient demographics.
///
/// Text fields are empty when the record does not carry them.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PatientSummary {
    /// `"{family}, {given names}"`.
    pub name: String,
    pub gender: String,
    pub birth_date: String,
    /// Address lines joined by spaces.
    pub address: String,
    /// `"{city}, {state}"`.
    pub city_state: String,
    pub postal_code: String,
    /// Date of death, present only for deceased patients.
    pub deceased: Option<String>,
    pub height: String,
    pub weight: String,
    pub race: String,
    pub ethnicity: String,
    pub language: String,
    pub geolocation: Option<Geolocation>,
}

/// Coordinates attached to the patient's first address.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Geolocation {
    pub latitude: f64,
    pub longitude: f64,
}

impl PatientSummary {
    /// Labelled entries in display order.
    ///
    /// Missing race, ethnicity and language show as `unk.`; death entries appear only for
    /// deceased patients.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        let or_unknown = |s: &str| {
            if s.is_empty() {
                UNKNOWN_SHORT.to_string()
            } else {
                s.to_string()
            }
        };

        let mut entries = vec![
            ("Name", self.name.clone()),
            ("Gender", self.gender.clone()),
            ("Date of Birth", self.birth_date.clone()),
            ("Address", self.address.clone()),
            ("City, State", self.city_state.clone()),
            ("Postal Code", self.postal_code.clone()),
        ];
        if let Some(deceased) = &self.deceased {
            entries.push(("Date of Death", deceased.clone()));
        }
        if let Some(geo) = self.geolocation {
            entries.push(("Location", format!("{}, {}", geo.latitude, geo.longitude)));
        }
        entries.extend([
            ("Height", self.height.clone()),
            ("Weight", self.weight.clone()),
            ("Race", or_unknown(&self.race)),
            ("Ethnicity", or_unknown(&self.ethnicity)),
            ("Language", or_unknown(&self.language)),
            ("Blood Type", UNKNOWN_BLOOD_TYPE.to_string()),
        ]);
        if self.deceased.is_some() {
            entries.push(("Cause of Death", String::new()));
        }
        entries
    }
}

/// Summarise a patient record, taking height and weight from the most recent matching
/// observations (the last ones in `observations`).
pub fn summarize<R: Borrow<Value>>(patient: &Value, observations: &[R]) -> PatientSummary {
    let latest = |display: &str| {
        observations
            .iter()
            .rev()
            .map(Borrow::borrow)
            .find(|o| lookup_str(o, "code.coding.0.display") == Some(display))
            .and_then(|o| obs_value(o).ok())
            .unwrap_or_default()
    };

    let text = |path: &str| lookup_str(patient, path).unwrap_or("").to_string();

    PatientSummary {
        name: name(patient),
        gender: text("gender"),
        birth_date: text("birthDate"),
        address: joined_strings(patient, "address.0.line", " "),
        city_state: join_present(&[
            lookup_str(patient, "address.0.city"),
            lookup_str(patient, "address.0.state"),
        ]),
        postal_code: text("address.0.postalCode"),
        deceased: lookup_str(patient, "deceasedDateTime").map(str::to_string),
        height: latest(BODY_HEIGHT_DISPLAY),
        weight: latest(BODY_WEIGHT_DISPLAY),
        race: category_extension(patient, RACE_EXTENSION_URL),
        ethnicity: category_extension(patient, ETHNICITY_EXTENSION_URL),
        language: text("communication.0.language.coding.0.display"),
        geolocation: geolocation(patient),
    }
}

/// `"{family}, {given}"` from the first name. DSTU2 allows several family names.
fn name(patient: &Value) -> String {
    let family = match lookup(patient, "name.0.family") {
        Ok(Value::String(s)) => s.clone(),
        Ok(Value::Array(_)) => joined_strings(patient, "name.0.family", " "),
        _ => String::new(),
    };
    let given = joined_strings(patient, "name.0.given", " ");
    join_present(&[Some(family.as_str()), Some(given.as_str())])
}

/// First sub-extension text of a US Core category extension (race, ethnicity).
fn category_extension(patient: &Value, url: &str) -> String {
    find_extension(patient, "extension", url)
        .and_then(|ext| {
            lookup_str(ext, "extension.0.valueString")
                .filter(|s| !s.is_empty())
                .or_else(|| lookup_str(ext, "extension.0.valueCoding.display"))
        })
        .unwrap_or("")
        .to_string()
}

fn geolocation(patient: &Value) -> Option<Geolocation> {
    let geo = find_extension(patient, "address.0.extension", GEOLOCATION_EXTENSION_URL)?;
    let coordinate = |url: &str| {
        find_extension(geo, "extension", url)
            .and_then(|e| lookup(e, "valueDecimal").ok())
            .and_then(Value::as_f64)
    };
    Some(Geolocation {
        latitude: coordinate("latitude")?,
        longitude: coordinate("longitude")?,
    })
}

fn find_extension<'a>(record: &'a Value, path: &str, url: &str) -> Option<&'a Value> {
    lookup_array(record, path)?
        .iter()
        .find(|e| lookup_str(e, "url") == Some(url))
}

fn joined_strings(record: &Value, path: &str, separator: &str) -> String {
    lookup_array(record, path)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(separator)
        })
        .unwrap_or_default()
}

fn join_present(parts: &[Option<&str>]) -> String {
    parts
        .iter()
        .flatten()
        .filter(|s| !s.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn patient() -> Value {
        json!({
            "resourceType": "Patient",
            "id": "p1",
            "name": [ { "family": "Williams", "given": ["Sarah", "Jane"] } ],
            "gender": "female",
            "birthDate": "1992-03-20",
            "address": [ {
                "line": ["1 Main St", "Apt 2"],
                "city": "Boston",
                "state": "MA",
                "postalCode": "02110",
                "extension": [ {
                    "url": "http://hl7.org/fhir/StructureDefinition/geolocation",
                    "extension": [
                        { "url": "latitude", "valueDecimal": 42.36 },
                        { "url": "longitude", "valueDecimal": -71.05 }
                    ]
                } ]
            } ],
            "extension": [
                {
                    "url": "http://hl7.org/fhir/us/core/StructureDefinition/us-core-race",
                    "extension": [ { "url": "ombCategory", "valueCoding": { "display": "White" } } ]
                },
                {
                    "url": "http://hl7.org/fhir/us/core/StructureDefinition/us-core-ethnicity",
                    "extension": [ { "url": "text", "valueString": "Not Hispanic or Latino" } ]
                }
            ],
            "communication": [ { "language": { "coding": [ { "display": "English" } ] } } ]
        })
    }

    fn measurement(display: &str, value: f64, unit: &str) -> Value {
        json!({
            "code": { "coding": [ { "display": display } ] },
            "valueQuantity": { "value": value, "unit": unit }
        })
    }

    #[test]
    fn summarises_full_record() {
        let observations = vec![
            measurement("Body Height", 160.0, "cm"),
            measurement("Body Weight", 61.0, "kg"),
            json!({ "id": "no-code" }),
            measurement("Body Height", 162.5, "cm"),
        ];
        let summary = summarize(&patient(), &observations);

        assert_eq!(summary.name, "Williams, Sarah Jane");
        assert_eq!(summary.gender, "female");
        assert_eq!(summary.birth_date, "1992-03-20");
        assert_eq!(summary.address, "1 Main St Apt 2");
        assert_eq!(summary.city_state, "Boston, MA");
        assert_eq!(summary.postal_code, "02110");
        assert_eq!(summary.height, "162.50 cm");
        assert_eq!(summary.weight, "61.00 kg");
        assert_eq!(summary.race, "White");
        assert_eq!(summary.ethnicity, "Not Hispanic or Latino");
        assert_eq!(summary.language, "English");
        assert_eq!(
            summary.geolocation,
            Some(Geolocation {
                latitude: 42.36,
                longitude: -71.05
            })
        );
        assert_eq!(summary.deceased, None);
    }

    #[test]
    fn empty_patient_degrades_to_blank_fields() {
        let summary = summarize::<Value>(&json!({ "resourceType": "Patient" }), &[]);
        assert_eq!(summary, PatientSummary::default());

        let entries = summary.entries();
        let value_of = |label: &str| {
            entries
                .iter()
                .find(|(l, _)| *l == label)
                .map(|(_, v)| v.clone())
        };
        assert_eq!(value_of("Race").as_deref(), Some("unk."));
        assert_eq!(value_of("Language").as_deref(), Some("unk."));
        assert_eq!(value_of("Blood Type").as_deref(), Some("unknown"));
        assert_eq!(value_of("Name").as_deref(), Some(""));
        assert_eq!(value_of("Date of Death"), None);
    }

    #[test]
    fn malformed_nested_parts_only_blank_themselves() {
        let record = json!({
            "name": [ { "family": ["van", "Dyke"], "given": "Dick" } ],
            "gender": 1,
            "address": "somewhere",
            "extension": [ { "url": "http://hl7.org/fhir/us/core/StructureDefinition/us-core-race" } ],
            "deceasedDateTime": "2020-04-01"
        });
        let summary = summarize::<Value>(&record, &[]);
        assert_eq!(summary.name, "van Dyke");
        assert_eq!(summary.gender, "");
        assert_eq!(summary.address, "");
        assert_eq!(summary.race, "");
        assert_eq!(summary.deceased.as_deref(), Some("2020-04-01"));

        let labels: Vec<_> = summary.entries().into_iter().map(|(l, _)| l).collect();
        assert!(labels.contains(&"Date of Death"));
        assert_eq!(labels.last(), Some(&"Cause of Death"));
    }

    #[test]
    fn geolocation_needs_both_coordinates() {
        let mut record = patient();
        record["address"][0]["extension"][0]["extension"]
            .as_array_mut()
            .expect("geolocation sub-extensions")
            .pop();
        assert_eq!(summarize::<Value>(&record, &[]).geolocation, None);
    }
}
