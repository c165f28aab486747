//! Record-set loading and reference embedding.
//!
//! This module is the data-fetch side of the visualizer: it turns JSON or YAML text into an
//! ordered collection of FHIR records, and pre-resolves the references that the report and care
//! plan tables display as nested rows.
//!
//! Accepted inputs:
//! - a `Bundle` resource (records taken from `entry[].resource`)
//! - an array of resources
//! - a single resource
//!
//! Notes:
//! - Input order is preserved; the projection engine relies on it for most-recent-first display
//! - Only the bundle envelope is checked strictly; resources themselves stay opaque

use crate::path::{lookup, lookup_array, lookup_str};
use crate::{FhirError, FhirResult, ResourceType};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

/// One record together with the bundle `fullUrl` it was delivered under (if any).
#[derive(Clone, Debug, PartialEq)]
pub struct Entry {
    pub full_url: Option<String>,
    pub resource: Value,
}

/// An ordered collection of FHIR records.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecordSet {
    entries: Vec<Entry>,
}

impl RecordSet {
    /// Build a record set from already-parsed resources.
    pub fn from_resources(resources: impl IntoIterator<Item = Value>) -> Self {
        Self {
            entries: resources
                .into_iter()
                .map(|resource| Entry {
                    full_url: None,
                    resource,
                })
                .collect(),
        }
    }

    /// Parse a record set from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError`] if the text is not JSON or does not have one of the accepted shapes.
    pub fn parse_json(text: &str) -> FhirResult<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    /// Parse a record set from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError`] if the text is not YAML or does not have one of the accepted shapes.
    pub fn parse_yaml(text: &str) -> FhirResult<Self> {
        let value: Value = serde_yaml::from_str(text)?;
        Self::from_value(value)
    }

    /// Interpret a parsed document as a record set.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError::InvalidInput`] for documents that are neither a resource nor an array
    /// of resources, and [`FhirError::Translation`] when a bundle envelope is malformed.
    pub fn from_value(value: Value) -> FhirResult<Self> {
        match value {
            Value::Array(items) => {
                let mut entries = Vec::with_capacity(items.len());
                for (index, item) in items.into_iter().enumerate() {
                    if lookup_str(&item, "resourceType").is_none() {
                        return Err(FhirError::InvalidInput(format!(
                            "array item {index} is not a FHIR resource (missing resourceType)"
                        )));
                    }
                    entries.push(Entry {
                        full_url: None,
                        resource: item,
                    });
                }
                Ok(Self { entries })
            }
            Value::Object(_) => match lookup_str(&value, "resourceType") {
                Some("Bundle") => Self::from_bundle(value),
                Some(_) => Ok(Self {
                    entries: vec![Entry {
                        full_url: None,
                        resource: value,
                    }],
                }),
                None => Err(FhirError::InvalidInput(
                    "document is not a FHIR resource (missing resourceType)".to_string(),
                )),
            },
            _ => Err(FhirError::InvalidInput(
                "expected a FHIR resource, a Bundle, or an array of resources".to_string(),
            )),
        }
    }

    fn from_bundle(value: Value) -> FhirResult<Self> {
        let wire = match serde_path_to_error::deserialize::<_, BundleWire>(value) {
            Ok(parsed) => parsed,
            Err(err) => {
                let path = err.path().to_string();
                let source = err.into_inner();
                let path = if path.is_empty() {
                    "<root>"
                } else {
                    path.as_str()
                };
                return Err(FhirError::Translation(format!(
                    "Bundle schema mismatch at {path}: {source}"
                )));
            }
        };

        let entries: Vec<Entry> = wire
            .entry
            .into_iter()
            .filter_map(|e| {
                e.resource.map(|resource| Entry {
                    full_url: e.full_url,
                    resource,
                })
            })
            .collect();

        tracing::debug!(entries = entries.len(), "parsed bundle");
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// All records in input order.
    pub fn records(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|e| &e.resource)
    }

    /// Records whose `resourceType` is `resource_type`, in input order.
    pub fn of_type(&self, resource_type: ResourceType) -> Vec<&Value> {
        self.records_tagged(resource_type.as_str())
    }

    /// Records whose `resourceType` equals `tag`, in input order.
    pub fn records_tagged(&self, tag: &str) -> Vec<&Value> {
        self.records()
            .filter(|r| lookup_str(r, "resourceType") == Some(tag))
            .collect()
    }

    /// Distinct `resourceType` tags present, in first-seen order.
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = Vec::new();
        for tag in self.records().filter_map(|r| lookup_str(r, "resourceType")) {
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }
        tags
    }

    /// Resolve report results and care plan goals into embedded arrays.
    ///
    /// Fills `DiagnosticReport.observations` from `result[].reference` and `CarePlan.goals` from
    /// `goal[].reference`. Existing embedded arrays are left untouched, unresolved references are
    /// skipped, and nothing is written when no reference resolves.
    ///
    /// Returns the number of records that received an embedded array.
    pub fn embed_references(&mut self) -> usize {
        let index = ReferenceIndex::build(&self.entries);
        let mut embedded = 0;

        for entry in &mut self.entries {
            let (source, target) = match lookup_str(&entry.resource, "resourceType") {
                Some("DiagnosticReport") => ("result", "observations"),
                Some("CarePlan") => ("goal", "goals"),
                _ => continue,
            };
            if lookup(&entry.resource, target).is_ok() {
                continue;
            }

            let resolved: Vec<Value> = lookup_array(&entry.resource, source)
                .map(|refs| {
                    refs.iter()
                        .filter_map(|r| lookup_str(r, "reference"))
                        .filter_map(|r| index.resolve(r))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default();

            if resolved.is_empty() {
                continue;
            }
            if let Some(object) = entry.resource.as_object_mut() {
                object.insert(target.to_string(), Value::Array(resolved));
                embedded += 1;
            }
        }

        tracing::debug!(embedded, "embedded referenced records");
        embedded
    }
}

/// Lookup table from reference strings to the records they point at.
struct ReferenceIndex {
    by_full_url: HashMap<String, Value>,
    by_type_and_id: HashMap<String, Value>,
    by_id: HashMap<String, Value>,
}

impl ReferenceIndex {
    fn build(entries: &[Entry]) -> Self {
        let mut index = Self {
            by_full_url: HashMap::new(),
            by_type_and_id: HashMap::new(),
            by_id: HashMap::new(),
        };

        for entry in entries {
            if let Some(url) = &entry.full_url {
                index.by_full_url.insert(url.clone(), entry.resource.clone());
            }
            let Some(id) = lookup_str(&entry.resource, "id") else {
                continue;
            };
            if let Some(tag) = lookup_str(&entry.resource, "resourceType") {
                index
                    .by_type_and_id
                    .insert(format!("{tag}/{id}"), entry.resource.clone());
            }
            index.by_id.insert(id.to_string(), entry.resource.clone());
        }

        index
    }

    fn resolve(&self, reference: &str) -> Option<&Value> {
        if let Some(found) = self.by_full_url.get(reference) {
            return Some(found);
        }
        if let Some(id) = reference.strip_prefix("urn:uuid:") {
            return self.by_id.get(id);
        }

        // Relative (`Observation/1`) or absolute (`http://host/fhir/Observation/1`) references.
        let mut segments = reference.rsplit('/');
        let id = segments.next()?;
        let tag = segments.next()?;
        self.by_type_and_id.get(&format!("{tag}/{id}"))
    }
}

// ============================================================================
// Wire types (internal)
// ============================================================================

/// Wire representation of the parts of a `Bundle` the loader reads.
#[derive(Debug, Deserialize)]
struct BundleWire {
    #[serde(default)]
    entry: Vec<BundleEntryWire>,
}

#[derive(Debug, Deserialize)]
struct BundleEntryWire {
    #[serde(rename = "fullUrl", default)]
    full_url: Option<String>,

    #[serde(default)]
    resource: Option<Value>,
}
