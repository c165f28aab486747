//! Resource type dispatch.
//!
//! Maps a `resourceType` tag to the view that renders it: a schema-driven table for clinical
//! resources, or the patient summary for `Patient`. Unknown tags render nothing.

use crate::error::{VizError, VizResult};
use crate::patient::{summarize, PatientSummary};
use crate::projection::{Projection, RenderedRow};
use crate::registry::schema_for;
use crate::schema::ResourceSchema;
use fhir::{FhirVersion, RecordSet, ResourceType};
use serde::Serialize;
use serde_json::Value;
use std::borrow::Borrow;

/// The renderer chosen for a resource type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Renderer {
    Table(&'static ResourceSchema),
    PatientSummary,
}

/// A rendered table.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TableView {
    pub resource_type: ResourceType,
    pub title: &'static str,
    pub headers: Vec<&'static str>,
    pub rows: Vec<RenderedRow>,
}

/// The display output for one resource type.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "view", rename_all = "camelCase")]
pub enum View {
    Table(TableView),
    Patient(PatientSummary),
    Empty,
}

impl View {
    /// The resource type this view displays; `None` for an empty view.
    pub fn resource_type(&self) -> Option<ResourceType> {
        match self {
            View::Table(table) => Some(table.resource_type),
            View::Patient(_) => Some(ResourceType::Patient),
            View::Empty => None,
        }
    }
}

/// Renderer for a resource type tag, or `None` when the tag is not recognised.
pub fn dispatch(tag: &str) -> Option<Renderer> {
    let resource_type = ResourceType::from_tag(tag)?;
    Some(match schema_for(resource_type) {
        Some(schema) => Renderer::Table(schema),
        None => Renderer::PatientSummary,
    })
}

/// Like [`dispatch`], but an unrecognised tag is an error.
///
/// # Errors
///
/// Returns [`VizError::UnknownResourceType`] when no renderer exists for `tag`.
pub fn dispatch_strict(tag: &str) -> VizResult<Renderer> {
    dispatch(tag).ok_or_else(|| VizError::UnknownResourceType(tag.to_string()))
}

/// Render records of one resource type.
///
/// Records are expected oldest first. A patient view summarises the most recent patient record
/// without observations; use [`render_record_set`] to fill in height and weight.
pub fn render<R: Borrow<Value>>(tag: &str, version: FhirVersion, records: &[R]) -> View {
    match dispatch(tag) {
        Some(Renderer::Table(schema)) => table(schema, version, records),
        Some(Renderer::PatientSummary) => match records.last() {
            Some(patient) => View::Patient(summarize::<Value>(patient.borrow(), &[])),
            None => View::Empty,
        },
        None => {
            tracing::warn!(resource_type = tag, "no renderer for resource type; rendering nothing");
            View::Empty
        }
    }
}

/// Render every resource type present in a record set.
///
/// Views come in registry order (patient first). Tags with no renderer are logged and skipped.
pub fn render_record_set(records: &RecordSet, version: FhirVersion) -> Vec<View> {
    for tag in records.tags() {
        if ResourceType::from_tag(tag).is_none() {
            tracing::warn!(resource_type = tag, "no renderer for resource type; skipping");
        }
    }

    let observations = records.of_type(ResourceType::Observation);
    ResourceType::ALL
        .iter()
        .filter_map(|&resource_type| {
            let of_type = records.of_type(resource_type);
            if of_type.is_empty() {
                return None;
            }
            Some(match schema_for(resource_type) {
                Some(schema) => table(schema, version, &of_type),
                None => View::Patient(summarize(*of_type.last()?, &observations)),
            })
        })
        .collect()
}

fn table<R: Borrow<Value>>(
    schema: &'static ResourceSchema,
    version: FhirVersion,
    records: &[R],
) -> View {
    let projection = Projection::new(schema, version);
    let rows = projection.project(records);
    tracing::debug!(
        resource_type = %schema.resource_type,
        version = %version,
        rows = rows.len(),
        "rendered table"
    );
    View::Table(TableView {
        resource_type: schema.resource_type,
        title: schema.title,
        headers: projection.headers(),
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::CONDITIONS;
    use serde_json::json;

    #[test]
    fn dispatches_known_tags() {
        assert_eq!(dispatch("Condition"), Some(Renderer::Table(&CONDITIONS)));
        assert_eq!(dispatch("Patient"), Some(Renderer::PatientSummary));
        assert_eq!(dispatch("Binary"), None);
        assert!(matches!(
            dispatch_strict("Binary"),
            Err(VizError::UnknownResourceType(tag)) if tag == "Binary"
        ));
    }

    #[test]
    fn every_non_patient_type_has_a_table() {
        for resource_type in ResourceType::ALL {
            let renderer = dispatch(resource_type.as_str());
            match resource_type {
                ResourceType::Patient => assert_eq!(renderer, Some(Renderer::PatientSummary)),
                _ => assert!(matches!(renderer, Some(Renderer::Table(_)))),
            }
        }
    }

    #[test]
    fn unknown_tag_renders_empty() {
        let records = vec![json!({ "resourceType": "Binary" })];
        assert_eq!(render("Binary", FhirVersion::R4, &records), View::Empty);
    }

    #[test]
    fn renders_condition_table() {
        let records = vec![
            json!({ "id": "old", "code": { "coding": [ { "display": "Asthma" } ] } }),
            json!({ "id": "new", "code": { "coding": [ { "display": "Sinusitis" } ] } }),
        ];
        let View::Table(table) = render("Condition", FhirVersion::R4, &records) else {
            panic!("expected a table view");
        };
        assert_eq!(table.title, "Conditions");
        assert_eq!(table.headers.len(), 4);
        assert_eq!(table.rows[0].key, "new");
        assert_eq!(table.rows[0].cells[1], "Sinusitis");
    }

    #[test]
    fn patient_uses_latest_record() {
        let records = vec![
            json!({ "gender": "male" }),
            json!({ "gender": "female" }),
        ];
        let View::Patient(summary) = render("Patient", FhirVersion::R4, &records) else {
            panic!("expected a patient view");
        };
        assert_eq!(summary.gender, "female");
        assert_eq!(render::<Value>("Patient", FhirVersion::R4, &[]), View::Empty);
    }

    #[test]
    fn record_set_renders_present_types_in_registry_order() {
        let set = RecordSet::from_resources([
            json!({ "resourceType": "Observation", "id": "o1",
                    "code": { "coding": [ { "display": "Body Weight" } ] },
                    "valueQuantity": { "value": 70, "unit": "kg" } }),
            json!({ "resourceType": "Binary", "id": "b1" }),
            json!({ "resourceType": "Patient", "id": "p1", "gender": "other" }),
        ]);
        let views = render_record_set(&set, FhirVersion::R4);
        assert_eq!(views.len(), 2);
        assert_eq!(views[0].resource_type(), Some(ResourceType::Patient));

        let View::Patient(summary) = &views[0] else {
            panic!("expected the patient first");
        };
        assert_eq!(summary.weight, "70.00 kg");
        assert!(matches!(
            &views[1],
            View::Table(t) if t.resource_type == ResourceType::Observation && t.rows.len() == 1
        ));
    }

    #[test]
    fn view_serialises_with_tag() {
        let json = serde_json::to_value(View::Empty).expect("serialise view");
        assert_eq!(json["view"], "empty");
    }
}
