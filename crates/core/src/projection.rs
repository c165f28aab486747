//! The projection engine.
//!
//! Turns a list of records into display rows according to a [`ResourceSchema`]:
//! - records are shown most recent first (input order reversed)
//! - only the columns applicable to the requested schema version appear, in declared order
//! - every cell is best-effort: a missing field, a shape mismatch or a formatter failure empties
//!   (or defaults) that one cell and never affects the rest of the row or table
//! - nested row specs add child rows beneath their parent, in the children's own order
//!
//! Row keys are deterministic. Records without a usable identity are keyed by position.

use crate::schema::{applicable, ColumnSpec, NestedRowSpec, ResourceSchema, RowIdentity};
use fhir::{lookup, FhirVersion};
use serde::Serialize;
use serde_json::Value;
use std::borrow::Borrow;

/// One displayed row and the nested rows beneath it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RenderedRow {
    pub key: String,
    /// Style tag for the renderer; empty when the row has none.
    pub style: String,
    pub cells: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RenderedRow>,
}

/// Per-record style hook. Returning `None` falls back to the schema's static style.
pub type RowStyleFn<'a> = &'a (dyn Fn(&Value) -> Option<String> + 'a);

/// A configured projection of one schema at one version.
#[derive(Clone, Copy)]
pub struct Projection<'a> {
    schema: &'a ResourceSchema,
    version: FhirVersion,
    row_style: Option<RowStyleFn<'a>>,
}

impl<'a> Projection<'a> {
    pub fn new(schema: &'a ResourceSchema, version: FhirVersion) -> Self {
        Self {
            schema,
            version,
            row_style: None,
        }
    }

    /// Compute each parent row's style tag from the record itself.
    pub fn with_row_style(mut self, row_style: RowStyleFn<'a>) -> Self {
        self.row_style = Some(row_style);
        self
    }

    /// Header titles for this projection.
    pub fn headers(&self) -> Vec<&'static str> {
        self.schema.headers(self.version)
    }

    /// Project `records` into rows, most recent (last) record first.
    pub fn project<R: Borrow<Value>>(&self, records: &[R]) -> Vec<RenderedRow> {
        records
            .iter()
            .enumerate()
            .rev()
            .map(|(index, record)| self.parent_row(index, record.borrow()))
            .collect()
    }

    fn parent_row(&self, index: usize, record: &Value) -> RenderedRow {
        let key = identity_key(self.schema.identity, record)
            .unwrap_or_else(|| format!("row-{index}"));

        let style = self
            .row_style
            .and_then(|style_of| style_of(record))
            .or_else(|| self.schema.row_style.map(str::to_string))
            .unwrap_or_default();

        let children = self
            .schema
            .nested
            .iter()
            .enumerate()
            .flat_map(|(spec_index, spec)| self.child_rows(&key, spec_index, spec, record))
            .collect();

        RenderedRow {
            cells: cells(self.schema.columns, self.version, record),
            key,
            style,
            children,
        }
    }

    fn child_rows(
        &self,
        parent_key: &str,
        spec_index: usize,
        spec: &NestedRowSpec,
        record: &Value,
    ) -> Vec<RenderedRow> {
        let Ok(Value::Array(children)) = lookup(record, spec.children) else {
            return Vec::new();
        };

        children
            .iter()
            .enumerate()
            .map(|(child_index, child)| RenderedRow {
                key: identity_key(spec.identity, child)
                    .unwrap_or_else(|| format!("{parent_key}/{spec_index}/{child_index}")),
                style: String::new(),
                cells: cells(spec.columns, self.version, child),
                children: Vec::new(),
            })
            .collect()
    }
}

/// Project `records` with `schema` at `version`.
pub fn project<R: Borrow<Value>>(
    schema: &ResourceSchema,
    version: FhirVersion,
    records: &[R],
) -> Vec<RenderedRow> {
    Projection::new(schema, version).project(records)
}

fn cells(columns: &'static [ColumnSpec], version: FhirVersion, record: &Value) -> Vec<String> {
    applicable(columns, version)
        .map(|column| cell_value(column, record))
        .collect()
}

/// Reduce one column of one record to display text.
///
/// Extraction and formatting failures become "absent"; an absent or empty result takes the
/// column default, and otherwise renders as empty text.
pub fn cell_value(column: &ColumnSpec, record: &Value) -> String {
    let raw = column
        .extractor
        .extract(record)
        .ok()
        .filter(is_present);

    let shown = raw
        .and_then(|raw| match column.format {
            Some(formatter) => formatter.apply(&raw).ok(),
            None => display_text(&raw),
        })
        .filter(|text| !text.is_empty());

    shown
        .or_else(|| column.default_value.map(str::to_string))
        .unwrap_or_default()
}

/// Whether an extracted value counts as present (null, `""` and `false` do not).
fn is_present(raw: &Value) -> bool {
    !matches!(raw, Value::Null | Value::Bool(false)) && raw.as_str() != Some("")
}

/// Scalars render as text; arrays and objects have no cell representation.
fn display_text(raw: &Value) -> Option<String> {
    match raw {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn identity_key(identity: RowIdentity, record: &Value) -> Option<String> {
    match identity {
        RowIdentity::Field { path } => match lookup(record, path).ok()? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        },
        RowIdentity::SiblingIndex => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::Extractor;
    use crate::format::Formatter;
    use crate::registry::{ALLERGIES, CARE_PLANS, CONDITIONS, OBSERVATIONS, REPORTS};
    use fhir::ResourceType;
    use serde_json::json;

    fn condition(id: &str, onset: &str) -> Value {
        json!({
            "resourceType": "Condition",
            "id": id,
            "code": { "coding": [ { "code": "44054006", "display": "Diabetes" } ] },
            "onsetDateTime": onset
        })
    }

    fn observation(id: &str, display: &str, value: f64, unit: &str) -> Value {
        json!({
            "resourceType": "Observation",
            "id": id,
            "code": { "coding": [ { "code": "8302-2", "display": display } ] },
            "valueQuantity": { "value": value, "unit": unit },
            "effectiveDateTime": "2019-02-03T10:00:00Z"
        })
    }

    #[test]
    fn most_recent_record_comes_first() {
        let records = vec![
            condition("a", "2001-01-01"),
            condition("b", "2002-02-02"),
            condition("c", "2003-03-03"),
        ];
        let rows = project(&CONDITIONS, FhirVersion::R4, &records);
        let keys: Vec<_> = rows.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["c", "b", "a"]);
        assert_eq!(
            rows[0].cells,
            vec!["44054006", "Diabetes", "2003-03-03", "N/A"]
        );
    }

    #[test]
    fn missing_fields_degrade_single_cells() {
        let sparse = json!({ "resourceType": "Condition", "id": "x" });
        let rows = project(&CONDITIONS, FhirVersion::Stu3, &[sparse]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].cells, vec!["", "", "", "N/A"]);

        let wrong_shape = json!({
            "id": "y",
            "code": { "coding": "not-a-list" },
            "onsetDateTime": "not a date",
            "abatementDateTime": "2010-05-06"
        });
        let rows = project(&CONDITIONS, FhirVersion::Stu3, &[wrong_shape]);
        assert_eq!(rows[0].cells, vec!["", "", "", "2010-05-06"]);
    }

    #[test]
    fn row_width_matches_version_headers() {
        let records = vec![json!({
            "id": "al",
            "code": { "coding": [ { "code": "300916003", "display": "Latex allergy" } ] },
            "recordedDate": "2014-05-06T08:00:00Z",
            "assertedDate": "2014-05-06T08:00:00Z"
        })];
        for version in FhirVersion::ALL {
            let projection = Projection::new(&ALLERGIES, version);
            let rows = projection.project(&records);
            assert_eq!(rows[0].cells.len(), projection.headers().len());
        }
        let r4 = project(&ALLERGIES, FhirVersion::R4, &records);
        assert_eq!(r4[0].cells[2], "2014-05-06T08:00:00Z");
        let dstu2 = project(&ALLERGIES, FhirVersion::Dstu2, &records);
        assert_eq!(dstu2[0].cells[2], "2014-05-06");
    }

    #[test]
    fn nested_rows_keep_child_order() {
        let report = json!({
            "resourceType": "DiagnosticReport",
            "id": "rpt",
            "code": { "coding": [ { "code": "57698-3", "display": "Lipid Panel" } ] },
            "effectiveDateTime": "2019-02-03",
            "observations": [
                observation("x", "Cholesterol", 190.0, "mg/dL"),
                observation("y", "Triglycerides", 120.456, "mg/dL")
            ],
            "presentedForm": [ { "data": "Tm9ybWFs" }, { "data": "!!" } ]
        });

        let rows = project(&REPORTS, FhirVersion::R4, &[report]);
        let row = &rows[0];
        assert_eq!(row.style, "report-line");
        assert_eq!(row.cells, vec!["57698-3", "Lipid Panel", "", "2019-02-03"]);

        let keys: Vec<_> = row.children.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["x", "y", "rpt/1/0", "rpt/1/1"]);
        assert_eq!(
            row.children[1].cells,
            vec!["8302-2", "Triglycerides", "120.46 mg/dL", ""]
        );
        assert_eq!(row.children[2].cells, vec!["", "Normal", "", ""]);
        assert_eq!(row.children[3].cells, vec!["", "", "", ""]);
        assert!(row.children.iter().all(|c| c.style.is_empty()));
    }

    #[test]
    fn unusable_child_collections_are_skipped() {
        let records = vec![
            json!({ "id": "p1", "goals": null, "activity": {} }),
            json!({ "id": "p2", "goals": [], "activity": false }),
            json!({ "id": "p3", "activity": [ { "detail": {} } ] }),
        ];
        let rows = project(&CARE_PLANS, FhirVersion::R4, &records);
        assert!(rows[1].children.is_empty());
        assert!(rows[2].children.is_empty());
        assert_eq!(rows[0].children.len(), 1);
        assert_eq!(rows[0].children[0].key, "p3/1/0");
        assert_eq!(rows[0].children[0].cells, vec!["", "", ""]);
    }

    #[test]
    fn goal_columns_follow_version() {
        let plan = json!({
            "id": "cp",
            "category": [ { "coding": [ { "code": "698360004", "display": "Diabetes self management plan" } ] } ],
            "period": { "start": "2016-04-01" },
            "goals": [
                { "id": "g1", "description": "Lose weight" },
                { "id": "g2", "description": { "text": "Exercise daily" } }
            ],
            "activity": [ { "detail": { "code": { "coding": [ { "display": "Diabetic diet" } ] } } } ]
        });

        let dstu2 = project(&CARE_PLANS, FhirVersion::Dstu2, &[plan.clone()]);
        assert_eq!(dstu2[0].children[0].cells, vec!["", "Goal: Lose weight", ""]);
        assert_eq!(dstu2[0].children[1].cells, vec!["", "Goal: ", ""]);

        let r4 = project(&CARE_PLANS, FhirVersion::R4, &[plan]);
        assert_eq!(r4[0].cells, vec!["698360004", "Diabetes self management plan", "2016-04-01"]);
        assert_eq!(r4[0].children[1].cells, vec!["", "Goal: Exercise daily", ""]);
        assert_eq!(
            r4[0].children[2].cells,
            vec!["", "Activity: Diabetic diet", ""]
        );
    }

    #[test]
    fn records_without_identity_are_keyed_by_position() {
        let records = vec![json!({}), json!({ "id": "" }), json!({ "id": 7 })];
        let rows = project(&OBSERVATIONS, FhirVersion::R4, &records);
        let keys: Vec<_> = rows.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["7", "row-1", "row-0"]);
    }

    #[test]
    fn dynamic_style_overrides_static_style() {
        let abnormal = |record: &Value| {
            (lookup(record, "interpretation").is_ok()).then(|| "abnormal".to_string())
        };
        let records = vec![json!({ "id": "a" }), json!({ "id": "b", "interpretation": "H" })];
        let rows = Projection::new(&REPORTS, FhirVersion::R4)
            .with_row_style(&abnormal)
            .project(&records);
        assert_eq!(rows[0].style, "abnormal");
        assert_eq!(rows[1].style, "report-line");

        let plain = Projection::new(&OBSERVATIONS, FhirVersion::R4).project(&records);
        assert!(plain.iter().all(|r| r.style.is_empty()));
    }

    #[test]
    fn cell_value_defaults_only_absent_values() {
        let column = ColumnSpec::field("Count", "count")
            .formatted(Formatter::NumberWithCommas)
            .or_default("none");
        assert_eq!(cell_value(&column, &json!({ "count": 12500 })), "12,500");
        assert_eq!(cell_value(&column, &json!({ "count": "" })), "none");
        assert_eq!(cell_value(&column, &json!({ "count": "lots" })), "none");
        assert_eq!(cell_value(&column, &json!({})), "none");

        let raw = ColumnSpec::new("Flag", Extractor::Field { path: "flag" });
        assert_eq!(cell_value(&raw, &json!({ "flag": true })), "true");
        assert_eq!(cell_value(&raw, &json!({ "flag": false })), "");
        assert_eq!(cell_value(&raw, &json!({ "flag": { "nested": 1 } })), "");
    }

    #[test]
    fn borrowed_records_project_the_same() {
        let owned = vec![condition("a", "2001-01-01")];
        let borrowed: Vec<&Value> = owned.iter().collect();
        assert_eq!(
            project(&CONDITIONS, FhirVersion::R4, &owned),
            project(&CONDITIONS, FhirVersion::R4, &borrowed)
        );
        assert_eq!(CONDITIONS.resource_type, ResourceType::Condition);
    }
}
