//! The table schema registry.
//!
//! One [`ResourceSchema`] per tabulated resource type. The patient is not a table (see
//! [`crate::patient`]), so [`schema_for`] returns `None` for it.

use crate::extract::Extractor;
use crate::format::Formatter;
use crate::schema::{ColumnSpec, NestedRowSpec, ResourceSchema, RowIdentity};
use fhir::FhirVersion::{Dstu2, Stu3, R4};
use fhir::ResourceType;

const BY_ID: RowIdentity = RowIdentity::Field { path: "id" };
const SPACER: ColumnSpec = ColumnSpec::spacer();

/// Style tag for diagnostic report rows, which sit above their nested results.
pub const REPORT_ROW_STYLE: &str = "report-line";

// ============================================================================
// Conditions
// ============================================================================

static CONDITION_COLUMNS: [ColumnSpec; 4] = [
    ColumnSpec::field("SNOMED", "code.coding.0.code"),
    ColumnSpec::field("Condition", "code.coding.0.display"),
    ColumnSpec::field("Date of Onset", "onsetDateTime").formatted(Formatter::Date),
    ColumnSpec::field("Date Resolved", "abatementDateTime")
        .formatted(Formatter::Date)
        .or_default("N/A"),
];

pub static CONDITIONS: ResourceSchema = ResourceSchema {
    resource_type: ResourceType::Condition,
    title: "Conditions",
    columns: &CONDITION_COLUMNS,
    nested: &[],
    identity: BY_ID,
    row_style: None,
};

// ============================================================================
// Observations
// ============================================================================

static OBSERVATION_COLUMNS: [ColumnSpec; 4] = [
    ColumnSpec::field("LOINC", "code.coding.0.code"),
    ColumnSpec::field("Observation", "code.coding.0.display"),
    ColumnSpec::new("Value", Extractor::ObservationValue),
    ColumnSpec::field("Date Recorded", "effectiveDateTime").formatted(Formatter::Date),
];

pub static OBSERVATIONS: ResourceSchema = ResourceSchema {
    resource_type: ResourceType::Observation,
    title: "Observations",
    columns: &OBSERVATION_COLUMNS,
    nested: &[],
    identity: BY_ID,
    row_style: None,
};

// ============================================================================
// Diagnostic reports
// ============================================================================

static REPORT_COLUMNS: [ColumnSpec; 4] = [
    ColumnSpec::field("LOINC", "code.coding.0.code"),
    ColumnSpec::field("Report/Observation", "code.coding.0.display"),
    ColumnSpec::new("Value", Extractor::Blank),
    ColumnSpec::field("Date", "effectiveDateTime")
        .formatted(Formatter::Date)
        .or_default("N/A"),
];

static REPORT_RESULT_COLUMNS: [ColumnSpec; 4] = [
    ColumnSpec::field("LOINC", "code.coding.0.code"),
    ColumnSpec::field("Report/Observation", "code.coding.0.display"),
    ColumnSpec::new("Value", Extractor::ObservationValue),
    SPACER,
];

static REPORT_FORM_COLUMNS: [ColumnSpec; 4] = [
    SPACER,
    ColumnSpec::new("Content", Extractor::Base64Text { path: "data" }),
    SPACER,
    SPACER,
];

static REPORT_NESTED: [NestedRowSpec; 2] = [
    NestedRowSpec {
        children: "observations",
        identity: BY_ID,
        columns: &REPORT_RESULT_COLUMNS,
    },
    NestedRowSpec {
        children: "presentedForm",
        identity: RowIdentity::SiblingIndex,
        columns: &REPORT_FORM_COLUMNS,
    },
];

pub static REPORTS: ResourceSchema = ResourceSchema {
    resource_type: ResourceType::DiagnosticReport,
    title: "Reports",
    columns: &REPORT_COLUMNS,
    nested: &REPORT_NESTED,
    identity: BY_ID,
    row_style: Some(REPORT_ROW_STYLE),
};

// ============================================================================
// Medications
// ============================================================================

static MEDICATION_COLUMNS: [ColumnSpec; 4] = [
    ColumnSpec::field("RxNorm", "medicationCodeableConcept.coding.0.code"),
    ColumnSpec::field("Medication", "medicationCodeableConcept.coding.0.display"),
    ColumnSpec::field("Date Prescribed", "authoredOn").formatted(Formatter::Date),
    ColumnSpec::field("Status", "status"),
];

pub static MEDICATIONS: ResourceSchema = ResourceSchema {
    resource_type: ResourceType::MedicationRequest,
    title: "Medications",
    columns: &MEDICATION_COLUMNS,
    nested: &[],
    identity: BY_ID,
    row_style: None,
};

// ============================================================================
// Allergies
// ============================================================================

static ALLERGY_COLUMNS: [ColumnSpec; 4] = [
    ColumnSpec::field("SNOMED", "code.coding.0.code"),
    ColumnSpec::field("Allergy", "code.coding.0.display"),
    ColumnSpec::field("Date Recorded", "recordedDate").only(&[R4]),
    ColumnSpec::field("Date Recorded", "assertedDate")
        .only(&[Dstu2, Stu3])
        .formatted(Formatter::Date),
];

pub static ALLERGIES: ResourceSchema = ResourceSchema {
    resource_type: ResourceType::AllergyIntolerance,
    title: "Allergies",
    columns: &ALLERGY_COLUMNS,
    nested: &[],
    identity: BY_ID,
    row_style: None,
};

// ============================================================================
// Care plans
// ============================================================================

static CARE_PLAN_COLUMNS: [ColumnSpec; 3] = [
    ColumnSpec::field("SNOMED", "category.0.coding.0.code"),
    ColumnSpec::field("Care Plan", "category.0.coding.0.display"),
    ColumnSpec::field("Date", "period.start").formatted(Formatter::Date),
];

// DSTU2 goals carry a plain-text description; later versions a CodeableConcept.
static CARE_PLAN_GOAL_COLUMNS: [ColumnSpec; 4] = [
    SPACER,
    ColumnSpec::new(
        "Goal",
        Extractor::LabelledOrBare {
            label: "Goal: ",
            path: "description",
        },
    )
    .only(&[Dstu2]),
    ColumnSpec::new(
        "Goal",
        Extractor::LabelledOrBare {
            label: "Goal: ",
            path: "description.text",
        },
    )
    .only(&[Stu3, R4]),
    SPACER,
];

static CARE_PLAN_ACTIVITY_COLUMNS: [ColumnSpec; 3] = [
    SPACER,
    ColumnSpec::new(
        "Activity",
        Extractor::Labelled {
            label: "Activity: ",
            path: "detail.code.coding.0.display",
        },
    ),
    SPACER,
];

static CARE_PLAN_NESTED: [NestedRowSpec; 2] = [
    NestedRowSpec {
        children: "goals",
        identity: BY_ID,
        columns: &CARE_PLAN_GOAL_COLUMNS,
    },
    NestedRowSpec {
        children: "activity",
        identity: RowIdentity::SiblingIndex,
        columns: &CARE_PLAN_ACTIVITY_COLUMNS,
    },
];

pub static CARE_PLANS: ResourceSchema = ResourceSchema {
    resource_type: ResourceType::CarePlan,
    title: "CarePlans",
    columns: &CARE_PLAN_COLUMNS,
    nested: &CARE_PLAN_NESTED,
    identity: BY_ID,
    row_style: None,
};

// ============================================================================
// Procedures, encounters, immunizations, documents
// ============================================================================

static PROCEDURE_COLUMNS: [ColumnSpec; 3] = [
    ColumnSpec::field("SNOMED", "code.coding.0.code"),
    ColumnSpec::field("Procedure", "code.coding.0.display"),
    ColumnSpec::new(
        "Date Performed",
        Extractor::AttributeTime {
            prefix: "performed",
        },
    ),
];

pub static PROCEDURES: ResourceSchema = ResourceSchema {
    resource_type: ResourceType::Procedure,
    title: "Procedures",
    columns: &PROCEDURE_COLUMNS,
    nested: &[],
    identity: BY_ID,
    row_style: None,
};

static ENCOUNTER_COLUMNS: [ColumnSpec; 4] = [
    ColumnSpec::field("SNOMED", "type.0.coding.0.code"),
    ColumnSpec::field("Encounter", "type.0.coding.0.display"),
    ColumnSpec::field("Start Time", "period.start").formatted(Formatter::DateTime),
    ColumnSpec::new("Duration", Extractor::PeriodDuration { path: "period" }),
];

pub static ENCOUNTERS: ResourceSchema = ResourceSchema {
    resource_type: ResourceType::Encounter,
    title: "Encounters",
    columns: &ENCOUNTER_COLUMNS,
    nested: &[],
    identity: BY_ID,
    row_style: None,
};

static IMMUNIZATION_COLUMNS: [ColumnSpec; 3] = [
    ColumnSpec::field("CVX", "vaccineCode.coding.0.code"),
    ColumnSpec::field("Vaccine", "vaccineCode.coding.0.display"),
    ColumnSpec::field("Date Given", "occurrenceDateTime").formatted(Formatter::Date),
];

pub static IMMUNIZATIONS: ResourceSchema = ResourceSchema {
    resource_type: ResourceType::Immunization,
    title: "Vaccinations",
    columns: &IMMUNIZATION_COLUMNS,
    nested: &[],
    identity: BY_ID,
    row_style: None,
};

static DOCUMENT_COLUMNS: [ColumnSpec; 2] = [
    ColumnSpec::field("Date", "date").formatted(Formatter::Date),
    ColumnSpec::new(
        "Content",
        Extractor::Base64Text {
            path: "content.0.attachment.data",
        },
    ),
];

pub static DOCUMENTS: ResourceSchema = ResourceSchema {
    resource_type: ResourceType::DocumentReference,
    title: "Documents",
    columns: &DOCUMENT_COLUMNS,
    nested: &[],
    identity: BY_ID,
    row_style: None,
};

/// The table schema for `resource_type`, or `None` for types not shown as a table.
pub fn schema_for(resource_type: ResourceType) -> Option<&'static ResourceSchema> {
    match resource_type {
        ResourceType::Patient => None,
        ResourceType::Condition => Some(&CONDITIONS),
        ResourceType::Observation => Some(&OBSERVATIONS),
        ResourceType::DiagnosticReport => Some(&REPORTS),
        ResourceType::MedicationRequest => Some(&MEDICATIONS),
        ResourceType::AllergyIntolerance => Some(&ALLERGIES),
        ResourceType::CarePlan => Some(&CARE_PLANS),
        ResourceType::Procedure => Some(&PROCEDURES),
        ResourceType::Encounter => Some(&ENCOUNTERS),
        ResourceType::Immunization => Some(&IMMUNIZATIONS),
        ResourceType::DocumentReference => Some(&DOCUMENTS),
    }
}

/// Every table schema, in presentation order.
pub fn schemas() -> impl Iterator<Item = &'static ResourceSchema> {
    ResourceType::ALL.into_iter().filter_map(schema_for)
}
