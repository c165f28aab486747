//! Resource type tags.
//!
//! The visualizer renders a fixed set of clinical resource types. Parsing the `resourceType`
//! string into this enum is the only place a free-form tag is interpreted; everything
//! downstream matches on the enum.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A resource type the visualizer knows how to display.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceType {
    Patient,
    Condition,
    Observation,
    DiagnosticReport,
    MedicationRequest,
    AllergyIntolerance,
    CarePlan,
    Procedure,
    Encounter,
    Immunization,
    DocumentReference,
}

impl ResourceType {
    /// Every known type, in the order tables are presented.
    pub const ALL: [ResourceType; 11] = [
        ResourceType::Patient,
        ResourceType::Condition,
        ResourceType::Observation,
        ResourceType::DiagnosticReport,
        ResourceType::MedicationRequest,
        ResourceType::AllergyIntolerance,
        ResourceType::CarePlan,
        ResourceType::Procedure,
        ResourceType::Encounter,
        ResourceType::Immunization,
        ResourceType::DocumentReference,
    ];

    /// The wire tag as it appears in `resourceType`.
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceType::Patient => "Patient",
            ResourceType::Condition => "Condition",
            ResourceType::Observation => "Observation",
            ResourceType::DiagnosticReport => "DiagnosticReport",
            ResourceType::MedicationRequest => "MedicationRequest",
            ResourceType::AllergyIntolerance => "AllergyIntolerance",
            ResourceType::CarePlan => "CarePlan",
            ResourceType::Procedure => "Procedure",
            ResourceType::Encounter => "Encounter",
            ResourceType::Immunization => "Immunization",
            ResourceType::DocumentReference => "DocumentReference",
        }
    }

    /// Parse a wire tag. Returns `None` for tags outside the supported set.
    pub fn from_tag(tag: &str) -> Option<Self> {
        ResourceType::ALL.into_iter().find(|t| t.as_str() == tag)
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
