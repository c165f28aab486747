//! Constants used throughout the visualizer core crate.

use fhir::FhirVersion;

/// Schema version assumed when none is configured.
pub const DEFAULT_FHIR_VERSION: FhirVersion = FhirVersion::R4;

/// Environment variable naming the schema version of the records.
pub const FHIR_VERSION_ENV: &str = "FHIR_VERSION";

/// Environment variable toggling reference embedding when loading record files.
pub const EMBED_REFERENCES_ENV: &str = "VIZ_EMBED_REFERENCES";

/// US Core race extension.
pub const RACE_EXTENSION_URL: &str = "http://hl7.org/fhir/us/core/StructureDefinition/us-core-race";

/// US Core ethnicity extension.
pub const ETHNICITY_EXTENSION_URL: &str =
    "http://hl7.org/fhir/us/core/StructureDefinition/us-core-ethnicity";

/// Address geolocation extension.
pub const GEOLOCATION_EXTENSION_URL: &str = "http://hl7.org/fhir/StructureDefinition/geolocation";

/// Observation display naming a body height measurement.
pub const BODY_HEIGHT_DISPLAY: &str = "Body Height";

/// Observation display naming a body weight measurement.
pub const BODY_WEIGHT_DISPLAY: &str = "Body Weight";

/// Shown in the patient summary for a missing race, ethnicity or language.
pub const UNKNOWN_SHORT: &str = "unk.";

/// Shown in the patient summary for the blood type, which no record carries.
pub const UNKNOWN_BLOOD_TYPE: &str = "unknown";
