//! FHIR schema versions understood by the visualizer.
//!
//! Records arrive in one of three published revisions of the exchange format. The tables only
//! ever ask "does this column apply to this version?", so the enum carries no ordering.

use crate::FhirError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A supported FHIR schema revision.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FhirVersion {
    /// DSTU2, published as `1.0.2`.
    #[serde(rename = "1.0.2")]
    Dstu2,
    /// STU3, published as `3.0.1`.
    #[serde(rename = "3.0.1")]
    Stu3,
    /// R4, published as `4.0.0`.
    #[serde(rename = "4.0.0")]
    R4,
}

impl FhirVersion {
    /// Every supported version, oldest first.
    pub const ALL: [FhirVersion; 3] = [FhirVersion::Dstu2, FhirVersion::Stu3, FhirVersion::R4];

    /// The published version string (for example `"4.0.0"`).
    pub fn as_str(self) -> &'static str {
        match self {
            FhirVersion::Dstu2 => "1.0.2",
            FhirVersion::Stu3 => "3.0.1",
            FhirVersion::R4 => "4.0.0",
        }
    }

    /// The release name (for example `"R4"`).
    pub fn release_name(self) -> &'static str {
        match self {
            FhirVersion::Dstu2 => "DSTU2",
            FhirVersion::Stu3 => "STU3",
            FhirVersion::R4 => "R4",
        }
    }
}

impl fmt::Display for FhirVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FhirVersion {
    type Err = FhirError;

    /// Accepts either the published version string or the release name (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        FhirVersion::ALL
            .into_iter()
            .find(|v| {
                v.as_str() == trimmed || v.release_name().eq_ignore_ascii_case(trimmed)
            })
            .ok_or_else(|| FhirError::UnsupportedVersion(trimmed.to_string()))
    }
}
