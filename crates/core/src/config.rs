//! Visualizer runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into the rendering calls.
//! Nothing in this crate reads process-wide environment variables; the binary reads them and
//! hands the raw values to the `*_from_env_value` helpers below.

use crate::constants::{DEFAULT_FHIR_VERSION, EMBED_REFERENCES_ENV, FHIR_VERSION_ENV};
use crate::error::{VizError, VizResult};
use fhir::FhirVersion;

/// Visualizer configuration resolved at startup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VizConfig {
    fhir_version: FhirVersion,
    embed_references: bool,
}

impl Default for VizConfig {
    fn default() -> Self {
        Self::new(DEFAULT_FHIR_VERSION, true)
    }
}

impl VizConfig {
    pub fn new(fhir_version: FhirVersion, embed_references: bool) -> Self {
        Self {
            fhir_version,
            embed_references,
        }
    }

    /// Build a configuration from raw environment values.
    ///
    /// # Errors
    ///
    /// Returns [`VizError::Config`] if either value is present but invalid.
    pub fn from_env_values(
        fhir_version: Option<String>,
        embed_references: Option<String>,
    ) -> VizResult<Self> {
        Ok(Self::new(
            fhir_version_from_env_value(fhir_version)?,
            embed_references_from_env_value(embed_references)?,
        ))
    }

    pub fn fhir_version(&self) -> FhirVersion {
        self.fhir_version
    }

    pub fn embed_references(&self) -> bool {
        self.embed_references
    }

    /// Replace the schema version, e.g. from a command-line flag.
    pub fn with_fhir_version(mut self, fhir_version: FhirVersion) -> Self {
        self.fhir_version = fhir_version;
        self
    }

    pub fn with_embed_references(mut self, embed_references: bool) -> Self {
        self.embed_references = embed_references;
        self
    }
}

/// Parse the schema version from an optional string value.
///
/// Accepts a version string (`4.0.0`) or release name (`R4`, any case). If `value` is `None` or
/// empty/whitespace, returns [`DEFAULT_FHIR_VERSION`].
pub fn fhir_version_from_env_value(value: Option<String>) -> VizResult<FhirVersion> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    let parsed = value
        .map(|v| {
            v.parse::<FhirVersion>()
                .map_err(|e| VizError::Config(format!("{FHIR_VERSION_ENV}: {e}")))
        })
        .transpose()?;

    Ok(parsed.unwrap_or(DEFAULT_FHIR_VERSION))
}

/// Parse the reference-embedding flag from an optional string value.
///
/// Accepts `true/false`, `1/0`, `yes/no` and `on/off` in any case. Defaults to `true`.
pub fn embed_references_from_env_value(value: Option<String>) -> VizResult<bool> {
    let Some(value) = value
        .map(|v| v.trim().to_ascii_lowercase())
        .filter(|v| !v.is_empty())
    else {
        return Ok(true);
    };

    match value.as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(VizError::Config(format!(
            "{EMBED_REFERENCES_ENV} must be a boolean, got `{other}`"
        ))),
    }
}
