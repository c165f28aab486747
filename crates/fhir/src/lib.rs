//! FHIR wire/boundary support for the record visualizer.
//!
//! This crate provides the **boundary types** the visualizer needs to read clinical records:
//! - schema version and resource type tags
//! - dotted-path navigation over opaque JSON records
//! - record-set loading from JSON or YAML (bundles, arrays, single resources)
//! - reference embedding for nested report and care plan rows
//!
//! Records stay opaque `serde_json::Value`s. Three incompatible schema versions are rendered
//! by the same tables, so typing the resources here would only move the version problem.

pub mod path;
pub mod record_set;
pub mod resource_type;
pub mod version;

// Re-export facades
pub use path::{lookup, lookup_array, lookup_str, PathError};
pub use record_set::{Entry, RecordSet};
pub use resource_type::ResourceType;
pub use version::FhirVersion;

/// Errors returned by the `fhir` boundary crate.
#[derive(Debug, thiserror::Error)]
pub enum FhirError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("invalid YAML: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),

    #[error("translation error: {0}")]
    Translation(String),

    #[error("unsupported FHIR version: {0}")]
    UnsupportedVersion(String),
}

/// Type alias for Results that can fail with a [`FhirError`].
pub type FhirResult<T> = Result<T, FhirError>;
