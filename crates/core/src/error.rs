use fhir::PathError;

/// Errors surfaced to callers of the visualizer core.
///
/// Cell-level problems never appear here: they are [`ExtractionFailure`] and [`FormatError`]
/// values that the projection engine reduces to an empty or defaulted cell.
#[derive(Debug, thiserror::Error)]
pub enum VizError {
    #[error("unknown resource type: {0}")]
    UnknownResourceType(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("FHIR error: {0}")]
    Fhir(#[from] fhir::FhirError),

    #[error("failed to read record file: {0}")]
    FileRead(std::io::Error),

    #[error("unsupported record file type: {0} (expected .json, .yaml or .yml)")]
    UnsupportedFileType(String),
}

pub type VizResult<T> = std::result::Result<T, VizError>;

/// A raw value could not be turned into display text by a formatter.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("unparseable date/time: {0}")]
    InvalidTimestamp(String),

    #[error("not a number: {0}")]
    NotANumber(String),

    #[error("expected a text value, got {0}")]
    NotText(String),

    #[error("malformed coding: {0}")]
    MalformedCoding(String),

    #[error("malformed period: {0}")]
    MalformedPeriod(String),
}

/// A value could not be pulled out of a record.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ExtractionFailure {
    #[error(transparent)]
    Path(#[from] PathError),

    #[error("`{path}` is not {expected}")]
    Shape {
        path: String,
        expected: &'static str,
    },

    #[error("`{path}` does not hold base64-encoded UTF-8 text")]
    Decode { path: String },

    #[error(transparent)]
    Format(#[from] FormatError),
}
