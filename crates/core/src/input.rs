//! Record file loading.

use crate::error::{VizError, VizResult};
use fhir::RecordSet;
use std::path::Path;

/// Load a record set from a `.json`, `.yaml` or `.yml` file.
///
/// When `embed_references` is set, report results and care plan goals are resolved into the
/// embedded arrays the nested rows read from.
///
/// # Errors
///
/// Returns [`VizError::UnsupportedFileType`] for other extensions, [`VizError::FileRead`] if the
/// file cannot be read, and [`VizError::Fhir`] if its contents are not a record set.
pub fn load_record_set(path: &Path, embed_references: bool) -> VizResult<RecordSet> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let parse = match extension.as_str() {
        "json" => RecordSet::parse_json,
        "yaml" | "yml" => RecordSet::parse_yaml,
        _ => return Err(VizError::UnsupportedFileType(path.display().to_string())),
    };

    let text = std::fs::read_to_string(path).map_err(VizError::FileRead)?;
    let mut records = parse(&text)?;
    tracing::debug!(path = %path.display(), records = records.len(), "loaded record file");

    if embed_references {
        records.embed_references();
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fhir::{lookup, ResourceType};
    use tempfile::TempDir;

    const BUNDLE: &str = r#"{
        "resourceType": "Bundle",
        "type": "collection",
        "entry": [
            { "fullUrl": "urn:uuid:obs-1",
              "resource": { "resourceType": "Observation", "id": "obs-1" } },
            { "fullUrl": "urn:uuid:rpt-1",
              "resource": { "resourceType": "DiagnosticReport", "id": "rpt-1",
                            "result": [ { "reference": "urn:uuid:obs-1" } ] } }
        ]
    }"#;

    fn write(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).expect("write fixture");
        path
    }

    #[test]
    fn loads_json_bundle_and_embeds() {
        let dir = TempDir::new().expect("temp dir");
        let path = write(&dir, "bundle.json", BUNDLE);

        let records = load_record_set(&path, true).expect("load bundle");
        assert_eq!(records.len(), 2);
        let report = records.of_type(ResourceType::DiagnosticReport)[0];
        assert_eq!(
            lookup(report, "observations.0.id").ok(),
            Some(&serde_json::json!("obs-1"))
        );

        let records = load_record_set(&path, false).expect("load bundle");
        let report = records.of_type(ResourceType::DiagnosticReport)[0];
        assert!(lookup(report, "observations").is_err());
    }

    #[test]
    fn loads_yaml_list() {
        let dir = TempDir::new().expect("temp dir");
        let path = write(
            &dir,
            "records.YML",
            "- resourceType: Condition\n  id: c1\n- resourceType: Patient\n  id: p1\n",
        );
        let records = load_record_set(&path, true).expect("load yaml");
        assert_eq!(records.tags(), vec!["Condition", "Patient"]);
    }

    #[test]
    fn rejects_unknown_extension_before_reading() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("records.xml");
        assert!(matches!(
            load_record_set(&path, true),
            Err(VizError::UnsupportedFileType(_))
        ));
    }

    #[test]
    fn missing_file_and_bad_content_are_errors() {
        let dir = TempDir::new().expect("temp dir");
        assert!(matches!(
            load_record_set(&dir.path().join("absent.json"), true),
            Err(VizError::FileRead(_))
        ));

        let path = write(&dir, "broken.json", "{ not json");
        assert!(matches!(
            load_record_set(&path, true),
            Err(VizError::Fhir(_))
        ));
    }
}
