//! Dotted-path navigation over parsed FHIR records.
//!
//! Paths are written `code.coding.0.display`: object keys separated by dots, with purely
//! numeric segments indexing into arrays. A key holding JSON `null` counts as missing, which
//! matches how optional FHIR elements are usually serialised by producers that emit nulls.

use serde_json::Value;

/// Why a path could not be resolved against a record.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("`{path}`: no value at `{segment}`")]
    Missing { path: String, segment: String },

    #[error("`{path}`: expected an object before `{segment}`")]
    NotAnObject { path: String, segment: String },

    #[error("`{path}`: expected an array before index {index}")]
    NotAnArray { path: String, index: usize },

    #[error("`{path}`: index {index} is out of bounds (length {len})")]
    IndexOutOfBounds {
        path: String,
        index: usize,
        len: usize,
    },
}

/// Resolve `path` against `record`.
///
/// An empty path returns the record itself.
///
/// # Errors
///
/// Returns a [`PathError`] naming the first segment that could not be followed.
pub fn lookup<'a>(record: &'a Value, path: &str) -> Result<&'a Value, PathError> {
    let mut current = record;
    if path.is_empty() {
        return Ok(current);
    }

    for segment in path.split('.') {
        current = match segment.parse::<usize>() {
            Ok(index) => {
                let items = current.as_array().ok_or_else(|| PathError::NotAnArray {
                    path: path.to_string(),
                    index,
                })?;
                items.get(index).ok_or_else(|| PathError::IndexOutOfBounds {
                    path: path.to_string(),
                    index,
                    len: items.len(),
                })?
            }
            Err(_) => {
                let object = current.as_object().ok_or_else(|| PathError::NotAnObject {
                    path: path.to_string(),
                    segment: segment.to_string(),
                })?;
                match object.get(segment) {
                    Some(Value::Null) | None => {
                        return Err(PathError::Missing {
                            path: path.to_string(),
                            segment: segment.to_string(),
                        })
                    }
                    Some(value) => value,
                }
            }
        };
    }

    Ok(current)
}

/// Resolve `path` and return the value only when it is a string.
pub fn lookup_str<'a>(record: &'a Value, path: &str) -> Option<&'a str> {
    lookup(record, path).ok().and_then(Value::as_str)
}

/// Resolve `path` and return the value only when it is an array.
pub fn lookup_array<'a>(record: &'a Value, path: &str) -> Option<&'a Vec<Value>> {
    lookup(record, path).ok().and_then(Value::as_array)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn condition() -> Value {
        json!({
            "resourceType": "Condition",
            "id": "c1",
            "code": { "coding": [ { "code": "44054006", "display": "Diabetes" } ] },
            "abatementDateTime": null
        })
    }

    #[test]
    fn follows_keys_and_indices() {
        let record = condition();
        assert_eq!(
            lookup(&record, "code.coding.0.display").unwrap(),
            &json!("Diabetes")
        );
        assert_eq!(lookup_str(&record, "id"), Some("c1"));
        assert_eq!(lookup(&record, "").unwrap(), &record);
    }

    #[test]
    fn null_counts_as_missing() {
        let err = lookup(&condition(), "abatementDateTime").unwrap_err();
        assert!(matches!(err, PathError::Missing { ref segment, .. } if segment == "abatementDateTime"));
    }

    #[test]
    fn reports_the_failing_segment() {
        let record = condition();
        assert!(matches!(
            lookup(&record, "code.coding.1.code"),
            Err(PathError::IndexOutOfBounds { index: 1, len: 1, .. })
        ));
        assert!(matches!(
            lookup(&record, "code.0"),
            Err(PathError::NotAnArray { index: 0, .. })
        ));
        assert!(matches!(
            lookup(&record, "id.value"),
            Err(PathError::NotAnObject { .. })
        ));
        assert!(matches!(
            lookup(&record, "onsetDateTime"),
            Err(PathError::Missing { .. })
        ));
    }

    #[test]
    fn typed_helpers_reject_other_shapes() {
        let record = condition();
        assert_eq!(lookup_str(&record, "code"), None);
        assert_eq!(lookup_array(&record, "code.coding").map(Vec::len), Some(1));
        assert!(lookup_array(&record, "id").is_none());
    }
}
