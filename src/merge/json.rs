//! Native JSON merge backend
//!
//! Implements the repository-level shallow override directly on
//! `serde_json::Value`. The `preserve_order` feature of `serde_json` keeps
//! every untouched key where it was in the input.

use serde_json::{Map, Value as JsonValue};

use super::{present, DocumentMerger, DocumentPath};
use crate::error::{Error, Result};
use crate::permissions::PermissionBatch;

/// Navigate to an object at `path`, creating missing or `null` intermediate
/// objects along the way.
///
/// # Errors
///
/// Returns `Error::Merge` if any value on the path (including the target)
/// exists but is not an object.
pub fn navigate_json_object<'a>(
    value: &'a mut JsonValue,
    path: &DocumentPath,
) -> Result<&'a mut Map<String, JsonValue>> {
    let mut current = value;
    let mut walked = Vec::with_capacity(path.keys().len());

    for key in path.keys() {
        let map = as_object(current, &walked)?;
        walked.push(key.as_str());
        current = map
            .entry(key.clone())
            .or_insert(JsonValue::Object(Map::new()));
    }

    as_object(current, &walked)
}

fn as_object<'a>(
    value: &'a mut JsonValue,
    walked: &[&str],
) -> Result<&'a mut Map<String, JsonValue>> {
    if value.is_null() {
        *value = JsonValue::Object(Map::new());
    }
    match value {
        JsonValue::Object(map) => Ok(map),
        other => Err(Error::Merge {
            operation: "json merge".to_string(),
            message: format!(
                "Expected object at '{}', found {}",
                if walked.is_empty() {
                    "<root>".to_string()
                } else {
                    walked.join(".")
                },
                kind(other)
            ),
        }),
    }
}

fn kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}

/// Replace whole entries of `target` with those of `source`.
pub fn override_entries(target: &mut Map<String, JsonValue>, source: Map<String, JsonValue>) {
    for (key, value) in source {
        target.insert(key, value);
    }
}

/// Parse the document text; a missing or blank document is `null`.
///
/// Number literals are kept exactly as written (`arbitrary_precision`).
pub fn parse_document(existing: Option<&str>) -> Result<JsonValue> {
    match present(existing) {
        Some(text) => serde_json::from_str(text).map_err(|err| Error::Merge {
            operation: "json merge".to_string(),
            message: format!("Failed to parse document JSON: {}", err),
        }),
        None => Ok(JsonValue::Null),
    }
}

/// Merge `batch` into an already-parsed document.
pub fn merge_value(mut document: JsonValue, batch: &PermissionBatch) -> Result<JsonValue> {
    let repositories = navigate_json_object(&mut document, &DocumentPath::repositories())?;
    override_entries(repositories, batch.to_json_map());
    Ok(document)
}

/// The canonical `serde_json` backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeMerger;

impl DocumentMerger for NativeMerger {
    fn name(&self) -> &'static str {
        "native"
    }

    fn merge(&self, existing: Option<&str>, batch: &PermissionBatch) -> Result<JsonValue> {
        merge_value(parse_document(existing)?, batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::render;
    use crate::permissions::PermissionSet;
    use serde_json::json;

    fn batch(entries: &[(&str, PermissionSet)]) -> PermissionBatch {
        let mut batch = PermissionBatch::new();
        for (key, set) in entries {
            batch.insert(*key, *set);
        }
        batch
    }

    #[test]
    fn test_synthesizes_missing_document() {
        let merged = NativeMerger
            .merge(None, &batch(&[("acme/new-svc", PermissionSet::ContentsOnly)]))
            .unwrap();
        assert_eq!(
            merged,
            json!({
                "customizations": { "codespaces": { "repositories": {
                    "acme/new-svc": { "permissions": { "contents": "write" } }
                }}}
            })
        );
    }

    #[test]
    fn test_overrides_matching_keys_only() {
        let existing = r#"{
  "customizations": { "codespaces": { "repositories": {
    "acme/old": { "permissions": "write-all" },
    "acme/svc": { "permissions": { "contents": "read", "issues": "write" } }
  }}}
}"#;
        let merged = NativeMerger
            .merge(
                Some(existing),
                &batch(&[("acme/svc", PermissionSet::ContentsOnly)]),
            )
            .unwrap();
        let repos = &merged["customizations"]["codespaces"]["repositories"];
        assert_eq!(repos["acme/old"], json!({ "permissions": "write-all" }));
        // replaced wholesale, so "issues" is gone
        assert_eq!(
            repos["acme/svc"],
            json!({ "permissions": { "contents": "write" } })
        );
    }

    #[test]
    fn test_preserves_siblings_and_order() {
        let existing = r#"{
  "name": "dev",
  "customizations": {
    "vscode": { "extensions": ["rust-lang.rust-analyzer"] },
    "codespaces": { "openFiles": ["README.md"], "repositories": {} }
  },
  "features": {}
}"#;
        let merged = NativeMerger
            .merge(Some(existing), &batch(&[("acme/a", PermissionSet::WriteAll)]))
            .unwrap();

        let top: Vec<&String> = merged.as_object().unwrap().keys().collect();
        assert_eq!(top, vec!["name", "customizations", "features"]);
        let custom: Vec<&String> = merged["customizations"].as_object().unwrap().keys().collect();
        assert_eq!(custom, vec!["vscode", "codespaces"]);
        assert_eq!(
            merged["customizations"]["codespaces"]["openFiles"],
            json!(["README.md"])
        );
    }

    #[test]
    fn test_merge_is_idempotent() {
        let b = batch(&[
            ("acme/a", PermissionSet::ContentsOnly),
            ("acme/b", PermissionSet::WriteAll),
        ]);
        let once = render(&NativeMerger.merge(Some(r#"{"x": 1}"#), &b).unwrap()).unwrap();
        let twice = render(&NativeMerger.merge(Some(&once), &b).unwrap()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_numbers_are_kept_as_written() {
        let existing = r#"{"version": 1.0, "big": 100000000000000000001, "ratio": 1e3}"#;
        let merged = NativeMerger
            .merge(Some(existing), &batch(&[("acme/a", PermissionSet::WriteAll)]))
            .unwrap();
        let text = render(&merged).unwrap();
        assert!(text.contains(r#""version": 1.0,"#));
        assert!(text.contains(r#""big": 100000000000000000001,"#));
        assert!(text.contains(r#""ratio": 1e3,"#));
    }

    #[test]
    fn test_null_repositories_becomes_object() {
        let merged = NativeMerger
            .merge(
                Some(r#"{"customizations": {"codespaces": {"repositories": null}}}"#),
                &batch(&[("acme/a", PermissionSet::ContentsOnly)]),
            )
            .unwrap();
        assert!(merged["customizations"]["codespaces"]["repositories"]["acme/a"].is_object());
    }

    #[test]
    fn test_non_object_on_path_is_error() {
        let err = NativeMerger
            .merge(
                Some(r#"{"customizations": "oops"}"#),
                &batch(&[("acme/a", PermissionSet::ContentsOnly)]),
            )
            .unwrap_err();
        assert!(err.to_string().contains("Expected object at 'customizations'"));
        assert!(err.to_string().contains("a string"));
    }

    #[test]
    fn test_non_object_root_is_error() {
        let err = NativeMerger
            .merge(Some("[1, 2]"), &batch(&[("acme/a", PermissionSet::WriteAll)]))
            .unwrap_err();
        assert!(err.to_string().contains("<root>"));
    }

    #[test]
    fn test_invalid_json_is_error() {
        let err = NativeMerger
            .merge(Some("{ not json"), &batch(&[("acme/a", PermissionSet::WriteAll)]))
            .unwrap_err();
        assert!(matches!(err, Error::Merge { .. }));
    }

    #[test]
    fn test_empty_batch_still_creates_path() {
        let merged = NativeMerger.merge(Some("{}"), &PermissionBatch::new()).unwrap();
        assert_eq!(
            merged,
            json!({ "customizations": { "codespaces": { "repositories": {} } } })
        );
    }
}
