//! Metadata extraction from generated JSON artifacts.

use std::path::Path;

use tracing::warn;

/// Field holding the human-readable project name in the generator's JSON output.
pub const PROJECT_NAME_FIELD: &str = "project_name";

/// Read `project_name` from a generated artifact.
///
/// Returns an empty string when the file is missing or unreadable, is not a
/// JSON object, or has no string `project_name`. The caller treats empty as failure.
pub fn extract_project_name(artifact: &Path) -> String {
    extract_string_field(artifact, PROJECT_NAME_FIELD)
}

/// Read a top-level string field from a JSON file, or `""` on any failure.
pub fn extract_string_field(path: &Path, field: &str) -> String {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read artifact");
            return String::new();
        }
    };

    let value: serde_json::Value = match serde_json::from_str(&content) {
        Ok(value) => value,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "artifact is not valid JSON");
            return String::new();
        }
    };

    match value.get(field).and_then(serde_json::Value::as_str) {
        Some(s) => s.to_string(),
        None => {
            warn!(path = %path.display(), field, "artifact has no string field");
            String::new()
        }
    }
}
