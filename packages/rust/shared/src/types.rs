//! Core domain types for docbuild runs and the `index.json` document.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Timestamp layout used in `index.json`: UTC, second precision, `Z` suffix.
const INDEX_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Render a timestamp the way `index.json` stores it.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(INDEX_TIMESTAMP_FORMAT).to_string()
}

// ---------------------------------------------------------------------------
// ProjectDescriptor
// ---------------------------------------------------------------------------

/// A directory holding a project manifest, i.e. one unit of work for the generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDescriptor {
    /// Path to the manifest file itself.
    pub manifest_path: PathBuf,
    /// Directory containing the manifest; passed to the generator as its input.
    pub source_dir: PathBuf,
    /// `source_dir` relative to the projects root.
    pub relative_dir: PathBuf,
    /// Flattened output name (`nested/proj` becomes `nested_proj`).
    pub output_name: String,
}

// ---------------------------------------------------------------------------
// DocumentEntry / IndexDocument
// ---------------------------------------------------------------------------

/// One generated document listed in `index.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentEntry {
    /// `project_name` read from the generated artifact.
    pub name: String,
    /// Artifact path relative to the repository root, always with `/` separators.
    pub path: String,
    /// Time of the last commit touching the project, if history is available.
    #[serde(rename = "last_modified_iso8601", with = "iso8601::option")]
    pub last_modified: Option<DateTime<Utc>>,
}

/// Root structure for `index.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexDocument {
    /// When this index was generated.
    #[serde(rename = "generated_iso8601", with = "iso8601")]
    pub generated_at: DateTime<Utc>,
    /// Entries sorted by project output name.
    pub docs: Vec<DocumentEntry>,
}

/// Serde adapters for second-precision UTC timestamps.
mod iso8601 {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::format_timestamp(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            ts: &Option<DateTime<Utc>>,
            s: S,
        ) -> Result<S::Ok, S::Error> {
            match ts {
                Some(ts) => super::serialize(ts, s),
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            d: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            Option::<String>::deserialize(d)?
                .map(|raw| {
                    DateTime::parse_from_rfc3339(&raw)
                        .map(|ts| ts.with_timezone(&Utc))
                        .map_err(serde::de::Error::custom)
                })
                .transpose()
        }
    }
}
