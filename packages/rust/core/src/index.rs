//! `index.json` aggregation and persistence.

use std::path::Path;

use chrono::Utc;
use tracing::{debug, info, instrument};

use docbuild_shared::{DocBuildError, DocumentEntry, IndexDocument, Result};

/// Accumulates document entries and emits them sorted by project output name.
#[derive(Debug, Default)]
pub struct IndexBuilder {
    entries: Vec<(String, DocumentEntry)>,
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the entry for the project whose output name is `output_name`.
    pub fn push(&mut self, output_name: impl Into<String>, entry: DocumentEntry) {
        self.entries.push((output_name.into(), entry));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Produce the index document, stamped with the current UTC time.
    pub fn finish(mut self) -> IndexDocument {
        self.entries.sort_by(|a, b| a.0.cmp(&b.0));
        IndexDocument {
            generated_at: Utc::now(),
            docs: self.entries.into_iter().map(|(_, entry)| entry).collect(),
        }
    }
}

/// Path of `artifact` as recorded in the index: relative to `repo_root`
/// when possible, always with `/` separators.
pub fn document_path(repo_root: &Path, artifact: &Path) -> String {
    let relative = artifact.strip_prefix(repo_root).unwrap_or(artifact);
    relative.to_string_lossy().replace('\\', "/")
}

/// Write the index as pretty JSON, replacing any existing file.
///
/// The content goes to a temporary sibling first and is renamed into place.
#[instrument(skip_all, fields(path = %path.display(), docs = index.docs.len()))]
pub fn write_index(path: &Path, index: &IndexDocument) -> Result<()> {
    let json = serde_json::to_string_pretty(index)
        .map_err(|e| DocBuildError::Serialize(format!("index serialization failed: {e}")))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| DocBuildError::io(parent, e))?;
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "index.json".to_string());
    let temp = path.with_file_name(format!(".{file_name}.tmp"));

    std::fs::write(&temp, json).map_err(|e| DocBuildError::io(&temp, e))?;
    std::fs::rename(&temp, path).map_err(|e| {
        std::fs::remove_file(&temp).ok();
        DocBuildError::io(path, e)
    })?;

    debug!("index renamed into place");
    info!("index written");
    Ok(())
}
