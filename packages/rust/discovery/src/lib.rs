//! Manifest discovery.
//!
//! Walks the projects directory looking for manifest files (`pyxis.toml` by
//! default). Every directory holding one is a project the generator can build.

use std::path::{Component, Path, PathBuf};

use docbuild_shared::ProjectDescriptor;
use tracing::{debug, info, instrument};
use walkdir::WalkDir;

/// Joins path components in a flattened output name.
pub const OUTPUT_NAME_SEPARATOR: &str = "_";

/// Recursively find every file named `manifest_name` under `root`.
///
/// Unreadable entries (and a missing `root`) are skipped, so the result is
/// simply empty when nothing is found. Order follows the filesystem.
#[instrument(skip_all, fields(root = %root.display(), manifest = manifest_name))]
pub fn find_manifests(root: &Path, manifest_name: &str) -> Vec<PathBuf> {
    let manifests: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!(error = %e, "skipping unreadable entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && entry.file_name() == manifest_name)
        .map(|entry| entry.into_path())
        .collect();

    info!(count = manifests.len(), "manifest search complete");
    manifests
}

/// Turn manifest paths into project descriptors, sorted by output name.
pub fn describe_projects(projects_root: &Path, manifests: &[PathBuf]) -> Vec<ProjectDescriptor> {
    let mut projects: Vec<ProjectDescriptor> = manifests
        .iter()
        .map(|manifest| describe_project(projects_root, manifest))
        .collect();

    projects.sort_by(|a, b| a.output_name.cmp(&b.output_name));
    projects
}

/// Build the descriptor for a single manifest.
pub fn describe_project(projects_root: &Path, manifest: &Path) -> ProjectDescriptor {
    let source_dir = manifest
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    let relative_dir = source_dir
        .strip_prefix(projects_root)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| source_dir.clone());

    let output_name = match output_name(&relative_dir) {
        Some(name) => name,
        // Manifest sits directly in the projects root.
        None => projects_root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "root".to_string()),
    };

    ProjectDescriptor {
        manifest_path: manifest.to_path_buf(),
        source_dir,
        relative_dir,
        output_name,
    }
}

/// Flatten a relative directory into a single name: `a/b/c` becomes `a_b_c`.
///
/// Returns `None` for an empty path.
pub fn output_name(relative_dir: &Path) -> Option<String> {
    let parts: Vec<String> = relative_dir
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    if parts.is_empty() {
        return None;
    }
    Some(parts.join(OUTPUT_NAME_SEPARATOR))
}
