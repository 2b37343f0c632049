//! Error types for docbuild.
//!
//! Library crates use [`DocBuildError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all docbuild operations.
#[derive(Debug, thiserror::Error)]
pub enum DocBuildError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// `cargo install` of the generator failed.
    #[error("install error: {0}")]
    Install(String),

    /// No manifest files were found under the projects directory.
    #[error("no {manifest} files found under {}", dir.display())]
    NoManifests { dir: PathBuf, manifest: String },

    /// The external generator failed for a project.
    #[error("failed to build {}", source_dir.display())]
    BuildFailed { source_dir: PathBuf },

    /// The generator reported success but left no artifact behind.
    #[error("{} not found after build", path.display())]
    MissingArtifact { path: PathBuf },

    /// The artifact had no usable `project_name` field.
    #[error("could not extract project_name from {}", path.display())]
    MissingProjectName { path: PathBuf },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// JSON serialization error.
    #[error("serialization error: {0}")]
    Serialize(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DocBuildError>;

impl DocBuildError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
