//! Application configuration for docbuild.
//!
//! Config lives at `<repo>/docbuild.toml` and is optional.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{DocBuildError, Result};

/// Default configuration file name, looked up in the repository root.
pub const CONFIG_FILE_NAME: &str = "docbuild.toml";

/// Backend that produces JSON artifacts and an index.
pub const DEFAULT_BACKEND: &str = "json";

// ---------------------------------------------------------------------------
// Config structs (matching docbuild.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// External generator settings.
    #[serde(default)]
    pub generator: GeneratorConfig,

    /// Repository layout.
    #[serde(default)]
    pub layout: LayoutConfig,
}

/// `[generator]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Generator executable name or path.
    #[serde(default = "default_program")]
    pub program: String,

    /// Default backend passed as `--backend`.
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Artifact file the generator writes into each output directory.
    #[serde(default = "default_artifact")]
    pub artifact: String,

    /// Git repository used by `cargo install --git`.
    #[serde(default = "default_git_url")]
    pub git_url: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            backend: default_backend(),
            artifact: default_artifact(),
            git_url: default_git_url(),
        }
    }
}

fn default_program() -> String {
    "pyxis".into()
}
fn default_backend() -> String {
    DEFAULT_BACKEND.into()
}
fn default_artifact() -> String {
    "output.json".into()
}
fn default_git_url() -> String {
    "https://github.com/ferrobrew/pyxis.git".into()
}

/// `[layout]` section. Directories are relative to the repository root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Directory searched recursively for manifests.
    #[serde(default = "default_projects_dir")]
    pub projects_dir: String,

    /// Manifest file name marking a buildable project.
    #[serde(default = "default_manifest")]
    pub manifest: String,

    /// Output directory for the JSON backend.
    #[serde(default = "default_docs_dir")]
    pub docs_dir: String,

    /// Index file name written inside the output directory.
    #[serde(default = "default_index_file")]
    pub index_file: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            projects_dir: default_projects_dir(),
            manifest: default_manifest(),
            docs_dir: default_docs_dir(),
            index_file: default_index_file(),
        }
    }
}

fn default_projects_dir() -> String {
    "projects".into()
}
fn default_manifest() -> String {
    "pyxis.toml".into()
}
fn default_docs_dir() -> String {
    "docs".into()
}
fn default_index_file() -> String {
    "index.json".into()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load `docbuild.toml` from the repository root. Returns defaults if the file does not exist.
pub fn load_config(repo_root: &Path) -> Result<AppConfig> {
    let path = repo_root.join(CONFIG_FILE_NAME);

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| DocBuildError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        DocBuildError::config(format!("failed to parse {}: {e}", path.display()))
    })?;

    validate_git_url(&config)?;
    Ok(config)
}

/// Write a default config file into the repository root.
/// Returns the path to the created file.
pub fn init_config(repo_root: &Path) -> Result<PathBuf> {
    let path = repo_root.join(CONFIG_FILE_NAME);
    if path.exists() {
        return Err(DocBuildError::config(format!(
            "{} already exists",
            path.display()
        )));
    }

    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| DocBuildError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| DocBuildError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Check that the generator git URL parses.
pub fn validate_git_url(config: &AppConfig) -> Result<Url> {
    Url::parse(&config.generator.git_url).map_err(|e| {
        DocBuildError::config(format!(
            "invalid generator.git_url '{}': {e}",
            config.generator.git_url
        ))
    })
}
