//! Shared types, error model, and configuration for docbuild.
//!
//! This crate is the foundation depended on by all other docbuild crates.
//! It provides:
//! - [`DocBuildError`] — the unified error type
//! - Domain types ([`ProjectDescriptor`], [`DocumentEntry`], [`IndexDocument`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CONFIG_FILE_NAME, DEFAULT_BACKEND, GeneratorConfig, LayoutConfig, init_config,
    load_config, load_config_from, validate_git_url,
};
pub use error::{DocBuildError, Result};
pub use types::{DocumentEntry, IndexDocument, ProjectDescriptor, format_timestamp};
