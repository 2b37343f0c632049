//! Core pipeline orchestration and domain logic for docbuild.
//!
//! This crate ties together generator installation, per-project builds,
//! artifact inspection, git history, and index assembly into one run.

pub mod builder;
pub mod extract;
pub mod history;
pub mod index;
pub mod install;
pub mod pipeline;
