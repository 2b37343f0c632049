//! Generator installation via `cargo install`.

use std::ffi::OsString;
use std::path::PathBuf;

use tokio::process::Command;
use tracing::{info, instrument};
use url::Url;

use docbuild_shared::{DocBuildError, Result};

/// Which git reference to install from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitRef {
    Branch(String),
    Tag(String),
    Rev(String),
}

/// Where `cargo install` should take the generator from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallSource {
    /// A git repository, at its default branch unless a reference is given.
    Git { url: Url, reference: Option<GitRef> },
    /// A local checkout.
    Path(PathBuf),
}

impl InstallSource {
    /// Arguments passed to `cargo`.
    pub fn cargo_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["install".into()];
        match self {
            Self::Path(path) => {
                args.push("--path".into());
                args.push(path.as_os_str().to_os_string());
            }
            Self::Git { url, reference } => {
                args.push("--git".into());
                args.push(url.as_str().into());
                match reference {
                    Some(GitRef::Branch(b)) => {
                        args.extend([OsString::from("--branch"), OsString::from(b)])
                    }
                    Some(GitRef::Tag(t)) => {
                        args.extend([OsString::from("--tag"), OsString::from(t)])
                    }
                    Some(GitRef::Rev(r)) => {
                        args.extend([OsString::from("--rev"), OsString::from(r)])
                    }
                    None => {}
                }
            }
        }
        args
    }
}

impl std::fmt::Display for InstallSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Path(path) => write!(f, "path {}", path.display()),
            Self::Git { url, reference } => {
                write!(f, "{url}")?;
                match reference {
                    Some(GitRef::Branch(b)) => write!(f, " (branch {b})"),
                    Some(GitRef::Tag(t)) => write!(f, " (tag {t})"),
                    Some(GitRef::Rev(r)) => write!(f, " (rev {r})"),
                    None => Ok(()),
                }
            }
        }
    }
}

/// Install the generator with `cargo install`, streaming cargo's output.
pub async fn install_generator(source: &InstallSource) -> Result<()> {
    run_install("cargo", source).await
}

#[instrument(skip_all, fields(source = %source))]
async fn run_install(cargo: &str, source: &InstallSource) -> Result<()> {
    info!("installing generator");

    let status = Command::new(cargo)
        .args(source.cargo_args())
        .status()
        .await
        .map_err(|e| DocBuildError::Install(format!("failed to run `{cargo}`: {e}")))?;

    if !status.success() {
        return Err(DocBuildError::Install(format!(
            "`{cargo} install` exited with status {}",
            status.code().unwrap_or(-1)
        )));
    }

    info!("generator installed");
    Ok(())
}
