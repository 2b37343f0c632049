//! External generator adapter.
//!
//! Runs `<program> build --backend <backend> <source> <dest>/` for one project
//! and captures everything it prints.

use std::ffi::OsString;
use std::future::Future;
use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, instrument};

/// Outcome of a single generator invocation.
#[derive(Debug, Clone)]
pub struct BuildResult {
    /// Whether the generator exited with status zero.
    pub success: bool,
    /// Exit code, if the process ran and was not killed by a signal.
    pub exit_code: Option<i32>,
    /// Captured stdout.
    pub stdout: String,
    /// Captured stderr, or the spawn error if the process never started.
    pub stderr: String,
}

impl BuildResult {
    /// A result for a generator that could not be started at all.
    pub fn spawn_failed(program: &str, error: &std::io::Error) -> Self {
        Self {
            success: false,
            exit_code: None,
            stdout: String::new(),
            stderr: format!("failed to spawn `{program}`: {error}"),
        }
    }

    /// Whether this build passed.
    pub fn passed(&self) -> bool {
        self.success
    }

    /// Captured stderr followed by stdout, for echoing on failure.
    pub fn diagnostics(&self) -> String {
        let mut out = String::with_capacity(self.stderr.len() + self.stdout.len());
        out.push_str(&self.stderr);
        out.push_str(&self.stdout);
        out
    }
}

/// Something that turns a project directory into generated output.
pub trait Generator: Send + Sync {
    /// Build `source` into `dest` using `backend`.
    ///
    /// Failures are reported through [`BuildResult`], never as a panic or error.
    fn build(
        &self,
        source: &Path,
        dest: &Path,
        backend: &str,
    ) -> impl Future<Output = BuildResult> + Send;
}

/// Generator backed by an external executable (`pyxis` by default).
#[derive(Debug, Clone)]
pub struct ExternalGenerator {
    program: String,
}

impl ExternalGenerator {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

/// Command-line arguments for one build. The destination keeps a trailing `/`.
pub fn build_args(source: &Path, dest: &Path, backend: &str) -> Vec<OsString> {
    let mut dest_arg = dest.as_os_str().to_os_string();
    dest_arg.push("/");

    vec![
        "build".into(),
        "--backend".into(),
        backend.into(),
        source.as_os_str().to_os_string(),
        dest_arg,
    ]
}

impl Generator for ExternalGenerator {
    #[instrument(skip_all, fields(program = %self.program, source = %source.display()))]
    async fn build(&self, source: &Path, dest: &Path, backend: &str) -> BuildResult {
        let args = build_args(source, dest, backend);
        debug!(?args, "invoking generator");

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .await;

        match output {
            Ok(output) => {
                let result = BuildResult {
                    success: output.status.success(),
                    exit_code: output.status.code(),
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                };
                debug!(
                    success = result.success,
                    exit_code = ?result.exit_code,
                    "generator finished"
                );
                result
            }
            Err(e) => BuildResult::spawn_failed(&self.program, &e),
        }
    }
}
