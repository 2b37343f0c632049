//! Git history lookup.
//!
//! Any failure here is non-fatal: the caller just records no timestamp.

use std::path::Path;
use std::process::Stdio;

use chrono::{DateTime, NaiveDateTime, Utc};
use tokio::process::Command;
use tracing::{debug, instrument};

/// Naive layouts accepted when git (or a caller) omits the offset.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// Offset-carrying layouts that are not strict RFC 3339.
const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%:z", "%Y-%m-%d %H:%M:%S%.f%:z"];

/// Commit time of the most recent change under `path`, in UTC.
///
/// Runs `git log -1 --format=%cI -- .` from inside `path`, so relative and
/// absolute paths behave the same. Returns `None` if git is missing, the path
/// is not tracked, or the output does not parse.
#[instrument(skip_all, fields(path = %path.display()))]
pub async fn last_modified(path: &Path) -> Option<DateTime<Utc>> {
    let output = Command::new("git")
        .args(["log", "-1", "--format=%cI", "--", "."])
        .current_dir(path)
        .stdin(Stdio::null())
        .output()
        .await;

    let output = match output {
        Ok(output) => output,
        Err(e) => {
            debug!(error = %e, "git unavailable");
            return None;
        }
    };

    if !output.status.success() {
        debug!(
            stderr = %String::from_utf8_lossy(&output.stderr).trim(),
            "git log failed"
        );
        return None;
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let raw = stdout.trim();
    if raw.is_empty() {
        debug!("no history for path");
        return None;
    }

    let ts = normalize_timestamp(raw);
    if ts.is_none() {
        debug!(raw, "unparseable git timestamp");
    }
    ts
}

/// Parse an ISO-8601 timestamp and convert it to UTC.
///
/// Offset-aware input (`+05:00`, `Z`) is shifted to UTC; naive input is taken as UTC.
pub fn normalize_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }

    for fmt in OFFSET_FORMATS {
        if let Ok(ts) = DateTime::parse_from_str(raw, fmt) {
            return Some(ts.with_timezone(&Utc));
        }
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}
