//! Best-effort provenance stamped into the lock document.
//!
//! Neither the clock nor the revision lookup can fail the run: a missing git
//! checkout simply yields no revision.
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::process::Command;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

/// Source of the generation timestamp and revision id.
pub trait Provenance {
    fn now_utc(&self) -> OffsetDateTime;
    fn short_revision(&self) -> Option<String>;
}

/// Wall clock plus `git rev-parse --short HEAD`.
#[derive(Debug, Clone, Default)]
pub struct SystemProvenance {
    /// Directory git runs in; the process cwd when unset.
    pub repo_dir: Option<PathBuf>,
}

impl Provenance for SystemProvenance {
    fn now_utc(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }

    fn short_revision(&self) -> Option<String> {
        let mut command = Command::new("git");
        command.args(["rev-parse", "--short", "HEAD"]);
        if let Some(dir) = &self.repo_dir {
            command.current_dir(dir);
        }
        let output = match command.output() {
            Ok(output) => output,
            Err(err) => {
                tracing::debug!(error = %err, "git unavailable; omitting revision");
                return None;
            }
        };
        if !output.status.success() {
            tracing::debug!(status = %output.status, "git rev-parse failed; omitting revision");
            return None;
        }
        let revision = String::from_utf8_lossy(&output.stdout).trim().to_string();
        (!revision.is_empty()).then_some(revision)
    }
}

/// RFC 3339 UTC timestamp at second precision, e.g. `2024-05-01T12:00:00+00:00`.
pub fn format_timestamp(at: OffsetDateTime) -> Result<String> {
    let format = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]+00:00");
    at.to_offset(UtcOffset::UTC)
        .format(&format)
        .context("format generation timestamp")
}
