//! Report files: one text file per repository with invalid commits, and an
//! aggregated CSV over all repositories.
//!
//! Layout under the output directory:
//!
//! ```text
//! out/
//!   <org>/<name>.txt   one line per invalid commit
//!   all.csv            one row per offending person
//! ```

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::errors::ReportError;
use crate::models::{Commit, Person};
use crate::scanner::RepositoryReport;

/// Header of the aggregated CSV.
pub const AGGREGATE_HEADER: [&str; 4] = ["commit", "name", "email", "GithubAccount"];

/// One offending person of one invalid commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputEntry {
    pub commit_link: String,
    pub time: DateTime<Utc>,
    pub name: String,
    pub email: String,
    pub github_account: Option<String>,
}

impl OutputEntry {
    pub fn new(commit_link: String, commit: &Commit, person: &Person) -> Self {
        Self {
            commit_link,
            time: commit.time().with_timezone(&Utc),
            name: person.name().to_string(),
            email: person.email().to_string(),
            github_account: person.platform_handle().map(str::to_string),
        }
    }

    /// The CSV columns: accounts are shown instead of emails when known.
    pub fn csv_record(&self) -> [String; 4] {
        match &self.github_account {
            Some(handle) => [
                self.commit_link.clone(),
                self.name.clone(),
                "-".to_string(),
                format!("https://github.com/{}", handle),
            ],
            None => [
                self.commit_link.clone(),
                self.name.clone(),
                self.email.clone(),
                "-".to_string(),
            ],
        }
    }
}

/// Write `<dir>/<org>/<name>.txt` for a repository with invalid commits.
///
/// Returns the written path, or `None` for a clean repository. An existing
/// report is replaced, and removed once the repository is clean.
pub fn write_repository_report(
    dir: &Path,
    report: &RepositoryReport,
) -> Result<Option<PathBuf>, ReportError> {
    let org_dir = dir.join(&report.name.org);
    let path = org_dir.join(format!("{}.txt", report.name.name));

    if report.is_clean() {
        match std::fs::remove_file(&path) {
            Ok(()) => info!(path = %path.display(), "stale repository report removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(repo = %report.target.label(), "clean repository, no report written");
            }
            Err(e) => return Err(io_error(&path, e)),
        }
        return Ok(None);
    }

    std::fs::create_dir_all(&org_dir).map_err(|e| io_error(&org_dir, e))?;

    let mut contents = report.report_lines().join("\n");
    contents.push('\n');
    std::fs::write(&path, contents).map_err(|e| io_error(&path, e))?;

    info!(path = %path.display(), commits = report.invalid_commits.len(), "repository report written");
    Ok(Some(path))
}

/// Write the aggregated CSV, replacing any existing file.
pub fn write_aggregate(path: &Path, entries: &[OutputEntry]) -> Result<(), ReportError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
    }

    let mut csv = String::new();
    push_record(&mut csv, &AGGREGATE_HEADER);
    for entry in entries {
        push_record(&mut csv, &entry.csv_record());
    }
    std::fs::write(path, csv).map_err(|e| io_error(path, e))?;

    info!(path = %path.display(), rows = entries.len(), "aggregate report written");
    Ok(())
}

fn push_record<S: AsRef<str>>(out: &mut String, fields: &[S]) {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        let field = field.as_ref();
        if field.contains([',', '"', '\n', '\r']) {
            out.push('"');
            out.push_str(&field.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(field);
        }
    }
    out.push('\n');
}

fn io_error(path: &Path, source: std::io::Error) -> ReportError {
    ReportError::IoError {
        path: path.display().to_string(),
        source,
    }
}
