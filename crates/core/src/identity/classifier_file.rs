//! Line-oriented classifier list files.
//!
//! Each file holds one entry per line:
//!
//! ```text
//! # internal email domains
//! example.com
//! example.org   # subsidiary
//! ```
//!
//! Everything from the first `#` on is a comment, entries are trimmed, and
//! lines left empty after that are skipped.

use std::path::Path;

use tracing::{debug, info};

use crate::errors::IdentityError;

/// Extract the entries of a classifier file's text.
pub fn read_classifier_lines(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(|line| line.split('#').next().unwrap_or_default().trim())
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

/// Load the entries of one classifier file from disk.
pub fn load_classifier_file<P: AsRef<Path>>(path: P) -> Result<Vec<String>, IdentityError> {
    let path = path.as_ref();
    debug!(path = %path.display(), "loading classifier file");

    if !path.exists() {
        return Err(IdentityError::ClassifierFile {
            path: path.display().to_string(),
            detail: "file not found".into(),
        });
    }

    let contents = std::fs::read_to_string(path).map_err(|e| IdentityError::ClassifierFile {
        path: path.display().to_string(),
        detail: e.to_string(),
    })?;
    let entries = read_classifier_lines(&contents);

    debug!(path = %path.display(), count = entries.len(), "loaded classifier entries");
    Ok(entries)
}

/// The three lists that decide who counts as internal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifierLists {
    /// Exact email addresses.
    pub emails: Vec<String>,
    /// Email domains, matched against everything after the `@`.
    pub domains: Vec<String>,
    /// GitHub handles, matched against handles derived from no-reply emails.
    pub handles: Vec<String>,
}

impl ClassifierLists {
    /// Load all three lists from their files.
    pub fn load<E, D, H>(emails: E, domains: D, handles: H) -> Result<Self, IdentityError>
    where
        E: AsRef<Path>,
        D: AsRef<Path>,
        H: AsRef<Path>,
    {
        let lists = Self {
            emails: load_classifier_file(emails)?,
            domains: load_classifier_file(domains)?,
            handles: load_classifier_file(handles)?,
        };
        info!(
            emails = lists.emails.len(),
            domains = lists.domains.len(),
            handles = lists.handles.len(),
            "classifier lists loaded"
        );
        Ok(lists)
    }
}
