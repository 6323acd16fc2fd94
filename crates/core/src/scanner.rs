//! Per-repository DCO scan.
//!
//! A [`Scanner`] walks the history of one local repository, assembles every
//! commit against the shared registry and keeps the commits that break the
//! sign-off policy. Scanners are cheap to clone and hold the registry
//! behind an `Arc`, so one can be handed to every worker.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, info_span, warn};

use crate::assembler::CommitAssembler;
use crate::config::RepositoryTarget;
use crate::errors::CoreError;
use crate::git::{commit_link, HistoryReader, RepositoryName};
use crate::identity::IdentityRegistry;
use crate::models::{Commit, RawCommit};
use crate::report::OutputEntry;
use crate::trailers::TrailerMode;

/// Outcome of scanning one repository.
#[derive(Debug, Clone, Serialize)]
pub struct RepositoryReport {
    pub target: RepositoryTarget,
    pub name: RepositoryName,
    /// Commits seen in the history.
    pub total_commits: usize,
    /// Commits whose raw record could not be assembled at all.
    pub skipped_commits: usize,
    /// Trailer problems met across all commits.
    pub trailer_issues: usize,
    /// Commits that break the sign-off policy, newest first.
    pub invalid_commits: Vec<Commit>,
}

impl RepositoryReport {
    fn new(target: &RepositoryTarget) -> Self {
        Self {
            target: target.clone(),
            name: RepositoryName::for_target(target),
            total_commits: 0,
            skipped_commits: 0,
            trailer_issues: 0,
            invalid_commits: Vec::new(),
        }
    }

    /// `true` if no commit breaks the policy.
    pub fn is_clean(&self) -> bool {
        self.invalid_commits.is_empty()
    }

    /// Lines of the per-repository text report.
    pub fn report_lines(&self) -> Vec<String> {
        self.invalid_commits
            .iter()
            .map(|c| c.to_report_line(&commit_link(&self.target, c.identifier())))
            .collect()
    }

    /// One aggregate row per offending person of every invalid commit.
    pub fn output_entries(&self) -> Vec<OutputEntry> {
        self.invalid_commits
            .iter()
            .flat_map(|commit| {
                let link = commit_link(&self.target, commit.identifier());
                commit
                    .invalid_persons()
                    .into_iter()
                    .map(move |person| OutputEntry::new(link.clone(), commit, person))
            })
            .collect()
    }
}

/// Scans repositories against one registry and trailer mode.
#[derive(Debug, Clone)]
pub struct Scanner {
    registry: Arc<IdentityRegistry>,
    mode: TrailerMode,
}

impl Scanner {
    pub fn new(registry: Arc<IdentityRegistry>, mode: TrailerMode) -> Self {
        Self { registry, mode }
    }

    /// Scan the history of a local repository.
    pub fn scan(&self, target: &RepositoryTarget) -> Result<RepositoryReport, CoreError> {
        let span = info_span!("repository", repo = %target.label());
        let _guard = span.enter();
        info!("scanning repository");

        let reader = HistoryReader::open(&target.path)?;
        let raw_commits = reader.raw_commits()?;
        let report = self.scan_commits(target, &raw_commits);

        if report.is_clean() {
            info!(commits = report.total_commits, "repository is clean");
        } else {
            info!(
                commits = report.total_commits,
                invalid = report.invalid_commits.len(),
                "repository contains invalid commits"
            );
        }
        Ok(report)
    }

    /// Judge already-read commits. Records that cannot be assembled are
    /// counted and skipped.
    pub fn scan_commits(&self, target: &RepositoryTarget, raw_commits: &[RawCommit]) -> RepositoryReport {
        let assembler = CommitAssembler::new(&self.registry, self.mode);
        let mut report = RepositoryReport::new(target);

        for raw in raw_commits {
            report.total_commits += 1;
            match assembler.assemble(raw) {
                Ok(assembled) => {
                    report.trailer_issues += assembled.issues.len();
                    if !assembled.commit.is_valid() {
                        report.invalid_commits.push(assembled.commit);
                    }
                }
                Err(e) => {
                    warn!(sha = %raw.identifier, error = %e, "skipping unusable commit record");
                    report.skipped_commits += 1;
                }
            }
        }
        report
    }
}
