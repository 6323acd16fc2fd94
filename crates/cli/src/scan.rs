//! The `scan` command: audit every configured repository.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use dcoscan_core::config::RepositoryTarget;
use dcoscan_core::report::{self, OutputEntry};
use dcoscan_core::scanner::RepositoryReport;
use dcoscan_core::{IdentityRegistry, ScanConfig, Scanner};

use crate::style;

/// How a scan run ended, mapped onto the process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    Clean,
    Violations,
    Failed,
}

impl ScanOutcome {
    pub fn exit_code(self) -> u8 {
        match self {
            Self::Clean => 0,
            Self::Violations => 1,
            Self::Failed => 2,
        }
    }
}

/// Result for one repository, as printed in the summary.
#[derive(Debug, Serialize)]
struct RepositorySummary {
    repository: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<RepositoryReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    report_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct ScanSummary {
    repositories: Vec<RepositorySummary>,
    aggregate_file: PathBuf,
    offending_persons: usize,
}

pub async fn run_scan(config: ScanConfig, json: bool) -> Result<ScanOutcome> {
    let lists = config
        .classifiers
        .load_lists()
        .context("failed to load classifier lists")?;
    let targets = config
        .all_repositories()
        .context("failed to resolve repositories")?;
    let scanner = Scanner::new(Arc::new(IdentityRegistry::new(lists)), config.trailers.mode);

    info!(
        repositories = targets.len(),
        max_parallel = config.scan.max_parallel,
        mode = ?config.trailers.mode,
        "starting scan"
    );

    let results = scan_all(&scanner, targets, config.scan.max_parallel).await?;

    let mut summaries = Vec::with_capacity(results.len());
    let mut entries: Vec<OutputEntry> = Vec::new();
    let mut failed = false;
    let mut violations = false;

    for (target, result) in results {
        match result {
            Ok(repo_report) => {
                let report_file = report::write_repository_report(&config.output.dir, &repo_report)
                    .with_context(|| format!("failed to write report for {}", target.label()))?;
                violations |= !repo_report.is_clean();
                entries.extend(repo_report.output_entries());
                summaries.push(RepositorySummary {
                    repository: target.label(),
                    report: Some(repo_report),
                    report_file,
                    error: None,
                });
            }
            Err(e) => {
                error!(repo = %target.label(), error = %e, "repository scan failed");
                failed = true;
                summaries.push(RepositorySummary {
                    repository: target.label(),
                    report: None,
                    report_file: None,
                    error: Some(e),
                });
            }
        }
    }

    let aggregate_file = config.output.aggregate_path();
    report::write_aggregate(&aggregate_file, &entries).context("failed to write aggregate report")?;

    let summary = ScanSummary {
        repositories: summaries,
        aggregate_file,
        offending_persons: entries.len(),
    };

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("failed to serialize summary")?
        );
    } else {
        print_summary(&summary);
    }

    Ok(if failed {
        ScanOutcome::Failed
    } else if violations {
        ScanOutcome::Violations
    } else {
        ScanOutcome::Clean
    })
}

/// Scan every target on the blocking pool, at most `max_parallel` at a
/// time. Results come back in target order.
async fn scan_all(
    scanner: &Scanner,
    targets: Vec<RepositoryTarget>,
    max_parallel: usize,
) -> Result<Vec<(RepositoryTarget, std::result::Result<RepositoryReport, String>)>> {
    let semaphore = Arc::new(Semaphore::new(max_parallel));
    let mut handles = Vec::with_capacity(targets.len());

    for target in targets {
        let permit = semaphore
            .clone()
            .acquire_owned()
            .await
            .context("scan semaphore closed")?;
        let scanner = scanner.clone();
        let label = target.clone();
        let handle = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            scanner.scan(&target).map_err(|e| e.to_string())
        });
        handles.push((label, handle));
    }

    let mut results = Vec::with_capacity(handles.len());
    for (target, handle) in handles {
        let result = match handle.await {
            Ok(result) => result,
            Err(e) => {
                warn!(repo = %target.label(), error = %e, "scan task did not complete");
                Err(format!("scan task failed: {}", e))
            }
        };
        results.push((target, result));
    }
    Ok(results)
}

fn print_summary(summary: &ScanSummary) {
    println!();
    println!("{}", style::header("DCO Scan Summary"));
    println!();

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        "Repository", "Commits", "Invalid", "Skipped", "Trailer issues", "Status",
    ]);

    for repo in &summary.repositories {
        match (&repo.report, &repo.error) {
            (Some(r), _) => {
                let status = if r.is_clean() {
                    Cell::new("✓ clean").fg(Color::Green)
                } else {
                    Cell::new("✗ violations").fg(Color::Red)
                };
                table.add_row(vec![
                    Cell::new(&repo.repository),
                    Cell::new(r.total_commits),
                    Cell::new(r.invalid_commits.len()),
                    Cell::new(r.skipped_commits),
                    Cell::new(r.trailer_issues),
                    status,
                ]);
            }
            (None, error) => {
                table.add_row(vec![
                    Cell::new(&repo.repository),
                    Cell::new("—"),
                    Cell::new("—"),
                    Cell::new("—"),
                    Cell::new("—"),
                    Cell::new(format!("⚠ {}", error.as_deref().unwrap_or("failed")))
                        .fg(Color::Yellow),
                ]);
            }
        }
    }

    println!("{table}");
    println!();

    for repo in &summary.repositories {
        if let Some(path) = &repo.report_file {
            println!("  {}", style::dim(&format!("report: {}", path.display())));
        }
    }

    if summary.offending_persons == 0 {
        println!("{}", style::success("No missing sign-offs found."));
    } else {
        println!(
            "{}",
            style::error(&format!(
                "{} person(s) without sign-off, see {}",
                summary.offending_persons,
                summary.aggregate_file.display()
            ))
        );
    }
}
