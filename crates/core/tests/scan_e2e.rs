//! End-to-end tests for repository scanning.
//!
//! These tests exercise the real pipeline with:
//! - Local Git repos built with `git2` in a temp directory
//! - Classifier files and a TOML config written next to them
//! - Report files written to the configured output directory
//!
//! No network I/O and no external `git` binary.

use std::path::Path;
use std::sync::Arc;

use git2::{Repository, Signature, Time};
use tempfile::TempDir;

use dcoscan_core::config::ScanConfig;
use dcoscan_core::identity::IdentityRegistry;
use dcoscan_core::report::{write_aggregate, write_repository_report};
use dcoscan_core::scanner::Scanner;
use dcoscan_core::Role;

// ===========================================================================
// Helpers
// ===========================================================================

fn commit(repo: &Repository, author: (&str, &str), committer: (&str, &str), message: &str) -> String {
    let time = Time::new(1_700_000_000, 0);
    let author = Signature::new(author.0, author.1, &time).unwrap();
    let committer = Signature::new(committer.0, committer.1, &time).unwrap();
    let tree_id = repo.index().unwrap().write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();
    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<&git2::Commit> = parent.iter().collect();
    repo.commit(Some("HEAD"), &author, &committer, message, &tree, &parents)
        .unwrap()
        .to_string()
}

/// Lay out a workspace with classifier files, two repos and a config.
struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("internal-emails.txt"),
            "# individual addresses\nlead@freelance.dev\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("internal-domains.txt"), "corp.example  # main\n").unwrap();
        std::fs::write(dir.path().join("internal-github-users.txt"), "insider\n").unwrap();
        Self { dir }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn init_repo(&self, name: &str) -> Repository {
        Repository::init(self.path().join("repos").join(name)).unwrap()
    }

    fn write_config(&self, extra: &str) -> ScanConfig {
        let toml = format!(
            r#"
[output]
dir = "reports"

[[repositories]]
path = "repos/service"
url = "https://github.com/acme/service"

[[repositories]]
path = "repos/tool"
{extra}
"#
        );
        let path = self.path().join("dcoscan.toml");
        std::fs::write(&path, toml).unwrap();
        ScanConfig::load_and_validate(&path).unwrap()
    }
}

fn scanner_for(config: &ScanConfig) -> Scanner {
    let lists = config.classifiers.load_lists().unwrap();
    Scanner::new(Arc::new(IdentityRegistry::new(lists)), config.trailers.mode)
}

// ===========================================================================
// Tests
// ===========================================================================

#[test]
fn test_full_scan_writes_reports() {
    let ws = Workspace::new();

    let service = ws.init_repo("service");
    commit(&service, ("Ann", "ann@corp.example"), ("Ann", "ann@corp.example"), "Initial\n");
    let bad = commit(
        &service,
        ("Bob", "bob@outside.com"),
        ("Ann", "ann@corp.example"),
        "Add feature\n\nCo-authored-by: Octo <9+octocat@users.noreply.github.com>\nSigned-off-by: Bob <bob@outside.com>\n",
    );
    commit(
        &service,
        ("Insider", "1+insider@users.noreply.github.com"),
        ("Insider", "1+insider@users.noreply.github.com"),
        "Internal via handle\n",
    );

    let tool = ws.init_repo("tool");
    commit(
        &tool,
        ("Lead", "lead@freelance.dev"),
        ("Lead", "lead@freelance.dev"),
        "Internal via email\n",
    );

    let config = ws.write_config("");
    let scanner = scanner_for(&config);
    let targets = config.all_repositories().unwrap();
    assert_eq!(targets.len(), 2);

    let mut entries = Vec::new();
    let mut written = Vec::new();
    for target in &targets {
        let report = scanner.scan(target).unwrap();
        entries.extend(report.output_entries());
        written.push(write_repository_report(&config.output.dir, &report).unwrap());
    }

    // service: only the Bob commit, where the co-author never signed off
    let service_report = written[0].as_ref().expect("service has violations");
    assert_eq!(*service_report, ws.path().join("reports/acme/service.txt"));
    let text = std::fs::read_to_string(service_report).unwrap();
    assert_eq!(text.lines().count(), 1);
    assert!(text.starts_with(&format!("https://github.com/acme/service/commit/{bad} [")));
    assert!(text.contains("Octo <9+octocat@users.noreply.github.com> (CO_AUTHOR)"));
    assert!(text.contains("Bob <bob@outside.com> (AUTHOR, SIGNER)"));

    // tool: clean, no file
    assert!(written[1].is_none());

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].github_account.as_deref(), Some("octocat"));

    let csv_path = config.output.aggregate_path();
    write_aggregate(&csv_path, &entries).unwrap();
    let csv = std::fs::read_to_string(&csv_path).unwrap();
    assert_eq!(
        csv,
        format!(
            "commit,name,email,GithubAccount\nhttps://github.com/acme/service/commit/{bad},Octo,-,https://github.com/octocat\n"
        )
    );
}

#[test]
fn test_rescan_replaces_report() {
    let ws = Workspace::new();
    let service = ws.init_repo("service");
    commit(&service, ("Bob", "bob@outside.com"), ("Bob", "bob@outside.com"), "One\n");
    ws.init_repo("tool");

    let config = ws.write_config("");
    let scanner = scanner_for(&config);
    let target = &config.all_repositories().unwrap()[0];

    let report = scanner.scan(target).unwrap();
    let path = write_repository_report(&config.output.dir, &report).unwrap().unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap().lines().count(), 1);

    commit(&service, ("Bob", "bob@outside.com"), ("Bob", "bob@outside.com"), "Two\n");
    let report = scanner.scan(target).unwrap();
    assert_eq!(report.total_commits, 2);
    write_repository_report(&config.output.dir, &report).unwrap();
    let lines: Vec<String> = std::fs::read_to_string(&path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines, report.report_lines());
}

#[test]
fn test_empty_repository_is_clean() {
    let ws = Workspace::new();
    ws.init_repo("service");
    ws.init_repo("tool");

    let config = ws.write_config("");
    let scanner = scanner_for(&config);
    for target in config.all_repositories().unwrap() {
        let report = scanner.scan(&target).unwrap();
        assert_eq!(report.total_commits, 0);
        assert!(report.is_clean());
    }
}

#[test]
fn test_lenient_mode_accepts_bare_email_sign_off() {
    let ws = Workspace::new();
    let service = ws.init_repo("service");
    commit(
        &service,
        ("Bob", "bob@outside.com"),
        ("Bob", "bob@outside.com"),
        "Fix\n\nSigned-off-by: bob@outside.com\n",
    );
    ws.init_repo("tool");

    // Strict: the loose trailer is dropped and Bob stays unsigned.
    let config = ws.write_config("");
    let target = &config.all_repositories().unwrap()[0];
    let strict = scanner_for(&config).scan(target).unwrap();
    assert_eq!(strict.invalid_commits.len(), 1);
    assert_eq!(strict.trailer_issues, 1);

    std::fs::write(
        ws.path().join("dcoscan.toml"),
        std::fs::read_to_string(ws.path().join("dcoscan.toml"))
            .unwrap()
            .replacen("[output]", "[trailers]\nmode = \"lenient\"\n\n[output]", 1),
    )
    .unwrap();
    let config = ScanConfig::load_and_validate(ws.path().join("dcoscan.toml")).unwrap();
    let lenient = scanner_for(&config).scan(target).unwrap();
    assert!(lenient.is_clean());
    assert_eq!(lenient.trailer_issues, 0);
}

#[test]
fn test_repositories_file() {
    let ws = Workspace::new();
    let service = ws.init_repo("service");
    commit(&service, ("Ann", "ann@corp.example"), ("Ann", "ann@corp.example"), "Hi\n");
    ws.init_repo("tool");
    let extra = ws.init_repo("extra");
    commit(&extra, ("Eve", "eve@outside.com"), ("Eve", "eve@outside.com"), "Sneaky\n");

    std::fs::write(
        ws.path().join("repositories.txt"),
        "# more repos\nrepos/extra https://github.com/acme/extra.git\n",
    )
    .unwrap();
    let config = ws.write_config("\n[scan]\nrepositories_file = \"repositories.txt\"\n");
    let targets = config.all_repositories().unwrap();
    assert_eq!(targets.len(), 3);
    assert_eq!(targets[2].path, ws.path().join("repos/extra"));

    let report = scanner_for(&config).scan(&targets[2]).unwrap();
    assert_eq!(report.name.org, "acme");
    assert_eq!(report.name.name, "extra");
    let commit = &report.invalid_commits[0];
    assert!(commit.person("eve@outside.com").unwrap().has_role(Role::Committer));
}
