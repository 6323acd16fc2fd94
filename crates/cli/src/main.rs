//! dcoscan command-line tool.
//!
//! Provides subcommands for scanning configured repositories for missing
//! Developer Certificate of Origin sign-offs, checking a single message
//! without a repository, classifying identities, and generating /
//! validating configuration files.

mod scan;
mod style;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use dcoscan_core::models::{RawCommit, RawIdentity};
use dcoscan_core::trailers::PLACEHOLDER;
use dcoscan_core::{CommitAssembler, IdentityRegistry, Role, ScanConfig, TrailerMode};

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// dcoscan command-line tool.
#[derive(Parser, Debug)]
#[command(
    name = "dcoscan",
    version,
    about = "Audit git history for missing Developer Certificate of Origin sign-offs"
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, global = true, default_value = "dcoscan.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error). Overrides the config file.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scan every configured repository and write the reports.
    Scan {
        /// Print the summary as JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Judge a single commit message without a repository.
    Check {
        #[arg(long)]
        author_name: String,

        #[arg(long)]
        author_email: String,

        #[arg(long, requires = "committer_email")]
        committer_name: Option<String>,

        #[arg(long, requires = "committer_name")]
        committer_email: Option<String>,

        /// Commit message, or `@<path>` to read it from a file.
        #[arg(short, long)]
        message: String,

        /// Trailer parsing mode. Defaults to the config file's setting.
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,
    },

    /// Show how an identity is classified.
    Classify {
        /// Email address to classify.
        email: String,

        #[arg(long)]
        name: Option<String>,

        /// GitHub handle known from elsewhere.
        #[arg(long)]
        handle: Option<String>,
    },

    /// Generate a default configuration file.
    Init {
        /// Output path for the generated config file.
        #[arg(short, long, default_value = "./dcoscan.toml")]
        output: PathBuf,
    },

    /// Validate a configuration file.
    Validate,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Strict,
    Lenient,
}

impl From<ModeArg> for TrailerMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Strict => TrailerMode::Strict,
            ModeArg::Lenient => TrailerMode::Lenient,
        }
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(scan::ScanOutcome::Failed.exit_code())
        }
    }
}

/// Level from `--log-level`, then `general.log_level`, then `info`.
fn init_logging(cli: &Cli) {
    let level = cli
        .log_level
        .clone()
        .or_else(|| {
            ScanConfig::load_from_file(&cli.config)
                .ok()
                .map(|c| c.general.log_level)
        })
        .unwrap_or_else(|| "info".to_string());

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&level).unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<u8> {
    match cli.command {
        Commands::Init { output } => cmd_init(&output).map(|()| 0),
        Commands::Validate => cmd_validate(&cli.config).map(|()| 0),
        Commands::Classify {
            email,
            name,
            handle,
        } => cmd_classify(&cli.config, &email, name.as_deref(), handle.as_deref()).map(|()| 0),
        Commands::Check {
            author_name,
            author_email,
            committer_name,
            committer_email,
            message,
            mode,
        } => {
            let committer = committer_name
                .zip(committer_email)
                .map(|(name, email)| RawIdentity::new(name, email));
            cmd_check(
                &cli.config,
                RawIdentity::new(author_name, author_email),
                committer,
                &message,
                mode.map(TrailerMode::from),
            )
        }
        Commands::Scan { json } => {
            let config = load_config(&cli.config)?;
            let outcome = scan::run_scan(config, json).await?;
            Ok(outcome.exit_code())
        }
    }
}

// ---------------------------------------------------------------------------
// Config helpers
// ---------------------------------------------------------------------------

fn load_config(path: &Path) -> Result<ScanConfig> {
    ScanConfig::load_and_validate(path).context("failed to load configuration file")
}

/// Registry and trailer mode for the one-off commands. Without a config
/// file every identity is external and trailers are parsed strictly.
fn registry_for(path: &Path) -> Result<(IdentityRegistry, TrailerMode)> {
    if !path.exists() {
        warn!(path = %path.display(), "no configuration file, treating every identity as external");
        return Ok((IdentityRegistry::default(), TrailerMode::default()));
    }
    let config = ScanConfig::load_from_file(path).context("failed to load configuration file")?;
    let lists = config
        .classifiers
        .load_lists()
        .context("failed to load classifier lists")?;
    Ok((IdentityRegistry::new(lists), config.trailers.mode))
}

// ---------------------------------------------------------------------------
// Subcommand implementations
// ---------------------------------------------------------------------------

fn cmd_init(output: &Path) -> Result<()> {
    let default_config = r#"# dcoscan Configuration
# Relative paths are resolved against the directory of this file.

[general]
log_level = "info"

# One entry per line; everything after '#' is a comment.
[classifiers]
emails_file = "internal-emails.txt"
domains_file = "internal-domains.txt"
handles_file = "internal-github-users.txt"

[trailers]
# "strict" accepts only `Name <email>`; "lenient" also takes bare
# names and emails.
mode = "strict"

[output]
dir = "out"
aggregate_file = "all.csv"

[scan]
max_parallel = 4
# repositories_file = "repositories.txt"   # lines of `<path> [<url>]`

[[repositories]]
path = "/srv/git/project"
url = "https://github.com/org/project"
"#;

    if output.exists() {
        anyhow::bail!(
            "file already exists: {}. Use a different path or remove the existing file.",
            output.display()
        );
    }

    std::fs::write(output, default_config).context("failed to write config file")?;

    println!("Default configuration written to {}", output.display());
    println!();
    println!("Next steps:");
    println!("  1. List your repositories and create the three classifier files");
    println!("  2. Validate with: dcoscan validate --config {}", output.display());
    println!("  3. Scan with: dcoscan scan --config {}", output.display());

    Ok(())
}

fn cmd_validate(config_path: &Path) -> Result<()> {
    println!("Validating configuration: {}", config_path.display());
    println!();

    let config =
        ScanConfig::load_from_file(config_path).context("failed to parse configuration")?;
    println!("  {}", style::success("TOML structure is valid"));

    if let Err(e) = config.validate() {
        println!("  {}", style::error(&format!("Validation error: {}", e)));
        anyhow::bail!("configuration validation failed");
    }
    println!("  {}", style::success("All required fields are valid"));

    let lists = match config.classifiers.load_lists() {
        Ok(lists) => {
            println!("  {}", style::success("Classifier files are readable"));
            lists
        }
        Err(e) => {
            println!("  {}", style::error(&e.to_string()));
            anyhow::bail!("configuration validation failed");
        }
    };

    let repositories = config
        .all_repositories()
        .context("failed to resolve repositories")?;
    for repo in &repositories {
        if !repo.path.exists() {
            println!(
                "  {}",
                style::warn(&format!("repository path does not exist: {}", repo.path.display()))
            );
        }
    }

    println!();
    println!("{}", style::header("Configuration summary:"));
    println!("  Trailer mode    : {:?}", config.trailers.mode);
    println!("  Internal emails : {}", lists.emails.len());
    println!("  Internal domains: {}", lists.domains.len());
    println!("  Internal handles: {}", lists.handles.len());
    println!("  Repositories    : {}", repositories.len());
    println!("  Max parallel    : {}", config.scan.max_parallel);
    println!("  Output directory: {}", config.output.dir.display());
    println!("  Aggregate report: {}", config.output.aggregate_path().display());
    println!();
    println!("Configuration is valid.");

    Ok(())
}

fn cmd_classify(
    config_path: &Path,
    email: &str,
    name: Option<&str>,
    handle: Option<&str>,
) -> Result<()> {
    let (registry, _) = registry_for(config_path)?;
    let person = registry
        .normalize_with_handle(
            name.unwrap_or(PLACEHOLDER),
            email,
            handle,
            BTreeSet::from([Role::Author]),
        )
        .context("identity rejected")?;

    println!("Name    : {}", person.name());
    println!("Email   : {}", person.email());
    println!("Handle  : {}", person.platform_handle().unwrap_or("-"));
    println!(
        "Class   : {}",
        if person.is_internal() {
            "internal"
        } else {
            "external"
        }
    );
    println!(
        "Sign-off: {}",
        if person.is_internal() {
            "not required"
        } else {
            "required when authoring"
        }
    );
    Ok(())
}

fn cmd_check(
    config_path: &Path,
    author: RawIdentity,
    committer: Option<RawIdentity>,
    message: &str,
    mode: Option<TrailerMode>,
) -> Result<u8> {
    let (registry, configured_mode) = registry_for(config_path)?;
    let (full_message, message_undecodable) = read_message(message)?;
    let raw = RawCommit {
        identifier: "check".to_string(),
        time: chrono::Utc::now().fixed_offset(),
        author,
        committer,
        short_message: full_message.lines().next().unwrap_or_default().to_string(),
        full_message,
        message_undecodable,
    };

    let assembler = CommitAssembler::new(&registry, mode.unwrap_or(configured_mode));
    let assembled = assembler.assemble(&raw).context("commit could not be assembled")?;
    let commit = &assembled.commit;

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Name", "Email", "Handle", "Roles", "Class", "Status"]);

    let invalid = commit.invalid_persons();
    for person in commit.persons() {
        let roles: Vec<String> = person.roles().iter().map(|r| r.to_string()).collect();
        let status = if invalid.contains(&person) {
            Cell::new("✗ needs sign-off").fg(Color::Red)
        } else {
            Cell::new("✓ ok").fg(Color::Green)
        };
        table.add_row(vec![
            Cell::new(person.name()),
            Cell::new(person.email()),
            Cell::new(person.platform_handle().unwrap_or("-")),
            Cell::new(roles.join(", ")),
            Cell::new(if person.is_internal() {
                "internal"
            } else {
                "external"
            }),
            status,
        ]);
    }

    println!("{}", style::header(commit.short_message()));
    println!();
    println!("{table}");
    for issue in &assembled.issues {
        println!("{}", style::warn(&issue.to_string()));
    }
    println!();
    println!("Verdict: {}", style::verdict(commit.is_valid()));

    Ok(if commit.is_valid() { 0 } else { 1 })
}

/// `@path` reads the message from a file; anything else is the message.
/// The message text, and whether a message file held bytes that are not
/// UTF-8 (the text is then a lossy rendering).
fn read_message(arg: &str) -> Result<(String, bool)> {
    let Some(path) = arg.strip_prefix('@') else {
        return Ok((arg.to_string(), false));
    };
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read message file {}", path))?;
    match String::from_utf8(bytes) {
        Ok(text) => Ok((text, false)),
        Err(e) => {
            warn!(path, "message file is not valid UTF-8");
            Ok((String::from_utf8_lossy(e.as_bytes()).into_owned(), true))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_message_inline_and_file() {
        assert_eq!(read_message("Fix typo").unwrap(), ("Fix typo".to_string(), false));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("msg.txt");
        std::fs::write(&path, "From file \u{FFFD}\n\nSigned-off-by: A <a@b.c>\n").unwrap();
        let (text, undecodable) = read_message(&format!("@{}", path.display())).unwrap();
        assert!(text.starts_with("From file"));
        assert!(!undecodable);
    }

    #[test]
    fn test_read_message_flags_invalid_utf8_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("msg.txt");
        std::fs::write(&path, b"Caf\xe9\n\nSigned-off-by: A <a@b.c>\n").unwrap();
        let (text, undecodable) = read_message(&format!("@{}", path.display())).unwrap();
        assert!(undecodable);
        assert!(text.starts_with("Caf\u{FFFD}"));
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dcoscan.toml");
        cmd_init(&path).unwrap();
        let config: ScanConfig =
            load_written(&std::fs::read_to_string(&path).unwrap());
        assert_eq!(config.trailers.mode, TrailerMode::Strict);
        assert!(cmd_init(&path).is_err());
    }

    #[test]
    fn test_check_exit_codes() {
        let missing = Path::new("/nonexistent/dcoscan.toml");
        let signed = cmd_check(
            missing,
            RawIdentity::new("Bob", "bob@outside.com"),
            None,
            "Fix\n\nSigned-off-by: Bob <bob@outside.com>\n",
            None,
        )
        .unwrap();
        assert_eq!(signed, 0);

        let unsigned = cmd_check(
            missing,
            RawIdentity::new("Bob", "bob@outside.com"),
            None,
            "Fix\n",
            None,
        )
        .unwrap();
        assert_eq!(unsigned, 1);
    }

    #[test]
    fn test_cli_parses_check() {
        let cli = Cli::try_parse_from([
            "dcoscan",
            "check",
            "--author-name",
            "Bob",
            "--author-email",
            "bob@outside.com",
            "--message",
            "Fix",
            "--mode",
            "lenient",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Check {
                mode: Some(ModeArg::Lenient),
                ..
            }
        ));
        assert_eq!(cli.config, PathBuf::from("dcoscan.toml"));
    }

    fn load_written(text: &str) -> ScanConfig {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c.toml");
        std::fs::write(&path, text).unwrap();
        ScanConfig::load_from_file(&path).unwrap()
    }
}
