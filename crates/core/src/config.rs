//! TOML-based configuration for dcoscan.
//!
//! Relative paths in the file (classifier lists, repositories, output
//! directory) are resolved against the directory holding the config file
//! by [`ScanConfig::load_from_file`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::{ConfigError, IdentityError};
use crate::git::RepositoryName;
use crate::identity::classifier_file::{read_classifier_lines, ClassifierLists};
use crate::trailers::TrailerMode;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level configuration loaded from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Process-wide settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Locations of the internal classifier lists.
    #[serde(default)]
    pub classifiers: ClassifierConfig,

    /// Trailer parsing settings.
    #[serde(default)]
    pub trailers: TrailerConfig,

    /// Report output settings.
    #[serde(default)]
    pub output: OutputConfig,

    /// Scan behaviour settings.
    #[serde(default)]
    pub scan: ScanSettings,

    /// Repositories listed inline.
    #[serde(default)]
    pub repositories: Vec<RepositoryTarget>,
}

// ---------------------------------------------------------------------------
// General
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Minimum tracing level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Classifiers
// ---------------------------------------------------------------------------

/// Paths of the line-oriented classifier files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default = "default_emails_file")]
    pub emails_file: PathBuf,

    #[serde(default = "default_domains_file")]
    pub domains_file: PathBuf,

    /// GitHub handles; matched against no-reply email addresses.
    #[serde(default = "default_handles_file")]
    pub handles_file: PathBuf,
}

fn default_emails_file() -> PathBuf {
    PathBuf::from("internal-emails.txt")
}
fn default_domains_file() -> PathBuf {
    PathBuf::from("internal-domains.txt")
}
fn default_handles_file() -> PathBuf {
    PathBuf::from("internal-github-users.txt")
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            emails_file: default_emails_file(),
            domains_file: default_domains_file(),
            handles_file: default_handles_file(),
        }
    }
}

impl ClassifierConfig {
    /// Read the three classifier files.
    pub fn load_lists(&self) -> Result<ClassifierLists, IdentityError> {
        ClassifierLists::load(&self.emails_file, &self.domains_file, &self.handles_file)
    }
}

// ---------------------------------------------------------------------------
// Trailers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrailerConfig {
    /// `strict` (default) or `lenient`.
    #[serde(default)]
    pub mode: TrailerMode,
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving the per-repository reports.
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,

    /// File name of the aggregated CSV, inside `dir`.
    #[serde(default = "default_aggregate_file")]
    pub aggregate_file: String,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("out")
}
fn default_aggregate_file() -> String {
    "all.csv".into()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            aggregate_file: default_aggregate_file(),
        }
    }
}

impl OutputConfig {
    pub fn aggregate_path(&self) -> PathBuf {
        self.dir.join(&self.aggregate_file)
    }
}

// ---------------------------------------------------------------------------
// Scan
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSettings {
    /// Maximum number of repositories scanned at the same time.
    #[serde(default = "default_max_parallel")]
    pub max_parallel: usize,

    /// Optional line-oriented file listing `<path> [<url>]` per line.
    #[serde(default)]
    pub repositories_file: Option<PathBuf>,
}

fn default_max_parallel() -> usize {
    4
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            max_parallel: default_max_parallel(),
            repositories_file: None,
        }
    }
}

/// One local repository to scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryTarget {
    /// Path of the local clone.
    pub path: PathBuf,

    /// Web URL of the repository, used for commit links and report names.
    #[serde(default)]
    pub url: Option<String>,
}

impl RepositoryTarget {
    /// Parse one `<path> [<url>]` line of a repositories file.
    pub fn from_line(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace();
        let path = parts.next()?;
        Some(Self {
            path: PathBuf::from(path),
            url: parts.next().map(str::to_string),
        })
    }

    /// Label used in logs and summaries.
    pub fn label(&self) -> String {
        match &self.url {
            Some(url) => url.clone(),
            None => self.path.display().to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading & validation
// ---------------------------------------------------------------------------

impl ScanConfig {
    /// Load a [`ScanConfig`] from a TOML file and resolve relative paths
    /// against the file's directory.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading configuration");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        let mut config: ScanConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        config.resolve_paths(base);

        debug!("configuration parsed successfully");
        Ok(config)
    }

    /// Make every relative path in the config relative to `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.classifiers.emails_file);
        resolve(&mut self.classifiers.domains_file);
        resolve(&mut self.classifiers.handles_file);
        resolve(&mut self.output.dir);
        if let Some(file) = self.scan.repositories_file.as_mut() {
            resolve(file);
        }
        for repo in &mut self.repositories {
            resolve(&mut repo.path);
        }
    }

    /// Inline repositories followed by those from `scan.repositories_file`.
    pub fn all_repositories(&self) -> Result<Vec<RepositoryTarget>, ConfigError> {
        let mut targets = self.repositories.clone();
        if let Some(file) = &self.scan.repositories_file {
            if !file.exists() {
                return Err(ConfigError::FileNotFound(file.display().to_string()));
            }
            let contents = std::fs::read_to_string(file)?;
            let base = file.parent().unwrap_or_else(|| Path::new("."));
            for line in read_classifier_lines(&contents) {
                if let Some(mut target) = RepositoryTarget::from_line(&line) {
                    if target.path.is_relative() {
                        target.path = base.join(&target.path);
                    }
                    targets.push(target);
                }
            }
        }
        debug!(count = targets.len(), "repositories resolved");
        Ok(targets)
    }

    /// Validate that all required fields are present and sane. Reads the
    /// repositories file, if any: at least one repository must be listed,
    /// and no two may share a report file.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scan.max_parallel == 0 {
            return Err(ConfigError::InvalidValue {
                field: "scan.max_parallel".into(),
                detail: "must be > 0".into(),
            });
        }
        if self.output.dir.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "output.dir".into(),
                detail: "output directory must not be empty".into(),
            });
        }
        if self.output.aggregate_file.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "output.aggregate_file".into(),
                detail: "aggregate file name must not be empty".into(),
            });
        }
        if let Some(repo) = self
            .repositories
            .iter()
            .find(|r| r.path.as_os_str().is_empty())
        {
            return Err(ConfigError::InvalidValue {
                field: "repositories.path".into(),
                detail: format!("empty path for repository {:?}", repo.url),
            });
        }
        let targets = self.all_repositories()?;
        if targets.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "repositories".into(),
                detail: "no repositories configured".into(),
            });
        }
        let mut seen: HashMap<String, &RepositoryTarget> = HashMap::new();
        for target in &targets {
            let name = RepositoryName::for_target(target);
            let key = format!("{}/{}", name.org, name.name);
            if let Some(first) = seen.insert(key.clone(), target) {
                return Err(ConfigError::InvalidValue {
                    field: "repositories".into(),
                    detail: format!(
                        "{} and {} would share the report {}",
                        first.label(),
                        target.label(),
                        key
                    ),
                });
            }
        }
        Ok(())
    }

    /// Convenience: load and validate in one call.
    pub fn load_and_validate<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config = Self::load_from_file(path)?;
        config.validate()?;
        Ok(config)
    }
}
