//! Error types for the dcoscan core library.
//!
//! Each subsystem has its own error type derived with `thiserror`, and a
//! top-level [`CoreError`] enum unifies them for callers that want a single
//! error type.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for the entire core library.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    Commit(#[from] CommitError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    Report(#[from] ReportError),
}

// ---------------------------------------------------------------------------
// Identity errors
// ---------------------------------------------------------------------------

/// Errors from identity normalization and classifier loading.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdentityError {
    /// A person was given a blank name.
    #[error("name must not be blank (email '{email}')")]
    BlankName { email: String },

    /// A person was given a blank email address.
    #[error("email must not be blank (name '{name}')")]
    BlankEmail { name: String },

    /// A person was given no roles at all.
    #[error("roles must not be empty for '{email}'")]
    EmptyRoles { email: String },

    /// A classifier list file could not be read.
    #[error("classifier file error at '{path}': {detail}")]
    ClassifierFile { path: String, detail: String },
}

// ---------------------------------------------------------------------------
// Trailer errors
// ---------------------------------------------------------------------------

/// Problems found while extracting trailers from a commit message.
///
/// `Malformed` and `Rejected` affect a single line only; `Undecodable`
/// poisons the whole extraction pass for one marker.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TrailerError {
    /// The line carried the marker but did not have a parseable shape.
    #[error("malformed '{marker}' trailer in line '{line}': {detail}")]
    Malformed {
        marker: String,
        line: String,
        detail: String,
    },

    /// The line parsed, but the resulting identity was refused.
    #[error("rejected '{marker}' trailer in line '{line}': {source}")]
    Rejected {
        marker: String,
        line: String,
        source: IdentityError,
    },

    /// The message text could not be decoded, so nothing in it is trusted.
    #[error("message is not decodable, '{marker}' extraction abandoned")]
    Undecodable { marker: String },
}

impl TrailerError {
    /// `true` for failures that discard a whole extraction pass.
    pub fn is_systemic(&self) -> bool {
        matches!(self, Self::Undecodable { .. })
    }
}

// ---------------------------------------------------------------------------
// Commit errors
// ---------------------------------------------------------------------------

/// Errors raised when a raw commit record cannot become a [`Commit`].
///
/// [`Commit`]: crate::models::Commit
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommitError {
    #[error("commit identifier must not be blank")]
    BlankIdentifier,

    #[error("full message of commit {0} must not be blank")]
    BlankFullMessage(String),

    #[error("short message of commit {0} must not be blank")]
    BlankShortMessage(String),

    #[error("commit {0} has no persons")]
    NoPersons(String),

    /// The author or committer identity of the record is invalid.
    #[error("invalid identity in commit {identifier}: {source}")]
    Identity {
        identifier: String,
        source: IdentityError,
    },
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue { field: String, detail: String },

    /// Generic I/O error reading the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Git errors
// ---------------------------------------------------------------------------

/// Errors from local Git (git2) operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// The repository path does not exist or is not a git repo.
    #[error("git repository not found at '{0}'")]
    RepositoryNotFound(String),

    /// A `git2` library error.
    #[error("git2 error: {0}")]
    Git2Error(#[from] git2::Error),

    /// A commit carries a timestamp offset chrono cannot represent.
    #[error("commit {sha} has an invalid author time ({seconds}s, offset {offset_minutes}m)")]
    InvalidTime {
        sha: String,
        seconds: i64,
        offset_minutes: i32,
    },
}

// ---------------------------------------------------------------------------
// Report errors
// ---------------------------------------------------------------------------

/// Errors from writing report files.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Could not create, remove or write a report file.
    #[error("report I/O error at '{path}': {source}")]
    IoError {
        path: String,
        source: std::io::Error,
    },
}
