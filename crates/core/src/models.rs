//! Domain model types shared by the identity engine, the scanner and the
//! report writers.
//!
//! [`Person`] and [`Commit`] are immutable once built. Persons are only
//! produced by [`IdentityRegistry`](crate::identity::IdentityRegistry) (and
//! by the merger, which derives them from registry output), so their
//! `internal` flag and handle always follow the same rules.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::errors::{CommitError, IdentityError, TrailerError};
use crate::validator;

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// The part a person played in a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Author,
    Committer,
    CoAuthor,
    Signer,
}

impl Role {
    /// `true` for the roles that make someone responsible for the content.
    pub fn is_authorship(self) -> bool {
        matches!(self, Self::Author | Self::CoAuthor)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Author => write!(f, "AUTHOR"),
            Self::Committer => write!(f, "COMMITTER"),
            Self::CoAuthor => write!(f, "CO_AUTHOR"),
            Self::Signer => write!(f, "SIGNER"),
        }
    }
}

// ---------------------------------------------------------------------------
// Person
// ---------------------------------------------------------------------------

/// One contributor as seen in the context of a single commit.
///
/// The email is the identity key: two persons with the same email are the
/// same human, whatever names they go by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Person {
    name: String,
    email: String,
    platform_handle: Option<String>,
    roles: BTreeSet<Role>,
    internal: bool,
}

impl Person {
    /// Build a person after checking the basic invariants.
    ///
    /// Crate-private: callers go through the registry so that handle
    /// derivation and classification are applied uniformly.
    pub(crate) fn new(
        name: &str,
        email: &str,
        platform_handle: Option<String>,
        roles: BTreeSet<Role>,
        internal: bool,
    ) -> Result<Self, IdentityError> {
        if name.trim().is_empty() {
            return Err(IdentityError::BlankName {
                email: email.to_string(),
            });
        }
        if email.trim().is_empty() {
            return Err(IdentityError::BlankEmail {
                name: name.to_string(),
            });
        }
        if roles.is_empty() {
            return Err(IdentityError::EmptyRoles {
                email: email.to_string(),
            });
        }
        Ok(Self {
            name: name.to_string(),
            email: email.to_string(),
            platform_handle,
            roles,
            internal,
        })
    }

    /// A copy of this person holding the union of both role sets.
    ///
    /// Name, handle and classification stay those of `self`.
    pub(crate) fn with_roles_of(&self, other: &Person) -> Person {
        let mut roles = self.roles.clone();
        roles.extend(other.roles.iter().copied());
        Person {
            name: self.name.clone(),
            email: self.email.clone(),
            platform_handle: self.platform_handle.clone(),
            roles,
            internal: self.internal,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// GitHub handle, when the email or the caller provided one.
    pub fn platform_handle(&self) -> Option<&str> {
        self.platform_handle.as_deref()
    }

    pub fn roles(&self) -> &BTreeSet<Role> {
        &self.roles
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// `true` if the registry classified this person as internal.
    pub fn is_internal(&self) -> bool {
        self.internal
    }
}

impl fmt::Display for Person {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}> (", self.name, self.email)?;
        for (i, role) in self.roles.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", role)?;
        }
        write!(f, ")")
    }
}

// ---------------------------------------------------------------------------
// Raw input records
// ---------------------------------------------------------------------------

/// A name/email pair as recorded by git, before any normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawIdentity {
    pub name: String,
    pub email: String,
}

impl RawIdentity {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

/// Per-commit metadata as it comes out of the history walk.
#[derive(Debug, Clone)]
pub struct RawCommit {
    pub identifier: String,
    /// Author time, in the author's own UTC offset.
    pub time: DateTime<FixedOffset>,
    pub author: RawIdentity,
    pub committer: Option<RawIdentity>,
    pub full_message: String,
    pub short_message: String,
    /// The message bytes did not fit their declared encoding and
    /// `full_message` is a lossy rendering of them.
    pub message_undecodable: bool,
}

// ---------------------------------------------------------------------------
// Commit
// ---------------------------------------------------------------------------

/// One historical revision with the deduplicated set of people behind it.
#[derive(Debug, Clone, Serialize)]
pub struct Commit {
    identifier: String,
    time: DateTime<FixedOffset>,
    full_message: String,
    short_message: String,
    persons: Vec<Person>,
}

impl Commit {
    /// Build a commit, rejecting blank fields or an empty person set.
    ///
    /// `persons` is expected to be deduplicated by email already (see
    /// [`merger::merge`](crate::merger::merge)).
    pub fn new(
        identifier: &str,
        time: DateTime<FixedOffset>,
        full_message: &str,
        short_message: &str,
        persons: Vec<Person>,
    ) -> Result<Self, CommitError> {
        if identifier.trim().is_empty() {
            return Err(CommitError::BlankIdentifier);
        }
        if full_message.trim().is_empty() {
            return Err(CommitError::BlankFullMessage(identifier.to_string()));
        }
        if short_message.trim().is_empty() {
            return Err(CommitError::BlankShortMessage(identifier.to_string()));
        }
        if persons.is_empty() {
            return Err(CommitError::NoPersons(identifier.to_string()));
        }
        Ok(Self {
            identifier: identifier.to_string(),
            time,
            full_message: full_message.to_string(),
            short_message: short_message.to_string(),
            persons,
        })
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn time(&self) -> DateTime<FixedOffset> {
        self.time
    }

    pub fn full_message(&self) -> &str {
        &self.full_message
    }

    pub fn short_message(&self) -> &str {
        &self.short_message
    }

    pub fn persons(&self) -> &[Person] {
        &self.persons
    }

    /// Look up the person carrying `email`, if any.
    pub fn person(&self, email: &str) -> Option<&Person> {
        self.persons.iter().find(|p| p.email == email)
    }

    /// `true` if the commit satisfies the sign-off policy.
    pub fn is_valid(&self) -> bool {
        validator::is_compliant(&self.persons)
    }

    /// Persons who do not break the sign-off policy.
    pub fn valid_persons(&self) -> Vec<&Person> {
        validator::valid_persons(&self.persons)
    }

    /// Persons who break the sign-off policy.
    pub fn invalid_persons(&self) -> Vec<&Person> {
        validator::invalid_persons(&self.persons)
    }

    /// One line for a per-repository report: the link followed by the
    /// offending persons.
    pub fn to_report_line(&self, link: &str) -> String {
        let invalid: Vec<String> = self
            .invalid_persons()
            .iter()
            .map(|p| p.to_string())
            .collect();
        format!("{} [{}]", link, invalid.join(", "))
    }
}

/// The result of assembling one raw commit.
///
/// `issues` carries every trailer problem met on the way, including the
/// systemic ones that were replaced by a placeholder person.
#[derive(Debug, Clone)]
pub struct AssembledCommit {
    pub commit: Commit,
    pub issues: Vec<TrailerError>,
}

impl AssembledCommit {
    /// `true` if any trailer extraction fell back to the placeholder.
    pub fn has_systemic_issue(&self) -> bool {
        self.issues.iter().any(TrailerError::is_systemic)
    }
}
