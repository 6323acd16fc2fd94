//! Sign-off trailer extraction from commit messages.
//!
//! Recognized trailers (case-sensitive, anywhere on a line):
//!
//! | Marker              | Role        |
//! |---------------------|-------------|
//! | `Co-authored-by:`   | `CO_AUTHOR` |
//! | `Co-developed-by:`  | `CO_AUTHOR` |
//! | `Signed-off-by:`    | `SIGNER`    |
//!
//! The canonical trailer value is `Full Name <email>`. In [`TrailerMode::Strict`]
//! nothing else is accepted; [`TrailerMode::Lenient`] also takes a bare email,
//! a bare name, or an email in brackets with nothing before it, and fills the
//! missing half with [`PLACEHOLDER`].
//!
//! A bad line never stops the pass: it is dropped and reported as a
//! [`TrailerError`]. Lines whose parts the registry refuses (an empty
//! `<>` in strict mode) are dropped the same way. Only a message flagged
//! undecodable by the history reader abandons the whole pass,
//! and then the result is a single placeholder person with the requested
//! role, so that the commit still gets judged (and most likely flagged).

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::errors::TrailerError;
use crate::identity::IdentityRegistry;
use crate::models::{Person, RawCommit, Role};

/// Stand-in for a name or email a trailer did not provide.
pub const PLACEHOLDER: &str = "UNKNOWN";

// ---------------------------------------------------------------------------
// Mode and kinds
// ---------------------------------------------------------------------------

/// How forgiving the trailer parser is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrailerMode {
    /// Only `Name <email>` is accepted.
    #[default]
    Strict,
    /// Bare emails, bare names and loose brackets are accepted too.
    Lenient,
}

/// The trailer kinds that contribute persons to a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrailerKind {
    CoAuthoredBy,
    CoDevelopedBy,
    SignedOffBy,
}

impl TrailerKind {
    /// All kinds, in merge order.
    pub const ALL: [TrailerKind; 3] = [Self::CoAuthoredBy, Self::CoDevelopedBy, Self::SignedOffBy];

    pub fn marker(self) -> &'static str {
        match self {
            Self::CoAuthoredBy => "Co-authored-by:",
            Self::CoDevelopedBy => "Co-developed-by:",
            Self::SignedOffBy => "Signed-off-by:",
        }
    }

    /// The role a person found under this trailer receives.
    pub fn role(self) -> Role {
        match self {
            Self::CoAuthoredBy | Self::CoDevelopedBy => Role::CoAuthor,
            Self::SignedOffBy => Role::Signer,
        }
    }
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Output of one extraction pass for one marker.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// Persons found, unique by email within this pass.
    pub persons: Vec<Person>,
    /// Lines that were dropped, or the systemic failure that emptied the pass.
    pub issues: Vec<TrailerError>,
}

/// Parses trailers out of commit messages, classifying through a registry.
#[derive(Debug, Clone, Copy)]
pub struct TrailerExtractor<'a> {
    registry: &'a IdentityRegistry,
    mode: TrailerMode,
}

impl<'a> TrailerExtractor<'a> {
    pub fn new(registry: &'a IdentityRegistry, mode: TrailerMode) -> Self {
        Self { registry, mode }
    }

    pub fn mode(&self) -> TrailerMode {
        self.mode
    }

    /// Extract the persons of one trailer kind from a raw commit. A message
    /// flagged undecodable is not parsed at all.
    pub fn extract_commit(&self, raw: &RawCommit, kind: TrailerKind) -> Extraction {
        if raw.message_undecodable {
            self.undecodable(kind.marker(), kind.role())
        } else {
            self.extract_kind(&raw.full_message, kind)
        }
    }

    /// Extract the persons of one trailer kind.
    pub fn extract_kind(&self, message: &str, kind: TrailerKind) -> Extraction {
        self.extract(message, kind.marker(), kind.role())
    }

    /// The result of a pass over a message whose text cannot be trusted:
    /// a single placeholder person with `role`, plus the systemic issue.
    pub fn undecodable(&self, marker: &str, role: Role) -> Extraction {
        let issue = TrailerError::Undecodable {
            marker: marker.to_string(),
        };
        error!(marker, "{}", issue);
        Extraction {
            persons: self.placeholder(role).into_iter().collect(),
            issues: vec![issue],
        }
    }

    /// Extract every `marker` line of `message` as a person with `role`.
    pub fn extract(&self, message: &str, marker: &str, role: Role) -> Extraction {
        let mut extraction = Extraction::default();
        for line in message.lines() {
            let Some(start) = line.find(marker) else {
                continue;
            };
            let remainder = line[start + marker.len()..].trim();

            let parsed = match self.mode {
                TrailerMode::Strict => parse_strict(remainder),
                TrailerMode::Lenient => parse_lenient(remainder),
            };
            let (name, email) = match parsed {
                Ok(pair) => pair,
                Err(detail) => {
                    let issue = TrailerError::Malformed {
                        marker: marker.to_string(),
                        line: line.to_string(),
                        detail,
                    };
                    warn!(mode = ?self.mode, "{}", issue);
                    extraction.issues.push(issue);
                    continue;
                }
            };

            match self.registry.normalize(&name, &email, BTreeSet::from([role])) {
                Ok(person) => {
                    if !extraction.persons.iter().any(|p| p.email() == person.email()) {
                        extraction.persons.push(person);
                    }
                }
                Err(source) => {
                    let issue = TrailerError::Rejected {
                        marker: marker.to_string(),
                        line: line.to_string(),
                        source,
                    };
                    warn!("{}", issue);
                    extraction.issues.push(issue);
                }
            }
        }
        extraction
    }

    fn placeholder(&self, role: Role) -> Option<Person> {
        self.registry
            .normalize(PLACEHOLDER, PLACEHOLDER, BTreeSet::from([role]))
            .ok()
    }
}

// ---------------------------------------------------------------------------
// Line parsers
// ---------------------------------------------------------------------------

/// `Name Parts <email>`: at least two tokens, the last one bracketed.
fn parse_strict(value: &str) -> Result<(String, String), String> {
    let tokens: Vec<&str> = value.split_whitespace().collect();
    let Some((last, name_tokens)) = tokens.split_last() else {
        return Err("empty trailer value".into());
    };
    if name_tokens.is_empty() {
        return Err("expected a name followed by a bracketed email".into());
    }
    let email = last
        .strip_prefix('<')
        .ok_or_else(|| "email must start with '<'".to_string())?
        .strip_suffix('>')
        .ok_or_else(|| "email must end with '>'".to_string())?;
    Ok((name_tokens.join(" "), email.to_string()))
}

/// Anything that looks like a name, an email, or both.
fn parse_lenient(value: &str) -> Result<(String, String), String> {
    if value.is_empty() {
        return Err("empty trailer value".into());
    }

    if let Some(open) = value.find('<') {
        if let Some(len) = value[open + 1..].find('>') {
            let name = value[..open].trim();
            let email = value[open + 1..open + 1 + len].trim();
            return Ok((or_placeholder(name), or_placeholder(email)));
        }
    }

    let tokens: Vec<&str> = value.split_whitespace().collect();
    match tokens.split_last() {
        Some((email, name_tokens)) if !name_tokens.is_empty() => {
            Ok((name_tokens.join(" "), email.to_string()))
        }
        Some((single, _)) if single.contains('@') => {
            Ok((PLACEHOLDER.to_string(), single.to_string()))
        }
        Some((single, _)) => Ok((single.to_string(), PLACEHOLDER.to_string())),
        None => Err("empty trailer value".into()),
    }
}

fn or_placeholder(part: &str) -> String {
    if part.is_empty() {
        PLACEHOLDER.to_string()
    } else {
        part.to_string()
    }
}
