//! The identity registry: normalizes raw `(name, email, roles)` tuples into
//! [`Person`] values and classifies them as internal or external.
//!
//! Classification order:
//! 1. Exact email match against the internal-email list
//! 2. Email domain (everything after the last `@`) against the domain list
//! 3. GitHub handle (derived from a no-reply email) against the handle list

use std::collections::BTreeSet;

use tracing::trace;

use super::classifier_file::ClassifierLists;
use crate::errors::IdentityError;
use crate::models::{Person, Role};

/// Host of GitHub's no-reply commit email addresses.
pub const NOREPLY_HOST: &str = "users.noreply.github.com";

/// Derive a GitHub handle from a no-reply email address.
///
/// `12345+octocat@users.noreply.github.com` and
/// `octocat@users.noreply.github.com` both give `octocat`; any other email
/// gives `None`.
pub fn derive_github_handle(email: &str) -> Option<String> {
    let (local, host) = email.rsplit_once('@')?;
    if host != NOREPLY_HOST {
        return None;
    }
    let handle = match local.rsplit_once('+') {
        Some((_, handle)) => handle,
        None => local,
    };
    if handle.is_empty() {
        None
    } else {
        Some(handle.to_string())
    }
}

/// Immutable set of internal classifiers, built once before scanning.
///
/// `normalize` only reads the lists, so one registry can be shared across
/// threads behind an `Arc` for the whole run.
#[derive(Debug, Clone, Default)]
pub struct IdentityRegistry {
    internal_emails: BTreeSet<String>,
    internal_domains: BTreeSet<String>,
    internal_handles: BTreeSet<String>,
}

impl IdentityRegistry {
    pub fn new(lists: ClassifierLists) -> Self {
        Self {
            internal_emails: lists.emails.into_iter().collect(),
            internal_domains: lists.domains.into_iter().collect(),
            internal_handles: lists.handles.into_iter().collect(),
        }
    }

    /// Normalize a raw identity into a classified [`Person`].
    pub fn normalize(
        &self,
        name: &str,
        email: &str,
        roles: BTreeSet<Role>,
    ) -> Result<Person, IdentityError> {
        self.normalize_with_handle(name, email, None, roles)
    }

    /// Like [`normalize`](Self::normalize), with a handle known from
    /// elsewhere. A handle derived from the email wins over the supplied one.
    pub fn normalize_with_handle(
        &self,
        name: &str,
        email: &str,
        supplied_handle: Option<&str>,
        roles: BTreeSet<Role>,
    ) -> Result<Person, IdentityError> {
        let handle = derive_github_handle(email).or_else(|| {
            supplied_handle
                .map(str::trim)
                .filter(|h| !h.is_empty())
                .map(str::to_string)
        });
        let internal = self.is_internal(email, handle.as_deref());
        trace!(email, handle = ?handle, internal, "normalized identity");
        Person::new(name, email, handle, roles, internal)
    }

    /// Shorthand for normalizing with a single role.
    pub fn normalize_as(&self, name: &str, email: &str, role: Role) -> Result<Person, IdentityError> {
        self.normalize(name, email, BTreeSet::from([role]))
    }

    /// `true` if the email or handle is covered by one of the lists.
    pub fn is_internal(&self, email: &str, handle: Option<&str>) -> bool {
        if self.internal_emails.contains(email) {
            return true;
        }
        if let Some((_, domain)) = email.rsplit_once('@') {
            if self.internal_domains.contains(domain) {
                return true;
            }
        }
        match handle {
            Some(handle) => self.internal_handles.contains(handle),
            None => false,
        }
    }
}
