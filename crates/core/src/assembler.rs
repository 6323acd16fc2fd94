//! Turns one raw commit record into a finished [`Commit`].
//!
//! Author and committer are normalized from the record itself, the three
//! trailer kinds are extracted from the full message, and everything is
//! merged by email before the commit is built.

use tracing::{debug, debug_span};

use crate::errors::CommitError;
use crate::identity::IdentityRegistry;
use crate::merger;
use crate::models::{AssembledCommit, Commit, Person, RawCommit, RawIdentity, Role};
use crate::trailers::{TrailerExtractor, TrailerKind, TrailerMode};

/// Builds [`Commit`] values against a shared registry.
///
/// Holds only shared references, so independent commits can be assembled
/// from several threads at once.
#[derive(Debug, Clone, Copy)]
pub struct CommitAssembler<'a> {
    registry: &'a IdentityRegistry,
    extractor: TrailerExtractor<'a>,
}

impl<'a> CommitAssembler<'a> {
    pub fn new(registry: &'a IdentityRegistry, mode: TrailerMode) -> Self {
        Self {
            registry,
            extractor: TrailerExtractor::new(registry, mode),
        }
    }

    /// Assemble one commit.
    ///
    /// Fails only when the record itself is unusable (blank hash, messages
    /// or author/committer identity). Trailer problems are returned in
    /// [`AssembledCommit::issues`] instead.
    pub fn assemble(&self, raw: &RawCommit) -> Result<AssembledCommit, CommitError> {
        let span = debug_span!("commit", sha = %raw.identifier);
        let _guard = span.enter();
        debug!("processing commit");

        if raw.identifier.trim().is_empty() {
            return Err(CommitError::BlankIdentifier);
        }

        let mut basics = vec![self.identity(raw, &raw.author, Role::Author)?];
        if let Some(committer) = &raw.committer {
            basics.push(self.identity(raw, committer, Role::Committer)?);
        }

        let mut issues = Vec::new();
        let mut sets = vec![basics];
        for kind in TrailerKind::ALL {
            let extraction = self.extractor.extract_commit(raw, kind);
            issues.extend(extraction.issues);
            sets.push(extraction.persons);
        }

        let persons = merger::merge(sets);
        let commit = Commit::new(
            &raw.identifier,
            raw.time,
            &raw.full_message,
            &raw.short_message,
            persons,
        )?;

        debug!(
            persons = commit.persons().len(),
            valid = commit.is_valid(),
            issues = issues.len(),
            "commit assembled"
        );
        Ok(AssembledCommit { commit, issues })
    }

    fn identity(
        &self,
        raw: &RawCommit,
        identity: &RawIdentity,
        role: Role,
    ) -> Result<Person, CommitError> {
        self.registry
            .normalize_as(&identity.name, &identity.email, role)
            .map_err(|source| CommitError::Identity {
                identifier: raw.identifier.clone(),
                source,
            })
    }
}
