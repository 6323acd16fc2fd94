//! Reading commit history from a local repository via `git2`.

use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset, TimeZone};
use git2::{Repository, Signature, Sort};
use tracing::{debug, info, instrument, warn};

use crate::errors::GitError;
use crate::models::{RawCommit, RawIdentity};

/// Walks the history of one local repository.
pub struct HistoryReader {
    repo: Repository,
    repo_path: PathBuf,
}

impl HistoryReader {
    /// Open an existing Git repository at `repo_path`.
    pub fn open<P: AsRef<Path>>(repo_path: P) -> Result<Self, GitError> {
        let path = repo_path.as_ref();
        info!(path = %path.display(), "opening git repository");
        let repo = Repository::open(path)
            .map_err(|_| GitError::RepositoryNotFound(path.display().to_string()))?;
        Ok(Self {
            repo,
            repo_path: path.to_path_buf(),
        })
    }

    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    /// Every commit reachable from `HEAD`, newest first.
    ///
    /// An empty repository (unborn `HEAD`) has no history and yields an
    /// empty list. Messages are decoded per their `encoding` header; bytes
    /// that do not fit it are decoded lossily and the commit is flagged.
    #[instrument(skip(self), fields(path = %self.repo_path.display()))]
    pub fn raw_commits(&self) -> Result<Vec<RawCommit>, GitError> {
        if self.repo.is_empty()? {
            debug!("repository has no commits");
            return Ok(Vec::new());
        }

        let mut revwalk = self.repo.revwalk()?;
        revwalk.push_head()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;

        let mut commits = Vec::new();
        for oid_result in revwalk {
            let oid = oid_result?;
            let commit = self.repo.find_commit(oid)?;
            let sha = oid.to_string();
            let author = commit.author();
            let encoding = commit.message_encoding();
            let (full_message, message_undecodable) =
                match decode_text(commit.message_bytes(), encoding) {
                    Some(text) => (text, false),
                    None => {
                        warn!(sha = %sha, encoding = ?encoding, "commit message does not match its encoding");
                        (String::from_utf8_lossy(commit.message_bytes()).into_owned(), true)
                    }
                };
            let short_message = commit
                .summary_bytes()
                .map(|s| {
                    decode_text(s, encoding)
                        .unwrap_or_else(|| String::from_utf8_lossy(s).into_owned())
                })
                .unwrap_or_default();
            commits.push(RawCommit {
                time: signature_time(&sha, &author)?,
                author: raw_identity(&author),
                committer: Some(raw_identity(&commit.committer())),
                full_message,
                short_message,
                message_undecodable,
                identifier: sha,
            });
        }
        debug!(count = commits.len(), "collected commits");
        Ok(commits)
    }
}

/// Encoding labels decoded as ISO-8859-1, where every byte is one char.
const LATIN1_LABELS: [&str; 5] = ["iso-8859-1", "iso8859-1", "latin1", "latin-1", "l1"];

/// Decode message bytes per the commit's `encoding` header, UTF-8 when
/// absent. `None` if the bytes are not valid in that encoding.
fn decode_text(bytes: &[u8], encoding: Option<&str>) -> Option<String> {
    let latin1 = encoding
        .map(|e| e.trim().to_ascii_lowercase())
        .is_some_and(|e| LATIN1_LABELS.contains(&e.as_str()));
    if latin1 {
        return Some(bytes.iter().map(|&b| char::from(b)).collect());
    }
    std::str::from_utf8(bytes).ok().map(str::to_string)
}

fn raw_identity(signature: &Signature<'_>) -> RawIdentity {
    RawIdentity::new(
        String::from_utf8_lossy(signature.name_bytes()),
        String::from_utf8_lossy(signature.email_bytes()),
    )
}

/// The signature time in its own UTC offset.
fn signature_time(sha: &str, signature: &Signature<'_>) -> Result<DateTime<FixedOffset>, GitError> {
    let when = signature.when();
    let invalid = || GitError::InvalidTime {
        sha: sha.to_string(),
        seconds: when.seconds(),
        offset_minutes: when.offset_minutes(),
    };
    let offset = FixedOffset::east_opt(when.offset_minutes() * 60).ok_or_else(invalid)?;
    offset
        .timestamp_opt(when.seconds(), 0)
        .single()
        .ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::Time;

    fn commit(repo: &Repository, author: (&str, &str), message: &[u8], seconds: i64, offset: i32) {
        commit_with_encoding(repo, author, message, None, seconds, offset);
    }

    fn commit_with_encoding(
        repo: &Repository,
        author: (&str, &str),
        message: &[u8],
        encoding: Option<&str>,
        seconds: i64,
        offset: i32,
    ) {
        let time = Time::new(seconds, offset);
        let sig = Signature::new(author.0, author.1, &time).unwrap();
        let committer = Signature::new("Committer", "committer@example.com", &time).unwrap();
        let tree_id = repo.index().unwrap().write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        // git2 only takes &str messages; write raw bytes through the odb
        // when the message is not UTF-8 or carries an encoding header.
        match (std::str::from_utf8(message), encoding) {
            (Ok(msg), None) => {
                repo.commit(Some("HEAD"), &sig, &committer, msg, &tree, &parents)
                    .unwrap();
            }
            _ => {
                let buf = repo
                    .commit_create_buffer(&sig, &committer, "placeholder", &tree, &parents)
                    .unwrap();
                let headers = buf.as_str().unwrap().replace("\n\nplaceholder", "\n");
                let mut raw = headers.into_bytes();
                if let Some(encoding) = encoding {
                    raw.extend_from_slice(format!("encoding {}\n", encoding).as_bytes());
                }
                raw.push(b'\n');
                raw.extend_from_slice(message);
                let oid = repo.odb().unwrap().write(git2::ObjectType::Commit, &raw).unwrap();
                repo.reference("refs/heads/master", oid, true, "raw commit").unwrap();
                repo.set_head("refs/heads/master").unwrap();
            }
        }
    }

    #[test]
    fn test_raw_commits_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        commit(&repo, ("Ann", "ann@example.com"), b"First\n", 1_700_000_000, 60);
        commit(
            &repo,
            ("Bob", "bob@outside.com"),
            b"Second line one\n\nSigned-off-by: Bob <bob@outside.com>\n",
            1_700_000_100,
            -300,
        );

        let reader = HistoryReader::open(dir.path()).unwrap();
        let commits = reader.raw_commits().unwrap();
        assert_eq!(commits.len(), 2);

        let newest = &commits[0];
        assert_eq!(newest.author, RawIdentity::new("Bob", "bob@outside.com"));
        assert_eq!(newest.short_message, "Second line one");
        assert!(newest.full_message.contains("Signed-off-by: Bob"));
        assert!(!newest.message_undecodable);
        assert_eq!(newest.time.offset().local_minus_utc(), -300 * 60);
        assert_eq!(newest.time.timestamp(), 1_700_000_100);
        assert_eq!(
            newest.committer,
            Some(RawIdentity::new("Committer", "committer@example.com"))
        );
        assert_eq!(commits[1].short_message, "First");
    }

    #[test]
    fn test_non_utf8_message_is_flagged() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        commit(&repo, ("Ann", "ann@example.com"), b"Caf\xe9 fix\n", 1_700_000_000, 0);

        let commits = HistoryReader::open(dir.path()).unwrap().raw_commits().unwrap();
        assert_eq!(commits.len(), 1);
        assert!(commits[0].message_undecodable);
        assert!(commits[0].full_message.contains(char::REPLACEMENT_CHARACTER));
    }

    #[test]
    fn test_declared_latin1_message_is_decoded() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        commit_with_encoding(
            &repo,
            ("Ann", "ann@example.com"),
            b"Caf\xe9 fix\n\nSigned-off-by: Ren\xe9 <rene@outside.com>\n",
            Some("ISO-8859-1"),
            1_700_000_000,
            0,
        );

        let commits = HistoryReader::open(dir.path()).unwrap().raw_commits().unwrap();
        assert!(!commits[0].message_undecodable);
        assert_eq!(commits[0].short_message, "Caf\u{e9} fix");
        assert!(commits[0]
            .full_message
            .contains("Signed-off-by: Ren\u{e9} <rene@outside.com>"));
    }

    #[test]
    fn test_literal_replacement_character_is_not_flagged() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        commit(
            &repo,
            ("Ann", "ann@example.com"),
            "Render \u{FFFD} glyph\n".as_bytes(),
            1_700_000_000,
            0,
        );

        let commits = HistoryReader::open(dir.path()).unwrap().raw_commits().unwrap();
        assert!(!commits[0].message_undecodable);
    }

    #[test]
    fn test_decode_text() {
        assert_eq!(decode_text(b"plain", None).as_deref(), Some("plain"));
        assert_eq!(decode_text(b"\xff", None), None);
        assert_eq!(decode_text(b"\xff", Some("UTF-8")), None);
        assert_eq!(decode_text(b"\xe9", Some("latin1")).as_deref(), Some("\u{e9}"));
    }

    #[test]
    fn test_empty_repository_has_no_commits() {
        let dir = tempfile::tempdir().unwrap();
        Repository::init(dir.path()).unwrap();
        let commits = HistoryReader::open(dir.path()).unwrap().raw_commits().unwrap();
        assert!(commits.is_empty());
    }

    #[test]
    fn test_repo_not_found() {
        assert!(matches!(
            HistoryReader::open("/nonexistent"),
            Err(GitError::RepositoryNotFound(_))
        ));
    }
}
