//! Naming of scanned repositories and links to their commits.
//!
//! Repositories hosted on GitHub are named `<org>/<name>` after their web
//! URL. Local clones without a URL fall back to `local/<path>`, with the
//! path components joined by `_` so that clones sharing a directory name
//! still get distinct report files.

use std::path::{Component, Path};

use serde::Serialize;

use crate::config::RepositoryTarget;

const GITHUB_PREFIX: &str = "https://github.com/";

/// Owner and name of a repository, used to place its report file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryName {
    pub org: String,
    pub name: String,
}

impl RepositoryName {
    /// Parse `https://github.com/<org>/<name>` (optional `.git` or `/`).
    pub fn from_url(url: &str) -> Option<Self> {
        let rest = url.trim().strip_prefix(GITHUB_PREFIX)?;
        let rest = trim_repo_suffix(rest);
        let mut parts = rest.split('/');
        let org = parts.next().filter(|s| !s.is_empty())?;
        let name = parts.next().filter(|s| !s.is_empty())?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self {
            org: org.to_string(),
            name: name.to_string(),
        })
    }

    /// Name a local clone after its whole path: `/srv/git/tool` becomes
    /// `local/srv_git_tool`.
    pub fn from_path(path: &Path) -> Self {
        let parts: Vec<String> = path
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(sanitize(&part.to_string_lossy())),
                Component::ParentDir => Some("..".to_string()),
                _ => None,
            })
            .collect();
        let name = if parts.is_empty() {
            "repository".to_string()
        } else {
            parts.join("_")
        };
        Self {
            org: "local".to_string(),
            name,
        }
    }

    /// URL-derived name when possible, directory-derived otherwise.
    pub fn for_target(target: &RepositoryTarget) -> Self {
        target
            .url
            .as_deref()
            .and_then(Self::from_url)
            .unwrap_or_else(|| Self::from_path(&target.path))
    }
}

/// Link to a commit: `<url>/commit/<sha>` for repositories with a web URL,
/// `<path>@<sha>` for plain local clones.
pub fn commit_link(target: &RepositoryTarget, sha: &str) -> String {
    match target.url.as_deref() {
        Some(url) => format!("{}/commit/{}", trim_repo_suffix(url.trim()), sha),
        None => format!("{}@{}", target.path.display(), sha),
    }
}

fn sanitize(part: &str) -> String {
    part.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn trim_repo_suffix(url: &str) -> &str {
    let url = url.trim_end_matches('/');
    url.strip_suffix(".git").unwrap_or(url)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn target(path: &str, url: Option<&str>) -> RepositoryTarget {
        RepositoryTarget {
            path: PathBuf::from(path),
            url: url.map(str::to_string),
        }
    }

    #[test]
    fn test_github_url() {
        let expected = RepositoryName {
            org: "hiero-ledger".into(),
            name: "hiero-sdk-tck".into(),
        };
        assert_eq!(
            RepositoryName::from_url("https://github.com/hiero-ledger/hiero-sdk-tck"),
            Some(expected.clone())
        );
        assert_eq!(
            RepositoryName::from_url("https://github.com/hiero-ledger/hiero-sdk-tck.git"),
            Some(expected.clone())
        );
        assert_eq!(
            RepositoryName::from_url("https://github.com/hiero-ledger/hiero-sdk-tck/"),
            Some(expected)
        );
    }

    #[test]
    fn test_non_github_url() {
        assert_eq!(RepositoryName::from_url("https://gitlab.com/a/b"), None);
        assert_eq!(RepositoryName::from_url("https://github.com/only-org"), None);
        assert_eq!(RepositoryName::from_url("https://github.com/a/b/tree/main"), None);
    }

    #[test]
    fn test_local_fallback() {
        let name = RepositoryName::for_target(&target("/srv/git/tool", None));
        assert_eq!(name.org, "local");
        assert_eq!(name.name, "srv_git_tool");

        let name = RepositoryName::for_target(&target("/srv/git/tool", Some("https://example.com/x")));
        assert_eq!(name.org, "local");

        let name = RepositoryName::from_path(Path::new("/home/me/my repo"));
        assert_eq!(name.name, "home_me_my_repo");
        assert_eq!(RepositoryName::from_path(Path::new("/")).name, "repository");
    }

    #[test]
    fn test_local_clones_with_same_dir_name_are_distinct() {
        let a = RepositoryName::for_target(&target("/a/project", None));
        let b = RepositoryName::for_target(&target("/b/project", None));
        assert_ne!(a, b);
        assert_eq!(a.name, "a_project");
        assert_eq!(b.name, "b_project");
    }

    #[test]
    fn test_commit_link() {
        assert_eq!(
            commit_link(&target("/tmp/r", Some("https://github.com/o/r.git")), "abc"),
            "https://github.com/o/r/commit/abc"
        );
        assert_eq!(commit_link(&target("/tmp/r", None), "abc"), "/tmp/r@abc");
    }
}
