use crate::vcs::VcsRunner;
use std::{fmt, path::Path};

/// Git commands resolving the state of a working copy and pulling it.
pub mod git;

/// A snapshot of what could be resolved about a repository.
///
/// Every field is resolved independently and may be missing, a new snapshot
/// is created on every resolution instead of updating an old one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoState {
    /// The checked out branch, missing on a detached HEAD.
    pub active_branch: Option<String>,
    /// The upstream tracking reference in the format `<remote>/<branch>`.
    pub upstream_ref: Option<String>,
    /// The URL of the upstream's remote.
    pub remote_url: Option<String>,
}

impl RepoState {
    /// Resolve every field of the repository state.
    pub fn resolve(runner: &dyn VcsRunner, path: &Path) -> Self {
        let active_branch = git::resolve_active_branch(runner, path);
        let upstream_ref = git::resolve_upstream(runner, path);
        let remote_url = upstream_ref
            .as_deref()
            .and_then(|upstream| git::resolve_remote_url_of(runner, path, upstream));

        RepoState {
            active_branch,
            upstream_ref,
            remote_url,
        }
    }

    /// The remote name derived from the upstream reference.
    pub fn remote_name(&self) -> Option<&str> {
        self.upstream_ref.as_deref().map(git::remote_name)
    }
}

impl fmt::Display for RepoState {
    /// Formats as `branch -> remote_url:upstream`, missing values are shown as `<none>`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |value: &Option<String>| value.clone().unwrap_or_else(|| String::from("<none>"));
        write!(
            f,
            "{} -> {}:{}",
            show(&self.active_branch),
            show(&self.remote_url),
            show(&self.upstream_ref)
        )
    }
}
