use crate::vcs::{CapturedOutput, VcsError, VcsRunner};
use log::debug;
use std::path::Path;

const GIT: &str = "git";
const ACTIVE_BRANCH_ARGS: &[&str] = &["rev-parse", "--abbrev-ref", "HEAD"];
const UPSTREAM_ARGS: &[&str] = &["rev-parse", "--abbrev-ref", "--symbolic-full-name", "@{u}"];
const PULL_ARGS: &[&str] = &["pull"];

// Git prints the literal HEAD instead of a branch name on a detached HEAD.
const DETACHED_HEAD: &str = "HEAD";

fn read_non_empty(runner: &dyn VcsRunner, path: &Path, args: &[&str]) -> Option<String> {
    match runner.run(path, GIT, args) {
        Ok(CapturedOutput { stdout, .. }) if !stdout.is_empty() => Some(stdout),
        Ok(_) => None,
        Err(err) => {
            debug!("Running git {} in {} failed: {err}.", args.join(" "), path.display());
            None
        }
    }
}

/// Resolve the name of the checked out branch (e.g. `main`).
///
/// Returns `None` if the repository is on a detached HEAD or cannot be resolved.
pub fn resolve_active_branch(runner: &dyn VcsRunner, path: &Path) -> Option<String> {
    read_non_empty(runner, path, ACTIVE_BRANCH_ARGS).filter(|branch| branch != DETACHED_HEAD)
}

/// Resolve the upstream tracking reference of HEAD (e.g. `origin/main`).
///
/// Returns `None` if there is no upstream configured.
pub fn resolve_upstream(runner: &dyn VcsRunner, path: &Path) -> Option<String> {
    read_non_empty(runner, path, UPSTREAM_ARGS)
}

/// The remote name is everything before the first `/` of the upstream reference.
pub fn remote_name(upstream: &str) -> &str {
    upstream
        .split_once('/')
        .map_or(upstream, |(remote, _)| remote)
}

/// Resolve the URL of the remote that an upstream reference points to.
pub fn resolve_remote_url_of(
    runner: &dyn VcsRunner,
    path: &Path,
    upstream: &str,
) -> Option<String> {
    let key = format!("remote.{}.url", remote_name(upstream));
    read_non_empty(runner, path, &["config", "--get", key.as_str()])
}

/// Resolve the URL of the upstream's remote.
///
/// If there is no upstream, the remote is never queried.
pub fn resolve_remote_url(runner: &dyn VcsRunner, path: &Path) -> Option<String> {
    let upstream = resolve_upstream(runner, path)?;
    resolve_remote_url_of(runner, path, &upstream)
}

/// Fetch and merge the upstream into the checked out branch.
pub fn pull(runner: &dyn VcsRunner, path: &Path) -> Result<CapturedOutput, VcsError> {
    runner.run(path, GIT, PULL_ARGS)
}
