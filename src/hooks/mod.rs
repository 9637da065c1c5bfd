use crate::{
    repository::{git::resolve_active_branch, RepoState},
    vcs::VcsRunner,
};
use log::{error, info, warn};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{Arc, RwLock},
};

/// A lock that makes sure that only one pull is running per repository.
pub mod guard;

use guard::SyncGuard;

/// The prefix of the route of every hook.
pub const HOOKS_PREFIX: &str = "/hooks/";

/// A configured binding between a hook id and a local repository.
///
/// The id and the guard belong to the entry for its whole life, only the cached
/// repository state changes.
#[derive(Debug)]
pub struct HookEntry {
    id: String,
    path: PathBuf,
    guard: SyncGuard,
    last_state: RwLock<Option<RepoState>>,
}

impl HookEntry {
    pub fn new(id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        HookEntry {
            id: id.into(),
            path: path.into(),
            guard: SyncGuard::new(),
            last_state: RwLock::new(None),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn guard(&self) -> &SyncGuard {
        &self.guard
    }

    /// The URL path which triggers this hook.
    pub fn route(&self) -> String {
        format!("{HOOKS_PREFIX}{}", self.id)
    }

    /// The last resolved state of the repository, if it was ever resolved.
    pub fn last_state(&self) -> Option<RepoState> {
        self.last_state.read().ok().and_then(|state| state.clone())
    }

    /// Resolve the repository state again and cache it on the entry.
    pub fn refresh_state(&self, runner: &dyn VcsRunner) -> RepoState {
        let state = RepoState::resolve(runner, &self.path);
        match self.last_state.write() {
            Ok(mut last_state) => *last_state = Some(state.clone()),
            Err(_) => warn!("Cannot cache the state of {}.", self.id),
        }
        state
    }
}

/// The hooks that can be triggered, keyed by their id.
///
/// It is built once before the server starts and never changes after,
/// so it can be read from every request without locking.
#[derive(Debug, Default)]
pub struct HookRegistry {
    entries: HashMap<String, Arc<HookEntry>>,
}

impl HookRegistry {
    /// Validate and register every hook.
    ///
    /// Hooks which are not on a branch (or are not repositories at all) are skipped
    /// with an error, the others are logged with their resolved state.
    pub fn build<I, S, P>(hooks: I, runner: &dyn VcsRunner) -> Self
    where
        I: IntoIterator<Item = (S, P)>,
        S: Into<String>,
        P: Into<PathBuf>,
    {
        let mut entries = HashMap::new();
        for (id, path) in hooks {
            let entry = HookEntry::new(id, path);

            if resolve_active_branch(runner, entry.path()).is_none() {
                error!(
                    "could not resolve active branch for {}; hook {} will be skipped.",
                    entry.path().display(),
                    entry.id()
                );
                continue;
            }

            let state = entry.refresh_state(runner);
            info!("[{}] {}:{state}", entry.route(), entry.path().display());

            entries.insert(entry.id.clone(), Arc::new(entry));
        }

        HookRegistry { entries }
    }

    pub fn get(&self, id: &str) -> Option<Arc<HookEntry>> {
        self.entries.get(id).cloned()
    }

    /// Find the hook which is triggered by a URL path (e.g. `/hooks/deploy`).
    pub fn find_by_route(&self, route: &str) -> Option<Arc<HookEntry>> {
        route
            .strip_prefix(HOOKS_PREFIX)
            .and_then(|id| self.get(id))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
