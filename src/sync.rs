use crate::{
    hooks::HookEntry,
    repository::git,
    vcs::{CapturedOutput, VcsError, VcsRunner},
};
use log::{debug, error, info, warn};
use time::OffsetDateTime;

/// How a single pull attempt ended.
#[derive(Debug)]
pub enum SyncOutcome {
    /// The pull finished, the parameter is its output.
    Success(CapturedOutput),
    /// The pull failed, the repository is left as the failed command left it.
    VcsFailure(VcsError),
    /// Another pull was already running on the repository, this trigger was dropped.
    GuardBusy,
}

/// The result of one trigger of a hook.
#[derive(Debug)]
pub struct SyncResult {
    pub hook_id: String,
    pub timestamp: OffsetDateTime,
    pub outcome: SyncOutcome,
}

impl SyncResult {
    fn new(hook_id: &str, outcome: SyncOutcome) -> Self {
        SyncResult {
            hook_id: hook_id.to_string(),
            timestamp: OffsetDateTime::now_utc(),
            outcome,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, SyncOutcome::Success(_))
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.outcome, SyncOutcome::GuardBusy)
    }
}

/// Pull the repository of the hook, unless it is already being pulled.
///
/// The guard is checked before anything is spawned and it is released when this
/// function returns, whichever way the pull ended.
pub fn sync_hook(entry: &HookEntry, runner: &dyn VcsRunner) -> SyncResult {
    let Some(_permit) = entry.guard().try_acquire() else {
        return SyncResult::new(entry.id(), SyncOutcome::GuardBusy);
    };

    info!("Executing git pull for {}.", entry.path().display());
    let outcome = match git::pull(runner, entry.path()) {
        Ok(output) => {
            let state = entry.refresh_state(runner);
            debug!("[{}] {}:{state}", entry.route(), entry.path().display());
            SyncOutcome::Success(output)
        }
        Err(err) => SyncOutcome::VcsFailure(err),
    };

    SyncResult::new(entry.id(), outcome)
}

/// Write the result of a sync to the log.
pub fn report(result: &SyncResult) {
    let SyncResult {
        hook_id,
        timestamp,
        outcome,
    } = result;
    match outcome {
        SyncOutcome::Success(output) => {
            info!("Pulled hook {hook_id} at {timestamp}.");
            output
                .stdout
                .lines()
                .chain(output.stderr.lines())
                .for_each(|line| debug!("{line}"));
        }
        SyncOutcome::VcsFailure(err) => {
            error!("Pulling hook {hook_id} failed at {timestamp}: {err}.");
        }
        SyncOutcome::GuardBusy => {
            warn!("Hook {hook_id} is already pulling, trigger at {timestamp} is dropped.");
        }
    }
}
