use std::sync::atomic::{AtomicBool, Ordering};

/// A non-blocking lock that allows at most one pull per repository.
///
/// Acquiring never waits: if a pull is already running, the caller gets nothing
/// back and should drop its trigger instead of queueing it.
#[derive(Debug, Default)]
pub struct SyncGuard {
    busy: AtomicBool,
}

/// Proof of holding a [SyncGuard], it releases the guard when dropped.
#[derive(Debug)]
#[must_use = "the guard is released as soon as the permit is dropped"]
pub struct GuardPermit<'a> {
    guard: &'a SyncGuard,
}

impl SyncGuard {
    pub fn new() -> Self {
        SyncGuard {
            busy: AtomicBool::new(false),
        }
    }

    /// Try to acquire the guard, returns `None` immediately if it is already held.
    pub fn try_acquire(&self) -> Option<GuardPermit<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| GuardPermit { guard: self })
    }

    /// Returns true if a permit is currently held.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    fn release(&self) {
        self.busy.store(false, Ordering::Release);
    }
}

impl Drop for GuardPermit<'_> {
    fn drop(&mut self) {
        self.guard.release();
    }
}
