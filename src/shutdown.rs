use crate::server::ShutdownHandle;
use log::debug;
use std::sync::atomic::AtomicU8;

/// Stops the server on a termination signal.
///
/// The first signal stops accepting triggers and lets the running pulls finish,
/// so no working copy is left in the middle of a merge. The second signal exits right away.
pub struct SignalShutdown {
    signal_count: AtomicU8,
    handle: ShutdownHandle,
}

impl SignalShutdown {
    pub fn new(handle: ShutdownHandle) -> Self {
        SignalShutdown {
            signal_count: AtomicU8::new(0),
            handle,
        }
    }

    #[cfg(unix)]
    fn listen_inner<I>(&self, signals: I)
    where
        I: IntoIterator<Item = i32>,
    {
        use std::{process, sync::atomic::Ordering, thread::sleep, time::Duration};
        for signal in signals.into_iter() {
            let previous = self.signal_count.fetch_add(1, Ordering::Acquire);
            if previous == 0 {
                debug!("Got signal {signal}, terminating after all pulls finished.");
                self.handle.shutdown();
            } else {
                // Allow a little time for the clean shutdown to still happen.
                sleep(Duration::from_millis(100));
                debug!("Got signal {signal}, terminating right now.");
                process::exit(signal);
            }
        }
    }

    /// Block the current thread and wait for termination signals.
    #[cfg(unix)]
    pub fn listen(&self) {
        use log::warn;
        use signal_hook::{
            consts::TERM_SIGNALS,
            iterator::{exfiltrator::SignalOnly, SignalsInfo},
        };
        match SignalsInfo::<SignalOnly>::new(TERM_SIGNALS) {
            Ok(mut signals) => self.listen_inner(&mut signals),
            Err(err) => warn!("Failed setting up signal handler: {err}."),
        }
    }

    #[cfg(not(unix))]
    pub fn listen(&self) {
        debug!("Signal handlers are not supported on non-unix systems.");
    }
}
