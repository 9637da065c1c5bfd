use crate::{
    config::Config,
    hooks::HookRegistry,
    server::{HookServer, ServerError},
    shutdown::SignalShutdown,
    vcs::VcsRunner,
};
use log::{debug, warn};
use std::{sync::Arc, thread};
use thiserror::Error;

/// A custom error implementation for the start function
#[derive(Debug, Error)]
pub enum StartError {
    #[error("Server failed: {0}.")]
    FailedServer(#[from] ServerError),
}

/// Register the hooks, then serve triggers until a termination signal arrives.
///
/// The registry is complete before the server accepts the first request.
pub fn start(config: &Config, runner: Arc<dyn VcsRunner>) -> Result<(), StartError> {
    let registry = Arc::new(HookRegistry::build(config.hook_paths(), runner.as_ref()));
    if registry.is_empty() {
        warn!("There are no hooks registered, every trigger will be rejected.");
    }

    let server = HookServer::bind(&config.server.address())?;

    let shutdown = SignalShutdown::new(server.shutdown_handle());
    thread::spawn(move || shutdown.listen());

    server.serve(registry, runner);
    debug!("Finished running.");

    Ok(())
}
