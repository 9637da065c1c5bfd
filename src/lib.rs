//! Pull local git repositories when their webhooks are triggered.
//!
//! ## How it works
//!
//! Every configured **hook** binds an id to a local working copy. At startup
//! the hooks are validated and collected in a read-only **registry**, then an
//! HTTP server exposes `POST /hooks/<id>` for each of them. A trigger is
//! acknowledged right away and the repository is **synced** in the background:
//! the hook's **guard** is acquired, `git pull` runs, and the result is logged.
//! A trigger that arrives while the same repository is still pulling is dropped.
//!
//! ```ignore
//! +---------+       +----------+       +-------+       +----------+
//! | trigger | ----> | registry | ----> | guard | ----> | git pull |
//! +---------+       +----------+       +-------+       +----------+
//! ```
//!

/// The JSON configuration with the hooks and the server address.
pub mod config;
/// The hooks and the registry built from them at startup.
pub mod hooks;
/// Resolving branch, upstream and remote of a working copy.
pub mod repository;
/// The HTTP server that accepts the triggers.
pub mod server;
/// Stopping the server on termination signals.
pub mod shutdown;
/// Wiring the registry, the server and the signal handler together.
pub mod start;
/// Pulling a hook's repository, guarded against overlapping pulls.
pub mod sync;
/// Running version-control commands (e.g. [running processes](vcs::process::ProcessRunner)).
pub mod vcs;
