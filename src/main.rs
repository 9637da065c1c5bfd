use args::{parse_args, Args};
use hooksync::{
    config::{Config, ConfigError},
    start::{start, StartError},
    vcs::process::ProcessRunner,
};
use log::debug;
use logger::init_logger;
use std::{path::Path, process, sync::Arc, time::Duration};
use thiserror::Error;

mod args;
mod logger;

const DEFAULT_CONFIG: &str = "config.json";

/// A custom error for describing the fatal errors of the binary
#[derive(Debug, Error)]
pub enum MainError {
    #[error("Configuration error - {0}.")]
    FailedConfig(#[from] ConfigError),
    #[error("{0}")]
    FailedStart(#[from] StartError),
    #[error("Cannot set up logging: {0}.")]
    FailedLogger(#[from] log::SetLoggerError),
    #[error("Cannot determine the local timezone offset for logging.")]
    FailedLoggerTimezones,
}

fn main_inner(args: Args) -> Result<(), MainError> {
    init_logger(&args)?;

    let path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG);
    let config = Config::load(Path::new(path))?;
    debug!("Loaded configuration from {path}.");

    let runner = match args.timeout.map(Duration::from).or(config.timeout()) {
        Some(timeout) => {
            debug!("Pulls are killed after {timeout:?}.");
            ProcessRunner::with_timeout(timeout)
        }
        None => ProcessRunner::new(),
    };

    start(&config, Arc::new(runner))?;

    Ok(())
}

fn main() {
    let args = parse_args();
    if args.version {
        println!("{}", env!("CARGO_PKG_VERSION"));
        return;
    }

    if let Err(err) = main_inner(args) {
        eprintln!("{err}");
        process::exit(1);
    }
}
