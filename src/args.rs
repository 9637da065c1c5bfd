use duration_string::DurationString;
use gumdrop::Options;

/// Pull local git repositories when their webhooks are triggered.
#[derive(Debug, Options)]
pub struct Args {
    /// The JSON configuration file with the hooks (defaults to config.json).
    #[options(free)]
    pub config: Option<String>,

    /// Kill pulls which are running longer than this, overrides the configuration.
    ///
    /// Can be a number postfixed with s(econd), m(inutes), h(ours), d(ays)
    #[options(no_short)]
    pub timeout: Option<DurationString>,

    /// Increase verbosity, can be set multiple times (-v debug, -vv tracing)
    #[options(count)]
    pub verbose: u8,

    /// Only print error messages.
    #[options()]
    pub quiet: bool,

    /// Print the current version.
    #[options(short = "V")]
    pub version: bool,

    /// Print this help.
    #[options()]
    pub help: bool,
}

pub fn parse_args() -> Args {
    Args::parse_args_default_or_exit()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn it_should_parse_the_config_path_and_timeout() {
        let args = Args::parse_args_default(&["hooks.json", "--timeout", "30s", "-vv"]).unwrap();

        assert_eq!(Some(String::from("hooks.json")), args.config);
        assert_eq!(Some(Duration::from_secs(30)), args.timeout.map(Duration::from));
        assert_eq!(2, args.verbose);
        assert!(!args.quiet);
    }

    #[test]
    fn it_should_default_to_nothing() {
        let args = Args::parse_args_default::<&str>(&[]).unwrap();

        assert_eq!(None, args.config);
        assert!(args.timeout.is_none());
        assert_eq!(0, args.verbose);
    }
}
