use crate::{args::Args, MainError};
use log::{warn, Level, LevelFilter};
use simplelog::{
    format_description, Color, ColorChoice, ConfigBuilder, LevelPadding, TermLogger, TerminalMode,
};

// Use the same format as simple_logger
const TIMESTAMP_FORMAT_OFFSET: &[simplelog::FormatItem<'_>] = format_description!(
    "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3][offset_hour sign:mandatory]:[offset_minute]"
);

// Only our own records, the HTTP server and git wrappers stay quiet.
const LOG_TARGET: &str = "hooksync";

fn level_filter(quiet: bool, verbose: u8) -> LevelFilter {
    match (quiet, verbose) {
        (true, _) => LevelFilter::Error,
        (false, 0) => LevelFilter::Info,
        (false, 1) => LevelFilter::Debug,
        (false, _) => LevelFilter::Trace,
    }
}

/// Log to the terminal: errors and warnings to stderr, the rest to stdout.
///
/// Info shows the startup validation and every trigger, `-v` adds the request
/// bodies and pull output, `-vv` every git command that runs.
pub fn init_logger(args: &Args) -> Result<(), MainError> {
    TermLogger::init(
        level_filter(args.quiet, args.verbose),
        ConfigBuilder::new()
            .add_filter_allow_str(LOG_TARGET)
            .set_level_color(Level::Debug, Some(Color::Magenta))
            .set_level_color(Level::Trace, None)
            .set_level_padding(LevelPadding::Right)
            .set_target_level(LevelFilter::Off)
            .set_thread_level(LevelFilter::Off)
            .set_time_format_custom(TIMESTAMP_FORMAT_OFFSET)
            .set_time_offset_to_local()
            .map_err(|_| MainError::FailedLoggerTimezones)?
            .build(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )?;

    if !args.quiet && args.verbose > 2 {
        warn!("Git commands are already traced, it won't get more verbose than this.");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_should_map_the_flags_to_levels() {
        assert_eq!(LevelFilter::Info, level_filter(false, 0));
        assert_eq!(LevelFilter::Debug, level_filter(false, 1));
        assert_eq!(LevelFilter::Trace, level_filter(false, 2));
        assert_eq!(LevelFilter::Trace, level_filter(false, 5));
    }

    #[test]
    fn it_should_only_print_errors_when_quiet() {
        assert_eq!(LevelFilter::Error, level_filter(true, 0));
        assert_eq!(LevelFilter::Error, level_filter(true, 2));
    }
}
