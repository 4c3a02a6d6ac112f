use std::io::IsTerminal;

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub const LOG_LEVELS: [&str; 4] = ["debug", "info", "warn", "error"];

/// Logging flags shared by every subcommand.
pub fn add_logging_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .help("Minimum level to log; RUST_LOG takes precedence when set")
                .value_parser(LOG_LEVELS)
                .default_value("info")
                .global(true),
        )
        .arg(
            Arg::new("enable-rich-logs")
                .long("enable-rich-logs")
                .help("Human-readable log output even when stderr is not a terminal")
                .action(ArgAction::SetTrue)
                .conflicts_with("disable-rich-logs")
                .global(true),
        )
        .arg(
            Arg::new("disable-rich-logs")
                .long("disable-rich-logs")
                .help("JSON log output even when stderr is a terminal")
                .action(ArgAction::SetTrue)
                .global(true),
        )
}

/// Installs the global subscriber: compact coloured lines on a terminal,
/// JSON otherwise.
pub fn init(args: &ArgMatches) -> Result<()> {
    let level = args
        .get_one::<String>("log-level")
        .map(String::as_str)
        .unwrap_or("info");

    let filter = match std::env::var_os(EnvFilter::DEFAULT_ENV) {
        Some(_) => EnvFilter::try_from_default_env().context("Invalid RUST_LOG")?,
        None => EnvFilter::try_new(level).context("Invalid log level")?,
    };

    let rich = rich_output(
        args.get_flag("enable-rich-logs"),
        args.get_flag("disable-rich-logs"),
        std::io::stderr().is_terminal(),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(rich.then(|| fmt::layer().compact().with_writer(std::io::stderr)))
        .with((!rich).then(|| fmt::layer().json().with_writer(std::io::stderr)))
        .try_init()
        .context("Failed to install logger")?;

    Ok(())
}

fn rich_output(enable: bool, disable: bool, terminal: bool) -> bool {
    if disable {
        false
    } else {
        enable || terminal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> Command {
        add_logging_args(Command::new("test")).subcommand(Command::new("sub"))
    }

    #[test]
    fn test_rich_output() {
        assert!(rich_output(false, false, true));
        assert!(!rich_output(false, false, false));
        assert!(rich_output(true, false, false));
        assert!(!rich_output(false, true, true));
    }

    #[test]
    fn test_unknown_level_is_rejected() {
        assert!(app().try_get_matches_from(["test", "--log-level", "loud"]).is_err());
    }

    #[test]
    fn test_flags_are_global() {
        let matches = app()
            .try_get_matches_from(["test", "sub", "--log-level", "warn", "--enable-rich-logs"])
            .unwrap();
        let (_, sub) = matches.subcommand().unwrap();
        assert_eq!(sub.get_one::<String>("log-level").unwrap(), "warn");
        assert!(sub.get_flag("enable-rich-logs"));
    }

    #[test]
    fn test_rich_flags_conflict() {
        assert!(
            app()
                .try_get_matches_from(["test", "--enable-rich-logs", "--disable-rich-logs"])
                .is_err()
        );
    }
}
