mod cmd;
mod config;
mod logging;

use std::process::ExitCode;

use anyhow::{Result, bail};
use clap::{Arg, ArgMatches, Command};
use tracing::error;

use crate::config::DEFAULT_CONFIG_FILE;

fn cli() -> Command {
    let command = Command::new("almanac")
        .about("A personal wiki built from a directory of markdown files")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("content-dir")
                .short('d')
                .long("content-dir")
                .value_name("DIR")
                .help("Directory containing the markdown pages")
                .global(true),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file")
                .default_value(DEFAULT_CONFIG_FILE)
                .global(true),
        );

    logging::add_logging_args(command)
        .subcommand(cmd::output::make_subcommand())
        .subcommand(cmd::serve::make_subcommand())
        .subcommand(cmd::render::make_subcommand())
}

fn run(matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("output", args)) => cmd::output::execute(args),
        Some(("serve", args)) => cmd::serve::execute(args),
        Some(("render", args)) => cmd::render::execute(args),
        Some((name, _)) => bail!("Unknown command {name}"),
        None => bail!("No command given"),
    }
}

fn main() -> ExitCode {
    let matches = cli().get_matches();

    if let Err(e) = logging::init(&matches) {
        eprintln!("{e:#}");
        return ExitCode::FAILURE;
    }

    match run(&matches) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
