mod cli;
mod config;
mod devices;
mod error;
mod logging;
mod profile;

use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;

use crate::cli::{CacheCommand, Cli, Command};
use crate::config::Config;
use crate::error::CliError;

fn run(cli: Cli) -> Result<(), CliError> {
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Command::Devices => devices::list(config.driver()?),
        Command::Probe { slot } => devices::probe(config.driver()?, slot),
        Command::Profile {
            environment,
            output,
        } => {
            let installation = config.installation(&environment)?;
            profile::show(profile::store(&config)?, &installation, output.as_deref())
        }
        Command::Cache { command } => {
            let store = profile::store(&config)?;
            match command {
                CacheCommand::Info => {
                    profile::info(&store);
                    Ok(())
                }
                CacheCommand::Clear { key } => profile::clear(&store, key.as_deref()),
            }
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::setup(cli.verbose, cli.no_color);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            print_error!("{e}");
            ExitCode::FAILURE
        }
    }
}
