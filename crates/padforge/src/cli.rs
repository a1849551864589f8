use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;

#[derive(Debug, Subcommand, PartialEq)]
pub(crate) enum CacheCommand {
    /// Show what the profile cache holds.
    Info,
    /// Delete cached profiles.
    Clear {
        /// Only delete the entry with this cache key
        key: Option<String>,
    },
}

#[derive(Debug, Subcommand, PartialEq)]
pub(crate) enum Command {
    /// List the virtual device slots.
    Devices,
    /// Acquire a slot, sweep every declared control and release it.
    Probe {
        /// Slot id, 1 to 16
        slot: u8,
    },
    /// Print the default profile of an installation, extracting it if needed.
    Profile {
        /// Environment label of a configured installation
        environment: String,
        /// Write the document to a file instead of stdout
        #[clap(short, long)]
        output: Option<PathBuf>,
    },
    /// Inspect or clear the default profile cache.
    Cache {
        #[clap(subcommand)]
        command: CacheCommand,
    },
}

/// Virtual joystick slots and default control profiles.
#[derive(Parser)]
#[command(version, about, long_about = None)]
pub(crate) struct Cli {
    /// Turn debugging information on
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Path to the configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// The command to run
    #[clap(subcommand)]
    pub command: Command,
}
