//! Command-line interface for roster.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    AddCommand, ConfigCommand, DeleteCommand, KindArg, ListCommand, ReportCommand, ShowCommand,
};

/// roster - Keep track of crew, missions and vessels
///
/// Records are stored as flat text in a data directory. References between
/// records are rebuilt on every load; deleting a record tombstones every
/// reference to it.
#[derive(Debug, Parser)]
#[command(name = "roster")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Data directory (overrides the configuration)
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List records of one kind
    List(ListCommand),

    /// Show one record in full
    Show(ShowCommand),

    /// Add a record and save
    #[command(subcommand)]
    Add(AddCommand),

    /// Delete a record, tombstoning references to it, and save
    Delete(DeleteCommand),

    /// Print every live link between records
    Graph(ReportCommand),

    /// Reload the data directory and report problems
    Check(ReportCommand),

    /// Show record counts and storage location
    Status(ReportCommand),

    /// View configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Command {
    /// Whether the command changes stored records.
    #[must_use]
    pub fn is_mutating(&self) -> bool {
        matches!(self, Self::Add(_) | Self::Delete(_))
    }
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        crate::logging::Verbosity::from_flags(self.verbose, self.quiet)
    }
}
