//! Command-line interface for airtix.
//!
//! This module provides the `clap` structure of the `airtix` binary and the
//! interactive console it runs by default.

mod commands;
pub mod prompt;
pub mod shell;
pub mod table;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;

pub use commands::{BookingCommand, ConfigCommand, FlightsCommand, StatusCommand};
pub use shell::{SessionEnd, Shell};

use crate::error::Result;
use crate::logging::Verbosity;

/// airtix - Airline flight and ticket booking desk
///
/// Manages flights and passenger bookings from an interactive menu and keeps
/// them in binary data files between sessions.
#[derive(Debug, Parser)]
#[command(name = "airtix")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute (defaults to the interactive shell)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the interactive booking menu
    Shell,

    /// List flights, optionally filtered by route
    Flights(FlightsCommand),

    /// Show a booking by reservation code
    Booking(BookingCommand),

    /// Show data files and record counts
    Status(StatusCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.verbose, self.quiet)
    }

    /// The command to run, falling back to the interactive shell.
    #[must_use]
    pub fn command_or_default(&self) -> &Command {
        self.command.as_ref().unwrap_or(&Command::Shell)
    }
}

/// Render a value as pretty-printed JSON.
///
/// # Errors
///
/// Returns [`crate::Error::Json`] if the value cannot be serialized.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}
