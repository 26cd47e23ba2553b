//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Flight listing arguments.
#[derive(Debug, Args)]
pub struct FlightsCommand {
    /// Only flights departing from this location
    #[arg(long = "from", value_name = "SOURCE")]
    pub source: Option<String>,

    /// Only flights arriving at this location
    #[arg(long = "to", value_name = "DESTINATION")]
    pub destination: Option<String>,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Booking lookup arguments.
#[derive(Debug, Args)]
pub struct BookingCommand {
    /// Reservation code (PNR)
    pub pnr: u64,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flights_command_debug() {
        let cmd = FlightsCommand {
            source: Some("DEL".to_string()),
            destination: None,
            json: false,
        };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("DEL"));
    }

    #[test]
    fn test_booking_command_debug() {
        let cmd = BookingCommand {
            pnr: 1_000_000,
            json: true,
        };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("1000000"));
    }

    #[test]
    fn test_config_command_debug() {
        let cmd = ConfigCommand::Show { json: false };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("Show"));
    }
}
