//! `airtix` - CLI for the airline booking desk
//!
//! Runs the interactive booking menu by default; the subcommands give
//! read-only access to the saved flights and bookings.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::io::{self, Write};

use clap::Parser;
use tracing::debug;

use airtix::cli::table::{write_booking_details, write_flight_table, write_startup_status};
use airtix::cli::{
    to_json, BookingCommand, Cli, Command, ConfigCommand, FlightsCommand, SessionEnd, Shell,
};
use airtix::storage::CollectionLoad;
use airtix::{init_logging, BookingDesk, Config, LoadStatus, LoadedState, Storage};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone())?;

    if let Command::Config(config_cmd) = cli.command_or_default() {
        return handle_config(&config, config_cmd);
    }

    let storage = Storage::from_config(&config);
    let state = storage.load_all(config.reservations.base_code);

    match cli.command_or_default() {
        Command::Shell => run_shell(&config, &storage, state),
        Command::Flights(cmd) => handle_flights(&BookingDesk::restore(state, &config.limits), cmd),
        Command::Booking(cmd) => handle_booking(&BookingDesk::restore(state, &config.limits), cmd),
        Command::Status(cmd) => handle_status(&config, &storage, state, cmd.json),
        Command::Config(_) => Ok(()),
    }
}

fn run_shell(config: &Config, storage: &Storage, mut state: LoadedState) -> anyhow::Result<()> {
    let status = state.status();
    let counter = std::mem::replace(&mut state.counter_outcome, CollectionLoad::Missing);
    let mut desk = BookingDesk::restore(state, &config.limits);

    let mut out = io::stdout().lock();
    write_startup_status(&mut out, status, &counter, &desk)?;
    out.flush()?;
    drop(out);

    let end = Shell::new(&mut desk, storage, io::stdin().lock(), io::stdout().lock()).run()?;
    if let SessionEnd::Saved(report) = end {
        // Save failures were already shown on the console; exit normally.
        if let Err(err) = report.into_result() {
            debug!("Session ended with {} in {}", err, config.data_dir().display());
        }
    }
    Ok(())
}

fn handle_flights(desk: &BookingDesk, cmd: &FlightsCommand) -> anyhow::Result<()> {
    let flights: Vec<_> = desk
        .search_flights(cmd.source.as_deref(), cmd.destination.as_deref())
        .collect();

    if cmd.json {
        println!("{}", to_json(&flights)?);
    } else {
        let title = if cmd.source.is_some() || cmd.destination.is_some() {
            "SEARCH RESULTS"
        } else {
            "ALL FLIGHTS"
        };
        let mut out = io::stdout().lock();
        write_flight_table(&mut out, title, flights, "No flights found.")?;
        out.flush()?;
    }
    Ok(())
}

fn handle_booking(desk: &BookingDesk, cmd: &BookingCommand) -> anyhow::Result<()> {
    let details = desk.view_booking(cmd.pnr)?;

    if cmd.json {
        println!("{}", to_json(&details)?);
    } else {
        let mut out = io::stdout().lock();
        write_booking_details(&mut out, &details)?;
        out.flush()?;
    }
    Ok(())
}

fn handle_status(
    config: &Config,
    storage: &Storage,
    state: LoadedState,
    json: bool,
) -> anyhow::Result<()> {
    let status = match state.status() {
        LoadStatus::Loaded => "loaded",
        LoadStatus::NoExistingData => "no_existing_data",
    };
    let saved_at = state.saved_at;
    let warnings: Vec<String> = state.warnings().map(ToString::to_string).collect();
    let desk = BookingDesk::restore(state, &config.limits);

    if json {
        let status = serde_json::json!({
            "status": status,
            "data_dir": config.data_dir(),
            "flight_file": storage.flight_path(),
            "ticket_file": storage.ticket_path(),
            "counter_file": storage.counter_path(),
            "flights": desk.flights().len(),
            "tickets": desk.tickets().len(),
            "next_pnr": desk.next_code(),
            "saved_at": saved_at.map(|t| t.to_rfc3339()),
            "warnings": warnings,
        });
        println!("{}", to_json(&status)?);
    } else {
        println!("airtix status");
        println!("-------------");
        println!("Data:          {status}");
        println!("Flight file:   {}", storage.flight_path().display());
        println!("Ticket file:   {}", storage.ticket_path().display());
        println!("Counter file:  {}", storage.counter_path().display());
        println!("Flights:       {}", desk.flights().len());
        println!("Tickets:       {}", desk.tickets().len());
        println!("Next PNR:      {}", desk.next_code());
        match saved_at {
            Some(t) => println!("Last saved:    {}", t.format("%Y-%m-%d %H:%M:%S UTC")),
            None => println!("Last saved:    never"),
        }
        for warning in &warnings {
            println!("Warning:       {warning}");
        }
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: &ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if *json {
                println!("{}", to_json(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Data directory:     {}", config.data_dir().display());
                println!("  Flight file:        {}", config.storage.flight_file);
                println!("  Ticket file:        {}", config.storage.ticket_file);
                println!("  Counter file:       {}", config.storage.counter_file);
                println!();
                println!("[Limits]");
                println!("  Max flights:        {}", format_limit(config.limits.max_flights));
                println!("  Max tickets:        {}", format_limit(config.limits.max_tickets));
                println!();
                println!("[Reservations]");
                println!("  Base code:          {}", config.reservations.base_code);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.clone().unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}

fn format_limit(limit: usize) -> String {
    if limit == 0 {
        "unlimited".to_string()
    } else {
        limit.to_string()
    }
}
