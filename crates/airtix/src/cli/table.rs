//! Fixed-width rendering of flights and bookings for the console.

use std::io::{self, Write};

use crate::booking::{BookingConfirmation, BookingDesk, BookingDetails, Cancellation};
use crate::model::Flight;
use crate::storage::{CollectionLoad, LoadStatus};

const TABLE_WIDTH: usize = 72;

fn rule(out: &mut impl Write, ch: char) -> io::Result<()> {
    writeln!(out, "{}", ch.to_string().repeat(TABLE_WIDTH))
}

/// Write a titled table of flights, or `empty_message` when there are none.
///
/// # Errors
///
/// Returns any error from the underlying writer.
pub fn write_flight_table<'a>(
    out: &mut impl Write,
    title: &str,
    flights: impl IntoIterator<Item = &'a Flight>,
    empty_message: &str,
) -> io::Result<()> {
    writeln!(out)?;
    rule(out, '=')?;
    writeln!(out, "{title:^TABLE_WIDTH$}")?;
    rule(out, '=')?;
    writeln!(
        out,
        "| {:<8} | {:<15} | {:<15} | {:<8} | {:<8} | {:<8} |",
        "ID", "Source", "Destination", "Capacity", "Avail", "Price"
    )?;
    rule(out, '-')?;

    let mut rows = 0;
    for flight in flights {
        writeln!(
            out,
            "| {:<8} | {:<15} | {:<15} | {:<8} | {:<8} | {:<8.2} |",
            flight.id,
            flight.source,
            flight.destination,
            flight.capacity,
            flight.available_seats,
            flight.price
        )?;
        rows += 1;
    }
    if rows == 0 {
        writeln!(out, "| {:<width$} |", empty_message, width = TABLE_WIDTH - 4)?;
    }

    rule(out, '=')
}

/// Write the confirmation printed after a successful booking.
///
/// # Errors
///
/// Returns any error from the underlying writer.
pub fn write_confirmation(out: &mut impl Write, confirmation: &BookingConfirmation) -> io::Result<()> {
    let stars = "*".repeat(48);
    writeln!(out)?;
    writeln!(out, "{stars}")?;
    writeln!(out, "SUCCESS: Ticket Booked!")?;
    writeln!(out, "PNR: {}", confirmation.code)?;
    writeln!(
        out,
        "Flight: {} ({} to {})",
        confirmation.flight_id, confirmation.source, confirmation.destination
    )?;
    writeln!(out, "Passenger: {}", confirmation.passenger_name)?;
    writeln!(out, "Seat: {}", confirmation.seat_number)?;
    writeln!(out, "Price: {:.2}", confirmation.price)?;
    writeln!(out, "{stars}")
}

/// Write the result of a cancellation.
///
/// # Errors
///
/// Returns any error from the underlying writer.
pub fn write_cancellation(out: &mut impl Write, cancellation: &Cancellation) -> io::Result<()> {
    writeln!(out)?;
    writeln!(
        out,
        "SUCCESS: Ticket with PNR {} has been successfully cancelled.",
        cancellation.ticket.code
    )?;
    if let Some(restored) = &cancellation.restored {
        writeln!(
            out,
            "Flight {} seat restored. Available seats: {}.",
            restored.flight_id, restored.available_seats
        )?;
    }
    Ok(())
}

/// Write the details of a single booking.
///
/// # Errors
///
/// Returns any error from the underlying writer.
pub fn write_booking_details(out: &mut impl Write, details: &BookingDetails) -> io::Result<()> {
    let ticket = &details.ticket;
    writeln!(out)?;
    writeln!(out, "--- Booking Details for PNR {} ---", ticket.code)?;
    writeln!(out, "Passenger Name: {}", ticket.passenger_name)?;
    writeln!(out, "Flight ID: {}", ticket.flight_id)?;
    writeln!(out, "Seat Number: {}", ticket.seat_number)?;
    match &details.route {
        Some(route) => {
            writeln!(out, "Route: {} -> {}", route.source, route.destination)?;
            writeln!(out, "Ticket Price: {:.2}", route.price)?;
        }
        None => writeln!(out, "Warning: Flight details are unavailable for this booking.")?,
    }
    writeln!(out, "{}", "-".repeat(39))
}

/// Write the lines shown when the console starts: what data was found and
/// where the reservation counter stands.
///
/// # Errors
///
/// Returns any error from the underlying writer.
pub fn write_startup_status(
    out: &mut impl Write,
    status: LoadStatus,
    counter: &CollectionLoad,
    desk: &BookingDesk,
) -> io::Result<()> {
    writeln!(out, "--- Initializing System ---")?;
    match status {
        LoadStatus::Loaded => writeln!(
            out,
            "Status: Data loaded successfully. ({} flights, {} tickets)",
            desk.flights().len(),
            desk.tickets().len()
        )?,
        LoadStatus::NoExistingData => writeln!(
            out,
            "Status: No existing flight/ticket data found. Starting with fresh data."
        )?,
    }
    match counter {
        CollectionLoad::Loaded { .. } => writeln!(
            out,
            "Status: PNR counter loaded. Next PNR will be {}.",
            desk.next_code()
        ),
        CollectionLoad::Missing => writeln!(
            out,
            "Warning: PNR counter file not found. Next PNR will be {}.",
            desk.next_code()
        ),
        CollectionLoad::Discarded(_) => writeln!(
            out,
            "Warning: Error reading PNR counter file. Resetting PNR; next PNR will be {}.",
            desk.next_code()
        ),
    }
}
