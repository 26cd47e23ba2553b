//! Core record types for airtix.
//!
//! A [`Flight`] is a route with a fixed number of seats and a price. A
//! [`Ticket`] is one passenger's booking on a flight, identified by its
//! reservation code (PNR).

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Largest flight identifier, in bytes.
pub const MAX_FLIGHT_ID_LEN: usize = 9;

/// Largest source or destination, in bytes.
pub const MAX_LOCATION_LEN: usize = 49;

/// Largest passenger name, in bytes.
pub const MAX_PASSENGER_NAME_LEN: usize = 49;

/// A scheduled flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flight {
    /// Unique flight identifier (e.g. `AI701`).
    pub id: String,
    /// Departure location.
    pub source: String,
    /// Arrival location.
    pub destination: String,
    /// Total number of seats.
    pub capacity: u32,
    /// Seats not yet booked. Never exceeds `capacity`.
    pub available_seats: u32,
    /// Ticket price.
    pub price: f32,
}

impl Flight {
    /// Number of seats booked so far.
    #[must_use]
    pub fn booked_seats(&self) -> u32 {
        self.capacity - self.available_seats
    }

    /// Check if no seats are left.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.available_seats == 0
    }

    /// Check if this flight departs from `source` (or any source when `None`)
    /// and arrives at `destination` (or anywhere when `None`).
    #[must_use]
    pub fn matches(&self, source: Option<&str>, destination: Option<&str>) -> bool {
        source.map_or(true, |s| self.source == s)
            && destination.map_or(true, |d| self.destination == d)
    }
}

/// The fields needed to register a new flight.
///
/// Numeric fields are signed so that non-positive values coming from the
/// console can be rejected with [`Error::InvalidInput`] instead of wrapping.
#[derive(Debug, Clone, PartialEq)]
pub struct NewFlight {
    /// Unique flight identifier.
    pub id: String,
    /// Departure location.
    pub source: String,
    /// Arrival location.
    pub destination: String,
    /// Total number of seats, must be positive.
    pub capacity: i64,
    /// Ticket price, must be positive.
    pub price: f32,
}

impl NewFlight {
    /// Validate the fields and build a flight with every seat available.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if a text field is empty, contains
    /// whitespace or is too long, if the capacity is not positive, or if the
    /// price is not a positive finite number.
    pub fn into_flight(self) -> Result<Flight> {
        validate_flight_id(&self.id)?;
        validate_token("source", &self.source, MAX_LOCATION_LEN)?;
        validate_token("destination", &self.destination, MAX_LOCATION_LEN)?;
        let capacity = validate_capacity(self.capacity)?;
        validate_price(self.price)?;

        Ok(Flight {
            id: self.id,
            source: self.source,
            destination: self.destination,
            capacity,
            available_seats: capacity,
            price: self.price,
        })
    }
}

/// A passenger's booking on a flight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    /// Reservation code (PNR).
    pub code: u64,
    /// Identifier of the booked flight. Not guaranteed to resolve.
    pub flight_id: String,
    /// Passenger name.
    pub passenger_name: String,
    /// Seat number, in booking order. Not renumbered after cancellations,
    /// so it may repeat on a flight that had a ticket cancelled.
    pub seat_number: u32,
}

/// Check a flight identifier.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if the identifier is empty, contains
/// whitespace or control characters, or is longer than [`MAX_FLIGHT_ID_LEN`]
/// bytes.
pub fn validate_flight_id(id: &str) -> Result<()> {
    validate_token("flight id", id, MAX_FLIGHT_ID_LEN)
}

/// Check a passenger name.
///
/// Names may contain spaces but must not be blank.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if the name is blank, contains control
/// characters or is longer than [`MAX_PASSENGER_NAME_LEN`] bytes.
pub fn validate_passenger_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::invalid_input("passenger name", "must not be empty"));
    }
    reject_control_chars("passenger name", name)?;
    if name.len() > MAX_PASSENGER_NAME_LEN {
        return Err(Error::invalid_input(
            "passenger name",
            format!("must be at most {MAX_PASSENGER_NAME_LEN} bytes"),
        ));
    }
    Ok(())
}

/// Check a capacity value and narrow it to the stored width.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if the capacity is not positive or does
/// not fit the record layout.
pub fn validate_capacity(capacity: i64) -> Result<u32> {
    if capacity <= 0 {
        return Err(Error::invalid_input("capacity", "must be greater than 0"));
    }
    i32::try_from(capacity)
        .ok()
        .and_then(|c| u32::try_from(c).ok())
        .ok_or_else(|| Error::invalid_input("capacity", format!("must be at most {}", i32::MAX)))
}

/// Check a price value.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if the price is not a positive finite
/// number.
pub fn validate_price(price: f32) -> Result<()> {
    if !price.is_finite() || price <= 0.0 {
        return Err(Error::invalid_input("price", "must be greater than 0.00"));
    }
    Ok(())
}

fn validate_token(field: &'static str, value: &str, max_len: usize) -> Result<()> {
    if value.is_empty() {
        return Err(Error::invalid_input(field, "must not be empty"));
    }
    if value.chars().any(char::is_whitespace) {
        return Err(Error::invalid_input(field, "must not contain whitespace"));
    }
    reject_control_chars(field, value)?;
    if value.len() > max_len {
        return Err(Error::invalid_input(
            field,
            format!("must be at most {max_len} bytes"),
        ));
    }
    Ok(())
}

// Records are NUL-padded, so an embedded NUL would cut the value short on load.
fn reject_control_chars(field: &'static str, value: &str) -> Result<()> {
    if value.chars().any(char::is_control) {
        return Err(Error::invalid_input(field, "must not contain control characters"));
    }
    Ok(())
}
